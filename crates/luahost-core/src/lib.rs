//! luahost-core: embedded Lua bridge for viewer chat and tick hooks
//!
//! A [`LuaHost`] owns one Lua engine, converts structured [`Value`] trees to
//! and from Lua through a type-preserving [`Codec`], and exposes two optional
//! script hooks (`advance` and `filter_chat`) plus free-form evaluation.
//! Script failures never escape: they become system notices on a
//! [`NotificationSink`] and warnings under the `lua` log target.
//!
//! [`Value`]: luahost_llsd::Value

#![forbid(unsafe_code)]

pub mod chat;
pub mod codec;
pub mod config;
pub mod error;
pub mod hooks;
pub mod host;
pub mod logging;
pub mod notify;
pub mod report;
pub mod stack;

pub use chat::{ChatAudible, ChatRecord, ChatSourceType, ChatStyle, ChatType};
pub use codec::{BinaryBlob, Codec, CodecLimits, TYPE_KEY};
pub use config::Config;
pub use error::{ConfigError, Error, Result, ScriptFailure, ScriptFailureKind};
pub use hooks::{CallStatus, ScriptHook};
pub use host::LuaHost;
pub use notify::{Notice, NotificationChannel, NotificationKind, NotificationSink, NullSink};
pub use report::ErrorReporter;
pub use stack::ValueStack;
