//! Structured data values for the luahost scripting bridge.
//!
//! [`Value`] is a tagged tree of scalars, string-keyed maps and ordered
//! arrays. The tag is authoritative: typed accessors such as
//! [`Value::as_integer`] coerce between representations instead of failing,
//! so a consumer can always ask for the shape it wants.

/// Log target shared by every diagnostic on the scripting bridge.
pub const LOG_TARGET: &str = "lua";

mod array;
mod drop;
mod json;
mod map;
mod types;
mod value;

pub use array::Array;
pub use map::Map;
pub use types::{Uri, ValueType};
pub use value::Value;

pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;
