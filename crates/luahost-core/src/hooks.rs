//! Optional script hooks and free-form evaluation.
//!
//! Scripts opt in by defining global functions. A hook that is missing,
//! is not a function, or fails leaves the host's data untouched.

use crate::chat::ChatRecord;
use crate::error::{Error, Result, ScriptFailureKind};
use crate::host::LuaHost;
use crate::logging::LOG_TARGET;
use crate::stack::ValueStack;
use luahost_llsd::{Value, ValueType};
use mlua::{Function, Value as LuaValue};
use std::path::Path;

/// Called once per host tick with no arguments.
pub const ADVANCE: &str = "advance";

/// Called with `(chat, args)` for each chat line; returns the replacement.
pub const FILTER_CHAT: &str = "filter_chat";

/// Global holding the side-channel key name.
pub const TYPE_KEY_GLOBAL: &str = "LLSD_TYPE_KEY";

/// Chunk name for [`LuaHost::eval`].
pub const EVAL_CHUNK_NAME: &str = "eval";

/// Lookup result for a named global.
#[derive(Debug)]
pub enum ScriptHook<'lua> {
    Callable(Function<'lua>),
    /// Defined, but not a function; carries the Lua type name
    NotCallable(&'static str),
    Missing,
}

impl<'lua> ScriptHook<'lua> {
    pub fn callable(self) -> Option<Function<'lua>> {
        match self {
            Self::Callable(func) => Some(func),
            Self::NotCallable(_) | Self::Missing => None,
        }
    }
}

/// Outcome of [`LuaHost::eval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Completed,
    Failed,
}

impl CallStatus {
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

impl LuaHost {
    pub fn lookup_hook(&self, name: &str) -> ScriptHook<'_> {
        let Some(lua) = self.lua() else {
            return ScriptHook::Missing;
        };
        match lua.globals().get::<_, LuaValue>(name) {
            Ok(LuaValue::Nil) => ScriptHook::Missing,
            Ok(LuaValue::Function(func)) => ScriptHook::Callable(func),
            Ok(other) => {
                tracing::debug!(target: LOG_TARGET, hook = name, kind = other.type_name(), "hook is not callable");
                ScriptHook::NotCallable(other.type_name())
            }
            Err(err) => {
                tracing::warn!(target: LOG_TARGET, hook = name, "hook lookup failed: {err}");
                ScriptHook::Missing
            }
        }
    }

    /// Run the `advance` hook once, if the script defines it.
    pub fn tick(&self) {
        if let Some(func) = self.lookup_hook(ADVANCE).callable() {
            // Failures are reported by protected_call
            let _ = self.protected_call(&func, ValueStack::new(), 0);
        }
    }

    /// Pass `chat` through the `filter_chat` hook.
    ///
    /// Without a usable hook the input comes back unchanged. Otherwise the
    /// result is a fresh record updated from the map the script returns, so
    /// fields the script leaves out take their default values.
    pub fn filter_chat(&self, chat: &ChatRecord, args: &Value) -> ChatRecord {
        let (Some(lua), Some(func)) = (self.lua(), self.lookup_hook(FILTER_CHAT).callable())
        else {
            return chat.clone();
        };

        let mut stack = ValueStack::new();
        let pushed = self
            .codec()
            .push(lua, &mut stack, &chat.to_value())
            .and_then(|()| self.codec().push(lua, &mut stack, args));
        if let Err(err) = pushed {
            self.fail(ScriptFailureKind::Runtime, &err);
            return chat.clone();
        }

        match self.protected_call(&func, stack, 1) {
            Ok(mut results) => {
                let filtered = self.codec().pop(&mut results, ValueType::Map);
                ChatRecord::from_value(&filtered)
            }
            Err(_) => chat.clone(),
        }
    }

    /// Compile and run `source` under the chunk name `eval`.
    pub fn eval(&self, source: &str) -> CallStatus {
        self.eval_chunk(source, EVAL_CHUNK_NAME)
    }

    /// Read a script from disk and run it. Script failures are reported
    /// like [`LuaHost::eval`]; only an unreadable file is an error.
    pub fn eval_file(&self, path: &Path) -> Result<CallStatus> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;
        let name = format!("@{}", path.display());
        Ok(self.eval_chunk(source.trim_start_matches('\u{FEFF}'), &name))
    }

    fn eval_chunk(&self, source: &str, name: &str) -> CallStatus {
        let Some(lua) = self.lua() else {
            self.reporter().report("Lua host is not running");
            return CallStatus::Failed;
        };
        let func = match lua.load(source).set_name(name).into_function() {
            Ok(func) => func,
            Err(err) => {
                self.fail(ScriptFailureKind::Compile, &err);
                return CallStatus::Failed;
            }
        };
        match self.protected_call(&func, ValueStack::new(), 0) {
            Ok(_) => CallStatus::Completed,
            Err(_) => CallStatus::Failed,
        }
    }
}
