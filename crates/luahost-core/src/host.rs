//! Lifecycle of the embedded Lua engine.
//!
//! A [`LuaHost`] owns at most one `mlua::Lua` at a time. Every call into
//! script code goes through [`LuaHost::protected_call`], which contains
//! errors, enforces the instruction budget and reports failures.

use crate::codec::{Codec, CodecLimits, TYPE_KEY};
use crate::config::{Config, EngineConfig};
use crate::error::{Error, Result, ScriptFailure, ScriptFailureKind};
use crate::hooks::TYPE_KEY_GLOBAL;
use crate::logging::LOG_TARGET;
use crate::notify::NotificationSink;
use crate::report::ErrorReporter;
use crate::stack::ValueStack;
use mlua::{Function, HookTriggers, Lua, MultiValue};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Instructions between budget checks.
const BUDGET_STRIDE: u32 = 1000;

pub struct LuaHost {
    lua: Option<Lua>,
    engine: EngineConfig,
    codec: Codec,
    executed: Arc<AtomicU64>,
}

impl LuaHost {
    pub fn new(engine: EngineConfig, reporter: ErrorReporter) -> Self {
        Self {
            lua: None,
            engine,
            codec: Codec::new(CodecLimits::default(), reporter),
            executed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A stopped host wired to `sink` with every setting from `config`.
    pub fn from_config(config: &Config, sink: Arc<dyn NotificationSink>) -> Self {
        let reporter = ErrorReporter::new(sink, config.agent.id());
        Self::new(config.engine.clone(), reporter).with_codec_limits(config.codec.clone())
    }

    #[must_use]
    pub fn with_codec_limits(mut self, limits: CodecLimits) -> Self {
        self.codec = Codec::new(limits, self.codec.reporter().clone());
        self
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn reporter(&self) -> &ErrorReporter {
        self.codec.reporter()
    }

    /// The live engine, if started.
    pub fn lua(&self) -> Option<&Lua> {
        self.lua.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.lua.is_some()
    }

    /// Create the engine, install limits and globals, then run the
    /// configured startup script.
    pub fn start(&mut self) -> Result<()> {
        if self.lua.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let lua = Lua::new();
        if self.engine.memory_limit_bytes > 0 {
            lua.set_memory_limit(self.engine.memory_limit_bytes)?;
        }
        if self.engine.instruction_limit > 0 {
            install_budget(&lua, self.engine.instruction_limit, Arc::clone(&self.executed));
        }
        lua.globals().set(TYPE_KEY_GLOBAL, TYPE_KEY)?;
        self.lua = Some(lua);

        tracing::info!(
            target: LOG_TARGET,
            instruction_limit = self.engine.instruction_limit,
            memory_limit_bytes = self.engine.memory_limit_bytes,
            "Lua host started"
        );

        if let Some(path) = self.engine.startup_script.clone() {
            if let Err(err) = self.eval_file(&path) {
                self.stop();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Drop the engine. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if self.lua.take().is_some() {
            tracing::info!(target: LOG_TARGET, "Lua host stopped");
        }
    }

    /// Call `func` with `args`, containing any error it raises.
    ///
    /// On success the result stack holds exactly `nresults` values, padded
    /// with nil or truncated. On failure the error text has been reported
    /// before it is returned.
    pub fn protected_call<'lua>(
        &'lua self,
        func: &Function<'lua>,
        args: ValueStack<'lua>,
        nresults: usize,
    ) -> std::result::Result<ValueStack<'lua>, ScriptFailure> {
        self.executed.store(0, Ordering::Relaxed);
        match func.call::<_, MultiValue>(args.into_multi()) {
            Ok(values) => {
                let mut results = ValueStack::from_multi(values);
                results.resize(nresults);
                Ok(results)
            }
            Err(err) => {
                let kind = if self.budget_exhausted() {
                    ScriptFailureKind::BudgetExceeded
                } else {
                    ScriptFailureKind::Runtime
                };
                Err(self.fail(kind, &err))
            }
        }
    }

    /// Report `err` and describe it as a [`ScriptFailure`].
    pub(crate) fn fail(&self, kind: ScriptFailureKind, err: &mlua::Error) -> ScriptFailure {
        let message = script_message(err);
        self.reporter().report(&message);
        ScriptFailure { kind, message }
    }

    fn budget_exhausted(&self) -> bool {
        let limit = self.engine.instruction_limit;
        limit > 0 && self.executed.load(Ordering::Relaxed) > limit
    }
}

impl Drop for LuaHost {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for LuaHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuaHost")
            .field("running", &self.is_running())
            .field("engine", &self.engine)
            .field("codec", &self.codec)
            .finish()
    }
}

fn install_budget(lua: &Lua, limit: u64, executed: Arc<AtomicU64>) {
    let triggers = HookTriggers::new().every_nth_instruction(BUDGET_STRIDE);
    lua.set_hook(triggers, move |_lua, _debug| {
        let used = executed.fetch_add(u64::from(BUDGET_STRIDE), Ordering::Relaxed)
            + u64::from(BUDGET_STRIDE);
        if used > limit {
            return Err(mlua::Error::RuntimeError(format!(
                "instruction budget of {limit} exceeded"
            )));
        }
        Ok(())
    });
}

/// The message a script error carries, without the engine's wrapping.
pub(crate) fn script_message(err: &mlua::Error) -> String {
    match err {
        mlua::Error::RuntimeError(message) | mlua::Error::MemoryError(message) => message.clone(),
        mlua::Error::SyntaxError { message, .. } => message.clone(),
        mlua::Error::CallbackError { cause, .. } => script_message(cause),
        other => other.to_string(),
    }
}
