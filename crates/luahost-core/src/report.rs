//! Routes script failures to the user as system chat notices.
//!
//! Every report produces two outputs: a `DebugMsg` chat line from
//! `"LuaHost"` pushed to the notification sink, and a warning under the
//! `lua` log target carrying the same text.

use crate::chat::{ChatRecord, ChatSourceType, ChatType};
use crate::logging::LOG_TARGET;
use crate::notify::{Notice, NotificationKind, NotificationSink, NullSink};
use luahost_llsd::Uuid;
use std::sync::Arc;

/// Sender name stamped on every bridge notice.
pub const REPORTER_NAME: &str = "LuaHost";

#[derive(Clone)]
pub struct ErrorReporter {
    sink: Arc<dyn NotificationSink>,
    agent_id: Uuid,
}

impl ErrorReporter {
    pub fn new(sink: Arc<dyn NotificationSink>, agent_id: Uuid) -> Self {
        Self { sink, agent_id }
    }

    /// A reporter that only logs.
    pub fn silent() -> Self {
        Self::new(Arc::new(NullSink), Uuid::nil())
    }

    pub fn agent_id(&self) -> Uuid {
        self.agent_id
    }

    /// The chat line shown for `message`.
    pub fn notice_chat(&self, message: &str) -> ChatRecord {
        ChatRecord {
            text: message.to_string(),
            from_name: REPORTER_NAME.to_string(),
            from_id: self.agent_id,
            owner_id: self.agent_id,
            source_type: ChatSourceType::System,
            chat_type: ChatType::DebugMsg,
            ..ChatRecord::default()
        }
    }

    pub fn report(&self, message: &str) {
        let chat = self.notice_chat(message);
        self.sink
            .notify(Notice::new(NotificationKind::NearbyChat, chat));
        tracing::warn!(target: LOG_TARGET, "{message}");
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("agent_id", &self.agent_id)
            .finish_non_exhaustive()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::silent()
    }
}
