//! Notification channel for system notices produced by the bridge.
//!
//! The bridge pushes [`Notice`]s into a [`NotificationSink`]. Hosts that
//! display notices hand the reporter a [`NotificationChannel`] sink and drain
//! it from their own loop. Internally the channel is a
//! `crossbeam::queue::SegQueue`, so producers never block.

use crate::chat::ChatRecord;
use crossbeam::queue::SegQueue;
use luahost_llsd::Value;
use std::sync::Arc;

/// Which conversation surface a notice targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NotificationKind {
    #[default]
    NearbyChat = 0,
    ImChat = 1,
    GroupChat = 2,
}

impl NotificationKind {
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        [Self::NearbyChat, Self::ImChat, Self::GroupChat]
            .into_iter()
            .find(|kind| kind.code() == code)
    }
}

/// One notice: the chat line to show plus display arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub kind: NotificationKind,
    pub chat: ChatRecord,
    pub args: Value,
}

impl Notice {
    /// A notice whose arguments are `{ "type": <kind code> }`.
    pub fn new(kind: NotificationKind, chat: ChatRecord) -> Self {
        let mut args = Value::map();
        args.insert("type", kind.code());
        Self { kind, chat, args }
    }
}

/// Receiver of bridge notices.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Discards every notice.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notice: Notice) {}
}

/// Unbounded multi-producer notice queue.
#[derive(Clone, Default)]
pub struct NotificationChannel {
    queue: Arc<SegQueue<Notice>>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink feeding this channel.
    pub fn sink(&self) -> Arc<dyn NotificationSink> {
        Arc::new(ChannelSink {
            queue: Arc::clone(&self.queue),
        })
    }

    pub fn try_recv(&self) -> Option<Notice> {
        self.queue.pop()
    }

    /// Remove and return every queued notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        std::iter::from_fn(|| self.queue.pop()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl std::fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("pending", &self.queue.len())
            .finish()
    }
}

struct ChannelSink {
    queue: Arc<SegQueue<Notice>>,
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notice: Notice) {
        self.queue.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_args_carry_kind_code() {
        let notice = Notice::new(NotificationKind::GroupChat, ChatRecord::new("x"));
        assert_eq!(notice.args.get("type"), Some(&Value::Integer(2)));
    }

    #[test]
    fn channel_preserves_order() {
        let channel = NotificationChannel::new();
        let sink = channel.sink();
        sink.notify(Notice::new(NotificationKind::NearbyChat, ChatRecord::new("first")));
        sink.notify(Notice::new(NotificationKind::NearbyChat, ChatRecord::new("second")));
        assert_eq!(channel.len(), 2);

        let drained = channel.drain();
        let texts: Vec<_> = drained.iter().map(|n| n.chat.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
        assert!(channel.is_empty());
        assert!(channel.try_recv().is_none());
    }

    #[test]
    fn sinks_from_clones_share_a_queue() {
        let channel = NotificationChannel::new();
        let other = channel.clone();
        other.sink().notify(Notice::new(NotificationKind::ImChat, ChatRecord::new("hi")));
        let notice = channel.try_recv().unwrap();
        assert_eq!(notice.kind, NotificationKind::ImChat);
    }

    #[test]
    fn sink_is_usable_across_threads() {
        let channel = NotificationChannel::new();
        let sink = channel.sink();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    sink.notify(Notice::new(
                        NotificationKind::NearbyChat,
                        ChatRecord::new(format!("{i}")),
                    ));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(channel.drain().len(), 4);
    }

    #[test]
    fn null_sink_drops_notices() {
        NullSink.notify(Notice::new(NotificationKind::NearbyChat, ChatRecord::default()));
    }

    #[test]
    fn kind_codes() {
        assert_eq!(NotificationKind::from_code(0), Some(NotificationKind::NearbyChat));
        assert_eq!(NotificationKind::from_code(3), None);
    }
}
