//! Chat message record and its structured-data form.
//!
//! `to_value` always writes every field. `assign` is a partial update:
//! only keys present in the incoming map are applied.

use crate::logging::LOG_TARGET;
use luahost_llsd::{Array, Map, Uuid, Value};

/// Where a chat line came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChatSourceType {
    System = 0,
    #[default]
    Agent = 1,
    Object = 2,
    Unknown = 3,
}

/// How a chat line was spoken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChatType {
    Whisper = 0,
    #[default]
    Normal = 1,
    Shout = 2,
    Start = 4,
    Stop = 5,
    DebugMsg = 6,
    Region = 7,
    Owner = 8,
    Direct = 9,
}

/// How well the local agent could hear the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChatAudible {
    Not = -1,
    Barely = 0,
    #[default]
    Fully = 1,
}

/// Presentation style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChatStyle {
    #[default]
    Normal = 0,
    Irc = 1,
    History = 2,
}

macro_rules! wire_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $ty {
            pub const fn code(self) -> i32 {
                self as i32
            }

            pub fn from_code(code: i32) -> Option<Self> {
                [$(Self::$variant),+].into_iter().find(|v| v.code() == code)
            }
        }
    };
}

wire_enum!(ChatSourceType { System, Agent, Object, Unknown });
wire_enum!(ChatType { Whisper, Normal, Shout, Start, Stop, DebugMsg, Region, Owner, Direct });
wire_enum!(ChatAudible { Not, Barely, Fully });
wire_enum!(ChatStyle { Normal, Irc, History });

/// One chat event as seen by the viewer.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ChatRecord {
    pub text: String,
    pub from_name: String,
    pub from_id: Uuid,
    pub notification_id: Uuid,
    pub owner_id: Uuid,
    pub source_type: ChatSourceType,
    pub chat_type: ChatType,
    pub audible: ChatAudible,
    pub muted: bool,
    pub time: f64,
    pub time_string: String,
    pub pos_agent: [f32; 3],
    pub url: String,
    pub chat_style: ChatStyle,
    pub session_id: Uuid,
}

impl ChatRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Full structured form; every field is present.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("text".into(), self.text.clone().into());
        map.insert("from_name".into(), self.from_name.clone().into());
        map.insert("from_id".into(), self.from_id.into());
        map.insert("notification_id".into(), self.notification_id.into());
        map.insert("owner_id".into(), self.owner_id.into());
        map.insert("source_type".into(), self.source_type.code().into());
        map.insert("chat_type".into(), self.chat_type.code().into());
        map.insert("audible".into(), self.audible.code().into());
        map.insert("muted".into(), self.muted.into());
        map.insert("time".into(), self.time.into());
        map.insert("time_string".into(), self.time_string.clone().into());
        let pos: Array = self
            .pos_agent
            .iter()
            .map(|c| Value::Real(f64::from(*c)))
            .collect();
        map.insert("pos_agent".into(), pos.into());
        map.insert("url".into(), self.url.clone().into());
        map.insert("chat_style".into(), self.chat_style.code().into());
        map.insert("session_id".into(), self.session_id.into());
        Value::Map(map)
    }

    /// Apply every field present in `value`; absent fields are untouched.
    pub fn assign(&mut self, value: &Value) {
        if let Some(v) = value.get("text") {
            self.text = v.as_string();
        }
        if let Some(v) = value.get("from_name") {
            self.from_name = v.as_string();
        }
        if let Some(v) = value.get("from_id") {
            self.from_id = v.as_uuid();
        }
        if let Some(v) = value.get("notification_id") {
            self.notification_id = v.as_uuid();
        }
        if let Some(v) = value.get("owner_id") {
            self.owner_id = v.as_uuid();
        }
        if let Some(v) = value.get("source_type") {
            assign_code(&mut self.source_type, v, "source_type", ChatSourceType::from_code);
        }
        if let Some(v) = value.get("chat_type") {
            assign_code(&mut self.chat_type, v, "chat_type", ChatType::from_code);
        }
        if let Some(v) = value.get("audible") {
            assign_code(&mut self.audible, v, "audible", ChatAudible::from_code);
        }
        if let Some(v) = value.get("muted") {
            self.muted = v.as_boolean();
        }
        if let Some(v) = value.get("time") {
            self.time = v.as_real();
        }
        if let Some(v) = value.get("time_string") {
            self.time_string = v.as_string();
        }
        if let Some(v) = value.get("pos_agent") {
            let component = |i: usize| v.get_index(i).map_or(0.0, Value::as_real) as f32;
            self.pos_agent = [component(0), component(1), component(2)];
        }
        if let Some(v) = value.get("url") {
            self.url = v.as_string();
        }
        if let Some(v) = value.get("chat_style") {
            assign_code(&mut self.chat_style, v, "chat_style", ChatStyle::from_code);
        }
        if let Some(v) = value.get("session_id") {
            self.session_id = v.as_uuid();
        }
    }

    /// A fresh record built from `value`; absent fields keep their defaults.
    pub fn from_value(value: &Value) -> Self {
        let mut chat = Self::default();
        chat.assign(value);
        chat
    }
}

fn assign_code<T>(field: &mut T, value: &Value, name: &str, from_code: fn(i32) -> Option<T>) {
    let code = value.as_integer();
    match from_code(code) {
        Some(v) => *field = v,
        None => tracing::warn!(target: LOG_TARGET, "ignoring unknown chat {name} code {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChatRecord {
        ChatRecord {
            text: "hello".to_string(),
            from_name: "Alice".to_string(),
            from_id: Uuid::from_u128(1),
            notification_id: Uuid::from_u128(2),
            owner_id: Uuid::from_u128(3),
            source_type: ChatSourceType::Object,
            chat_type: ChatType::Shout,
            audible: ChatAudible::Barely,
            muted: true,
            time: 1_242_317_493.5,
            time_string: "16:11".to_string(),
            pos_agent: [1.5, 2.0, -3.25],
            url: "secondlife:///app/agent/show".to_string(),
            chat_style: ChatStyle::Irc,
            session_id: Uuid::from_u128(4),
        }
    }

    #[test]
    fn defaults_match_a_fresh_agent_line() {
        let chat = ChatRecord::default();
        assert_eq!(chat.source_type, ChatSourceType::Agent);
        assert_eq!(chat.chat_type, ChatType::Normal);
        assert_eq!(chat.audible, ChatAudible::Fully);
        assert_eq!(chat.chat_style, ChatStyle::Normal);
        assert!(!chat.muted);
        assert_eq!(chat.from_id, Uuid::nil());
    }

    #[test]
    fn to_value_emits_every_field() {
        let value = sample().to_value();
        for key in [
            "text",
            "from_name",
            "from_id",
            "notification_id",
            "owner_id",
            "source_type",
            "chat_type",
            "audible",
            "muted",
            "time",
            "time_string",
            "pos_agent",
            "url",
            "chat_style",
            "session_id",
        ] {
            assert!(value.has(key), "missing {key}");
        }
        assert_eq!(value.len(), 15);
        assert_eq!(value.get("chat_type"), Some(&Value::Integer(2)));
        assert_eq!(value.get("audible"), Some(&Value::Integer(0)));
        assert_eq!(value.get("pos_agent").map(Value::len), Some(3));
    }

    #[test]
    fn value_roundtrip_is_exact() {
        let chat = sample();
        assert_eq!(ChatRecord::from_value(&chat.to_value()), chat);
    }

    #[test]
    fn assign_is_partial() {
        let mut chat = sample();
        let mut patch = Value::map();
        patch.insert("text", "edited");
        chat.assign(&patch);
        assert_eq!(chat.text, "edited");
        assert_eq!(chat.from_name, "Alice");
        assert_eq!(chat.chat_type, ChatType::Shout);
    }

    #[test]
    fn from_value_keeps_defaults_for_missing_fields() {
        let mut patch = Value::map();
        patch.insert("text", "hi");
        let chat = ChatRecord::from_value(&patch);
        assert_eq!(chat.text, "hi");
        assert_eq!(chat.from_name, "");
        assert_eq!(chat.source_type, ChatSourceType::Agent);
    }

    #[test]
    fn unknown_enum_code_leaves_field_unchanged() {
        let mut chat = sample();
        let mut patch = Value::map();
        patch.insert("chat_type", 3);
        patch.insert("source_type", 0);
        chat.assign(&patch);
        assert_eq!(chat.chat_type, ChatType::Shout);
        assert_eq!(chat.source_type, ChatSourceType::System);
    }

    #[test]
    fn assign_coerces_field_types() {
        let mut chat = ChatRecord::default();
        let mut patch = Value::map();
        patch.insert("from_id", "00000000-0000-0000-0000-000000000007");
        patch.insert("muted", 1);
        patch.insert("time", 12);
        patch.insert("chat_style", 2.0);
        chat.assign(&patch);
        assert_eq!(chat.from_id, Uuid::from_u128(7));
        assert!(chat.muted);
        assert_eq!(chat.time, 12.0);
        assert_eq!(chat.chat_style, ChatStyle::History);
    }

    #[test]
    fn short_position_pads_with_zero() {
        let mut chat = sample();
        let mut patch = Value::map();
        let mut pos = Value::array();
        pos.push(9.0);
        patch.insert("pos_agent", pos);
        chat.assign(&patch);
        assert_eq!(chat.pos_agent, [9.0, 0.0, 0.0]);
    }

    #[test]
    fn enum_codes() {
        assert_eq!(ChatType::from_code(6), Some(ChatType::DebugMsg));
        assert_eq!(ChatType::from_code(3), None);
        assert_eq!(ChatAudible::from_code(-1), Some(ChatAudible::Not));
        assert_eq!(ChatSourceType::System.code(), 0);
    }

    #[test]
    fn malformed_fields_log_under_lua_target() {
        let mut chat = sample();
        let mut update = Value::map();
        update.insert("chat_type", 99);
        update.insert("owner_id", "not-a-uuid");

        let events = crate::logging::testing::capture_json("warn", || chat.assign(&update));
        assert_eq!(chat.chat_type, sample().chat_type);
        assert_eq!(events.len(), 2, "{events:?}");
        assert!(events.iter().all(|event| event["target"] == "lua"));
    }
}
