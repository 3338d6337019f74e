//! JSON interchange for [`Value`].
//!
//! JSON carries no type tags, so textual tags (uuid, date, uri) come back
//! as plain strings and binary is written as base64 text.

use crate::{Array, Map, Value};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value as Json;

impl Value {
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Self::Undefined,
            Json::Bool(b) => Self::Boolean(*b),
            Json::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
                Some(i) => Self::Integer(i),
                None => Self::Real(n.as_f64().unwrap_or(0.0)),
            },
            Json::String(s) => Self::String(s.clone()),
            Json::Array(items) => Self::Array(items.iter().map(Self::from_json).collect::<Array>()),
            Json::Object(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect::<Map>(),
            ),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Self::Undefined => Json::Null,
            Self::Boolean(b) => Json::Bool(*b),
            Self::Integer(i) => Json::from(*i),
            // Non-finite reals have no JSON form
            Self::Real(r) => serde_json::Number::from_f64(*r).map_or(Json::Null, Json::Number),
            Self::String(_) | Self::Uuid(_) | Self::Date(_) | Self::Uri(_) => {
                Json::String(self.as_string())
            }
            Self::Binary(b) => Json::String(STANDARD.encode(b)),
            Self::Map(m) => Json::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
            Self::Array(a) => Json::Array(a.iter().map(Self::to_json).collect()),
        }
    }
}
