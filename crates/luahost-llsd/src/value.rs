use crate::types::{Uri, ValueType};
use crate::{Array, Map};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// A structured data value.
///
/// The variant is the value's type tag. Accessors never fail; asking for
/// a mismatched type coerces (or yields that type's empty value).
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    String(String),
    Uuid(Uuid),
    Date(DateTime<Utc>),
    Uri(Uri),
    Binary(Vec<u8>),
    Map(Map),
    Array(Array),
}

impl Value {
    /// An empty map value.
    pub fn map() -> Self {
        Self::Map(Map::new())
    }

    /// An empty array value.
    pub fn array() -> Self {
        Self::Array(Array::new())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Undefined => ValueType::Undefined,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Integer(_) => ValueType::Integer,
            Self::Real(_) => ValueType::Real,
            Self::String(_) => ValueType::String,
            Self::Uuid(_) => ValueType::Uuid,
            Self::Date(_) => ValueType::Date,
            Self::Uri(_) => ValueType::Uri,
            Self::Binary(_) => ValueType::Binary,
            Self::Map(_) => ValueType::Map,
            Self::Array(_) => ValueType::Array,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Parse the canonical textual form of an identifier.
    /// Malformed text yields the nil identifier.
    pub fn uuid_from_str(text: &str) -> Self {
        Self::Uuid(parse_uuid(text))
    }

    /// Parse the canonical textual form of a timestamp (RFC 3339).
    /// Malformed text yields the epoch.
    pub fn date_from_str(text: &str) -> Self {
        Self::Date(parse_date(text))
    }

    pub fn uri_from_str(text: &str) -> Self {
        Self::Uri(Uri::new(text))
    }

    pub fn as_boolean(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Real(r) => *r != 0.0,
            Self::String(s) => !s.is_empty(),
            _ => false,
        }
    }

    pub fn as_integer(&self) -> i32 {
        match self {
            Self::Boolean(b) => i32::from(*b),
            Self::Integer(i) => *i,
            // `as` saturates and maps NaN to zero
            Self::Real(r) => r.trunc() as i32,
            Self::String(s) => parse_integer(s),
            _ => 0,
        }
    }

    pub fn as_real(&self) -> f64 {
        match self {
            Self::Boolean(b) => f64::from(u8::from(*b)),
            Self::Integer(i) => f64::from(*i),
            Self::Real(r) => *r,
            Self::String(s) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            Self::Boolean(true) => "true".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Real(r) => r.to_string(),
            Self::String(s) => s.clone(),
            Self::Uuid(u) => u.hyphenated().to_string(),
            Self::Date(d) => format_date(d),
            Self::Uri(u) => u.as_str().to_string(),
            _ => String::new(),
        }
    }

    pub fn as_uuid(&self) -> Uuid {
        match self {
            Self::Uuid(u) => *u,
            Self::String(s) => parse_uuid(s),
            _ => Uuid::nil(),
        }
    }

    pub fn as_date(&self) -> DateTime<Utc> {
        match self {
            Self::Date(d) => *d,
            Self::String(s) => parse_date(s),
            Self::Integer(i) => date_from_seconds(f64::from(*i)),
            Self::Real(r) => date_from_seconds(*r),
            _ => DateTime::UNIX_EPOCH,
        }
    }

    pub fn as_uri(&self) -> Uri {
        match self {
            Self::Uri(u) => u.clone(),
            Self::String(s) => Uri::new(s.clone()),
            _ => Uri::default(),
        }
    }

    pub fn as_binary(&self) -> Vec<u8> {
        match self {
            Self::Binary(b) => b.clone(),
            _ => Vec::new(),
        }
    }

    /// Whether this is a map containing `key`.
    pub fn has(&self, key: &str) -> bool {
        matches!(self, Self::Map(m) if m.contains_key(key))
    }

    /// Map lookup; non-maps and missing keys yield `None`.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Array lookup; non-arrays and out-of-range indices yield `None`.
    pub fn get_index(&self, index: usize) -> Option<&Self> {
        match self {
            Self::Array(a) => a.get(index),
            _ => None,
        }
    }

    /// Insert into a map, converting `self` into an empty map first if it
    /// holds any other type.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Self>) {
        if !matches!(self, Self::Map(_)) {
            *self = Self::map();
        }
        if let Self::Map(m) = self {
            m.insert(key.into(), value.into());
        }
    }

    /// Append to an array, converting `self` into an empty array first if
    /// it holds any other type.
    pub fn push(&mut self, value: impl Into<Self>) {
        if !matches!(self, Self::Array(_)) {
            *self = Self::array();
        }
        if let Self::Array(a) = self {
            a.push(value.into());
        }
    }

    /// Number of entries of a map or array; zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            Self::Map(m) => m.len(),
            Self::Array(a) => a.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_integer(text: &str) -> i32 {
    let text = text.trim();
    text.parse::<i32>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(|f| f.trunc() as i32))
        .unwrap_or(0)
}

fn parse_uuid(text: &str) -> Uuid {
    match Uuid::parse_str(text.trim()) {
        Ok(u) => u,
        Err(err) => {
            if !text.is_empty() {
                tracing::warn!(target: crate::LOG_TARGET, "invalid uuid {text:?}: {err}");
            }
            Uuid::nil()
        }
    }
}

fn parse_date(text: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(text.trim()) {
        Ok(d) => d.with_timezone(&Utc),
        Err(err) => {
            if !text.is_empty() {
                tracing::warn!(target: crate::LOG_TARGET, "invalid date {text:?}: {err}");
            }
            DateTime::UNIX_EPOCH
        }
    }
}

pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn date_from_seconds(seconds: f64) -> DateTime<Utc> {
    if !seconds.is_finite() {
        return DateTime::UNIX_EPOCH;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).unwrap_or(DateTime::UNIX_EPOCH)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Uri> for Value {
    fn from(u: Uri) -> Self {
        Self::Uri(u)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Binary(b)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Self::Map(m)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Self::Array(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "a2e76fcd-9360-4f6d-a924-000000000003";

    #[test]
    fn default_is_undefined() {
        assert_eq!(Value::default(), Value::Undefined);
        assert_eq!(Value::default().value_type(), ValueType::Undefined);
    }

    #[test]
    fn value_type_matches_variant() {
        assert_eq!(Value::from(true).value_type(), ValueType::Boolean);
        assert_eq!(Value::from(3).value_type(), ValueType::Integer);
        assert_eq!(Value::from(0.5).value_type(), ValueType::Real);
        assert_eq!(Value::from("x").value_type(), ValueType::String);
        assert_eq!(Value::from(Uuid::nil()).value_type(), ValueType::Uuid);
        assert_eq!(Value::uri_from_str("x").value_type(), ValueType::Uri);
        assert_eq!(Value::from(vec![1u8]).value_type(), ValueType::Binary);
        assert_eq!(Value::map().value_type(), ValueType::Map);
        assert_eq!(Value::array().value_type(), ValueType::Array);
    }

    // ── coercions ────────────────────────────────────────────

    #[test]
    fn boolean_coercions() {
        assert!(Value::Integer(2).as_boolean());
        assert!(!Value::Integer(0).as_boolean());
        assert!(Value::Real(0.1).as_boolean());
        assert!(Value::from("false").as_boolean());
        assert!(!Value::from("").as_boolean());
        assert!(!Value::Undefined.as_boolean());
        assert!(!Value::map().as_boolean());
    }

    #[test]
    fn integer_coercions() {
        assert_eq!(Value::Boolean(true).as_integer(), 1);
        assert_eq!(Value::Real(2.9).as_integer(), 2);
        assert_eq!(Value::Real(-2.9).as_integer(), -2);
        assert_eq!(Value::Real(1e20).as_integer(), i32::MAX);
        assert_eq!(Value::Real(f64::NAN).as_integer(), 0);
        assert_eq!(Value::from(" 42 ").as_integer(), 42);
        assert_eq!(Value::from("4.7").as_integer(), 4);
        assert_eq!(Value::from("nope").as_integer(), 0);
        assert_eq!(Value::Undefined.as_integer(), 0);
    }

    #[test]
    fn real_coercions() {
        assert_eq!(Value::Boolean(true).as_real(), 1.0);
        assert_eq!(Value::Integer(-3).as_real(), -3.0);
        assert_eq!(Value::from("2.5").as_real(), 2.5);
        assert_eq!(Value::from("x").as_real(), 0.0);
    }

    #[test]
    fn string_coercions() {
        assert_eq!(Value::Boolean(true).as_string(), "true");
        assert_eq!(Value::Boolean(false).as_string(), "");
        assert_eq!(Value::Integer(7).as_string(), "7");
        assert_eq!(Value::Real(1.5).as_string(), "1.5");
        assert_eq!(Value::uuid_from_str(AGENT).as_string(), AGENT);
        assert_eq!(Value::uri_from_str("http://x/").as_string(), "http://x/");
        assert_eq!(Value::Undefined.as_string(), "");
        assert_eq!(Value::Binary(vec![65]).as_string(), "");
    }

    #[test]
    fn uuid_parses_from_string() {
        let v = Value::from(AGENT);
        assert_eq!(v.as_uuid().to_string(), AGENT);
    }

    #[test]
    fn malformed_uuid_is_nil() {
        assert_eq!(Value::uuid_from_str("not-a-uuid"), Value::Uuid(Uuid::nil()));
        assert_eq!(Value::Integer(1).as_uuid(), Uuid::nil());
    }

    #[test]
    fn date_textual_form_roundtrips() {
        let v = Value::date_from_str("2009-05-14T16:11:33Z");
        assert_eq!(v.as_string(), "2009-05-14T16:11:33Z");
        let frac = Value::date_from_str("2009-05-14T16:11:33.25Z");
        assert_eq!(frac.as_string(), "2009-05-14T16:11:33.250Z");
        assert_eq!(Value::date_from_str(&frac.as_string()), frac);
    }

    #[test]
    fn malformed_date_is_epoch() {
        assert_eq!(
            Value::date_from_str("yesterday"),
            Value::Date(DateTime::UNIX_EPOCH)
        );
    }

    #[test]
    fn date_from_numeric_seconds() {
        let d = Value::Real(1.5).as_date();
        assert_eq!(d.timestamp(), 1);
        assert_eq!(d.timestamp_subsec_millis(), 500);
        assert_eq!(Value::Integer(60).as_date().timestamp(), 60);
    }

    #[test]
    fn uri_from_string_is_verbatim() {
        assert_eq!(Value::from("not a url").as_uri().as_str(), "not a url");
        assert_eq!(Value::Integer(1).as_uri(), Uri::default());
    }

    #[test]
    fn binary_only_from_binary() {
        assert_eq!(Value::Binary(vec![1, 2]).as_binary(), vec![1, 2]);
        assert!(Value::from("ab").as_binary().is_empty());
    }

    // ── containers ───────────────────────────────────────────

    #[test]
    fn insert_converts_scalar_into_map() {
        let mut v = Value::Integer(3);
        v.insert("text", "hi");
        assert!(v.has("text"));
        assert_eq!(v.get("text"), Some(&Value::from("hi")));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn push_converts_scalar_into_array() {
        let mut v = Value::Undefined;
        v.push(1);
        v.push(2.5);
        assert_eq!(v.len(), 2);
        assert_eq!(v.get_index(1), Some(&Value::Real(2.5)));
        assert_eq!(v.get_index(2), None);
    }

    #[test]
    fn lookups_on_scalars_are_empty() {
        let v = Value::from("text");
        assert!(!v.has("text"));
        assert_eq!(v.get("text"), None);
        assert_eq!(v.get_index(0), None);
        assert!(v.is_empty());
    }
}
