//! Conversion between structured [`Value`] trees and Lua values.
//!
//! Lua has no identifier, timestamp, URI or binary types and cannot tell a
//! map from an array, so every encoded container carries a companion table
//! under [`TYPE_KEY`] that maps each key (or 1-based index) to the
//! [`ValueType`] code of its entry. Decoding with that side-channel present
//! reproduces the original tree exactly; without it, types are guessed from
//! the Lua representation.

use crate::logging::LOG_TARGET;
use crate::report::ErrorReporter;
use crate::stack::ValueStack;
use luahost_llsd::{Array, Map, Value, ValueType};
use mlua::{Lua, MetaMethod, Table, UserData, UserDataMethods, Value as LuaValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reserved table key holding the type side-channel.
pub const TYPE_KEY: &str = "_LLSD_TYPES";

/// Two numbers closer than this are considered the same integer.
const INTEGER_EPSILON: f64 = 1e-6;

/// Decode limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecLimits {
    /// Largest 1-based array index accepted while decoding
    pub max_array_index: usize,
    /// Deepest container nesting accepted while decoding
    pub max_depth: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_array_index: 1_048_576,
            max_depth: 256,
        }
    }
}

/// Owned byte buffer exposed to scripts as userdata.
///
/// Scripts can read `#blob` and `blob:bytes()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryBlob(pub Vec<u8>);

impl UserData for BinaryBlob {
    fn add_methods<'lua, M: UserDataMethods<'lua, Self>>(methods: &mut M) {
        methods.add_meta_method(MetaMethod::Len, |_, this, ()| Ok(this.0.len()));
        methods.add_meta_method(MetaMethod::ToString, |_, this, ()| {
            Ok(format!("binary({} bytes)", this.0.len()))
        });
        methods.add_method("bytes", |lua, this, ()| lua.create_string(&this.0));
    }
}

/// Bidirectional converter between [`Value`] and Lua values.
#[derive(Clone, Debug, Default)]
pub struct Codec {
    limits: CodecLimits,
    reporter: ErrorReporter,
}

impl Codec {
    pub fn new(limits: CodecLimits, reporter: ErrorReporter) -> Self {
        Self { limits, reporter }
    }

    pub fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Encode `value` as a Lua value owned by `lua`.
    pub fn encode<'lua>(&self, lua: &'lua Lua, value: &Value) -> mlua::Result<LuaValue<'lua>> {
        Ok(match value {
            Value::Undefined => LuaValue::Nil,
            Value::Boolean(b) => LuaValue::Boolean(*b),
            Value::Integer(i) => LuaValue::Integer(i64::from(*i)),
            Value::Real(r) => LuaValue::Number(*r),
            Value::String(s) => LuaValue::String(lua.create_string(s)?),
            Value::Uuid(_) | Value::Date(_) | Value::Uri(_) => {
                LuaValue::String(lua.create_string(value.as_string())?)
            }
            Value::Binary(bytes) => {
                LuaValue::UserData(lua.create_userdata(BinaryBlob(bytes.clone()))?)
            }
            Value::Map(map) => {
                let table = lua.create_table()?;
                let types = lua.create_table()?;
                for (key, item) in map.iter() {
                    if key == TYPE_KEY {
                        tracing::warn!(target: LOG_TARGET, "dropping map entry under reserved key {TYPE_KEY}");
                        continue;
                    }
                    table.raw_set(key.as_str(), self.encode(lua, item)?)?;
                    types.raw_set(key.as_str(), item.value_type().code())?;
                }
                table.raw_set(TYPE_KEY, types)?;
                LuaValue::Table(table)
            }
            Value::Array(array) => {
                let table = lua.create_table()?;
                let types = lua.create_table()?;
                for (index, item) in (1i64..).zip(array.iter()) {
                    table.raw_set(index, self.encode(lua, item)?)?;
                    types.raw_set(index, item.value_type().code())?;
                }
                table.raw_set(TYPE_KEY, types)?;
                LuaValue::Table(table)
            }
        })
    }

    /// Decode a Lua value. A `hint` of [`ValueType::Undefined`] means the
    /// type is guessed from the Lua representation.
    pub fn decode(&self, value: &LuaValue<'_>, hint: ValueType) -> Value {
        let mut state = DecodeState::default();
        self.decode_with(value, hint, &mut state)
    }

    /// Encode `value` onto the top of `stack`.
    pub fn push<'lua>(
        &self,
        lua: &'lua Lua,
        stack: &mut ValueStack<'lua>,
        value: &Value,
    ) -> mlua::Result<()> {
        stack.push(self.encode(lua, value)?);
        Ok(())
    }

    /// Pop and decode the top of `stack`; an empty stack yields `Undefined`.
    pub fn pop(&self, stack: &mut ValueStack<'_>, hint: ValueType) -> Value {
        match stack.pop() {
            Some(value) => self.decode(&value, hint),
            None => {
                tracing::warn!(target: LOG_TARGET, "trying to pop a value from an empty stack");
                Value::Undefined
            }
        }
    }

    fn decode_with(&self, value: &LuaValue<'_>, hint: ValueType, state: &mut DecodeState) -> Value {
        match hint {
            ValueType::Undefined => self.guess(value, state),
            ValueType::Boolean => Value::Boolean(!matches!(
                value,
                LuaValue::Nil | LuaValue::Boolean(false)
            )),
            ValueType::Integer => Value::Integer(to_integer(value)),
            ValueType::Real => Value::Real(to_real(value)),
            ValueType::String => Value::String(to_text(value).unwrap_or_default()),
            ValueType::Uuid => Value::uuid_from_str(&to_text(value).unwrap_or_default()),
            ValueType::Date => Value::date_from_str(&to_text(value).unwrap_or_default()),
            ValueType::Uri => Value::uri_from_str(&to_text(value).unwrap_or_default()),
            ValueType::Binary => Value::Binary(to_bytes(value)),
            ValueType::Map => match value {
                LuaValue::Table(table) => self.decode_map(table, state),
                other => {
                    tracing::warn!(target: LOG_TARGET, "expected a table for map, got {}", other.type_name());
                    Value::map()
                }
            },
            ValueType::Array => match value {
                LuaValue::Table(table) => self.decode_array(table, state),
                other => {
                    tracing::warn!(target: LOG_TARGET, "expected a table for array, got {}", other.type_name());
                    Value::array()
                }
            },
        }
    }

    fn guess(&self, value: &LuaValue<'_>, state: &mut DecodeState) -> Value {
        match value {
            LuaValue::Boolean(b) => Value::Boolean(*b),
            LuaValue::Integer(i) => i32::try_from(*i).map_or(Value::Real(*i as f64), Value::Integer),
            LuaValue::Number(n) => guess_number(*n),
            LuaValue::String(_) => Value::String(to_text(value).unwrap_or_default()),
            LuaValue::UserData(_) => Value::Binary(to_bytes(value)),
            LuaValue::Table(table) => {
                if looks_like_array(table) {
                    self.decode_array(table, state)
                } else {
                    self.decode_map(table, state)
                }
            }
            _ => Value::Undefined,
        }
    }

    fn decode_map(&self, table: &Table<'_>, state: &mut DecodeState) -> Value {
        if !self.enter(table, state) {
            return Value::Undefined;
        }
        let types = side_channel(table);
        let mut map = Map::new();

        for pair in table.clone().pairs::<LuaValue, LuaValue>() {
            let (key, item) = match pair {
                Ok(pair) => pair,
                Err(err) => {
                    tracing::warn!(target: LOG_TARGET, "skipping unreadable map entry: {err}");
                    continue;
                }
            };
            if is_type_key(&key) {
                continue;
            }
            let name = match &key {
                LuaValue::String(_) | LuaValue::Integer(_) | LuaValue::Number(_) => {
                    to_text(&key).unwrap_or_default()
                }
                other => {
                    tracing::warn!(target: LOG_TARGET, "skipping map key of type {}", other.type_name());
                    continue;
                }
            };
            let decoded = match self.entry_hint(types.as_ref(), &key) {
                Some(hint) => self.decode_with(&item, hint, state),
                None => Value::Undefined,
            };
            map.insert(name, decoded);
        }

        // Undefined entries encode as nil and only survive in the side-channel
        for key in undefined_keys(types.as_ref()) {
            if let LuaValue::String(_) = key {
                let name = to_text(&key).unwrap_or_default();
                map.entry(name).or_insert(Value::Undefined);
            }
        }

        state.leave(table);
        Value::Map(map)
    }

    fn decode_array(&self, table: &Table<'_>, state: &mut DecodeState) -> Value {
        if !self.enter(table, state) {
            return Value::Undefined;
        }
        let types = side_channel(table);
        let mut array = Array::new();

        for pair in table.clone().pairs::<LuaValue, LuaValue>() {
            let (key, item) = match pair {
                Ok(pair) => pair,
                Err(err) => {
                    tracing::warn!(target: LOG_TARGET, "skipping unreadable array entry: {err}");
                    continue;
                }
            };
            if is_type_key(&key) {
                continue;
            }
            let Some(index) = array_index(&key) else {
                tracing::warn!(target: LOG_TARGET, "skipping array key {key:?}");
                continue;
            };
            if index > self.limits.max_array_index {
                self.reporter.report(&format!(
                    "Array index {index} exceeds limit {}",
                    self.limits.max_array_index
                ));
                continue;
            }
            let decoded = match self.entry_hint(types.as_ref(), &key) {
                Some(hint) => self.decode_with(&item, hint, state),
                None => Value::Undefined,
            };
            array.set(index - 1, decoded);
        }

        for key in undefined_keys(types.as_ref()) {
            if let Some(index) = array_index(&key) {
                if index <= self.limits.max_array_index {
                    array.pad_to(index);
                }
            }
        }

        state.leave(table);
        Value::Array(array)
    }

    /// Open `table` on the decode path. False when it is nested too deep or
    /// already being decoded further up; the caller then yields `Undefined`
    /// and must not call [`DecodeState::leave`].
    fn enter(&self, table: &Table<'_>, state: &mut DecodeState) -> bool {
        if state.depth >= self.limits.max_depth {
            // Reported once per decode
            if !state.truncated {
                state.truncated = true;
                self.reporter.report(&format!(
                    "Nesting depth exceeds limit {}",
                    self.limits.max_depth
                ));
            }
            return false;
        }
        if !state.visiting.insert(table.to_pointer() as usize) {
            tracing::warn!(target: LOG_TARGET, "cyclic table reference decoded as undefined");
            return false;
        }
        state.depth += 1;
        true
    }

    /// Side-channel hint for `key`. `None` means the recorded code was
    /// invalid; that has already been reported.
    fn entry_hint(&self, types: Option<&Table<'_>>, key: &LuaValue<'_>) -> Option<ValueType> {
        let Some(types) = types else {
            return Some(ValueType::Undefined);
        };
        let code = match types.raw_get::<_, LuaValue>(key.clone()) {
            Ok(LuaValue::Nil) | Err(_) => return Some(ValueType::Undefined),
            Ok(code) => code,
        };
        let parsed = match &code {
            LuaValue::Integer(i) => ValueType::from_code(*i),
            LuaValue::Number(n) if n.fract() == 0.0 => ValueType::from_code(*n as i64),
            _ => None,
        };
        if parsed.is_none() {
            let shown = to_text(&code).unwrap_or_else(|| code.type_name().to_string());
            self.reporter.report(&format!("Invalid type code {shown}"));
        }
        parsed
    }
}

/// Containers currently open on the decode path.
#[derive(Default)]
struct DecodeState {
    visiting: HashSet<usize>,
    depth: usize,
    truncated: bool,
}

impl DecodeState {
    fn leave(&mut self, table: &Table<'_>) {
        self.visiting.remove(&(table.to_pointer() as usize));
        self.depth -= 1;
    }
}

fn side_channel<'lua>(table: &Table<'lua>) -> Option<Table<'lua>> {
    match table.raw_get::<_, LuaValue>(TYPE_KEY) {
        Ok(LuaValue::Table(types)) => Some(types),
        _ => None,
    }
}

/// Side-channel keys recorded with the `Undefined` code.
fn undefined_keys<'lua>(types: Option<&Table<'lua>>) -> Vec<LuaValue<'lua>> {
    let Some(types) = types else {
        return Vec::new();
    };
    types
        .clone()
        .pairs::<LuaValue, LuaValue>()
        .filter_map(Result::ok)
        .filter(|(_, code)| matches!(code, LuaValue::Integer(0)))
        .map(|(key, _)| key)
        .collect()
}

fn is_type_key(key: &LuaValue<'_>) -> bool {
    matches!(key, LuaValue::String(s) if s.as_bytes() == TYPE_KEY.as_bytes())
}

/// 1-based index for an array key, if the key is a positive integer.
fn array_index(key: &LuaValue<'_>) -> Option<usize> {
    match key {
        LuaValue::Integer(i) if *i >= 1 => usize::try_from(*i).ok(),
        LuaValue::Number(n) if *n >= 1.0 && n.fract() == 0.0 && *n < usize::MAX as f64 => {
            Some(*n as usize)
        }
        _ => None,
    }
}

/// Empty tables and tables with any non-positive-integer key are maps.
fn looks_like_array(table: &Table<'_>) -> bool {
    let mut empty = true;
    for pair in table.clone().pairs::<LuaValue, LuaValue>() {
        let Ok((key, _)) = pair else {
            return false;
        };
        if is_type_key(&key) {
            continue;
        }
        empty = false;
        if array_index(&key).is_none() {
            return false;
        }
    }
    !empty
}

fn guess_number(n: f64) -> Value {
    let rounded = n.round();
    if (n - rounded).abs() < INTEGER_EPSILON
        && rounded >= f64::from(i32::MIN)
        && rounded <= f64::from(i32::MAX)
    {
        Value::Integer(rounded as i32)
    } else {
        Value::Real(n)
    }
}

fn to_integer(value: &LuaValue<'_>) -> i32 {
    match value {
        LuaValue::Integer(i) => (*i).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        LuaValue::Number(n) => Value::Real(*n).as_integer(),
        LuaValue::String(_) => Value::String(to_text(value).unwrap_or_default()).as_integer(),
        _ => 0,
    }
}

fn to_real(value: &LuaValue<'_>) -> f64 {
    match value {
        LuaValue::Integer(i) => *i as f64,
        LuaValue::Number(n) => *n,
        LuaValue::String(_) => Value::String(to_text(value).unwrap_or_default()).as_real(),
        _ => 0.0,
    }
}

/// Text form of strings and numbers; `None` for every other type.
///
/// Floats use Lua's own formatting so map keys read the same as `tostring`
/// in the script.
fn to_text(value: &LuaValue<'_>) -> Option<String> {
    match value {
        LuaValue::String(s) => Some(String::from_utf8_lossy(s.as_bytes()).into_owned()),
        LuaValue::Integer(i) => Some(i.to_string()),
        LuaValue::Number(n) => Some(value.to_string().unwrap_or_else(|_| n.to_string())),
        _ => None,
    }
}

fn to_bytes(value: &LuaValue<'_>) -> Vec<u8> {
    match value {
        LuaValue::UserData(ud) => match ud.borrow::<BinaryBlob>() {
            Ok(blob) => blob.0.clone(),
            Err(err) => {
                tracing::warn!(target: LOG_TARGET, "userdata is not binary: {err}");
                Vec::new()
            }
        },
        LuaValue::String(s) => s.as_bytes().to_vec(),
        _ => Vec::new(),
    }
}
