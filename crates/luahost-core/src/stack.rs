//! Typed value stack used to pass arguments into and results out of Lua.
//!
//! The last pushed value is the top. Converting to a `MultiValue` yields
//! values bottom first, which is the argument order Lua expects.

use mlua::{MultiValue, Value as LuaValue};

#[derive(Debug, Default)]
pub struct ValueStack<'lua> {
    values: Vec<LuaValue<'lua>>,
}

impl<'lua> ValueStack<'lua> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn push(&mut self, value: LuaValue<'lua>) {
        self.values.push(value);
    }

    pub fn pop(&mut self) -> Option<LuaValue<'lua>> {
        self.values.pop()
    }

    pub fn peek(&self) -> Option<&LuaValue<'lua>> {
        self.values.last()
    }

    pub fn depth(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pad with nil or drop values from the top until the depth is `depth`.
    pub fn resize(&mut self, depth: usize) {
        self.values.resize(depth, LuaValue::Nil);
    }

    pub fn into_multi(self) -> MultiValue<'lua> {
        MultiValue::from_vec(self.values)
    }

    pub fn from_multi(values: MultiValue<'lua>) -> Self {
        Self {
            values: values.into_vec(),
        }
    }

    pub fn into_vec(self) -> Vec<LuaValue<'lua>> {
        self.values
    }
}

impl<'lua> From<Vec<LuaValue<'lua>>> for ValueStack<'lua> {
    fn from(values: Vec<LuaValue<'lua>>) -> Self {
        Self { values }
    }
}
