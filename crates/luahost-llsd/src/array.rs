use crate::Value;
use std::ops::{Deref, DerefMut};

/// 0-indexed, growable sequence of values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Array {
    inner: Vec<Value>,
}

impl From<Vec<Value>> for Array {
    fn from(inner: Vec<Value>) -> Self {
        Self { inner }
    }
}

impl Drop for Array {
    fn drop(&mut self) {
        self.inner.drain(..).for_each(crate::drop::safely);
    }
}

impl Array {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Store `value` at `index`, growing the array with `Undefined`
    /// padding when the index is past the end.
    pub fn set(&mut self, index: usize, value: Value) {
        if index >= self.inner.len() {
            self.inner.resize_with(index + 1, Value::default);
        }
        self.inner[index] = value;
    }

    /// Extend with `Undefined` entries until the array holds `len` items.
    pub fn pad_to(&mut self, len: usize) {
        if len > self.inner.len() {
            self.inner.resize_with(len, Value::default);
        }
    }
}

impl Deref for Array {
    type Target = Vec<Value>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Array {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl IntoIterator for Array {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(mut self) -> Self::IntoIter {
        std::mem::take(&mut self.inner).into_iter()
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut Array {
    type Item = &'a mut Value;
    type IntoIter = std::slice::IterMut<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self {
            inner: Vec::from_iter(iter),
        }
    }
}
