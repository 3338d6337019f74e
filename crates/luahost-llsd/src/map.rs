use crate::Value;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// String-keyed map of values. Keys are unique.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Map {
    inner: BTreeMap<String, Value>,
}

impl Drop for Map {
    fn drop(&mut self) {
        for (_, child) in std::mem::take(&mut self.inner) {
            crate::drop::safely(child);
        }
    }
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<BTreeMap<String, Value>> for Map {
    fn from(inner: BTreeMap<String, Value>) -> Self {
        Self { inner }
    }
}

impl Deref for Map {
    type Target = BTreeMap<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Map {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(mut self) -> Self::IntoIter {
        std::mem::take(&mut self.inner).into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            inner: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
