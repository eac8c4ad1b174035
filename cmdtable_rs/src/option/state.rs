//! Per-dispatch option values, keyed by identifier.

use std::collections::BTreeMap;

use super::kind::OptionValue;

/// Values produced by one parse, keyed by option identifier.
///
/// Created fresh for every dispatch call and handed to the invoker afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionState {
    values: BTreeMap<String, OptionValue>,
}

impl OptionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ident: &str) -> Option<&OptionValue> {
        self.values.get(ident)
    }

    pub fn contains(&self, ident: &str) -> bool {
        self.values.contains_key(ident)
    }

    pub fn insert(&mut self, ident: impl Into<String>, value: OptionValue) {
        self.values.insert(ident.into(), value);
    }

    pub fn remove(&mut self, ident: &str) -> Option<OptionValue> {
        self.values.remove(ident)
    }

    pub(crate) fn get_mut(&mut self, ident: &str) -> Option<&mut OptionValue> {
        self.values.get_mut(ident)
    }

    /// Remove `ident` and report whether it was set to a truthy value.
    pub fn take_flag(&mut self, ident: &str) -> bool {
        self.remove(ident).is_some_and(|v| v.is_truthy())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for OptionState {
    type Item = (String, OptionValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, OptionValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
