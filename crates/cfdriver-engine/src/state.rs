//! The resource declaration handed to reconcilers.

use std::collections::BTreeMap;

use crate::value::{AttrValue, Attributes};

/// One resource declaration: its id, the previously recorded attributes and
/// the working attribute set.
///
/// The working set starts as the desired state and is overwritten with
/// observed values as reconcilers read the server back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: String,
    prior: Attributes,
    state: Attributes,
    is_import: bool,
}

impl ResourceData {
    pub fn new(id: impl Into<String>, prior: Attributes, desired: Attributes) -> Self {
        Self {
            id: id.into(),
            prior,
            state: desired,
            is_import: false,
        }
    }

    /// A declaration known only by id.
    pub fn for_import(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_import: true,
            ..Self::default()
        }
    }

    /// A data-source query; there is no prior state.
    pub fn from_attributes(attributes: Attributes) -> Self {
        Self::new("", Attributes::new(), attributes)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Marks the resource as gone.
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn is_import(&self) -> bool {
        self.is_import
    }

    pub fn attributes(&self) -> &Attributes {
        &self.state
    }

    pub fn into_parts(self) -> (String, Attributes) {
        (self.id, self.state)
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.state.get(key)
    }

    /// String attribute, `""` when unset.
    pub fn get_str(&self, key: &str) -> &str {
        self.get(key).and_then(AttrValue::as_str).unwrap_or_default()
    }

    /// Non-empty string attribute.
    pub fn get_opt_str(&self, key: &str) -> Option<&str> {
        Some(self.get_str(key)).filter(|s| !s.is_empty())
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(AttrValue::as_int)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(AttrValue::as_bool)
    }

    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(AttrValue::as_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    pub fn get_map(&self, key: &str) -> BTreeMap<String, String> {
        self.get(key)
            .and_then(AttrValue::as_map)
            .cloned()
            .unwrap_or_default()
    }

    /// Previously recorded map for `key`.
    pub fn prior_map(&self, key: &str) -> BTreeMap<String, String> {
        self.prior
            .get(key)
            .and_then(AttrValue::as_map)
            .cloned()
            .unwrap_or_default()
    }

    /// `(old, new)` for an attribute.
    pub fn get_change(&self, key: &str) -> (Option<&AttrValue>, Option<&AttrValue>) {
        (self.prior.get(key), self.state.get(key))
    }

    /// Whether the attribute differs from the recorded state. Empty values
    /// compare equal to absent ones.
    pub fn has_change(&self, key: &str) -> bool {
        let significant = |v: Option<&AttrValue>| v.filter(|v| !v.is_empty()).cloned();
        let (old, new) = self.get_change(key);
        significant(old) != significant(new)
    }

    pub fn has_any_change(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.has_change(k))
    }

    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.state.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) {
        self.state.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, AttrValue)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_change_detection() {
        let prior = attrs(&[
            ("name", "a".into()),
            ("tags", AttrValue::List(vec![])),
            ("memory", 256i64.into()),
        ]);
        let desired = attrs(&[("name", "b".into()), ("memory", 256i64.into())]);
        let data = ResourceData::new("g", prior, desired);

        assert!(data.has_change("name"));
        assert!(!data.has_change("tags"));
        assert!(!data.has_change("memory"));
        assert!(!data.has_change("missing"));
        assert!(data.has_any_change(&["tags", "name"]));
    }

    #[test]
    fn test_typed_getters() {
        let mut data = ResourceData::from_attributes(attrs(&[
            ("name", "web".into()),
            ("empty", "".into()),
            ("instances", 2i64.into()),
        ]));
        assert_eq!(data.get_str("name"), "web");
        assert_eq!(data.get_opt_str("empty"), None);
        assert_eq!(data.get_int("instances"), Some(2));
        assert_eq!(data.get_bool("instances"), None);
        assert!(data.get_map("labels").is_empty());

        data.set("enable_ssh", true);
        assert_eq!(data.get_bool("enable_ssh"), Some(true));
    }

    #[test]
    fn test_import_starts_empty() {
        let mut data = ResourceData::for_import("guid");
        assert!(data.is_import());
        assert_eq!(data.id(), "guid");
        assert!(data.attributes().is_empty());
        data.clear_id();
        assert_eq!(data.id(), "");
    }
}
