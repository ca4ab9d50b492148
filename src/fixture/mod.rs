//! Fixture rows
//!
//! A fixture file supplies one row per scenario invocation. Rows keep their
//! field order and represent unset values as empty strings, which is how the
//! remote API reports unset optional fields.

mod loader;

pub use loader::{Fixture, FixtureFormat, FixtureRows};
pub(crate) use loader::scalar_text;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One ordered set of named string values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureRow {
    /// 1-based source line (CSV) or element index (JSON), 0 when synthetic
    line: usize,
    fields: Vec<(String, String)>,
}

impl FixtureRow {
    /// Create an empty row attributed to a source line
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: Vec::new(),
        }
    }

    /// Build a synthetic row from name/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::default();
        for (name, value) in pairs {
            row.set(name, value);
        }
        row
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Value of a field, if the row has it
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a field, empty when the row lacks it
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a field, replacing in place or appending at the end
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Name/value pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Short human label, e.g. `email=katie@example.com, password=…`
    pub fn label(&self) -> String {
        if self.fields.is_empty() {
            return "(no fields)".to_string();
        }
        self.fields
            .iter()
            .take(3)
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Serialize for FixtureRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_order_and_replaces_in_place() {
        let mut row = FixtureRow::from_pairs([("id", "3"), ("brand", "H&M")]);
        row.set("id", "4");
        row.set("extra", "");

        let names: Vec<&str> = row.names().collect();
        assert_eq!(names, vec!["id", "brand", "extra"]);
        assert_eq!(row.get("id"), Some("4"));
        assert_eq!(row.get("extra"), Some(""));
    }

    #[test]
    fn test_value_defaults_to_empty() {
        let row = FixtureRow::from_pairs([("email", "a@b.c")]);
        assert_eq!(row.value("company"), "");
        assert!(!row.contains("company"));
    }

    #[test]
    fn test_remove() {
        let mut row = FixtureRow::from_pairs([("email", "a@b.c"), ("password", "x")]);
        assert_eq!(row.remove("email"), Some("a@b.c".to_string()));
        assert_eq!(row.remove("email"), None);
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let row = FixtureRow::from_pairs([("z", "1"), ("a", "2")]);
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"z":"1","a":"2"}"#);
    }
}
