//! Structured finding values shared by every analyzer.
//!
//! A [`FindingValue`] is a small JSON-like tree. Maps keep insertion order so
//! reports render the same way every time.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A node of a finding tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FindingValue {
    /// Boolean flag.
    Bool(bool),
    /// Numeric measurement.
    Number(f64),
    /// Free-form text.
    Text(String),
    /// Ordered sequence.
    List(Vec<FindingValue>),
    /// Ordered key/value map.
    Map(Vec<(String, FindingValue)>),
}

impl FindingValue {
    /// Create an empty map.
    pub fn map() -> Self {
        FindingValue::Map(Vec::new())
    }

    /// Builder-style insert; replaces an existing key in place.
    ///
    /// Has no effect on non-map values.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FindingValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a key in a map value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FindingValue>) {
        if let FindingValue::Map(entries) = self {
            let key = key.into();
            let value = value.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
    }

    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&FindingValue> {
        match self {
            FindingValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Follow a dotted path through nested maps, e.g. `"zero_width.present"`.
    pub fn get_path(&self, path: &str) -> Option<&FindingValue> {
        path.split('.').try_fold(self, |node, key| node.get(key))
    }

    /// Boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FindingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric payload, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FindingValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FindingValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List items, if any.
    pub fn as_list(&self) -> Option<&[FindingValue]> {
        match self {
            FindingValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Number of keys in a map, or items in a list.
    pub fn len(&self) -> usize {
        match self {
            FindingValue::List(items) => items.len(),
            FindingValue::Map(entries) => entries.len(),
            _ => 0,
        }
    }

    /// True for empty maps and lists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FindingValue {
    fn default() -> Self {
        FindingValue::map()
    }
}

impl Serialize for FindingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FindingValue::Bool(b) => serializer.serialize_bool(*b),
            // Integral measurements render without a fractional part.
            FindingValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            FindingValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            FindingValue::Number(_) => serializer.serialize_none(),
            FindingValue::Text(s) => serializer.serialize_str(s),
            FindingValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FindingValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for FindingValue {
    fn from(b: bool) -> Self {
        FindingValue::Bool(b)
    }
}

impl From<f64> for FindingValue {
    fn from(n: f64) -> Self {
        FindingValue::Number(n)
    }
}

impl From<usize> for FindingValue {
    fn from(n: usize) -> Self {
        FindingValue::Number(n as f64)
    }
}

impl From<u32> for FindingValue {
    fn from(n: u32) -> Self {
        FindingValue::Number(f64::from(n))
    }
}

impl From<&str> for FindingValue {
    fn from(s: &str) -> Self {
        FindingValue::Text(s.to_string())
    }
}

impl From<String> for FindingValue {
    fn from(s: String) -> Self {
        FindingValue::Text(s)
    }
}

impl<T: Into<FindingValue>> From<Vec<T>> for FindingValue {
    fn from(items: Vec<T>) -> Self {
        FindingValue::List(items.into_iter().map(Into::into).collect())
    }
}
