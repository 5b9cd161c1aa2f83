//! Ordered string collections in the shapes the admin API expects, and the
//! base64 header payload codec.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{GatewayError, Result};

/// Ordered `key -> value` entries, serialized as `["key:value", ...]`.
///
/// Adding an existing key replaces its value in place, keeping the position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringMap {
    entries: Vec<(String, String)>,
}

impl StringMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Removes `key`, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for StringMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter().map(|(k, v)| format!("{}:{}", k, v)))
    }
}

impl<'de> Deserialize<'de> for StringMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        let mut map = StringMap::new();
        for entry in raw {
            let (key, value) = entry
                .split_once(':')
                .ok_or_else(|| serde::de::Error::custom(format!("missing ':' in '{}'", entry)))?;
            map.add(key, value);
        }
        Ok(map)
    }
}

/// Insertion-ordered set of strings, serialized as a JSON array
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringSet {
    items: Vec<String>,
}

impl StringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` unless it is already present
    pub fn add(&mut self, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if !self.items.contains(&value) {
            self.items.push(value);
        }
        self
    }

    pub fn extend<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.add(value);
        }
        self
    }

    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item != value);
        before != self.items.len()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.items.iter().any(|item| item == value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for StringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = StringSet::new();
        set.extend(iter);
        set
    }
}

/// Compact JSON, standard-alphabet base64
pub fn to_base64<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|e| GatewayError::Serialization {
        context: "encoding header payload".to_string(),
        source: e,
    })?;
    Ok(STANDARD.encode(json))
}

/// Inverse of [`to_base64`]
pub fn from_base64<T: DeserializeOwned>(encoded: &str) -> Result<T> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| GatewayError::validation(format!("invalid base64 payload: {}", e)))?;
    if bytes.is_empty() {
        return Err(GatewayError::validation("empty base64 payload"));
    }
    serde_json::from_slice(&bytes).map_err(|e| GatewayError::Serialization {
        context: "decoding header payload".to_string(),
        source: e,
    })
}
