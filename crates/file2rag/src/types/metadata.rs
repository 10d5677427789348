//! Immutable metadata mapping shared by raw documents and chunks

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Well-known metadata keys
pub mod keys {
    pub const SOURCE: &str = "source";
    pub const FILE_TYPE: &str = "file_type";
    pub const CONTENT_TYPE: &str = "content_type";
    pub const CONTENT_HASH: &str = "content_hash";
    pub const PAGE: &str = "page";
    pub const TOTAL_PAGES: &str = "total_pages";
    pub const SHEET: &str = "sheet";
    pub const SHEET_INDEX: &str = "sheet_index";
    pub const ROW_COUNT: &str = "row_count";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const LANGUAGE: &str = "language";
    pub const ERROR: &str = "error";
    pub const ERROR_MESSAGE: &str = "error_message";

    // Chunker enrichment
    pub const CHUNK_INDEX: &str = "chunk_index";
    pub const TOTAL_CHUNKS: &str = "total_chunks";
    pub const CHUNK_SIZE: &str = "chunk_size";
    pub const IS_COMPLETE_DOCUMENT: &str = "is_complete_document";
    pub const ORIGINAL_LENGTH: &str = "original_length";
    pub const SPLITTER_TYPE: &str = "splitter_type";
    pub const CHUNK_OVERLAP: &str = "chunk_overlap";
    pub const CHUNK_SIZE_CONFIG: &str = "chunk_size_config";
    pub const ROWS_PER_CHUNK: &str = "rows_per_chunk";
}

/// String-keyed mapping of scalar/list values.
///
/// Cloning is cheap; mutation goes through [`Metadata::with`] and
/// [`Metadata::extend`], both of which copy on write and leave the
/// original untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(Arc<BTreeMap<String, Value>>);

impl Metadata {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `key` set to `value`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.0).insert(key.into(), value.into());
        self
    }

    /// Return a copy of `self` extended with `fields`.
    ///
    /// A field whose key already exists in `self` is rejected with
    /// [`Error::MetadataCollision`] unless the key is listed in `overrides`.
    pub fn extend<K, I>(&self, fields: I, overrides: &[&str]) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut merged = self.clone();
        let map = Arc::make_mut(&mut merged.0);
        for (key, value) in fields {
            let key = key.into();
            if self.0.contains_key(&key) && !overrides.contains(&key.as_str()) {
                return Err(Error::MetadataCollision(key));
            }
            map.insert(key, value);
        }
        Ok(merged)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        BTreeMap::deserialize(deserializer).map(|map| Self(Arc::new(map)))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(Arc::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }
}
