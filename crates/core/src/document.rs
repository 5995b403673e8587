//! Core document types for vecpipe.
//!
//! A `Document` is the unit of storage and retrieval: text or binary content, a
//! stable string id, key-value metadata used by filters, and an optional embedding.
//! `MetadataValue` supports null, boolean, integer, float, string, and list values.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A typed metadata value attached to a document, also used as the literal in filters.
///
/// Serialized untagged, so metadata maps read and write as plain JSON objects.
/// Variant order matters for deserialization: integers are tried before floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// JSON `null`. Treated as an absent field by the filter engine.
    Null,
    /// Boolean value (`true` / `false`).
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating-point number.
    Float(f64),
    /// UTF-8 string. Also carries ISO-8601 dates for ordering comparisons.
    String(String),
    /// Homogeneous or mixed list of values.
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    /// Numeric view of integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Integer(i) => Some(*i as f64),
            MetadataValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MetadataValue::Null => "null",
            MetadataValue::Boolean(_) => "boolean",
            MetadataValue::Integer(_) => "integer",
            MetadataValue::Float(_) => "float",
            MetadataValue::String(_) => "string",
            MetadataValue::List(_) => "list",
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        MetadataValue::Boolean(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Integer(v)
    }
}

impl From<i32> for MetadataValue {
    fn from(v: i32) -> Self {
        MetadataValue::Integer(v.into())
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::String(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::String(v)
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(v: Vec<T>) -> Self {
        MetadataValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// A stored document with content, unique id, metadata, and optional embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier, user-supplied or derived from the document's contents.
    pub id: String,
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Binary content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<Vec<u8>>,
    /// Arbitrary key-value metadata for filtering.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, MetadataValue>,
    /// Embedding vector. Documents without one are never returned by vector search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Relevance score, set on retrieval results only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Document {
    /// Starts building a document.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Creates a text document with a content-derived id.
    pub fn from_content(content: impl Into<String>) -> Self {
        Self::builder().content(content).build()
    }

    /// Hex SHA-256 over content, blob, metadata, and embedding.
    ///
    /// Two documents with equal payloads always hash to the same id, so re-writing
    /// identical content is caught by the store's duplicate policy.
    pub fn content_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_deref().unwrap_or_default().as_bytes());
        hasher.update([0x1f]);
        if let Some(ref blob) = self.blob {
            hasher.update(blob);
        }
        hasher.update([0x1f]);
        // BTreeMap serialization is key-ordered, hence stable across runs.
        hasher.update(serde_json::to_vec(&self.meta).unwrap_or_default());
        hasher.update([0x1f]);
        if let Some(ref embedding) = self.embedding {
            for x in embedding {
                hasher.update(x.to_le_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// Resolves a filter field path against this document.
    ///
    /// `id` and `content` address the document's own fields, `meta.<key>` addresses
    /// metadata, and any other bare name is looked up as a metadata key. A `null`
    /// metadata value resolves to `None`, the same as a missing key.
    pub fn field(&self, path: &str) -> Option<Cow<'_, MetadataValue>> {
        let value = match path {
            "id" => return Some(Cow::Owned(MetadataValue::String(self.id.clone()))),
            "content" => {
                return self
                    .content
                    .as_ref()
                    .map(|c| Cow::Owned(MetadataValue::String(c.clone())))
            }
            _ => {
                let key = path.strip_prefix("meta.").unwrap_or(path);
                self.meta.get(key)?
            }
        };
        match value {
            MetadataValue::Null => None,
            v => Some(Cow::Borrowed(v)),
        }
    }
}

/// Builder for [`Document`]. The id is derived from the contents at [`build`](Self::build)
/// unless one was set explicitly.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    id: Option<String>,
    content: Option<String>,
    blob: Option<Vec<u8>>,
    meta: BTreeMap<String, MetadataValue>,
    embedding: Option<Vec<f32>>,
}

impl DocumentBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn blob(mut self, blob: Vec<u8>) -> Self {
        self.blob = Some(blob);
        self
    }

    /// Sets a single metadata entry, replacing any previous value for `key`.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn metadata(mut self, meta: BTreeMap<String, MetadataValue>) -> Self {
        self.meta = meta;
        self
    }

    pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn build(self) -> Document {
        let mut doc = Document {
            id: String::new(),
            content: self.content,
            blob: self.blob,
            meta: self.meta,
            embedding: self.embedding,
            score: None,
        };
        doc.id = match self.id {
            Some(id) => id,
            None => doc.content_id(),
        };
        doc
    }
}
