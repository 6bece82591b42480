use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Metadata key holding the reviewed product's title.
pub const TITLE_KEY: &str = "product_title";

/// An immutable unit of retrievable content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Content hash of `text` and `metadata`; the index key.
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(text: impl Into<String>, metadata: BTreeMap<String, String>) -> Self {
        let text = text.into();
        let id = content_hash(&text, &metadata);
        Self { id, text, metadata }
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.get(TITLE_KEY).map(String::as_str)
    }
}

/// A retrieved document with its similarity score (higher = closer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: Document,
    pub score: f32,
}

fn content_hash(text: &str, metadata: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0u8]);
    for (key, value) in metadata {
        hasher.update(key.as_bytes());
        hasher.update([b'=']);
        hasher.update(value.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str, text: &str) -> Document {
        let mut metadata = BTreeMap::new();
        metadata.insert(TITLE_KEY.to_string(), title.to_string());
        Document::new(text, metadata)
    }

    #[test]
    fn id_is_stable_for_identical_content() {
        let a = titled("Gaming Laptop X", "Great FPS");
        let b = titled("Gaming Laptop X", "Great FPS");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 64);
        assert_eq!(a.title(), Some("Gaming Laptop X"));
    }

    #[test]
    fn id_changes_with_text_or_metadata() {
        let base = titled("Gaming Laptop X", "Great FPS");
        assert_ne!(base.id, titled("Gaming Laptop Y", "Great FPS").id);
        assert_ne!(base.id, titled("Gaming Laptop X", "Great FPS!").id);
        assert_ne!(base.id, Document::new("Great FPS", BTreeMap::new()).id);
    }
}
