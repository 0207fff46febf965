//! A text passage plus metadata: the unit retrieved, graded and cited.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the file path or URL a document came from.
pub const SOURCE_KEY: &str = "source";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_source(self, source: impl Into<String>) -> Self {
        self.with_metadata(SOURCE_KEY, source.into())
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }
}

/// Joins page contents with blank lines, the form documents take inside prompts.
pub fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| d.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_round_trips_through_metadata() {
        let doc = Document::new("body").with_source("notes/agents.md");
        assert_eq!(doc.source(), Some("notes/agents.md"));
        assert_eq!(Document::new("x").source(), None);
    }

    #[test]
    fn deserializes_without_metadata() {
        let doc: Document = serde_json::from_str(r#"{"page_content":"hi"}"#).unwrap();
        assert_eq!(doc, Document::new("hi"));
    }

    #[test]
    fn format_documents_joins_with_blank_line() {
        let docs = vec![Document::new("a"), Document::new("b")];
        assert_eq!(format_documents(&docs), "a\n\nb");
        assert_eq!(format_documents(&[]), "");
    }
}
