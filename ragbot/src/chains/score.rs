//! Binary yes/no score as returned by grader models.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A yes/no verdict. Deserializes from a JSON bool or from the strings
/// `yes`/`no`/`true`/`false` (any case); any other string reads as "no".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryScore(pub bool);

impl BinaryScore {
    pub fn yes() -> Self {
        Self(true)
    }

    pub fn no() -> Self {
        Self(false)
    }

    pub fn is_yes(&self) -> bool {
        self.0
    }
}

impl Serialize for BinaryScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.0 { "yes" } else { "no" })
    }
}

impl<'de> Deserialize<'de> for BinaryScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => BinaryScore(b),
            Raw::Text(s) => {
                let s = s.trim().to_ascii_lowercase();
                BinaryScore(s == "yes" || s == "true")
            }
        })
    }
}

/// JSON schema fragment for a `binary_score` property.
pub(crate) fn binary_score_schema(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "binary_score": {
                "type": "string",
                "enum": ["yes", "no"],
                "description": description
            }
        },
        "required": ["binary_score"]
    })
}
