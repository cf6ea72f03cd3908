// src/analyze/structured_data.rs
// =============================================================================
// JSON-LD blocks found in <script type="application/ld+json"> elements.
//
// A block is either valid JSON (kept as-is, any shape) or a truncated raw
// stub of the text that failed to parse. Malformed blocks are kept so the
// cross-page checker can still report "a block was here but broken".
// Reports read back from JSON keep the distinction.
// =============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Serialized untagged: parsed blocks appear verbatim, stubs as {"raw": "..."}
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredData {
    Parsed(Value),
    Raw { raw: String },
}

// An object whose only key is a string "raw" reads back as a stub; anything
// else is a parsed block
impl<'de> Deserialize<'de> for StructuredData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;

        if let Value::Object(object) = &value {
            if let (1, Some(Value::String(raw))) = (object.len(), object.get("raw")) {
                return Ok(StructuredData::Raw { raw: raw.clone() });
            }
        }

        Ok(StructuredData::Parsed(value))
    }
}

impl StructuredData {
    // Parses one script body, falling back to a stub of at most `max_raw_chars`
    pub fn parse(text: &str, max_raw_chars: usize) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => StructuredData::Parsed(value),
            Err(_) => StructuredData::Raw {
                raw: text.chars().take(max_raw_chars).collect(),
            },
        }
    }

    /// The top-level JSON object, if this block is one
    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            StructuredData::Parsed(value) => value.as_object(),
            StructuredData::Raw { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_is_parsed() {
        let block = StructuredData::parse(r#"{"@type": "Article"}"#, 500);
        assert_eq!(block.as_object().unwrap()["@type"], "Article");
    }

    #[test]
    fn test_malformed_json_becomes_truncated_stub() {
        let text = format!("{{\"@type\": \"Article\", {}", "x".repeat(1000));
        let block = StructuredData::parse(&text, 500);

        match block {
            StructuredData::Raw { raw } => {
                assert_eq!(raw.chars().count(), 500);
                assert!(raw.starts_with("{\"@type\""));
            }
            other => panic!("expected a raw stub, got {:?}", other),
        }
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let block = StructuredData::parse("ééééé not json", 3);
        assert_eq!(
            block,
            StructuredData::Raw {
                raw: "ééé".to_string()
            }
        );
    }

    #[test]
    fn test_serializes_untagged() {
        let parsed = StructuredData::parse(r#"{"a":1}"#, 500);
        let raw = StructuredData::parse("{oops", 500);

        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"a":1}"#);
        assert_eq!(serde_json::to_string(&raw).unwrap(), r#"{"raw":"{oops"}"#);
    }

    #[test]
    fn test_stub_survives_json_round_trip() {
        let raw = StructuredData::parse("{oops", 500);
        let parsed = StructuredData::parse(r#"{"@type":"Article","raw":"not a stub"}"#, 500);

        let raw_back: StructuredData =
            serde_json::from_str(&serde_json::to_string(&raw).unwrap()).unwrap();
        let parsed_back: StructuredData =
            serde_json::from_str(&serde_json::to_string(&parsed).unwrap()).unwrap();

        assert_eq!(raw_back, raw);
        assert_eq!(parsed_back, parsed);
        assert!(raw_back.as_object().is_none());
    }
}
