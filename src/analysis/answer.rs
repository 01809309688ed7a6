//! Answer and question classification
//!
//! Submissions arrive as loosely-typed JSON: numbers for scale answers,
//! strings for free text, a sentinel-prefixed string for uploaded
//! images, and objects for structured widgets. Classification happens
//! once, up front, so prompt assembly works over a closed set of shapes.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Prefix marking a string answer as an uploaded-image reference
pub const IMAGE_ANSWER_PREFIX: &str = "IMAGE_URL:";

/// A classified answer value
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Numeric rating, e.g. a 1-5 scale
    Scale(f64),
    /// Free text
    Text(String),
    /// URL of an image the user uploaded as their answer
    ImageRef(String),
    /// Structured widget output; rendered from its `text`/`answer` field
    Structured(serde_json::Map<String, Value>),
}

impl Answer {
    pub fn classify(value: &Value) -> Answer {
        match value {
            Value::Number(n) => Answer::Scale(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => match s.strip_prefix(IMAGE_ANSWER_PREFIX) {
                Some(url) => Answer::ImageRef(url.to_string()),
                None => Answer::Text(s.clone()),
            },
            Value::Object(map) => Answer::Structured(map.clone()),
            other => Answer::Text(other.to_string()),
        }
    }

    /// Text rendering for structured answers: prefer the conventional
    /// fields, fall back to the raw JSON so nothing is silently dropped
    pub fn structured_text(map: &serde_json::Map<String, Value>) -> String {
        map.get("text")
            .or_else(|| map.get("answer"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map.clone()).to_string())
    }
}

/// A normalized question: display text plus an optional illustration
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub text: String,
    pub image_url: Option<String>,
}

impl Question {
    pub fn classify(value: &Value) -> Question {
        match value {
            Value::String(s) => Question {
                text: s.clone(),
                image_url: None,
            },
            Value::Object(map) => Question {
                text: map
                    .get("text")
                    .or_else(|| map.get("question"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                image_url: map
                    .get("imageUrl")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            other => Question {
                text: other.to_string(),
                image_url: None,
            },
        }
    }
}

/// Durable cache key: SHA-256 over a canonical JSON encoding of the
/// definition id and the answer list. Identical re-submissions hash
/// identically regardless of who submits them.
pub fn analysis_cache_key(definition_id: &str, answers: &[Value]) -> String {
    #[derive(Serialize)]
    struct KeyMaterial<'a> {
        #[serde(rename = "testId")]
        definition_id: &'a str,
        answers: &'a [Value],
    }

    let encoded = serde_json::to_vec(&KeyMaterial {
        definition_id,
        answers,
    })
    .unwrap_or_default();

    hex::encode(Sha256::digest(&encoded))
}
