//! The normalized result every runner produces.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which parsing strategy produced `content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    /// Extracted from a decoded JSON object.
    Json,
    /// The whole output, taken verbatim.
    Text,
}

/// Record of output that was cut down to the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
    /// Size of the content before truncation.
    pub original_bytes: usize,
    /// The limit that was applied.
    pub limit_bytes: usize,
}

/// Normalized answer from an agent.
///
/// `format` always reflects the strategy that actually succeeded; it is
/// never a caller hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResult {
    pub success: bool,
    /// The agent's primary answer.
    pub content: String,
    pub format: ResultFormat,
    /// The original output, kept for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Remaining fields of the decoded object (empty for text results).
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation: Option<Truncation>,
}

impl StructuredResult {
    /// A result extracted from a JSON object.
    pub fn json(content: String, metadata: BTreeMap<String, Value>, raw: &str) -> Self {
        Self {
            success: true,
            content,
            format: ResultFormat::Json,
            raw: Some(raw.to_string()),
            metadata,
            truncation: None,
        }
    }

    /// A result that is the output verbatim.
    pub fn text(content: String, raw: &str) -> Self {
        Self {
            success: true,
            content,
            format: ResultFormat::Text,
            raw: Some(raw.to_string()),
            metadata: BTreeMap::new(),
            truncation: None,
        }
    }

    /// Cut `content` and `raw` down to at most `limit` bytes.
    ///
    /// Cuts land on a char boundary, so the result may be slightly shorter
    /// than `limit`. Returns `self` unchanged when both fit. `original_bytes`
    /// records the larger of the two original lengths.
    pub fn truncated(mut self, limit: usize) -> Self {
        let raw_bytes = self.raw.as_ref().map_or(0, String::len);
        let original_bytes = self.content.len().max(raw_bytes);
        if original_bytes <= limit {
            return self;
        }
        truncate_at_boundary(&mut self.content, limit);
        if let Some(raw) = self.raw.as_mut() {
            truncate_at_boundary(raw, limit);
        }
        self.truncation = Some(Truncation {
            original_bytes,
            limit_bytes: limit,
        });
        self
    }
}

fn truncate_at_boundary(s: &mut String, limit: usize) {
    if s.len() <= limit {
        return;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
