//! Response parsing: JSON first, text fallback.
//!
//! This layer has no agent-specific knowledge. It turns whatever an agent
//! printed on stdout into a `StructuredResult` and never fails: output
//! that cannot be decoded degrades to a text result.
//!
//! # Strategy
//!
//! 1. Trim surrounding whitespace.
//! 2. Decode the whole output as JSON. An object with a recognized string
//!    content field becomes a `json` result; its other fields become metadata.
//! 3. Otherwise scan for the leftmost embedded `{...}` fragment that decodes
//!    and carries a content field (agents often wrap JSON in prose or prefix
//!    it with log lines).
//! 4. Otherwise the trimmed output is the content, verbatim, as `text`.

mod fragment;


pub use fragment::{
    MAX_FRAGMENT_CANDIDATES, extract_last_json_array, extract_last_json_object,
    find_structured_fragment,
};

use crate::model::StructuredResult;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fields that may carry the agent's primary answer, in priority order.
pub const CONTENT_FIELDS: [&str; 6] = ["response", "result", "answer", "content", "output", "text"];

/// Parse raw agent stdout into a structured result.
///
/// Pure and deterministic: the same input always yields an identical result.
pub fn parse_output(stdout: &str) -> StructuredResult {
    let trimmed = stdout.trim();

    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(trimmed)
        && let Some((content, metadata)) = split_content(object)
    {
        return StructuredResult::json(content, metadata, stdout);
    }

    if let Some((content, metadata)) = find_structured_fragment(trimmed) {
        return StructuredResult::json(content, metadata, stdout);
    }

    StructuredResult::text(trimmed.to_string(), stdout)
}

/// Split a decoded object into its content field and the remaining metadata.
///
/// Returns `None` when no recognized field holds a string.
pub(crate) fn split_content(
    mut object: Map<String, Value>,
) -> Option<(String, BTreeMap<String, Value>)> {
    let field = CONTENT_FIELDS
        .iter()
        .find(|field| matches!(object.get(**field), Some(Value::String(_))))?;

    let content = match object.remove(*field) {
        Some(Value::String(content)) => content,
        _ => return None,
    };
    Some((content, object.into_iter().collect()))
}
