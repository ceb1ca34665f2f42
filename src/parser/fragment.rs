//! Locating JSON embedded in noisy output.
//!
//! Two scanning directions are provided:
//!
//! - `find_structured_fragment` walks left to right and returns the first
//!   top-level object that decodes and carries a content field. This is the
//!   answer-extraction path.
//! - `extract_last_json_object` / `extract_last_json_array` walk right to
//!   left with bracket depth matching. CLIs append error blocks at the end
//!   of stderr after log lines and stack traces, so the last block is the
//!   interesting one there.

use super::split_content;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Maximum number of `{` positions tried before giving up.
pub const MAX_FRAGMENT_CANDIDATES: usize = 64;

/// Find the leftmost decodable top-level object with a content field.
///
/// Decoding stops at the end of the first complete value, so a fragment
/// followed by prose is still found. Objects that decode but carry no
/// content field are skipped as a whole, which keeps their nested objects
/// from being mistaken for top-level ones.
pub fn find_structured_fragment(text: &str) -> Option<(String, BTreeMap<String, Value>)> {
    let mut search_from = 0;
    let mut candidates = 0;

    while let Some(offset) = text[search_from..].find('{') {
        if candidates == MAX_FRAGMENT_CANDIDATES {
            return None;
        }
        candidates += 1;

        let start = search_from + offset;
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                let consumed = stream.byte_offset();
                if let Value::Object(object) = value
                    && let Some(found) = split_content(object)
                {
                    return Some(found);
                }
                search_from = start + consumed.max(1);
            }
            // `{` is one byte, so start + 1 is always a char boundary.
            _ => search_from = start + 1,
        }
    }

    None
}

/// Find the rightmost balanced bracket span ending before `search_end`.
///
/// Returns the inclusive byte range of the span.
fn find_balanced_span(text: &str, open: u8, close: u8, search_end: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let last_close = bytes[..search_end].iter().rposition(|&b| b == close)?;

    let mut depth = 0usize;
    for i in (0..=last_close).rev() {
        if bytes[i] == close {
            depth += 1;
        } else if bytes[i] == open {
            depth -= 1;
            if depth == 0 {
                return Some((i, last_close));
            }
        }
    }

    None
}

/// Find and decode the last JSON object in a multi-line string.
pub fn extract_last_json_object(text: &str) -> Option<Map<String, Value>> {
    if text.is_empty() {
        return None;
    }

    let (start, end) = find_balanced_span(text, b'{', b'}', text.len())?;
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Find the last JSON array in a multi-line string and return its first
/// element when that element is an object.
///
/// `]` characters inside string values (such as `"[object Object]"`) produce
/// spans that fail to decode; each candidate is tried in turn, moving left.
pub fn extract_last_json_array(text: &str) -> Option<Map<String, Value>> {
    let mut search_end = text.len();

    loop {
        let (start, last_close) = find_balanced_span(text, b'[', b']', search_end)?;

        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&text[start..=last_close])
            && let Some(Value::Object(first)) = items.into_iter().next()
        {
            return Some(first);
        }

        search_end = last_close;
    }
}
