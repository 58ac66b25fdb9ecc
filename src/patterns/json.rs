//! Pull a JSON object out of a free-text reply.
//!
//! Models tend to wrap JSON in prose or ```json fences. The first fenced
//! block that parses wins; otherwise the outermost `{ ... }` span is tried.

use serde_json::Value;

use crate::error::{ReflectorError, Result};

pub fn extract_json(reply: &str) -> Result<Value> {
    for block in fenced_blocks(reply) {
        if let Ok(value) = serde_json::from_str::<Value>(block.trim())
            && value.is_object()
        {
            return Ok(value);
        }
    }

    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}'))
        && start < end
        && let Ok(value) = serde_json::from_str::<Value>(&reply[start..=end])
    {
        return Ok(value);
    }

    Err(ReflectorError::Parse(format!(
        "No JSON object found in reply: {}",
        truncate_for_error(reply, 100)
    )))
}

/// Bodies of ``` fenced blocks, with any language tag stripped
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        match body.find("```") {
            Some(close) => {
                blocks.push(&body[..close]);
                rest = &body[close + 3..];
            }
            None => break,
        }
    }
    blocks
}

fn truncate_for_error(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_object() {
        let value = extract_json(r#"{"cpu": "3.5 GHz", "memory": "16GB", "storage": "1TB"}"#).unwrap();
        assert_eq!(value["memory"], "16GB");
    }

    #[test]
    fn test_fenced_object() {
        let reply = "Here you go:\n```json\n{\"cpu\": \"octa-core\"}\n```\nAnything else?";
        let value = extract_json(reply).unwrap();
        assert_eq!(value["cpu"], "octa-core");
    }

    #[test]
    fn test_object_in_prose() {
        let reply = "Sure! {\"storage\": \"1TB NVMe\"} is the result.";
        assert_eq!(extract_json(reply).unwrap()["storage"], "1TB NVMe");
    }

    #[test]
    fn test_skips_non_json_fence() {
        let reply = "```python\nprint('hi')\n```\n```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(reply).unwrap()["a"], 1);
    }

    #[test]
    fn test_no_json() {
        let result = extract_json("I could not find any specifications.");
        assert!(matches!(result, Err(ReflectorError::Parse(_))));
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "é".repeat(80);
        let truncated = truncate_for_error(&text, 101);
        assert!(truncated.ends_with("..."));
    }
}
