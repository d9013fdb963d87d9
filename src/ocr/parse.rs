//! Response parsing with raw-text fallback
//!
//! The remote service is not forced onto an output schema, so responses
//! range from clean JSON to fenced Markdown blocks to free-form prose.
//! Parsing never fails: anything that does not decode as JSON is carried
//! through verbatim under a `raw_output` tag.

use serde_json::{json, Value};

use super::OcrOutcome;

/// Parse a raw response into the merged text and structured payload.
///
/// Markdown code-fence markers are stripped before attempting to decode
/// the remainder as JSON. A decoded object exposing a string `full_text`
/// field wins; any other JSON value is pretty-printed; undecodable text is
/// returned verbatim.
pub fn parse_response(raw: &str) -> OcrOutcome {
    let clean = strip_code_fences(raw);

    match serde_json::from_str::<Value>(&clean) {
        Ok(value) => {
            let merged = match value.get("full_text").and_then(Value::as_str) {
                Some(full_text) => full_text.to_string(),
                None => serde_json::to_string_pretty(&value).unwrap_or_else(|_| raw.to_string()),
            };
            OcrOutcome {
                raw_text: raw.to_string(),
                merged_text: merged,
                payload: value,
            }
        }
        Err(_) => OcrOutcome {
            raw_text: raw.to_string(),
            merged_text: raw.to_string(),
            payload: json!({ "raw_output": raw }),
        },
    }
}

/// Remove Markdown fence markers (```json / ```) and trim the remainder
fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_text_field_wins() {
        let outcome = parse_response(r#"{"full_text":"ABC123"}"#);
        assert_eq!(outcome.merged_text, "ABC123");
        assert_eq!(outcome.payload, json!({"full_text": "ABC123"}));
        assert_eq!(outcome.raw_text, r#"{"full_text":"ABC123"}"#);
    }

    #[test]
    fn test_plain_text_falls_back_to_raw_output() {
        let outcome = parse_response("Hello world");
        assert_eq!(outcome.merged_text, "Hello world");
        assert_eq!(outcome.payload, json!({"raw_output": "Hello world"}));
    }

    #[test]
    fn test_fenced_json_is_unwrapped() {
        let outcome = parse_response("```json\n{\"full_text\":\"fenced\"}\n```");
        assert_eq!(outcome.merged_text, "fenced");
        assert_eq!(outcome.payload, json!({"full_text": "fenced"}));
    }

    #[test]
    fn test_bare_fences_are_stripped() {
        let outcome = parse_response("```\n{\"full_text\":\"bare\"}\n```");
        assert_eq!(outcome.merged_text, "bare");
    }

    #[test]
    fn test_other_json_is_pretty_printed() {
        let outcome = parse_response(r#"{"items":["a","b"]}"#);
        assert_eq!(outcome.payload, json!({"items": ["a", "b"]}));
        assert_eq!(
            outcome.merged_text,
            serde_json::to_string_pretty(&json!({"items": ["a", "b"]})).unwrap()
        );
    }

    #[test]
    fn test_non_string_full_text_is_not_merged() {
        // full_text must be a string to become the merged text
        let outcome = parse_response(r#"{"full_text": 42}"#);
        assert_eq!(
            outcome.merged_text,
            serde_json::to_string_pretty(&json!({"full_text": 42})).unwrap()
        );
    }

    #[test]
    fn test_raw_text_is_always_verbatim() {
        let raw = "```json\n{\"full_text\":\"x\"}\n```";
        let outcome = parse_response(raw);
        assert_eq!(outcome.raw_text, raw);
    }
}
