//! Remote OCR Client
//!
//! Wraps one multimodal `generateContent` call against the Gemini API:
//! all retained frames plus a fixed trailing instruction are combined into
//! a single request at low sampling temperature. No output schema is
//! enforced, so free-form (non-JSON) system prompts remain valid; response
//! parsing recovers structure on a best-effort basis.

pub mod parse;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::capture::frame::RetainedFrame;

/// Default Gemini API endpoint base
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Fixed trailing instruction appended after the image parts
const TRAILING_INSTRUCTION: &str = "Process these images according to the system instructions.";

/// Low sampling temperature for deterministic, factual extraction
const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Failure modes of a batch extraction call.
///
/// Each variant becomes the terminal status of the batch's log entry;
/// none of them propagate past the dispatcher.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Credential empty; detected before any network attempt
    #[error("API key is missing")]
    MissingCredential,
    /// Transport, HTTP, or decode failure, carrying the service message
    #[error("OCR request failed: {0}")]
    RemoteCallFailure(String),
    /// The service answered with no text at all
    #[error("empty response from the OCR service")]
    EmptyResponse,
}

/// Result of one batch extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrOutcome {
    /// Verbatim response text
    pub raw_text: String,
    /// Best extracted string (decoded `full_text`, pretty JSON, or raw)
    pub merged_text: String,
    /// Best-effort decoded payload
    pub payload: Value,
}

/// Seam between the dispatcher and the remote extraction call.
pub trait TextExtractor: Send + Sync {
    /// Perform one extraction over an ordered batch of encoded frames
    fn extract(
        &self,
        frames: &[RetainedFrame],
        model: &str,
        system_prompt: &str,
    ) -> Result<OcrOutcome, OcrError>;
}

/// Gemini-backed extraction client.
pub struct OcrClient {
    api_key: String,
    base_url: String,
}

impl OcrClient {
    /// Create a client for the given credential
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: API_BASE_URL.to_string(),
        }
    }

    fn request_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

impl TextExtractor for OcrClient {
    fn extract(
        &self,
        frames: &[RetainedFrame],
        model: &str,
        system_prompt: &str,
    ) -> Result<OcrOutcome, OcrError> {
        if self.api_key.is_empty() {
            return Err(OcrError::MissingCredential);
        }

        let request = build_request(frames, system_prompt);
        let url = self.request_url(model);
        debug!(model, frames = frames.len(), "dispatching OCR batch");

        let rt = Runtime::new().map_err(|e| OcrError::RemoteCallFailure(e.to_string()))?;
        let (status, body) = rt
            .block_on(async {
                let client = reqwest::Client::new();
                let response = client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&request)
                    .send()
                    .await?;
                let status = response.status();
                let body = response.text().await?;
                Ok::<_, reqwest::Error>((status, body))
            })
            .map_err(|e| OcrError::RemoteCallFailure(e.to_string()))?;

        if !status.is_success() {
            return Err(OcrError::RemoteCallFailure(service_message(&status, &body)));
        }

        let response: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| OcrError::RemoteCallFailure(e.to_string()))?;

        let text = response.candidate_text();
        if text.trim().is_empty() {
            return Err(OcrError::EmptyResponse);
        }

        Ok(parse::parse_response(&text))
    }
}

/// Assemble the multimodal request: inline JPEG parts in buffer order,
/// then the fixed trailing instruction.
fn build_request(frames: &[RetainedFrame], system_prompt: &str) -> GenerateContentRequest {
    let mut parts: Vec<Part> = frames
        .iter()
        .map(|frame| Part::InlineData {
            inline_data: InlineData {
                mime_type: "image/jpeg".to_string(),
                data: BASE64.encode(&frame.jpeg),
            },
        })
        .collect();
    parts.push(Part::Text {
        text: TRAILING_INSTRUCTION.to_string(),
    });

    GenerateContentRequest {
        system_instruction: InstructionContent {
            parts: vec![Part::Text {
                text: system_prompt.to_string(),
            }],
        },
        contents: vec![UserContent {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            temperature: EXTRACTION_TEMPERATURE,
        },
    }
}

/// Pull the service's own error message out of a failure body when present
fn service_message(status: &reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: InstructionContent,
    contents: Vec<UserContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct InstructionContent {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct UserContent {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate
    fn candidate_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(bytes: &[u8]) -> RetainedFrame {
        RetainedFrame::new(bytes.to_vec(), 42, 0)
    }

    #[test]
    fn test_missing_credential_fails_before_network() {
        let client = OcrClient::new("");
        let result = client.extract(&[frame(b"jpeg")], "gemini-2.5-flash", "prompt");
        assert!(matches!(result, Err(OcrError::MissingCredential)));
    }

    #[test]
    fn test_missing_credential_message_is_distinct() {
        assert_eq!(OcrError::MissingCredential.to_string(), "API key is missing");
    }

    #[test]
    fn test_request_combines_images_and_trailing_instruction() {
        let request = build_request(&[frame(b"one"), frame(b"two")], "extract everything");
        let value = serde_json::to_value(&request).unwrap();

        let parts = value["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], BASE64.encode(b"one"));
        assert_eq!(parts[1]["inlineData"]["data"], BASE64.encode(b"two"));
        assert_eq!(parts[2]["text"], TRAILING_INSTRUCTION);

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            "extract everything"
        );
    }

    #[test]
    fn test_request_uses_low_temperature() {
        let request = build_request(&[frame(b"x")], "prompt");
        let value = serde_json::to_value(&request).unwrap();
        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_candidate_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "Hello "}, {"text": "world"}]
                }
            }]
        }))
        .unwrap();
        assert_eq!(response.candidate_text(), "Hello world");
    }

    #[test]
    fn test_candidate_text_empty_when_absent() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.candidate_text(), "");
    }

    #[test]
    fn test_service_message_prefers_error_body() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(service_message(&status, body), "API key not valid");
    }

    #[test]
    fn test_service_message_falls_back_to_status() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            service_message(&status, "<html>oops</html>"),
            "HTTP 500 Internal Server Error"
        );
    }
}
