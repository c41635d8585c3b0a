// Gemini generateContent client for structured slice extraction

use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine};
use std::time::Duration;
use tracing::debug;

use crate::core::config::ApiConfig;
use crate::core::errors::{ExtractionError, ExtractionResult};
use crate::core::types::{ExtractionRecord, SliceChunk};
use crate::services::extraction::ExtractionClient;

/// Fixed instruction prompt. Static configuration, never derived from input.
const EXTRACTION_PROMPT: &str = "\
Read this vertical comic strip section from top to bottom. Extract every piece \
of text in natural reading order. Return a JSON array of objects, each with a \
'text' field and a 'category' field. category must be one of: speech, thought, \
box, narration, smallText, sfx, system, scream, linked. Ignore generic \
sound-effect markers with no readable content. If the section contains no \
text, return an empty array.";

/// HTTP client for the Gemini extraction endpoint.
///
/// Holds no credential itself; the dispatcher passes one per call so a single
/// client instance serves the whole pool.
pub struct GeminiExtractionClient {
    http_client: reqwest::Client,
    model: String,
}

impl GeminiExtractionClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            model: config.extraction_model.clone(),
        })
    }

    fn request_body(&self, chunk: &SliceChunk) -> serde_json::Value {
        let base64_image = general_purpose::STANDARD.encode(&chunk.png_bytes);

        serde_json::json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": "image/png",
                            "data": base64_image
                        }
                    },
                    {"text": EXTRACTION_PROMPT}
                ]
            }],
            "generationConfig": {
                "response_mime_type": "application/json",
                "response_schema": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "text": {"type": "string"},
                            "category": {"type": "string"}
                        },
                        "required": ["text", "category"]
                    }
                },
                "thinkingConfig": {
                    "thinking_budget": 0
                }
            }
        })
    }
}

impl ExtractionClient for GeminiExtractionClient {
    async fn extract(
        &self,
        credential: &str,
        chunk: &SliceChunk,
    ) -> ExtractionResult<Vec<ExtractionRecord>> {
        debug!(
            "Extracting slice {} ({}x{}, {} bytes)",
            chunk.index,
            chunk.width,
            chunk.height,
            chunk.png_bytes.len()
        );

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, credential
        );

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&self.request_body(chunk))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::ErrorStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_response_body(&body)
    }
}

/// Pull the model's text payload out of a generateContent response.
///
/// A missing or non-JSON top-level body is a retryable error; anything wrong
/// inside the payload itself degrades to an empty or partial record list.
pub(crate) fn parse_response_body(body: &str) -> ExtractionResult<Vec<ExtractionRecord>> {
    let response: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::InvalidResponse(format!("top-level parse failed: {}", e)))?;

    let payload = response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| {
            ExtractionError::InvalidResponse("missing text part in response".to_string())
        })?;

    Ok(parse_records(payload))
}

/// Decode the structured record list, degrading gracefully.
///
/// Non-JSON or non-array payloads yield an empty list rather than a dispatch
/// failure; garbled elements inside an otherwise valid array are skipped so a
/// partially usable response is not discarded entirely.
pub(crate) fn parse_records(payload: &str) -> Vec<ExtractionRecord> {
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TextCategory;

    fn wrap(payload: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": payload}]
                }
            }]
        })
        .to_string()
    }

    #[test]
    fn parses_well_formed_records() {
        let records = parse_records(
            r#"[{"text": "Hey!", "category": "speech"},
                {"text": "rumble", "category": "sfx"}]"#,
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "Hey!");
        assert_eq!(records[1].category, TextCategory::Sfx);
    }

    #[test]
    fn non_list_payload_yields_empty() {
        assert!(parse_records(r#"{"text": "not a list"}"#).is_empty());
        assert!(parse_records("\"just a string\"").is_empty());
        assert!(parse_records("not json at all").is_empty());
    }

    #[test]
    fn garbled_elements_are_skipped_not_fatal() {
        let records = parse_records(
            r#"[{"text": "ok", "category": "speech"}, 42, {"category": "speech"}]"#,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "ok");
    }

    #[test]
    fn unknown_category_defaults_to_speech() {
        let records = parse_records(r#"[{"text": "??", "category": "whisper"}]"#);
        assert_eq!(records[0].category, TextCategory::Speech);
    }

    #[test]
    fn response_body_round_trip() {
        let body = wrap(r#"[{"text": "line", "category": "narration"}]"#);
        let records = parse_response_body(&body).unwrap();
        assert_eq!(records[0].category, TextCategory::Narration);
    }

    #[test]
    fn missing_text_part_is_an_error() {
        let err = parse_response_body(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidResponse(_)));
    }

    #[test]
    fn non_json_body_is_an_error() {
        assert!(parse_response_body("<html>502</html>").is_err());
    }
}
