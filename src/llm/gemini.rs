//! Gemini API provider.
//!
//! Calls `POST {host}/v1beta/models/{model}:generateContent` with the
//! prompt as a single user turn and asks for JSON output through
//! `generationConfig.responseJsonSchema`.
//!
//! - The API key travels in the `x-goog-api-key` header, never in the URL.
//! - The reply text is the concatenation of the first candidate's text parts.
//! - Token usage: `usageMetadata.promptTokenCount` / `candidatesTokenCount`.
//! - Error bodies look like `{"error": {"message": ...}}`; the message is
//!   surfaced when present, the raw body otherwise.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::client::{LlmClient, StructuredReply};
use crate::config::LlmConfig;
use crate::error::ProviderError;

const PROVIDER: &str = "gemini";

// ── Gemini API request types ─────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_json_schema: &'a serde_json::Value,
    max_output_tokens: u32,
}

// ── Gemini API response types ────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Text of the first candidate, or `None` when it carries no text part.
    fn first_text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let texts: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }
}

/// Extracts `error.message` from a Gemini error body, falling back to the body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// ── GeminiClient ────────────────────────────────────────

/// Client for the Gemini `generateContent` API.
pub struct GeminiClient {
    client: Client,
    config: LlmConfig,
    host: String,
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> Self {
        let host = config.base_url();
        Self {
            client: Client::new(),
            config,
            host,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.host, self.config.model
        )
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<StructuredReply, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: schema,
                max_output_tokens: self.config.max_tokens_per_request,
            },
        };

        debug!(
            "Calling Gemini API ({}) with a {}-char prompt",
            self.config.model,
            prompt.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                provider: PROVIDER,
                status,
                message: error_message(&body),
            });
        }

        let resp: GenerateContentResponse = response.json().await.map_err(|source| {
            ProviderError::Decode {
                provider: PROVIDER,
                source,
            }
        })?;

        let (input_tokens, output_tokens) = resp
            .usage_metadata
            .as_ref()
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0));

        info!("LLM response: {input_tokens} in / {output_tokens} out tokens");

        Ok(StructuredReply {
            text: resp.first_text(),
            input_tokens,
            output_tokens,
        })
    }

    fn description(&self) -> String {
        format!("{} ({})", self.config.provider, self.config.model)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use super::*;
    use crate::testing::serve;

    fn config(host: Option<String>) -> LlmConfig {
        LlmConfig {
            provider: "gemini".to_string(),
            model: "gemini-test".to_string(),
            api_key: "secret-key".to_string(),
            max_tokens_per_request: 512,
            host,
        }
    }

    #[derive(Default)]
    struct Captured {
        body: Option<Value>,
        api_key: Option<String>,
    }

    /// Mock Gemini endpoint that records the request and replies with `reply`.
    async fn mock_gemini(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Captured>>) {
        let captured = Arc::new(Mutex::new(Captured::default()));
        let router = Router::new()
            .route(
                "/v1beta/models/gemini-test:generateContent",
                post(
                    move |State(captured): State<Arc<Mutex<Captured>>>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| async move {
                        let mut c = captured.lock().await;
                        c.body = Some(body);
                        c.api_key = headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        (status, Json(reply))
                    },
                ),
            )
            .with_state(captured.clone());
        (serve(router).await, captured)
    }

    #[test]
    fn test_description() {
        let client = GeminiClient::new(config(None));
        assert_eq!(client.description(), "gemini (gemini-test)");
    }

    #[test]
    fn test_default_endpoint() {
        let client = GeminiClient::new(config(None));
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_request_serialization() {
        let schema = json!({"type": "object"});
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "Hello" }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: &schema,
                max_output_tokens: 512,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(json["generationConfig"]["responseJsonSchema"]["type"], "object");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 512);
    }

    #[test]
    fn test_response_parsing_joins_text_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"resp"}, {"text": "onse\": \"hi\"}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16}
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_text().as_deref(), Some(r#"{"response": "hi"}"#));
        let usage = resp.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 12);
        assert_eq!(usage.candidates_token_count, 4);
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(resp.first_text().is_none());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "API key not valid.");
        assert_eq!(error_message("upstream timeout"), "upstream timeout");
    }

    #[tokio::test]
    async fn test_generate_structured_round_trip() {
        let (host, captured) = mock_gemini(
            StatusCode::OK,
            json!({
                "candidates": [{"content": {"parts": [{"text": "{\"response\": \"ok\"}"}]}}],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 3}
            }),
        )
        .await;
        let client = GeminiClient::new(config(Some(host)));
        let schema = json!({"type": "object", "required": ["response"]});

        let reply = client.generate_structured("Query: hi", &schema).await.unwrap();
        assert_eq!(reply.text.as_deref(), Some(r#"{"response": "ok"}"#));
        assert_eq!(reply.input_tokens, 10);
        assert_eq!(reply.output_tokens, 3);

        let captured = captured.lock().await;
        assert_eq!(captured.api_key.as_deref(), Some("secret-key"));
        let body = captured.body.as_ref().unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Query: hi");
        assert_eq!(body["generationConfig"]["responseJsonSchema"], schema);
    }

    #[tokio::test]
    async fn test_generate_structured_api_error() {
        let (host, _) = mock_gemini(
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "Permission denied."}}),
        )
        .await;
        let client = GeminiClient::new(config(Some(host)));

        let err = client
            .generate_structured("Query: hi", &json!({}))
            .await
            .unwrap_err();
        match err {
            ProviderError::Api {
                status, message, ..
            } => {
                assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
                assert_eq!(message, "Permission denied.");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_structured_unreachable_host() {
        // Nothing listens on port 9 of localhost
        let client = GeminiClient::new(config(Some("http://127.0.0.1:9".to_string())));
        let err = client
            .generate_structured("Query: hi", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
    }
}
