/// LLM Client: the single point of entry for all model calls in the mailer.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Callers depend on the `TextGenerator` trait so tests can substitute a fake.
///
/// Model: claude-sonnet-4-5 (hardcoded, not configurable)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod parse;
pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 2048;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// The shape a caller requires the model's answer to take.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub json_schema: Value,
}

/// One call to the generation capability.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub schema: &'a OutputSchema,
    pub temperature: f32,
}

/// What came back from a call.
///
/// `structured` is the provider's schema-validated object, when it offered one.
/// `text` is any free text returned alongside (or instead of) it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub structured: Option<Value>,
    pub text: Option<String>,
}

/// The generation capability seam. `LlmClient` is the production backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<Completion, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
    tools: Vec<AnthropicTool<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    choice_type: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
    pub input: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Splits the content blocks into the forced tool input and any plain text.
    pub fn into_completion(self) -> Completion {
        let mut structured = None;
        let mut text = String::new();

        for block in self.content {
            match block.block_type.as_str() {
                "tool_use" if structured.is_none() => structured = block.input,
                "text" => {
                    if let Some(t) = block.text {
                        text.push_str(&t);
                    }
                }
                _ => {}
            }
        }

        Completion {
            structured,
            text: (!text.trim().is_empty()).then_some(text),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API with retry logic. Structured output is
/// requested by forcing a single tool whose input schema is the caller's schema.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit), 5xx errors and transport failures with exponential backoff.
    pub async fn call(&self, request: &GenerationRequest<'_>) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system: request.system,
            temperature: request.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt,
            }],
            tools: vec![AnthropicTool {
                name: request.schema.name,
                description: request.schema.description,
                input_schema: &request.schema.json_schema,
            }],
            tool_choice: ToolChoice {
                choice_type: "tool",
                name: request.schema.name,
            },
        };
        let url = format!("{}{}", self.base_url, MESSAGES_PATH);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: tool={}, input_tokens={}, output_tokens={}",
                request.schema.name,
                llm_response.usage.input_tokens,
                llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: &GenerationRequest<'_>) -> Result<Completion, LlmError> {
        let completion = self.call(request).await?.into_completion();
        if completion.structured.is_none() && completion.text.is_none() {
            return Err(LlmError::EmptyContent);
        }
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn email_schema() -> OutputSchema {
        OutputSchema {
            name: "compose_email",
            description: "Return the email",
            json_schema: json!({
                "type": "object",
                "properties": {
                    "subject": {"type": "string"},
                    "body": {"type": "string"}
                },
                "required": ["subject", "body"]
            }),
        }
    }

    fn request<'a>(schema: &'a OutputSchema) -> GenerationRequest<'a> {
        GenerationRequest {
            system: "Be formal.",
            prompt: "Write the email.",
            schema,
            temperature: 0.3,
        }
    }

    #[test]
    fn test_into_completion_prefers_tool_input_and_keeps_text() {
        let response: LlmResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "Here you go:"},
                {"type": "tool_use", "id": "t1", "name": "compose_email",
                 "input": {"subject": "S", "body": "B"}}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();

        let completion = response.into_completion();
        assert_eq!(completion.structured, Some(json!({"subject": "S", "body": "B"})));
        assert_eq!(completion.text.as_deref(), Some("Here you go:"));
    }

    #[test]
    fn test_into_completion_blank_text_is_none() {
        let response: LlmResponse = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "   "}],
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }))
        .unwrap();

        assert_eq!(response.into_completion(), Completion::default());
    }

    #[tokio::test]
    async fn test_generate_sends_forced_tool_and_returns_structured() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .header("x-api-key", "test-key")
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json_body_partial(
                        r#"{"tool_choice": {"type": "tool", "name": "compose_email"}, "temperature": 0.3}"#,
                    );
                then.status(200).json_body(json!({
                    "content": [{"type": "tool_use", "id": "t1", "name": "compose_email",
                                 "input": {"subject": "Hello", "body": "World"}}],
                    "usage": {"input_tokens": 12, "output_tokens": 7}
                }));
            })
            .await;

        let client = LlmClient::new("test-key".to_string(), server.base_url()).unwrap();
        let schema = email_schema();
        let completion = client.generate(&request(&schema)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            completion.structured,
            Some(json!({"subject": "Hello", "body": "World"}))
        );
        assert!(completion.text.is_none());
    }

    #[tokio::test]
    async fn test_generate_client_error_surfaces_provider_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(401).json_body(json!({
                    "type": "error",
                    "error": {"type": "authentication_error", "message": "invalid x-api-key"}
                }));
            })
            .await;

        let client = LlmClient::new("bad".to_string(), server.base_url()).unwrap();
        let schema = email_schema();
        let err = client.generate(&request(&schema)).await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid x-api-key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_attempts_run_out() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(503).body("down");
            })
            .await;

        let client = LlmClient::new("k".to_string(), server.base_url()).unwrap();
        let schema = email_schema();
        let err = client.generate(&request(&schema)).await.unwrap_err();

        mock.assert_hits_async(MAX_RETRIES as usize).await;
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_empty_content_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200).json_body(json!({
                    "content": [],
                    "usage": {"input_tokens": 3, "output_tokens": 0}
                }));
            })
            .await;

        let client = LlmClient::new("k".to_string(), format!("{}/", server.base_url())).unwrap();
        let schema = email_schema();
        let err = client.generate(&request(&schema)).await.unwrap_err();

        assert!(matches!(err, LlmError::EmptyContent));
    }
}
