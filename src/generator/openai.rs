//! OpenAI-compatible HTTP backend for embeddings and summaries

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{EmbeddingGenerator, GeneratorError, Summarizer};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

const SUMMARY_MAX_TOKENS: u32 = 150;
const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes text concisely.";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub embed_model: String,
    pub chat_model: String,
    /// HTTP client timeout; callers add their own deadline on top
    pub timeout: Duration,
}

pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        info!(
            url = %config.base_url,
            embed_model = %config.embed_model,
            chat_model = %config.chat_model,
            "initialized OpenAI backend"
        );

        Ok(Self { client, config })
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, GeneratorError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(status_error(status, &message));
        }

        response
            .json()
            .await
            .map_err(|e| GeneratorError::Unavailable(format!("failed to parse response: {e}")))
    }

    fn transport_error(&self, e: reqwest::Error) -> GeneratorError {
        if e.is_timeout() {
            GeneratorError::Timeout(self.config.timeout)
        } else {
            GeneratorError::Unavailable(format!("request failed: {e}"))
        }
    }
}

fn status_error(status: StatusCode, message: &str) -> GeneratorError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => GeneratorError::RateLimited(message.to_string()),
        _ => GeneratorError::Unavailable(format!("OpenAI returned {status}: {message}")),
    }
}

#[async_trait]
impl EmbeddingGenerator for OpenAiClient {
    async fn generate(&self, text: &str) -> Result<Vec<f32>, GeneratorError> {
        debug!(model = %self.config.embed_model, len = text.len(), "requesting embedding");

        let request = EmbeddingRequest {
            model: &self.config.embed_model,
            input: [text],
        };
        let response: EmbeddingResponse = self.post("/embeddings", &request).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| GeneratorError::Unavailable("no embedding data returned".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl Summarizer for OpenAiClient {
    async fn summarize(&self, text: &str) -> Result<String, GeneratorError> {
        debug!(model = %self.config.chat_model, len = text.len(), "requesting summary");

        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SUMMARY_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("Please summarize the following text in a few sentences:\n\n{text}"),
                },
            ],
            max_tokens: SUMMARY_MAX_TOKENS,
        };
        let response: ChatResponse = self.post("/chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| GeneratorError::Unavailable("no summary data returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            GeneratorError::RateLimited("slow down".to_string())
        );
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "bad key"),
            GeneratorError::Unavailable(msg) if msg.contains("401") && msg.contains("bad key")
        ));
    }

    #[test]
    fn test_embedding_request_shape() {
        let request = EmbeddingRequest {
            model: "text-embedding-ada-002",
            input: ["hello"],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "text-embedding-ada-002", "input": ["hello"]})
        );
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": " Short. "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, " Short. ");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let client = OpenAiClient::new(OpenAiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "sk-test".to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();

        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(
            err,
            GeneratorError::Unavailable(_) | GeneratorError::Timeout(_)
        ));
    }
}
