//! 大模型接口
//!
//! 对接 OpenAI 兼容的 chat completions 接口（默认 Groq）

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Result, ScreenerError};
use crate::services::common::{RetryPolicy, USER_AGENT};

/// 金融问答的系统提示词
pub const ADVISOR_PROMPT: &str =
    "You are a financial advisor. Provide accurate and helpful financial advice.";

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatCompletionsClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl ChatCompletionsClient {
    /// 未配置 API Key 时返回 None
    pub fn from_config(config: &LlmConfig, retry: RetryPolicy) -> reqwest::Result<Option<Self>> {
        if config.api_key.trim().is_empty() {
            return Ok(None);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Some(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            retry,
        }))
    }

    async fn send(&self, body: &ChatRequest<'_>) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            log::error!("大模型接口返回 {}: {}", status, text);
            let message = format!("LLM API Error: {}", text);
            return Err(
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    ScreenerError::UpstreamUnavailable(message)
                } else {
                    ScreenerError::UpstreamRejected(message)
                },
            );
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ScreenerError::UpstreamSchemaMismatch("大模型未返回内容".to_string()))
    }
}

#[async_trait]
impl ChatModel for ChatCompletionsClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
        };

        log::info!("请求大模型 {} ({} 字)", self.model, prompt.chars().count());
        let what = format!("大模型 {}", self.model);
        self.retry.run(&what, || self.send(&body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn no_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    fn client_for(server: &MockServer, max_retries: u32) -> ChatCompletionsClient {
        let config = LlmConfig {
            api_url: format!("{}/openai/v1/chat/completions", server.uri()),
            api_key: "gsk-test".to_string(),
            ..LlmConfig::default()
        };
        let retry = RetryPolicy {
            max_retries,
            backoff: Duration::from_millis(1),
        };
        ChatCompletionsClient::from_config(&config, retry).unwrap().unwrap()
    }

    fn reply(content: &str) -> serde_json::Value {
        json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]})
    }

    /// 429 后按重试策略重发
    #[tokio::test]
    async fn test_rate_limited_request_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/openai/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("Hold.")))
            .mount(&server)
            .await;

        let client = client_for(&server, 2);
        let answer = client.complete(ADVISOR_PROMPT, "Is TCS overvalued?").await.unwrap();
        assert_eq!(answer, "Hold.");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    /// 4xx（非 429）不重试
    #[tokio::test]
    async fn test_rejected_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
            .mount(&server)
            .await;

        let client = client_for(&server, 2);
        let err = client.complete(ADVISOR_PROMPT, "hi").await.unwrap_err();
        assert!(matches!(err, ScreenerError::UpstreamRejected(ref m) if m == "LLM API Error: bad model"));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = LlmConfig::default();
        assert!(ChatCompletionsClient::from_config(&config, no_retry()).unwrap().is_none());

        let config = LlmConfig {
            api_key: "gsk-test".to_string(),
            ..LlmConfig::default()
        };
        let client = ChatCompletionsClient::from_config(&config, no_retry()).unwrap().unwrap();
        assert_eq!(client.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "llama-3.3-70b-versatile",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: ADVISOR_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: "Is TCS overvalued?",
                },
            ],
            temperature: 0.5,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["messages"][1]["content"], "Is TCS overvalued?");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["temperature"], json!(0.5));
    }

    #[test]
    fn test_parse_reply() {
        let reply: ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hold."}}]
        }))
        .unwrap();
        assert_eq!(reply.choices[0].message.content.as_deref(), Some("Hold."));
    }
}
