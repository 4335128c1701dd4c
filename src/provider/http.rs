//! OpenAI 兼容的 HTTP 补全实现

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, CompletionRequest};
use crate::config::GateConfig;
use crate::error::{ProviderError, ProviderFailure};

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
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP 补全服务
pub struct HttpCompletionProvider {
    api_url: String,
    api_key: Option<String>,
    temperature: f32,
    client: reqwest::Client,
}

impl HttpCompletionProvider {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("content-gate/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            api_url: api_url.into(),
            api_key,
            temperature: 0.7,
            client,
        }
    }

    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.api_url.clone(), config.api_key.clone(), config.request_timeout())
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

fn map_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::timeout(format!("请求超时: {}", error))
    } else {
        ProviderError::new(ProviderFailure::Transport, format!("网络错误: {}", error))
    }
}

/// 取出第一条候选回复的文本
fn extract_content(response: ChatResponse) -> Result<String, ProviderError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ProviderError::empty_content());
    }
    Ok(content)
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let payload = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: self.temperature,
        };

        tracing::debug!("调用补全服务: model={}, url={}", request.model, self.api_url);

        let mut builder = self.client.post(&self.api_url).json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), &body));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ProviderError::new(ProviderFailure::Transport, format!("响应解析失败: {}", e))
        })?;
        extract_content(parsed)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_first_choice() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"你好"}}]}"#)
                .unwrap();
        assert_eq!(extract_content(response).unwrap(), "你好");
    }

    #[test]
    fn test_empty_content_is_transport_failure() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        let error = extract_content(response).unwrap_err();
        assert_eq!(error.kind, ProviderFailure::Transport);

        let response: ChatResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(extract_content(response).is_err());
    }

    #[test]
    fn test_request_serialization() {
        let payload = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.2,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
