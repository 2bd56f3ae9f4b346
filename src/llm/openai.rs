//! OpenAI 호환 채팅 게이트웨이
//!
//! `POST {base_url}/chat/completions` 와이어 프로토콜을 따르는 모든 API에 사용합니다.
//! (OpenAI, Ollama `/v1`, LM Studio, vLLM 등)
//!
//! source: https://platform.openai.com/docs/api-reference/chat/create

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;
use crate::error::GatewayError;

use super::{ChatMessage, LlmGateway};

/// OpenAI 호환 게이트웨이 구현체
#[derive(Debug)]
pub struct OpenAiCompatibleGateway {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatibleGateway {
    /// 새 게이트웨이 생성
    ///
    /// # Arguments
    /// * `api_key` - Bearer 토큰
    /// * `base_url` - 예: `https://api.openai.com/v1`
    /// * `model` - 모델 ID
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("palank-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: crate::config::DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
            client,
        })
    }

    /// 에이전트 설정으로 생성
    pub fn from_config(config: &AgentConfig) -> Result<Self, GatewayError> {
        let api_key = config
            .require_api_key()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self::new(api_key, &config.base_url, &config.model)?
            .with_temperature(config.temperature)
            .with_timeout(config.request_timeout))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// 호출당 최대 대기 시간
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// 요청 본문 구성
    fn build_request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        structured: bool,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            response_format: structured.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::DeadlineExceeded(self.timeout)
        } else {
            GatewayError::Transport(e)
        }
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// 에러 응답 (`{"error": {"message": ...}}`)
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// LlmGateway Implementation
// ============================================================================

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        structured: bool,
    ) -> Result<String, GatewayError> {
        let request = self.build_request(messages, structured);

        tracing::debug!(
            "Chat request: model={}, messages={}, structured={}",
            self.model,
            messages.len(),
            structured
        );

        let call = async {
            let response = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            Ok::<_, GatewayError>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| GatewayError::DeadlineExceeded(self.timeout))??;

        parse_chat_response(status, &body)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 상태 코드 + 본문을 결과로 변환
fn parse_chat_response(status: u16, body: &str) -> Result<String, GatewayError> {
    if (200..300).contains(&status) {
        let response: ChatCompletionResponse = serde_json::from_str(body)
            .map_err(|e| GatewayError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        return response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::MalformedResponse("no message content".to_string()));
    }

    let message = error_message(body);
    tracing::warn!("LLM API error ({}): {}", status, message);

    Err(match status {
        401 | 403 => GatewayError::Auth { status, message },
        429 => GatewayError::RateLimited(message),
        _ => GatewayError::Status { status, message },
    })
}

/// 에러 본문에서 메시지 추출 (형식이 다르면 원문)
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ============================================================================
// Tests
// ============================================================================
