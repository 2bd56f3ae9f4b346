//! 테스트용 게이트웨이 스텁

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::llm::{ChatMessage, LlmGateway};

/// 기록된 호출 하나
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub structured: bool,
}

impl RecordedCall {
    /// 모든 메시지 내용을 이어 붙인 텍스트
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 구조화 요청(라우터)과 일반 요청(답변기)에 각각 고정 응답을 돌려주는 스텁
///
/// 모든 호출을 기록합니다.
pub struct ScriptedGateway {
    router_reply: String,
    answer_reply: String,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn new(router_reply: impl Into<String>, answer_reply: impl Into<String>) -> Self {
        Self {
            router_reply: router_reply.into(),
            answer_reply: answer_reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        structured: bool,
    ) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            structured,
        });

        Ok(if structured {
            self.router_reply.clone()
        } else {
            self.answer_reply.clone()
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// 항상 실패하는 스텁
pub struct FailingGateway;

#[async_trait]
impl LlmGateway for FailingGateway {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _structured: bool,
    ) -> Result<String, GatewayError> {
        Err(GatewayError::RateLimited("stub".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
