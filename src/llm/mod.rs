//! LLM 게이트웨이 모듈
//!
//! 라우터와 답변기가 공통으로 쓰는 "메시지를 보내고 텍스트를 받는" 인터페이스입니다.
//! 구현체를 바꿔 끼우면 어떤 프로바이더든 사용할 수 있고,
//! 테스트에서는 결정적인 스텁을 넣습니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let gateway = OpenAiCompatibleGateway::from_config(&config)?;
//! let text = gateway.chat(&[ChatMessage::user("Hello")], false).await?;
//! ```

mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub use openai::OpenAiCompatibleGateway;

// ============================================================================
// Message Types
// ============================================================================

/// 메시지 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// 채팅 메시지 (role/content 쌍)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ============================================================================
// LlmGateway Trait
// ============================================================================

/// LLM 게이트웨이 트레이트
///
/// 재시도는 하지 않습니다. 한 번 실패하면 그 턴 전체가 실패합니다.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// 메시지를 보내고 응답 텍스트를 받음
    ///
    /// `structured`가 true면 JSON 객체 출력을 요청합니다.
    async fn chat(&self, messages: &[ChatMessage], structured: bool)
        -> Result<String, GatewayError>;

    /// 게이트웨이 이름
    fn name(&self) -> &str;
}
