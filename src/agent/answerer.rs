//! 답변기 - 최종 답변 생성
//!
//! - 직접 답변: 질문만 보내고 일반 지식으로 답변
//! - 근거 기반 답변: 검색된 청크를 컨텍스트 블록으로 만들어 출처 인용을 요구
//!
//! 전달받은 검색 결과는 하나도 빠짐없이 컨텍스트 블록에 들어갑니다.

use std::sync::Arc;

use crate::error::GatewayError;
use crate::knowledge::RetrievedMatch;
use crate::llm::{ChatMessage, LlmGateway};

/// 검색 결과가 없을 때 컨텍스트 블록 값
pub const NO_RESULTS: &str = "NO_RESULTS";

/// 직접 답변 시스템 프롬프트
pub const DIRECT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
Answer the user's question from general knowledge, clearly and concisely.";

/// 근거 기반 답변 시스템 프롬프트
pub const GROUNDED_SYSTEM_PROMPT: &str = r#"You are a helpful assistant answering questions about the user's private documents.

Rules:
- Use ONLY the retrieved snippets as facts.
- If snippets are provided:
  - Answer in 2-5 sentences.
  - Summarize naturally (do not copy text verbatim).
  - Cite the source file at the end of sentences that use it,
    e.g. (travel_journal.txt).

- If the retrieved result is NO_RESULTS:
  - Say clearly that no relevant information was found in the documents.
  - Do NOT answer from general knowledge instead.

- Do NOT invent places, dates, or activities.
- If unsure, say you don't know based on the documents."#;

// ============================================================================
// Context Assembly
// ============================================================================

/// 컨텍스트 블록 생성
///
/// 한 줄에 하나씩 `[source=<source> score=<score>] <text>`.
/// 비어 있으면 `NO_RESULTS`.
pub fn build_context(matches: &[RetrievedMatch<'_>]) -> String {
    if matches.is_empty() {
        return NO_RESULTS.to_string();
    }

    matches
        .iter()
        .map(|m| format!("[source={} score={}] {}", m.source(), m.score, m.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 근거 기반 답변 메시지 구성
pub fn grounded_messages(question: &str, matches: &[RetrievedMatch<'_>]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(GROUNDED_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Question: {}\n\nRetrieved:\n{}",
            question,
            build_context(matches)
        )),
    ]
}

/// 직접 답변 메시지 구성
pub fn direct_messages(question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(DIRECT_SYSTEM_PROMPT),
        ChatMessage::user(question),
    ]
}

// ============================================================================
// Answerer
// ============================================================================

/// 답변기
pub struct Answerer {
    gateway: Arc<dyn LlmGateway>,
}

impl Answerer {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// 검색 결과 유무에 따라 직접/근거 기반 답변 선택
    pub async fn answer(
        &self,
        question: &str,
        matches: &[RetrievedMatch<'_>],
    ) -> Result<String, GatewayError> {
        if matches.is_empty() {
            self.answer_direct(question).await
        } else {
            self.answer_grounded(question, matches).await
        }
    }

    /// 일반 지식 답변 (응답 텍스트 그대로 반환)
    pub async fn answer_direct(&self, question: &str) -> Result<String, GatewayError> {
        self.gateway.chat(&direct_messages(question), false).await
    }

    /// 검색 결과 기반 답변
    ///
    /// 결과가 비어 있으면 `NO_RESULTS` 컨텍스트로 "찾지 못함" 답변을 유도합니다.
    pub async fn answer_grounded(
        &self,
        question: &str,
        matches: &[RetrievedMatch<'_>],
    ) -> Result<String, GatewayError> {
        tracing::debug!("Grounded answer with {} snippets", matches.len());
        self.gateway
            .chat(&grounded_messages(question, matches), false)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
