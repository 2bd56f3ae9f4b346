//! 라우터 - 질문을 NO_SEARCH / SEARCH_DOCS로 분류
//!
//! LLM에 JSON 출력을 요청하고 결과를 `RouterDecision`으로 파싱합니다.
//! 파싱에 실패하거나 알 수 없는 action이면 NO_SEARCH로 떨어집니다 (fail-closed).
//! 게이트웨이 호출 자체의 실패는 그대로 전파합니다.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, RouterParseError};
use crate::llm::{ChatMessage, LlmGateway};

/// 라우터 시스템 프롬프트
pub const ROUTER_SYSTEM_PROMPT: &str = r#"You are a router for a small question-answering agent.
You can make ONE tool call: SEARCH_DOCS, a keyword search over the user's private documents.

Important context:
- The local documents contain ONLY the user's own notes
  (for example a personal journal: places visited, dates, activities).
- You do NOT know this information unless you search.

Routing rules (must follow):

1) If the question is about the user's personal life or past,
   or anything that could be written in their documents,
   you MUST choose SEARCH_DOCS and give a short keyword search query.

2) Only choose NO_SEARCH for general world knowledge
   that does NOT depend on the user's personal history.

Output exactly ONE JSON object and nothing else:
- {"action":"SEARCH_DOCS","query":"..."}
- {"action":"NO_SEARCH"}

Do not explain your reasoning."#;

// ============================================================================
// Types
// ============================================================================

/// 라우터 결정
///
/// 검색 쿼리는 `SearchDocs`에만 있고 항상 비어 있지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouterDecision {
    /// 일반 지식으로 바로 답변
    NoSearch,
    /// 문서 검색 후 근거 기반 답변
    SearchDocs { query: String },
}

/// 평면 action 값
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    NoSearch,
    SearchDocs,
}

impl RouterAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouterAction::NoSearch => "NO_SEARCH",
            RouterAction::SearchDocs => "SEARCH_DOCS",
        }
    }
}

impl fmt::Display for RouterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RouterDecision {
    pub fn action(&self) -> RouterAction {
        match self {
            RouterDecision::NoSearch => RouterAction::NoSearch,
            RouterDecision::SearchDocs { .. } => RouterAction::SearchDocs,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            RouterDecision::NoSearch => None,
            RouterDecision::SearchDocs { query } => Some(query),
        }
    }

    /// 트레이스 출력용 JSON (`{"action":"SEARCH_DOCS","query":"..."}`)
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"action\":\"{}\"}}", self.action()))
    }
}

/// LLM 원시 출력 (`answer` 등 다른 필드는 무시)
#[derive(Debug, Deserialize)]
struct RawDecision {
    action: String,
    #[serde(default)]
    query: Option<String>,
}

// ============================================================================
// Parsing
// ============================================================================

fn json_object_regex() -> &'static Regex {
    static JSON_RE: OnceLock<Regex> = OnceLock::new();
    JSON_RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid json object regex"))
}

/// 라우터 출력 파싱
///
/// 응답이 설명문이나 코드 블록에 감싸여 있어도 가장 바깥 `{...}`를 찾습니다.
/// SEARCH_DOCS인데 쿼리가 비어 있으면 질문 자체를 쿼리로 씁니다.
pub fn parse_router_response(
    raw: &str,
    question: &str,
) -> Result<RouterDecision, RouterParseError> {
    let json = json_object_regex()
        .find(raw)
        .ok_or(RouterParseError::NoJson)?
        .as_str();

    let decision: RawDecision = serde_json::from_str(json)?;
    let action = decision.action.trim();

    if action.eq_ignore_ascii_case("NO_SEARCH") {
        return Ok(RouterDecision::NoSearch);
    }

    if action.eq_ignore_ascii_case("SEARCH_DOCS") {
        let query = decision
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| question.trim().to_string());

        if query.is_empty() {
            return Ok(RouterDecision::NoSearch);
        }
        return Ok(RouterDecision::SearchDocs { query });
    }

    Err(RouterParseError::UnknownAction(decision.action))
}

// ============================================================================
// Router
// ============================================================================

/// 라우터
pub struct Router {
    gateway: Arc<dyn LlmGateway>,
}

impl Router {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    /// 라우터 메시지 구성 (이번 질문만 포함)
    pub fn messages(question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(ROUTER_SYSTEM_PROMPT),
            ChatMessage::user(question),
        ]
    }

    /// 질문 분류
    ///
    /// 파싱 실패는 NO_SEARCH로 변환되고, 게이트웨이 실패만 에러로 반환됩니다.
    pub async fn decide(&self, question: &str) -> Result<RouterDecision, GatewayError> {
        let raw = self.gateway.chat(&Self::messages(question), true).await?;

        match parse_router_response(&raw, question) {
            Ok(decision) => {
                tracing::debug!("Router decision: {}", decision.to_json());
                Ok(decision)
            }
            Err(e) => {
                tracing::warn!("Router output rejected ({}), falling back to NO_SEARCH", e);
                tracing::debug!("Raw router output: {}", raw);
                Ok(RouterDecision::NoSearch)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
