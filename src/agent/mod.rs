//! Agent 모듈 - 질문 하나를 처리하는 라우팅 + 검색 증강 답변 루프
//!
//! 상태: `Routing → {AnsweringDirect | Retrieving → AnsweringGrounded} → Done`
//!
//! - Router: 검색 여부 결정 (LLM 1회)
//! - KeywordRetriever: 결정적 키워드 검색
//! - Answerer: 최종 답변 (LLM 1회)
//!
//! 에이전트는 불변 협력자만 가지고 있어 턴 사이에 남는 상태가 없습니다.

mod answerer;
mod router;

use std::sync::Arc;

use crate::error::GatewayError;
use crate::knowledge::{DocumentStore, KeywordRetriever, RetrievedMatch};
use crate::llm::LlmGateway;

pub use answerer::{
    build_context, direct_messages, grounded_messages, Answerer, DIRECT_SYSTEM_PROMPT,
    GROUNDED_SYSTEM_PROMPT, NO_RESULTS,
};
pub use router::{
    parse_router_response, Router, RouterAction, RouterDecision, ROUTER_SYSTEM_PROMPT,
};

// ============================================================================
// Types
// ============================================================================

/// 한 턴의 결과
#[derive(Debug, Clone)]
pub struct ConversationTurn<'a> {
    pub question: String,
    pub decision: RouterDecision,
    /// 검색 결과 (직접 답변이면 비어 있음)
    pub matches: Vec<RetrievedMatch<'a>>,
    pub answer: String,
}

/// 턴 처리 상태
///
/// 라우팅 이후의 모든 상태는 라우터 결정을 들고 다닙니다.
#[derive(Debug)]
enum AgentState<'a> {
    Routing,
    AnsweringDirect {
        decision: RouterDecision,
    },
    Retrieving {
        decision: RouterDecision,
        query: String,
    },
    AnsweringGrounded {
        decision: RouterDecision,
        matches: Vec<RetrievedMatch<'a>>,
    },
    Done {
        decision: RouterDecision,
        matches: Vec<RetrievedMatch<'a>>,
        answer: String,
    },
}

impl AgentState<'_> {
    fn name(&self) -> &'static str {
        match self {
            AgentState::Routing => "ROUTING",
            AgentState::AnsweringDirect { .. } => "ANSWERING_DIRECT",
            AgentState::Retrieving { .. } => "RETRIEVING",
            AgentState::AnsweringGrounded { .. } => "ANSWERING_GROUNDED",
            AgentState::Done { .. } => "DONE",
        }
    }
}

// ============================================================================
// Agent
// ============================================================================

/// 에이전트 컨텍스트
///
/// 시작 시 한 번 만들어 REPL에 넘깁니다. 문서 저장소는 `Arc`로 공유되므로
/// 여러 에이전트가 같은 저장소를 동시에 읽어도 됩니다.
pub struct Agent {
    store: Arc<DocumentStore>,
    router: Router,
    answerer: Answerer,
    retriever: KeywordRetriever,
}

impl Agent {
    pub fn new(store: Arc<DocumentStore>, gateway: Arc<dyn LlmGateway>, top_k: usize) -> Self {
        Self {
            store,
            router: Router::new(gateway.clone()),
            answerer: Answerer::new(gateway),
            retriever: KeywordRetriever::new(top_k),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// 질문 하나 처리
    ///
    /// 게이트웨이 실패 시 턴 전체가 실패합니다 (부분 답변 없음, 재시도 없음).
    pub async fn run_turn(&self, question: &str) -> Result<ConversationTurn<'_>, GatewayError> {
        let mut state = AgentState::Routing;

        loop {
            tracing::debug!("Agent state: {}", state.name());

            state = match state {
                AgentState::Routing => {
                    let decision = self.router.decide(question).await?;
                    match decision.query().map(str::to_string) {
                        None => AgentState::AnsweringDirect { decision },
                        Some(query) => AgentState::Retrieving { decision, query },
                    }
                }
                AgentState::Retrieving { decision, query } => {
                    let matches = self.retriever.search(self.store.chunks(), &query);
                    // 결과가 없어도 근거 기반 답변으로 진행
                    AgentState::AnsweringGrounded { decision, matches }
                }
                AgentState::AnsweringDirect { decision } => AgentState::Done {
                    answer: self.answerer.answer_direct(question).await?,
                    decision,
                    matches: Vec::new(),
                },
                AgentState::AnsweringGrounded { decision, matches } => {
                    let answer = self.answerer.answer_grounded(question, &matches).await?;
                    AgentState::Done {
                        decision,
                        matches,
                        answer,
                    }
                }
                AgentState::Done {
                    decision,
                    matches,
                    answer,
                } => {
                    return Ok(ConversationTurn {
                        question: question.to_string(),
                        decision,
                        matches,
                        answer,
                    });
                }
            };
        }
    }

    /// 답변 문자열만 반환
    pub async fn agent_once(&self, question: &str) -> Result<String, GatewayError> {
        Ok(self.run_turn(question).await?.answer)
    }
}

// ============================================================================
// Tests
// ============================================================================
