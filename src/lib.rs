//! palank-agent - 미니 RAG 에이전트
//!
//! 질문마다 LLM 라우터가 문서 검색 여부를 결정하고,
//! 로컬 .txt 문서에 대한 키워드 검색 결과로 출처를 인용한 답변을 만듭니다.

pub mod agent;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod llm;

#[cfg(test)]
mod test_support;

// Re-exports
pub use agent::{Agent, Answerer, ConversationTurn, Router, RouterAction, RouterDecision};
pub use collector::{CollectedFile, CollectorConfig, FileCollector};
pub use config::{get_data_dir, AgentConfig, ConfigOverrides};
pub use error::{ConfigError, DocumentLoadError, GatewayError, RouterParseError};
pub use knowledge::{
    paragraph_chunker, ChunkConfig, Chunker, DocumentChunk, DocumentStore,
    KeywordRetriever, LoaderConfig, ParagraphChunker, RetrievedMatch, StoreStats,
};
pub use llm::{ChatMessage, LlmGateway, OpenAiCompatibleGateway, Role};
