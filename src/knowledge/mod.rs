//! Knowledge 모듈 - 로컬 문서 청크 저장 및 키워드 검색
//!
//! - Chunker: 문단 단위 텍스트 분할
//! - Store: 시작 시 한 번 로딩되는 읽기 전용 청크 저장소
//! - Keyword: 토큰 겹침 개수 기반 검색

mod chunker;
mod keyword;
mod store;

// Re-exports
pub use chunker::{paragraph_chunker, ChunkConfig, Chunker, ParagraphChunker};
pub use keyword::{search, tokenize, KeywordRetriever, RetrievedMatch, DEFAULT_TOP_K};
pub use store::{DocumentChunk, DocumentStore, LoaderConfig, StoreStats};
