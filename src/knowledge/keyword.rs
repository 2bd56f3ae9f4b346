//! 키워드 검색 - 토큰 겹침 개수 기반 순위
//!
//! score = |쿼리 토큰 ∩ 청크 토큰|
//!
//! TF-IDF나 임베딩이 아니라 단순 겹침 개수입니다. 결과는 결정적이며
//! 점수 내림차순, 동점이면 원래 청크 순서를 유지합니다 (안정 정렬).

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::store::DocumentChunk;

/// 기본 검색 결과 개수
pub const DEFAULT_TOP_K: usize = crate::config::DEFAULT_TOP_K;

// ============================================================================
// Types
// ============================================================================

/// 검색 결과 (청크는 저장소에서 빌려옴)
#[derive(Debug, Clone, Copy)]
pub struct RetrievedMatch<'a> {
    pub chunk: &'a DocumentChunk,
    /// 겹친 토큰 수 (항상 1 이상)
    pub score: usize,
}

impl RetrievedMatch<'_> {
    pub fn source(&self) -> &str {
        self.chunk.source()
    }

    pub fn text(&self) -> &str {
        self.chunk.text()
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

fn token_regex() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(r"[a-z0-9']+").expect("valid token regex"))
}

/// 소문자 변환 후 `[a-z0-9']+` 단위로 토큰 집합 생성
pub fn tokenize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    token_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

// ============================================================================
// Search
// ============================================================================

/// 키워드 검색
///
/// 빈 쿼리, 빈 청크 목록, `k == 0`이면 빈 결과.
pub fn search<'a>(chunks: &'a [DocumentChunk], query: &str, k: usize) -> Vec<RetrievedMatch<'a>> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() || chunks.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<RetrievedMatch<'a>> = chunks
        .iter()
        .filter_map(|chunk| {
            let score = query_tokens
                .iter()
                .filter(|t| chunk.tokens().contains(*t))
                .count();
            (score > 0).then_some(RetrievedMatch { chunk, score })
        })
        .collect();

    // sort_by는 안정 정렬이므로 동점은 원래 순서 유지
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(k);
    scored
}

/// 키워드 검색기
#[derive(Debug, Clone)]
pub struct KeywordRetriever {
    top_k: usize,
}

impl Default for KeywordRetriever {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl KeywordRetriever {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// 상위 `top_k`개 검색
    pub fn search<'a>(&self, chunks: &'a [DocumentChunk], query: &str) -> Vec<RetrievedMatch<'a>> {
        let matches = search(chunks, query, self.top_k);
        tracing::debug!(
            "Keyword search {:?}: {} matches over {} chunks",
            query,
            matches.len(),
            chunks.len()
        );
        matches
    }
}

// ============================================================================
// Tests
// ============================================================================
