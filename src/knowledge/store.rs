//! Document Store - 메모리 내 청크 저장소
//!
//! 시작 시 문서 폴더를 한 번 읽어 청크로 나누고, 이후에는 읽기 전용입니다.
//! 여러 에이전트가 `Arc<DocumentStore>`로 공유해도 잠금이 필요 없습니다.

use std::collections::HashSet;
use std::path::Path;

use crate::collector::{CollectorConfig, FileCollector};
use crate::error::DocumentLoadError;

use super::chunker::{paragraph_chunker, ChunkConfig, Chunker};
use super::keyword::tokenize;

// ============================================================================
// Types
// ============================================================================

/// 문서 청크 (생성 후 불변)
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    source: String,
    text: String,
    index: usize,
    tokens: HashSet<String>,
}

impl DocumentChunk {
    /// 새 청크 생성 (토큰은 미리 계산)
    pub fn new(source: impl Into<String>, text: impl Into<String>, index: usize) -> Self {
        let text = text.into();
        let tokens = tokenize(&text);
        Self {
            source: source.into(),
            text,
            index,
            tokens,
        }
    }

    /// 원본 파일 이름
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 같은 source 안에서의 순번 (0부터)
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn tokens(&self) -> &HashSet<String> {
        &self.tokens
    }
}

/// 로더 설정
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    pub collector: CollectorConfig,
    pub chunk: ChunkConfig,
}

impl LoaderConfig {
    /// 청크 최대 크기만 지정
    pub fn with_max_chunk_chars(max_characters: usize) -> Self {
        Self {
            chunk: ChunkConfig { max_characters },
            ..Default::default()
        }
    }
}

/// 저장소 통계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub document_count: usize,
    pub chunk_count: usize,
    pub total_content_bytes: usize,
}

// ============================================================================
// DocumentStore
// ============================================================================

/// 읽기 전용 청크 저장소
#[derive(Debug, Default)]
pub struct DocumentStore {
    chunks: Vec<DocumentChunk>,
    document_count: usize,
}

impl DocumentStore {
    /// 문서 폴더 로딩
    ///
    /// 폴더가 없거나 읽을 수 없으면 `DocumentLoadError`.
    /// 개별 파일 읽기 실패는 경고 후 건너뜁니다.
    pub fn load(dir: &Path, config: &LoaderConfig) -> Result<Self, DocumentLoadError> {
        let collector = FileCollector::new(config.collector.clone());
        let chunker = paragraph_chunker(config.chunk.clone());

        let files = collector.collect_directory(dir)?;

        let mut chunks = Vec::new();
        let mut document_count = 0;

        for file in &files {
            let raw = match std::fs::read(&file.path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Failed to read document {:?}: {}", file.path, e);
                    continue;
                }
            };
            let text = String::from_utf8_lossy(&raw);

            let pieces = chunker.chunk(&text);
            if pieces.is_empty() {
                tracing::debug!("No chunks generated for document: {}", file.name);
            }

            chunks.extend(
                pieces
                    .into_iter()
                    .enumerate()
                    .map(|(i, piece)| DocumentChunk::new(file.name.clone(), piece, i)),
            );
            document_count += 1;
        }

        tracing::info!(
            "Loaded {} chunks from {} documents ({})",
            chunks.len(),
            document_count,
            chunker.name()
        );

        Ok(Self {
            chunks,
            document_count,
        })
    }

    /// 이미 만들어진 청크로 저장소 구성
    pub fn from_chunks(chunks: Vec<DocumentChunk>) -> Self {
        let document_count = chunks
            .iter()
            .map(DocumentChunk::source)
            .collect::<HashSet<_>>()
            .len();
        Self {
            chunks,
            document_count,
        }
    }

    /// 로딩 순서대로의 청크 목록
    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// 저장소 통계
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            document_count: self.document_count,
            chunk_count: self.chunks.len(),
            total_content_bytes: self.chunks.iter().map(|c| c.text.len()).sum(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
