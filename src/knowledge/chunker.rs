//! Text Chunking Module
//!
//! 문서를 문단(빈 줄) 단위로 나누고, 너무 긴 문단은
//! 줄 → 문자 경계 순으로 다시 잘라 최대 크기를 넘지 않게 합니다.
//! 오버랩과 작은 청크 병합은 하지 않습니다.

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 최대 청크 크기 (문자 수)
    pub max_characters: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_characters: crate::config::DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// ParagraphChunker
// ============================================================================

/// 문단 청커
pub struct ParagraphChunker {
    config: ChunkConfig,
}

impl ParagraphChunker {
    /// 설정으로 생성 (최대 크기 0은 1로 보정)
    pub fn new(config: ChunkConfig) -> Self {
        Self {
            config: ChunkConfig {
                max_characters: config.max_characters.max(1),
            },
        }
    }

    /// 기본 설정으로 생성
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// 긴 문단을 줄 단위로 분할
    fn split_long_paragraph(&self, para: &str) -> Vec<String> {
        let max = self.config.max_characters;
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for line in para.lines() {
            let line = line.trim_end();
            let line_len = line.chars().count();

            // 줄 하나가 최대 크기 초과
            if line_len > max {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                chunks.extend(split_by_chars(line, max));
                continue;
            }

            let sep = usize::from(!current.is_empty());
            if current_len + sep + line_len > max {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
        }

        if !current.trim().is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

impl Chunker for ParagraphChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }

        // CRLF 정규화 후 빈 줄 기준 분할
        let normalized = text.replace("\r\n", "\n");

        normalized
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .flat_map(|p| {
                if p.chars().count() <= self.config.max_characters {
                    vec![p.to_string()]
                } else {
                    self.split_long_paragraph(p)
                }
            })
            .filter(|c| !c.trim().is_empty())
            .collect()
    }

    fn name(&self) -> &'static str {
        "ParagraphChunker"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 한 줄을 최대 문자 수로 자르기 (가능하면 공백에서)
fn split_by_chars(line: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + max).min(chars.len());

        if end < chars.len() {
            // 윈도우 뒤쪽 절반 안에서 마지막 공백 찾기
            if let Some(ws) = chars[start..end]
                .iter()
                .rposition(|c| c.is_whitespace())
                .filter(|&p| p >= max / 2)
            {
                end = start + ws + 1;
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        start = end;
    }

    pieces
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 문단 청커 생성 (설정 지정)
pub fn paragraph_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(ParagraphChunker::new(config))
}

// ============================================================================
// Tests
// ============================================================================
