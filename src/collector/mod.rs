//! 파일 수집 모듈
//!
//! 문서 폴더에서 텍스트 문서 파일을 찾습니다.
//! 기본값은 폴더 바로 아래의 `.txt` 파일만 수집합니다 (하위 폴더 제외).

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::DocumentLoadError;

// ============================================================================
// Collected File
// ============================================================================

/// 수집된 파일 정보
#[derive(Debug, Clone)]
pub struct CollectedFile {
    /// 파일 경로
    pub path: PathBuf,
    /// 문서 폴더 기준 상대 경로, `/` 구분 (청크의 source로 사용)
    pub name: String,
}

// ============================================================================
// File Collector
// ============================================================================

/// 파일 수집기 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 하위 폴더까지 수집
    pub recursive: bool,
    /// .gitignore 패턴 존중 여부 (재귀 수집 시)
    pub respect_gitignore: bool,
    /// 숨김 파일 포함 여부
    pub include_hidden: bool,
    /// 최대 파일 크기 (바이트, 0이면 제한 없음)
    pub max_file_size: u64,
    /// 수집할 확장자 (대소문자 무시)
    pub extensions: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            respect_gitignore: true,
            include_hidden: false,
            max_file_size: 10 * 1024 * 1024, // 10MB
            extensions: vec!["txt".to_string()],
        }
    }
}

/// 파일 수집기
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    /// 새 수집기 생성
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 수집기 생성
    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    /// 폴더에서 문서 파일 수집
    ///
    /// 결과는 경로 순으로 정렬됩니다. 빈 폴더는 빈 목록을 반환합니다.
    pub fn collect_directory(&self, path: &Path) -> Result<Vec<CollectedFile>, DocumentLoadError> {
        if !path.exists() {
            return Err(DocumentLoadError::NotFound(path.to_path_buf()));
        }

        if !path.is_dir() {
            return Err(DocumentLoadError::NotADirectory(path.to_path_buf()));
        }

        // 읽기 권한 확인 (WalkBuilder는 루트 에러를 항목 에러로만 알려줌)
        std::fs::read_dir(path).map_err(|source| DocumentLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();

        let mut builder = WalkBuilder::new(path);
        builder
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .sort_by_file_name(|a, b| a.cmp(b));
        if !self.config.recursive {
            builder.max_depth(Some(1));
        }

        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read entry: {}", e);
                    continue;
                }
            };

            // 파일만 처리
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let file_path = entry.path().to_path_buf();
            if !self.has_supported_extension(&file_path) {
                continue;
            }

            let size = match entry.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    tracing::warn!("Failed to read metadata {:?}: {}", file_path, e);
                    continue;
                }
            };

            if self.config.max_file_size > 0 && size > self.config.max_file_size {
                tracing::debug!("Skipping large file: {:?} ({} bytes)", file_path, size);
                continue;
            }

            let name = source_name(path, &file_path);

            files.push(CollectedFile {
                path: file_path,
                name,
            });
        }

        tracing::info!("Collected {} files from {:?}", files.len(), path);
        Ok(files)
    }

    /// 확장자 필터
    fn has_supported_extension(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self
                .config
                .extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// 문서 폴더 기준 상대 경로 (`nested/a.txt`)
///
/// 하위 폴더의 같은 이름 파일도 서로 다른 source가 됩니다.
fn source_name(root: &Path, file_path: &Path) -> String {
    let relative = file_path.strip_prefix(root).unwrap_or(file_path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Tests
// ============================================================================
