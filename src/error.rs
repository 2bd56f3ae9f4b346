//! 에러 타입 정의
//!
//! - `DocumentLoadError`: 시작 시 문서 폴더 로딩 실패 (치명적)
//! - `GatewayError`: LLM 호출 실패 (턴 단위, 재시도 없음)
//! - `RouterParseError`: 라우터 응답 파싱 실패 (내부용, NO_SEARCH로 변환됨)
//! - `ConfigError`: 설정 로딩 실패

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 문서 폴더 로딩 에러
#[derive(Debug, Error)]
pub enum DocumentLoadError {
    #[error("Document directory not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("Failed to read document directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// LLM 게이트웨이 에러
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Failed to send chat request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Rate limit exceeded (429): {0}")]
    RateLimited(String),

    #[error("LLM API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Malformed chat response: {0}")]
    MalformedResponse(String),

    #[error("Chat request exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Gateway configuration error: {0}")]
    Config(String),
}

/// 라우터 응답 파싱 에러
///
/// `Router::decide` 밖으로 나가지 않습니다.
#[derive(Debug, Error)]
pub enum RouterParseError {
    #[error("No JSON object found in router output")]
    NoJson,

    #[error("Invalid JSON in router output: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unknown router action: {0:?}")]
    UnknownAction(String),
}

/// 설정 로딩 에러
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "API key not found. Set api_key in config.json, or PALANK_AGENT_API_KEY / OPENAI_API_KEY"
    )]
    MissingApiKey,

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Invalid base_url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
