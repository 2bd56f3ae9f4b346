//! 설정 모듈
//!
//! 우선순위: CLI 인자 > 환경변수 > config.json > 기본값
//!
//! config.json 탐색 순서:
//! 1. `--config`로 지정한 경로 (없으면 에러)
//! 2. `./config.json`
//! 3. `~/.palank-agent/config.json` (데이터 디렉토리)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

// ============================================================================
// Defaults
// ============================================================================

/// 기본 OpenAI 호환 엔드포인트
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// 기본 모델
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// 기본 샘플링 온도
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
/// LLM 호출당 최대 대기 시간
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// 검색 결과 개수
pub const DEFAULT_TOP_K: usize = 3;
/// 기본 문서 폴더
pub const DEFAULT_DOCS_DIR: &str = "docs";
/// 청크 최대 크기 (문자 수)
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1200;

const CONFIG_FILE_NAME: &str = "config.json";

/// API 키 환경변수 (앞쪽이 우선)
const API_KEY_ENV_VARS: [&str; 2] = ["PALANK_AGENT_API_KEY", "OPENAI_API_KEY"];
const BASE_URL_ENV_VAR: &str = "PALANK_AGENT_BASE_URL";
const MODEL_ENV_VAR: &str = "PALANK_AGENT_MODEL";

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.palank-agent/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".palank-agent")
}

// ============================================================================
// Types
// ============================================================================

/// config.json 파일 형식
///
/// ```json
/// { "api_key": "sk-...", "base_url": "https://api.openai.com/v1", "model": "gpt-4o-mini" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub top_k: Option<usize>,
    pub docs_dir: Option<PathBuf>,
    pub max_chunk_chars: Option<usize>,
}

impl FileConfig {
    /// 파일에서 읽기
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// CLI에서 넘어오는 덮어쓰기 값
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub docs_dir: Option<PathBuf>,
    pub model: Option<String>,
    pub top_k: Option<usize>,
}

/// 최종 에이전트 설정
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// API 키 (검색/상태 명령어는 없어도 동작)
    pub api_key: Option<String>,
    /// OpenAI 호환 엔드포인트 (끝의 `/` 제거됨)
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// LLM 호출당 타임아웃
    pub request_timeout: Duration,
    pub top_k: usize,
    pub docs_dir: PathBuf,
    pub max_chunk_chars: usize,
    /// 실제로 읽은 설정 파일 (없으면 None)
    pub source_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            top_k: DEFAULT_TOP_K,
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            source_path: None,
        }
    }
}

impl AgentConfig {
    /// 설정 파일 + 프로세스 환경변수 + CLI 인자로 설정 구성
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let (file, source_path) = match discover_config_file(overrides.config_path.as_deref())? {
            Some(path) => {
                tracing::debug!("Loading config from {:?}", path);
                (FileConfig::from_path(&path)?, Some(path))
            }
            None => {
                tracing::debug!("No config file found, using environment and defaults");
                (FileConfig::default(), None)
            }
        };

        let mut config = Self::resolve(file, |key| std::env::var(key).ok(), overrides)?;
        config.source_path = source_path;
        Ok(config)
    }

    /// 값 병합 (환경변수 조회 함수를 주입받아 테스트 가능)
    pub fn resolve<F>(
        file: FileConfig,
        env: F,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|key| env_non_empty(*key))
            .or(file.api_key)
            .filter(|k| !k.trim().is_empty());

        let base_url = env_non_empty(BASE_URL_ENV_VAR)
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = normalize_base_url(&base_url)?;

        let model = overrides
            .model
            .clone()
            .or_else(|| env_non_empty(MODEL_ENV_VAR))
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let defaults = Self::default();

        let top_k = positive("top_k", overrides.top_k.or(file.top_k))?
            .unwrap_or(defaults.top_k);
        let request_timeout = positive("timeout_secs", file.timeout_secs)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Ok(Self {
            api_key,
            base_url,
            model,
            temperature: file.temperature.unwrap_or(defaults.temperature),
            request_timeout,
            top_k,
            docs_dir: overrides
                .docs_dir
                .clone()
                .or(file.docs_dir)
                .unwrap_or(defaults.docs_dir),
            max_chunk_chars: file
                .max_chunk_chars
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_chunk_chars),
            source_path: None,
        })
    }

    /// LLM 호출에 필요한 API 키
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    /// API 키 존재 여부
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 설정 파일 위치 결정
fn discover_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let candidates = [
        PathBuf::from(CONFIG_FILE_NAME),
        get_data_dir().join(CONFIG_FILE_NAME),
    ];

    Ok(candidates.into_iter().find(|p| p.is_file()))
}

/// 0이면 에러 (검색 개수와 타임아웃은 1 이상이어야 의미가 있음)
fn positive<T>(field: &'static str, value: Option<T>) -> Result<Option<T>, ConfigError>
where
    T: Copy + PartialEq + Default,
{
    match value {
        Some(v) if v == T::default() => Err(ConfigError::InvalidValue {
            field,
            reason: "must be at least 1".to_string(),
        }),
        other => Ok(other),
    }
}

/// base_url 검증 및 끝의 `/` 제거
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    url::Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    Ok(trimmed.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config =
            AgentConfig::resolve(FileConfig::default(), env_from(&[]), &ConfigOverrides::default())
                .unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.docs_dir, PathBuf::from("docs"));
        assert!(!config.has_api_key());
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            api_key: Some("file-key".to_string()),
            model: Some("file-model".to_string()),
            ..Default::default()
        };
        let env = env_from(&[
            ("OPENAI_API_KEY", "openai-key"),
            ("PALANK_AGENT_MODEL", "env-model"),
        ]);

        let config = AgentConfig::resolve(file, env, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("openai-key"));
        assert_eq!(config.model, "env-model");
    }

    #[test]
    fn test_api_key_env_priority() {
        let env = env_from(&[
            ("PALANK_AGENT_API_KEY", "agent-key"),
            ("OPENAI_API_KEY", "openai-key"),
        ]);
        let config =
            AgentConfig::resolve(FileConfig::default(), env, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.require_api_key().unwrap(), "agent-key");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let file = FileConfig {
            api_key: Some("file-key".to_string()),
            ..Default::default()
        };
        let env = env_from(&[("PALANK_AGENT_API_KEY", "  ")]);
        let config = AgentConfig::resolve(file, env, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn test_cli_overrides_win() {
        let file = FileConfig {
            model: Some("file-model".to_string()),
            top_k: Some(7),
            docs_dir: Some(PathBuf::from("file-docs")),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            model: Some("cli-model".to_string()),
            top_k: Some(5),
            docs_dir: Some(PathBuf::from("cli-docs")),
            ..Default::default()
        };
        let env = env_from(&[("PALANK_AGENT_MODEL", "env-model")]);

        let config = AgentConfig::resolve(file, env, &overrides).unwrap();
        assert_eq!(config.model, "cli-model");
        assert_eq!(config.top_k, 5);
        assert_eq!(config.docs_dir, PathBuf::from("cli-docs"));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let overrides = ConfigOverrides {
            top_k: Some(0),
            ..Default::default()
        };
        let result = AgentConfig::resolve(FileConfig::default(), env_from(&[]), &overrides);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "top_k", .. })
        ));

        let file = FileConfig {
            top_k: Some(0),
            ..Default::default()
        };
        let result = AgentConfig::resolve(file, env_from(&[]), &ConfigOverrides::default());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "top_k", .. })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = FileConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        let result = AgentConfig::resolve(file, env_from(&[]), &ConfigOverrides::default());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                ..
            })
        ));

        let file = FileConfig {
            timeout_secs: Some(5),
            ..Default::default()
        };
        let config =
            AgentConfig::resolve(file, env_from(&[]), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let file = FileConfig {
            base_url: Some("http://localhost:11434/v1/".to_string()),
            ..Default::default()
        };
        let config =
            AgentConfig::resolve(file, env_from(&[]), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_invalid_base_url() {
        let file = FileConfig {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        let result = AgentConfig::resolve(file, env_from(&[]), &ConfigOverrides::default());
        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn test_file_config_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api_key": "sk-test", "model": "gpt-test", "timeout_secs": 5}}"#
        )
        .unwrap();

        let parsed = FileConfig::from_path(file.path()).unwrap();
        assert_eq!(parsed.api_key.as_deref(), Some("sk-test"));
        assert_eq!(parsed.model.as_deref(), Some("gpt-test"));
        assert_eq!(parsed.timeout_secs, Some(5));
        assert!(parsed.base_url.is_none());
    }

    #[test]
    fn test_file_config_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result = FileConfig::from_path(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_explicit_config_path_must_exist() {
        let result = discover_config_file(Some(Path::new("/definitely/missing/config.json")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
