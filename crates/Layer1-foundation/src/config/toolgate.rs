//! Toolgate Config - 통합 설정
//!
//! 로드 순서 (뒤가 우선):
//! 1. 글로벌 `<config_dir>/toolgate/toolgate.json`
//! 2. 프로젝트 `.toolgate/toolgate.json`
//! 3. 환경변수 `TOOLGATE_*`

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

use super::GatewayConnection;

/// 설정 파일명
pub const TOOLGATE_CONFIG_FILE: &str = "toolgate.json";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;
pub const DEFAULT_AI_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_AI_WEIGHT: f64 = 0.6;
pub const DEFAULT_TOP_N: usize = 5;

// ============================================================================
// Toolgate Config (통합)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolgateConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub ai: AiSettings,

    #[serde(default)]
    pub selection: SelectionSettings,
}

impl ToolgateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 + 환경변수 병합 로드
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<ToolgateConfig>(TOOLGATE_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) =
                project.load_optional::<ToolgateConfig>(TOOLGATE_CONFIG_FILE)?
            {
                config.merge(project_config);
            }
        }

        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Apply `TOOLGATE_*` overrides using `lookup` as the variable source.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gw = &mut self.gateway;
        if let Some(v) = lookup("TOOLGATE_GATEWAY_URL") {
            gw.url = Some(v);
        }
        if let Some(v) = lookup("TOOLGATE_GATEWAY_TOKEN") {
            gw.token = Some(v);
        }
        if let Some(v) = lookup("TOOLGATE_TIMEOUT_MS") {
            gw.timeout_ms = Some(parse_env("TOOLGATE_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = lookup("TOOLGATE_MAX_RETRIES") {
            gw.max_retries = Some(parse_env("TOOLGATE_MAX_RETRIES", &v)?);
        }
        if let Some(v) = lookup("TOOLGATE_RETRY_DELAY_MS") {
            gw.retry_delay_ms = Some(parse_env("TOOLGATE_RETRY_DELAY_MS", &v)?);
        }

        let ai = &mut self.ai;
        if let Some(v) = lookup("TOOLGATE_AI_ENDPOINT") {
            ai.endpoint = Some(v);
        }
        if let Some(v) = lookup("TOOLGATE_AI_MODEL") {
            ai.model = Some(v);
        }
        if let Some(v) = lookup("TOOLGATE_AI_API_KEY") {
            ai.api_key = Some(v);
        }
        if let Some(v) = lookup("TOOLGATE_AI_MIN_CONFIDENCE") {
            ai.min_confidence = Some(parse_env("TOOLGATE_AI_MIN_CONFIDENCE", &v)?);
        }
        if let Some(v) = lookup("TOOLGATE_AI_WEIGHT") {
            self.selection.ai_weight = Some(parse_env("TOOLGATE_AI_WEIGHT", &v)?);
        }

        Ok(())
    }

    // ========================================================================
    // Merge / Validate
    // ========================================================================

    /// 다른 설정과 병합 (other가 우선)
    pub fn merge(&mut self, other: ToolgateConfig) {
        self.gateway.merge(other.gateway);
        self.ai.merge(other.ai);
        self.selection.merge(other.selection);
    }

    pub fn validate(&self) -> Result<()> {
        if self.gateway.max_retries == Some(0) {
            return Err(Error::Config("maxRetries must be at least 1".to_string()));
        }
        check_unit_range("ai.minConfidence", self.ai.min_confidence)?;
        check_unit_range("selection.aiWeight", self.selection.ai_weight)?;
        if self.selection.top_n == Some(0) {
            return Err(Error::Config("selection.topN must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Freeze the gateway section into an immutable connection.
    pub fn connection(&self) -> Result<GatewayConnection> {
        let url = self
            .gateway
            .url
            .as_deref()
            .ok_or(Error::MissingConfig("gateway.url"))?;

        let mut connection = GatewayConnection::new(url)?
            .with_timeout_ms(self.gateway.effective_timeout_ms())
            .with_max_retries(self.gateway.effective_max_retries())
            .with_retry_delay_ms(self.gateway.effective_retry_delay_ms())
            .with_max_redirects(self.gateway.effective_max_redirects());

        if let Some(token) = self.gateway.token.as_deref().filter(|t| !t.is_empty()) {
            connection = connection.with_bearer_token(token);
        }

        Ok(connection)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, value)))
}

fn check_unit_range(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(Error::Config(format!(
            "{} must be within [0, 1], got {}",
            name, v
        ))),
        _ => Ok(()),
    }
}

// ============================================================================
// Gateway Settings
// ============================================================================

/// 게이트웨이 연결 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySettings {
    /// Base URL (예: https://gateway.example.com)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Bearer 토큰
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// 요청 1회 타임아웃 (밀리초)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// 총 시도 횟수 (첫 시도 포함)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// 기본 재시도 딜레이 (밀리초)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,

    /// 요청당 최대 리다이렉트
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_redirects: Option<u32>,
}

impl GatewaySettings {
    pub fn effective_timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub fn effective_max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    pub fn effective_retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS)
    }

    pub fn effective_max_redirects(&self) -> u32 {
        self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS)
    }

    fn merge(&mut self, other: GatewaySettings) {
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.max_retries.is_some() {
            self.max_retries = other.max_retries;
        }
        if other.retry_delay_ms.is_some() {
            self.retry_delay_ms = other.retry_delay_ms;
        }
        if other.max_redirects.is_some() {
            self.max_redirects = other.max_redirects;
        }
    }
}

// ============================================================================
// AI Settings
// ============================================================================

/// AI 추천 프로바이더 설정 (endpoint가 없으면 비활성)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    /// OpenAI 호환 chat completions 엔드포인트
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// 이 값 미만의 추천은 무시
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
}

impl AiSettings {
    pub fn is_enabled(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_AI_MODEL)
    }

    pub fn effective_timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_AI_TIMEOUT_MS)
    }

    pub fn effective_min_confidence(&self) -> f64 {
        self.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE)
    }

    fn merge(&mut self, other: AiSettings) {
        if other.endpoint.is_some() {
            self.endpoint = other.endpoint;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.min_confidence.is_some() {
            self.min_confidence = other.min_confidence;
        }
    }
}

// ============================================================================
// Selection Settings
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSettings {
    /// 반환할 최대 후보 수
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,

    /// AI 신뢰도 가중치 (0.0 - 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_weight: Option<f64>,
}

impl SelectionSettings {
    pub fn effective_top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    pub fn effective_ai_weight(&self) -> f64 {
        self.ai_weight.unwrap_or(DEFAULT_AI_WEIGHT)
    }

    fn merge(&mut self, other: SelectionSettings) {
        if other.top_n.is_some() {
            self.top_n = other.top_n;
        }
        if other.ai_weight.is_some() {
            self.ai_weight = other.ai_weight;
        }
    }
}
