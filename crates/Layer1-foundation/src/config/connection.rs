//! Gateway connection - 불변 연결 설정
//!
//! 한 번 만들어지면 변경되지 않으며 클라이언트 간에 공유된다.
//! 주소 대역 검사는 요청 시점에 `security::validate_url`이 수행한다.

use crate::security::UrlRejection;
use crate::{Error, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

use super::toolgate::{
    DEFAULT_MAX_REDIRECTS, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_MS,
};

#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConnection {
    base_url: String,
    bearer_token: Option<String>,
    timeout: Duration,
    max_retries: u32,
    base_retry_delay: Duration,
    max_redirects: u32,
}

impl GatewayConnection {
    /// Create a connection with default limits.
    ///
    /// Only the shape of the URL is checked here; trailing slashes are dropped
    /// so endpoint joins never produce `//`.
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim();
        let parsed = Url::parse(trimmed).map_err(|e| {
            Error::UnsafeUrl(UrlRejection::Malformed {
                url: trimmed.to_string(),
                reason: e.to_string(),
            })
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(UrlRejection::InvalidScheme(other.to_string()).into()),
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(UrlRejection::NoHostname.into());
        }

        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            bearer_token: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            base_retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        })
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Duration::from_millis(ms);
        self
    }

    /// Total attempts per request, first one included. Clamped to at least 1.
    pub fn with_max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = attempts.max(1);
        self
    }

    pub fn with_retry_delay_ms(mut self, ms: u64) -> Self {
        self.base_retry_delay = Duration::from_millis(ms);
        self
    }

    pub fn with_max_redirects(mut self, limit: u32) -> Self {
        self.max_redirects = limit;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_retry_delay(&self) -> Duration {
        self.base_retry_delay
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// `base_url` + `/` + `path`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

// 토큰이 로그에 찍히지 않도록 직접 구현
impl fmt::Debug for GatewayConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConnection")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("base_retry_delay", &self.base_retry_delay)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}
