//! Gateway error types
//!
//! GatewayError는 게이트웨이 통신 실패를 분류한다.
//! 재시도 여부는 `kind()`와 `RetryableError` 구현이 결정한다.

use crate::retry::{RetryClassification, RetryableError};
use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;
use toolgate_foundation::UrlRejection;

/// 에러 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 요청 전에 거부됨 (URL 검증 실패)
    Validation,

    /// 재시도 가능 (5xx, 연결 실패, 타임아웃, DNS 실패)
    Transient,

    /// 재시도 불가 (4xx, 리다이렉트 초과)
    Permanent,

    /// 응답 형식 오류
    Protocol,
}

/// Errors that can occur while talking to the gateway
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    // ========================================================================
    // Validation
    // ========================================================================
    #[error("Unsafe URL rejected ({rule}): {0}", rule = .0.rule())]
    UnsafeUrl(#[from] UrlRejection),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ========================================================================
    // Transient
    // ========================================================================
    /// Server error (5xx)
    #[error("Server error (HTTP {status}): {body}")]
    ServerError { status: u16, body: String },

    /// Connection failed, DNS, reset, etc.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// 재시도 소진
    #[error("Connection failed after {attempts} attempt(s): {last_error}")]
    ConnectionFailed {
        attempts: u32,
        last_error: Box<GatewayError>,
    },

    // ========================================================================
    // Permanent
    // ========================================================================
    /// Client error (4xx)
    #[error("Gateway rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Too many redirects (limit {limit})")]
    TooManyRedirects { limit: u32 },

    #[error("Redirect (HTTP {status}) without Location header")]
    MissingRedirectLocation { status: u16 },

    // ========================================================================
    // Protocol
    // ========================================================================
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Create from a non-success, non-redirect HTTP status.
    pub fn from_http_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            500..=599 => GatewayError::ServerError { status, body },
            _ => GatewayError::Rejected { status, body },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            // DNS 실패는 SSRF 판정이 아니라 네트워크 문제
            GatewayError::UnsafeUrl(rejection) if rejection.is_resolution_failure() => {
                ErrorKind::Transient
            }
            GatewayError::UnsafeUrl(_) | GatewayError::InvalidRequest(_) => ErrorKind::Validation,

            GatewayError::ServerError { .. }
            | GatewayError::Network(_)
            | GatewayError::Timeout(_)
            | GatewayError::ConnectionFailed { .. } => ErrorKind::Transient,

            GatewayError::Rejected { .. }
            | GatewayError::TooManyRedirects { .. }
            | GatewayError::MissingRedirectLocation { .. } => ErrorKind::Permanent,

            GatewayError::InvalidResponse(_) => ErrorKind::Protocol,
        }
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::ServerError { status, .. }
            | GatewayError::Rejected { status, .. }
            | GatewayError::MissingRedirectLocation { status } => Some(*status),
            GatewayError::ConnectionFailed { last_error, .. } => last_error.status(),
            _ => None,
        }
    }
}

impl RetryableError for GatewayError {
    fn classify(&self) -> RetryClassification {
        match self {
            // 이미 소진된 에러는 다시 감싸지 않는다
            GatewayError::ConnectionFailed { .. } => RetryClassification::NoRetry,
            other if other.kind() == ErrorKind::Transient => RetryClassification::Retry,
            _ => RetryClassification::NoRetry,
        }
    }

    fn exhausted(self, attempts: u32) -> Self {
        GatewayError::ConnectionFailed {
            attempts,
            last_error: Box::new(self),
        }
    }
}

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(after) => GatewayError::Timeout(after),
            TransportError::Connect(msg) | TransportError::Other(msg) => {
                GatewayError::Network(msg)
            }
        }
    }
}
