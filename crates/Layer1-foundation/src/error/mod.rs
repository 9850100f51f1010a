//! Error types for Toolgate
//!
//! 설정/검증 에러를 중앙에서 관리.
//! 네트워크 계층 에러는 `toolgate-gateway`의 `GatewayError`가 담당한다.

use crate::security::UrlRejection;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Toolgate 공통 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration value: {0}")]
    MissingConfig(&'static str),

    // ========================================================================
    // 검증 관련
    // ========================================================================
    #[error("Unsafe URL: {0}")]
    UnsafeUrl(#[from] UrlRejection),
}
