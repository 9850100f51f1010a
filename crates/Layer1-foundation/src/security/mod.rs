//! Security - 외부 요청 대상 검증
//!
//! - `outbound`: SSRF 방어 (loopback / link-local / private 대역 차단)

pub mod outbound;

pub use outbound::{blocked_range, validate_parsed, validate_url, BlockedRange, UrlRejection, VettedUrl};
