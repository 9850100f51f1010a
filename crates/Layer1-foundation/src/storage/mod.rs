//! Storage module for Toolgate
//!
//! - `json`: JSON - 설정 파일 저장/로드

mod json;

// JSON Storage (범용)
pub use json::{JsonStore, STORE_DIR_NAME};
