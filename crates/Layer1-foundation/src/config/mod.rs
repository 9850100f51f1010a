//! Config - 통합 설정 관리
//!
//! - `toolgate.rs` - ToolgateConfig (글로벌/프로젝트/환경변수 병합)
//! - `connection.rs` - GatewayConnection (불변 연결 설정)

mod connection;
mod toolgate;

pub use connection::GatewayConnection;
pub use toolgate::{
    AiSettings, GatewaySettings, SelectionSettings, ToolgateConfig, DEFAULT_AI_MODEL,
    DEFAULT_AI_TIMEOUT_MS, DEFAULT_AI_WEIGHT, DEFAULT_MAX_REDIRECTS, DEFAULT_MAX_RETRIES,
    DEFAULT_MIN_CONFIDENCE, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_MS, DEFAULT_TOP_N,
    TOOLGATE_CONFIG_FILE,
};
