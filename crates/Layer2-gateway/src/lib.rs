//! # toolgate-gateway
//!
//! Resilient JSON-RPC client for a remote tool gateway:
//! - Discovery: `GET {base}/tools` → `ToolDescriptor` 목록
//! - Invocation: `POST {base}/rpc` (JSON-RPC 2.0 `tools/call`)
//! - 재시도: 지수 백오프, 일시적 실패만
//! - 리다이렉트: 홉마다 URL 재검증, 요청당 제한
//!
//! ## Example
//!
//! ```ignore
//! use toolgate_gateway::GatewayClient;
//! use toolgate_foundation::GatewayConnection;
//!
//! let connection = GatewayConnection::new("https://gateway.example.com")?;
//! let client = GatewayClient::new(connection)?;
//! let tools = client.list_tools().await?;
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::GatewayClient;
pub use error::{ErrorKind, GatewayError};
pub use protocol::JsonRpcRequest;
pub use retry::{with_retry, RetryClassification, RetryConfig, RetryableError};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError,
};
pub use types::{InvocationResult, ToolDescriptor, REMOTE_TOOL_ERROR_PREFIX};
