//! Gateway Client - 도구 탐색 및 호출
//!
//! 모든 요청은 다음 순서를 따른다:
//! 1. URL 검증 (SSRF 방어)
//! 2. 전송 (시도마다 타임아웃)
//! 3. 3xx면 Location을 재검증하고 따라감 (요청당 최대 `max_redirects`)
//! 4. 일시적 실패는 지수 백오프로 재시도

use crate::error::GatewayError;
use crate::protocol::{self, JsonRpcRequest, RPC_PATH, TOOLS_PATH};
use crate::retry::{with_retry, RetryConfig};
use crate::transport::{HttpMethod, HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{InvocationResult, ToolDescriptor};
use serde_json::{Map, Value};
use std::sync::Arc;
use toolgate_foundation::{validate_parsed, validate_url, GatewayConnection, UrlRejection};
use tracing::{debug, info, warn};
use url::Url;

/// Resilient gateway client
///
/// Holds no mutable state; clone freely and share across tasks.
#[derive(Clone)]
pub struct GatewayClient {
    connection: Arc<GatewayConnection>,
    transport: Arc<dyn HttpTransport>,
    retry: RetryConfig,
}

impl GatewayClient {
    /// Client over the production `reqwest` transport
    pub fn new(connection: GatewayConnection) -> Result<Self, GatewayError> {
        let transport = ReqwestTransport::new().map_err(GatewayError::from)?;
        Ok(Self::with_transport(connection, Arc::new(transport)))
    }

    pub fn with_transport(connection: GatewayConnection, transport: Arc<dyn HttpTransport>) -> Self {
        let retry = RetryConfig::from_connection(&connection);
        Self {
            connection: Arc::new(connection),
            transport,
            retry,
        }
    }

    pub fn connection(&self) -> &GatewayConnection {
        &self.connection
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Discover the gateway's tool catalog.
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, GatewayError> {
        let url = self.connection.endpoint(TOOLS_PATH);
        let body = self.execute(HttpMethod::Get, &url, None, "list_tools").await?;

        let tools = protocol::normalize_catalog(&body);
        info!("Discovered {} tool(s) from gateway", tools.len());
        Ok(tools)
    }

    /// Invoke a tool through the gateway's JSON-RPC endpoint.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<InvocationResult, GatewayError> {
        if name.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("tool name is empty".to_string()));
        }

        let request = JsonRpcRequest::tools_call(name, arguments);
        let payload = serde_json::to_value(&request)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let url = self.connection.endpoint(RPC_PATH);
        let body = self
            .execute(HttpMethod::Post, &url, Some(payload), "call_tool")
            .await?;

        let result = protocol::parse_invocation(&body)?;
        if let InvocationResult::RemoteError(msg) = &result {
            warn!("Tool '{}' returned an error: {}", name, msg);
        } else {
            debug!("Tool '{}' completed", name);
        }
        Ok(result)
    }

    // ========================================================================
    // Request pipeline
    // ========================================================================

    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
        operation_name: &str,
    ) -> Result<String, GatewayError> {
        with_retry(&self.retry, operation_name, || {
            self.send_once(method, url, body.clone())
        })
        .await
    }

    /// One attempt, following redirects up to the connection's limit.
    async fn send_once(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
    ) -> Result<String, GatewayError> {
        let mut current = validate_url(url).await?;
        let mut method = method;
        let mut body = body;
        let mut bearer = self.connection.bearer_token().map(str::to_string);
        let mut redirects = 0u32;

        loop {
            let response = self
                .transport
                .send(HttpRequest {
                    method,
                    url: current.url.clone(),
                    bearer_token: bearer.clone(),
                    body: body.clone(),
                    timeout: self.connection.timeout(),
                    pinned_addrs: current.addrs.clone(),
                })
                .await?;

            if response.is_success() {
                return Ok(response.body);
            }

            if !response.is_redirect() {
                return Err(GatewayError::from_http_status(response.status, response.body));
            }

            redirects += 1;
            let limit = self.connection.max_redirects();
            if redirects > limit {
                warn!("Redirect limit ({}) exceeded at {}", limit, current.url);
                return Err(GatewayError::TooManyRedirects { limit });
            }

            let location = response
                .location
                .ok_or(GatewayError::MissingRedirectLocation {
                    status: response.status,
                })?;
            let next = validate_parsed(&resolve_location(&current.url, &location)?).await?;

            // 다른 origin으로 넘어가면 자격 증명을 보내지 않는다
            if next.url.origin() != current.url.origin() {
                bearer = None;
            }
            // 303 (and 301/302 after POST) continue as GET
            if response.status == 303
                || (matches!(response.status, 301 | 302) && method == HttpMethod::Post)
            {
                method = HttpMethod::Get;
                body = None;
            }

            debug!(
                "Following redirect {}/{} ({}): {} -> {}",
                redirects, limit, response.status, current.url, next.url
            );
            current = next;
        }
    }
}

fn resolve_location(current: &Url, location: &str) -> Result<Url, GatewayError> {
    current.join(location).map_err(|e| {
        GatewayError::UnsafeUrl(UrlRejection::Malformed {
            url: location.to_string(),
            reason: e.to_string(),
        })
    })
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("connection", &self.connection)
            .field("retry", &self.retry)
            .finish()
    }
}
