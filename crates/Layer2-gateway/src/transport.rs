//! HTTP Transport - 전송 계층
//!
//! 게이트웨이 클라이언트는 이 trait 뒤에서만 HTTP를 사용한다.
//! 리다이렉트는 전송 계층이 따라가지 않고 3xx 응답 그대로 돌려준다.
//! (클라이언트가 홉마다 URL을 재검증해야 하므로)

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, LOCATION};
use reqwest::redirect::Policy;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::{Host, Url};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// 단일 HTTP 시도
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub bearer_token: Option<String>,
    /// JSON body (POST)
    pub body: Option<Value>,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Addresses the URL's hostname was vetted against. When non-empty the
    /// transport must connect to these instead of resolving again.
    pub pinned_addrs: Vec<SocketAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// `Location` header, if any
    pub location: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Other(String),
}

/// HTTP transport trait
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 요청 1회 전송 (리다이렉트/재시도 없음)
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

// ============================================================================
// Reqwest Transport
// ============================================================================

/// Production transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = build_client(reqwest::Client::builder())?;
        Ok(Self { client })
    }

    /// Client for `request`: the shared one, or a one-off client whose
    /// resolver is pinned to the vetted addresses.
    fn client_for(&self, request: &HttpRequest) -> Result<reqwest::Client, TransportError> {
        match request.url.host() {
            Some(Host::Domain(domain)) if !request.pinned_addrs.is_empty() => {
                debug!("Pinning {} to {:?}", domain, request.pinned_addrs);
                // a proxy would resolve the name itself
                build_client(
                    reqwest::Client::builder()
                        .no_proxy()
                        .resolve_to_addrs(domain, &request.pinned_addrs),
                )
            }
            _ => Ok(self.client.clone()),
        }
    }
}

fn build_client(builder: reqwest::ClientBuilder) -> Result<reqwest::Client, TransportError> {
    builder
        .redirect(Policy::none())
        .build()
        .map_err(|e| TransportError::Other(format!("Failed to create HTTP client: {}", e)))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!("{} {}", request.method.as_str(), request.url);

        let client = self.client_for(&request)?;
        let mut builder = match request.method {
            HttpMethod::Get => client.get(request.url.clone()),
            HttpMethod::Post => client.post(request.url.clone()),
        }
        .timeout(request.timeout)
        .header(ACCEPT, "application/json");

        if let Some(token) = &request.bearer_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest(e, request.timeout))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest(e, request.timeout))?;

        Ok(HttpResponse {
            status,
            location,
            body,
        })
    }
}

fn classify_reqwest(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_helpers() {
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(404, "missing").is_success());

        let redirect = HttpResponse::redirect(302, "/elsewhere");
        assert!(redirect.is_redirect());
        assert_eq!(redirect.location.as_deref(), Some("/elsewhere"));
    }

    fn request(url: &str, pinned_addrs: Vec<SocketAddr>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: Url::parse(url).unwrap(),
            bearer_token: None,
            body: None,
            timeout: Duration::from_secs(1),
            pinned_addrs,
        }
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[test]
    fn test_client_for_pinned_and_unpinned_requests() {
        let transport = ReqwestTransport::new().unwrap();
        let addrs = vec!["93.184.216.34:443".parse().unwrap()];

        assert!(transport
            .client_for(&request("https://gw.example.com/rpc", addrs.clone()))
            .is_ok());
        // literal IP hosts connect directly
        assert!(transport
            .client_for(&request("http://93.184.216.34/rpc", addrs))
            .is_ok());
        assert!(transport
            .client_for(&request("https://gw.example.com/rpc", Vec::new()))
            .is_ok());
    }

    #[tokio::test]
    async fn test_pinned_address_is_the_one_dialed() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                .await
                .unwrap();
        });

        // `.invalid` never resolves, so only the pinned address can answer
        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(request(
                &format!("http://pinned.invalid:{}/tools", addr.port()),
                vec![addr],
            ))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");
    }
}
