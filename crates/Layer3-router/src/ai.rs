//! AI Recommender - LLM 기반 도구 추천
//!
//! OpenAI 호환 chat completions 엔드포인트에 카탈로그를 보여주고
//! `{"tool": "<name>", "confidence": 0.0-1.0}` 한 개를 받는다.
//!
//! 설정(`AiProviderConfig`)은 요청마다 전달되는 불변 값이다.
//! 다른 모델이 필요하면 `with_model`로 새 값을 만든다.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use toolgate_foundation::AiSettings;
use toolgate_gateway::{
    HttpMethod, HttpRequest, HttpTransport, ReqwestTransport, ToolDescriptor, TransportError,
};
use tracing::debug;
use url::Url;

// ============================================================================
// Config
// ============================================================================

/// Request-scoped AI provider configuration
#[derive(Clone, PartialEq)]
pub struct AiProviderConfig {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    min_confidence: f64,
}

impl AiProviderConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            timeout: Duration::from_millis(toolgate_foundation::config::DEFAULT_AI_TIMEOUT_MS),
            min_confidence: toolgate_foundation::config::DEFAULT_MIN_CONFIDENCE,
        }
    }

    /// `None` when no endpoint is configured
    pub fn from_settings(settings: &AiSettings) -> Option<Self> {
        if !settings.is_enabled() {
            return None;
        }
        let endpoint = settings.endpoint.clone()?;
        let mut config = Self::new(endpoint, settings.effective_model())
            .with_timeout(Duration::from_millis(settings.effective_timeout_ms()))
            .with_min_confidence(settings.effective_min_confidence());
        if let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            config = config.with_api_key(key);
        }
        Some(config)
    }

    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }
}

impl std::fmt::Debug for AiProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("min_confidence", &self.min_confidence)
            .finish()
    }
}

// ============================================================================
// Recommendation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRecommendation {
    /// 추천 도구 이름
    pub tool: String,
    /// 신뢰도 (0.0 - 1.0)
    pub confidence: f64,
}

impl AiRecommendation {
    pub fn new(tool: impl Into<String>, confidence: f64) -> Self {
        Self {
            tool: tool.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AiError {
    #[error("AI provider misconfigured: {0}")]
    Config(String),

    #[error("AI request failed: {0}")]
    Request(#[from] TransportError),

    #[error("AI provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI provider returned an unusable answer: {0}")]
    InvalidResponse(String),
}

/// Recommends one tool for a task
#[async_trait]
pub trait AiRecommender: Send + Sync {
    async fn recommend(
        &self,
        config: &AiProviderConfig,
        task: &str,
        context: &str,
        tools: &[ToolDescriptor],
    ) -> Result<AiRecommendation, AiError>;
}

// ============================================================================
// OpenAI-compatible implementation
// ============================================================================

const SYSTEM_PROMPT: &str = "You pick the single best tool for a task. \
Reply with only a JSON object: {\"tool\": \"<tool name>\", \"confidence\": <number between 0 and 1>}.";

/// Chat-completions based recommender
#[derive(Clone)]
pub struct HttpAiRecommender {
    transport: Arc<dyn HttpTransport>,
}

impl HttpAiRecommender {
    pub fn new() -> Result<Self, AiError> {
        Ok(Self::with_transport(Arc::new(ReqwestTransport::new()?)))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    fn build_body(config: &AiProviderConfig, task: &str, context: &str, tools: &[ToolDescriptor]) -> Value {
        let catalog = tools
            .iter()
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n");

        let mut user = format!("Task: {}\n", task);
        if !context.trim().is_empty() {
            user.push_str(&format!("Context: {}\n", context));
        }
        user.push_str(&format!("\nAvailable tools:\n{}", catalog));

        json!({
            "model": config.model(),
            "temperature": 0,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user},
            ],
        })
    }
}

#[async_trait]
impl AiRecommender for HttpAiRecommender {
    async fn recommend(
        &self,
        config: &AiProviderConfig,
        task: &str,
        context: &str,
        tools: &[ToolDescriptor],
    ) -> Result<AiRecommendation, AiError> {
        let url = Url::parse(config.endpoint())
            .map_err(|e| AiError::Config(format!("invalid endpoint '{}': {}", config.endpoint(), e)))?;

        debug!("Asking {} ({}) to pick among {} tool(s)", url, config.model(), tools.len());

        let response = self
            .transport
            .send(HttpRequest {
                method: HttpMethod::Post,
                url,
                bearer_token: config.api_key().map(str::to_string),
                body: Some(Self::build_body(config, task, context, tools)),
                timeout: config.timeout(),
                pinned_addrs: Vec::new(),
            })
            .await?;

        if !response.is_success() {
            return Err(AiError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let reply: ChatResponse = serde_json::from_str(&response.body)
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::InvalidResponse("No choices in response".to_string()))?;

        parse_recommendation(&content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Pull `{"tool", "confidence"}` out of a reply; surrounding prose is tolerated.
pub fn parse_recommendation(content: &str) -> Result<AiRecommendation, AiError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let object = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => {
            return Err(AiError::InvalidResponse(format!(
                "no JSON object in reply: {}",
                content
            )))
        }
    };

    let value: Value =
        serde_json::from_str(object).map_err(|e| AiError::InvalidResponse(e.to_string()))?;
    let tool = value
        .get("tool")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AiError::InvalidResponse("missing 'tool'".to_string()))?;
    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or_else(|| AiError::InvalidResponse("missing 'confidence'".to_string()))?;

    Ok(AiRecommendation::new(tool, confidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use toolgate_gateway::HttpResponse;

    struct OneShot {
        response: HttpResponse,
        seen: Mutex<Option<HttpRequest>>,
    }

    #[async_trait]
    impl HttpTransport for OneShot {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            *self.seen.lock() = Some(request);
            Ok(self.response.clone())
        }
    }

    fn config() -> AiProviderConfig {
        AiProviderConfig::new("http://localhost:11434/v1/chat/completions", "llama3")
            .with_api_key("sk-test")
    }

    #[test]
    fn test_with_model_leaves_original() {
        let base = config();
        let other = base.with_model("gpt-4o");
        assert_eq!(base.model(), "llama3");
        assert_eq!(other.model(), "gpt-4o");
        assert_eq!(other.endpoint(), base.endpoint());
    }

    #[test]
    fn test_from_settings() {
        assert!(AiProviderConfig::from_settings(&AiSettings::default()).is_none());

        let settings = AiSettings {
            endpoint: Some("https://ai.example.com/v1/chat/completions".into()),
            min_confidence: Some(0.8),
            ..Default::default()
        };
        let config = AiProviderConfig::from_settings(&settings).unwrap();
        assert_eq!(config.min_confidence(), 0.8);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_parse_recommendation_with_prose() {
        let rec = parse_recommendation(
            "Sure! Here you go:\n```json\n{\"tool\": \"web_search\", \"confidence\": 0.92}\n```",
        )
        .unwrap();
        assert_eq!(rec, AiRecommendation::new("web_search", 0.92));
    }

    #[test]
    fn test_parse_recommendation_clamps() {
        let rec = parse_recommendation(r#"{"tool":"x","confidence":7}"#).unwrap();
        assert_eq!(rec.confidence, 1.0);
    }

    #[test]
    fn test_parse_recommendation_rejects_garbage() {
        assert!(parse_recommendation("I think web_search").is_err());
        assert!(parse_recommendation(r#"{"confidence": 0.5}"#).is_err());
        assert!(parse_recommendation(r#"{"tool": "x"}"#).is_err());
    }

    #[tokio::test]
    async fn test_http_recommender_round() {
        let transport = Arc::new(OneShot {
            response: HttpResponse::new(
                200,
                r#"{"choices":[{"message":{"role":"assistant","content":"{\"tool\":\"weather\",\"confidence\":0.8}"}}]}"#,
            ),
            seen: Mutex::new(None),
        });
        let recommender = HttpAiRecommender::with_transport(transport.clone());
        let tools = vec![ToolDescriptor::new("weather", "Weather forecast")];

        let rec = recommender
            .recommend(&config(), "rain tomorrow?", "", &tools)
            .await
            .unwrap();
        assert_eq!(rec.tool, "weather");

        let seen = transport.seen.lock().clone().unwrap();
        assert_eq!(seen.bearer_token.as_deref(), Some("sk-test"));
        let body = seen.body.unwrap();
        assert_eq!(body["model"], "llama3");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("- weather: Weather forecast"));
    }

    #[tokio::test]
    async fn test_http_recommender_status_error() {
        let transport = Arc::new(OneShot {
            response: HttpResponse::new(500, "model overloaded"),
            seen: Mutex::new(None),
        });
        let recommender = HttpAiRecommender::with_transport(transport);
        let err = recommender
            .recommend(&config(), "task", "", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Status { status: 500, .. }));
    }
}
