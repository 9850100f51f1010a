//! Gateway types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 게이트웨이 카탈로그의 도구 정의
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// 도구 이름 (카탈로그 내 유일)
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 입력 스키마 (JSON Schema)
    #[serde(rename = "inputSchema", alias = "input_schema", default)]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: Value::Null,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Decode one catalog entry.
    ///
    /// Returns `None` for non-objects and entries without a non-empty name.
    /// `inputSchema` wins over `input_schema` when both are present.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let name = obj.get("name")?.as_str()?.trim();
        if name.is_empty() {
            return None;
        }

        let description = obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        let input_schema = obj
            .get("inputSchema")
            .or_else(|| obj.get("input_schema"))
            .cloned()
            .unwrap_or(Value::Null);

        Some(Self {
            name: name.to_string(),
            description,
            input_schema,
        })
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// `properties` of the input schema
    pub fn schema_properties(&self) -> Option<&Map<String, Value>> {
        self.input_schema.get("properties")?.as_object()
    }

    /// `required` of the input schema, in declaration order
    pub fn required_params(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description.as_deref() {
            Some(desc) if !desc.is_empty() => write!(f, "{}: {}", self.name, desc),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// 도구 호출 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    /// 결과 텍스트
    Success(String),

    /// JSON-RPC error 메시지 (원격 도구 실패)
    RemoteError(String),
}

/// Prefix for remote tool errors in their text form
pub const REMOTE_TOOL_ERROR_PREFIX: &str = "Tool error: ";

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success(_))
    }

    /// Human-readable text; remote errors carry [`REMOTE_TOOL_ERROR_PREFIX`].
    pub fn into_text(self) -> String {
        match self {
            InvocationResult::Success(text) => text,
            InvocationResult::RemoteError(msg) => format!("{}{}", REMOTE_TOOL_ERROR_PREFIX, msg),
        }
    }
}
