//! JSON-RPC 2.0 프로토콜 + 카탈로그 정규화

use crate::error::GatewayError;
use crate::types::{InvocationResult, ToolDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Discovery path, relative to the base URL
pub const TOOLS_PATH: &str = "tools?limit=0&include_pagination=false";

/// Invocation path, relative to the base URL
pub const RPC_PATH: &str = "rpc";

pub const TOOLS_CALL_METHOD: &str = "tools/call";

/// JSON-RPC 2.0 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    /// `tools/call` with id 1
    pub fn tools_call(name: &str, arguments: Map<String, Value>) -> Self {
        Self::new(
            1,
            TOOLS_CALL_METHOD,
            Some(json!({ "name": name, "arguments": arguments })),
        )
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Normalize a discovery body into descriptors.
///
/// bare array, `{ "tools": [...] }`, anything else is empty.
/// Entries that do not decode are skipped.
pub fn normalize_catalog(body: &str) -> Vec<ToolDescriptor> {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Tool catalog is not valid JSON, treating as empty: {}", e);
            return Vec::new();
        }
    };

    let entries = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("tools") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => {
                warn!("Tool catalog object has no 'tools' array, treating as empty");
                return Vec::new();
            }
        },
        _ => {
            warn!("Unexpected tool catalog shape, treating as empty");
            return Vec::new();
        }
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let tool = ToolDescriptor::from_value(entry);
            if tool.is_none() {
                warn!("Skipping catalog entry {}: not a tool object", idx);
            }
            tool
        })
        .collect()
}

// ============================================================================
// Invocation
// ============================================================================

/// Interpret a `tools/call` response body.
pub fn parse_invocation(body: &str) -> Result<InvocationResult, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("response is not JSON: {}", e)))?;

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        return Ok(InvocationResult::RemoteError(error_message(error)));
    }

    Ok(InvocationResult::Success(extract_result(value.get("result"))))
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(msg) => msg.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

/// text content joined by newline, otherwise the raw result as JSON
pub fn extract_result(result: Option<&Value>) -> String {
    let Some(result) = result else {
        return "null".to_string();
    };

    if let Some(content) = result.get("content").and_then(Value::as_array) {
        let texts: Vec<&str> = content
            .iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .collect();
        if !texts.is_empty() {
            return texts.join("\n");
        }
    }

    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let mut args = Map::new();
        args.insert("query".into(), json!("rust async"));
        let req = JsonRpcRequest::tools_call("web_search", args);

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "web_search", "arguments": {"query": "rust async"}}
            })
        );
    }

    #[test]
    fn test_catalog_shapes() {
        let bare = normalize_catalog(r#"[{"name": "a"}, {"name": "b"}]"#);
        assert_eq!(bare.len(), 2);

        let wrapped = normalize_catalog(r#"{"tools": [{"name": "a", "description": "first"}]}"#);
        assert_eq!(wrapped.len(), 1);
        assert_eq!(wrapped[0].description_text(), "first");

        assert!(normalize_catalog(r#"{"items": []}"#).is_empty());
        assert!(normalize_catalog(r#"{"tools": "nope"}"#).is_empty());
        assert!(normalize_catalog("42").is_empty());
        assert!(normalize_catalog("<html>oops</html>").is_empty());
    }

    #[test]
    fn test_catalog_skips_bad_entries() {
        let tools = normalize_catalog(r#"[{"name": "ok"}, {"description": "no name"}, 7]"#);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "ok");
    }

    #[test]
    fn test_text_content_joined() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"content":[
            {"type":"text","text":"line one"},
            {"type":"image","data":"..."},
            {"type":"text","text":"line two"}
        ]}}"#;
        assert_eq!(
            parse_invocation(body).unwrap(),
            InvocationResult::Success("line one\nline two".into())
        );
    }

    #[test]
    fn test_raw_result_fallback() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"answer":42}}"#;
        assert_eq!(
            parse_invocation(body).unwrap(),
            InvocationResult::Success(r#"{"answer":42}"#.into())
        );

        let empty = r#"{"jsonrpc":"2.0","id":1}"#;
        assert_eq!(
            parse_invocation(empty).unwrap(),
            InvocationResult::Success("null".into())
        );
    }

    #[test]
    fn test_remote_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"quota exceeded"}}"#;
        assert_eq!(
            parse_invocation(body).unwrap(),
            InvocationResult::RemoteError("quota exceeded".into())
        );
    }

    #[test]
    fn test_invalid_json_is_protocol_error() {
        assert!(matches!(
            parse_invocation("not json"),
            Err(GatewayError::InvalidResponse(_))
        ));
    }
}
