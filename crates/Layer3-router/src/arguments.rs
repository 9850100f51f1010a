//! Argument Builder - 작업 문장을 도구 입력으로 매핑
//!
//! 작업 문장 전체를 파라미터 하나에만 넣는다 (분할하지 않음).
//!
//! ```text
//! 1. 우선순위 이름이 properties/required 에 있으면 → 그 이름
//! 2. required 를 순서대로 보고 첫 문자열 타입 항목 → 그 이름
//! 3. 그 외 → {"task": task}
//! ```

use serde_json::{Map, Value};
use toolgate_gateway::ToolDescriptor;

/// Parameter names that conventionally carry free text, in priority order
pub const PREFERRED_PARAMS: &[&str] = &[
    "query", "q", "search", "task", "prompt", "question", "input", "text", "message", "command",
];

const FALLBACK_PARAM: &str = "task";

/// Map `task` onto `tool`'s input schema.
pub fn build_arguments(tool: &ToolDescriptor, task: &str) -> Map<String, Value> {
    let key = target_param(tool).unwrap_or_else(|| FALLBACK_PARAM.to_string());

    let mut args = Map::new();
    args.insert(key, Value::String(task.to_string()));
    args
}

fn target_param(tool: &ToolDescriptor) -> Option<String> {
    let properties = tool.schema_properties();
    let required = tool.required_params();

    let declared = |name: &str| {
        properties.is_some_and(|p| p.contains_key(name)) || required.contains(&name)
    };
    if let Some(name) = PREFERRED_PARAMS.iter().find(|&&name| declared(name)) {
        return Some(name.to_string());
    }

    required
        .iter()
        .find(|&&name| is_string_like(properties.and_then(|p| p.get(name))))
        .map(|name| name.to_string())
}

/// `"string"`, no declared type, or a type list that includes `"string"`
fn is_string_like(schema: Option<&Value>) -> bool {
    match schema.and_then(|s| s.get("type")) {
        None | Some(Value::Null) => true,
        Some(Value::String(ty)) => ty == "string",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("string")),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(schema: Value) -> ToolDescriptor {
        ToolDescriptor::new("t", "test tool").with_schema(schema)
    }

    #[test]
    fn test_preferred_param_in_properties() {
        let t = tool(json!({
            "properties": {"limit": {"type": "integer"}, "query": {"type": "string"}},
        }));
        let args = build_arguments(&t, "rust tokio");
        assert_eq!(args.len(), 1);
        assert_eq!(args["query"], "rust tokio");
    }

    #[test]
    fn test_priority_order() {
        let t = tool(json!({
            "properties": {"text": {}, "q": {}, "prompt": {}},
        }));
        assert!(build_arguments(&t, "x").contains_key("q"));
    }

    #[test]
    fn test_preferred_param_only_in_required() {
        let t = tool(json!({"required": ["question"]}));
        assert_eq!(build_arguments(&t, "why?")["question"], "why?");
    }

    #[test]
    fn test_first_required_string() {
        let t = tool(json!({
            "properties": {"city": {"type": "string"}, "days": {"type": "integer"}},
            "required": ["city", "days"]
        }));
        let args = build_arguments(&t, "Seoul");
        assert_eq!(args.len(), 1);
        assert_eq!(args["city"], "Seoul");
    }

    #[test]
    fn test_first_required_untyped_or_union() {
        let untyped = tool(json!({"required": ["location"]}));
        assert!(build_arguments(&untyped, "x").contains_key("location"));

        let union = tool(json!({
            "properties": {"location": {"type": ["string", "null"]}},
            "required": ["location"]
        }));
        assert!(build_arguments(&union, "x").contains_key("location"));
    }

    #[test]
    fn test_skips_non_string_required() {
        let t = tool(json!({
            "properties": {"count": {"type": "integer"}, "description": {"type": "string"}},
            "required": ["count", "description"]
        }));
        let args = build_arguments(&t, "do it");
        assert_eq!(Value::Object(args), json!({"description": "do it"}));
    }

    #[test]
    fn test_first_required_not_string_falls_back() {
        let t = tool(json!({
            "properties": {"count": {"type": "integer"}},
            "required": ["count"]
        }));
        let args = build_arguments(&t, "five");
        assert_eq!(args["task"], "five");
        assert!(!args.contains_key("count"));
    }

    #[test]
    fn test_input_schema_snake_case_key() {
        let t = ToolDescriptor::from_value(&json!({
            "name": "lookup",
            "input_schema": {"properties": {"search": {"type": "string"}}}
        }))
        .unwrap();
        assert_eq!(build_arguments(&t, "crabs")["search"], "crabs");
    }

    #[test]
    fn test_no_schema() {
        let t = ToolDescriptor::new("ping", "Ping");
        let args = build_arguments(&t, "hello");
        assert_eq!(Value::Object(args), json!({"task": "hello"}));
    }
}
