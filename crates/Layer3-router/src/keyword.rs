//! Keyword scoring
//!
//! 토큰 겹침 기반 관련도:
//! ```text
//! score = |query ∩ tool| / |query|     (0.0 - 1.0)
//! ```
//! query = task + context, tool = name + description

use std::collections::BTreeSet;
use toolgate_gateway::ToolDescriptor;

/// 의미 없는 단어 (점수에서 제외)
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "for", "from", "how", "i",
    "in", "is", "it", "me", "my", "of", "on", "or", "please", "some", "that", "the", "this",
    "to", "use", "using", "what", "when", "where", "which", "with", "you", "your",
];

/// Normalized token set.
///
/// Lower-cased, split on anything that is not alphanumeric (`_` and `-`
/// included), stop words and 1-char tokens dropped, plurals folded.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .map(|t| fold_plural(&t))
        .collect()
}

/// 단순 복수형 정규화 (files → file, queries → query, boxes → box)
fn fold_plural(token: &str) -> String {
    if token.len() > 4 && token.ends_with("ies") {
        return format!("{}y", &token[..token.len() - 3]);
    }
    if token.len() > 3
        && ["ches", "shes", "xes", "zes", "sses"]
            .iter()
            .any(|suffix| token.ends_with(suffix))
    {
        return token[..token.len() - 2].to_string();
    }
    if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

/// Tokens of `task` followed by `context`
pub fn query_tokens(task: &str, context: &str) -> BTreeSet<String> {
    let mut tokens = tokenize(task);
    tokens.extend(tokenize(context));
    tokens
}

/// Tokens describing a tool
pub fn tool_tokens(tool: &ToolDescriptor) -> BTreeSet<String> {
    let mut tokens = tokenize(&tool.name);
    tokens.extend(tokenize(tool.description_text()));
    tokens
}

/// Relevance of `tool` to the query tokens, in `[0, 1]`.
pub fn keyword_score(query: &BTreeSet<String>, tool: &ToolDescriptor) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let tool = tool_tokens(tool);
    let hits = query.intersection(&tool).count();
    hits as f64 / query.len() as f64
}

/// Jaccard similarity between two token sets
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_tokenize_splits_identifiers() {
        assert_eq!(tokenize("web_search-v2"), set(&["web", "search", "v2"]));
        assert_eq!(tokenize("Get the WEATHER for me"), set(&["get", "weather"]));
    }

    #[test]
    fn test_plural_folding() {
        assert_eq!(tokenize("files queries boxes"), set(&["file", "query", "box"]));
        // not plurals
        assert_eq!(tokenize("status class"), set(&["status", "class"]));
    }

    #[test]
    fn test_keyword_score() {
        let tool = ToolDescriptor::new("weather_lookup", "Current weather for a city");
        let query = query_tokens("weather in Paris", "");
        // {weather, paris} ∩ tool = {weather}
        assert_eq!(keyword_score(&query, &tool), 0.5);

        let unrelated = query_tokens("translate text", "");
        assert_eq!(keyword_score(&unrelated, &tool), 0.0);
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let tool = ToolDescriptor::new("search", "Search the web");
        assert_eq!(keyword_score(&query_tokens("the a of", ""), &tool), 0.0);
    }

    #[test]
    fn test_context_contributes() {
        let tool = ToolDescriptor::new("stock_quote", "Stock price quotes");
        let without = keyword_score(&query_tokens("price", ""), &tool);
        let with = keyword_score(&query_tokens("price", "stock market"), &tool);
        assert_eq!(without, 1.0);
        // {price, stock, market}: 2 of 3
        assert!((with - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard(&set(&["a1", "b1"]), &set(&["a1", "b1"])), 1.0);
        assert_eq!(jaccard(&set(&["a1", "b1"]), &set(&["b1", "c1"])), 1.0 / 3.0);
        assert_eq!(jaccard(&set(&[]), &set(&[])), 0.0);
    }
}
