//! Turns batch judgment responses into a typed verdict.
//!
//! The expected shape is
//! `{"features": [{..., "action": "keep"}], "removed": [{..., "reason": "..."}]}`.
//! `kept` is accepted in place of `features`, and a `features` entry whose
//! `action` is `remove` counts as removed. Anything else is a format error.

use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ScenarioRecord;
use crate::domain::ports::JudgmentResponse;

/// One scenario as echoed back by the judge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictEntry {
    pub id: Option<usize>,
    pub record: ScenarioRecord,
    pub reason: Option<String>,
    pub duplicate_of: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchVerdict {
    pub kept: Vec<VerdictEntry>,
    pub removed: Vec<VerdictEntry>,
}

/// Interpret a response. Failures become [`DomainError::JudgmentTransport`],
/// unusable content becomes [`DomainError::JudgmentFormat`].
pub fn interpret(response: JudgmentResponse) -> DomainResult<BatchVerdict> {
    match response {
        JudgmentResponse::Parsed(value) => parse_value(&value),
        JudgmentResponse::RawText(text) => parse_text(&text),
        JudgmentResponse::Failure { kind, message } => {
            Err(DomainError::JudgmentTransport(format!("{kind}: {message}")))
        }
    }
}

/// Parse free text that should contain the verdict JSON.
pub fn parse_text(text: &str) -> DomainResult<BatchVerdict> {
    if text.trim().is_empty() {
        return Err(DomainError::JudgmentFormat("empty response".to_string()));
    }
    let json = extract_json_from_response(text);
    let value: Value = serde_json::from_str(json).map_err(|e| {
        DomainError::JudgmentFormat(format!("response is not valid JSON: {e}"))
    })?;
    parse_value(&value)
}

pub fn parse_value(value: &Value) -> DomainResult<BatchVerdict> {
    let object = value.as_object().ok_or_else(|| {
        DomainError::JudgmentFormat("verdict must be a JSON object".to_string())
    })?;

    let features = entry_array(object, &["features", "kept"])?;
    let removed = entry_array(object, &["removed"])?;
    if features.is_none() && removed.is_none() {
        return Err(DomainError::JudgmentFormat(
            "verdict has neither `features` nor `removed`".to_string(),
        ));
    }

    let mut verdict = BatchVerdict::default();
    for item in features.unwrap_or_default() {
        let entry = parse_entry(item)?;
        if is_remove_action(item) {
            verdict.removed.push(entry);
        } else {
            verdict.kept.push(entry);
        }
    }
    for item in removed.unwrap_or_default() {
        verdict.removed.push(parse_entry(item)?);
    }
    Ok(verdict)
}

/// Extract JSON from the response (handles markdown code blocks and
/// surrounding prose).
pub fn extract_json_from_response(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let body_start = after_fence.find('\n').map_or(0, |n| n + 1);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

fn entry_array<'v>(
    object: &'v Map<String, Value>,
    keys: &[&str],
) -> DomainResult<Option<&'v [Value]>> {
    for key in keys {
        match object.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(items)) => return Ok(Some(items.as_slice())),
            Some(_) => {
                return Err(DomainError::JudgmentFormat(format!(
                    "`{key}` must be an array"
                )))
            }
        }
    }
    Ok(None)
}

fn parse_entry(item: &Value) -> DomainResult<VerdictEntry> {
    let object = item.as_object().ok_or_else(|| {
        DomainError::JudgmentFormat(format!("verdict entry is not an object: {item}"))
    })?;
    Ok(VerdictEntry {
        id: object.get("id").and_then(as_index),
        record: ScenarioRecord::from_value(item),
        reason: object
            .get("reason")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
        duplicate_of: object
            .get("duplicate_of")
            .or_else(|| object.get("duplicateOf"))
            .and_then(as_index),
    })
}

fn is_remove_action(item: &Value) -> bool {
    item.get("action")
        .and_then(Value::as_str)
        .is_some_and(|action| action.trim().eq_ignore_ascii_case("remove"))
}

fn as_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::FailureKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_extract_json_plain() {
        let input = r#"{"features": []}"#;
        assert_eq!(extract_json_from_response(input), r#"{"features": []}"#);
    }

    #[test]
    fn test_extract_json_code_block() {
        let input = "Here you go:\n```json\n{\"features\": []}\n```\nDone.";
        assert_eq!(extract_json_from_response(input), r#"{"features": []}"#);
    }

    #[test]
    fn test_extract_json_with_prose() {
        let input = "Result: {\"removed\": []} hope that helps";
        assert_eq!(extract_json_from_response(input), r#"{"removed": []}"#);
    }

    #[test]
    fn test_parse_full_verdict() {
        let verdict = parse_value(&json!({
            "features": [
                {"id": 0, "given": "g", "when": "w", "then": "t", "action": "keep"},
                {"id": "2", "given": "g", "when": "w", "then": "t3", "action": "REMOVE"}
            ],
            "removed": [
                {"id": 1, "given": "g", "when": "w", "then": "t2",
                 "reason": "Duplicate of scenario 0", "duplicate_of": 0}
            ]
        }))
        .unwrap();

        assert_eq!(verdict.kept.len(), 1);
        assert_eq!(verdict.removed.len(), 2);
        assert_eq!(verdict.removed[0].id, Some(2));
        assert_eq!(verdict.removed[1].id, Some(1));
        assert_eq!(verdict.removed[1].duplicate_of, Some(0));
        assert_eq!(
            verdict.removed[1].reason.as_deref(),
            Some("Duplicate of scenario 0")
        );
        assert_eq!(verdict.removed[1].record.then.as_deref(), Some("t2"));
    }

    #[test]
    fn test_missing_arrays_is_format_error() {
        let err = parse_value(&json!({"result": "ok"})).unwrap_err();
        assert!(matches!(err, DomainError::JudgmentFormat(_)));

        let err = parse_value(&json!({"features": "all of them"})).unwrap_err();
        assert!(matches!(err, DomainError::JudgmentFormat(_)));

        let err = parse_value(&json!({"features": [1, 2]})).unwrap_err();
        assert!(matches!(err, DomainError::JudgmentFormat(_)));
    }

    #[test]
    fn test_raw_text_paths() {
        let ok = interpret(JudgmentResponse::RawText(
            "```json\n{\"features\": [], \"removed\": []}\n```".into(),
        ))
        .unwrap();
        assert_eq!(ok, BatchVerdict::default());

        let err = interpret(JudgmentResponse::RawText("I cannot help with that".into())).unwrap_err();
        assert!(matches!(err, DomainError::JudgmentFormat(_)));

        let err = interpret(JudgmentResponse::RawText("   ".into())).unwrap_err();
        assert!(matches!(err, DomainError::JudgmentFormat(_)));
    }

    #[test]
    fn test_failure_is_transport_error() {
        let err = interpret(JudgmentResponse::failure(FailureKind::Timeout, "120s")).unwrap_err();
        assert!(matches!(err, DomainError::JudgmentTransport(_)));
        assert!(err.to_string().contains("timeout"));
    }
}
