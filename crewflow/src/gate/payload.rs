//! Locating and parsing the gate's structured answer.

use crate::core::StageStatus;
use crate::errors::GateParseError;
use crate::utils::parse_timestamp;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Accepted names for the check timestamp, canonical name last.
pub const CHECKED_AT_FIELDS: [&str; 4] = ["last_sync", "last_update", "last_checked", "checked_at"];

/// Accepted names for the unavailable-resource list, canonical name last.
pub const UNAVAILABLE_FIELDS: [&str; 4] = [
    "missing_registries",
    "failed_sources",
    "failed_endpoints",
    "unavailable_resources",
];

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fenced block pattern is valid")
});

/// The gate payload in canonical form, before policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePayload {
    /// Reported status.
    pub status: StageStatus,
    /// When the agent last checked its sources.
    pub checked_at: DateTime<Utc>,
    /// Sources that could not be reached.
    pub unavailable_resources: BTreeSet<String>,
}

/// Parses a gate response into canonical form.
///
/// The response may be a JSON object, or text containing one either as the
/// whole body, inside a fenced code block, or as the outermost `{...}` span.
///
/// # Errors
///
/// Returns `GateParseError` when no object can be found or a field is
/// missing, duplicated through aliases, or has the wrong type.
pub fn parse_gate_payload(raw: &Value) -> Result<GatePayload, GateParseError> {
    let object = locate_object(raw)?;

    let status = match single_field(&object, "status", &["status"])? {
        Value::String(s) if s.eq_ignore_ascii_case("ok") => StageStatus::Ok,
        Value::String(s) if s.eq_ignore_ascii_case("error") => StageStatus::Error,
        other => {
            return Err(GateParseError::InvalidField {
                field: "status",
                reason: format!("expected \"ok\" or \"error\", got {other}"),
            })
        }
    };

    let checked_at = match single_field(&object, "checked_at", &CHECKED_AT_FIELDS)? {
        Value::String(s) => parse_timestamp(s).map_err(|e| GateParseError::InvalidField {
            field: "checked_at",
            reason: e.to_string(),
        })?,
        other => {
            return Err(GateParseError::InvalidField {
                field: "checked_at",
                reason: format!("expected an ISO-8601 string, got {other}"),
            })
        }
    };

    let unavailable_resources = match single_field(&object, "unavailable_resources", &UNAVAILABLE_FIELDS)? {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(GateParseError::InvalidField {
                    field: "unavailable_resources",
                    reason: format!("expected strings, got {other}"),
                }),
            })
            .collect::<Result<BTreeSet<_>, _>>()?,
        other => {
            return Err(GateParseError::InvalidField {
                field: "unavailable_resources",
                reason: format!("expected a list of strings, got {other}"),
            })
        }
    };

    Ok(GatePayload {
        status,
        checked_at,
        unavailable_resources,
    })
}

fn single_field<'a>(
    object: &'a Map<String, Value>,
    canonical: &'static str,
    aliases: &[&str],
) -> Result<&'a Value, GateParseError> {
    let present: Vec<&str> = aliases
        .iter()
        .copied()
        .filter(|name| object.contains_key(*name))
        .collect();

    match present.as_slice() {
        [] => Err(GateParseError::MissingField(canonical)),
        [name] => object.get(*name).ok_or(GateParseError::MissingField(canonical)),
        _ => Err(GateParseError::AmbiguousField {
            field: canonical,
            found: present.iter().map(ToString::to_string).collect(),
        }),
    }
}

fn locate_object(raw: &Value) -> Result<Map<String, Value>, GateParseError> {
    match raw {
        Value::Object(map) => Ok(map.clone()),
        Value::String(text) => object_from_text(text),
        _ => Err(GateParseError::NoObject),
    }
}

fn object_from_text(text: &str) -> Result<Map<String, Value>, GateParseError> {
    let trimmed = text.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(map);
    }

    if let Some(block) = FENCED_BLOCK.captures(trimmed).and_then(|c| c.get(1)) {
        return parse_object(block.as_str().trim());
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => parse_object(&trimmed[start..=end]),
        _ => Err(GateParseError::NoObject),
    }
}

fn parse_object(candidate: &str) -> Result<Map<String, Value>, GateParseError> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(GateParseError::NoObject),
        Err(e) => Err(GateParseError::Malformed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_each_domain_variant() {
        let variants = [
            json!({"status": "ok", "last_sync": "2025-11-20T05:15:00Z", "missing_registries": []}),
            json!({"status": "ok", "last_update": "2025-11-20T05:15:00Z", "failed_sources": []}),
            json!({"status": "ok", "last_checked": "2025-11-20T05:15:00Z", "failed_endpoints": []}),
            json!({"status": "ok", "checked_at": "2025-11-20T05:15:00Z", "unavailable_resources": []}),
        ];
        for variant in variants {
            let payload = parse_gate_payload(&variant).unwrap();
            assert_eq!(payload.status, StageStatus::Ok);
            assert!(payload.unavailable_resources.is_empty());
        }
    }

    #[test]
    fn test_parses_error_with_resources() {
        let payload = parse_gate_payload(&json!({
            "status": "ERROR",
            "last_checked": "2025-11-20T05:15:00Z",
            "failed_endpoints": ["pagerduty_webhook", "slack_webhook"]
        }))
        .unwrap();
        assert_eq!(payload.status, StageStatus::Error);
        assert_eq!(payload.unavailable_resources.len(), 2);
        assert!(payload.unavailable_resources.contains("pagerduty_webhook"));
    }

    #[test]
    fn test_parses_json_text() {
        let text = json!(r#"{"status": "ok", "last_sync": "2025-11-20T05:15:00Z", "missing_registries": ["euctr"]}"#);
        let payload = parse_gate_payload(&text).unwrap();
        assert!(payload.unavailable_resources.contains("euctr"));
    }

    #[test]
    fn test_parses_fenced_block() {
        let text = json!("Here is the check:\n```json\n{\n  \"status\": \"ok\",\n  \"last_update\": \"2025-11-20T05:15:00Z\",\n  \"failed_sources\": []\n}\n```\nAll good.");
        assert_eq!(parse_gate_payload(&text).unwrap().status, StageStatus::Ok);
    }

    #[test]
    fn test_parses_bare_span_in_prose() {
        let text = json!("Result: {\"status\": \"error\", \"last_sync\": \"2025-11-20\", \"missing_registries\": [\"ctgov\"]} end");
        let payload = parse_gate_payload(&text).unwrap();
        assert_eq!(payload.status, StageStatus::Error);
    }

    #[test]
    fn test_rejects_missing_fields() {
        let err = parse_gate_payload(&json!({"status": "ok", "missing_registries": []})).unwrap_err();
        assert_eq!(err, GateParseError::MissingField("checked_at"));

        let err = parse_gate_payload(&json!({"status": "ok", "last_sync": "2025-11-20"})).unwrap_err();
        assert_eq!(err, GateParseError::MissingField("unavailable_resources"));
    }

    #[test]
    fn test_rejects_ambiguous_aliases() {
        let err = parse_gate_payload(&json!({
            "status": "ok",
            "last_sync": "2025-11-20",
            "last_update": "2025-11-21",
            "failed_sources": []
        }))
        .unwrap_err();
        assert!(matches!(err, GateParseError::AmbiguousField { field: "checked_at", .. }));
    }

    #[test]
    fn test_rejects_template_status() {
        let err = parse_gate_payload(&json!({
            "status": "ok|error",
            "last_sync": "2025-11-20T05:15:00Z",
            "missing_registries": []
        }))
        .unwrap_err();
        assert!(matches!(err, GateParseError::InvalidField { field: "status", .. }));
    }

    #[test]
    fn test_rejects_bad_types() {
        let err = parse_gate_payload(&json!({
            "status": "ok",
            "last_sync": 1_700_000_000,
            "missing_registries": []
        }))
        .unwrap_err();
        assert!(matches!(err, GateParseError::InvalidField { field: "checked_at", .. }));

        let err = parse_gate_payload(&json!({
            "status": "ok",
            "last_sync": "2025-11-20",
            "missing_registries": [1, 2]
        }))
        .unwrap_err();
        assert!(matches!(err, GateParseError::InvalidField { field: "unavailable_resources", .. }));
    }

    #[test]
    fn test_rejects_non_objects() {
        assert_eq!(parse_gate_payload(&json!(42)), Err(GateParseError::NoObject));
        assert_eq!(parse_gate_payload(&json!("all systems nominal")), Err(GateParseError::NoObject));
        assert!(matches!(
            parse_gate_payload(&json!("{status: ok}")),
            Err(GateParseError::Malformed(_))
        ));
    }
}
