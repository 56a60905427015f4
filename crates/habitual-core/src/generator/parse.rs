//! Turning raw model text into a validated suggestion.
//!
//! Everything here is pure: no network, no clock. Parse and validation
//! failures never propagate; [`parse_suggestion_response`] swaps in
//! [`fallback_suggestion`] instead.

use serde_json::Value;

use super::GeneratedSuggestion;
use crate::error::ValidationError;
use crate::time_of_day::TimeOfDay;

pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 10;

pub const FALLBACK_TITLE: &str = "新しい習慣を始めよう";
pub const FALLBACK_DESCRIPTION: &str = "健康的な活動を提案します。今日から始めてみませんか？";
pub const FALLBACK_CATEGORY: &str = "健康";
pub const FALLBACK_PRIORITY: u8 = 5;
pub const FALLBACK_TAGS: [&str; 2] = ["習慣", "健康"];

/// Why a model response was replaced by the fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailure {
    /// The extracted payload is not JSON
    Json(String),
    /// The payload is JSON but violates the schema
    Invalid(Vec<ValidationError>),
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseFailure::Json(msg) => write!(f, "invalid JSON: {msg}"),
            ParseFailure::Invalid(errors) => {
                let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                write!(f, "validation failed: {}", joined.join(", "))
            }
        }
    }
}

/// The fixed suggestion used whenever model output is unusable.
pub fn fallback_suggestion(time_of_day: TimeOfDay) -> GeneratedSuggestion {
    GeneratedSuggestion {
        title: FALLBACK_TITLE.to_string(),
        description: FALLBACK_DESCRIPTION.to_string(),
        category: FALLBACK_CATEGORY.to_string(),
        time_of_day,
        priority: FALLBACK_PRIORITY,
        tags: FALLBACK_TAGS.iter().map(|t| t.to_string()).collect(),
    }
}

/// Locate the JSON payload inside free-form model text.
///
/// Preference order: a ```` ```json ```` fenced block, then the span from
/// the first `{` to the last `}`, then the whole text.
pub fn extract_json_payload(content: &str) -> &str {
    if let Some(fenced) = fenced_json_block(content) {
        return fenced;
    }
    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if start < end {
            return &content[start..=end];
        }
    }
    content
}

fn fenced_json_block(content: &str) -> Option<&str> {
    const OPEN: &str = "```json";
    const CLOSE: &str = "```";

    let start = content.find(OPEN)? + OPEN.len();
    let rest = &content[start..];
    let end = rest.find(CLOSE)?;
    Some(rest[..end].trim())
}

/// Check a parsed payload against the suggestion schema.
///
/// All violations are collected rather than stopping at the first.
pub fn validate_payload(
    value: &Value,
    time_of_day: TimeOfDay,
) -> Result<GeneratedSuggestion, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let title = required_text(value, "title", 1, &mut errors);
    let description = required_text(value, "description", MIN_DESCRIPTION_CHARS, &mut errors);
    let category = required_text(value, "category", 1, &mut errors);
    let priority = priority_field(value, &mut errors);
    let tags = tags_field(value, &mut errors);

    match (title, description, category, priority, tags) {
        (Some(title), Some(description), Some(category), Some(priority), Some(tags))
            if errors.is_empty() =>
        {
            Ok(GeneratedSuggestion {
                title,
                description,
                category,
                time_of_day,
                priority,
                tags,
            })
        }
        _ => Err(errors),
    }
}

fn required_text(
    value: &Value,
    field: &str,
    min_chars: usize,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    let Some(text) = value.get(field).and_then(Value::as_str) else {
        errors.push(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "must be a string".to_string(),
        });
        return None;
    };

    let len = text.chars().count();
    if len == 0 {
        errors.push(ValidationError::Empty(field.to_string()));
        return None;
    }
    if len < min_chars {
        errors.push(ValidationError::TooShort {
            field: field.to_string(),
            min: min_chars,
        });
        return None;
    }
    Some(text.to_string())
}

fn priority_field(value: &Value, errors: &mut Vec<ValidationError>) -> Option<u8> {
    let raw = value.get("priority");
    let whole = raw.and_then(|v| {
        v.as_i64().or_else(|| {
            v.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        })
    });

    match whole {
        Some(n) if (MIN_PRIORITY..=MAX_PRIORITY).contains(&n) => u8::try_from(n).ok(),
        Some(n) => {
            errors.push(ValidationError::OutOfRange {
                field: "priority".to_string(),
                min: MIN_PRIORITY,
                max: MAX_PRIORITY,
                actual: n.to_string(),
            });
            None
        }
        None => {
            errors.push(ValidationError::InvalidValue {
                field: "priority".to_string(),
                message: format!(
                    "must be an integer, got {}",
                    raw.map(Value::to_string).unwrap_or_else(|| "nothing".into())
                ),
            });
            None
        }
    }
}

fn tags_field(value: &Value, errors: &mut Vec<ValidationError>) -> Option<Vec<String>> {
    let Some(items) = value.get("tags").and_then(Value::as_array) else {
        errors.push(ValidationError::InvalidValue {
            field: "tags".to_string(),
            message: "must be a list of strings".to_string(),
        });
        return None;
    };

    let tags: Option<Vec<String>> = items
        .iter()
        .map(|t| t.as_str().map(str::to_string))
        .collect();

    match tags {
        Some(tags) if !tags.is_empty() => Some(tags),
        Some(_) => {
            errors.push(ValidationError::Empty("tags".to_string()));
            None
        }
        None => {
            errors.push(ValidationError::InvalidValue {
                field: "tags".to_string(),
                message: "every tag must be a string".to_string(),
            });
            None
        }
    }
}

/// Extract, parse and validate without substituting the fallback.
pub fn try_parse_suggestion(
    content: &str,
    time_of_day: TimeOfDay,
) -> Result<GeneratedSuggestion, ParseFailure> {
    let payload = extract_json_payload(content);
    let value: Value =
        serde_json::from_str(payload).map_err(|e| ParseFailure::Json(e.to_string()))?;
    validate_payload(&value, time_of_day).map_err(ParseFailure::Invalid)
}

/// Raw model text to a usable suggestion, falling back on any failure.
pub fn parse_suggestion_response(content: &str, time_of_day: TimeOfDay) -> GeneratedSuggestion {
    match try_parse_suggestion(content, time_of_day) {
        Ok(suggestion) => suggestion,
        Err(failure) => {
            tracing::warn!(%failure, "unusable model response, using fallback suggestion");
            fallback_suggestion(time_of_day)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"title":"朝の散歩","description":"近所を15分ほど歩いて体を目覚めさせましょう","category":"健康","priority":7,"tags":["運動","朝"]}"#;

    #[test]
    fn bare_json_is_accepted() {
        let s = parse_suggestion_response(VALID, TimeOfDay::Morning);
        assert_eq!(s.title, "朝の散歩");
        assert_eq!(s.priority, 7);
        assert_eq!(s.tags, vec!["運動".to_string(), "朝".to_string()]);
        assert_eq!(s.time_of_day, TimeOfDay::Morning);
    }

    #[test]
    fn fenced_block_is_preferred() {
        let content = format!(
            "Here you go:\n```json\n{VALID}\n```\nIgnore this {{\"title\":\"other\"}}"
        );
        assert_eq!(extract_json_payload(&content), VALID);
        let s = parse_suggestion_response(&content, TimeOfDay::Evening);
        assert_eq!(s.title, "朝の散歩");
        assert_eq!(s.time_of_day, TimeOfDay::Evening);
    }

    #[test]
    fn embedded_object_is_extracted_from_prose() {
        let content = format!("Sure! {VALID} Hope that helps.");
        assert_eq!(extract_json_payload(&content), VALID);
    }

    #[test]
    fn text_without_braces_is_used_whole() {
        assert_eq!(extract_json_payload("no json here"), "no json here");
    }

    #[test]
    fn malformed_json_falls_back() {
        let s = parse_suggestion_response("{\"title\": \"oops\",", TimeOfDay::Morning);
        assert_eq!(s, fallback_suggestion(TimeOfDay::Morning));
        assert_eq!(s.priority, 5);
        assert_eq!(s.tags.len(), 2);
    }

    #[test]
    fn short_description_falls_back_instead_of_partial_object() {
        let content =
            r#"{"title":"T","description":"short","category":"health","priority":5,"tags":["a"]}"#;
        match try_parse_suggestion(content, TimeOfDay::Morning) {
            Err(ParseFailure::Invalid(errors)) => {
                assert_eq!(
                    errors,
                    vec![ValidationError::TooShort {
                        field: "description".into(),
                        min: MIN_DESCRIPTION_CHARS
                    }]
                );
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(
            parse_suggestion_response(content, TimeOfDay::Morning),
            fallback_suggestion(TimeOfDay::Morning)
        );
    }

    #[test]
    fn priority_must_be_whole_and_in_range() {
        for bad in ["0", "11", "5.5", "\"7\""] {
            let content = format!(
                r#"{{"title":"T","description":"long enough text","category":"c","priority":{bad},"tags":["a"]}}"#
            );
            assert!(
                try_parse_suggestion(&content, TimeOfDay::Morning).is_err(),
                "priority {bad} should be rejected"
            );
        }
        let content =
            r#"{"title":"T","description":"long enough text","category":"c","priority":10.0,"tags":["a"]}"#;
        assert_eq!(
            try_parse_suggestion(content, TimeOfDay::Morning).unwrap().priority,
            10
        );
    }

    #[test]
    fn tags_must_be_non_empty_strings() {
        for bad in ["[]", "[1]", "\"a\""] {
            let content = format!(
                r#"{{"title":"T","description":"long enough text","category":"c","priority":3,"tags":{bad}}}"#
            );
            assert!(try_parse_suggestion(&content, TimeOfDay::Morning).is_err());
        }
    }

    #[test]
    fn every_violation_is_reported() {
        let content = r#"{"title":"","description":"x","priority":42,"tags":[]}"#;
        match try_parse_suggestion(content, TimeOfDay::Morning) {
            Err(ParseFailure::Invalid(errors)) => assert_eq!(errors.len(), 5),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn description_length_counts_characters() {
        // 10 multi-byte characters
        let content = r#"{"title":"T","description":"あいうえおかきくけこ","category":"c","priority":3,"tags":["a"]}"#;
        assert!(try_parse_suggestion(content, TimeOfDay::Morning).is_ok());
    }
}
