//! Model reply parsing.
//!
//! Replies are free-form text that should contain one JSON object. The object
//! is cut out of the surrounding prose (first `{` to last `}`), decoded, and
//! mapped onto an [`Explanation`] with defaults for missing fields. Anything
//! that cannot be mapped ends in [`fallback_explanation`], a fixed-shape,
//! low-confidence result.

use serde_json::{Map, Value};

use crate::explanation::{clamp_confidence, Explanation, FixSuggestion};

pub const DEFAULT_SUMMARY: &str = "Error analysis";
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

pub const FALLBACK_SUMMARY: &str = "Unable to generate detailed analysis";
pub const FALLBACK_DETAIL_PREFIX: &str = "Raw AI response: ";
pub const FALLBACK_ROOT_CAUSE: &str = "Analysis failed due to response parsing error";
pub const FALLBACK_FIX_DESCRIPTION: &str = "Check the command syntax and try again";
pub const FALLBACK_FIX_EXPLANATION: &str =
    "The command may have syntax errors or missing dependencies";
pub const FALLBACK_FIX_CONFIDENCE: f64 = 0.3;
pub const FALLBACK_CONFIDENCE: f64 = 0.2;
pub const FALLBACK_RELATED_ERRORS: [&str; 2] = ["Command parsing error", "AI service unavailable"];
pub const FALLBACK_PREVENTION_TIPS: [&str; 3] = [
    "Verify command syntax",
    "Check dependencies",
    "Try running with verbose flags",
];

/// Why a reply could not be mapped to an explanation
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON object found in response")]
    NoJsonObject,

    #[error("malformed JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ParseError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ParseError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Slice from the first `{` to the last `}`, if they are in that order
pub fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end > start {
        Some(&content[start..=end])
    } else {
        None
    }
}

/// Parse a model reply into an explanation
pub fn parse_response(content: &str) -> Result<Explanation, ParseError> {
    let json = extract_json_object(content).ok_or(ParseError::NoJsonObject)?;
    let value: Value = serde_json::from_str(json)?;
    let data = value
        .as_object()
        .ok_or_else(|| ParseError::invalid("<root>", "expected a JSON object"))?;

    let fix_suggestions = match data.get("fix_suggestions") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(parse_fix_suggestion)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(ParseError::invalid("fix_suggestions", "expected an array")),
    };

    Ok(Explanation {
        summary: string_field(data, "summary", DEFAULT_SUMMARY)?,
        detailed_explanation: string_field(data, "detailed_explanation", "")?,
        root_cause: string_field(data, "root_cause", "")?,
        fix_suggestions,
        confidence: confidence_field(data, "confidence")?,
        related_errors: string_list_field(data, "related_errors")?,
        prevention_tips: string_list_field(data, "prevention_tips")?,
    })
}

/// Parse a reply, substituting the fallback explanation on any failure
pub fn parse_or_fallback(content: &str) -> Explanation {
    match parse_response(content) {
        Ok(explanation) => explanation,
        Err(e) => {
            tracing::warn!(error = %e, "could not parse model response");
            fallback_explanation(content)
        }
    }
}

/// The fixed low-confidence explanation. `detail` is the raw reply or the
/// error message that prevented getting one.
pub fn fallback_explanation(detail: &str) -> Explanation {
    Explanation::new(
        FALLBACK_SUMMARY,
        format!("{FALLBACK_DETAIL_PREFIX}{detail}"),
        FALLBACK_ROOT_CAUSE,
        FALLBACK_CONFIDENCE,
    )
    .with_fix(FixSuggestion::new(
        FALLBACK_FIX_DESCRIPTION,
        None,
        FALLBACK_FIX_EXPLANATION,
        FALLBACK_FIX_CONFIDENCE,
    ))
    .with_related_errors(FALLBACK_RELATED_ERRORS.iter().map(|s| s.to_string()).collect())
    .with_prevention_tips(FALLBACK_PREVENTION_TIPS.iter().map(|s| s.to_string()).collect())
}

/// Whether an explanation has the exact fallback shape
pub fn is_fallback(explanation: &Explanation) -> bool {
    explanation.summary == FALLBACK_SUMMARY
        && explanation.root_cause == FALLBACK_ROOT_CAUSE
        && explanation.confidence == FALLBACK_CONFIDENCE
        && explanation.fix_suggestions.len() == 1
        && explanation.fix_suggestions[0].description == FALLBACK_FIX_DESCRIPTION
}

fn parse_fix_suggestion(value: &Value) -> Result<FixSuggestion, ParseError> {
    let data = value
        .as_object()
        .ok_or_else(|| ParseError::invalid("fix_suggestions", "expected objects"))?;

    let command = match data.get("command") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ParseError::invalid("command", "expected a string")),
    };

    Ok(FixSuggestion {
        description: string_field(data, "description", "")?,
        command,
        explanation: string_field(data, "explanation", "")?,
        confidence: confidence_field(data, "confidence")?,
    })
}

fn string_field(data: &Map<String, Value>, field: &str, default: &str) -> Result<String, ParseError> {
    match data.get(field) {
        None => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ParseError::invalid(field, "expected a string")),
    }
}

/// Numbers, numeric strings and booleans are accepted; the result is clamped.
fn confidence_field(data: &Map<String, Value>, field: &str) -> Result<f64, ParseError> {
    let raw = match data.get(field) {
        None => return Ok(DEFAULT_CONFIDENCE),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(_) => None,
    };

    match raw {
        Some(v) if v.is_finite() => Ok(clamp_confidence(v)),
        _ => Err(ParseError::invalid(field, "expected a number")),
    }
}

fn string_list_field(
    data: &Map<String, Value>,
    field: &str,
) -> Result<Option<Vec<String>>, ParseError> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ParseError::invalid(field, "expected an array of strings"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ParseError::invalid(field, "expected an array")),
    }
}
