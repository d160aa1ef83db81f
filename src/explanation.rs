//! Structured explanation results.

use serde::{Deserialize, Deserializer, Serialize};

/// Explanations at or above this confidence are considered reliable
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// Clamp a confidence value into `[0, 1]`. NaN maps to 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_confidence)
}

/// A suggested fix for a failed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixSuggestion {
    /// What to do
    pub description: String,
    /// Command to run, if the fix is a command
    pub command: Option<String>,
    /// Why this fix works
    pub explanation: String,
    /// Confidence in `[0, 1]`
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: f64,
}

impl FixSuggestion {
    pub fn new(
        description: impl Into<String>,
        command: Option<String>,
        explanation: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            description: description.into(),
            command,
            explanation: explanation.into(),
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Analysis of one failed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub detailed_explanation: String,
    pub root_cause: String,
    /// Fixes in the order the model emitted them
    pub fix_suggestions: Vec<FixSuggestion>,
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: f64,
    pub related_errors: Option<Vec<String>>,
    pub prevention_tips: Option<Vec<String>>,
}

impl Explanation {
    /// Create an explanation with no fixes or extras; confidence is clamped.
    pub fn new(
        summary: impl Into<String>,
        detailed_explanation: impl Into<String>,
        root_cause: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            summary: summary.into(),
            detailed_explanation: detailed_explanation.into(),
            root_cause: root_cause.into(),
            fix_suggestions: Vec::new(),
            confidence: clamp_confidence(confidence),
            related_errors: None,
            prevention_tips: None,
        }
    }

    /// Builder: append a fix suggestion
    pub fn with_fix(mut self, fix: FixSuggestion) -> Self {
        self.fix_suggestions.push(fix);
        self
    }

    /// Builder: set related errors
    pub fn with_related_errors(mut self, errors: Vec<String>) -> Self {
        self.related_errors = Some(errors);
        self
    }

    /// Builder: set prevention tips
    pub fn with_prevention_tips(mut self, tips: Vec<String>) -> Self {
        self.prevention_tips = Some(tips);
        self
    }

    /// The highest-confidence fix. Ties go to the earliest suggestion.
    pub fn primary_fix(&self) -> Option<&FixSuggestion> {
        let mut best: Option<&FixSuggestion> = None;
        for fix in &self.fix_suggestions {
            match best {
                Some(current) if fix.confidence <= current.confidence => {}
                _ => best = Some(fix),
            }
        }
        best
    }

    pub fn has_high_confidence(&self) -> bool {
        self.confidence >= HIGH_CONFIDENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(description: &str, confidence: f64) -> FixSuggestion {
        FixSuggestion::new(description, None, "because", confidence)
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(-0.5), 0.0);
        assert_eq!(clamp_confidence(1.7), 1.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
    }

    #[test]
    fn test_constructors_clamp() {
        assert_eq!(fix("a", 3.0).confidence, 1.0);
        assert_eq!(Explanation::new("s", "d", "r", -1.0).confidence, 0.0);
    }

    #[test]
    fn test_primary_fix_picks_highest() {
        let explanation = Explanation::new("s", "d", "r", 0.7)
            .with_fix(fix("low", 0.2))
            .with_fix(fix("high", 0.9))
            .with_fix(fix("mid", 0.5));

        assert_eq!(explanation.primary_fix().unwrap().description, "high");
    }

    #[test]
    fn test_primary_fix_tie_goes_to_first() {
        let explanation = Explanation::new("s", "d", "r", 0.7)
            .with_fix(fix("other", 0.1))
            .with_fix(fix("first", 0.8))
            .with_fix(fix("second", 0.8));

        assert_eq!(explanation.primary_fix().unwrap().description, "first");
    }

    #[test]
    fn test_primary_fix_empty() {
        assert!(Explanation::new("s", "d", "r", 0.5).primary_fix().is_none());
    }

    #[test]
    fn test_has_high_confidence_boundary() {
        assert!(Explanation::new("s", "d", "r", 0.8).has_high_confidence());
        assert!(Explanation::new("s", "d", "r", 0.95).has_high_confidence());
        assert!(!Explanation::new("s", "d", "r", 0.79).has_high_confidence());
    }

    #[test]
    fn test_deserialize_clamps_confidence() {
        let json = r#"{
            "summary": "s",
            "detailed_explanation": "d",
            "root_cause": "r",
            "fix_suggestions": [
                {"description": "x", "command": null, "explanation": "y", "confidence": 4.0}
            ],
            "confidence": -2.0,
            "related_errors": null,
            "prevention_tips": ["tip"]
        }"#;

        let explanation: Explanation = serde_json::from_str(json).unwrap();
        assert_eq!(explanation.confidence, 0.0);
        assert_eq!(explanation.fix_suggestions[0].confidence, 1.0);
        assert_eq!(explanation.prevention_tips, Some(vec!["tip".to_string()]));
    }

    #[test]
    fn test_explanation_serializes_to_json() {
        let explanation = Explanation::new("test summary", "details", "cause", 0.6)
            .with_fix(FixSuggestion::new("do it", Some("make".to_string()), "why", 0.7));

        let json = serde_json::to_string(&explanation).unwrap();

        assert!(json.contains("\"summary\":\"test summary\""));
        assert!(json.contains("\"command\":\"make\""));
    }
}
