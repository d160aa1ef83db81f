//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::explanation::{Explanation, HIGH_CONFIDENCE};
use crate::failure::FailureRecord;

/// Confidence below which an explanation is shown as unreliable
const LOW_CONFIDENCE: f64 = 0.5;

/// A failure paired with its explanation, for JSON output
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub failure: &'a FailureRecord,
    pub explanation: &'a Explanation,
}

pub fn confidence_label(confidence: f64) -> &'static str {
    if confidence >= HIGH_CONFIDENCE {
        "high"
    } else if confidence >= LOW_CONFIDENCE {
        "medium"
    } else {
        "low"
    }
}

fn colored_percent(confidence: f64) -> ColoredString {
    let text = format!("{:.0}%", confidence * 100.0);
    match confidence_label(confidence) {
        "high" => text.green().bold(),
        "medium" => text.yellow().bold(),
        _ => text.red().bold(),
    }
}

/// Process inline markdown: `code` and **bold**
pub fn render_inline_markdown(text: &str) -> String {
    let mut result = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '`' {
            let mut code = String::new();
            for next in chars.by_ref() {
                if next == '`' {
                    break;
                }
                code.push(next);
            }
            result.push_str(&code.cyan().to_string());
        } else if c == '*' && chars.peek() == Some(&'*') {
            chars.next();
            let mut bold_text = String::new();
            while let Some(next) = chars.next() {
                if next == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    break;
                }
                bold_text.push(next);
            }
            result.push_str(&bold_text.bold().to_string());
        } else {
            result.push(c);
        }
    }

    result
}

fn print_wrapped(text: &str, width: usize, indent: &str) {
    for line in text.lines() {
        let processed = render_inline_markdown(line);
        for wrapped in textwrap::wrap(&processed, width.saturating_sub(indent.len()).max(20)) {
            println!("{indent}{wrapped}");
        }
    }
}

fn print_list(title: &str, items: &[String], width: usize) {
    if items.is_empty() {
        return;
    }
    println!("{} {}", "▸".magenta(), title.magenta().bold());
    for item in items {
        print_wrapped(&format!("• {item}"), width, "  ");
    }
    println!();
}

pub fn print_colored(record: &FailureRecord, explanation: &Explanation) {
    let width = textwrap::termwidth().min(100);

    println!();
    println!(
        "{} {} {}",
        "●".red(),
        record.command.bold(),
        format!("(exit {})", record.exit_code).dimmed()
    );
    let summary = record.error_summary();
    if !summary.is_empty() {
        for line in summary.lines() {
            println!("  {}", line.dimmed());
        }
    }
    println!();

    for line in textwrap::wrap(&render_inline_markdown(&explanation.summary), width) {
        println!("{}", line.white().bold());
    }
    println!();

    if !explanation.detailed_explanation.is_empty() {
        println!("{} {}", "▸".blue(), "Explanation".blue().bold());
        print_wrapped(&explanation.detailed_explanation, width, "  ");
        println!();
    }

    if !explanation.root_cause.is_empty() {
        println!("{} {}", "▸".yellow(), "Root Cause".yellow().bold());
        print_wrapped(&explanation.root_cause, width, "  ");
        println!();
    }

    if !explanation.fix_suggestions.is_empty() {
        println!("{} {}", "▸".green(), "Suggested Fixes".green().bold());
        for (i, fix) in explanation.fix_suggestions.iter().enumerate() {
            println!(
                "  {} {} {}",
                format!("{}.", i + 1).bold(),
                render_inline_markdown(&fix.description),
                colored_percent(fix.confidence)
            );
            if let Some(command) = &fix.command {
                println!("     {} {}", "$".dimmed(), command.cyan());
            }
            if !fix.explanation.is_empty() {
                print_wrapped(&fix.explanation, width, "     ");
            }
        }
        println!();
    }

    if let Some(related) = &explanation.related_errors {
        print_list("Related Errors", related, width);
    }
    if let Some(tips) = &explanation.prevention_tips {
        print_list("Prevention Tips", tips, width);
    }

    println!(
        "{} {} ({})",
        "Confidence:".bold(),
        colored_percent(explanation.confidence),
        confidence_label(explanation.confidence)
    );
}

/// Plain-text rendering of one or more explanations
pub fn format_plain(explanations: &[Explanation]) -> String {
    let mut out = Vec::new();
    let total = explanations.len();

    for (i, explanation) in explanations.iter().enumerate() {
        if total > 1 {
            out.push(format!("=== Explanation {} of {} ===", i + 1, total));
        }

        out.push(format!("Summary: {}", explanation.summary));
        out.push(format!("Detailed: {}", explanation.detailed_explanation));
        out.push(format!("Root Cause: {}", explanation.root_cause));

        if !explanation.fix_suggestions.is_empty() {
            out.push("\nFix Suggestions:".to_string());
            for (j, fix) in explanation.fix_suggestions.iter().enumerate() {
                out.push(format!("{}. {}", j + 1, fix.description));
                if let Some(command) = &fix.command {
                    out.push(format!("   Command: {command}"));
                }
                out.push(format!("   Explanation: {}", fix.explanation));
                out.push(format!("   Confidence: {:.1}%", fix.confidence * 100.0));
            }
        }

        if let Some(related) = &explanation.related_errors {
            out.push(format!("\nRelated Errors: {}", related.join(", ")));
        }
        if let Some(tips) = &explanation.prevention_tips {
            out.push(format!("\nPrevention Tips: {}", tips.join(", ")));
        }

        out.push(format!(
            "\nOverall Confidence: {:.1}%",
            explanation.confidence * 100.0
        ));

        if i + 1 < total {
            out.push(format!("\n{}\n", "=".repeat(50)));
        }
    }

    out.join("\n")
}

/// Pretty JSON array of failure/explanation pairs
pub fn format_json(
    records: &[FailureRecord],
    explanations: &[Explanation],
) -> serde_json::Result<String> {
    let reports: Vec<Report<'_>> = records
        .iter()
        .zip(explanations)
        .map(|(failure, explanation)| Report {
            failure,
            explanation,
        })
        .collect();
    serde_json::to_string_pretty(&reports)
}

pub fn print_config(config: &Config) {
    let redacted = config.redacted();
    println!("{}", "Current Configuration:".blue().bold());
    if let Some(path) = Config::config_path() {
        println!("  {} {}", "file:".cyan(), path.display());
    }
    println!(
        "  {} {}",
        "api_key:".cyan(),
        redacted.api.api_key.as_deref().unwrap_or("<not set>")
    );
    println!("  {} {}", "model:".cyan(), redacted.api.model);
    println!(
        "  {} {}",
        "base_url:".cyan(),
        redacted.api.base_url.as_deref().unwrap_or("<default>")
    );
    println!("  {} {}s", "timeout:".cyan(), redacted.api.timeout_secs);
    println!("  {} {}", "cache_enabled:".cyan(), redacted.cache.enabled);
    println!("  {} {}s", "cache_ttl:".cyan(), redacted.cache.ttl_secs);
    println!(
        "  {} {}",
        "cache_max_entries:".cyan(),
        redacted
            .cache
            .max_entries
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );
    println!(
        "  {} {}",
        "cache_fallbacks:".cyan(),
        redacted.cache.cache_fallbacks
    );

    let errors = config.validate();
    println!();
    if errors.is_empty() {
        println!("{}", "Configuration is valid!".green());
    } else {
        print_config_errors(&errors);
    }
}

pub fn print_config_errors(errors: &BTreeMap<&'static str, String>) {
    eprintln!("{}", "Configuration errors:".red().bold());
    for (key, message) in errors {
        eprintln!("  {} {}", format!("{key}:").red(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::FixSuggestion;
    use crate::parser::fallback_explanation;

    fn sample() -> Explanation {
        Explanation::new("Package missing", "npm returned 404", "Typo", 0.85)
            .with_fix(FixSuggestion::new(
                "Fix the name",
                Some("npm install left-pad".to_string()),
                "Correct package",
                0.9,
            ))
            .with_prevention_tips(vec!["Pin versions".to_string(), "Use a lockfile".to_string()])
    }

    #[test]
    fn test_confidence_label() {
        assert_eq!(confidence_label(0.95), "high");
        assert_eq!(confidence_label(0.8), "high");
        assert_eq!(confidence_label(0.5), "medium");
        assert_eq!(confidence_label(0.2), "low");
    }

    #[test]
    fn test_render_inline_markdown_strips_markers() {
        colored::control::set_override(false);
        assert_eq!(render_inline_markdown("run `ls -la` now"), "run ls -la now");
        assert_eq!(render_inline_markdown("a **bold** word"), "a bold word");
        assert_eq!(render_inline_markdown("plain * star"), "plain * star");
    }

    #[test]
    fn test_format_plain_single() {
        let text = format_plain(&[sample()]);

        assert!(text.starts_with("Summary: Package missing"));
        assert!(text.contains("Root Cause: Typo"));
        assert!(text.contains("1. Fix the name"));
        assert!(text.contains("   Command: npm install left-pad"));
        assert!(text.contains("   Confidence: 90.0%"));
        assert!(text.contains("Prevention Tips: Pin versions, Use a lockfile"));
        assert!(text.ends_with("Overall Confidence: 85.0%"));
        assert!(!text.contains("==="));
    }

    #[test]
    fn test_format_plain_multiple() {
        let text = format_plain(&[sample(), fallback_explanation("timeout")]);

        assert!(text.contains("=== Explanation 1 of 2 ==="));
        assert!(text.contains("=== Explanation 2 of 2 ==="));
        assert!(text.contains("Related Errors: Command parsing error, AI service unavailable"));
        assert!(text.contains(&"=".repeat(50)));
    }

    #[test]
    fn test_format_json() {
        let record = FailureRecord::new("npm install left-pad", 1).stderr("404");
        let json = format_json(&[record], &[sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["failure"]["command"], "npm install left-pad");
        assert_eq!(value[0]["explanation"]["summary"], "Package missing");
        assert_eq!(value[0]["explanation"]["confidence"], 0.85);
    }
}
