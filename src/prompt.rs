//! Prompt construction for the completion API.

use crate::failure::FailureRecord;

/// System prompt for failed command analysis
pub const SYSTEM_PROMPT: &str = r#"You are an expert software engineer and system administrator.
Your job is to analyze failed terminal commands and provide clear, actionable
explanations and fix suggestions.

When analyzing a failed command, you should:
1. Identify the root cause of the error
2. Explain what went wrong in simple terms
3. Provide specific, actionable fix suggestions
4. Include confidence levels for your suggestions
5. Mention any related common errors
6. Provide prevention tips

Format your response as a JSON object with the following structure:
{
    "summary": "Brief summary of what went wrong",
    "detailed_explanation": "Detailed explanation of the error",
    "root_cause": "Root cause analysis",
    "fix_suggestions": [
        {
            "description": "Description of the fix",
            "command": "Suggested command (if applicable)",
            "explanation": "Why this fix works",
            "confidence": 0.9
        }
    ],
    "confidence": 0.8,
    "related_errors": ["List of related common errors"],
    "prevention_tips": ["Tips to prevent similar errors"]
}"#;

/// Placeholder for context the capture layer did not record
const UNKNOWN: &str = "Unknown";

/// The two messages sent for one failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the system and user messages for a failure
pub fn build_prompt(record: &FailureRecord) -> Prompt {
    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user: build_user_message(record),
    }
}

/// Interpolate the failure into the user message template. Values are
/// inserted verbatim.
pub fn build_user_message(record: &FailureRecord) -> String {
    format!(
        "Please analyze this failed command and provide an explanation:\n\
         \n\
         Command: {command}\n\
         Working Directory: {cwd}\n\
         Shell: {shell}\n\
         Exit Code: {exit_code}\n\
         \n\
         Error Output:\n\
         {stderr}\n\
         \n\
         Standard Output:\n\
         {stdout}\n\
         \n\
         Please provide a detailed analysis and fix suggestions in the JSON format\n\
         specified in the system prompt.",
        command = record.command,
        cwd = record.working_directory.as_deref().unwrap_or(UNKNOWN),
        shell = record.shell.as_deref().unwrap_or(UNKNOWN),
        exit_code = record.exit_code,
        stderr = record.stderr,
        stdout = record.stdout,
    )
}
