//! Command-line interface definitions for the `fixit` tool.

use clap::Parser;
use clap_complete::Shell;

/// Explain failed shell commands and suggest fixes
#[derive(Parser, Debug)]
#[command(name = "fixit", version, about, long_about = None)]
#[command(
    after_help = "EXAMPLES:\n    fixit --command \"npm install left-pad\" --error \"npm ERR! 404\"\n    fixit --capture cargo build\n    fixit --json --command make --error \"No rule to make target\" --exit-code 2"
)]
pub struct Cli {
    /// Command to run and explain (with --capture)
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,

    /// Run the trailing command and explain it if it fails
    #[arg(long)]
    pub capture: bool,

    /// The command that failed
    #[arg(long, short = 'c', value_name = "CMD", requires = "error", conflicts_with = "capture")]
    pub command: Option<String>,

    /// Error output of the failed command
    #[arg(long, short = 'e', value_name = "TEXT")]
    pub error: Option<String>,

    /// Exit code of the failed command
    #[arg(long, default_value = "1", value_name = "CODE", allow_negative_numbers = true)]
    pub exit_code: i32,

    /// Output as JSON
    #[arg(long, short = 'j')]
    pub json: bool,

    /// Plain text output without colors
    #[arg(long, short = 'r', conflicts_with = "json")]
    pub raw: bool,

    /// Log requests and cache activity to stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print a default configuration file and exit
    #[arg(long)]
    pub default_config: bool,

    /// Generate shell completions
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Trailing arguments joined into one shell command line
    pub fn captured_command(&self) -> Option<String> {
        if self.args.is_empty() {
            None
        } else {
            Some(self.args.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_command_and_error() {
        let cli = Cli::parse_from(["fixit", "--command", "npm install", "--error", "404"]);
        assert_eq!(cli.command.as_deref(), Some("npm install"));
        assert_eq!(cli.error.as_deref(), Some("404"));
        assert_eq!(cli.exit_code, 1);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_command_requires_error() {
        assert!(Cli::try_parse_from(["fixit", "--command", "make"]).is_err());
    }

    #[test]
    fn test_cli_parses_exit_code() {
        let cli = Cli::parse_from(["fixit", "-c", "ls", "-e", "nope", "--exit-code", "127"]);
        assert_eq!(cli.exit_code, 127);
    }

    #[test]
    fn test_cli_parses_capture_mode() {
        let cli = Cli::parse_from(["fixit", "--capture", "cargo", "build", "--release"]);
        assert!(cli.capture);
        assert_eq!(cli.args, vec!["cargo", "build", "--release"]);
        assert_eq!(cli.captured_command().as_deref(), Some("cargo build --release"));
    }

    #[test]
    fn test_cli_no_trailing_args() {
        let cli = Cli::parse_from(["fixit", "--show-config"]);
        assert!(cli.show_config);
        assert_eq!(cli.captured_command(), None);
    }

    #[test]
    fn test_cli_parses_short_json_flag() {
        let cli = Cli::parse_from(["fixit", "-j", "-c", "ls", "-e", "x"]);
        assert!(cli.json);
    }

    #[test]
    fn test_cli_raw_conflicts_with_json() {
        assert!(Cli::try_parse_from(["fixit", "--raw", "--json", "-c", "ls", "-e", "x"]).is_err());
    }

    #[test]
    fn test_cli_parses_verbose_flag() {
        let cli = Cli::parse_from(["fixit", "-v", "--default-config"]);
        assert!(cli.verbose);
        assert!(cli.default_config);
    }

    #[test]
    fn test_cli_parses_completions() {
        let cli = Cli::parse_from(["fixit", "--completions", "zsh"]);
        assert_eq!(cli.completions, Some(Shell::Zsh));
    }

    #[test]
    fn test_cli_multiline_error() {
        let cli = Cli::parse_from(["fixit", "-c", "gcc a.c", "-e", "line1\nline2\nline3"]);
        assert_eq!(cli.error.as_deref().map(|e| e.lines().count()), Some(3));
    }
}
