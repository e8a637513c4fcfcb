use clap::{ArgAction, Parser};

use crate::history::Sampling;

/// CLI options
#[derive(Parser, Debug, Default)]
#[command(
    name = "commait",
    version,
    about = "Write a commit message for your staged changes with a local Ollama model",
    disable_help_flag = true
)]
pub struct Cli {
    /// Ticket id to prefix the summary with, e.g. ANA3-1234
    #[arg(long, value_name = "TICKET")]
    pub jira: Option<String>,

    /// Label shown before the ticket id (default: BUGFIX)
    #[arg(long, env = "COMMAIT_LABEL")]
    pub label: Option<String>,

    /// Print the full prompt before sending it to the model
    #[arg(short, long)]
    pub debug: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Ollama model name (default: llama3)
    #[arg(long, env = "COMMAIT_MODEL")]
    pub model: Option<String>,

    /// Ollama server URL (default: http://localhost:11434)
    #[arg(long, env = "OLLAMA_HOST")]
    pub host: Option<String>,

    /// Maximum number of past commits shown to the model
    #[arg(long, value_name = "N")]
    pub max_examples: Option<usize>,

    /// Prompt size limit in bytes; the diff is truncated to fit
    #[arg(long, value_name = "BYTES")]
    pub budget: Option<usize>,

    /// How example commits are picked from history
    #[arg(long, value_enum)]
    pub sampling: Option<Sampling>,

    /// Seed for example sampling, for reproducible prompts
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use what is already staged instead of staging everything
    #[arg(long)]
    pub no_stage: bool,

    /// Print the message instead of opening `git commit`
    #[arg(long)]
    pub print: bool,

    /// Stream the model's answer to the terminal as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Skip the model and use a canned message (offline dry run)
    #[arg(long)]
    pub no_model: bool,

    /// Print help
    #[arg(short = 'h', long = "help", alias = "h", action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,
}

impl Cli {
    /// `--debug` implies at least debug-level logs.
    pub fn log_verbosity(&self) -> u8 {
        if self.debug {
            self.verbose.max(2)
        } else {
            self.verbose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_documented_flags() {
        let cli = Cli::try_parse_from(["commait", "--jira", "ABC-1", "-d", "--sampling", "scored"])
            .unwrap();
        assert_eq!(cli.jira.as_deref(), Some("ABC-1"));
        assert!(cli.debug);
        assert_eq!(cli.sampling, Some(Sampling::Scored));
        assert_eq!(cli.log_verbosity(), 2);
    }

    #[test]
    fn short_help_alias_is_accepted() {
        let err = Cli::try_parse_from(["commait", "--h"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn verbosity_counts_repeats() {
        let cli = Cli::try_parse_from(["commait", "-vvv"]).unwrap();
        assert_eq!(cli.log_verbosity(), 3);
    }
}
