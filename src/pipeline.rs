//! The run: diff, examples, prompt, model, normalize, commit.

use anyhow::Result;
use colored::Colorize;

use crate::cli_args::Cli;
use crate::commit;
use crate::config::Config;
use crate::diff;
use crate::git::Repo;
use crate::history;
use crate::llm::LlmClient;
use crate::llm::prompt_builder;
use crate::normalize::{self, Prefix};

/// Per-run switches that are not configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub ticket: Option<String>,
    pub debug: bool,
    pub stage: bool,
    pub print_only: bool,
}

impl RunOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        RunOptions {
            ticket: cli.jira.clone(),
            debug: cli.debug,
            stage: !cli.no_stage,
            print_only: cli.print,
        }
    }
}

/// Generate the message, then print it or hand it to `git commit --edit`.
pub fn run(repo: &Repo, cfg: &Config, client: &dyn LlmClient, opts: &RunOptions) -> Result<()> {
    let message = generate_message(repo, cfg, client, opts)?;

    if opts.print_only {
        println!("{message}");
        return Ok(());
    }

    if opts.debug {
        eprintln!();
        eprintln!("{}", "----- Suggested commit message -----".bold());
        eprintln!("{message}");
        eprintln!("{}", "------------------------------------".bold());
    }

    commit::commit_with_edit(repo, &message)?;
    eprintln!("{} Done!", "✔".green());
    Ok(())
}

/// Everything up to the final message; the repository is only touched by staging.
pub fn generate_message(
    repo: &Repo,
    cfg: &Config,
    client: &dyn LlmClient,
    opts: &RunOptions,
) -> Result<String> {
    let staged = diff::collect(repo, opts.stage)?;
    log::debug!("Staged files: {}", staged.files.join(", "));

    let exemplars = history::sample(repo, &cfg.sampler).unwrap_or_else(|e| {
        log::warn!("Continuing without example commits: {e}");
        vec![]
    });

    let prompt = prompt_builder::commit_prompt(&exemplars, &staged.text, cfg.prompt_budget)?;
    log::info!(
        "Prompt is {} bytes with {} example commit(s){}",
        prompt.text.len(),
        prompt.exemplars_used,
        if prompt.diff_truncated { ", diff truncated" } else { "" }
    );

    if opts.debug {
        eprintln!("{}", "----- Prompt -----".bold());
        eprintln!("{}", prompt.text);
        eprintln!("{}", "------------------".bold());
    }

    log::info!("Using {}", client.describe());
    client.wait_until_ready()?;
    let raw = client.generate(&prompt)?;
    log::trace!("Raw model response:\n{raw}");

    let prefix = prefix_for(cfg, opts.ticket.as_deref());
    let message = normalize::normalize(&raw, prefix.as_ref())?;
    Ok(message)
}

/// Ticket prefix when a ticket is given, else the configured tag, else nothing.
pub fn prefix_for(cfg: &Config, ticket: Option<&str>) -> Option<Prefix> {
    match ticket.map(str::trim).filter(|t| !t.is_empty()) {
        Some(ticket) => Some(Prefix::Ticket {
            label: cfg.label.clone(),
            ticket: ticket.to_string(),
        }),
        None => cfg.default_tag.clone().map(Prefix::Tag),
    }
}
