mod cli_args;
mod commit;
mod config;
mod conventional;
mod diff;
mod error;
mod git;
mod history;
mod llm;
mod logging;
mod normalize;
mod pipeline;
mod setup;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use cli_args::Cli;
use config::Config;
use error::CommaitError;
use git::Repo;
use pipeline::RunOptions;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logger(cli.log_verbosity());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cfg = Config::from_sources(cli)?;
    let repo = Repo::current().context("commait must run inside a git repository")?;
    let client = setup::build_llm_client(&cfg, cli.no_model)?;

    pipeline::run(&repo, &cfg, client.as_ref(), &RunOptions::from_cli(cli))
}

/// One line on stderr; a cancelled edit still exits 0.
fn report(err: &anyhow::Error) -> ExitCode {
    if let Some(e) = err.downcast_ref::<CommaitError>() {
        if e.is_normal_exit() {
            eprintln!("{} {e}", "note:".yellow().bold());
            return ExitCode::SUCCESS;
        }
    }

    eprintln!("{} {err:#}", "error:".red().bold());
    ExitCode::FAILURE
}
