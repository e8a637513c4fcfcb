use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::cli_args::Cli;
use crate::error::CommaitError;
use crate::history::{SamplerConfig, Sampling};

pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_LABEL: &str = "BUGFIX";
pub const DEFAULT_PROMPT_BUDGET: usize = 24_000;
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const MAX_EXAMPLES_LIMIT: usize = 10;

/// Final resolved configuration for commait.
#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub host: String,
    pub label: String,
    /// Tag used as `[TAG]` when no ticket is given.
    pub default_tag: Option<String>,
    pub sampler: SamplerConfig,
    pub prompt_budget: usize,
    pub ready_timeout: Duration,
    pub request_timeout: Duration,
    pub stream: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: DEFAULT_MODEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            label: DEFAULT_LABEL.to_string(),
            default_tag: None,
            sampler: SamplerConfig::default(),
            prompt_budget: DEFAULT_PROMPT_BUDGET,
            ready_timeout: Duration::from_secs(DEFAULT_READY_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            stream: false,
        }
    }
}

impl Config {
    /// Build the final config from CLI flags, environment, TOML file, and defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (`--model`, `--host`, ...)
    ///   2. Env vars `COMMAIT_MODEL`, `OLLAMA_HOST`, `COMMAIT_LABEL` (read through clap)
    ///   3. TOML `~/.config/commait.toml`, or the file named by `COMMAIT_CONFIG`
    ///   4. Hardcoded defaults
    pub fn from_sources(cli: &Cli) -> Result<Self, CommaitError> {
        let file_cfg = load_file_config()?.unwrap_or_default();
        Self::resolve(cli, file_cfg)
    }

    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, CommaitError> {
        let defaults = Config::default();
        let sampler_defaults = defaults.sampler.clone();

        let model = cli
            .model
            .clone()
            .or(file.model)
            .unwrap_or(defaults.model);
        let host = normalize_host(&cli.host.clone().or(file.host).unwrap_or(defaults.host));
        let label = cli
            .label
            .clone()
            .or(file.label)
            .unwrap_or(defaults.label);

        let sampler = SamplerConfig {
            strategy: cli.sampling.or(file.sampling).unwrap_or(sampler_defaults.strategy),
            max_examples: cli
                .max_examples
                .or(file.max_examples)
                .unwrap_or(sampler_defaults.max_examples),
            recent_count: file.recent_count.unwrap_or(sampler_defaults.recent_count),
            random_count: file.random_count.unwrap_or(sampler_defaults.random_count),
            lookback: file.lookback.unwrap_or(sampler_defaults.lookback),
            pool_size: file.pool_size.unwrap_or(sampler_defaults.pool_size),
            min_message_len: file
                .min_message_len
                .unwrap_or(sampler_defaults.min_message_len),
            seed: cli.seed.or(file.seed),
        };

        let cfg = Config {
            model,
            host,
            label,
            default_tag: file.default_tag.filter(|t| !t.trim().is_empty()),
            sampler,
            prompt_budget: cli
                .budget
                .or(file.prompt_budget)
                .unwrap_or(defaults.prompt_budget),
            ready_timeout: file
                .ready_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.ready_timeout),
            request_timeout: file
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            stream: cli.stream || file.stream.unwrap_or(false),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), CommaitError> {
        if self.model.trim().is_empty() {
            return Err(CommaitError::Config("model name is empty".into()));
        }
        if self.label.trim().is_empty() {
            return Err(CommaitError::Config("ticket label is empty".into()));
        }
        if self.sampler.max_examples > MAX_EXAMPLES_LIMIT {
            return Err(CommaitError::Config(format!(
                "max_examples is {}, at most {MAX_EXAMPLES_LIMIT} fit a local model's context",
                self.sampler.max_examples
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(CommaitError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Keys accepted in the TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub model: Option<String>,
    pub host: Option<String>,
    pub label: Option<String>,
    pub default_tag: Option<String>,
    pub max_examples: Option<usize>,
    pub recent_count: Option<usize>,
    pub random_count: Option<usize>,
    pub lookback: Option<usize>,
    pub pool_size: Option<usize>,
    pub min_message_len: Option<usize>,
    pub sampling: Option<Sampling>,
    pub seed: Option<u64>,
    pub prompt_budget: Option<usize>,
    pub ready_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub stream: Option<bool>,
}

/// `OLLAMA_HOST` is often given without a scheme (`127.0.0.1:11434`).
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// Return `$COMMAIT_CONFIG` or `~/.config/commait.toml`
fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("COMMAIT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("commait.toml"))
}

fn load_file_config() -> Result<Option<FileConfig>, CommaitError> {
    let Some(path) = config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    log::debug!("Reading config from {}", path.display());
    let data = fs::read_to_string(&path)?;
    parse_file_config(&data)
        .map(Some)
        .map_err(|e| CommaitError::Config(format!("{}: {e}", path.display())))
}

fn parse_file_config(data: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str::<FileConfig>(data)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let cfg = Config::resolve(&Cli::default(), FileConfig::default()).unwrap();
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.host, DEFAULT_HOST);
        assert_eq!(cfg.label, DEFAULT_LABEL);
        assert_eq!(cfg.prompt_budget, DEFAULT_PROMPT_BUDGET);
        assert_eq!(cfg.sampler.strategy, Sampling::Mixed);
        assert!(cfg.default_tag.is_none());
    }

    #[test]
    fn cli_beats_file() {
        let cli = Cli::try_parse_from(["commait", "--model", "mistral", "--budget", "8000"]).unwrap();
        let file = parse_file_config(
            r#"
            model = "llama3.1"
            prompt_budget = 12000
            sampling = "scored"
            default_tag = "DEV"
            ready_timeout_secs = 5
            "#,
        )
        .unwrap();

        let cfg = Config::resolve(&cli, file).unwrap();
        assert_eq!(cfg.model, "mistral");
        assert_eq!(cfg.prompt_budget, 8_000);
        assert_eq!(cfg.sampler.strategy, Sampling::Scored);
        assert_eq!(cfg.default_tag.as_deref(), Some("DEV"));
        assert_eq!(cfg.ready_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_bad_values() {
        let cli = Cli::try_parse_from(["commait", "--max-examples", "50"]).unwrap();
        assert!(matches!(
            Config::resolve(&cli, FileConfig::default()),
            Err(CommaitError::Config(_))
        ));

        let file = FileConfig {
            request_timeout_secs: Some(0),
            ..FileConfig::default()
        };
        assert!(Config::resolve(&Cli::default(), file).is_err());
    }

    #[test]
    fn unknown_sampling_in_file_is_an_error() {
        assert!(parse_file_config(r#"sampling = "sometimes""#).is_err());
    }

    #[test]
    fn host_gets_a_scheme() {
        assert_eq!(normalize_host("127.0.0.1:11434"), "http://127.0.0.1:11434");
        assert_eq!(normalize_host("https://gpu.local/"), "https://gpu.local");
    }
}
