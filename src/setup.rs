use log::debug;

use crate::config::Config;
use crate::error::CommaitError;
use crate::llm::LlmClient;
use crate::llm::noop::NoopClient;
use crate::llm::ollama::OllamaClient;

/// Build the LLM client based on CLI + config.
pub fn build_llm_client(cfg: &Config, no_model: bool) -> Result<Box<dyn LlmClient>, CommaitError> {
    if no_model {
        debug!("Using NoopClient (no model calls)");
        return Ok(Box::new(NoopClient));
    }

    debug!("Using OllamaClient with model: {}", cfg.model);
    Ok(Box::new(OllamaClient::new(cfg)?))
}
