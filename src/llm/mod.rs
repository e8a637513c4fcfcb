pub mod noop;
pub mod ollama;
pub mod prompt_builder;
mod prompts;
mod stream;

use crate::error::CommaitError;
use prompt_builder::Prompt;

/// Trait for talking to a local model backend.
pub trait LlmClient {
    /// Short description for logs, e.g. `ollama llama3 @ http://localhost:11434`.
    fn describe(&self) -> String;

    /// Block until the backend answers, or fail after one bounded wait.
    fn wait_until_ready(&self) -> Result<(), CommaitError>;

    /// Send the prompt and return the raw, untrusted response text.
    fn generate(&self, prompt: &Prompt) -> Result<String, CommaitError>;
}
