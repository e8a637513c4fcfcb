use crate::diff;
use crate::error::CommaitError;

use super::LlmClient;
use super::prompt_builder::{DIFF_BEGIN, Prompt};

/// Offline client: answers with a canned message built from the diff's file names.
pub struct NoopClient;

impl LlmClient for NoopClient {
    fn describe(&self) -> String {
        "offline (no model)".to_string()
    }

    fn wait_until_ready(&self) -> Result<(), CommaitError> {
        Ok(())
    }

    fn generate(&self, prompt: &Prompt) -> Result<String, CommaitError> {
        Ok(canned_response(&prompt.text))
    }
}

/// Shaped like a chatty model answer so the normalizer has work to do.
fn canned_response(prompt_text: &str) -> String {
    let diff_part = prompt_text
        .split_once(DIFF_BEGIN)
        .map_or(prompt_text, |(_, rest)| rest);
    let files = diff::changed_files(diff_part);

    let target = match files.as_slice() {
        [] => "staged changes".to_string(),
        [one] => one.clone(),
        many => format!("{} files", many.len()),
    };

    let mut out = format!("Commit message:\n```\nchore: update {target}\n");
    if files.len() > 1 {
        out.push('\n');
        for file in &files {
            out.push_str(&format!("- update {file}\n"));
        }
    }
    out.push_str("```\n");
    out
}
