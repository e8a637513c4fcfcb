use std::borrow::Cow;

use crate::error::CommaitError;
use crate::history::Exemplar;
use crate::llm::prompts;

pub const DIFF_BEGIN: &str = "=== BEGIN DIFF ===";
pub const DIFF_END_BLOCK: &str = "\n=== END DIFF ===\n";

const CUT_MARKER: &str = "[... diff truncated ...]";
/// Upper bound on one `[... N lines omitted ...]` line, newline included.
const OMITTED_MARKER_RESERVE: usize = 48;

/// The assembled prompt plus what had to give way to fit the budget.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub exemplars_used: usize,
    pub diff_truncated: bool,
}

/// Build the commit prompt within `budget` bytes.
///
/// Exemplars are dropped from the end of the slice while the instructions and
/// exemplars leave less than a quarter of the budget for the diff. That rule
/// ignores the diff itself, so feeding the truncated diff back in rebuilds the
/// same prompt. The diff then gets whatever room is left, see [`truncate_diff`].
pub fn commit_prompt(
    exemplars: &[Exemplar],
    diff: &str,
    budget: usize,
) -> Result<Prompt, CommaitError> {
    let min_diff_room = budget / 4;

    let mut used = exemplars.len();
    let mut head = render_head(&exemplars[..used]);
    while used > 0 && head.len() + DIFF_END_BLOCK.len() + min_diff_room > budget {
        used -= 1;
        head = render_head(&exemplars[..used]);
    }

    let fixed = head.len() + DIFF_END_BLOCK.len();
    if fixed > budget {
        return Err(CommaitError::Config(format!(
            "prompt budget of {budget} bytes cannot hold the {fixed}-byte instructions"
        )));
    }
    if used < exemplars.len() {
        log::debug!(
            "Dropped {} exemplar(s) to fit the prompt budget",
            exemplars.len() - used
        );
    }

    let diff_text = truncate_diff(diff, budget - fixed);
    let diff_truncated = matches!(diff_text, Cow::Owned(_));
    if diff_truncated {
        log::warn!(
            "Diff truncated from {} to {} bytes to fit the prompt budget",
            diff.len(),
            diff_text.len()
        );
    }

    let mut text = head;
    text.push_str(&diff_text);
    text.push_str(DIFF_END_BLOCK);

    Ok(Prompt {
        text,
        exemplars_used: used,
        diff_truncated,
    })
}

fn render_head(exemplars: &[Exemplar]) -> String {
    let mut out = String::from(prompts::COMMIT_INSTRUCTIONS);
    out.push_str("\n\n");

    if !exemplars.is_empty() {
        out.push_str(prompts::EXAMPLES_HEADER);
        out.push_str("\n\n");
        for (idx, ex) in exemplars.iter().enumerate() {
            let n = idx + 1;
            out.push_str(&format!(
                "--- example {n} ({hash}) ---\n{message}\n--- end example {n} ---\n\n",
                hash = ex.short_hash,
                message = ex.message
            ));
        }
    }

    out.push_str(prompts::DIFF_HEADER);
    out.push('\n');
    out.push_str(DIFF_BEGIN);
    out.push('\n');
    out
}

/// Shrink a unified diff to at most `max_len` bytes.
///
/// A diff that already fits is returned untouched, which makes the operation
/// idempotent. Otherwise:
///
/// - file headers (the `diff --git` line and everything up to the first `@@`)
///   are always kept, so every changed file stays visible;
/// - body lines are kept from the top while they fit; after the first one that
///   does not, every later body line is dropped;
/// - each run of dropped lines becomes one `[... N lines omitted ...]` line.
///
/// When the headers alone do not fit, the diff is cut at the last whole line
/// that leaves room for a closing `[... diff truncated ...]` marker.
pub fn truncate_diff(diff: &str, max_len: usize) -> Cow<'_, str> {
    if diff.len() <= max_len {
        return Cow::Borrowed(diff);
    }

    let lines: Vec<&str> = diff.lines().collect();
    let mut in_header = false;
    let header_flags: Vec<bool> = lines
        .iter()
        .map(|line| {
            if line.starts_with("diff --git ") {
                in_header = true;
            } else if line.starts_with("@@") {
                in_header = false;
            }
            in_header
        })
        .collect();

    let header_len: usize = lines
        .iter()
        .zip(&header_flags)
        .filter(|(_, header)| **header)
        .map(|(line, _)| line.len() + 1)
        .sum();
    let sections = 1 + lines.iter().filter(|l| l.starts_with("diff --git ")).count();
    let reserved = header_len + sections * OMITTED_MARKER_RESERVE;
    if reserved > max_len {
        return Cow::Owned(hard_cut(diff, max_len));
    }

    let mut body_room = max_len - reserved;
    let mut out = String::with_capacity(max_len);
    let mut cut = false;
    let mut omitted = 0usize;

    for (line, header) in lines.iter().zip(&header_flags) {
        if *header {
            push_omitted(&mut out, &mut omitted);
            out.push_str(line);
            out.push('\n');
        } else if !cut && line.len() < body_room {
            body_room -= line.len() + 1;
            out.push_str(line);
            out.push('\n');
        } else {
            cut = true;
            omitted += 1;
        }
    }
    push_omitted(&mut out, &mut omitted);

    Cow::Owned(out)
}

fn push_omitted(out: &mut String, omitted: &mut usize) {
    if *omitted > 0 {
        out.push_str(&format!("[... {omitted} lines omitted ...]\n"));
        *omitted = 0;
    }
}

fn hard_cut(diff: &str, max_len: usize) -> String {
    let marker_len = CUT_MARKER.len() + 1;
    if max_len < marker_len {
        return diff[..floor_char_boundary(diff, max_len)].to_string();
    }

    let end = floor_char_boundary(diff, max_len - marker_len);
    let keep = diff[..end].rfind('\n').map_or(0, |i| i + 1);
    format!("{}{CUT_MARKER}\n", &diff[..keep])
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
