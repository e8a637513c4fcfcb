//! Turns an untrusted model answer into a single commit message.

use crate::conventional;
use crate::error::CommaitError;

/// What goes in front of the summary line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefix {
    /// `[<LABEL> <TICKET>] `
    Ticket { label: String, ticket: String },
    /// `[<TAG>] `, used when no ticket was given.
    Tag(String),
}

impl Prefix {
    pub fn render(&self) -> String {
        match self {
            Prefix::Ticket { label, ticket } => format!("[{label} {ticket}] "),
            Prefix::Tag(tag) => format!("[{tag}] "),
        }
    }
}

/// Lead-in phrases models put before the actual message.
const LABEL_PHRASES: &[&str] = &[
    "commit message",
    "here is",
    "here's",
    "suggested commit",
    "generated commit",
    "proposed commit",
];

/// Labels that only count when numbered, as in `Option 2:`.
const NUMBERED_LABELS: &[&str] = &["option", "candidate", "alternative", "suggestion", "message"];

/// Conversational filler around the answer.
const CHATTER_OPENERS: &[&str] = &[
    "sure",
    "okay",
    "ok",
    "certainly",
    "of course",
    "absolutely",
    "great",
    "here is",
    "here's",
    "below is",
    "i hope",
    "hope this",
    "let me know",
    "feel free",
];

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

type Block = Vec<String>;

/// Clean `raw` into `summary[\n\nbody]`, prefixing the summary line only.
pub fn normalize(raw: &str, prefix: Option<&Prefix>) -> Result<String, CommaitError> {
    let text = strip_think(raw);
    let text = unfence(&text).join("\n");
    let text = unquote(&text);
    let blocks = into_blocks(unblockquote(&text));

    let candidate = pick_candidate(split_candidates(blocks)).ok_or(CommaitError::EmptyMessage)?;
    let mut message = render(candidate).ok_or(CommaitError::EmptyMessage)?;

    if let Some(prefix) = prefix {
        message.insert_str(0, &prefix.render());
    }
    Ok(message)
}

/// Remove `<think>...</think>` reasoning, including an unclosed tail.
fn strip_think(raw: &str) -> String {
    let mut text = raw.to_string();

    // some models drop the opening tag
    if let Some(end) = text.find(THINK_CLOSE) {
        if !text[..end].contains(THINK_OPEN) {
            text.replace_range(..end + THINK_CLOSE.len(), "");
        }
    }

    while let Some(start) = text.find(THINK_OPEN) {
        match text[start..].find(THINK_CLOSE) {
            Some(rel) => text.replace_range(start..start + rel + THINK_CLOSE.len(), ""),
            None => text.truncate(start),
        }
    }
    text
}

fn is_fence(line: &str) -> bool {
    let Some(rest) = line.trim().strip_prefix("```") else {
        return false;
    };
    rest.trim_start_matches('`')
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
}

/// Unwrap a fenced block that holds the whole answer; elsewhere drop only the fence lines.
fn unfence(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let Some(open) = lines.iter().position(|l| is_fence(l)) else {
        return lines;
    };

    let inner = match lines[open + 1..].iter().position(|l| is_fence(l)) {
        Some(rel) => &lines[open + 1..open + 1 + rel],
        None => &lines[open + 1..],
    };

    if inner.iter().any(|l| !l.trim().is_empty()) && wraps_answer(&lines[..open], inner) {
        inner.to_vec()
    } else {
        lines.into_iter().filter(|l| !is_fence(l)).collect()
    }
}

/// A fence wraps the answer when only chatter precedes it, or when it opens
/// with a conventional header that nothing before it has.
fn wraps_answer(before: &[&str], inner: &[&str]) -> bool {
    let before: Vec<&str> = before
        .iter()
        .copied()
        .filter(|l| !l.trim().is_empty())
        .collect();
    if before.iter().all(|l| is_chatter(l)) {
        return true;
    }

    let opens_with_header = inner
        .iter()
        .find(|l| !l.trim().is_empty())
        .is_some_and(|l| conventional::is_header(l));
    opens_with_header && !before.iter().any(|l| conventional::is_header(l))
}

/// Strip one pair of quotes wrapping the whole text.
fn unquote(text: &str) -> String {
    let t = text.trim();

    for q in ["\"\"\"", "'''", "```"] {
        if t.len() >= 2 * q.len() && t.starts_with(q) && t.ends_with(q) {
            return t[q.len()..t.len() - q.len()].trim().to_string();
        }
    }

    for q in ['"', '\'', '`'] {
        if t.len() >= 2 && t.starts_with(q) && t.ends_with(q) {
            let inner = &t[1..t.len() - 1];
            if !inner.contains(q) {
                return inner.trim().to_string();
            }
        }
    }

    t.to_string()
}

/// Drop a `> ` prefix when every non-blank line carries one.
fn unblockquote(text: &str) -> Vec<&str> {
    let quoted = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .all(|l| l.trim_start().starts_with('>'));

    text.lines()
        .map(|line| {
            if quoted {
                let rest = line.trim_start().trim_start_matches('>');
                rest.strip_prefix(' ').unwrap_or(rest)
            } else {
                line
            }
        })
        .collect()
}

/// Group trimmed lines into blank-line separated blocks, minus trailers,
/// surrounding chatter and lead-in labels.
fn into_blocks(lines: Vec<&str>) -> Vec<Block> {
    let mut lines: Vec<&str> = lines
        .into_iter()
        .map(str::trim)
        .filter(|l| !conventional::is_trailer(l))
        .collect();

    let lead = lines
        .iter()
        .take_while(|l| l.is_empty() || is_chatter(l))
        .count();
    lines.drain(..lead);
    while lines.last().is_some_and(|l| l.is_empty() || is_chatter(l)) {
        lines.pop();
    }

    let mut blocks: Vec<Block> = Vec::new();
    let mut current: Block = Vec::new();
    for line in lines {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.to_string());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    for block in &mut blocks {
        while let Some(first) = block.first() {
            match strip_label(first) {
                Some(rest) if rest.is_empty() => {
                    block.remove(0);
                }
                Some(rest) => {
                    block[0] = rest;
                    break;
                }
                None => break,
            }
        }
    }
    blocks.retain(|b| !b.is_empty());
    blocks
}

fn starts_with_word(haystack: &str, word: &str) -> bool {
    haystack.starts_with(word)
        && !haystack[word.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
}

/// The line without markdown heading and bold markers.
fn bare_line(line: &str) -> &str {
    line.trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches('*')
        .trim()
}

/// `commit message`, `here is the message`, `option 2`, ...
fn is_label_head(head: &str) -> bool {
    let head = head.trim().trim_end_matches('*').trim();
    if head.split_whitespace().count() > 8 {
        return false;
    }
    if LABEL_PHRASES.iter().any(|p| starts_with_word(head, p)) {
        return true;
    }
    NUMBERED_LABELS.iter().any(|w| {
        starts_with_word(head, w) && {
            let n = head[w.len()..].trim().trim_start_matches('#');
            !n.is_empty() && n.chars().all(|c| c.is_ascii_digit())
        }
    })
}

/// `Some(rest)` when the line opens with a label such as `Commit message:`.
fn strip_label(line: &str) -> Option<String> {
    let bare = bare_line(line);
    let colon = bare.find(':')?;
    if !is_label_head(&bare[..colon].to_ascii_lowercase()) {
        return None;
    }
    Some(bare[colon + 1..].trim_start_matches('*').trim().to_string())
}

/// Filler such as `Sure!`, `Let me know if...` or a bare `...:` lead-in.
fn is_chatter(line: &str) -> bool {
    let bare = bare_line(line);
    let lower = bare.to_ascii_lowercase();
    if CHATTER_OPENERS.iter().any(|p| starts_with_word(&lower, p)) {
        return true;
    }
    if bare.ends_with(':') && !conventional::is_bullet(bare) && !conventional::is_header(bare) {
        return true;
    }
    strip_label(line).is_some_and(|rest| rest.is_empty())
}

/// A candidate opens at the first block and at every later conventional header.
fn split_candidates(blocks: Vec<Block>) -> Vec<Vec<Block>> {
    let mut candidates: Vec<Vec<Block>> = Vec::new();
    for block in blocks {
        let opens = conventional::is_header(&block[0]);
        match candidates.last_mut() {
            Some(candidate) if !opens => candidate.push(block),
            _ => candidates.push(vec![block]),
        }
    }
    candidates
}

/// The first candidate whose summary is not a bullet, else the first.
fn pick_candidate(candidates: Vec<Vec<Block>>) -> Option<Vec<Block>> {
    let idx = candidates
        .iter()
        .position(|c| !conventional::is_bullet(&c[0][0]))
        .unwrap_or(0);
    candidates.into_iter().nth(idx)
}

fn clean_summary(line: &str) -> String {
    let line = line.trim_start_matches('#').trim();
    let line = line
        .strip_prefix("**")
        .and_then(|l| l.strip_suffix("**"))
        .unwrap_or(line);
    line.trim().to_string()
}

fn render(candidate: Vec<Block>) -> Option<String> {
    let mut blocks = candidate.into_iter();
    let mut first = blocks.next()?.into_iter();

    let summary = clean_summary(&first.next()?);
    if summary.is_empty() {
        return None;
    }

    let mut body: Vec<String> = Vec::new();
    let rest: Vec<String> = first.collect();
    if !rest.is_empty() {
        body.push(rest.join("\n"));
    }
    body.extend(blocks.map(|b| b.join("\n")));

    let mut message = summary;
    if !body.is_empty() {
        message.push_str("\n\n");
        message.push_str(&body.join("\n\n"));
    }
    Some(message)
}
