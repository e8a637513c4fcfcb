//! Recognizers for conventional-commit headers and review trailers.

use std::sync::LazyLock;

use regex_lite::Regex;

// type(scope)!: description
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)(?:\(([^)]+)\))?(!)?: +(\S.*)$").expect("header pattern is valid")
});

/// Commit types a header may open with.
const TYPES: &[&str] = &[
    "build", "chore", "ci", "docs", "feat", "fix", "perf", "refactor", "revert", "style", "test",
];

/// Trailers added by review tooling; they carry no style worth imitating.
const TRAILERS: &[&str] = &[
    "Change-Id:",
    "Reviewed-on:",
    "Reviewed-by:",
    "Tested-by:",
    "Signed-off-by:",
    "Co-authored-by:",
];

/// `type(scope)!: description` with a known commit type; `Note: ...` is not a header.
pub fn is_header(line: &str) -> bool {
    HEADER
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .is_some_and(|ty| TYPES.iter().any(|t| ty.as_str().eq_ignore_ascii_case(t)))
}

/// The description part of a conventional header, or the whole line.
pub fn description(line: &str) -> &str {
    let line = line.trim();
    if !is_header(line) {
        return line;
    }
    HEADER
        .captures(line)
        .and_then(|caps| caps.get(4))
        .map(|m| m.as_str())
        .unwrap_or(line)
}

pub fn is_trailer(line: &str) -> bool {
    let line = line.trim_start();
    TRAILERS
        .iter()
        .any(|t| line.get(..t.len()).is_some_and(|p| p.eq_ignore_ascii_case(t)))
}

/// Drop trailer lines and surrounding whitespace from a message.
pub fn strip_trailers(message: &str) -> String {
    message
        .lines()
        .filter(|l| !is_trailer(l))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn is_bullet(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("- ") || line.starts_with("* ") || line.starts_with("+ ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_headers() {
        assert!(is_header("feat: add parser"));
        assert!(is_header("fix(cli): handle --h"));
        assert!(is_header("refactor!: drop legacy flag"));
        assert!(!is_header("Add parser"));
        assert!(!is_header("feat:"));
        assert!(!is_header("- feat: bullet"));
    }

    #[test]
    fn colon_prose_is_not_a_header() {
        assert!(!is_header("Note: the old parser only handled one level."));
        assert!(!is_header("Message queue: drop stale subscribers"));
        assert!(is_header("Fix: capitalized types still count"));
        assert_eq!(description("Note: keep as is"), "Note: keep as is");
    }

    #[test]
    fn extracts_description() {
        assert_eq!(description("fix(cli): handle --h"), "handle --h");
        assert_eq!(description("Add parser"), "Add parser");
    }

    #[test]
    fn strips_trailers_case_insensitively() {
        let msg = "fix: crash on empty log\n\n- guard index\n\nsigned-off-by: A <a@b.c>\nChange-Id: I123";
        assert_eq!(strip_trailers(msg), "fix: crash on empty log\n\n- guard index");
    }
}
