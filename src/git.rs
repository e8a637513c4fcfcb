use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command as GitCommand, ExitStatus, Stdio};

use crate::error::CommaitError;

/// A repository working directory that git commands run against.
#[derive(Debug, Clone)]
pub struct Repo {
    workdir: PathBuf,
}

/// One record of `git log`, before any quality filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub short_hash: String,
    pub message: String,
}

/// Outcome of an interactive `git commit`.
#[derive(Debug)]
pub struct CommitRun {
    pub status: ExitStatus,
    /// Everything git (and its hooks) wrote to stderr.
    pub stderr: String,
}

const FIELD_SEP: char = '\u{1f}';
const RECORD_SEP: char = '\u{1e}';

impl Repo {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// The repository containing the current directory.
    pub fn current() -> Result<Self, CommaitError> {
        let cwd = std::env::current_dir()?;
        let repo = Self::new(cwd);
        repo.git_dir()?;
        Ok(repo)
    }

    fn command(&self) -> GitCommand {
        let mut cmd = GitCommand::new("git");
        cmd.arg("-C").arg(&self.workdir);
        cmd
    }

    /// Run a git command and capture stdout as String.
    pub fn output(&self, args: &[&str]) -> Result<String, CommaitError> {
        let output = self
            .command()
            .args(args)
            .output()
            .map_err(|e| CommaitError::Git {
                command: args.join(" "),
                message: format!("could not run git: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| format!("exited with status {:?}", output.status.code()));
            return Err(CommaitError::Git {
                command: args.join(" "),
                message,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Get the absolute path to the Git directory (e.g. .git).
    pub fn git_dir(&self) -> Result<PathBuf, CommaitError> {
        let dir = self.output(&["rev-parse", "--absolute-git-dir"])?;
        Ok(PathBuf::from(dir.trim()))
    }

    /// Whether HEAD points at a commit yet.
    pub fn has_commits(&self) -> bool {
        self.output(&["rev-parse", "--verify", "--quiet", "HEAD"]).is_ok()
    }

    /// Stage all new, modified, and deleted files.
    pub fn stage_all(&self) -> Result<(), CommaitError> {
        log::info!("Staging all changes");
        self.output(&["add", "-A"])?;
        Ok(())
    }

    /// Get the full staged diff.
    pub fn staged_diff(&self) -> Result<String, CommaitError> {
        self.output(&["diff", "--cached", "--no-color", "--no-ext-diff"])
    }

    /// Read up to `count` commit messages, newest first, after skipping `skip`.
    pub fn log_entries(&self, skip: usize, count: usize) -> Result<Vec<LogEntry>, CommaitError> {
        if count == 0 || !self.has_commits() {
            return Ok(vec![]);
        }

        let skip_arg = format!("--skip={skip}");
        let count_arg = format!("--max-count={count}");
        let output = self.output(&[
            "log",
            "--no-color",
            &skip_arg,
            &count_arg,
            "--format=%h%x1f%B%x1e",
        ])?;

        Ok(parse_log(&output))
    }

    /// Run `git commit --edit -F <file>` with the editor on the terminal.
    ///
    /// stderr is passed through line by line and also captured, so callers can
    /// tell an aborted edit from a refusing hook.
    pub fn commit_with_editor(&self, message_file: &Path) -> Result<CommitRun, CommaitError> {
        let mut child = self
            .command()
            .args(["commit", "--edit", "-F"])
            .arg(message_file)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommaitError::Git {
                command: "commit --edit".into(),
                message: format!("could not run git: {e}"),
            })?;

        let mut stderr = String::new();
        if let Some(pipe) = child.stderr.take() {
            for line in BufReader::new(pipe).lines() {
                let line = line?;
                eprintln!("{line}");
                stderr.push_str(&line);
                stderr.push('\n');
            }
        }

        let status = child.wait()?;
        Ok(CommitRun { status, stderr })
    }
}

/// Split `git log` output written with unit/record separators.
pub fn parse_log(output: &str) -> Vec<LogEntry> {
    output
        .split(RECORD_SEP)
        .filter_map(|record| {
            let record = record.trim_start_matches(['\n', '\r']);
            let (hash, message) = record.split_once(FIELD_SEP)?;
            let hash = hash.trim();
            if hash.is_empty() {
                return None;
            }
            Some(LogEntry {
                short_hash: hash.to_string(),
                message: message.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::fs;
    use std::process::Command;

    use tempfile::TempDir;

    use super::Repo;

    /// A throwaway repository with a fixed identity and no global config.
    pub struct TestRepo {
        pub dir: TempDir,
        pub repo: Repo,
    }

    impl TestRepo {
        pub fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let repo = Repo::new(dir.path());
            let test_repo = TestRepo { dir, repo };
            test_repo.git(&["init", "--quiet"]);
            test_repo
        }

        pub fn git(&self, args: &[&str]) -> String {
            let output = Command::new("git")
                .arg("-C")
                .arg(self.dir.path())
                .args(args)
                .env("GIT_CONFIG_NOSYSTEM", "1")
                .env("GIT_CONFIG_GLOBAL", "/dev/null")
                .env("GIT_AUTHOR_NAME", "Test")
                .env("GIT_AUTHOR_EMAIL", "test@example.com")
                .env("GIT_COMMITTER_NAME", "Test")
                .env("GIT_COMMITTER_EMAIL", "test@example.com")
                .output()
                .unwrap();
            assert!(output.status.success(), "git {args:?} failed: {output:?}");
            String::from_utf8_lossy(&output.stdout).to_string()
        }

        pub fn write(&self, name: &str, content: &str) {
            fs::write(self.dir.path().join(name), content).unwrap();
        }

        /// Commit a new file with the given message.
        pub fn commit(&self, name: &str, message: &str) {
            self.write(name, message);
            self.git(&["add", name]);
            self.git(&["commit", "--quiet", "-m", message]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::TestRepo;
    use super::*;

    #[test]
    fn parses_multi_paragraph_records() {
        let output = "abc1234\u{1f}feat: add parser\n\n- support nested rules\n\u{1e}\n\
                      def5678\u{1f}fix: typo\n\u{1e}\n";
        let entries = parse_log(output);
        assert_eq!(
            entries,
            vec![
                LogEntry {
                    short_hash: "abc1234".into(),
                    message: "feat: add parser\n\n- support nested rules".into(),
                },
                LogEntry {
                    short_hash: "def5678".into(),
                    message: "fix: typo".into(),
                },
            ]
        );
    }

    #[test]
    fn empty_repository_has_no_log() {
        let t = TestRepo::new();
        assert!(!t.repo.has_commits());
        assert!(t.repo.log_entries(0, 10).unwrap().is_empty());
    }

    #[test]
    fn log_entries_respects_skip_and_count() {
        let t = TestRepo::new();
        t.commit("a.txt", "feat: first commit in history");
        t.commit("b.txt", "feat: second commit in history");
        t.commit("c.txt", "feat: third commit in history");

        let newest = t.repo.log_entries(0, 1).unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].message, "feat: third commit in history");

        let older = t.repo.log_entries(1, 10).unwrap();
        assert_eq!(older.len(), 2);
        assert_eq!(older[1].message, "feat: first commit in history");
    }

    #[test]
    fn failing_command_reports_stderr() {
        let t = TestRepo::new();
        let err = t.repo.output(&["rev-parse", "--verify", "no-such-ref"]).unwrap_err();
        assert!(matches!(err, CommaitError::Git { .. }), "{err:?}");
    }

    #[test]
    fn git_dir_is_absolute() {
        let t = TestRepo::new();
        assert!(t.repo.git_dir().unwrap().is_absolute());
    }
}
