use std::fs;
use std::path::PathBuf;

use crate::error::CommaitError;
use crate::git::Repo;

/// Copy of the generated message that survives a cancelled edit.
pub const BACKUP_FILE: &str = "COMMAIT_EDITMSG";

/// What git prints when the user backed out of the editor.
const CANCEL_MARKERS: &[&str] = &[
    "Aborting commit due to empty commit message",
    "Aborting commit; you did not edit the message",
    "There was a problem with the editor",
];

/// Write the message to `.git/COMMAIT_EDITMSG`.
///
/// `git commit -F` reads it from there and fills `COMMIT_EDITMSG` itself; the
/// file is left in place so the text survives a cancelled edit.
pub fn write_message(repo: &Repo, message: &str) -> Result<PathBuf, CommaitError> {
    let backup = repo.git_dir()?.join(BACKUP_FILE);
    fs::write(&backup, format!("{message}\n"))?;

    log::debug!("Wrote commit message to {}", backup.display());
    Ok(backup)
}

/// Pre-fill the commit and let the user confirm it in their editor.
///
/// Emptying the message or quitting the editor with an error ends the run as
/// [`CommaitError::UserCancelled`]. Any other refusal, such as a failing
/// `pre-commit` hook, is a [`CommaitError::Git`] failure.
pub fn commit_with_edit(repo: &Repo, message: &str) -> Result<(), CommaitError> {
    let path = write_message(repo, message)?;
    let run = repo.commit_with_editor(&path)?;

    if run.status.success() {
        return Ok(());
    }
    log::debug!("git commit exited with {}", run.status);

    if is_cancel(&run.stderr) {
        return Err(CommaitError::UserCancelled { path });
    }
    let message = run
        .stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("exited with {}", run.status));
    Err(CommaitError::Git {
        command: "commit --edit".into(),
        message,
    })
}

fn is_cancel(stderr: &str) -> bool {
    CANCEL_MARKERS.iter().any(|m| stderr.contains(m))
}
