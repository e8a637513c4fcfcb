use crate::error::CommaitError;
use crate::git::Repo;

/// Staged changes for the current run.
#[derive(Debug, Clone)]
pub struct StagedDiff {
    pub text: String,
    pub files: Vec<String>,
}

/// Stage pending changes (unless told not to) and read the staged diff.
pub fn collect(repo: &Repo, stage: bool) -> Result<StagedDiff, CommaitError> {
    if stage {
        repo.stage_all()?;
    }

    let text = repo.staged_diff()?;
    if text.trim().is_empty() {
        return Err(CommaitError::NoChanges);
    }

    let files = changed_files(&text);
    log::info!("Found {} staged file(s)", files.len());
    Ok(StagedDiff { text, files })
}

/// Paths named by the `diff --git a/<old> b/<new>` headers, new side.
pub fn changed_files(diff: &str) -> Vec<String> {
    diff.lines()
        .filter_map(|line| line.strip_prefix("diff --git "))
        .filter_map(|rest| {
            // paths with spaces are ambiguous here; the " b/" split is good enough for display
            let (_, new) = rest.rsplit_once(" b/")?;
            Some(new.trim_matches('"').to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::TestRepo;

    #[test]
    fn extracts_changed_paths() {
        let diff = "diff --git a/src/main.rs b/src/main.rs\nindex 1..2 100644\n\
                    --- a/src/main.rs\n+++ b/src/main.rs\n@@ -1 +1 @@\n-a\n+b\n\
                    diff --git a/old.txt b/new.txt\nsimilarity index 100%\n";
        assert_eq!(changed_files(diff), vec!["src/main.rs", "new.txt"]);
    }

    #[test]
    fn clean_repository_has_no_changes() {
        let t = TestRepo::new();
        t.commit("a.txt", "feat: initial commit of the repository");

        let err = collect(&t.repo, true).unwrap_err();
        assert!(matches!(err, CommaitError::NoChanges), "{err:?}");
    }

    #[test]
    fn empty_repository_has_no_changes() {
        let t = TestRepo::new();
        let err = collect(&t.repo, true).unwrap_err();
        assert!(matches!(err, CommaitError::NoChanges), "{err:?}");
    }

    #[test]
    fn stages_untracked_files() {
        let t = TestRepo::new();
        t.commit("a.txt", "feat: initial commit of the repository");
        t.write("b.txt", "hello\n");

        let diff = collect(&t.repo, true).unwrap();
        assert_eq!(diff.files, vec!["b.txt"]);
        assert!(diff.text.contains("+hello"));
    }

    #[test]
    fn without_staging_only_the_index_counts() {
        let t = TestRepo::new();
        t.commit("a.txt", "feat: initial commit of the repository");
        t.write("b.txt", "hello\n");

        let err = collect(&t.repo, false).unwrap_err();
        assert!(matches!(err, CommaitError::NoChanges), "{err:?}");

        t.git(&["add", "b.txt"]);
        assert_eq!(collect(&t.repo, false).unwrap().files, vec!["b.txt"]);
    }
}
