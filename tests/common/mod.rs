use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::cargo;
use tempfile::TempDir;

/// Git identity and config isolation shared by the fixture and the binary under test.
const GIT_ENV: &[(&str, &str)] = &[
    ("GIT_CONFIG_NOSYSTEM", "1"),
    ("GIT_CONFIG_GLOBAL", "/dev/null"),
    ("GIT_AUTHOR_NAME", "Test"),
    ("GIT_AUTHOR_EMAIL", "test@example.com"),
    ("GIT_COMMITTER_NAME", "Test"),
    ("GIT_COMMITTER_EMAIL", "test@example.com"),
];

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// A fresh repository with one commit.
    pub fn new() -> Self {
        let fixture = Fixture {
            dir: TempDir::new().unwrap(),
        };
        fixture.git(&["init", "--quiet"]);
        fixture.write("README.md", "hello\n");
        fixture.git(&["add", "README.md"]);
        fixture.git(&["commit", "--quiet", "-m", "docs: add a readme for the project"]);
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) {
        fs::write(self.path().join(name), content).unwrap();
    }

    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(args)
            .envs(GIT_ENV.iter().copied())
            .output()
            .unwrap();
        assert!(output.status.success(), "git {args:?} failed: {output:?}");
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn commit_count(&self) -> usize {
        self.git(&["rev-list", "--count", "HEAD"]).trim().parse().unwrap()
    }

    /// The binary, run inside the fixture with no user config and an unreachable host.
    pub fn commait(&self) -> assert_cmd::Command {
        let mut cmd = cargo::cargo_bin_cmd!();
        cmd.current_dir(self.path())
            .envs(GIT_ENV.iter().copied())
            .env("COMMAIT_CONFIG", self.path().join("no-such-config.toml"))
            .env_remove("COMMAIT_MODEL")
            .env_remove("COMMAIT_LABEL")
            .env("OLLAMA_HOST", "http://127.0.0.1:9");
        cmd
    }
}
