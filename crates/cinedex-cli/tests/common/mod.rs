//! Shared test utilities for cinedex-cli integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway catalog: its own data dir and config file.
pub struct TestCatalog {
    pub dir: TempDir,
}

impl TestCatalog {
    /// Catalog with semantic search switched off.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::write(dir.path().join("config.yaml"), "semantic:\n  enabled: false\n")
            .expect("write config");
        Self { dir }
    }

    /// Catalog whose embedding model points at a directory with no model files.
    pub fn with_missing_model() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let missing = dir.path().join("no-model");
        let config = format!(
            "semantic:\n  enabled: true\n  backend: simple\nembedding:\n  local_path: {}\n",
            missing.display()
        );
        fs::write(dir.path().join("config.yaml"), config).expect("write config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.yaml")
    }

    /// `cinedex` pointed at this catalog, with a clean environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = cinedex_cmd();
        cmd.env_remove("CINEDEX_DATA_DIR")
            .env_remove("CINEDEX_SEMANTIC_ENABLED")
            .env_remove("CINEDEX_VERBOSE")
            .env_remove("CINEDEX_QUIET")
            .env("CINEDEX_CONFIG", self.config_path())
            .env("CINEDEX_MODELS_DIR", self.path().join("models"))
            .env("NO_COLOR", "1")
            .arg("--data-dir")
            .arg(self.path());
        cmd
    }

    /// Add a movie and return its id.
    pub fn add(&self, args: &[&str]) -> i64 {
        let output = self
            .cmd()
            .arg("add")
            .args(args)
            .arg("--json")
            .output()
            .expect("run cinedex add");
        assert!(output.status.success(), "add failed: {:?}", output);
        let movie: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("add prints JSON");
        movie["id"].as_i64().expect("movie id")
    }

    /// Run a command with `--json` and parse stdout.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .output()
            .expect("run cinedex");
        assert!(output.status.success(), "command failed: {:?}", output);
        serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
    }
}

/// Get a Command for the cinedex binary.
#[allow(deprecated)]
pub fn cinedex_cmd() -> Command {
    Command::cargo_bin("cinedex").expect("cinedex binary should exist")
}
