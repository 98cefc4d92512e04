//! CLI test runner with fluent assertions.
//!
//! Provides infrastructure for executing the `petlink` binary and verifying
//! output, exit codes and JSON responses in robot mode.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::Value;

/// Main test runner for the `petlink` CLI binary.
///
/// # Example
///
/// ```ignore
/// let cli = CliRunner::new();
/// cli.run(&["list", "--robot"]).assert_success();
/// ```
pub struct CliRunner {
    binary_path: PathBuf,
    env_vars: HashMap<String, String>,
    working_dir: Option<PathBuf>,
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CliRunner {
    /// Create a new CLI runner pointing to the compiled `petlink` binary.
    #[must_use]
    pub fn new() -> Self {
        // CARGO_BIN_EXE_petlink is set by cargo test for binary crates
        let binary = env!("CARGO_BIN_EXE_petlink");
        Self {
            binary_path: PathBuf::from(binary),
            env_vars: HashMap::new(),
            working_dir: None,
        }
    }

    /// Add an environment variable for command execution.
    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env_vars.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the working directory for command execution.
    #[must_use]
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Execute the command with the given arguments.
    ///
    /// # Panics
    ///
    /// Panics if the command fails to spawn.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> CliResult {
        let start = Instant::now();

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd.env_remove("PETLINK_DB").env_remove("PETLINK_FORMAT");

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().expect("failed to execute petlink binary");

        CliResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            duration: start.elapsed(),
        }
    }

    /// Execute with `--robot` appended.
    #[must_use]
    pub fn run_robot(&self, args: &[&str]) -> CliResult {
        let mut full: Vec<&str> = args.to_vec();
        full.push("--robot");
        self.run(&full)
    }
}

/// Captured result of one CLI invocation.
#[derive(Debug)]
pub struct CliResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl CliResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success(),
            "expected success, got exit code {:?}\nstdout:\n{}\nstderr:\n{}",
            self.exit_code,
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.success(),
            "expected failure, got success\nstdout:\n{}",
            self.stdout
        );
        self
    }

    pub fn assert_stdout_contains(&self, needle: &str) -> &Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {needle:?}:\n{}",
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, needle: &str) -> &Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {needle:?}:\n{}",
            self.stderr
        );
        self
    }

    /// Parse stdout as JSON.
    ///
    /// # Panics
    ///
    /// Panics when stdout is not valid JSON.
    pub fn json(&self) -> Value {
        serde_json::from_str(self.stdout.trim())
            .unwrap_or_else(|_| panic!("stdout is not valid JSON:\n{}", self.stdout))
    }

    /// Parse stderr as JSON (robot-mode errors are emitted to stderr).
    pub fn stderr_json(&self) -> Value {
        serde_json::from_str(self.stderr.trim())
            .unwrap_or_else(|_| panic!("stderr is not valid JSON:\n{}", self.stderr))
    }
}
