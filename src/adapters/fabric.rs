//! Fabric adapter for narration summaries.
//!
//! Calls the `fabric` CLI directly, piping the raw article text to stdin and
//! collecting the pattern output from stdout.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::Summarizer;

/// Default pattern used to turn an article into a spoken-style summary
pub const DEFAULT_PATTERN: &str = "summarize";

/// Summarizer backed by a fabric subprocess
pub struct FabricSummarizer {
    /// Path to the fabric binary
    binary_path: String,

    /// Pattern to run
    pattern: String,

    /// Pinned model identifier, passed as `-m`
    model: Option<String>,

    /// Upper bound on one invocation
    call_timeout: Duration,
}

impl FabricSummarizer {
    /// Create a summarizer, preferring the Homebrew `fabric-ai` binary name
    pub fn new(pattern: impl Into<String>, model: Option<String>, call_timeout: Duration) -> Self {
        let binary_path = if std::process::Command::new("fabric-ai")
            .arg("--help")
            .output()
            .is_ok()
        {
            "fabric-ai".to_string()
        } else {
            "fabric".to_string()
        };

        Self {
            binary_path,
            pattern: pattern.into(),
            model,
            call_timeout,
        }
    }

    /// Use a specific binary instead of probing for one
    pub fn with_binary_path(mut self, binary_path: impl Into<String>) -> Self {
        self.binary_path = binary_path.into();
        self
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec!["-p".to_string(), self.pattern.clone()];
        if let Some(model) = &self.model {
            args.push("-m".to_string());
            args.push(model.clone());
        }
        args
    }
}

#[async_trait]
impl Summarizer for FabricSummarizer {
    fn name(&self) -> &str {
        "fabric"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let mut child = Command::new(&self.binary_path)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| {
                format!(
                    "Failed to spawn fabric process for pattern '{}'",
                    self.pattern
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .context("Failed to write to fabric stdin")?;
            // Dropping stdin signals EOF
        }

        let output = timeout(self.call_timeout, child.wait_with_output())
            .await
            .with_context(|| {
                format!(
                    "Fabric pattern '{}' timed out after {:?}",
                    self.pattern, self.call_timeout
                )
            })?
            .with_context(|| {
                format!(
                    "Failed to wait for fabric process for pattern '{}'",
                    self.pattern
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let exit_code = output.status.code().unwrap_or(-1);
            anyhow::bail!(
                "Fabric pattern '{}' failed with exit code {}: {}",
                self.pattern,
                exit_code,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("Fabric output is not valid UTF-8")
    }
}
