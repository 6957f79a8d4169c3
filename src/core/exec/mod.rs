use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::core::intent::Intent;

/// Result of running a script. A timeout is a distinguished recoverable
/// outcome, not an error; callers that need the legacy untyped channel
/// render it with [`ExecOutcome::into_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Completed { output: String, exit_ok: bool },
    TimedOut { timeout_secs: u64 },
}

impl ExecOutcome {
    /// Compatibility rendering: completed output verbatim, timeouts as the
    /// fixed `ERROR:`-prefixed message carrying the configured limit.
    pub fn into_text(self) -> String {
        match self {
            Self::Completed { output, .. } => output,
            Self::TimedOut { timeout_secs } => {
                format!("ERROR: script timed out after {}s", timeout_secs)
            }
        }
    }
}

/// Runs script files as child processes with intent parameters injected as
/// `LCA_*` environment variables and a hard wall-clock timeout.
pub struct SandboxedExecutor {
    timeout: Duration,
}

impl SandboxedExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Execute a script file and capture its combined output.
    ///
    /// A missing file or an unsupported extension is a hard error; a
    /// non-zero exit is not (the full output is still returned).
    pub async fn execute(&self, script_path: &Path, intent: &Intent) -> Result<ExecOutcome> {
        if !script_path.exists() {
            return Err(anyhow!("script not found: {:?}", script_path));
        }

        let mut cmd = interpreter_for(script_path)?;
        for (key, value) in intent.env_pairs() {
            cmd.env(key, value);
        }
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        info!("executing: {:?}", script_path);
        let child = cmd.spawn()?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                // kill_on_drop reaps the child when the future is dropped.
                error!(
                    "script timeout after {}s: {:?}",
                    self.timeout.as_secs(),
                    script_path
                );
                return Ok(ExecOutcome::TimedOut {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            warn!("script exited with status {}", output.status);
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ExecOutcome::Completed {
            output: combined.trim().to_string(),
            exit_ok: output.status.success(),
        })
    }
}

/// Fixed interpreter mapping by file extension. Anything else is a hard
/// error surfaced to the caller.
fn interpreter_for(script_path: &Path) -> Result<Command> {
    let ext = script_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let mut cmd = match ext {
        "sh" => Command::new("bash"),
        "bat" => {
            let mut c = Command::new("cmd");
            c.arg("/c");
            c
        }
        "py" => Command::new("python3"),
        other => return Err(anyhow!("unsupported script type: .{}", other)),
    };
    cmd.arg(script_path);
    Ok(cmd)
}
