use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::core::intent::Intent;
use crate::core::llm::LlmProvider;
use crate::platform::{NativePlatform, Platform};

/// Substrings that disqualify a generated script, checked case-insensitively.
/// A conservative textual pre-filter, not a sandbox: it catches the obvious
/// destructive commands but offers no semantic isolation guarantee.
const DENYLIST: &[&str] = &[
    "rm ", "del ", "format", "chmod", "sudo", "dd ", ">/", "rf ", "sleep ",
];

/// Script family the generation prompt targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    /// `#!/bin/bash` scripts, `.sh`.
    Posix,
    /// `@echo off` batch files, `.bat`.
    Batch,
}

impl PlatformFamily {
    pub fn native() -> Self {
        if NativePlatform::script_extension() == "bat" {
            Self::Batch
        } else {
            Self::Posix
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Posix => "sh",
            Self::Batch => "bat",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            Self::Posix => "macOS/Linux",
            Self::Batch => "Windows",
        }
    }

    fn worked_examples(self) -> &'static str {
        match self {
            Self::Posix => {
                r#"Example 1:
Intent: {"action": "open_app", "app": "spotify"}
Script:
#!/bin/bash
open -a "Spotify"

Example 2:
Intent: {"action": "play_music", "playlist": "chill"}
Script:
#!/bin/bash
osascript -e 'tell application "Spotify" to play track "spotify:playlist:37i9dQZF1DX"'"#
            }
            Self::Batch => {
                r#"Example:
Intent: {"action": "open_app", "app": "chrome"}
Script:
@echo off
start chrome"#
            }
        }
    }
}

/// Generates, safety-checks, and persists scripts for unmatched intents.
pub struct ScriptSynthesizer {
    llm: Arc<dyn LlmProvider>,
    model: String,
    scripts_dir: PathBuf,
    allowed_commands: Vec<String>,
}

impl ScriptSynthesizer {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        model: String,
        scripts_dir: PathBuf,
        allowed_commands: Vec<String>,
    ) -> Self {
        Self {
            llm,
            model,
            scripts_dir,
            allowed_commands,
        }
    }

    /// Generate and persist a script for the intent, targeting the native
    /// platform family. Generation failure, extraction failure, and safety
    /// rejection are all recoverable misses returning `Ok(None)`; only I/O
    /// failure during persistence is a hard error.
    pub async fn synthesize(&self, intent: &Intent) -> Result<Option<PathBuf>> {
        self.synthesize_for(intent, PlatformFamily::native()).await
    }

    pub async fn synthesize_for(
        &self,
        intent: &Intent,
        family: PlatformFamily,
    ) -> Result<Option<PathBuf>> {
        let prompt = self.build_prompt(intent, family);

        let response = match self.llm.generate(&self.model, &prompt, 0.2).await {
            Ok(text) => text,
            Err(e) => {
                error!("script generation failed: {}", e);
                return Ok(None);
            }
        };

        let Some(script) = extract_code(&response) else {
            error!("failed to extract code from model response");
            return Ok(None);
        };

        if !passes_safety_gate(&script) {
            warn!("generated script failed safety check");
            return Ok(None);
        }

        let path = self
            .save_script(&intent.action, &script, family.extension())
            .await?;
        info!("generated script: {:?}", path);
        Ok(Some(path))
    }

    fn build_prompt(&self, intent: &Intent, family: PlatformFamily) -> String {
        let params = serde_json::to_string(&intent.params).unwrap_or_else(|_| "{}".to_string());
        format!(
            r#"You are a script generator for {platform}. Generate a safe, executable script for this intent.

Intent: {intent}
Action: {action}
Parameters: {params}

Requirements:
- Write ONLY the script code, no explanation
- Use only safe commands: {allowed}
- Make it executable and reliable
- Handle errors gracefully
- No destructive operations (rm, del, format, etc.)
- Do NOT use sleep or wait commands - keep scripts instant
- Be accurate with app names (Music.app for Apple Music, Spotify.app for Spotify)

{examples}

Now generate the script:"#,
            platform = family.display_name(),
            intent = intent.search_text(),
            action = intent.action,
            params = params,
            allowed = self.allowed_commands.join(", "),
            examples = family.worked_examples(),
        )
    }

    /// Content-addressed persistence: `{action}_{hash8}.{ext}`, so identical
    /// regenerations land on the same file and different bodies never collide
    /// for the same action.
    async fn save_script(&self, action: &str, content: &str, ext: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.scripts_dir).await?;

        let digest = Sha256::digest(content.as_bytes());
        let hash8 = &hex::encode(digest)[..8];
        let path = self.scripts_dir.join(format!("{}_{}.{}", action, hash8, ext));

        tokio::fs::write(&path, content).await?;
        if ext == "sh" {
            NativePlatform::set_executable(&path);
        }
        Ok(path)
    }
}

/// Pull an executable script out of a raw model response.
///
/// Prefers fenced code blocks (with any leading language tag stripped) whose
/// content starts with a platform header marker; falls back to the whole
/// trimmed response only if it itself starts with one.
pub fn extract_code(response: &str) -> Option<String> {
    if response.contains("```") {
        for block in response.split("```").skip(1).step_by(2) {
            let block = block.trim();
            let candidate = match block.lines().next() {
                Some(first) if is_language_tag(first.trim()) => {
                    block.splitn(2, '\n').nth(1).unwrap_or("").trim()
                }
                _ => block,
            };
            if starts_with_script_marker(candidate) {
                return Some(candidate.to_string());
            }
        }
    }

    let trimmed = response.trim();
    if trimmed.starts_with("#!/") || trimmed.starts_with("@echo") {
        return Some(trimmed.to_string());
    }

    None
}

fn is_language_tag(line: &str) -> bool {
    matches!(line, "bash" | "sh" | "bat" | "shell" | "batch")
}

fn starts_with_script_marker(code: &str) -> bool {
    code.starts_with("#!") || code.starts_with("@echo")
}

/// Denylist check over the lowercased script body.
pub fn passes_safety_gate(script: &str) -> bool {
    let lowered = script.to_lowercase();
    for danger in DENYLIST {
        if lowered.contains(danger) {
            warn!("unsafe command detected: {}", danger.trim());
            return false;
        }
    }
    true
}
