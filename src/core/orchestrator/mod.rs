use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::cache::CommandStore;
use crate::core::cache::types::{CommandRecord, HistoryEntry};
use crate::core::exec::SandboxedExecutor;
use crate::core::intent::Intent;
use crate::core::nlu::IntentParser;
use crate::core::synth::ScriptSynthesizer;

/// Terminal result of one resolution: what the query meant, what it matched
/// or produced, and what happened when it ran.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub intent: Intent,
    pub matched_command: Option<String>,
    pub script_path: Option<String>,
    pub executed: bool,
    pub output: Option<String>,
    pub generated: bool,
}

impl CommandResponse {
    fn new(intent: Intent) -> Self {
        Self {
            intent,
            matched_command: None,
            script_path: None,
            executed: false,
            output: None,
            generated: false,
        }
    }
}

/// Sequences the resolution pipeline:
/// parse intent, query the cache, then either reuse the matched script or
/// synthesize and register a new one, optionally executing the result.
pub struct CommandAgent {
    parser: IntentParser,
    store: CommandStore,
    synthesizer: ScriptSynthesizer,
    executor: SandboxedExecutor,
    match_threshold: f32,
}

impl CommandAgent {
    pub fn new(
        parser: IntentParser,
        store: CommandStore,
        synthesizer: ScriptSynthesizer,
        executor: SandboxedExecutor,
        match_threshold: f32,
    ) -> Self {
        Self {
            parser,
            store,
            synthesizer,
            executor,
            match_threshold,
        }
    }

    /// Resolve a natural-language request end to end. Recoverable misses
    /// (no cache hit, no generated script) surface as empty response fields;
    /// only resource errors (execution, persistence) propagate.
    pub async fn resolve(&self, query: &str, auto_execute: bool) -> Result<CommandResponse> {
        info!("parsing query: {}", query);
        let intent = self.parser.parse_intent(query).await;

        let mut response = CommandResponse::new(intent.clone());

        match self.store.find(&intent, self.match_threshold).await? {
            Some(record) => {
                info!("matched command: {}", record.name);
                response.matched_command = Some(record.name.clone());
                response.script_path = Some(record.file_path.clone());

                if auto_execute {
                    let outcome = self
                        .executor
                        .execute(std::path::Path::new(&record.file_path), &intent)
                        .await?;
                    response.executed = true;
                    response.output = Some(outcome.into_text());
                    self.store.record_used(&record.name).await?;
                }
            }
            None => {
                info!("no match found, generating new script...");
                if let Some(script_path) = self.synthesizer.synthesize(&intent).await? {
                    response.generated = true;
                    response.script_path = Some(script_path.to_string_lossy().to_string());

                    // Duplicate names are non-fatal: the first registration wins
                    // and the freshly generated script is still usable.
                    if let Err(e) = self.store.add(&intent.action, query, &script_path).await {
                        warn!("failed to register command {}: {}", intent.action, e);
                    }

                    if auto_execute {
                        let outcome = self.executor.execute(&script_path, &intent).await?;
                        response.executed = true;
                        response.output = Some(outcome.into_text());
                    }
                }
            }
        }

        let command_name = response
            .matched_command
            .as_deref()
            .or(response.generated.then_some(intent.action.as_str()));
        self.store
            .append_history(query, &intent, command_name, response.executed)
            .await;

        Ok(response)
    }

    pub async fn list_commands(&self) -> Result<Vec<CommandRecord>> {
        self.store.list_all().await
    }

    pub async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.store.recent_history(limit).await
    }
}
