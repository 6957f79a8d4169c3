pub mod config;
pub mod core;
pub mod interfaces;
pub mod platform;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::config::AgentConfig;
use crate::core::cache::CommandStore;
use crate::core::cache::embedding::OllamaEmbedder;
use crate::core::exec::SandboxedExecutor;
use crate::core::llm::providers::OllamaProvider;
use crate::core::nlu::IntentParser;
use crate::core::orchestrator::CommandAgent;
use crate::core::synth::ScriptSynthesizer;
use crate::interfaces::web::ApiServer;

/// Wire up every component from the config and run the API server until it exits.
pub async fn run() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let config = AgentConfig::load_default()?;
    info!(
        "Starting local command agent (nlu: {}, codegen: {})",
        config.nlu_model, config.codegen_model
    );

    let llm = Arc::new(OllamaProvider::new(config.ollama_url.clone()));

    let embedder = Arc::new(OllamaEmbedder::new(
        llm.clone(),
        config.embedding_model.clone(),
        config.embedding_dim,
    ));
    let store = CommandStore::open(&config.db_path(), embedder).await?;

    let agent = CommandAgent::new(
        IntentParser::new(llm.clone(), config.nlu_model.clone()),
        store,
        ScriptSynthesizer::new(
            llm,
            config.codegen_model.clone(),
            config.scripts_dir(),
            config.allowed_commands.clone(),
        ),
        SandboxedExecutor::new(Duration::from_secs(config.exec_timeout_secs)),
        config.match_threshold,
    );

    ApiServer::new(Arc::new(agent), config.api_host.clone(), config.api_port)
        .serve()
        .await
}
