use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::platform::{NativePlatform, Platform};

/// Agent configuration. Every component receives what it needs at
/// construction; nothing reads this through ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model used to translate natural language into structured intents.
    pub nlu_model: String,
    /// Model used to synthesize scripts.
    pub codegen_model: String,
    /// Model used to embed command descriptions for similarity search.
    pub embedding_model: String,
    /// Dimension of the embedding vectors; must match the embedding model.
    pub embedding_dim: usize,
    /// Base URL of the local ollama daemon.
    pub ollama_url: String,
    /// Minimum similarity in [0,1] for a cache hit.
    pub match_threshold: f32,
    /// Wall-clock limit for script execution, in seconds.
    pub exec_timeout_secs: u64,
    pub api_host: String,
    pub api_port: u16,
    /// Root data directory. Defaults to the platform data dir (`~/.lca`).
    pub data_dir: Option<PathBuf>,
    /// Command names the synthesizer is told it may use.
    pub allowed_commands: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            nlu_model: "phi3".to_string(),
            codegen_model: "qwen2.5-coder".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            ollama_url: "http://127.0.0.1:11434".to_string(),
            match_threshold: 0.85,
            exec_timeout_secs: 30,
            api_host: "127.0.0.1".to_string(),
            api_port: 8765,
            data_dir: None,
            allowed_commands: [
                "open",
                "start",
                "osascript",
                "say",
                "spotify",
                "curl",
                "python3",
                "node",
                "echo",
                "caffeinate",
                "pmset",
                "brightness",
                "shortcuts",
                "afplay",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl AgentConfig {
    /// Load from `LCA_CONFIG` if set, else `<data_dir>/config.toml` if it
    /// exists, else defaults.
    pub fn load_default() -> Result<Self> {
        if let Ok(path) = std::env::var("LCA_CONFIG") {
            return Self::from_file(Path::new(&path));
        }
        let default_path = NativePlatform::data_dir().join("config.toml");
        if default_path.exists() {
            return Self::from_file(&default_path);
        }
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        let config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing config file {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(NativePlatform::data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("commands.db")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.data_dir().join("scripts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_operating_values() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.match_threshold, 0.85);
        assert_eq!(cfg.exec_timeout_secs, 30);
        assert_eq!(cfg.api_port, 8765);
        assert!(cfg.allowed_commands.iter().any(|c| c == "open"));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: AgentConfig = toml::from_str("match_threshold = 0.7\napi_port = 9000\n").unwrap();
        assert_eq!(cfg.match_threshold, 0.7);
        assert_eq!(cfg.api_port, 9000);
        assert_eq!(cfg.nlu_model, "phi3");
    }

    #[test]
    fn derived_paths_hang_off_data_dir() {
        let cfg = AgentConfig {
            data_dir: Some(PathBuf::from("/tmp/lca-test")),
            ..Default::default()
        };
        assert_eq!(cfg.db_path(), PathBuf::from("/tmp/lca-test/commands.db"));
        assert_eq!(cfg.scripts_dir(), PathBuf::from("/tmp/lca-test/scripts"));
    }
}
