pub mod cache;
pub mod exec;
pub mod intent;
pub mod llm;
pub mod nlu;
pub mod orchestrator;
pub mod synth;
