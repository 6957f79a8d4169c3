mod handlers;
mod router;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::core::orchestrator::CommandAgent;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) agent: Arc<CommandAgent>,
}

/// HTTP surface for the desktop front end: a thin layer over the agent.
pub struct ApiServer {
    agent: Arc<CommandAgent>,
    host: String,
    port: u16,
}

impl ApiServer {
    pub fn new(agent: Arc<CommandAgent>, host: String, port: u16) -> Self {
        Self { agent, host, port }
    }

    pub async fn serve(self) -> Result<()> {
        let app = router::build_router(AppState { agent: self.agent });
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("API server listening on http://{}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
