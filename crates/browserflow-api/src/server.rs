//! HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::error::InterfaceError;
use crate::http::routes::create_router;
use crate::state::AppState;

/// Listen address.
#[derive(Debug, Clone)]
pub struct InterfaceConfig {
    pub host: String,
    pub port: u16,
}

impl InterfaceConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 8080)
    }
}

/// The API server.
pub struct ApiServer {
    config: InterfaceConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: InterfaceConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    pub fn addr(&self) -> String {
        self.config.addr()
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), InterfaceError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = create_router(self.state.clone())?;

        let addr: SocketAddr = self
            .addr()
            .parse()
            .map_err(|_| InterfaceError::InvalidAddress(self.addr()))?;
        let listener = TcpListener::bind(addr).await?;

        info!(
            environment = %self.state.environment(),
            "BrowserFlow API listening on {}",
            addr
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("BrowserFlow API stopped");
        Ok(())
    }
}
