use std::future::Future;

use messboard_engine::Sweeper;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Messboard HTTP server.
pub struct MessboardServer {
    config: ServerConfig,
}

impl MessboardServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router over freshly opened backends (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        let state = AppState::from_config(self.config.clone())?;
        Ok(build_router(state))
    }

    /// Start serving requests with the background sweeper running, until
    /// Ctrl+C or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        self.config.validate()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve_with(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// Open event streams are ended when the signal fires so the graceful
    /// shutdown can finish.
    pub async fn serve_with<F>(self, listener: TcpListener, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.config.validate()?;
        let state = AppState::from_config(self.config.clone())?;
        let sweeper = Sweeper::spawn(state.engine.clone(), self.config.sweep_interval());
        let app = build_router(state.clone());

        info!("Messboard server listening on {}", listener.local_addr()?);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                state.begin_shutdown();
            })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        sweeper.shutdown().await;
        info!("Messboard server stopped");
        served
    }
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    #[test]
    fn server_construction() {
        let server = MessboardServer::new(ServerConfig::default());
        assert_eq!(server.config().bind_addr, "127.0.0.1:5000".parse().unwrap());
    }

    #[test]
    fn router_builds() {
        let server = MessboardServer::new(ServerConfig::default());
        assert!(server.router().is_ok());
    }

    #[tokio::test]
    async fn invalid_config_refuses_to_serve() {
        let server = MessboardServer::new(ServerConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        });
        assert!(matches!(server.serve().await, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn shutdown_completes_with_event_stream_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = MessboardServer::new(ServerConfig::default());
        let task = tokio::spawn(server.serve_with(listener, async move {
            let _ = stopped.await;
        }));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /events HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut buf = [0u8; 512];
        let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
            .await
            .expect("no response headers")
            .unwrap();
        let head = String::from_utf8_lossy(&buf[..n]);
        assert!(head.starts_with("HTTP/1.1 200"), "{head}");

        stop.send(()).unwrap();
        let served = tokio::time::timeout(Duration::from_secs(3), task)
            .await
            .expect("server hung with an event stream open")
            .unwrap();
        assert!(served.is_ok());
    }
}
