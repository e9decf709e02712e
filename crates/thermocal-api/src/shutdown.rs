//! Graceful Shutdown
//!
//! On SIGINT (Ctrl+C) or SIGTERM the server stops accepting connections and
//! lets in-flight requests finish, for at most the configured timeout.
//!
//! ## Usage
//!
//! ```ignore
//! let router = create_router(state, &AllowedOrigins::default());
//! serve_with_shutdown(router, 5000, GracefulShutdown::default()).await?;
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::DEFAULT_SHUTDOWN_TIMEOUT_SECS;

/// Configuration for graceful shutdown behavior
#[derive(Debug, Clone)]
pub struct GracefulShutdown {
    /// Maximum time to wait for in-flight requests to complete
    pub timeout: Duration,
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl GracefulShutdown {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// What ended the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// Received SIGINT (Ctrl+C)
    SigInt,
    /// Received SIGTERM
    SigTerm,
    /// Requested by the embedding program
    Manual,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SigInt => write!(f, "SIGINT (Ctrl+C)"),
            Self::SigTerm => write!(f, "SIGTERM"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Completes when the process receives SIGINT or SIGTERM
pub async fn shutdown_signal() -> ShutdownSignal {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        ShutdownSignal::SigInt
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
        ShutdownSignal::SigTerm
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<ShutdownSignal>();

    tokio::select! {
        signal = ctrl_c => signal,
        signal = terminate => signal,
    }
}

/// Bind `0.0.0.0:port` and serve until SIGINT/SIGTERM
pub async fn serve_with_shutdown(
    router: axum::Router,
    port: u16,
    config: GracefulShutdown,
) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("🚀 Calibration API listening on {}", addr);
    info!("   Graceful shutdown timeout: {:?}", config.timeout);

    serve_until(listener, router, shutdown_signal(), config.timeout).await
}

/// Serve on an existing listener until `signal` resolves, then drain
/// in-flight requests for at most `timeout`
pub async fn serve_until<F>(
    listener: TcpListener,
    router: axum::Router,
    signal: F,
    timeout: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = ShutdownSignal> + Send + 'static,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = stop_rx.wait_for(|stop| *stop).await;
    });
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server => return result.map_err(std::io::Error::other)?,
        signal = signal => {
            info!("📴 Received {}, initiating graceful shutdown...", signal);
            let _ = stop_tx.send(true);
        }
    }

    match tokio::time::timeout(timeout, &mut server).await {
        Ok(result) => {
            result.map_err(std::io::Error::other)??;
            info!("👋 Server shut down gracefully");
        }
        Err(_) => {
            warn!(timeout = ?timeout, "In-flight requests did not finish in time, aborting");
            server.abort();
        }
    }

    Ok(())
}
