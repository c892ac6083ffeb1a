//! Graceful Shutdown Handling
//!
//! Turns SIGTERM/SIGINT into a broadcast that the HTTP server and background
//! tasks wait on, and bounds how long the drain may take.

use crate::Result;
use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Shutdown coordinator that manages graceful shutdown process
pub struct ShutdownCoordinator {
    /// Broadcast sender for shutdown signal
    shutdown_tx: broadcast::Sender<()>,
    /// Shutdown timeout duration
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new(timeout: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shutdown_tx,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get a shutdown receiver for components to listen for shutdown signals
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Future that resolves once shutdown has been triggered
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut shutdown_rx = self.subscribe();
        async move {
            // a closed channel also means shutdown
            let _ = shutdown_rx.recv().await;
        }
    }

    /// Trigger shutdown without waiting for an OS signal
    pub fn trigger(&self) {
        if self.shutdown_tx.send(()).is_err() {
            debug!("Shutdown triggered with no listeners");
        }
    }

    /// Wait for SIGTERM, SIGINT or Ctrl+C, then broadcast shutdown
    pub async fn listen_for_signals(&self) -> Result<()> {
        info!("Starting shutdown signal listener");

        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await?;
            info!("Received Ctrl+C, initiating graceful shutdown");
        }

        self.trigger();
        Ok(())
    }

    /// Wait for a task to finish draining, aborting it after the timeout
    pub async fn drain(&self, name: &str, mut handle: JoinHandle<Result<()>>) -> Result<()> {
        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok(()))) => {
                debug!("{} stopped cleanly", name);
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                error!("{} failed during shutdown: {}", name, e);
                Err(e)
            }
            Ok(Err(e)) if e.is_cancelled() => Ok(()),
            Ok(Err(e)) => Err(anyhow::anyhow!("{} task failed: {}", name, e)),
            Err(_) => {
                warn!("{} did not stop within {:?}, aborting", name, self.timeout);
                handle.abort();
                Ok(())
            }
        }
    }
}
