use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Turns SIGINT / SIGTERM into a cancellation of the running pipeline. The
/// in-flight transaction is rolled back and the process exits with
/// [`ExitCode::ShutdownRequested`].
#[derive(Clone)]
pub struct ShutdownCoordinator {
    cancel_token: CancellationToken,
    signalled: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            signalled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn register_handlers(&self) {
        let coordinator = self.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = coordinator.cancel_token.cancelled() => return,
                signal = wait_for_signal() => {
                    info!("Received {}, cancelling the pipeline run", signal);
                }
            }

            coordinator.signalled.store(true, Ordering::SeqCst);
            coordinator.cancel_token.cancel();
        });
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.signalled.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

/// Resolves with the name of the first termination signal received. A
/// handler that cannot be installed never resolves.
async fn wait_for_signal() -> &'static str {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                warn!("Failed to install SIGINT handler: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    /// 128 + SIGINT
    ShutdownRequested = 130,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
