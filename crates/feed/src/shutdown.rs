//! Graceful shutdown for adapter tasks
//!
//! A cancelled token makes every stream adapter abandon its feed read and
//! emit a synthetic terminal marker, after which the engine drains exactly
//! as if all sources had closed on their own.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Coordinates shutdown across all adapter tasks.
#[derive(Clone, Default)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A controller that cancels itself on Ctrl+C.
    pub fn with_ctrl_c() -> Self {
        let controller = Self::new();
        let token = controller.token.clone();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, closing feeds");
                    token.cancel();
                }
                Err(e) => {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
            }
        });

        controller
    }

    /// Token for one adapter task; cancelled when the controller is.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger shutdown manually
    pub fn shutdown(&self) {
        info!("Shutdown triggered");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_shutdown_reaches_children() {
        let controller = ShutdownController::new();
        let child = controller.child_token();

        assert!(!controller.is_cancelled());
        controller.shutdown();

        assert!(controller.is_cancelled());
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_child_cancellation_stays_local() {
        let controller = ShutdownController::new();
        let child = controller.child_token();

        child.cancel();

        assert!(child.is_cancelled());
        assert!(!controller.is_cancelled());
    }
}
