//! Cooperative cancellation
//!
//! A controller/signal pair over `CancellationToken`. Drivers observe the
//! signal only at async suspension points.

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Owner side: requests cancellation
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    token: CancellationToken,
}

impl AbortController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            token: self.token.clone(),
        }
    }

    /// Request cancellation; later calls are no-ops
    pub fn abort(&self) {
        if !self.token.is_cancelled() {
            debug!("abort requested");
        }
        self.token.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Observer side: handed to drivers and schedulers
#[derive(Debug, Clone)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the signal is aborted
    pub async fn aborted(&self) {
        self.token.cancelled().await
    }

    /// Controller that is aborted with this signal but can also abort alone
    pub fn child(&self) -> AbortController {
        AbortController {
            token: self.token.child_token(),
        }
    }
}
