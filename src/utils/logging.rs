//! Logger handles for run records.
//!
//! Records carry a [`Logger`] instead of reaching for a process-wide logger.
//! The default handle discards everything. A handle can instead forward to
//! whatever `tracing` subscriber is in scope, or route a single record's
//! events to a dedicated subscriber.

use std::fmt;

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// A handle deciding where a record's diagnostics go.
#[derive(Clone)]
pub struct Logger {
    dispatch: Option<Dispatch>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::sink()
    }
}

impl Logger {
    /// Forward to the subscriber in scope when an event is emitted.
    #[must_use]
    pub fn ambient() -> Self {
        Self { dispatch: None }
    }

    /// Discard every event.
    #[must_use]
    pub fn sink() -> Self {
        Self {
            dispatch: Some(Dispatch::none()),
        }
    }

    /// Send every event to `dispatch`.
    #[must_use]
    pub fn from_dispatch(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// Run `f` with this handle's subscriber installed for the current thread.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.dispatch.is_some() {
            "dedicated"
        } else {
            "ambient"
        };
        f.debug_struct("Logger").field("dispatch", &kind).finish()
    }
}

/// Install a global `fmt` subscriber for host applications.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(verbose: bool) -> bool {
    let filter = if verbose {
        EnvFilter::new("seqrun_qc=debug,info")
    } else {
        EnvFilter::new("seqrun_qc=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init()
        .is_ok()
}
