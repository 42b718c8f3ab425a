//! Presentation-callback trait for workflow events.
//!
//! Inject an [`Arc<dyn WorkflowCallback>`] via
//! [`crate::config::StencilConfigBuilder::hooks`] to receive events as the
//! workflow moves through its phases. This is the only channel through which
//! the core talks to a user interface: the library never touches a terminal,
//! a DOM, or any other presentation surface directly.
//!
//! Callers can forward events to a progress bar, a status label, a WebSocket —
//! whatever the host application uses. The trait is `Send + Sync` and every
//! method has a default no-op implementation, so implementors only override
//! what they care about.

use std::fmt;
use std::sync::Arc;

/// The phase a workflow run is currently in, as surfaced to presentation.
///
/// `Processing { attempt: 0 }` is fired once right after submission, before
/// the first status query; subsequent `Processing` events carry the 1-based
/// poll attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    /// File bytes are being transferred to remote storage.
    Uploading,
    /// Upload confirmed; a generate action may be triggered.
    Ready,
    /// The transformation job is being submitted.
    Submitting,
    /// The job is queued or running remotely; `attempt` counts status polls.
    Processing { attempt: u32 },
    /// The result asset is available.
    Complete,
    /// The run ended in an error; the message arrives via `on_error`.
    Error,
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowPhase::Uploading => write!(f, "UPLOADING..."),
            WorkflowPhase::Ready => write!(f, "READY"),
            WorkflowPhase::Submitting => write!(f, "SUBMITTING..."),
            WorkflowPhase::Processing { attempt: 0 } => write!(f, "PROCESSING..."),
            WorkflowPhase::Processing { attempt } => write!(f, "PROCESSING... ({attempt})"),
            WorkflowPhase::Complete => write!(f, "COMPLETE"),
            WorkflowPhase::Error => write!(f, "ERROR"),
        }
    }
}

/// Called by the workflow as it progresses.
///
/// All methods default to no-ops. Events for a single workflow arrive
/// sequentially (the pipeline is one linear chain), but the trait is
/// `Send + Sync` so a single implementation can serve multiple workflows.
pub trait WorkflowCallback: Send + Sync {
    /// Busy-indicator toggle, bracketing every asynchronous action.
    fn on_busy(&self, busy: bool) {
        let _ = busy;
    }

    /// Phase transition; see [`WorkflowPhase`].
    fn on_phase(&self, phase: &WorkflowPhase) {
        let _ = phase;
    }

    /// The uploaded input asset is available at `url` for preview.
    fn on_preview(&self, url: &str) {
        let _ = url;
    }

    /// The generated output asset is available at `url` for display.
    fn on_result(&self, url: &str) {
        let _ = url;
    }

    /// The output at `url` may now be offered for download.
    fn on_download_ready(&self, url: &str) {
        let _ = url;
    }

    /// A user-visible error message. The workflow stays recoverable.
    fn on_error(&self, message: &str) {
        let _ = message;
    }

    /// All presentation state should return to its initial configuration.
    fn on_reset(&self) {}
}

/// A no-op implementation for callers that don't need workflow events.
pub struct NoopWorkflowCallback;

impl WorkflowCallback for NoopWorkflowCallback {}

/// Convenience alias matching the type stored in [`crate::config::StencilConfig`].
pub type WorkflowHooks = Arc<dyn WorkflowCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopWorkflowCallback;
        cb.on_busy(true);
        cb.on_phase(&WorkflowPhase::Uploading);
        cb.on_preview("https://contents.example/a.png");
        cb.on_result("https://out/x.png");
        cb.on_download_ready("https://out/x.png");
        cb.on_error("boom");
        cb.on_reset();
        cb.on_busy(false);
    }

    #[test]
    fn phase_labels_match_status_protocol() {
        assert_eq!(WorkflowPhase::Uploading.to_string(), "UPLOADING...");
        assert_eq!(WorkflowPhase::Ready.to_string(), "READY");
        assert_eq!(
            WorkflowPhase::Processing { attempt: 0 }.to_string(),
            "PROCESSING..."
        );
        assert_eq!(
            WorkflowPhase::Processing { attempt: 7 }.to_string(),
            "PROCESSING... (7)"
        );
        assert_eq!(WorkflowPhase::Complete.to_string(), "COMPLETE");
    }

    struct TrackingCallback {
        polls: AtomicU32,
        errors: Mutex<Vec<String>>,
    }

    impl WorkflowCallback for TrackingCallback {
        fn on_phase(&self, phase: &WorkflowPhase) {
            if let WorkflowPhase::Processing { attempt } = phase {
                if *attempt > 0 {
                    self.polls.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        fn on_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn tracking_callback_receives_events() {
        let cb = TrackingCallback {
            polls: AtomicU32::new(0),
            errors: Mutex::new(Vec::new()),
        };
        cb.on_phase(&WorkflowPhase::Submitting);
        cb.on_phase(&WorkflowPhase::Processing { attempt: 0 });
        cb.on_phase(&WorkflowPhase::Processing { attempt: 1 });
        cb.on_phase(&WorkflowPhase::Processing { attempt: 2 });
        cb.on_error("bad input");

        assert_eq!(cb.polls.load(Ordering::SeqCst), 2);
        assert_eq!(cb.errors.lock().unwrap().as_slice(), ["bad input"]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: WorkflowHooks = Arc::new(NoopWorkflowCallback);
        cb.on_phase(&WorkflowPhase::Complete);
    }
}
