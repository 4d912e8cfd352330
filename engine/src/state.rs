//! Analysis workflow state machine.
//!
//! One writing's submit-and-poll lifecycle, held behind the controller's
//! mutex. Transitions are synchronous; all IO stays in the controller.

use redink_types::{Analysis, AnalysisErrorCode};

use crate::ApiError;

/// Message published when the attempt budget runs out.
pub(crate) const TIMEOUT_MESSAGE: &str =
    "Analysis is taking longer than expected. Please try again later.";

/// Where the workflow currently is.
///
/// # State Machine
/// ```text
/// ┌──────┐  submit accepted   ┌────────────┐  scheduler started  ┌─────────┐
/// │ Idle │ ─────────────────> │ Submitting │ ──────────────────> │ Polling │
/// └──────┘                    └────────────┘                     └─────────┘
///     ^                              │                              │    │
///     │         submit rejected      │          stop / timeout      │    │
///     │<─────────────────────────────┘    <─────────────────────────┘    │
///     │                                                                  │
///     │        clear_analysis        ┌──────────┐   terminal fetched     │
///     │<─────────────────────────────│ Terminal │ <──────────────────────┘
///     │                              └──────────┘
/// ```
///
/// `Terminal` only means the displayed analysis finished; a new submission
/// moves straight back through `Submitting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Submission request on the wire.
    Submitting,
    /// Scheduler ticking against the status endpoint.
    Polling,
    /// A completed or failed analysis is on display.
    Terminal,
}

/// Mutable workflow state. The controller exposes read access through
/// [`AnalysisSnapshot`] clones only.
#[derive(Debug, Default)]
pub(crate) struct AnalysisState {
    pub(crate) phase: Phase,
    pub(crate) current_analysis: Option<Analysis>,
    pub(crate) is_submitting: bool,
    pub(crate) is_polling: bool,
    pub(crate) is_rate_limited: bool,
    pub(crate) error: Option<String>,
    pub(crate) error_code: Option<String>,
}

impl AnalysisState {
    /// Transition: start a submission (-> Submitting). Clears any error left
    /// over from the previous run, including the rate-limit flag.
    pub(crate) fn begin_submit(&mut self) {
        self.phase = Phase::Submitting;
        self.is_submitting = true;
        self.is_rate_limited = false;
        self.error = None;
        self.error_code = None;
    }

    /// Transition: submission accepted by the server. The scheduler has not
    /// started yet; `begin_polling` follows.
    pub(crate) fn submit_accepted(&mut self) {
        self.is_submitting = false;
    }

    /// Transition: submission rejected (-> Idle). A rate-limit rejection is
    /// flagged separately so the caller can render it as a warning rather
    /// than a failure.
    pub(crate) fn submit_rejected(&mut self, error: &ApiError) {
        self.phase = Phase::Idle;
        self.is_submitting = false;
        self.is_rate_limited = error.is_rate_limited();
        self.error = Some(error.to_string());
        self.error_code = error.code().map(|code| code.as_str().to_owned());
    }

    /// Transition: scheduler started (-> Polling).
    pub(crate) fn begin_polling(&mut self) {
        self.phase = Phase::Polling;
        self.is_polling = true;
    }

    /// Publish a fetched analysis. A terminal one ends the poll
    /// (-> Terminal); a pending or processing one leaves the phase alone.
    pub(crate) fn publish(&mut self, analysis: Analysis) {
        let terminal = analysis.status.is_terminal();
        self.current_analysis = Some(analysis);
        if terminal {
            self.phase = Phase::Terminal;
            self.is_polling = false;
        }
    }

    /// Transition: scheduler stopped without a terminal result (-> Idle).
    /// Keeps whatever analysis and error are already on display.
    pub(crate) fn polling_stopped(&mut self) {
        self.is_polling = false;
        if self.phase == Phase::Polling {
            self.phase = Phase::Idle;
        }
    }

    /// Transition: attempt budget exhausted (-> Idle). The last fetched
    /// analysis stays on display next to the timeout message.
    pub(crate) fn timed_out(&mut self) {
        self.is_polling = false;
        self.phase = Phase::Idle;
        self.error = Some(TIMEOUT_MESSAGE.to_owned());
        self.error_code = Some(AnalysisErrorCode::Timeout.as_str().to_owned());
    }

    /// Record a failure from a one-shot fetch.
    pub(crate) fn fetch_failed(&mut self, error: &ApiError) {
        self.error = Some(error.to_string());
        self.error_code = error.code().map(|code| code.as_str().to_owned());
    }

    /// Drop error state, keeping the analysis and phase.
    pub(crate) fn clear_error(&mut self) {
        self.error = None;
        self.error_code = None;
    }

    /// Back to a blank slate (-> Idle).
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn snapshot(&self) -> AnalysisSnapshot {
        AnalysisSnapshot {
            phase: self.phase,
            current_analysis: self.current_analysis.clone(),
            is_submitting: self.is_submitting,
            is_polling: self.is_polling,
            is_rate_limited: self.is_rate_limited,
            error: self.error.clone(),
            error_code: self.error_code.clone(),
        }
    }
}

/// Point-in-time copy of the workflow state, safe to hold across renders.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSnapshot {
    pub phase: Phase,
    pub current_analysis: Option<Analysis>,
    pub is_submitting: bool,
    pub is_polling: bool,
    /// Set when the last submission bounced off the daily quota. Rendered as
    /// a warning, not a failure.
    pub is_rate_limited: bool,
    pub error: Option<String>,
    pub error_code: Option<String>,
}
