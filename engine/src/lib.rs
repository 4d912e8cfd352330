//! Analysis workflow engine for Redink - submit-and-poll state machine.
//!
//! The server runs analyses asynchronously, so a client submits and then
//! polls the status endpoint at a growing interval until the job lands in a
//! terminal state, gives up, or is superseded. This crate owns that loop:
//! the [`Phase`] state machine, the backoff cadence, and the
//! [`AnalysisController`] that schedules ticks and discards responses from
//! superseded sessions. IO goes through [`AnalysisTransport`] so the whole
//! engine runs against a scripted fake in tests; rendering and persistence
//! stay with the caller.

// Re-export so callers can match on transport failures without also
// depending on redink-api.
pub use redink_api::ApiError;

mod backoff;
mod controller;
mod state;
mod transport;

pub use backoff::PollConfig;
pub use controller::AnalysisController;
pub use state::{AnalysisSnapshot, Phase};
pub use transport::AnalysisTransport;
