//! Submission driver and polling scheduler.
//!
//! [`AnalysisController`] owns the workflow state and the single background
//! ticker task. Every lifecycle change (new submission, manual stop, clear)
//! bumps a monotonic session token; a tick compares its own token against
//! the counter before touching state, so a response that was already in
//! flight when its session ended lands in the void instead of overwriting
//! the new session's view.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use redink_types::WritingId;

use crate::backoff::PollConfig;
use crate::state::{AnalysisSnapshot, AnalysisState};
use crate::transport::AnalysisTransport;

pub struct AnalysisController<T: AnalysisTransport> {
    transport: Arc<T>,
    state: Arc<Mutex<AnalysisState>>,
    config: PollConfig,
    /// Current session token. Ticks carry the value observed at spawn time
    /// and give up when the counter has moved on.
    session: Arc<AtomicU64>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl<T: AnalysisTransport> AnalysisController<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_config(transport, PollConfig::default())
    }

    pub fn with_config(transport: Arc<T>, config: PollConfig) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(AnalysisState::default())),
            config,
            session: Arc::new(AtomicU64::new(0)),
            ticker: Mutex::new(None),
        }
    }

    /// Submit a writing for analysis. On acceptance the polling scheduler
    /// starts against the same writing and `true` comes back; any rejection
    /// lands in the state (rate limits flagged separately) and returns
    /// `false`.
    pub async fn submit_writing(&self, writing_id: WritingId) -> bool {
        {
            let mut state = self.state.lock().await;
            state.begin_submit();
        }

        match self.transport.submit(writing_id).await {
            Ok(receipt) => {
                tracing::info!(%writing_id, analysis_id = %receipt.analysis_id, "analysis submitted");
                {
                    let mut state = self.state.lock().await;
                    state.submit_accepted();
                }
                self.start_polling(writing_id).await;
                true
            }
            Err(error) => {
                tracing::warn!(%writing_id, %error, "analysis submission rejected");
                let mut state = self.state.lock().await;
                state.submit_rejected(&error);
                false
            }
        }
    }

    /// One-shot status read, used when opening a writing before any
    /// submission this session. A missing analysis is the expected answer
    /// for a never-submitted draft and reports success without publishing
    /// anything.
    pub async fn fetch_analysis(&self, writing_id: WritingId) -> bool {
        match self.transport.status(writing_id).await {
            Ok(analysis) => {
                let mut state = self.state.lock().await;
                state.clear_error();
                state.publish(analysis);
                true
            }
            Err(error) if error.is_not_found() => true,
            Err(error) => {
                tracing::debug!(%writing_id, %error, "analysis fetch failed");
                let mut state = self.state.lock().await;
                state.fetch_failed(&error);
                false
            }
        }
    }

    /// Start (or restart) the polling scheduler for a writing. Any previous
    /// session is superseded first: its token goes stale, then its task is
    /// aborted.
    pub async fn start_polling(&self, writing_id: WritingId) {
        let token = self.session.fetch_add(1, Ordering::SeqCst) + 1;
        self.cancel_ticker().await;

        {
            let mut state = self.state.lock().await;
            state.begin_polling();
        }

        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let session = Arc::clone(&self.session);
        let config = self.config.clone();
        let handle = tokio::spawn(async move {
            run_poll_loop(transport, state, session, token, config, writing_id).await;
        });
        *self.ticker.lock().await = Some(handle);
    }

    /// Stop the scheduler without touching the displayed analysis. Safe to
    /// call when nothing is running.
    pub async fn stop_polling(&self) {
        self.session.fetch_add(1, Ordering::SeqCst);
        self.cancel_ticker().await;
        let mut state = self.state.lock().await;
        state.polling_stopped();
    }

    /// Stop the scheduler and reset the workflow to a blank slate. Used when
    /// the caller navigates away from the writing.
    pub async fn clear_analysis(&self) {
        self.session.fetch_add(1, Ordering::SeqCst);
        self.cancel_ticker().await;
        let mut state = self.state.lock().await;
        state.reset();
    }

    /// Drop error state, keeping the analysis on display.
    pub async fn clear_error(&self) {
        let mut state = self.state.lock().await;
        state.clear_error();
    }

    pub async fn snapshot(&self) -> AnalysisSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Explicit teardown; equivalent to [`clear_analysis`] today. `Drop`
    /// aborts the ticker as a backstop for the forgotten call.
    ///
    /// [`clear_analysis`]: AnalysisController::clear_analysis
    pub async fn dispose(&self) {
        self.clear_analysis().await;
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

impl<T: AnalysisTransport> Drop for AnalysisController<T> {
    fn drop(&mut self) {
        self.session.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.ticker.try_lock()
            && let Some(handle) = slot.take()
        {
            handle.abort();
        }
    }
}

/// The scheduler. One task per session; the first fetch fires immediately,
/// later ones at a growing interval. Exits on a terminal analysis, an
/// expired session token, a 401, or attempt exhaustion.
async fn run_poll_loop<T: AnalysisTransport>(
    transport: Arc<T>,
    state: Arc<Mutex<AnalysisState>>,
    session: Arc<AtomicU64>,
    token: u64,
    config: PollConfig,
    writing_id: WritingId,
) {
    let mut attempts: u32 = 0;
    let mut interval = config.initial_interval;

    loop {
        attempts += 1;
        if attempts > config.max_attempts {
            tracing::warn!(%writing_id, attempts = config.max_attempts, "analysis poll timed out");
            let mut state = state.lock().await;
            if session.load(Ordering::SeqCst) == token {
                state.timed_out();
            }
            return;
        }

        match transport.status(writing_id).await {
            Ok(analysis) => {
                let terminal = analysis.status.is_terminal();
                {
                    let mut state = state.lock().await;
                    if session.load(Ordering::SeqCst) != token {
                        return;
                    }
                    state.publish(analysis);
                }
                if terminal {
                    tracing::debug!(%writing_id, attempt = attempts, "analysis reached a terminal state");
                    return;
                }
                interval = config.next_interval(interval);
            }
            Err(error) if error.is_unauthorized() => {
                // Session expired server-side. Stop quietly; the next
                // explicit action will surface the 401 to the user.
                tracing::debug!(%writing_id, "analysis poll stopped on 401");
                let mut state = state.lock().await;
                if session.load(Ordering::SeqCst) == token {
                    state.polling_stopped();
                }
                return;
            }
            Err(error) => {
                // Transient; retry at the current cadence without growing it.
                tracing::debug!(%writing_id, attempt = attempts, %error, "analysis poll fetch failed");
            }
        }

        tokio::time::sleep(interval).await;
    }
}
