//! Seam between the controller and the HTTP client.

use redink_api::{ApiClient, ApiError};
use redink_types::{Analysis, SubmitReceipt, WritingId};

/// The two calls the analysis workflow needs from the server.
///
/// [`ApiClient`] is the production implementation; tests drive the
/// controller with a scripted fake instead. Futures are `Send` because the
/// scheduler runs them on a spawned task.
pub trait AnalysisTransport: Send + Sync + 'static {
    /// Enqueue the analysis job for a writing.
    fn submit(
        &self,
        writing_id: WritingId,
    ) -> impl Future<Output = Result<SubmitReceipt, ApiError>> + Send;

    /// Read the current analysis for a writing.
    fn status(
        &self,
        writing_id: WritingId,
    ) -> impl Future<Output = Result<Analysis, ApiError>> + Send;
}

impl AnalysisTransport for ApiClient {
    async fn submit(&self, writing_id: WritingId) -> Result<SubmitReceipt, ApiError> {
        self.submit_for_analysis(writing_id).await
    }

    async fn status(&self, writing_id: WritingId) -> Result<Analysis, ApiError> {
        self.analysis_status(writing_id).await
    }
}
