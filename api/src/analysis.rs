//! Analysis submission and status endpoints.
//!
//! These two calls are the transport half of the analysis workflow: `submit`
//! enqueues the backend job, `analysis_status` reads its current state. Each
//! method is a single HTTP round trip; retry and polling cadence belong to
//! the caller.

use redink_types::{Analysis, SubmitReceipt, WritingId};

use crate::{ApiClient, ApiError};

impl ApiClient {
    /// Submit a writing for AI analysis.
    ///
    /// The server enqueues the job and answers 202 with the id of the new
    /// analysis row. Fails with [`ApiError::RateLimited`] once the daily
    /// submission quota is spent, and with [`ApiError::Api`] when the writing
    /// is not in a submittable state.
    pub async fn submit_for_analysis(
        &self,
        writing_id: WritingId,
    ) -> Result<SubmitReceipt, ApiError> {
        tracing::debug!(%writing_id, "submitting writing for analysis");
        let response = self
            .post(&format!("/writings/{writing_id}/submit"))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Fetch the current analysis for a writing.
    ///
    /// [`ApiError::NotFound`] means the writing has never been submitted.
    /// For a freshly opened view that is the expected answer, not a failure.
    pub async fn analysis_status(&self, writing_id: WritingId) -> Result<Analysis, ApiError> {
        let response = self
            .get(&format!("/writings/{writing_id}/analysis"))
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod integration_tests {
    use redink_types::{AnalysisStatus, WritingId};
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::{ApiClient, Session};

    fn writing_id() -> WritingId {
        WritingId::new(Uuid::parse_str("7c9e6679-7425-40de-944b-e07fc1f90ae7").unwrap())
    }

    fn signed_in(server: &MockServer) -> ApiClient {
        let client = ApiClient::new(&server.uri()).unwrap();
        client.set_session(Session {
            token: "sess-1".into(),
            csrf_token: "csrf-1".into(),
        });
        client
    }

    #[tokio::test]
    async fn test_submit_decodes_receipt() {
        let server = MockServer::start().await;
        let id = writing_id();

        Mock::given(method("POST"))
            .and(path(format!("/writings/{id}/submit")))
            .and(header("X-CSRF-Token", "csrf-1"))
            .and(header("cookie", "token=sess-1; csrf_token=csrf-1"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "message": "Analysis started",
                "analysis_id": "86b7a802-27c4-4b4f-9d12-f2076f9b2f3e",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = signed_in(&server).submit_for_analysis(id).await.unwrap();
        assert_eq!(receipt.message, "Analysis started");
        assert_eq!(
            receipt.analysis_id.to_string(),
            "86b7a802-27c4-4b4f-9d12-f2076f9b2f3e"
        );
    }

    #[tokio::test]
    async fn test_submit_quota_exhausted_is_rate_limited() {
        let server = MockServer::start().await;
        let id = writing_id();

        Mock::given(method("POST"))
            .and(path(format!("/writings/{id}/submit")))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error_code": "FORBIDDEN",
                "message": "Daily submission limit reached (5/5)",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = signed_in(&server)
            .submit_for_analysis(id)
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "Daily submission limit reached (5/5)");
    }

    // Some deployments answer the quota check with 403 rather than 429; the
    // body code alone must be enough to classify it.
    #[tokio::test]
    async fn test_submit_forbidden_body_is_rate_limited() {
        let server = MockServer::start().await;
        let id = writing_id();

        Mock::given(method("POST"))
            .and(path(format!("/writings/{id}/submit")))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error_code": "FORBIDDEN",
                "message": "Submission limit reached",
            })))
            .mount(&server)
            .await;

        let err = signed_in(&server)
            .submit_for_analysis(id)
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_submit_non_draft_is_plain_api_error() {
        let server = MockServer::start().await;
        let id = writing_id();

        Mock::given(method("POST"))
            .and(path(format!("/writings/{id}/submit")))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error_code": "VALIDATION_ERROR",
                "message": "Writing is not in draft status",
            })))
            .mount(&server)
            .await;

        let err = signed_in(&server)
            .submit_for_analysis(id)
            .await
            .unwrap_err();
        assert!(!err.is_rate_limited());
        assert_eq!(err.to_string(), "Writing is not in draft status");
    }

    #[tokio::test]
    async fn test_status_decodes_analysis() {
        let server = MockServer::start().await;
        let id = writing_id();

        Mock::given(method("GET"))
            .and(path(format!("/writings/{id}/analysis")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "86b7a802-27c4-4b4f-9d12-f2076f9b2f3e",
                "writing_id": id.to_string(),
                "status": "processing",
                "ai_score": null,
                "feedback": null,
                "error_code": null,
                "error_message": null,
                "latency_ms": null,
                "created_at": "2025-06-01T12:00:00Z",
                "updated_at": "2025-06-01T12:00:05Z",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let analysis = signed_in(&server).analysis_status(id).await.unwrap();
        assert_eq!(analysis.status, AnalysisStatus::Processing);
        assert_eq!(analysis.writing_id, id);
        assert!(analysis.ai_score.is_none());
        assert!(!analysis.status.is_terminal());
    }

    #[tokio::test]
    async fn test_status_missing_analysis_is_not_found() {
        let server = MockServer::start().await;
        let id = writing_id();

        Mock::given(method("GET"))
            .and(path(format!("/writings/{id}/analysis")))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error_code": "NOT_FOUND",
                "message": "No analysis found for this writing",
            })))
            .mount(&server)
            .await;

        let err = signed_in(&server).analysis_status(id).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_status_expired_session_is_unauthorized() {
        let server = MockServer::start().await;
        let id = writing_id();

        Mock::given(method("GET"))
            .and(path(format!("/writings/{id}/analysis")))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error_code": "UNAUTHORIZED",
                "message": "Session expired",
            })))
            .mount(&server)
            .await;

        let err = signed_in(&server).analysis_status(id).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    // Status reads are not state-changing, so the double-submit header must
    // stay off them while the cookie pair still rides along.
    #[tokio::test]
    async fn test_status_sends_cookies_but_no_csrf_header() {
        let server = MockServer::start().await;
        let id = writing_id();

        Mock::given(method("GET"))
            .and(path(format!("/writings/{id}/analysis")))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error_code": "NOT_FOUND",
                "message": "No analysis found for this writing",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let _ = signed_in(&server).analysis_status(id).await;

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("X-CSRF-Token").is_none());
        let cookie = requests[0].headers.get("cookie").unwrap().to_str().unwrap();
        assert!(cookie.contains("token=sess-1"));
        assert!(cookie.contains("csrf_token=csrf-1"));
    }
}
