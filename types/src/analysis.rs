//! Analysis job types as served by the backend.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AnalysisId, WritingId};

/// Lifecycle of one analysis job.
///
/// `Completed` and `Failed` are terminal: the record never changes again and
/// polling must stop. `Pending` and `Processing` mean the job is still in the
/// backend queue or being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure cause reported on a terminally `failed` analysis.
///
/// Codes the backend may add later decode into `Other` rather than failing
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnalysisErrorCode {
    MlModel,
    OpenAiApi,
    InvalidInput,
    Timeout,
    Internal,
    Other(String),
}

impl AnalysisErrorCode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            AnalysisErrorCode::MlModel => "ML_MODEL_ERROR",
            AnalysisErrorCode::OpenAiApi => "OPENAI_API_ERROR",
            AnalysisErrorCode::InvalidInput => "INVALID_INPUT",
            AnalysisErrorCode::Timeout => "TIMEOUT",
            AnalysisErrorCode::Internal => "INTERNAL_ERROR",
            AnalysisErrorCode::Other(raw) => raw,
        }
    }

    /// Mapped human-readable message, or `None` for codes we do not know.
    #[must_use]
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            AnalysisErrorCode::MlModel => {
                Some("An error occurred during AI analysis. Please try again shortly.")
            }
            AnalysisErrorCode::OpenAiApi => Some("An error occurred while generating feedback."),
            AnalysisErrorCode::InvalidInput => Some("The writing is not suitable for analysis."),
            AnalysisErrorCode::Timeout => Some("The analysis timed out."),
            AnalysisErrorCode::Internal => Some("A server error occurred."),
            AnalysisErrorCode::Other(_) => None,
        }
    }
}

impl From<String> for AnalysisErrorCode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "ML_MODEL_ERROR" => AnalysisErrorCode::MlModel,
            "OPENAI_API_ERROR" => AnalysisErrorCode::OpenAiApi,
            "INVALID_INPUT" => AnalysisErrorCode::InvalidInput,
            "TIMEOUT" => AnalysisErrorCode::Timeout,
            "INTERNAL_ERROR" => AnalysisErrorCode::Internal,
            _ => AnalysisErrorCode::Other(raw),
        }
    }
}

impl From<AnalysisErrorCode> for String {
    fn from(code: AnalysisErrorCode) -> Self {
        code.as_str().to_owned()
    }
}

impl fmt::Display for AnalysisErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One AI-analysis job for one writing, as the backend serves it.
///
/// Score, feedback and latency appear only once `completed`; error fields
/// only once `failed`. The backend serializes absent optionals as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: AnalysisId,
    pub writing_id: WritingId,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub ai_score: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub error_code: Option<AnalysisErrorCode>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub latency_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Analysis {
    /// Human-readable explanation for a failed analysis.
    ///
    /// Falls back from the mapped code message to the server's raw error
    /// message to a generic string.
    #[must_use]
    pub fn failure_message(&self) -> Cow<'_, str> {
        if let Some(code) = &self.error_code
            && let Some(mapped) = code.user_message()
        {
            return Cow::Borrowed(mapped);
        }
        if let Some(raw) = self.error_message.as_deref()
            && !raw.is_empty()
        {
            return Cow::Borrowed(raw);
        }
        Cow::Borrowed("An error occurred during analysis.")
    }
}

/// Body of the 202 response to an analysis submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub message: String,
    pub analysis_id: AnalysisId,
}

#[cfg(test)]
mod tests {
    use super::{Analysis, AnalysisErrorCode, AnalysisStatus};

    #[test]
    fn terminal_statuses() {
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
        assert!(!AnalysisStatus::Pending.is_terminal());
        assert!(!AnalysisStatus::Processing.is_terminal());
    }

    #[test]
    fn status_decodes_snake_case() {
        let status: AnalysisStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(status, AnalysisStatus::Processing);
    }

    #[test]
    fn unknown_error_code_decodes_to_other() {
        let code: AnalysisErrorCode = serde_json::from_str("\"QUOTA_BLOWN\"").unwrap();
        assert_eq!(code, AnalysisErrorCode::Other("QUOTA_BLOWN".into()));
        assert_eq!(code.as_str(), "QUOTA_BLOWN");
        assert!(code.user_message().is_none());
    }

    #[test]
    fn known_error_code_round_trips() {
        let code: AnalysisErrorCode = serde_json::from_str("\"ML_MODEL_ERROR\"").unwrap();
        assert_eq!(code, AnalysisErrorCode::MlModel);
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"ML_MODEL_ERROR\"");
    }

    fn failed_analysis(code: Option<&str>, message: Option<&str>) -> Analysis {
        let json = serde_json::json!({
            "id": "11111111-2222-3333-4444-555555555555",
            "writing_id": "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
            "status": "failed",
            "ai_score": null,
            "feedback": null,
            "error_code": code,
            "error_message": message,
            "latency_ms": null,
            "created_at": "2025-06-01T09:00:00Z",
            "updated_at": "2025-06-01T09:01:00Z",
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn failure_message_prefers_mapped_code() {
        let analysis = failed_analysis(Some("TIMEOUT"), Some("raw detail from server"));
        assert_eq!(analysis.failure_message(), "The analysis timed out.");
    }

    #[test]
    fn failure_message_falls_back_to_raw_message() {
        let analysis = failed_analysis(Some("SOMETHING_NEW"), Some("raw detail from server"));
        assert_eq!(analysis.failure_message(), "raw detail from server");
    }

    #[test]
    fn failure_message_falls_back_to_generic() {
        let analysis = failed_analysis(None, None);
        assert_eq!(analysis.failure_message(), "An error occurred during analysis.");
    }

    #[test]
    fn completed_analysis_decodes_score() {
        let json = serde_json::json!({
            "id": "11111111-2222-3333-4444-555555555555",
            "writing_id": "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee",
            "status": "completed",
            "ai_score": 87.5,
            "feedback": "Strong thesis, weak conclusion.",
            "error_code": null,
            "error_message": null,
            "latency_ms": 5400,
            "created_at": "2025-06-01T09:00:00Z",
            "updated_at": "2025-06-01T09:01:00Z",
        });
        let analysis: Analysis = serde_json::from_value(json).unwrap();
        assert_eq!(analysis.status, AnalysisStatus::Completed);
        assert_eq!(analysis.ai_score, Some(87.5));
        assert_eq!(analysis.latency_ms, Some(5400));
    }
}
