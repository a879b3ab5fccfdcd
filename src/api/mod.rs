//! Typed access to the quiz service.
//!
//! `ApiGateway` is the seam the rest of the crate talks to; `HttpGateway` is the
//! production implementation. Tests substitute an in-memory gateway.

pub mod http;
pub mod types;

use std::path::Path;

use thiserror::Error;

pub use http::HttpGateway;
pub use types::{
    AuthToken, Credentials, DifficultyStats, OptionKey, PdfId, PdfSummary, Question, QuestionId,
    StatsSummary, SubmitOutcome, SubmitRequest,
};

/// Upload progress callback, receives whole percentages 0-100
pub type ProgressFn = Box<dyn FnMut(u8) + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("not authenticated")]
    Unauthorized { detail: Option<String> },
    #[error("server returned status {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("could not read {path}: {reason}")]
    File { path: String, reason: String },
}

impl ApiError {
    /// The server's `detail` message, if it sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail } | ApiError::Status { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }

    /// Message to show a user: the server detail, else the given fallback
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail()
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Request surface of the remote service
pub trait ApiGateway: Send + Sync + 'static {
    fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError>;

    fn register(&self, credentials: &Credentials) -> Result<AuthToken, ApiError>;

    fn list_pdfs(&self, token: &AuthToken) -> Result<Vec<PdfSummary>, ApiError>;

    fn delete_pdf(&self, token: &AuthToken, pdf_id: PdfId) -> Result<(), ApiError>;

    fn upload_pdf(
        &self,
        token: &AuthToken,
        path: &Path,
        progress: ProgressFn,
    ) -> Result<PdfSummary, ApiError>;

    fn fetch_questions(
        &self,
        token: &AuthToken,
        pdf_id: PdfId,
        limit: usize,
    ) -> Result<Vec<Question>, ApiError>;

    fn submit_answer(
        &self,
        token: &AuthToken,
        request: &SubmitRequest,
    ) -> Result<SubmitOutcome, ApiError>;

    fn fetch_stats(&self, token: &AuthToken, pdf_id: PdfId) -> Result<StatsSummary, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_detail() {
        let err = ApiError::Status {
            status: 400,
            detail: Some("Email already registered".into()),
        };
        assert_eq!(
            err.user_message("Registration failed"),
            "Email already registered"
        );
    }

    #[test]
    fn user_message_falls_back_without_detail() {
        let err = ApiError::Transport("connection refused".into());
        assert_eq!(err.user_message("Login failed"), "Login failed");

        let blank = ApiError::Status {
            status: 500,
            detail: Some("  ".into()),
        };
        assert_eq!(blank.user_message("Login failed"), "Login failed");
    }

    #[test]
    fn unauthorized_is_detected() {
        assert!(ApiError::Unauthorized { detail: None }.is_unauthorized());
        assert!(!ApiError::Decode("x".into()).is_unauthorized());
    }
}
