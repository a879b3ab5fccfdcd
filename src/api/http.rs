use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::TokenResponse;
use super::{
    ApiError, ApiGateway, AuthToken, Credentials, PdfId, PdfSummary, ProgressFn, Question,
    StatsSummary, SubmitOutcome, SubmitRequest,
};
use crate::upload::ProgressReader;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
// question generation happens during upload and can take minutes
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Blocking HTTP implementation of the gateway. Calls are made from worker
/// threads, never from the UI loop.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, builder: RequestBuilder, token: &AuthToken) -> RequestBuilder {
        builder.bearer_auth(token.as_str()).timeout(REQUEST_TIMEOUT)
    }

    fn authenticate(&self, path: &str, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        debug!(path, email = %credentials.email, "authenticating");
        let response = self
            .client
            .post(self.url(path))
            .timeout(REQUEST_TIMEOUT)
            .json(credentials)
            .send()?;
        let body: TokenResponse = read_json(response)?;
        Ok(body.access_token)
    }
}

impl ApiGateway for HttpGateway {
    fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        self.authenticate("/auth/login", credentials)
    }

    fn register(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        self.authenticate("/auth/register", credentials)
    }

    fn list_pdfs(&self, token: &AuthToken) -> Result<Vec<PdfSummary>, ApiError> {
        let response = self.authed(self.client.get(self.url("/pdfs/")), token).send()?;
        read_json(response)
    }

    fn delete_pdf(&self, token: &AuthToken, pdf_id: PdfId) -> Result<(), ApiError> {
        let response = self
            .authed(self.client.delete(self.url(&format!("/pdfs/{pdf_id}"))), token)
            .send()?;
        ensure_success(response)
    }

    fn upload_pdf(
        &self,
        token: &AuthToken,
        path: &Path,
        progress: ProgressFn,
    ) -> Result<PdfSummary, ApiError> {
        let file_error = |err: std::io::Error| ApiError::File {
            path: path.display().to_string(),
            reason: err.to_string(),
        };
        let file = File::open(path).map_err(file_error)?;
        let len = file.metadata().map_err(file_error)?.len();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());

        debug!(%filename, bytes = len, "uploading pdf");
        let part = Part::reader_with_length(ProgressReader::new(file, len, progress), len)
            .file_name(filename)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/pdfs/upload"))
            .bearer_auth(token.as_str())
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()?;
        read_json(response)
    }

    fn fetch_questions(
        &self,
        token: &AuthToken,
        pdf_id: PdfId,
        limit: usize,
    ) -> Result<Vec<Question>, ApiError> {
        let response = self
            .authed(self.client.get(self.url(&format!("/quiz/{pdf_id}"))), token)
            .query(&[("limit", limit)])
            .send()?;
        read_json(response)
    }

    fn submit_answer(
        &self,
        token: &AuthToken,
        request: &SubmitRequest,
    ) -> Result<SubmitOutcome, ApiError> {
        let response = self
            .authed(self.client.post(self.url("/quiz/submit")), token)
            .json(request)
            .send()?;
        read_json(response)
    }

    fn fetch_stats(&self, token: &AuthToken, pdf_id: PdfId) -> Result<StatsSummary, ApiError> {
        let response = self
            .authed(self.client.get(self.url(&format!("/stats/{pdf_id}"))), token)
            .send()?;
        read_json(response)
    }
}

fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .map_err(|err| ApiError::Decode(err.to_string()))
    } else {
        let body = response.text().unwrap_or_default();
        Err(error_from_body(status.as_u16(), &body))
    }
}

fn ensure_success(response: Response) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().unwrap_or_default();
        Err(error_from_body(status.as_u16(), &body))
    }
}

/// Map an error status and body to an `ApiError`, keeping the server's
/// `detail` message when one can be found.
pub fn error_from_body(status: u16, body: &str) -> ApiError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(detail_text));
    warn!(status, detail = detail.as_deref().unwrap_or(""), "request rejected");

    if status == 401 {
        ApiError::Unauthorized { detail }
    } else {
        ApiError::Status { status, detail }
    }
}

// validation errors arrive as a list of {msg, ...} objects instead of a string
fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!msgs.is_empty()).then(|| msgs.join("; "))
        }
        _ => None,
    }
}
