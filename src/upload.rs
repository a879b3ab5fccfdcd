use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::api::{ApiError, ProgressFn};

pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

pub const INVALID_FILE_MESSAGE: &str = "Please select a valid PDF file.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("no file selected")]
    Empty,
    #[error("{0} does not exist")]
    Missing(PathBuf),
    #[error("{0} is not a PDF")]
    NotPdf(PathBuf),
    #[error("{0} is empty")]
    EmptyFile(PathBuf),
    #[error("{path} is {bytes} bytes, the limit is 25MB")]
    TooLarge { path: PathBuf, bytes: u64 },
}

impl UploadError {
    pub fn user_message(&self) -> String {
        match self {
            UploadError::TooLarge { .. } => "PDF is larger than 25MB.".to_string(),
            _ => INVALID_FILE_MESSAGE.to_string(),
        }
    }
}

/// Check a candidate file before anything is sent. Returns its size.
pub fn validate_pdf(path: &Path) -> Result<u64, UploadError> {
    if path.as_os_str().is_empty() {
        return Err(UploadError::Empty);
    }
    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(UploadError::NotPdf(path.to_path_buf()));
    }
    let meta = std::fs::metadata(path).map_err(|_| UploadError::Missing(path.to_path_buf()))?;
    if !meta.is_file() {
        return Err(UploadError::Missing(path.to_path_buf()));
    }
    match meta.len() {
        0 => Err(UploadError::EmptyFile(path.to_path_buf())),
        bytes if bytes > MAX_UPLOAD_BYTES => Err(UploadError::TooLarge {
            path: path.to_path_buf(),
            bytes,
        }),
        bytes => Ok(bytes),
    }
}

/// Expand a leading `~/` so typed paths behave like they do in a shell
pub fn expand_path(input: &str) -> PathBuf {
    let trimmed = input.trim().trim_matches('"').trim_matches('\'');
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(trimmed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Done,
}

/// State behind the upload screen
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub path_input: String,
    pub status: UploadStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub selected: Option<PathBuf>,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            path_input: String::new(),
            status: UploadStatus::Idle,
            progress: 0,
            error: None,
            selected: None,
        }
    }
}

impl UploadForm {
    pub fn is_uploading(&self) -> bool {
        self.status == UploadStatus::Uploading
    }

    /// Validate the typed path and move into the uploading state
    pub fn begin(&mut self) -> Result<PathBuf, UploadError> {
        let path = expand_path(&self.path_input);
        match validate_pdf(&path) {
            Ok(_) => {
                self.error = None;
                self.progress = 0;
                self.status = UploadStatus::Uploading;
                self.selected = Some(path.clone());
                Ok(path)
            }
            Err(err) => {
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Progress is advisory and never moves backwards during one upload
    pub fn on_progress(&mut self, percent: u8) {
        if self.is_uploading() {
            self.progress = self.progress.max(percent.min(100));
        }
    }

    pub fn succeed(&mut self) {
        self.progress = 100;
        self.status = UploadStatus::Done;
    }

    pub fn fail(&mut self, err: &ApiError) {
        self.error = Some(err.user_message(UPLOAD_FAILED_MESSAGE));
        self.progress = 0;
        self.status = UploadStatus::Idle;
    }
}

/// Reader adapter that reports how much of a body has been streamed
pub struct ProgressReader<R> {
    inner: R,
    total: u64,
    read: u64,
    last_percent: Option<u8>,
    progress: ProgressFn,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, total: u64, progress: ProgressFn) -> Self {
        Self {
            inner,
            total,
            read: 0,
            last_percent: None,
            progress,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        if self.total > 0 {
            let percent = ((self.read.min(self.total) * 100) / self.total) as u8;
            if self.last_percent != Some(percent) {
                self.last_percent = Some(percent);
                (self.progress)(percent);
            }
        }
        Ok(n)
    }
}
