use std::future::Future;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The service answered with `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("could not read report file: {0}")]
    ReadFile(#[from] std::io::Error),
}

impl ApiError {
    /// True when the service itself reported the failure, as opposed to the
    /// request never producing a usable response.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub explanation: String,
    pub original_content: String,
}

#[derive(Serialize, Debug)]
pub struct TranslateRequest<'a> {
    pub text: &'a str,
    pub language: &'a str,
}

#[derive(Serialize, Debug)]
pub struct AskRequest<'a> {
    pub report_content: &'a str,
    pub question: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct UploadEnvelope {
    pub success: bool,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub original_content: String,
    pub message: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TranslateEnvelope {
    pub success: bool,
    #[serde(default)]
    pub translated_text: String,
    pub message: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AskEnvelope {
    pub success: bool,
    #[serde(default)]
    pub answer: String,
    pub message: Option<String>,
}

fn rejected(message: Option<String>) -> ApiError {
    ApiError::Rejected(message.unwrap_or_else(|| "Unknown error".to_string()))
}

impl UploadEnvelope {
    pub fn into_result(self) -> Result<UploadResult, ApiError> {
        if !self.success {
            return Err(rejected(self.message));
        }
        Ok(UploadResult {
            explanation: self.explanation,
            original_content: self.original_content,
        })
    }
}

impl TranslateEnvelope {
    pub fn into_result(self) -> Result<String, ApiError> {
        if self.success { Ok(self.translated_text) } else { Err(rejected(self.message)) }
    }
}

impl AskEnvelope {
    pub fn into_result(self) -> Result<String, ApiError> {
        if self.success { Ok(self.answer) } else { Err(rejected(self.message)) }
    }
}

/// The report service as seen by the page controller. Every reply carries a
/// `success` flag; on `false` the reason is in `message`.
pub trait ReportBackend: Send + Sync + 'static {
    /// `POST /upload` with the image as multipart field `file`.
    fn upload(&self, file: &Path) -> impl Future<Output = Result<UploadResult, ApiError>> + Send;

    /// `POST /translate`.
    fn translate(&self, text: &str, language: &str) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// `POST /ask`.
    fn ask(&self, report_content: &str, question: &str) -> impl Future<Output = Result<String, ApiError>> + Send;
}
