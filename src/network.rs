use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Url, multipart};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::{
    ApiError, AskEnvelope, AskRequest, ReportBackend, TranslateEnvelope, TranslateRequest, UploadEnvelope, UploadResult,
};
use crate::config::Settings;
use crate::utils::guess_mime;

/// Talks to the report service over HTTP.
pub struct HttpBackend {
    client: Client,
    upload_url: Url,
    translate_url: Url,
    ask_url: Url,
}

impl HttpBackend {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let base = Url::parse(&settings.server_url)
            .with_context(|| format!("invalid server_url '{}'", settings.server_url))?;

        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            client,
            upload_url: base.join("/upload")?,
            translate_url: base.join("/translate")?,
            ask_url: base.join("/ask")?,
        })
    }
}

/// The HTTP status is not interpreted; the envelope's `success` flag decides.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;
    debug!(%status, bytes = body.len(), "response received");
    Ok(serde_json::from_slice(&body)?)
}

impl ReportBackend for HttpBackend {
    async fn upload(&self, file: &Path) -> Result<UploadResult, ApiError> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "report".to_string());
        debug!(file = %file.display(), size = bytes.len(), "uploading report");

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(guess_mime(file))?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(self.upload_url.clone()).multipart(form).send().await?;
        read_envelope::<UploadEnvelope>(response).await?.into_result()
    }

    async fn translate(&self, text: &str, language: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.translate_url.clone())
            .json(&TranslateRequest { text, language })
            .send()
            .await?;
        read_envelope::<TranslateEnvelope>(response).await?.into_result()
    }

    async fn ask(&self, report_content: &str, question: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(self.ask_url.clone())
            .json(&AskRequest { report_content, question })
            .send()
            .await?;
        read_envelope::<AskEnvelope>(response).await?.into_result()
    }
}
