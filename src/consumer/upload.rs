//! Upload handoff to the analysis endpoint.

use crate::dataurl::DataUrl;
use std::future::Future;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Raw endpoint response. The body is rendered, not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub status: u16,
    pub ok: bool,
    pub body: String,
}

pub trait Uploader: Send + Sync {
    fn upload(
        &self,
        image: &DataUrl,
    ) -> impl Future<Output = Result<UploadResponse, UploadError>> + Send;
}

/// Multipart POST of the decoded image under one form field.
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
    field: String,
    file_stem: String,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            field: field.into(),
            file_stem: "crop".to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Uploader for HttpUploader {
    async fn upload(&self, image: &DataUrl) -> Result<UploadResponse, UploadError> {
        let start = std::time::Instant::now();
        let filename = format!("{}.{}", self.file_stem, image.extension());
        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(filename)
            .mime_str(&image.mime)?;
        let form = reqwest::multipart::Form::new().part(self.field.clone(), part);

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        log::info!(
            "[CONSUMER] Upload to {} returned {} in {}ms ({} bytes)",
            self.endpoint,
            status,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(UploadResponse {
            status: status.as_u16(),
            ok: status.is_success(),
            body,
        })
    }
}
