// src/analysis/http.rs
use reqwest::multipart::{Form, Part};

use crate::analysis::error::TransportError;
use crate::analysis::upload::UploadFile;
use crate::analysis::{AnalysisTransport, TransportResponse};

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Sends the upload as a single multipart field named `file`, the way the
/// browser form does.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl AnalysisTransport for HttpTransport {
    async fn post_file(&self, url: &str, file: &UploadFile) -> Result<TransportResponse, TransportError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
