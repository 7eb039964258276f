// src/analysis/mod.rs
// Client side of the media analysis service: validate the upload, POST it,
// race the request against a deadline and normalize whatever comes back.
pub mod error;
pub mod http;
pub mod upload;
pub mod verdict;

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{Either, select};
use serde_json::Value;

pub use error::{AnalyzeError, TransportError, UploadError};
pub use http::HttpTransport;
pub use upload::{ScanProgress, UploadFile, UploadSession, UploadState};
pub use verdict::{AnalysisResult, ScoreBand, Verdict};

/// Raw HTTP outcome: any status, body as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[allow(async_fn_in_trait)]
pub trait AnalysisTransport {
    async fn post_file(&self, url: &str, file: &UploadFile) -> Result<TransportResponse, TransportError>;
}

/// Resolves once `duration` has elapsed on the platform timer.
pub async fn deadline(duration: Duration) {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
            gloo::timers::future::TimeoutFuture::new(millis).await;
        } else {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Posts `file` to `endpoint`. Whichever finishes first wins: the response
/// or `deadline`. A request that loses the race is dropped, which aborts it.
pub async fn analyze<T, D>(
    transport: &T,
    endpoint: &str,
    file: &UploadFile,
    deadline: D,
) -> Result<AnalysisResult, AnalyzeError>
where
    T: AnalysisTransport + ?Sized,
    D: Future<Output = ()>,
{
    log::info!("Uploading {} ({}, {}) to {}", file.name, file.mime_type, file.size_label(), endpoint);

    let request = pin!(transport.post_file(endpoint, file));
    let deadline = pin!(deadline);
    let response = match select(request, deadline).await {
        Either::Left((response, _)) => response?,
        Either::Right(((), _)) => {
            log::warn!("Analysis of {} timed out.", file.name);
            return Err(AnalyzeError::Timeout);
        }
    };

    if !response.is_success() {
        log::error!("Server error {}: {}", response.status, response.body);
        return Err(AnalyzeError::Server { status: response.status, body: response.body });
    }

    let value: Value = serde_json::from_str(&response.body)?;
    let result = AnalysisResult::from_response(&value);
    log::info!("Verdict for {}: {} (score {:.2})", file.name, result.verdict, result.score);
    Ok(result)
}
