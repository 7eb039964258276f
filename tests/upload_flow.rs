#![cfg(not(target_arch = "wasm32"))]

use std::cell::RefCell;
use std::future::pending;
use std::time::Duration;

use deepguard_viz::analysis::{
    self, AnalysisTransport, AnalyzeError, TransportError, TransportResponse, UploadFile,
    UploadSession, UploadState, Verdict,
};
use deepguard_viz::config::AnalysisConfig;

enum Reply {
    Respond(u16, &'static str),
    Refuse(&'static str),
    Hang,
}

/// Answers every upload with a canned reply and remembers what it was sent.
struct CannedTransport {
    reply: Reply,
    seen: RefCell<Vec<(String, String, String)>>,
}

impl CannedTransport {
    fn new(reply: Reply) -> Self {
        Self { reply, seen: RefCell::new(Vec::new()) }
    }
}

impl AnalysisTransport for CannedTransport {
    async fn post_file(&self, url: &str, file: &UploadFile) -> Result<TransportResponse, TransportError> {
        self.seen
            .borrow_mut()
            .push((url.to_string(), file.name.clone(), file.mime_type.clone()));
        match self.reply {
            Reply::Respond(status, body) => Ok(TransportResponse { status, body: body.to_string() }),
            Reply::Refuse(reason) => Err(TransportError(reason.to_string())),
            Reply::Hang => pending().await,
        }
    }
}

fn photo() -> UploadFile {
    UploadFile::new("selfie.png", None, vec![0x89, b'P', b'N', b'G'])
}

async fn run(transport: &CannedTransport) -> Result<analysis::AnalysisResult, AnalyzeError> {
    let config = AnalysisConfig::default();
    analysis::analyze(transport, &config.endpoint(), &photo(), analysis::deadline(config.timeout())).await
}

#[tokio::test(start_paused = true)]
async fn fake_verdict_is_normalized() {
    let transport = CannedTransport::new(Reply::Respond(
        200,
        r#"{"verdict":"fake","score":0.83,"explanation":"Inconsistent eye reflections."}"#,
    ));

    let result = run(&transport).await.unwrap();
    assert_eq!(result.verdict, Verdict::Fake);
    assert_eq!(result.score, 0.83);
    assert_eq!(result.explanation, "Inconsistent eye reflections.");
    assert_eq!(result.fake_percent(), 83);

    let seen = transport.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "https://pre-hackathon-jklu.onrender.com/analyze");
    assert_eq!(seen[0].1, "selfie.png");
    assert_eq!(seen[0].2, "image/png");
}

#[tokio::test(start_paused = true)]
async fn hung_request_times_out_after_deadline() {
    let transport = CannedTransport::new(Reply::Hang);
    let started = tokio::time::Instant::now();

    let err = run(&transport).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(started.elapsed() >= Duration::from_secs(120));
    assert_eq!(
        err.user_message(),
        "Request timed out. The backend server may be starting up (cold start). Please try again in 30 seconds."
    );
}

#[tokio::test(start_paused = true)]
async fn refused_connection_is_not_a_timeout() {
    let transport = CannedTransport::new(Reply::Refuse("connection refused"));

    let err = run(&transport).await.unwrap_err();
    assert!(!err.is_timeout());
    assert_eq!(err.user_message(), "Failed to connect to the backend. connection refused");
}

#[tokio::test(start_paused = true)]
async fn server_error_reports_status_only() {
    let transport = CannedTransport::new(Reply::Respond(500, "model failed to load"));

    let err = run(&transport).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::Server { status: 500, ref body } if body == "model failed to load"));
    assert_eq!(err.user_message(), "Failed to connect to the backend. Server error: 500");
}

#[tokio::test(start_paused = true)]
async fn malformed_body_is_a_decode_error() {
    let transport = CannedTransport::new(Reply::Respond(200, "<html>gateway</html>"));

    let err = run(&transport).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::Decode(_)));
    assert!(err.user_message().starts_with("Failed to connect to the backend. Invalid response:"));
}

#[tokio::test(start_paused = true)]
async fn sparse_response_falls_back_to_defaults() {
    let transport = CannedTransport::new(Reply::Respond(200, r#"{"verdict":"real"}"#));

    let result = run(&transport).await.unwrap();
    assert_eq!(result.verdict, Verdict::Real);
    assert_eq!(result.score, 0.5);
    assert_eq!(result.explanation, "Analysis complete. Manual review recommended.");
}

#[tokio::test(start_paused = true)]
async fn session_retries_after_failure() {
    let mut session = UploadSession::new(AnalysisConfig::default().max_upload_bytes);
    session.select(photo()).unwrap();

    session.begin().unwrap();
    let failed = run(&CannedTransport::new(Reply::Hang)).await;
    let message = session.finish(failed).unwrap();
    assert!(message.starts_with("Request timed out."));
    assert!(matches!(session.state(), UploadState::Selected(file) if file.name == "selfie.png"));

    session.begin().unwrap();
    let ok = run(&CannedTransport::new(Reply::Respond(200, r#"{"verdict":"SUSPICIOUS","score":0.4}"#))).await;
    assert!(session.finish(ok).is_none());
    let UploadState::Finished(result) = session.state() else {
        panic!("expected a finished session");
    };
    assert_eq!(result.verdict.headline(), "SUSPICIOUS");
}
