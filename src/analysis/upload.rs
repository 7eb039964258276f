// src/analysis/upload.rs
use std::path::Path;
use std::time::Duration;

use crate::analysis::error::{AnalyzeError, UploadError};
use crate::analysis::verdict::AnalysisResult;

/// Extensions the analysis service accepts, with the MIME type sent for each.
pub const ACCEPTED_TYPES: [(&str, &str); 8] = [
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
];

pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    ACCEPTED_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// MIME type is derived from the extension when not given.
    pub fn new(name: impl Into<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_type
            .filter(|m| !m.is_empty())
            .or_else(|| mime_for_name(&name).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        Self { name, mime_type, bytes }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(name, None, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size() as f64 / (1024.0 * 1024.0))
    }

    pub fn validate(&self, max_bytes: u64) -> Result<(), UploadError> {
        if mime_for_name(&self.name).is_none() {
            return Err(UploadError::UnsupportedType(self.name.clone()));
        }
        if self.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if self.size() > max_bytes {
            return Err(UploadError::TooLarge { size: self.size(), limit: max_bytes });
        }
        Ok(())
    }
}

pub const SCANNING_STEPS: [&str; 4] = [
    "Analyzing patterns…",
    "Checking compression artifacts…",
    "Detecting GAN traces…",
    "Generating forensic report…",
];

pub const SCAN_STEP_INTERVAL: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Active,
    Pending,
}

/// Cosmetic progress shown while the request is in flight. It walks the
/// step labels on a timer and holds at the last one; it is not tied to any
/// real progress of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanProgress {
    step: usize,
}

impl ScanProgress {
    pub fn at(elapsed: Duration) -> Self {
        let ticks = (elapsed.as_millis() / SCAN_STEP_INTERVAL.as_millis()) as usize;
        Self { step: ticks.min(SCANNING_STEPS.len() - 1) }
    }

    pub fn advance(&mut self) {
        self.step = (self.step + 1).min(SCANNING_STEPS.len() - 1);
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn label(&self) -> &'static str {
        SCANNING_STEPS[self.step]
    }

    pub fn status(&self, index: usize) -> StepStatus {
        if index < self.step {
            StepStatus::Done
        } else if index == self.step {
            StepStatus::Active
        } else {
            StepStatus::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Selected(UploadFile),
    Scanning { file: UploadFile, progress: ScanProgress },
    Finished(AnalysisResult),
}

/// Upload widget state: pick a file, scan it, show the result, start over.
#[derive(Debug, Clone)]
pub struct UploadSession {
    state: UploadState,
    max_bytes: u64,
}

impl UploadSession {
    pub fn new(max_bytes: u64) -> Self {
        Self { state: UploadState::Idle, max_bytes }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// Replaces any earlier selection. Rejected files leave the state alone.
    pub fn select(&mut self, file: UploadFile) -> Result<(), UploadError> {
        if matches!(self.state, UploadState::Scanning { .. }) {
            log::warn!("Ignoring file selection while a scan is running.");
            return Ok(());
        }
        file.validate(self.max_bytes)?;
        self.state = UploadState::Selected(file);
        Ok(())
    }

    /// Moves a selected file into scanning and hands it out for the request.
    pub fn begin(&mut self) -> Option<UploadFile> {
        let UploadState::Selected(file) = &self.state else {
            return None;
        };
        let file = file.clone();
        self.state = UploadState::Scanning { file: file.clone(), progress: ScanProgress::default() };
        Some(file)
    }

    pub fn tick(&mut self, elapsed: Duration) {
        if let UploadState::Scanning { progress, .. } = &mut self.state {
            *progress = ScanProgress::at(elapsed);
        }
    }

    /// Applies the outcome of the request. On failure the file stays selected
    /// so the user can retry, and the alert text is returned.
    pub fn finish(&mut self, outcome: Result<AnalysisResult, AnalyzeError>) -> Option<String> {
        let state = std::mem::replace(&mut self.state, UploadState::Idle);
        let UploadState::Scanning { file, .. } = state else {
            self.state = state;
            return None;
        };
        match outcome {
            Ok(result) => {
                self.state = UploadState::Finished(result);
                None
            }
            Err(err) => {
                log::error!("API Error: {err}");
                self.state = UploadState::Selected(file);
                Some(err.user_message())
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = UploadState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::verdict::Verdict;

    fn jpeg(size: usize) -> UploadFile {
        UploadFile::new("portrait.JPG", None, vec![0xFF; size])
    }

    #[test]
    fn mime_is_derived_from_extension() {
        assert_eq!(jpeg(1).mime_type, "image/jpeg");
        assert_eq!(UploadFile::new("clip.mov", None, vec![1]).mime_type, "video/quicktime");
        assert_eq!(UploadFile::new("clip.mov", Some("video/mp4".into()), vec![1]).mime_type, "video/mp4");
        assert_eq!(mime_for_name("notes.txt"), None);
    }

    #[test]
    fn validation_rejects_type_size_and_empty() {
        let limit = 20 * 1024 * 1024;
        assert!(jpeg(10).validate(limit).is_ok());
        assert_eq!(
            UploadFile::new("doc.pdf", None, vec![1]).validate(limit),
            Err(UploadError::UnsupportedType("doc.pdf".into()))
        );
        assert_eq!(jpeg(0).validate(limit), Err(UploadError::Empty));
        assert_eq!(jpeg(11).validate(10), Err(UploadError::TooLarge { size: 11, limit: 10 }));
    }

    #[test]
    fn progress_walks_steps_and_holds_at_last() {
        assert_eq!(ScanProgress::at(Duration::from_millis(0)).step(), 0);
        assert_eq!(ScanProgress::at(Duration::from_millis(1499)).step(), 0);
        assert_eq!(ScanProgress::at(Duration::from_millis(3000)).step(), 2);
        let last = ScanProgress::at(Duration::from_secs(90));
        assert_eq!(last.label(), "Generating forensic report…");

        let mut progress = ScanProgress::default();
        progress.advance();
        assert_eq!(progress.status(0), StepStatus::Done);
        assert_eq!(progress.status(1), StepStatus::Active);
        assert_eq!(progress.status(3), StepStatus::Pending);
    }

    #[test]
    fn session_round_trip_and_failure_keeps_selection() {
        let mut session = UploadSession::new(1024);
        assert!(session.begin().is_none());

        session.select(jpeg(10)).unwrap();
        let file = session.begin().expect("selected file");
        assert_eq!(file.name, "portrait.JPG");
        session.tick(Duration::from_secs(2));
        assert!(matches!(session.state(), UploadState::Scanning { progress, .. } if progress.step() == 1));

        let message = session.finish(Err(AnalyzeError::Timeout)).expect("alert text");
        assert!(message.starts_with("Request timed out"));
        assert!(matches!(session.state(), UploadState::Selected(_)));

        session.begin();
        let result = AnalysisResult { verdict: Verdict::Real, score: 0.02, explanation: "clean".into() };
        assert!(session.finish(Ok(result.clone())).is_none());
        assert_eq!(session.state(), &UploadState::Finished(result));

        session.reset();
        assert_eq!(session.state(), &UploadState::Idle);
    }

    #[test]
    fn rejected_selection_keeps_previous_state() {
        let mut session = UploadSession::new(1024);
        session.select(jpeg(10)).unwrap();
        assert!(session.select(jpeg(4096)).is_err());
        assert!(matches!(session.state(), UploadState::Selected(f) if f.bytes.len() == 10));
    }
}
