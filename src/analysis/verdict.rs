// src/analysis/verdict.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_EXPLANATION: &str = "Analysis complete. Manual review recommended.";
pub const DEFAULT_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Fake,
    Real,
    Suspicious,
}

impl Verdict {
    /// Upper-cases the service's label. Missing, empty and unknown labels
    /// all read as `SUSPICIOUS`.
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label.map(|l| l.trim().to_uppercase()).filter(|l| !l.is_empty()) else {
            return Verdict::Suspicious;
        };
        match label.as_str() {
            "FAKE" => Verdict::Fake,
            "REAL" => Verdict::Real,
            "SUSPICIOUS" => Verdict::Suspicious,
            other => {
                log::warn!("Unknown verdict label {other:?}, showing it as SUSPICIOUS.");
                Verdict::Suspicious
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Fake => "FAKE",
            Verdict::Real => "REAL",
            Verdict::Suspicious => "SUSPICIOUS",
        }
    }

    /// Result panel heading.
    pub fn headline(&self) -> &'static str {
        match self {
            Verdict::Fake => "DEEPFAKE DETECTED",
            Verdict::Real => "AUTHENTIC",
            Verdict::Suspicious => "SUSPICIOUS",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color band of the fake-score gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Low,
    Elevated,
    High,
}

impl ScoreBand {
    pub fn for_percent(percent: u8) -> Self {
        if percent > 65 {
            ScoreBand::High
        } else if percent > 35 {
            ScoreBand::Elevated
        } else {
            ScoreBand::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub verdict: Verdict,
    /// Likelihood the media is fake, in `[0, 1]`.
    pub score: f64,
    pub explanation: String,
}

impl AnalysisResult {
    /// Normalizes whatever JSON the analysis service returned.
    pub fn from_response(value: &Value) -> Self {
        let verdict = Verdict::from_label(value.get("verdict").and_then(Value::as_str));

        let score = value
            .get("score")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_SCORE)
            .clamp(0.0, 1.0);

        let explanation = ["explanation", "report"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str).filter(|text| !text.is_empty()))
            .unwrap_or(DEFAULT_EXPLANATION)
            .to_string();

        Self { verdict, score, explanation }
    }

    pub fn fake_percent(&self) -> u8 {
        (self.score * 100.0).round() as u8
    }

    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::for_percent(self.fake_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lowercase_verdict_is_normalized() {
        let result = AnalysisResult::from_response(&json!({
            "verdict": "fake",
            "score": 0.83,
            "explanation": "Blending seams along the jawline."
        }));
        assert_eq!(result, AnalysisResult {
            verdict: Verdict::Fake,
            score: 0.83,
            explanation: "Blending seams along the jawline.".into(),
        });
        assert_eq!(result.fake_percent(), 83);
        assert_eq!(result.score_band(), ScoreBand::High);
    }

    #[test]
    fn missing_fields_fall_back() {
        let result = AnalysisResult::from_response(&json!({}));
        assert_eq!(result.verdict, Verdict::Suspicious);
        assert_eq!(result.score, 0.5);
        assert_eq!(result.explanation, DEFAULT_EXPLANATION);
        assert_eq!(result.score_band(), ScoreBand::Elevated);
    }

    #[test]
    fn explanation_falls_back_to_report() {
        let result = AnalysisResult::from_response(&json!({"verdict": "", "explanation": "", "report": "See frame 12."}));
        assert_eq!(result.verdict, Verdict::Suspicious);
        assert_eq!(result.explanation, "See frame 12.");
    }

    #[test]
    fn zero_score_is_kept_and_out_of_range_clamped() {
        assert_eq!(AnalysisResult::from_response(&json!({"score": 0})).score, 0.0);
        assert_eq!(AnalysisResult::from_response(&json!({"score": 1.7})).score, 1.0);
        assert_eq!(AnalysisResult::from_response(&json!({"score": "high"})).score, 0.5);
    }

    #[test]
    fn serializes_with_uppercase_verdict() {
        let result = AnalysisResult { verdict: Verdict::Real, score: 0.1, explanation: "ok".into() };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["verdict"], "REAL");
        assert_eq!(Verdict::Real.headline(), "AUTHENTIC");
    }

    #[test]
    fn unknown_labels_read_as_suspicious() {
        assert_eq!(Verdict::from_label(Some("deepfake")), Verdict::Suspicious);
        assert_eq!(Verdict::from_label(Some(" Real ")), Verdict::Real);
    }
}
