//! Rendering of the analysis endpoint's response.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    LikelyDeepfake,
    LikelyReal,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::LikelyDeepfake => f.write_str("Likely Deepfake"),
            Verdict::LikelyReal => f.write_str("Likely Real"),
        }
    }
}

/// Scores from a `{"type": ..., "result": {"Realism": .., "Deepfake": ..}}`
/// response. Missing or non-numeric scores count as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub media_type: String,
    pub realism: f64,
    pub deepfake: f64,
}

fn score(result: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .filter_map(|k| result.get(*k))
        .find(|v| !v.is_null())
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        })
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

impl AnalysisReport {
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let media_type = obj
            .get("type")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("image")
            .to_string();
        let result = obj.get("result").cloned().unwrap_or(Value::Null);
        Some(Self {
            media_type,
            realism: score(&result, &["Realism", "realism"]),
            deepfake: score(&result, &["Deepfake", "deepfake"]),
        })
    }

    /// Ties go to "deepfake".
    pub fn verdict(&self) -> Verdict {
        if self.deepfake >= self.realism {
            Verdict::LikelyDeepfake
        } else {
            Verdict::LikelyReal
        }
    }

    pub fn realism_pct(&self) -> i64 {
        (self.realism * 100.0).round() as i64
    }

    pub fn deepfake_pct(&self) -> i64 {
        (self.deepfake * 100.0).round() as i64
    }
}

impl std::fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Analysis: {} ({})", self.verdict(), self.media_type)?;
        writeln!(f, "Realism: {}%", self.realism_pct())?;
        write!(f, "Deepfake: {}%", self.deepfake_pct())
    }
}

/// What the consumer shows under the preview.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedResult {
    Report(AnalysisReport),
    Text(String),
}

impl RenderedResult {
    /// JSON objects become a report; anything else is shown verbatim.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => match AnalysisReport::from_json(&value) {
                Some(report) => RenderedResult::Report(report),
                None => RenderedResult::Text(match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                }),
            },
            Err(_) => RenderedResult::Text(body.to_string()),
        }
    }
}

impl std::fmt::Display for RenderedResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderedResult::Report(report) => std::fmt::Display::fmt(report, f),
            RenderedResult::Text(text) => f.write_str(text),
        }
    }
}
