//! Turns a [`Diagnosis`] into display text.

use std::fmt;

use serde::Serialize;

use crate::diagnosis::Diagnosis;

/// Display-ready form of a diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedResult {
    /// `Prediction: <label>`.
    pub heading: String,
    /// `Confidence: 87.0%`.
    pub confidence_line: String,
    /// Width of the confidence bar, `0.0..=100.0`.
    pub confidence_percent: f64,
    /// Per-class probabilities, highest first: `Benign: 62.0% | Normal: 30.0%`.
    pub probabilities_line: Option<String>,
    /// `Analysis mode: combined`.
    pub mode_line: Option<String>,
}

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

pub fn render(diagnosis: &Diagnosis) -> RenderedResult {
    let probabilities_line = diagnosis
        .probabilities
        .as_ref()
        .filter(|p| !p.is_empty())
        .map(|probs| {
            let mut ranked: Vec<(&String, &f64)> = probs.iter().collect();
            ranked.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
            ranked
                .into_iter()
                .map(|(label, p)| format!("{label}: {}", percent(*p)))
                .collect::<Vec<_>>()
                .join(" | ")
        });

    RenderedResult {
        heading: format!("Prediction: {}", diagnosis.label),
        confidence_line: format!("Confidence: {}", percent(diagnosis.confidence)),
        confidence_percent: (diagnosis.confidence * 100.0).clamp(0.0, 100.0),
        probabilities_line,
        mode_line: diagnosis
            .mode
            .as_ref()
            .map(|m| format!("Analysis mode: {m}")),
    }
}

impl RenderedResult {
    /// Text bar of `width` cells filled in proportion to the confidence.
    pub fn confidence_bar(&self, width: usize) -> String {
        let filled = ((self.confidence_percent / 100.0) * width as f64).round() as usize;
        let filled = filled.min(width);
        format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
    }
}

impl fmt::Display for RenderedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        writeln!(f, "{} {}", self.confidence_line, self.confidence_bar(20))?;
        if let Some(line) = &self.probabilities_line {
            writeln!(f, "{line}")?;
        }
        if let Some(line) = &self.mode_line {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
