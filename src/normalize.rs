//! Turns raw engine arrays into the detection list and aggregates that go on the wire.

use serde::Serialize;

use crate::engine::{RawDetection, RawOcrOutput};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDetection {
    pub text: String,
    pub confidence: f64,
    pub bounding_box: Option<Vec<[f64; 2]>>,
}

impl From<RawDetection> for NormalizedDetection {
    fn from(raw: RawDetection) -> Self {
        Self {
            text: raw.text,
            confidence: raw.score.map(f64::from).unwrap_or(0.0),
            bounding_box: raw.polygon.map(|points| {
                points
                    .into_iter()
                    .map(|[x, y]| [round2(f64::from(x)), round2(f64::from(y))])
                    .collect()
            }),
        }
    }
}

impl NormalizedDetection {
    pub fn top_left(&self) -> Option<[f64; 2]> {
        self.bounding_box.as_ref()?.first().copied()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalize every detection in engine emission order, logging each one.
pub fn normalize(output: &RawOcrOutput) -> Vec<NormalizedDetection> {
    let raw = output.detections();
    if raw.is_empty() {
        tracing::warn!("No text detections found");
        return Vec::new();
    }

    tracing::info!("Found {} text detections", raw.len());
    let detections: Vec<NormalizedDetection> =
        raw.into_iter().map(NormalizedDetection::from).collect();

    for (i, detection) in detections.iter().enumerate() {
        match detection.top_left() {
            Some([x, y]) => tracing::info!(
                "Detection {}: '{}' (confidence: {:.3}) at ({x}, {y})",
                i + 1,
                detection.text,
                detection.confidence
            ),
            None => tracing::info!(
                "Detection {}: '{}' (confidence: {:.3})",
                i + 1,
                detection.text,
                detection.confidence
            ),
        }
    }

    detections
}

pub fn combined_text(detections: &[NormalizedDetection]) -> String {
    detections
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn average_confidence(detections: &[NormalizedDetection]) -> f64 {
    if detections.is_empty() {
        return 0.0;
    }
    detections.iter().map(|d| d.confidence).sum::<f64>() / detections.len() as f64
}
