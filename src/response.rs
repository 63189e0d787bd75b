//! The JSON documents written to stdout. Exactly one per invocation.

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::normalize::{self, NormalizedDetection};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ocr {
        success: bool,
        text: String,
        confidence: f64,
        detections: Vec<NormalizedDetection>,
        visualization_path: Option<String>,
    },
    Message {
        success: bool,
        message: String,
    },
    Error {
        success: bool,
        error: String,
    },
}

impl Response {
    /// Successful OCR result; `text` and `confidence` are derived from `detections`.
    pub fn ocr(detections: Vec<NormalizedDetection>, visualization_path: Option<&Path>) -> Self {
        Self::Ocr {
            success: true,
            text: normalize::combined_text(&detections),
            confidence: normalize::average_confidence(&detections),
            detections,
            visualization_path: visualization_path.map(|p| p.to_string_lossy().into_owned()),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error {
            success: false,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Self::Ocr { success, .. }
            | Self::Message { success, .. }
            | Self::Error { success, .. } => *success,
        }
    }
}

/// Serialize `response` as a single line and flush.
pub fn write_response(out: &mut impl Write, response: &Response) -> io::Result<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()
}
