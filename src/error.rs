use thiserror::Error;

/// Terminal failures of a single OCR request.
///
/// Every variant ends the invocation with a `{"success": false}` document on stdout.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Input(String),

    #[error("Invalid base64 image data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("OCR engine error: {0}")]
    Engine(#[from] EngineError),
}

impl ServiceError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }
}

/// Failures raised while constructing or running the OCR engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("model file not found: {0}")]
    MissingModel(String),

    #[error("failed to initialize engine: {0}")]
    Init(String),

    #[error("recognition failed: {0}")]
    Recognize(String),

    #[error("no OCR backend compiled in (enable the `paddle` feature)")]
    Unavailable,
}

/// Rendering or writing the annotated image failed. Never fails a request.
#[derive(Debug, Error)]
pub enum VisualizationError {
    #[error("engine result cannot be rendered")]
    NotSupported,

    #[error("could not resolve output directory: {0}")]
    OutputDir(#[source] std::io::Error),

    #[error("failed to save visualization: {0}")]
    Save(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_error_message_is_verbatim() {
        let err = ServiceError::input("No image data provided");
        assert_eq!(err.to_string(), "No image data provided");
    }

    #[test]
    fn engine_error_is_prefixed() {
        let err = ServiceError::from(EngineError::MissingModel("models/det.mnn".into()));
        assert_eq!(
            err.to_string(),
            "OCR engine error: model file not found: models/det.mnn"
        );
    }
}
