//! One request, end to end: stdin payload → engine → normalized JSON on the primary sink.

use std::io::{self, Read, Write};
use std::time::Instant;

use crate::engine::{self, EngineBuilder, EngineConfig, TextRecognizer};
use crate::error::ServiceError;
use crate::normalize;
use crate::request;
use crate::response::{Response, write_response};
use crate::visualize::{self, VisualizationSettings};

pub struct OcrService<B> {
    builder: B,
    engine_config: EngineConfig,
    visualization: VisualizationSettings,
}

impl<B: EngineBuilder> OcrService<B> {
    pub fn new(builder: B, visualization: VisualizationSettings) -> Self {
        Self {
            builder,
            engine_config: EngineConfig::TUNED,
            visualization,
        }
    }

    pub fn with_engine_config(mut self, engine_config: EngineConfig) -> Self {
        self.engine_config = engine_config;
        self
    }

    /// Decode, recognize and normalize a single request.
    pub fn process(&self, input: &mut impl Read) -> Result<Response, ServiceError> {
        let image = request::decode_payload(input)?;
        let output = engine::invoke(&self.builder, &self.engine_config, &image)?;
        drop(image);

        let detections = normalize::normalize(&output);
        tracing::info!(
            "Combined text length: {} characters",
            normalize::combined_text(&detections).chars().count()
        );
        tracing::info!(
            "Average confidence: {:.3}",
            normalize::average_confidence(&detections)
        );

        let visualization_path = visualize::emit(&output, &detections, &self.visualization);
        Ok(Response::ocr(detections, visualization_path.as_deref()))
    }

    /// Handle one request and write exactly one JSON document to `out`.
    ///
    /// Returns whether the request succeeded. Only a failure to write `out` is an `Err`.
    pub fn run(&self, input: &mut impl Read, out: &mut impl Write) -> io::Result<bool> {
        tracing::info!("OCR service starting");
        let started = Instant::now();

        let response = match self.process(input) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = ?e, "OCR service error: {e}");
                Response::error(e.to_string())
            }
        };

        tracing::info!(
            "Total processing time: {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        write_response(out, &response)?;
        if response.is_success() {
            tracing::info!("OCR service completed successfully");
        }
        Ok(response.is_success())
    }

    /// Check that the engine can be constructed. Never reads input.
    pub fn self_test(&self, out: &mut impl Write) -> io::Result<bool> {
        tracing::info!("Running engine self-test");
        let response = match self.builder.build(&self.engine_config) {
            Ok(engine) => {
                tracing::info!("{} initialization: OK", engine.name());
                Response::message("Standalone test passed")
            }
            Err(e) => {
                tracing::error!(error = ?e, "Self-test failed: {e}");
                Response::error("Standalone test failed")
            }
        };
        write_response(out, &response)?;
        Ok(response.is_success())
    }
}
