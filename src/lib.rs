//! Single-shot OCR over stdio.
//!
//! Reads `{"image": "<base64>"}` from stdin, runs the OCR engine with a fixed recall-oriented
//! tuning and writes exactly one JSON document to stdout. Diagnostics go to stderr through
//! `tracing` and never touch stdout.

pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod request;
pub mod response;
pub mod service;
pub mod visualize;

pub use engine::{EngineBuilder, EngineConfig, RawOcrOutput, TextRecognizer};
pub use error::{EngineError, ServiceError};
pub use response::Response;
pub use service::OcrService;
