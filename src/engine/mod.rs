//! OCR engine seam: tuning constants, the recognizer trait and the raw output it produces.

#[cfg(feature = "paddle")]
pub mod paddle;

use std::time::Instant;

use image::DynamicImage;
use image::imageops::FilterType;

use crate::error::EngineError;

/// How `limit_side_len` constrains the image handed to text detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitType {
    /// Upscale until the shorter side reaches the limit.
    Min,
    /// Downscale until the longer side fits within the limit.
    Max,
}

/// Fixed engine tuning.
///
/// The values lean towards recall: small regions, faint pixels and weak lines are kept
/// instead of being dropped before recognition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Smallest text region height (px) the detector keeps.
    pub min_region_height: u32,
    /// Skip images whose long/short side ratio exceeds this. `None` disables the check.
    pub max_aspect_ratio: Option<f32>,
    pub limit_type: LimitType,
    pub limit_side_len: u32,
    /// Upper bound on the long side after the [`LimitType::Min`] upscale. Extreme aspect ratios
    /// get a smaller factor (never below 1) instead of growing past this.
    pub max_side_len: u32,
    /// Pixel binarization threshold of the detection map.
    pub det_threshold: f32,
    /// Minimum mean score for a detected box.
    pub box_threshold: f32,
    /// Region expansion ratio applied to detected contours.
    pub unclip_ratio: f32,
    pub use_dilation: bool,
    /// Recognized lines scoring below this are discarded.
    pub min_text_score: f32,
}

impl EngineConfig {
    pub const TUNED: Self = Self {
        min_region_height: 1,
        max_aspect_ratio: None,
        limit_type: LimitType::Min,
        limit_side_len: 1920,
        max_side_len: 4096,
        det_threshold: 0.05,
        box_threshold: 0.1,
        unclip_ratio: 2.0,
        use_dilation: true,
        min_text_score: 0.3,
    };

    /// Factor the image is resized by before detection.
    ///
    /// Only [`LimitType::Min`] is applied here; the engine enforces the max-side cap itself.
    /// The factor is clamped so the long side stays within `max_side_len`.
    pub fn detection_scale(&self, width: u32, height: u32) -> f64 {
        let (long, short) = (width.max(height), width.min(height));
        match self.limit_type {
            LimitType::Min if short > 0 && short < self.limit_side_len => {
                let wanted = f64::from(self.limit_side_len) / f64::from(short);
                let ceiling = f64::from(self.max_side_len) / f64::from(long);
                wanted.min(ceiling).max(1.0)
            }
            _ => 1.0,
        }
    }

    pub fn exceeds_aspect_ratio(&self, width: u32, height: u32) -> bool {
        let Some(max_ratio) = self.max_aspect_ratio else {
            return false;
        };
        let (long, short) = (width.max(height), width.min(height));
        short == 0 || long as f32 / short as f32 > max_ratio
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::TUNED
    }
}

/// One detection as read from the engine's parallel arrays.
///
/// Missing entries stay `None` here and are defaulted during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDetection {
    pub text: String,
    pub score: Option<f32>,
    pub polygon: Option<Vec<[f32; 2]>>,
}

/// Engine output: parallel text / score / geometry arrays, indexed in lock-step.
///
/// `canvas` holds the image detections refer to when the result can be rendered.
#[derive(Debug, Clone, Default)]
pub struct RawOcrOutput {
    pub texts: Option<Vec<String>>,
    pub scores: Option<Vec<f32>>,
    pub boxes: Option<Vec<Vec<[f32; 2]>>>,
    pub canvas: Option<DynamicImage>,
}

impl RawOcrOutput {
    pub fn can_render(&self) -> bool {
        self.canvas.is_some()
    }

    /// Pair every text with the score and polygon at the same index.
    pub fn detections(&self) -> Vec<RawDetection> {
        let Some(texts) = self.texts.as_deref() else {
            return Vec::new();
        };
        let scores = self.scores.as_deref().unwrap_or_default();
        let boxes = self.boxes.as_deref().unwrap_or_default();

        if scores.len() < texts.len() {
            tracing::warn!(
                texts = texts.len(),
                scores = scores.len(),
                "score array shorter than text array, missing confidences default to 0.0"
            );
        }
        if boxes.len() < texts.len() {
            tracing::warn!(
                texts = texts.len(),
                boxes = boxes.len(),
                "geometry array shorter than text array, missing boxes become null"
            );
        }

        texts
            .iter()
            .enumerate()
            .map(|(i, text)| RawDetection {
                text: text.clone(),
                score: scores.get(i).copied(),
                polygon: boxes.get(i).cloned(),
            })
            .collect()
    }

    /// Map geometry produced on a resized image back to the original coordinates.
    fn unscale(&mut self, factor: f64) {
        if factor == 1.0 {
            return;
        }
        for polygon in self.boxes.iter_mut().flatten() {
            for point in polygon.iter_mut() {
                point[0] = (f64::from(point[0]) / factor) as f32;
                point[1] = (f64::from(point[1]) / factor) as f32;
            }
        }
    }
}

/// A constructed OCR engine.
pub trait TextRecognizer {
    fn name(&self) -> &str;

    fn recognize(&self, image: &DynamicImage) -> Result<RawOcrOutput, EngineError>;

    /// Whether results from this engine can be rendered onto the source image.
    fn supports_visualization(&self) -> bool {
        true
    }
}

/// Constructs a [`TextRecognizer`] for one invocation.
pub trait EngineBuilder {
    type Engine: TextRecognizer;

    fn build(&self, config: &EngineConfig) -> Result<Self::Engine, EngineError>;
}

/// Stand-in used when the binary is compiled without any OCR backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl TextRecognizer for Unavailable {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<RawOcrOutput, EngineError> {
        Err(EngineError::Unavailable)
    }
}

impl EngineBuilder for Unavailable {
    type Engine = Unavailable;

    fn build(&self, _config: &EngineConfig) -> Result<Unavailable, EngineError> {
        Err(EngineError::Unavailable)
    }
}

/// Build the engine and run it on `image`, applying the tuning the engine can't express itself.
pub fn invoke<B: EngineBuilder>(
    builder: &B,
    config: &EngineConfig,
    image: &DynamicImage,
) -> Result<RawOcrOutput, EngineError> {
    tracing::info!("Initializing OCR engine");
    let engine = builder.build(config)?;
    tracing::info!("OCR engine initialized: {}", engine.name());

    let (width, height) = (image.width(), image.height());
    if config.exceeds_aspect_ratio(width, height) {
        tracing::warn!("Skipping OCR: {width}x{height} exceeds the aspect ratio limit");
        return Ok(RawOcrOutput::default());
    }

    let scale = config.detection_scale(width, height);
    let scaled;
    let input = if scale > 1.0 {
        let cap = f64::from(config.max_side_len.max(1));
        let target_w = (f64::from(width) * scale).round().clamp(1.0, cap) as u32;
        let target_h = (f64::from(height) * scale).round().clamp(1.0, cap) as u32;
        tracing::debug!("Upscaling {width}x{height} to {target_w}x{target_h} for detection");
        scaled = image.resize_exact(target_w, target_h, FilterType::Triangle);
        &scaled
    } else {
        image
    };

    tracing::info!("Performing OCR on image");
    let started = Instant::now();
    let mut output = engine.recognize(input)?;
    tracing::info!(
        "OCR completed in {:.2} seconds",
        started.elapsed().as_secs_f64()
    );

    output.unscale(scale);
    if engine.supports_visualization() {
        output.canvas = Some(image.clone());
    }
    Ok(output)
}
