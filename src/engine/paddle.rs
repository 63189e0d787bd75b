//! PaddleOCR (PP-OCRv5) models running on MNN through `ocr-rs`.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocr_rs::{DetOptions, OcrEngine, OcrEngineConfig, TextBox};

use super::{EngineBuilder, EngineConfig, LimitType, RawOcrOutput, TextRecognizer};
use crate::error::EngineError;

pub const DET_MODEL: &str = "PP-OCRv5_mobile_det.mnn";
pub const REC_MODEL: &str = "latin_PP-OCRv5_mobile_rec_infer.mnn";
pub const CHARSET: &str = "ppocr_keys_latin.txt";

/// Loads the detection/recognition models from `model_dir`.
#[derive(Debug, Clone)]
pub struct PaddleBuilder {
    model_dir: PathBuf,
    threads: i32,
}

impl PaddleBuilder {
    pub fn new(model_dir: impl Into<PathBuf>, threads: i32) -> Self {
        Self {
            model_dir: model_dir.into(),
            threads,
        }
    }

    pub fn model_paths(&self) -> [PathBuf; 3] {
        let dir = Path::new(&self.model_dir);
        [dir.join(DET_MODEL), dir.join(REC_MODEL), dir.join(CHARSET)]
    }
}

impl EngineBuilder for PaddleBuilder {
    type Engine = PaddleEngine;

    fn build(&self, config: &EngineConfig) -> Result<PaddleEngine, EngineError> {
        let [det_path, rec_path, keys_path] = self.model_paths();

        for path in [&det_path, &rec_path, &keys_path] {
            if !path.exists() {
                return Err(EngineError::MissingModel(path.display().to_string()));
            }
        }

        tracing::debug!(?config, "Engine tuning");
        let engine = OcrEngine::new(
            &det_path,
            &rec_path,
            &keys_path,
            Some(engine_options(config, self.threads)),
        )
        .map_err(|e| EngineError::Init(e.to_string()))?;

        tracing::info!("OCR models loaded from {}", self.model_dir.display());
        Ok(PaddleEngine { engine })
    }
}

/// Translate the tuning constants into `ocr-rs` options.
///
/// `ocr-rs` never upscales, so for [`LimitType::Min`] the invoker resizes the image beforehand
/// and the detector only enforces `max_side_len`. Its DB post-process has no dilation switch;
/// `use_dilation` has no counterpart here.
fn engine_options(config: &EngineConfig, threads: i32) -> OcrEngineConfig {
    let mut det = DetOptions::new()
        .with_score_threshold(config.det_threshold)
        .with_box_threshold(config.box_threshold)
        .with_min_area(config.min_region_height.saturating_mul(config.min_region_height))
        .with_max_side_len(match config.limit_type {
            LimitType::Max => config.limit_side_len,
            LimitType::Min => config.max_side_len,
        });
    det.unclip_ratio = config.unclip_ratio;

    OcrEngineConfig::new()
        .with_threads(threads)
        .with_det_options(det)
        .with_min_result_confidence(config.min_text_score)
}

pub struct PaddleEngine {
    engine: OcrEngine,
}

impl TextRecognizer for PaddleEngine {
    fn name(&self) -> &str {
        "paddle-ocr"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<RawOcrOutput, EngineError> {
        let results = self
            .engine
            .recognize(image)
            .map_err(|e| EngineError::Recognize(e.to_string()))?;

        let mut texts = Vec::with_capacity(results.len());
        let mut scores = Vec::with_capacity(results.len());
        let mut boxes = Vec::with_capacity(results.len());
        for result in results {
            boxes.push(polygon(&result.bbox));
            scores.push(result.confidence);
            texts.push(result.text);
        }

        Ok(RawOcrOutput {
            texts: Some(texts),
            scores: Some(scores),
            boxes: Some(boxes),
            canvas: None,
        })
    }
}

/// Corner points of a text box, falling back to its axis-aligned rectangle.
fn polygon(text_box: &TextBox) -> Vec<[f32; 2]> {
    if let Some(points) = text_box.points {
        return points.iter().map(|p| [p.x, p.y]).collect();
    }
    let rect = text_box.rect;
    let (left, top) = (rect.left() as f32, rect.top() as f32);
    let (right, bottom) = (left + rect.width() as f32, top + rect.height() as f32);
    vec![[left, top], [right, top], [right, bottom], [left, bottom]]
}

#[cfg(test)]
mod tests {
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    use super::*;

    #[test]
    fn options_follow_tuning() {
        let options = engine_options(&EngineConfig::TUNED, 2);
        assert_eq!(options.thread_count, 2);
        assert_eq!(options.min_result_confidence, 0.3);
        assert_eq!(options.det_options.score_threshold, 0.05);
        assert_eq!(options.det_options.box_threshold, 0.1);
        assert_eq!(options.det_options.unclip_ratio, 2.0);
        assert_eq!(options.det_options.min_area, 1);
        assert_eq!(options.det_options.max_side_len, 4096);
    }

    #[test]
    fn max_limit_is_passed_to_detector() {
        let config = EngineConfig {
            limit_type: LimitType::Max,
            limit_side_len: 960,
            ..EngineConfig::TUNED
        };
        assert_eq!(engine_options(&config, 4).det_options.max_side_len, 960);
    }

    #[test]
    fn polygon_prefers_rotated_points() {
        let rect = Rect::at(10, 20).of_size(30, 5);
        let points = [
            Point::new(10.5, 20.0),
            Point::new(40.0, 21.0),
            Point::new(39.5, 26.0),
            Point::new(10.0, 25.0),
        ];
        let rotated = TextBox::with_points(rect, 0.9, points);
        assert_eq!(polygon(&rotated)[1], [40.0, 21.0]);

        let plain = TextBox::new(rect, 0.9);
        assert_eq!(
            polygon(&plain),
            vec![[10.0, 20.0], [40.0, 20.0], [40.0, 25.0], [10.0, 25.0]]
        );
    }

    #[test]
    fn missing_models_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let builder = PaddleBuilder::new(dir.path(), 1);
        match builder.build(&EngineConfig::TUNED) {
            Err(EngineError::MissingModel(path)) => assert!(path.ends_with(DET_MODEL)),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("engine built without models"),
        }
    }
}
