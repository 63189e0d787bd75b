//! Best-effort annotated copy of the input image.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::engine::RawOcrOutput;
use crate::error::VisualizationError;
use crate::normalize::NormalizedDetection;

const COLORS: [Rgb<u8>; 8] = [
    Rgb([255, 0, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 255, 0]),
    Rgb([255, 0, 255]),
    Rgb([0, 255, 255]),
    Rgb([255, 128, 0]),
    Rgb([128, 0, 255]),
];

#[derive(Debug, Clone, Default)]
pub struct VisualizationSettings {
    pub enabled: bool,
    /// Defaults to the directory of the running executable.
    pub output_dir: Option<PathBuf>,
}

pub fn file_name(now: DateTime<Local>) -> String {
    format!("ocr_visualization_{}.jpg", now.format("%Y%m%d_%H%M%S"))
}

fn output_dir(settings: &VisualizationSettings) -> Result<PathBuf, VisualizationError> {
    let dir = match &settings.output_dir {
        Some(dir) => dir.clone(),
        None => {
            let exe = std::env::current_exe().map_err(VisualizationError::OutputDir)?;
            exe.parent().map(PathBuf::from).ok_or_else(|| {
                let e = io::Error::other("executable has no parent directory");
                VisualizationError::OutputDir(e)
            })?
        }
    };
    fs::create_dir_all(&dir).map_err(VisualizationError::OutputDir)?;
    Ok(dir)
}

/// Draw every detection outline onto an RGB copy of `canvas`.
pub fn render(canvas: &DynamicImage, detections: &[NormalizedDetection]) -> RgbImage {
    let mut image = canvas.to_rgb8();

    for (i, detection) in detections.iter().enumerate() {
        let Some(points) = detection.bounding_box.as_deref() else {
            continue;
        };
        if points.len() < 2 {
            continue;
        }
        let color = COLORS[i % COLORS.len()];

        for (j, start) in points.iter().enumerate() {
            let end = points[(j + 1) % points.len()];
            let (x0, y0) = (start[0] as f32, start[1] as f32);
            let (x1, y1) = (end[0] as f32, end[1] as f32);
            draw_line_segment_mut(&mut image, (x0, y0), (x1, y1), color);
            // offset second pass thickens the outline
            draw_line_segment_mut(&mut image, (x0 + 1.0, y0 + 1.0), (x1 + 1.0, y1 + 1.0), color);
        }
    }

    image
}

fn save(
    canvas: &DynamicImage,
    detections: &[NormalizedDetection],
    settings: &VisualizationSettings,
) -> Result<PathBuf, VisualizationError> {
    let path = output_dir(settings)?.join(file_name(Local::now()));
    tracing::info!("Generating visualization image");
    render(canvas, detections).save(&path)?;
    tracing::info!("Visualization saved to: {}", path.display());
    Ok(path)
}

/// Write the annotated image if there is anything to show.
///
/// Returns `None` when skipped or when rendering fails; failures are only logged.
pub fn emit(
    output: &RawOcrOutput,
    detections: &[NormalizedDetection],
    settings: &VisualizationSettings,
) -> Option<PathBuf> {
    if !settings.enabled || detections.is_empty() {
        return None;
    }
    let Some(canvas) = output.canvas.as_ref() else {
        tracing::debug!("{}", VisualizationError::NotSupported);
        return None;
    };

    match save(canvas, detections, settings) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("Failed to generate visualization: {e}");
            None
        }
    }
}
