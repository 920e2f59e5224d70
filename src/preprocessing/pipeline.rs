use crate::error::OcrError;
use image::{DynamicImage, GrayImage};
use serde::Serialize;
use std::time::Instant;

use super::steps;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Binarized, deskewed image handed to the recognition engine
    #[serde(skip)]
    pub binarized: GrayImage,
    /// Contrast-enhanced grayscale image, kept for diagnostics
    #[serde(skip)]
    pub enhanced: GrayImage,
    /// Rotation applied by deskew, in degrees
    pub skew_angle: Option<f32>,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Fixed-order conditioning pipeline:
/// grayscale, CLAHE, bilateral denoise, adaptive threshold, closing, deskew
#[derive(Debug, Default, Clone, Copy)]
pub struct Pipeline;

impl Pipeline {
    pub fn new() -> Self {
        Self
    }

    /// Process an image. The input is never modified.
    pub fn process(&self, image: &DynamicImage) -> Result<PreprocessingResult, OcrError> {
        let start = Instant::now();
        let mut timings = Vec::new();

        tracing::debug!(
            "Starting preprocessing pipeline ({}x{}, {:?})",
            image.width(),
            image.height(),
            image.color()
        );

        let gray = self.run_step("grayscale", &mut timings, || steps::grayscale::apply(image))?;
        let enhanced = self.run_step("contrast", &mut timings, || Ok(steps::contrast::apply(&gray)))?;
        let denoised = self.run_step("denoise", &mut timings, || Ok(steps::denoise::apply(&enhanced)))?;
        let binary = self.run_step("threshold", &mut timings, || Ok(steps::threshold::apply(&denoised)))?;
        let closed = self.run_step("morphology", &mut timings, || Ok(steps::morphology::apply(&binary)))?;
        let (binarized, skew_angle) =
            self.run_step("deskew", &mut timings, || Ok(steps::deskew::apply(&closed)))?;

        if let Some(angle) = skew_angle {
            tracing::info!("Deskewed image by {:.2} degrees", angle);
        }

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!("Preprocessing completed in {}ms", total_time_ms);

        Ok(PreprocessingResult {
            binarized,
            enhanced,
            skew_angle,
            total_time_ms,
            steps: timings,
        })
    }

    fn run_step<T, F>(
        &self,
        name: &str,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<T, OcrError>
    where
        F: FnOnce() -> Result<T, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn()?;
        let time_ms = step_start.elapsed().as_millis() as u64;
        tracing::debug!("Step {} took {}ms", name, time_ms);
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms,
        });
        Ok(result)
    }
}
