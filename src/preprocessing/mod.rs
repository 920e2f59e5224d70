//! Image conditioning for OCR on degraded industrial surfaces
//!
//! Turns a raw photograph into a binarized, deskewed image for the
//! recognition engine, plus a contrast-enhanced grayscale copy for diagnostics.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, PreprocessingResult, StepTiming};

use crate::error::OcrError;
use image::DynamicImage;

/// Run the full conditioning pipeline on a 1- or 3-channel 8-bit image
pub fn preprocess(image: &DynamicImage) -> Result<PreprocessingResult, OcrError> {
    Pipeline::new().process(image)
}
