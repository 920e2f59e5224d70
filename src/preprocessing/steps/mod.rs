//! Individual preprocessing steps, applied in this order:
//! grayscale, contrast, denoise, threshold, morphology, deskew.

pub mod contrast;
pub mod denoise;
pub mod deskew;
pub mod grayscale;
pub mod morphology;
pub mod threshold;
