//! Offline OCR for industrial stenciled text
//!
//! Conditions photographs of crates, boxes and labels for recognition,
//! runs a pluggable recognition engine and turns its raw detections into
//! cleaned, quality-scored JSON records with annotated verification images.

pub mod annotate;
pub mod cli;
pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod ocr;
pub mod preprocessing;
pub mod results;

pub use config::Config;
pub use engine::{Detection, DetectionParams, Polygon, TextDetector};
pub use engines::EngineHandle;
pub use error::OcrError;
pub use ocr::{BatchFailure, BatchReport, OcrProcessor, SavedArtifacts};
pub use results::{QualityTier, StructuredOutput};
