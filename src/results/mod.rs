//! Turns raw engine detections into validated, scored, serializable records

pub mod quality;
pub mod record;
pub mod text;

pub use quality::QualityTier;
pub use record::{
    structure, structure_with_threshold, BoundingBox, Metadata, StructuredDetection,
    StructuredOutput, Summary, PROCESSING_VERSION,
};
pub use text::clean_text;
