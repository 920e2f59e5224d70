use crate::error::OcrError;
use image::GrayImage;

/// Four (x, y) vertices of a detected text region, in engine order
pub type Polygon = [[i32; 2]; 4];

/// One text region returned by a recognition engine
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub polygon: Polygon,
    pub text: String,
    /// Recognition confidence in [0, 1]
    pub confidence: f64,
}

impl Detection {
    pub fn new(polygon: Polygon, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence,
        }
    }
}

/// Parameters handed to the engine on every call
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
    /// Return polygons alongside text
    pub detail: bool,
    /// Merge regions into paragraphs
    pub paragraph: bool,
    /// Minimum text height in pixels
    pub min_text_height: u32,
    /// Character-detection threshold
    pub text_threshold: f32,
    /// Low-text linking threshold
    pub low_text: f32,
    pub link_threshold: f32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            detail: true,
            paragraph: false,
            min_text_height: 10,
            text_threshold: 0.6,
            low_text: 0.3,
            link_threshold: 0.3,
        }
    }
}

/// Trait that all recognition engines must implement
pub trait TextDetector: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Detect and recognize text regions in a binarized image.
    ///
    /// Detections come back in a stable, engine-defined order.
    fn detect(
        &self,
        image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<Detection>, OcrError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}
