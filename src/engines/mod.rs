//! Recognition engine implementations
//!
//! This module contains implementations of the TextDetector trait for
//! different OCR backends. Engines are conditionally compiled based on
//! feature flags.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

use crate::config::Config;
use crate::engine::{Detection, DetectionParams, TextDetector};
use crate::error::OcrError;
use image::GrayImage;
use std::sync::Arc;

/// Owned handle to one initialized recognition engine.
///
/// Created explicitly with [`EngineHandle::initialize`] and released with
/// [`EngineHandle::shutdown`]. Cheap to share behind an `Arc`.
pub struct EngineHandle {
    detector: Arc<dyn TextDetector>,
}

impl EngineHandle {
    /// Initialize the engine selected at build time
    pub fn initialize(config: &Config) -> Result<Self, OcrError> {
        let detector = default_detector(config)?;
        Ok(Self::from_detector(detector))
    }

    /// Wrap an already constructed detector (e.g. a deterministic stub)
    pub fn from_detector(detector: Arc<dyn TextDetector>) -> Self {
        tracing::debug!("Engine {} ready", detector.name());
        Self { detector }
    }

    pub fn name(&self) -> &'static str {
        self.detector.name()
    }

    pub fn description(&self) -> &'static str {
        self.detector.description()
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.detector.supported_languages()
    }

    pub fn detect(
        &self,
        image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<Detection>, OcrError> {
        self.detector.detect(image, params)
    }

    /// Release the engine
    pub fn shutdown(self) {
        tracing::info!("Shutting down {} engine", self.name());
    }
}

#[cfg(feature = "engine-ocrs")]
fn default_detector(config: &Config) -> Result<Arc<dyn TextDetector>, OcrError> {
    tracing::info!("Initializing ocrs engine...");
    Ok(Arc::new(ocrs::OcrsEngine::new(config)?))
}

#[cfg(not(feature = "engine-ocrs"))]
fn default_detector(_config: &Config) -> Result<Arc<dyn TextDetector>, OcrError> {
    Err(OcrError::InitializationError(
        "No OCR engines available. Build with --features engine-ocrs".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    impl TextDetector for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn description(&self) -> &'static str {
            "Returns one canned detection"
        }

        fn detect(
            &self,
            _image: &GrayImage,
            _params: &DetectionParams,
        ) -> Result<Vec<Detection>, OcrError> {
            Ok(vec![Detection::new([[0, 0], [4, 0], [4, 4], [0, 4]], "A", 0.9)])
        }

        fn supported_languages(&self) -> Vec<String> {
            vec!["en".to_string()]
        }
    }

    #[test]
    fn test_handle_delegates_to_detector() {
        let handle = EngineHandle::from_detector(Arc::new(Fixed));
        assert_eq!(handle.name(), "fixed");
        assert_eq!(handle.supported_languages(), ["en"]);

        let detections = handle
            .detect(&GrayImage::new(8, 8), &DetectionParams::default())
            .unwrap();
        assert_eq!(detections.len(), 1);

        handle.shutdown();
    }
}
