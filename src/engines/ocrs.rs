//! Recognition backend built on the ocrs neural OCR library
//!
//! Detection and recognition networks are fetched once into the user cache
//! directory and loaded from there on later runs.

use crate::config::Config;
use crate::engine::{Detection, DetectionParams, Polygon, TextDetector};
use crate::error::OcrError;
use image::{DynamicImage, GrayImage};
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};

const MODEL_BASE_URL: &str = "https://ocrs-models.s3-accelerate.amazonaws.com";
const DETECTION_MODEL: &str = "text-detection.rten";
const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Recognition engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: OcrsOcrEngine,
}

impl OcrsEngine {
    /// Create a new engine, downloading models if needed
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        if config.use_gpu {
            tracing::warn!("GPU acceleration is not available for ocrs; running on CPU");
        }
        if !is_supported_language(&config.language) {
            tracing::warn!(
                "Language '{}' is not supported by ocrs; recognizing Latin script only",
                config.language
            );
        }

        let cache = model_cache_dir()?;
        let detection_model = load_model(&cache, DETECTION_MODEL)?;
        let recognition_model = load_model(&cache, RECOGNITION_MODEL)?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| OcrError::InitializationError(format!("ocrs engine setup: {}", e)))?;

        tracing::info!("ocrs engine ready");

        Ok(Self { engine })
    }
}

impl TextDetector for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "ocrs neural text detection and line recognition (CPU)"
    }

    fn detect(
        &self,
        image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<Detection>, OcrError> {
        // ocrs has no tunable detection thresholds; only the size filter applies
        tracing::debug!(
            "ocrs detect: min_text_height={}, text_threshold={}, low_text={}, link_threshold={}",
            params.min_text_height,
            params.text_threshold,
            params.low_text,
            params.link_threshold
        );

        let rgb = DynamicImage::ImageLuma8(image.clone()).into_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| engine_error("image source", e))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| engine_error("input preparation", e))?;

        let words = self
            .engine
            .detect_words(&input)
            .map_err(|e| engine_error("word detection", e))?;
        // One detection region per text line
        let line_rects = self.engine.find_text_lines(&input, &words);
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|e| engine_error("recognition", e))?;

        let detections = line_rects
            .iter()
            .zip(line_texts.iter())
            .filter_map(|(line_words, line)| {
                let line = line.as_ref()?;
                let corners = line_words.iter().flat_map(|rect| rect.corners());
                let polygon = enclosing_quad(corners.map(|c| (c.x, c.y)))?;
                let text = line.to_string();
                Some(Detection::new(polygon, text.trim(), line_confidence(&text)))
            })
            .filter(|d| region_extent(&d.polygon) >= params.min_text_height as i32)
            .collect();

        Ok(detections)
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["en".to_string()]
    }
}

fn engine_error(stage: &str, e: impl std::fmt::Display) -> OcrError {
    OcrError::ProcessingError(format!("ocrs {} failed: {}", stage, e))
}

fn is_supported_language(code: &str) -> bool {
    matches!(code.to_lowercase().as_str(), "en" | "eng")
}

/// Axis-aligned quadrilateral (clockwise from top-left) enclosing `points`
fn enclosing_quad(points: impl Iterator<Item = (f32, f32)>) -> Option<Polygon> {
    let (min_x, min_y, max_x, max_y) = points.fold(None, |acc, (x, y)| match acc {
        None => Some((x, y, x, y)),
        Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
    })?;
    let (x0, y0, x1, y1) = (min_x as i32, min_y as i32, max_x as i32, max_y as i32);
    Some([[x0, y0], [x1, y0], [x1, y1], [x0, y1]])
}

/// Larger side of the region's bounding box
fn region_extent(polygon: &Polygon) -> i32 {
    let xs = polygon.iter().map(|p| p[0]);
    let ys = polygon.iter().map(|p| p[1]);
    let width = xs.clone().max().unwrap_or(0) - xs.min().unwrap_or(0);
    let height = ys.clone().max().unwrap_or(0) - ys.min().unwrap_or(0);
    width.max(height)
}

/// Confidence for one recognized line.
///
/// ocrs reports no recognition scores, so the line is judged by how much it
/// looks like an industrial code: mostly letters, digits and separators, no
/// long runs of a repeated glyph, and more than a couple of characters.
fn line_confidence(text: &str) -> f64 {
    let text = text.trim();
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }

    let code_chars = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .count();
    let charset_score = code_chars as f64 / total as f64;

    let length_score = match total {
        1 => 0.5,
        2..=3 => 0.8,
        _ => 1.0,
    };

    let confidence = 0.6 * charset_score + 0.2 * length_score + 0.2 * repetition_score(text);
    confidence.clamp(0.0, 1.0)
}

/// Penalize runs like "llll" or "####" that usually mean OCR confusion
fn repetition_score(text: &str) -> f64 {
    let mut max_repeat = 1;
    let mut current = 1;
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if Some(c) == prev && !c.is_whitespace() {
            current += 1;
            max_repeat = max_repeat.max(current);
        } else {
            current = 1;
        }
        prev = Some(c);
    }

    match max_repeat {
        1..=3 => 1.0,
        4..=5 => 0.8,
        6..=10 => 0.5,
        _ => 0.2,
    }
}

fn model_cache_dir() -> Result<PathBuf, OcrError> {
    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("stencil-ocr");
    std::fs::create_dir_all(&dir).map_err(|e| {
        OcrError::InitializationError(format!("model cache {}: {}", dir.display(), e))
    })?;
    Ok(dir)
}

/// Load a network from the cache, fetching it first when absent
fn load_model(cache: &Path, name: &str) -> Result<Model, OcrError> {
    let path = cache.join(name);
    if path.exists() {
        tracing::debug!("Model {} found at {}", name, path.display());
    } else {
        let url = format!("{}/{}", MODEL_BASE_URL, name);
        tracing::info!("Fetching model {} from {}", name, url);
        fetch(&url, &path)?;
    }

    Model::load_file(&path)
        .map_err(|e| OcrError::InitializationError(format!("model {}: {}", name, e)))
}

/// Fetch `url` into `dest`; partial downloads never land at `dest`
fn fetch(url: &str, dest: &Path) -> Result<(), OcrError> {
    let bytes = ureq::get(url)
        .call()
        .map_err(|e| download_error(url, e))?
        .into_body()
        .read_to_vec()
        .map_err(|e| download_error(url, e))?;

    let partial = dest.with_extension("part");
    std::fs::write(&partial, &bytes).map_err(|e| download_error(url, e))?;
    std::fs::rename(&partial, dest).map_err(|e| download_error(url, e))?;
    tracing::info!("Stored {} ({} bytes)", dest.display(), bytes.len());
    Ok(())
}

fn download_error(url: &str, e: impl std::fmt::Display) -> OcrError {
    OcrError::InitializationError(format!("download {}: {}", url, e))
}
