//! End-to-end processing: load, condition, recognize, structure, save

use crate::annotate::{annotate, load_system_font};
use crate::config::Config;
use crate::engine::Detection;
use crate::engines::EngineHandle;
use crate::error::OcrError;
use crate::preprocessing;
use crate::results::{structure_with_threshold, StructuredOutput};
use ab_glyph::FontVec;
use futures::stream::{self, StreamExt};
use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Image extensions picked up in batch mode
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff"];

/// Paths of the artifacts written for one image
#[derive(Debug, Clone)]
pub struct SavedArtifacts {
    pub json_path: PathBuf,
    pub image_path: PathBuf,
}

/// A batch entry that could not be processed
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub code: &'static str,
    pub error: String,
}

/// Outcome of a batch run, in input enumeration order
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successfully processed images
    pub results: Vec<StructuredOutput>,
    /// Number of image files found
    pub total: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }
}

/// OCR pipeline bound to one engine and one configuration
#[derive(Clone)]
pub struct OcrProcessor {
    engine: Arc<EngineHandle>,
    config: Arc<Config>,
    font: Option<Arc<FontVec>>,
}

impl OcrProcessor {
    /// Create a processor; the output directory is created here
    pub fn new(engine: EngineHandle, config: Config) -> Result<Self, OcrError> {
        std::fs::create_dir_all(&config.output_dir)?;
        tracing::info!(
            "OCR processor ready (engine: {}, output: {})",
            engine.name(),
            config.output_dir.display()
        );
        Ok(Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
            font: load_system_font().map(Arc::new),
        })
    }

    /// Release the engine. Returns `false` if a clone of this processor
    /// still holds it; it is then released when the last clone drops.
    pub fn shutdown(self) -> bool {
        match Arc::try_unwrap(self.engine) {
            Ok(engine) => {
                engine.shutdown();
                true
            }
            Err(_) => {
                tracing::warn!("Engine still in use; release deferred");
                false
            }
        }
    }

    /// Call the engine on a conditioned image.
    ///
    /// Engine failures are logged and degrade to zero detections.
    pub fn run_ocr(&self, binarized: &GrayImage) -> Vec<Detection> {
        tracing::info!("Running OCR inference...");
        match self.engine.detect(binarized, &self.config.detection) {
            Ok(detections) => {
                for d in &detections {
                    tracing::info!("Detected: '{}' (confidence: {:.3})", d.text, d.confidence);
                }
                tracing::info!("OCR completed: {} text regions detected", detections.len());
                detections
            }
            Err(e) => {
                tracing::error!("OCR inference failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Condition, recognize and structure an already decoded image
    pub fn process_loaded(
        &self,
        image: &DynamicImage,
        filename: &str,
    ) -> Result<StructuredOutput, OcrError> {
        let preprocessed = preprocessing::preprocess(image)?;
        let detections = self.run_ocr(&preprocessed.binarized);
        Ok(structure_with_threshold(
            &detections,
            filename,
            self.config.min_confidence,
        ))
    }

    /// Complete pipeline for one image file, including saved artifacts
    pub fn process_image(&self, path: &Path) -> Result<StructuredOutput, OcrError> {
        tracing::info!("Processing image: {}", path.display());
        let start = Instant::now();

        let image = image::open(path)
            .map(to_pipeline_layout)
            .map_err(|source| OcrError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = self.process_loaded(&image, &filename)?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.save_results(&output, &image, &stem)?;

        tracing::info!(
            "Processing completed in {}ms ({} detections, quality {})",
            start.elapsed().as_millis(),
            output.metadata().total_detections,
            output.quality()
        );
        Ok(output)
    }

    /// Write `<stem>.json` and `<stem>_annotated.jpg` into the output directory
    pub fn save_results(
        &self,
        output: &StructuredOutput,
        image: &DynamicImage,
        stem: &str,
    ) -> Result<SavedArtifacts, OcrError> {
        let json_path = self.config.output_dir.join(format!("{}.json", stem));
        std::fs::write(&json_path, output.to_json_pretty()?)?;
        tracing::info!("JSON saved: {}", json_path.display());

        let image_path = self
            .config
            .output_dir
            .join(format!("{}_annotated.jpg", stem));
        annotate(image, output.detections(), self.font.as_deref())
            .save(&image_path)
            .map_err(|e| {
                OcrError::OutputError(format!("{}: {}", image_path.display(), e))
            })?;
        tracing::info!("Annotated image saved: {}", image_path.display());

        Ok(SavedArtifacts {
            json_path,
            image_path,
        })
    }

    /// Process every image in `folder`.
    ///
    /// Up to `batch_concurrency` images run at once on the blocking pool.
    /// A failing image is recorded and skipped; results keep file order.
    pub async fn process_batch(&self, folder: &Path) -> BatchReport {
        tracing::info!("Starting batch processing: {}", folder.display());

        let files = match list_images(folder) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Input folder not readable: {} ({})", folder.display(), e);
                return BatchReport::default();
            }
        };
        let total = files.len();
        tracing::info!("Found {} images to process", total);

        let outcomes: Vec<(PathBuf, Result<StructuredOutput, OcrError>)> = stream::iter(
            files.into_iter().enumerate(),
        )
        .map(|(idx, path)| {
            let processor = self.clone();
            async move {
                tracing::info!(
                    "Processing {}/{}: {}",
                    idx + 1,
                    total,
                    path.file_name().unwrap_or_default().to_string_lossy()
                );
                let task_path = path.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || processor.process_image(&task_path))
                        .await
                        .unwrap_or_else(|e| {
                            Err(OcrError::ProcessingError(format!("worker failed: {}", e)))
                        });
                (path, outcome)
            }
        })
        .buffered(self.config.batch_concurrency.max(1))
        .collect()
        .await;

        let mut report = BatchReport {
            total,
            ..Default::default()
        };
        for (path, outcome) in outcomes {
            match outcome {
                Ok(output) => report.results.push(output),
                Err(e) => {
                    tracing::error!("Skipping {}: {}", path.display(), e);
                    report.failures.push(BatchFailure {
                        path,
                        code: e.code(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Batch processing completed: {}/{} successful",
            report.succeeded(),
            report.total
        );
        report
    }
}

/// Decoded images enter the pipeline as 8-bit gray or RGB; alpha and
/// 16-bit layouts are flattened to 8-bit RGB.
fn to_pipeline_layout(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Image files directly inside `folder`, sorted by path
fn list_images(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
