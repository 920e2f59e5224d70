use crate::cli::Args;
use crate::engine::DetectionParams;
use std::path::PathBuf;

/// Processing configuration, passed explicitly to the engine and processor
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub language: String,
    pub use_gpu: bool,
    pub min_confidence: f64,
    pub batch_concurrency: usize,
    pub detection: DetectionParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            language: "en".to_string(),
            use_gpu: false,
            min_confidence: 0.0,
            batch_concurrency: 4,
            detection: DetectionParams::default(),
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            output_dir: args.output_dir.clone(),
            language: args.lang.clone(),
            use_gpu: args.gpu,
            min_confidence: if args.min_confidence.is_finite() {
                args.min_confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
            batch_concurrency: args.concurrency.max(1),
            detection: DetectionParams::default(),
        }
    }
}
