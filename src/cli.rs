use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stencil-ocr")]
#[command(about = "Offline OCR system for industrial stenciled text")]
#[command(version)]
pub struct Args {
    /// Path to a single image file
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Path to a folder for batch processing
    #[arg(long)]
    pub batch: Option<PathBuf>,

    /// Enable GPU acceleration (engine dependent)
    #[arg(long)]
    pub gpu: bool,

    /// Language code
    #[arg(long, env = "OCR_LANGUAGE", default_value = "en")]
    pub lang: String,

    /// Directory receiving JSON and annotated image outputs
    #[arg(long, env = "OCR_OUTPUT_DIR", default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Drop detections whose confidence is below this value
    #[arg(long, env = "OCR_MIN_CONFIDENCE", default_value = "0.0", value_parser = parse_confidence)]
    pub min_confidence: f64,

    /// Number of images processed concurrently in batch mode
    #[arg(long, env = "OCR_CONCURRENCY", default_value = "4")]
    pub concurrency: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Confidence threshold: a finite number in [0, 1]
fn parse_confidence(value: &str) -> Result<f64, String> {
    let confidence: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", value))?;
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(format!("`{}` must be between 0.0 and 1.0", value));
    }
    Ok(confidence)
}
