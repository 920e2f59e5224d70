use clap::{CommandFactory, Parser};
use stencil_ocr::cli::Args;
use stencil_ocr::{Config, EngineHandle, OcrProcessor};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.image.is_none() && args.batch.is_none() {
        Args::command().print_help()?;
        eprintln!("\nError: Please specify either --image or --batch");
        return Ok(ExitCode::from(1));
    }

    let config = Config::from(&args);

    tracing::info!("Starting stencil-ocr v{}", env!("CARGO_PKG_VERSION"));

    let engine = match EngineHandle::initialize(&config) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("Failed to initialize OCR engine: {}", e);
            return Ok(ExitCode::from(1));
        }
    };
    tracing::info!("Engine: {} ({})", engine.name(), engine.description());
    let processor = OcrProcessor::new(engine, config)?;

    if let Some(image) = &args.image {
        match processor.process_image(image) {
            Ok(output) => {
                println!("\n{}", "=".repeat(50));
                println!("OCR RESULTS");
                println!("{}", "=".repeat(50));
                println!("{}", output.to_json_pretty()?);
            }
            Err(e) => tracing::error!("No result for {}: {}", image.display(), e),
        }
    } else if let Some(folder) = &args.batch {
        let report = processor.process_batch(folder).await;
        println!(
            "\nBatch processing completed: {} images processed",
            report.succeeded()
        );
    }

    processor.shutdown();
    Ok(ExitCode::SUCCESS)
}
