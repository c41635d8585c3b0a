/// Manual driver: run the extraction pipeline on a local image file
///
/// Usage: cargo run --release --bin extract_file -- strip.png [--output out.txt]

use anyhow::{Context, Result};
use std::sync::Arc;

use webtoon_extract::core::Config;
use webtoon_extract::orchestration::ExtractionPipeline;
use webtoon_extract::services::GeminiExtractionClient;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image> [--output out.txt]", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let mut output_path: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--output" | "-o" => {
                if i + 1 < args.len() {
                    output_path = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "webtoon_extract=info".to_string()),
        )
        .init();

    let config = Config::new().context("Failed to load config")?;
    let client = Arc::new(GeminiExtractionClient::new(&config.api)?);
    let pipeline = ExtractionPipeline::new(&config, client)?;

    println!("Loading: {}", input_path);
    let bytes = std::fs::read(input_path).context("Failed to read image file")?;

    let report = pipeline.run(bytes).await?;

    println!(
        "\nDone: {} slices, {} failed",
        report.slices, report.failed_slices
    );

    match output_path {
        Some(path) => {
            std::fs::write(&path, &report.text).context("Failed to write transcript")?;
            println!("Saved transcript: {}", path);
        }
        None => {
            println!("\n{}", report.text);
        }
    }

    Ok(())
}
