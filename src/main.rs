// Main entry point for the webtoon text extraction service

use webtoon_extract::{
    core::Config, orchestration::ExtractionPipeline, services::GeminiExtractionClient, RunReport,
};

use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    pipeline: Arc<ExtractionPipeline<GeminiExtractionClient>>,
    fetch_client: reqwest::Client,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration errors are fatal before any processing starts
    let config = Arc::new(Config::new()?);

    // Initialize logging
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new(format!(
        "webtoon_extract={}",
        match config.log_level() {
            tracing::Level::TRACE => "trace",
            tracing::Level::DEBUG => "debug",
            tracing::Level::INFO => "info",
            tracing::Level::WARN => "warn",
            tracing::Level::ERROR => "error",
        }
    ));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("=== WEBTOON TEXT EXTRACTOR ===");
    info!(
        "Config: slices {}..{}px, strides {}/{}, {} credentials, {} concurrent",
        config.segmentation.min_slice_height,
        config.segmentation.max_slice_height,
        config.segmentation.row_stride,
        config.segmentation.pixel_stride,
        config.credentials().len(),
        config.dispatch.max_concurrent_slices,
    );

    let client = Arc::new(GeminiExtractionClient::new(&config.api)?);
    let pipeline = Arc::new(ExtractionPipeline::new(&config, client)?);

    let state = AppState {
        pipeline,
        fetch_client: reqwest::Client::new(),
    };

    // Setup CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/extract", post(extract_image))
        .with_state(state)
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024)) // Strips can be enormous
        .layer(cors);

    let addr = format!("{}:{}", config.server_host(), config.server_port());
    info!("Server starting on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /        - Root endpoint");
    info!("  GET  /health  - Health check");
    info!("  POST /extract - Extract text (multipart: 'image' bytes or 'url')");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> &'static str {
    "Webtoon Text Extraction Service"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Extract text from one strip image
///
/// # Request Format:
/// - multipart/form-data
/// - Field "image": raw image bytes (PNG/JPEG/WebP), or
/// - Field "url": image URL to fetch
///
/// # Response:
/// - RunReport JSON: { text, slices, failed_slices }
async fn extract_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RunReport>, (StatusCode, String)> {
    let start_time = std::time::Instant::now();

    let mut image_bytes: Option<Vec<u8>> = None;
    let mut url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "image" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("Read error: {}", e)))?;
                image_bytes = Some(data.to_vec());
            }
            "url" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("Read error: {}", e)))?;
                url = Some(value);
            }
            _ => {}
        }
    }

    let bytes = match (image_bytes, url) {
        (Some(bytes), _) => bytes,
        (None, Some(url)) => fetch_image(&state.fetch_client, &url).await?,
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "No image provided (expected field 'image' or 'url')".to_string(),
            ));
        }
    };

    let report = state.pipeline.run(bytes).await.map_err(|e| {
        error!("Extraction run failed: {:?}", e);
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Extraction failed: {}", e),
        )
    })?;

    info!(
        "Request completed in {:.2}s: {} slices, {} failed",
        start_time.elapsed().as_secs_f64(),
        report.slices,
        report.failed_slices
    );

    Ok(Json(report))
}

async fn fetch_image(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, (StatusCode, String)> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Fetch failed: {}", e)))?;

    if !response.status().is_success() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Image URL returned status {}", response.status()),
        ));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Fetch read failed: {}", e)))?;

    Ok(bytes.to_vec())
}
