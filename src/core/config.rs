use crate::core::errors::ConfigError;
use std::env;
use tracing::Level;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub log_level: Level,
}

/// Segmentation configuration
///
/// The penalty weight and scan strides are tuned values with no derived
/// formula; they are configurable but default to the behavior the service
/// shipped with.
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Hard upper bound on slice height in pixels.
    pub max_slice_height: u32,
    /// Lower bound on slice height (the final remainder slice may be shorter).
    pub min_slice_height: u32,
    /// Evaluate every n-th row inside a scan window.
    pub row_stride: u32,
    /// Sample every n-th pixel when scoring a row.
    pub pixel_stride: u32,
    /// Linear bias toward cutting later in the window.
    pub penalty_weight: f32,
}

/// Extraction API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub credentials: Vec<String>,
    pub extraction_model: String,
    pub timeout_seconds: u64,
}

/// Dispatch configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of slices in flight at once.
    pub max_concurrent_slices: usize,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub segmentation: SegmentationConfig,
    pub api: ApiConfig,
    pub dispatch: DispatchConfig,
}

impl Config {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = Self::load_from_env();
        config.validate()?;
        Ok(config)
    }

    fn load_from_env() -> Self {
        // Credentials are comma-separated in a single variable
        let credentials = env::var("EXTRACTION_API_KEYS")
            .ok()
            .map(|keys| {
                keys.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let log_level = env::var("LOG_LEVEL")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "trace" => Some(Level::TRACE),
                "debug" => Some(Level::DEBUG),
                "info" => Some(Level::INFO),
                "warn" | "warning" => Some(Level::WARN),
                "error" => Some(Level::ERROR),
                _ => None,
            })
            .unwrap_or(Level::INFO);

        Self {
            server: ServerConfig {
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1420),
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                log_level,
            },
            segmentation: SegmentationConfig {
                max_slice_height: env::var("MAX_SLICE_HEIGHT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3000),
                min_slice_height: env::var("MIN_SLICE_HEIGHT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1500),
                row_stride: env::var("ROW_STRIDE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(4),
                pixel_stride: env::var("PIXEL_STRIDE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                penalty_weight: env::var("PENALTY_WEIGHT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(0.2),
            },
            api: ApiConfig {
                credentials,
                extraction_model: env::var("EXTRACTION_MODEL")
                    .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
                timeout_seconds: env::var("API_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            },
            dispatch: DispatchConfig {
                max_concurrent_slices: env::var("MAX_CONCURRENT_SLICES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| {
                        // Default: half the cores, at least 4. Extraction calls
                        // are network-bound, so this mostly guards the remote
                        // service's rate limits rather than local CPU.
                        std::cmp::max(num_cpus::get() / 2, 4)
                    }),
            },
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.credentials.is_empty() {
            return Err(ConfigError::NoCredentials);
        }

        // A degenerate window is a configuration error reported at startup,
        // never at scan time. A zero minimum would allow a zero-height cut at
        // the window start, and the segmentation loop would stop advancing.
        if self.segmentation.min_slice_height == 0
            || self.segmentation.min_slice_height >= self.segmentation.max_slice_height
        {
            return Err(ConfigError::InvalidSliceBounds {
                min: self.segmentation.min_slice_height,
                max: self.segmentation.max_slice_height,
            });
        }

        if self.segmentation.row_stride == 0 {
            return Err(ConfigError::InvalidStride(
                "row_stride must be >= 1".to_string(),
            ));
        }
        if self.segmentation.pixel_stride == 0 {
            return Err(ConfigError::InvalidStride(
                "pixel_stride must be >= 1".to_string(),
            ));
        }

        if !self.segmentation.penalty_weight.is_finite() || self.segmentation.penalty_weight < 0.0 {
            return Err(ConfigError::InvalidPenaltyWeight(
                self.segmentation.penalty_weight,
            ));
        }

        if self.dispatch.max_concurrent_slices == 0 {
            return Err(ConfigError::InvalidConcurrency(
                self.dispatch.max_concurrent_slices,
            ));
        }

        Ok(())
    }

    pub fn server_host(&self) -> &str {
        &self.server.host
    }

    pub fn server_port(&self) -> u16 {
        self.server.port
    }

    pub fn log_level(&self) -> Level {
        self.server.log_level
    }

    pub fn credentials(&self) -> &[String] {
        &self.api.credentials
    }

    pub fn extraction_model(&self) -> &str {
        &self.api.extraction_model
    }
}

// Note: No Default implementation because Config::new() can fail
// Users should explicitly call Config::new()? and handle errors
