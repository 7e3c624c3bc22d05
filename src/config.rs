use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_API_VERSION: &str = "2024-09-01";
pub const DEFAULT_LOW_RATING_THRESHOLD: f64 = 2.0;
pub const DEFAULT_HIGH_SEVERITY_THRESHOLD: u8 = 3;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Highest rating a caller can attach to text (ratings run 0 to 5).
pub const MAX_RATING: f64 = 5.0;
/// Highest severity the remote API reports.
pub const MAX_SEVERITY: u8 = 7;

/// Settings shared read-only by every call a client makes.
///
/// Secrets come from env vars (never hardcoded). `load()` reads a .env
/// file first via dotenvy, so local development only needs that file.
#[derive(Clone)]
pub struct ContentSafetyConfig {
    /// Base URL the API paths are appended to, e.g.
    /// https://my-resource.cognitiveservices.azure.com/contentsafety
    pub endpoint: String,
    /// Subscription key, sent as Ocp-Apim-Subscription-Key. Never logged.
    pub api_key: String,
    pub api_version: String,
    /// Text rated below this is flagged as `low_rating`.
    pub low_rating_threshold: f64,
    /// Any category at or above this severity flags the content.
    pub high_severity_threshold: u8,
    /// Whether upload-safety checks reject content when the remote was
    /// unavailable and the verdict is only a fallback.
    pub fail_on_error: bool,
    pub request_timeout: Duration,
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// How many batch items may be in flight at once.
    pub batch_concurrency: usize,
}

impl ContentSafetyConfig {
    /// Build a config with default thresholds and retry settings.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            low_rating_threshold: DEFAULT_LOW_RATING_THRESHOLD,
            high_severity_threshold: DEFAULT_HIGH_SEVERITY_THRESHOLD,
            fail_on_error: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Endpoint and key default to empty so that the thresholds can be
    /// inspected without credentials; call `require_credentials()` before
    /// talking to the API.
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let mut config = Self::new(
            env::var("AZURE_CONTENT_SAFETY_ENDPOINT").unwrap_or_default(),
            env::var("AZURE_CONTENT_SAFETY_KEY").unwrap_or_default(),
        );

        if let Ok(version) = env::var("AZURE_CONTENT_SAFETY_API_VERSION") {
            config.api_version = version;
        }
        if let Some(value) = parse_var::<f64>("AZURE_CONTENT_SAFETY_LOW_RATING_THRESHOLD")? {
            config.low_rating_threshold = value;
        }
        if let Some(value) = parse_var::<u8>("AZURE_CONTENT_SAFETY_HIGH_SEVERITY_THRESHOLD")? {
            config.high_severity_threshold = value;
        }
        if let Some(value) = parse_var::<bool>("AZURE_CONTENT_SAFETY_FAIL_ON_ERROR")? {
            config.fail_on_error = value;
        }
        if let Some(secs) = parse_var::<u64>("AZURE_CONTENT_SAFETY_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = parse_var::<usize>("AZURE_CONTENT_SAFETY_BATCH_CONCURRENCY")? {
            config.batch_concurrency = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_low_rating_threshold(mut self, threshold: f64) -> Self {
        self.low_rating_threshold = threshold;
        self
    }

    pub fn with_high_severity_threshold(mut self, threshold: u8) -> Self {
        self.high_severity_threshold = threshold;
        self
    }

    pub fn with_fail_on_error(mut self, fail_on_error: bool) -> Self {
        self.fail_on_error = fail_on_error;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_delay = delay;
        self
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency;
        self
    }

    /// API version for the preview-only multimodal endpoint.
    pub fn preview_api_version(&self) -> String {
        format!("{}-preview", self.api_version)
    }

    /// Check the numeric settings are within the ranges the decision
    /// engine understands.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_RATING).contains(&self.low_rating_threshold) {
            anyhow::bail!(
                "AZURE_CONTENT_SAFETY_LOW_RATING_THRESHOLD must be between 0 and {MAX_RATING}, got {}",
                self.low_rating_threshold
            );
        }
        if self.high_severity_threshold > MAX_SEVERITY {
            anyhow::bail!(
                "AZURE_CONTENT_SAFETY_HIGH_SEVERITY_THRESHOLD must be between 0 and {MAX_SEVERITY}, got {}",
                self.high_severity_threshold
            );
        }
        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }
        if self.batch_concurrency == 0 {
            anyhow::bail!("AZURE_CONTENT_SAFETY_BATCH_CONCURRENCY must be at least 1");
        }
        Ok(())
    }

    /// Check that the endpoint and subscription key are configured.
    /// Call this before any operation that reaches the remote API.
    pub fn require_credentials(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            anyhow::bail!(
                "AZURE_CONTENT_SAFETY_ENDPOINT not set. Add it to your .env file."
            );
        }
        if self.api_key.is_empty() {
            anyhow::bail!("AZURE_CONTENT_SAFETY_KEY not set. Add it to your .env file.");
        }
        Ok(())
    }
}

impl fmt::Debug for ContentSafetyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSafetyConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("low_rating_threshold", &self.low_rating_threshold)
            .field("high_severity_threshold", &self.high_severity_threshold)
            .field("fail_on_error", &self.fail_on_error)
            .field("request_timeout", &self.request_timeout)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("batch_concurrency", &self.batch_concurrency)
            .finish()
    }
}

/// Read and parse an optional env var. Unset means `None`; set but
/// unparseable is an error naming the variable.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(None),
    }
}
