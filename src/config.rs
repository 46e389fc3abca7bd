use crate::error::{Result, RetroError};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.retrodiffusion.ai";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_UPLOAD_DIMENSION: u32 = 256;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Credential shipped with the application.
    pub api_key: Option<String>,
    /// Credential entered by the user; takes precedence when set.
    pub custom_api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_upload_dimension: u32,
}

#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    pub debounce_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    pub estimator: EstimatorConfig,
    pub output_dir: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_key: None,
            custom_api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_upload_dimension: DEFAULT_MAX_UPLOAD_DIMENSION,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("RETRO_DIFFUSION_API_KEY").ok();
        let custom_api_key = env::var("RETRO_DIFFUSION_CUSTOM_API_KEY").ok();
        let base_url = env::var("RETRO_DIFFUSION_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env::var("RETRO_DIFFUSION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        ClientConfig {
            api_key,
            custom_api_key,
            base_url,
            timeout_secs,
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_custom_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.custom_api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_upload_dimension(mut self, max_dimension: u32) -> Self {
        self.max_upload_dimension = max_dimension;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Picks the credential for a remote call: the user's key if set, else
    /// the bundled one. Blank strings count as missing.
    pub fn resolve_api_key(&self) -> Result<String> {
        [&self.custom_api_key, &self.api_key]
            .into_iter()
            .flatten()
            .map(|key| key.trim())
            .find(|key| !key.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                RetroError::Configuration(
                    "No API key configured. Set RETRO_DIFFUSION_API_KEY or provide a custom key"
                        .into(),
                )
            })
    }

    pub fn has_credentials(&self) -> bool {
        self.resolve_api_key().is_ok()
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl EstimatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let debounce_ms = env::var("RETRO_DEBOUNCE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        EstimatorConfig { debounce_ms }
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            client: ClientConfig::default(),
            estimator: EstimatorConfig::default(),
            output_dir: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            client: ClientConfig::from_env(),
            estimator: EstimatorConfig::from_env(),
            output_dir: env::var("RETRO_OUTPUT_DIR").ok(),
        }
    }

    pub fn with_client(mut self, config: ClientConfig) -> Self {
        self.client = config;
        self
    }

    pub fn with_estimator(mut self, config: EstimatorConfig) -> Self {
        self.estimator = config;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}
