use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "EC2_PRICE";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pricing: PricingConfig,
    #[serde(default)]
    pub aws: AwsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Time allowed for a client to deliver request headers
    pub read_timeout_seconds: u64,
    /// Time allowed for producing a response
    pub write_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    pub endpoint: String,
    /// Region the pricing API is called in (only a few regions host it)
    pub region: String,
    pub refresh_interval_seconds: u64,
    pub request_timeout_seconds: u64,
    pub page_size: u32,
    pub max_pages: u32,
    /// Additional location label -> region code mappings
    #[serde(default)]
    pub extra_regions: Vec<RegionOverride>,
}

/// One `[[pricing.extra_regions]]` entry.
///
/// Labels are values rather than table keys so their case survives loading.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegionOverride {
    /// Catalog location label, e.g. "EU (Ireland)"
    pub label: String,
    /// Region code, e.g. "eu-west-1"
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AwsConfig {
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_seconds)
    }
}

impl PricingConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl AwsConfig {
    /// Fill empty credentials from the standard AWS environment variables
    pub fn with_env_fallback(mut self) -> Self {
        if self.access_key_id.is_empty() {
            self.access_key_id = std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default();
        }
        if self.secret_access_key.is_empty() {
            self.secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default();
        }
        if self.session_token.as_deref().map_or(true, str::is_empty) {
            self.session_token = std::env::var("AWS_SESSION_TOKEN")
                .ok()
                .filter(|token| !token.is_empty());
        }
        self
    }

    pub fn has_credentials(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

/// Load configuration from defaults, an optional TOML file and `EC2_PRICE__*` variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("server.read_timeout_seconds", 5)?
        .set_default("server.write_timeout_seconds", 30)?
        .set_default("pricing.endpoint", "https://api.pricing.us-east-1.amazonaws.com")?
        .set_default("pricing.region", "us-east-1")?
        .set_default("pricing.refresh_interval_seconds", 3600)?
        .set_default("pricing.request_timeout_seconds", 30)?
        .set_default("pricing.page_size", 100)?
        .set_default("pricing.max_pages", 10_000)?
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let mut cfg: Config = config.try_deserialize()?;
    cfg.aws = cfg.aws.with_env_fallback();
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("server.port must be non-zero");
    }

    if cfg.server.read_timeout_seconds == 0 || cfg.server.write_timeout_seconds == 0 {
        anyhow::bail!("Server timeouts must be greater than zero");
    }

    if cfg.pricing.refresh_interval_seconds == 0 {
        anyhow::bail!("pricing.refresh_interval_seconds must be greater than zero");
    }

    if cfg.pricing.request_timeout_seconds == 0 {
        anyhow::bail!("pricing.request_timeout_seconds must be greater than zero");
    }

    // GetProducts caps MaxResults at 100
    if !(1..=100).contains(&cfg.pricing.page_size) {
        anyhow::bail!("pricing.page_size must be between 1 and 100");
    }

    if cfg.pricing.max_pages == 0 {
        anyhow::bail!("pricing.max_pages must be greater than zero");
    }

    let endpoint = url::Url::parse(&cfg.pricing.endpoint)
        .map_err(|e| anyhow::anyhow!("Invalid pricing.endpoint '{}': {}", cfg.pricing.endpoint, e))?;
    if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
        anyhow::bail!("pricing.endpoint must be an http(s) URL");
    }

    if cfg.pricing.region.is_empty() {
        anyhow::bail!("pricing.region cannot be empty");
    }

    for entry in &cfg.pricing.extra_regions {
        if entry.label.is_empty() || entry.code.is_empty() {
            anyhow::bail!("pricing.extra_regions entries need both a location label and a region code");
        }
    }

    Ok(())
}
