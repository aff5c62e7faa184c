//! Application configuration for cairn.
//!
//! User config lives at `~/.cairn/cairn.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CairnError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "cairn.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".cairn";

// ---------------------------------------------------------------------------
// Config structs (matching cairn.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Content API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Collection defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Quality tier thresholds.
    #[serde(default)]
    pub pipeline: PipelinePolicyConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the content API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum requests per minute.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            rate_limit: default_rate_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.camptocamp.org".into()
}
fn default_user_agent() -> String {
    concat!("cairn/", env!("CARGO_PKG_VERSION")).into()
}
fn default_rate_limit() -> u32 {
    100
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default output directory for collection runs.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum records fetched per content type.
    #[serde(default = "default_max_items")]
    pub max_items_per_category: usize,

    /// Optional bounding box "min_lon,min_lat,max_lon,max_lat".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_items_per_category: default_max_items(),
            bbox: None,
        }
    }
}

fn default_output_dir() -> String {
    "./data".into()
}
fn default_max_items() -> usize {
    1000
}

/// `[pipeline]` section — tier thresholds are policy constants, kept
/// configurable rather than hard-coded into the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePolicyConfig {
    /// Presence ratio at or above which a field is tier "high".
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,

    /// Presence ratio at or above which a field is tier "medium".
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
}

impl Default for PipelinePolicyConfig {
    fn default() -> Self {
        Self {
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
        }
    }
}

fn default_high_threshold() -> f64 {
    0.80
}
fn default_medium_threshold() -> f64 {
    0.50
}

// ---------------------------------------------------------------------------
// Bounding box
// ---------------------------------------------------------------------------

/// A geographic bounding box `(min_lon, min_lat, max_lon, max_lat)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Parse the `"min_lon,min_lat,max_lon,max_lat"` form used in config
    /// and as an API query parameter.
    pub fn parse(s: &str) -> Result<BoundingBox> {
        let coords: Vec<f64> = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|e| CairnError::validation(format!("invalid bbox value '{part}': {e}")))
            })
            .collect::<Result<_>>()?;

        if coords.len() != 4 {
            return Err(CairnError::validation(format!(
                "bounding box must have exactly 4 coordinates, got {}",
                coords.len()
            )));
        }

        let bbox = BoundingBox {
            min_lon: coords[0],
            min_lat: coords[1],
            max_lon: coords[2],
            max_lat: coords[3],
        };
        bbox.validate()?;
        Ok(bbox)
    }

    fn validate(&self) -> Result<()> {
        if self.min_lon >= self.max_lon || self.min_lat >= self.max_lat {
            return Err(CairnError::validation(
                "invalid bounding box: min coordinates must be less than max coordinates",
            ));
        }
        if !(-180.0..=180.0).contains(&self.min_lon) || !(-180.0..=180.0).contains(&self.max_lon) {
            return Err(CairnError::validation("longitude must be between -180 and 180"));
        }
        if !(-90.0..=90.0).contains(&self.min_lat) || !(-90.0..=90.0).contains(&self.max_lat) {
            return Err(CairnError::validation("latitude must be between -90 and 90"));
        }
        Ok(())
    }

    /// The query-parameter form understood by the content API.
    pub fn to_query(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base URL of the content API.
    pub base_url: String,
    /// User-Agent header.
    pub user_agent: String,
    /// Maximum requests per minute.
    pub rate_limit: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum records fetched per content type.
    pub max_items_per_category: usize,
    /// Optional bounding-box filter.
    pub bbox: Option<BoundingBox>,
}

impl TryFrom<&AppConfig> for FetchConfig {
    type Error = CairnError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let bbox = config
            .defaults
            .bbox
            .as_deref()
            .map(BoundingBox::parse)
            .transpose()?;

        Ok(Self {
            base_url: config.api.base_url.clone(),
            user_agent: config.api.user_agent.clone(),
            rate_limit: config.api.rate_limit,
            timeout_secs: config.api.timeout_secs,
            max_items_per_category: config.defaults.max_items_per_category,
            bbox,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.cairn/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CairnError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.cairn/cairn.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CairnError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| CairnError::config(format!("failed to parse {}: {e}", path.display())))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate config values that a TOML parse alone cannot catch.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.api.rate_limit == 0 || config.api.rate_limit > 1000 {
        return Err(CairnError::config("api.rate_limit must be between 1 and 1000"));
    }
    if config.defaults.max_items_per_category == 0
        || config.defaults.max_items_per_category > 100_000
    {
        return Err(CairnError::config(
            "defaults.max_items_per_category must be between 1 and 100000",
        ));
    }
    if let Some(bbox) = &config.defaults.bbox {
        BoundingBox::parse(bbox)?;
    }
    if config.pipeline.medium_threshold > config.pipeline.high_threshold {
        return Err(CairnError::config(
            "pipeline.medium_threshold must not exceed pipeline.high_threshold",
        ));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CairnError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CairnError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CairnError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
