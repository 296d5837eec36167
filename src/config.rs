use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "routine-advisor.toml";

const DEFAULT_ENDPOINT: &str = "https://loreal-chat-proxy.mrna.workers.dev/";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_CATALOG: &str = "products.json";
const DEFAULT_SYSTEM_DIRECTIVE: &str = "You are a helpful L'Oréal skincare and beauty advisor. Answer only questions related to routines, products, and care tips.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidOverride { key: &'static str, value: String },
}

/// Runtime settings. Every field has a default so an absent config file is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Completion endpoint receiving `{model, messages, max_tokens}`.
    pub endpoint: String,
    pub model: String,
    /// File path or `http(s)://` URL of the `{ "products": [...] }` document.
    pub catalog: String,
    /// Where `selected_products.json` lives. Defaults to `~/.routine-advisor`.
    pub data_dir: Option<PathBuf>,
    pub freeform_max_tokens: u32,
    pub routine_max_tokens: u32,
    pub request_timeout_secs: u64,
    pub system_directive: String,
    /// Options shown in the category selector, matched exactly against `Product::category`.
    pub categories: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            catalog: DEFAULT_CATALOG.to_string(),
            data_dir: None,
            freeform_max_tokens: 200,
            routine_max_tokens: 400,
            request_timeout_secs: 60,
            system_directive: DEFAULT_SYSTEM_DIRECTIVE.to_string(),
            categories: [
                "cleanser",
                "moisturizer",
                "haircare",
                "makeup",
                "hair color",
                "hair styling",
                "men's grooming",
                "suncare",
                "fragrance",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        }
    }
}

impl AppConfig {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| home_dir().join(".routine-advisor"))
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    tracing::debug!("loading configuration from {}", path.display());
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the config file (explicit env path, then the working directory),
/// then applies environment overrides on top.
pub fn load_app_configuration() -> Result<AppConfig, ConfigError> {
    let explicit = env::var_os("ROUTINE_ADVISOR_CONFIG").map(PathBuf::from);
    let mut config = match explicit {
        Some(path) => load_config(path)?,
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() {
                load_config(local)?
            } else {
                tracing::info!("no {CONFIG_FILE_NAME} found, using defaults");
                AppConfig::default()
            }
        }
    };

    apply_overrides(&mut config, |key| env::var(key).ok())?;
    Ok(config)
}

fn apply_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(endpoint) = lookup("ROUTINE_ADVISOR_ENDPOINT") {
        config.endpoint = endpoint;
    }
    if let Some(catalog) = lookup("ROUTINE_ADVISOR_CATALOG") {
        config.catalog = catalog;
    }
    if let Some(model) = lookup("ROUTINE_ADVISOR_MODEL") {
        config.model = model;
    }
    if let Some(dir) = lookup("ROUTINE_ADVISOR_DATA_DIR") {
        config.data_dir = Some(PathBuf::from(dir));
    }
    if let Some(raw) = lookup("ROUTINE_ADVISOR_TIMEOUT_SECS") {
        config.request_timeout_secs =
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOverride {
                    key: "ROUTINE_ADVISOR_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
    }
    Ok(())
}
