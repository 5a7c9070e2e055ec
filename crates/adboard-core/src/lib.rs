use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod dates;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use dates::{monthly_chunks, parse_date_param, yesterday_local, DateChunk};

/// The channel identifier used for every Meta Ads row.
pub const META_ADS_CHANNEL_ID: &str = "meta_ads";

/// Display name for the Meta Ads channel row.
pub const META_ADS_CHANNEL_NAME: &str = "Meta Ads";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
