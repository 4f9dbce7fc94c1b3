//! Configuration loading and project path helpers.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE: &str = "config/settings";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CONTENT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";
const DEFAULT_POLL_INTERVAL_SECS: i64 = 10;
const DEFAULT_VIDEO_TIMEOUT_SECS: i64 = 600;

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("unable to resolve project directories")]
    MissingProjectDirs,
    #[error(transparent)]
    Build(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub video: VideoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub content_model: String,
    pub video_model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VideoConfig {
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

pub fn load() -> Result<AppConfig, AppConfigError> {
    let builder = Config::builder()
        .set_default("api.base_url", DEFAULT_BASE_URL)?
        .set_default("api.content_model", DEFAULT_CONTENT_MODEL)?
        .set_default("api.video_model", DEFAULT_VIDEO_MODEL)?
        .set_default("video.poll_interval_secs", DEFAULT_POLL_INTERVAL_SECS)?
        .set_default("video.timeout_secs", DEFAULT_VIDEO_TIMEOUT_SECS)?
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::with_prefix("KALESMA").separator("__"));

    let cfg = builder.build()?.try_deserialize()?;
    Ok(cfg)
}

pub fn project_dirs() -> Result<ProjectDirs, AppConfigError> {
    ProjectDirs::from("dev", "kalesma", "kalesma").ok_or(AppConfigError::MissingProjectDirs)
}
