use std::path::PathBuf;

use thiserror::Error;

/// Domain errors raised by the insights service.
#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    #[error("Unknown time range '{0}' (expected 7d, 30d, 90d or 1y)")]
    UnknownTimeRange(String),

    #[error("Unknown phase '{0}' (expected education, career, professional or lifelong)")]
    UnknownPhase(String),

    #[error("Community group not found: {name}")]
    GroupNotFound { name: String },

    #[error("Goal not found: {id}")]
    GoalNotFound { id: uuid::Uuid },

    #[error("No acting user: pass --actor or set EHRDC_ACTOR_ID")]
    MissingActor,

    #[error("Invalid actor id '{0}'")]
    InvalidActor(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, InsightsError>;
