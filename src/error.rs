use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration file not found: {}", path.display())]
    ConfigurationNotFound { path: PathBuf },

    #[error("Failed to parse configuration file {}: {source}", path.display())]
    ConfigurationParse {
        path: PathBuf,
        #[source]
        source: ConfigParseError,
    },

    #[error("Missing required configuration key: {key}")]
    MissingConfiguration { key: String },

    #[error("Invalid value for configuration key {key}: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    #[error("No dataset loaded; call load_data first")]
    DataNotLoaded,

    #[error("Failed to load data from {url}: {source}")]
    DataLoad {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Dataset contains no rows")]
    EmptyDataset,

    #[error("Dataset has no values for column: {column}")]
    MissingColumn { column: String },

    #[error("Non-numeric value in column {column} at row {row}")]
    NonNumericValue { column: String, row: usize },

    #[error("Failed to render figure: {0}")]
    Render(String),
}

/// Reasons a configuration file could not be turned into a layer.
#[derive(Error, Debug)]
pub enum ConfigParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Reasons the repository listing could not be fetched.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API request failed with status {status}")]
    Status { status: u16 },

    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a rendered figure could not be written to disk.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Unsupported image format '{0}' (expected .png or .svg)")]
    UnsupportedFormat(String),

    #[error("SVG error: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("Rasterization error: {0}")]
    Raster(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
