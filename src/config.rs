use indexmap::IndexMap;
use log::debug;
use palette::Srgb;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AnalysisError, ConfigParseError, Result};

/// Machine-wide defaults, resolved against the working directory.
pub const SYSTEM_CONFIG_PATH: &str = "configs/system_config.yml";

/// Per-user overrides, resolved against the working directory.
pub const USER_CONFIG_PATH: &str = "configs/user_config.yml";

/// File name used when the configured `save_path` names a directory.
pub const DEFAULT_FIGURE_FILE: &str = "engagement_scatter.png";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FIGURE_DPI: f64 = 100.0;
const DEFAULT_NTFY_BASE_URL: &str = "https://ntfy.sh";
const MAX_FIGURE_PIXELS: f64 = 16_384.0;

/// A single scalar configuration value.
///
/// Configuration files are flat documents; nested tables or lists are
/// rejected when the file is parsed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ConfigValue {
    #[allow(clippy::cast_precision_loss)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Which configuration file a value came from, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSource {
    System,
    User,
    Job,
}

impl fmt::Display for LayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "system",
            Self::User => "user",
            Self::Job => "job",
        })
    }
}

/// The locations of the three configuration files of a job.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub system: PathBuf,
    pub user: PathBuf,
    pub job: PathBuf,
}

impl ConfigPaths {
    /// Pair a job file with the fixed system and user locations.
    pub fn for_job(job: impl Into<PathBuf>) -> Self {
        Self {
            system: PathBuf::from(SYSTEM_CONFIG_PATH),
            user: PathBuf::from(USER_CONFIG_PATH),
            job: job.into(),
        }
    }

    fn ensure_exist(&self) -> Result<()> {
        for path in [&self.job, &self.system, &self.user] {
            if !path.is_file() {
                return Err(AnalysisError::ConfigurationNotFound { path: path.clone() });
            }
        }
        Ok(())
    }
}

/// The parsed contents of one configuration file.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    source: LayerSource,
    path: PathBuf,
    values: IndexMap<String, Option<ConfigValue>>,
}

impl ConfigLayer {
    /// Read and parse a configuration file.
    pub fn load(source: LayerSource, path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::ConfigurationParse {
                path: path.to_path_buf(),
                source: e.into(),
            }
        })?;

        Self::parse(source, path, &contents)
    }

    /// Parse configuration text, choosing the format from the path's extension.
    ///
    /// JSON and TOML are recognized by extension; everything else is read as YAML.
    /// An empty document yields an empty layer.
    pub fn parse(source: LayerSource, path: &Path, contents: &str) -> Result<Self> {
        let values = parse_values(path, contents).map_err(|e| AnalysisError::ConfigurationParse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            source,
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn source(&self) -> LayerSource {
        self.source
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_values(
    path: &Path,
    contents: &str,
) -> std::result::Result<IndexMap<String, Option<ConfigValue>>, ConfigParseError> {
    if contents.trim().is_empty() {
        return Ok(IndexMap::new());
    }

    let values = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(contents)?,
        Some("toml") => toml::from_str(contents)?,
        _ => serde_yaml::from_str::<Option<IndexMap<_, _>>>(contents)?.unwrap_or_default(),
    };

    Ok(values)
}

#[derive(Debug, Clone)]
struct Entry {
    value: Option<ConfigValue>,
    source: LayerSource,
}

/// The effective configuration of a job.
///
/// Built once from the system, user and job layers and never mutated
/// afterwards. Stages read it through typed views such as [`FetchSettings`],
/// which report missing or malformed keys at the point of use.
#[derive(Debug, Clone)]
pub struct Configuration {
    entries: IndexMap<String, Entry>,
}

impl Configuration {
    /// Load and merge the three configuration files.
    ///
    /// All three paths are checked before anything is parsed, and the first
    /// file that fails to parse aborts the whole load.
    pub fn load(paths: &ConfigPaths) -> Result<Self> {
        paths.ensure_exist()?;

        debug!(
            "Loading configuration from {}, {}, {}",
            paths.system.display(),
            paths.user.display(),
            paths.job.display()
        );

        let system = ConfigLayer::load(LayerSource::System, &paths.system)?;
        let user = ConfigLayer::load(LayerSource::User, &paths.user)?;
        let job = ConfigLayer::load(LayerSource::Job, &paths.job)?;

        let config = Self::merge(system, user, job);
        debug!("Merged configuration: {config}");

        Ok(config)
    }

    /// Overlay the layers so that job values beat user values, which beat system values.
    ///
    /// An explicit null in a later layer clears the earlier value.
    pub fn merge(system: ConfigLayer, user: ConfigLayer, job: ConfigLayer) -> Self {
        let mut entries: IndexMap<String, Entry> = IndexMap::new();

        for layer in [system, user, job] {
            let source = layer.source();
            debug!(
                "Applying {} configuration layer ({} keys) from {}",
                source,
                layer.values.len(),
                layer.path().display()
            );
            for (key, value) in layer.values {
                entries.insert(key, Entry { value, source });
            }
        }

        Self { entries }
    }

    /// The value for `key`, or `None` when it is absent or null.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key).and_then(|entry| entry.value.as_ref())
    }

    /// The layer that supplied the effective value for `key`.
    pub fn source_of(&self, key: &str) -> Option<LayerSource> {
        self.entries.get(key).map(|entry| entry.source)
    }

    /// Number of merged keys, null-valued ones included.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn require(&self, key: &str) -> Result<&ConfigValue> {
        self.get(key)
            .ok_or_else(|| AnalysisError::MissingConfiguration { key: key.to_string() })
    }

    /// The value for `key` rendered as text; numbers and booleans are formatted.
    pub fn require_string(&self, key: &str) -> Result<String> {
        Ok(self.require(key)?.to_string())
    }

    pub fn require_positive_f64(&self, key: &str) -> Result<f64> {
        let value = self.require(key)?;
        positive_f64(key, value)
    }

    fn optional_positive_f64(&self, key: &str, default: f64) -> Result<f64> {
        self.get(key).map_or(Ok(default), |value| positive_f64(key, value))
    }

    fn optional_u64(&self, key: &str, default: u64) -> Result<u64> {
        match self.get(key) {
            None => Ok(default),
            Some(ConfigValue::Integer(value)) if *value > 0 => Ok(value.unsigned_abs()),
            Some(other) => Err(invalid(key, format!("expected a positive integer, got {other}"))),
        }
    }

    fn optional_string(&self, key: &str, default: &str) -> String {
        self.get(key)
            .map_or_else(|| default.to_string(), ToString::to_string)
    }

    /// Name the layer that supplied an invalid value.
    fn attribute(&self, err: AnalysisError) -> AnalysisError {
        match err {
            AnalysisError::InvalidConfiguration { key, reason } => {
                let reason = match self.source_of(&key) {
                    Some(source) => format!("{reason} (set in the {source} configuration)"),
                    None => reason,
                };
                AnalysisError::InvalidConfiguration { key, reason }
            }
            other => other,
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, entry)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            match &entry.value {
                Some(value) => write!(f, "{key}: {value} ({})", entry.source)?,
                None => write!(f, "{key}: null ({})", entry.source)?,
            }
        }
        f.write_str("}")
    }
}

fn invalid(key: &str, reason: String) -> AnalysisError {
    AnalysisError::InvalidConfiguration {
        key: key.to_string(),
        reason,
    }
}

fn positive_f64(key: &str, value: &ConfigValue) -> Result<f64> {
    match value.as_f64() {
        Some(number) if number > 0.0 && number.is_finite() => Ok(number),
        Some(number) => Err(invalid(key, format!("expected a positive number, got {number}"))),
        None => Err(invalid(key, format!("expected a number, got {value}"))),
    }
}

/// Parse a hex string ("#1f77b4", "#F00") or a CSS/SVG color name ("blue").
pub fn parse_color(key: &str, text: &str) -> Result<Srgb<u8>> {
    let text = text.trim();

    if let Ok(color) = text.parse::<Srgb<u8>>() {
        return Ok(color);
    }

    palette::named::from_str(&text.to_lowercase())
        .map(Srgb::from_format)
        .ok_or_else(|| {
            invalid(
                key,
                format!("invalid color '{text}' (must be a hex color like '#FF0000' or a named color like 'red')"),
            )
        })
}

/// Where and how to fetch the repository listing.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub api_base_path: String,
    pub endpoint: String,
    pub owner: String,
    pub resource: String,
    pub timeout: Duration,
}

impl FetchSettings {
    pub fn from_config(config: &Configuration) -> Result<Self> {
        Self::read(config).map_err(|e| config.attribute(e))
    }

    fn read(config: &Configuration) -> Result<Self> {
        Ok(Self {
            api_base_path: config.require_string("api_base_path")?,
            endpoint: config.require_string("endpoint")?,
            owner: config.require_string("owner")?,
            resource: config.require_string("resource")?,
            timeout: Duration::from_secs(
                config.optional_u64("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?,
            ),
        })
    }

    /// The four URL parts joined with literal `/` separators.
    pub fn request_url(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_base_path, self.endpoint, self.owner, self.resource
        )
    }
}

/// Appearance and default destination of the engagement scatter plot.
#[derive(Debug, Clone)]
pub struct PlotSettings {
    /// Figure width in figure units (pixels = units × dpi).
    pub width: f64,
    /// Figure height in figure units.
    pub height: f64,
    pub dpi: f64,
    pub color: Srgb<u8>,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub save_path: PathBuf,
}

impl PlotSettings {
    pub fn from_config(config: &Configuration) -> Result<Self> {
        Self::read(config).map_err(|e| config.attribute(e))
    }

    fn read(config: &Configuration) -> Result<Self> {
        let width = config.require_positive_f64("figure_size_x")?;
        let height = config.require_positive_f64("figure_size_y")?;
        let color_text = config.require_string("plot_color")?;
        let title = config.require_string("plot_title")?;
        let x_title = config.require_string("plot_x_title")?;
        let y_title = config.require_string("plot_y_title")?;
        let save_path = resolve_save_path(&config.require_string("save_path")?);
        let dpi = config.optional_positive_f64("figure_dpi", DEFAULT_FIGURE_DPI)?;
        let color = parse_color("plot_color", &color_text)?;

        for (key, units) in [("figure_size_x", width), ("figure_size_y", height)] {
            if units * dpi > MAX_FIGURE_PIXELS {
                return Err(invalid(
                    key,
                    format!("{units} units at {dpi} dpi exceeds {MAX_FIGURE_PIXELS} pixels"),
                ));
            }
        }

        Ok(Self {
            width,
            height,
            dpi,
            color,
            title,
            x_title,
            y_title,
            save_path,
        })
    }

    /// Figure size in pixels, never smaller than one pixel per side.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_size(&self) -> (u32, u32) {
        let to_pixels = |units: f64| ((units * self.dpi).round() as u32).max(1);
        (to_pixels(self.width), to_pixels(self.height))
    }
}

/// A configured `save_path` with an extension is a file; without one it is a
/// directory that receives [`DEFAULT_FIGURE_FILE`].
pub fn resolve_save_path(configured: &str) -> PathBuf {
    let path = PathBuf::from(configured);
    if path.extension().is_some() {
        path
    } else {
        path.join(DEFAULT_FIGURE_FILE)
    }
}

/// Destination of the completion notification.
#[derive(Debug, Clone)]
pub struct NotifySettings {
    pub topic: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl NotifySettings {
    pub fn from_config(config: &Configuration) -> Result<Self> {
        Self::read(config).map_err(|e| config.attribute(e))
    }

    fn read(config: &Configuration) -> Result<Self> {
        Ok(Self {
            topic: config.require_string("ntfy_topic")?,
            base_url: config.optional_string("ntfy_base_url", DEFAULT_NTFY_BASE_URL),
            timeout: Duration::from_secs(
                config.optional_u64("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?,
            ),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.topic)
    }
}
