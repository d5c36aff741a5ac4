//! Configuration management for mermshot.
//!
//! Parses `mermshot.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`]. Validation
//! runs after CLI settings are applied, so out-of-range flags are rejected
//! the same way as out-of-range file values.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `output.dir`
//! - `mermaid.script_url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override image output directory.
    pub output_dir: Option<PathBuf>,
    /// Override image format.
    pub format: Option<String>,
    /// Override JPEG quality.
    pub quality: Option<u8>,
    /// Override device scale factor.
    pub scale: Option<f64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mermshot.toml";

/// Default image directory, relative to the config file or working directory.
const DEFAULT_OUTPUT_DIR: &str = "images";

/// Supported image format names.
const FORMATS: [&str; 2] = ["png", "jpeg"];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output configuration (paths are relative strings from TOML).
    output: OutputConfigRaw,
    /// Mermaid script configuration.
    pub mermaid: MermaidConfig,
    /// Render timeouts.
    pub timeouts: TimeoutsConfig,

    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    #[allow(clippy::derivable_impls)]
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw output configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    dir: Option<String>,
    format: Option<String>,
    quality: Option<u8>,
    scale: Option<f64>,
}

/// Resolved output configuration with an absolute image directory.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    /// Directory receiving rendered images.
    pub dir: PathBuf,
    /// Image format name, lowercase (`png` or `jpeg`).
    pub format: String,
    /// JPEG quality (1..=100).
    pub quality: u8,
    /// Device scale factor (1..=5).
    pub scale: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            format: "png".to_owned(),
            quality: 85,
            scale: 2.0,
        }
    }
}

/// Mermaid script configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MermaidConfig {
    /// URL of the Mermaid script. `None` uses the renderer's built-in URL.
    pub script_url: Option<String>,
}

/// Render timeouts in seconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Loading the page shell and its scripts.
    pub page_load_secs: u64,
    /// Waiting for Mermaid to finish or fail.
    pub render_secs: u64,
    /// Waiting for the processed marker.
    pub settle_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            page_load_secs: 60,
            render_secs: 45,
            settle_secs: 15,
        }
    }
}

impl TimeoutsConfig {
    /// Page load timeout.
    #[must_use]
    pub fn page_load(&self) -> Duration {
        Duration::from_secs(self.page_load_secs)
    }

    /// Render completion timeout.
    #[must_use]
    pub fn render(&self) -> Duration {
        Duration::from_secs(self.render_secs)
    }

    /// Processed marker timeout.
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`mermaid.script_url`").
        field: String,
        /// Error message (e.g., "${`MERMAID_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a timeout to be positive.
fn require_positive(secs: u64, field: &str) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mermshot.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged result
    /// is validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// a value is out of range.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(output_dir) = &settings.output_dir {
            self.output_resolved.dir.clone_from(output_dir);
        }
        if let Some(format) = &settings.format {
            self.output_resolved.format = format.to_ascii_lowercase();
        }
        if let Some(quality) = settings.quality {
            self.output_resolved.quality = quality;
        }
        if let Some(scale) = settings.scale {
            self.output_resolved.scale = scale;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        Self::discover_config_from(&cwd)
    }

    /// Search for config file in `start` and its parents.
    fn discover_config_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            output: OutputConfigRaw::default(),
            mermaid: MermaidConfig::default(),
            timeouts: TimeoutsConfig::default(),
            output_resolved: OutputConfig {
                dir: base.join(DEFAULT_OUTPUT_DIR),
                ..OutputConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`load`](Self::load) after CLI settings are
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_output()?;
        self.validate_mermaid()?;
        self.validate_timeouts()?;
        Ok(())
    }

    /// Validate output configuration.
    fn validate_output(&self) -> Result<(), ConfigError> {
        const MAX_SCALE: f64 = 5.0;

        let output = &self.output_resolved;

        if output.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output.dir cannot be empty".to_owned(),
            ));
        }

        if !FORMATS.contains(&output.format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "output.format must be either png or jpeg, got '{}'",
                output.format
            )));
        }

        if output.format == "jpeg" && !(1..=100).contains(&output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be between 1 and 100".to_owned(),
            ));
        }

        if !(1.0..=MAX_SCALE).contains(&output.scale) {
            return Err(ConfigError::Validation(format!(
                "output.scale must be between 1 and {MAX_SCALE}"
            )));
        }

        Ok(())
    }

    /// Validate Mermaid script configuration.
    fn validate_mermaid(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.mermaid.script_url {
            require_non_empty(url, "mermaid.script_url")?;
        }
        Ok(())
    }

    /// Validate timeouts.
    fn validate_timeouts(&self) -> Result<(), ConfigError> {
        require_positive(self.timeouts.page_load_secs, "timeouts.page_load_secs")?;
        require_positive(self.timeouts.render_secs, "timeouts.render_secs")?;
        require_positive(self.timeouts.settle_secs, "timeouts.settle_secs")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.output.dir {
            self.output.dir = Some(expand::expand_env(dir, "output.dir")?);
        }

        if let Some(ref url) = self.mermaid.script_url {
            self.mermaid.script_url = Some(expand::expand_env(url, "mermaid.script_url")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = OutputConfig::default();
        let output = &self.output;

        self.output_resolved = OutputConfig {
            dir: config_dir.join(output.dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR)),
            format: output
                .format
                .as_deref()
                .map_or(defaults.format, str::to_ascii_lowercase),
            quality: output.quality.unwrap_or(defaults.quality),
            scale: output.scale.unwrap_or(defaults.scale),
        };
    }
}
