//! Configuration management for mdkms.
//!
//! Parses `kms.toml` with serde and searches for it in the current
//! directory and its parents. Command-line values are layered on top via
//! [`CliSettings`]; clap fills those from `KMS_*` environment variables, so
//! the effective precedence is command line, then environment, then file.
//!
//! ## Environment Variable Expansion
//!
//! Every string in `[confluence]` supports:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "kms.toml";

/// Settings from the command line that override the file.
///
/// Only `Some` values override.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server base URL.
    pub url: Option<String>,
    /// Override username.
    pub username: Option<String>,
    /// Override password.
    pub password: Option<String>,
    /// Override space key.
    pub space: Option<String>,
    /// Override parent page ID.
    pub parent_page_id: Option<String>,
    /// Override table-of-contents flag.
    pub toc: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Confluence connection and target.
    pub confluence: ConfluenceConfig,
    /// Rendering options.
    pub render: RenderConfig,
    /// Image sizing.
    pub images: ImagesConfig,
    /// Path to the config file, when one was loaded.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[confluence]` section. Every key is optional in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfluenceConfig {
    /// Server base URL.
    pub url: Option<String>,
    /// Username for basic auth.
    pub username: Option<String>,
    /// Password or personal access token.
    pub password: Option<String>,
    /// Space key.
    pub space: Option<String>,
    /// Parent page ID.
    pub parent_page_id: Option<String>,
}

/// Confluence settings with all required keys present.
#[derive(Debug, Clone, Copy)]
pub struct ConfluenceSettings<'a> {
    /// Server base URL (http or https).
    pub url: &'a str,
    /// Username.
    pub username: &'a str,
    /// Password.
    pub password: &'a str,
    /// Space key.
    pub space: &'a str,
    /// Parent page ID, if configured.
    pub parent_page_id: Option<&'a str>,
}

/// `[render]` section.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Prepend the table-of-contents macro.
    pub toc: bool,
    /// Enable Markdown footnotes.
    pub footnotes: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            toc: true,
            footnotes: false,
        }
    }
}

/// `[images]` section.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Maximum display width.
    pub max_width: u32,
    /// Maximum display height.
    pub max_height: u32,
    /// Scale applied to images that already fit.
    pub min_scale: f64,
    /// Read pixel sizes from image files.
    pub derive_size: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: 600,
            max_height: 400,
            min_scale: 0.6,
            derive_size: true,
        }
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
        /// Config field path (e.g., "`confluence.password`").
        field: String,
        /// Error message (e.g., "${`KMS_TOKEN`} not set").
        message: String,
    },
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Non-empty value of an optional string.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration with optional CLI overrides.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise,
    /// searches for `kms.toml` in the current directory and parents, falling
    /// back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, or reading,
    /// parsing, expansion or validation fails.
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
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let confluence = &mut self.confluence;
        for (target, value) in [
            (&mut confluence.url, &settings.url),
            (&mut confluence.username, &settings.username),
            (&mut confluence.password, &settings.password),
            (&mut confluence.space, &settings.space),
            (&mut confluence.parent_page_id, &settings.parent_page_id),
        ] {
            if value.is_some() {
                target.clone_from(value);
            }
        }
        if let Some(toc) = settings.toc {
            self.render.toc = toc;
        }
    }

    /// Confluence settings needed to publish.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` listing every missing key, or if the
    /// URL is not http(s).
    pub fn require_confluence(&self) -> Result<ConfluenceSettings<'_>, ConfigError> {
        let conf = &self.confluence;
        let url = present(conf.url.as_ref());
        let username = present(conf.username.as_ref());
        let password = present(conf.password.as_ref());
        let space = present(conf.space.as_ref());

        let missing: Vec<&str> = [
            ("url", url),
            ("username", username),
            ("password", password),
            ("space", space),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| key)
        .collect();

        let (Some(url), Some(username), Some(password), Some(space)) =
            (url, username, password, space)
        else {
            return Err(ConfigError::Validation(format!(
                "missing Confluence settings: {} (set in [confluence], KMS_* variables or flags)",
                missing.join(", ")
            )));
        };
        require_http_url(url, "confluence.url")?;

        Ok(ConfluenceSettings {
            url,
            username,
            password,
            space,
            parent_page_id: present(conf.parent_page_id.as_ref()),
        })
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
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

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = present(self.confluence.url.as_ref()) {
            require_http_url(url, "confluence.url")?;
        }

        let images = &self.images;
        if images.max_width == 0 || images.max_height == 0 {
            return Err(ConfigError::Validation(
                "images.max_width and images.max_height must be greater than 0".to_owned(),
            ));
        }
        if !(images.min_scale > 0.0 && images.min_scale <= 1.0) {
            return Err(ConfigError::Validation(
                "images.min_scale must be in (0, 1]".to_owned(),
            ));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let confluence = &mut self.confluence;
        expand::expand_opt(&mut confluence.url, "confluence.url")?;
        expand::expand_opt(&mut confluence.username, "confluence.username")?;
        expand::expand_opt(&mut confluence.password, "confluence.password")?;
        expand::expand_opt(&mut confluence.space, "confluence.space")?;
        expand::expand_opt(&mut confluence.parent_page_id, "confluence.parent_page_id")?;
        Ok(())
    }
}
