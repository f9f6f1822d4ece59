//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV: &str = "WEBPOPT_CONFIG";

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed settings
    pub schema: ConfigSchema,
    /// File the settings came from, if any
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// Resolution order: explicit `path`, `$WEBPOPT_CONFIG`, the standard
    /// locations, then built-in defaults. An explicit path that does not
    /// exist is an error; a missing default location is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let config_path = match explicit {
            Some(p) if !p.exists() => return Err(Error::config_not_found(&p)),
            Some(p) => Some(p),
            None => find_config_file(),
        };

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        let validation = schema.validate();
        for warning in validation.warnings() {
            tracing::warn!(field = %warning.field, "{}", warning.message);
        }
        validation
            .to_result()
            .context(format!("While loading {}", display_source(config_path.as_deref())))?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Load with defaults only (no file)
    pub fn defaults() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }

    /// Write the settings as TOML to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&self.schema)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| Error::config(format!("Failed to write config file {}: {}", path.display(), e)))
    }
}

fn display_source(path: Option<&Path>) -> String {
    path.map_or_else(|| "built-in defaults".to_string(), |p| p.display().to_string())
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let candidates = [".webpopt.toml", "webpopt.toml", ".config/webpopt.toml"];

    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(PathBuf::from(candidate));
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("webpopt").join("webpopt.toml"))
        .filter(|p| p.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read config file {}: {}", path.display(), e)))?;

    toml::from_str(&content).map_err(|e| {
        Error::new(
            crate::ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}: {}", path.display(), e),
        )
        .with_source(e)
    })
}
