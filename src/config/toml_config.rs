use crate::core::{ConfigProvider, WriteMode};
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "geo2csv.toml";
pub const DEFAULT_BASE_URL: &str = "http://api.goeuro.com/api/v2/position/suggest/en/";
pub const DEFAULT_CSV_DIRECTORY: &str = "./csv";
pub const DEFAULT_ENCODING: &str = "UTF-8";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Prefix the percent-encoded location is appended to.
    pub base_url: String,
    /// No deadline when absent.
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    /// Used to encode the request, decode the response and write the CSV.
    pub encoding: String,
    pub write_mode: WriteMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_CSV_DIRECTORY.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            write_mode: WriteMode::default(),
        }
    }
}

impl Settings {
    /// Loads `path` when given, otherwise `geo2csv.toml` if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            LookupError::config(format!(
                "cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| LookupError::config(format!("TOML parsing error: {}", e)))
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| LookupError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }
}

impl ConfigProvider for Settings {
    fn base_url(&self) -> &str {
        &self.source.base_url
    }

    fn csv_directory(&self) -> &str {
        &self.output.directory
    }

    fn encoding(&self) -> &str {
        &self.output.encoding
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.source.timeout_seconds.map(Duration::from_secs)
    }

    fn write_mode(&self) -> WriteMode {
        self.output.write_mode
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("source.base_url", &self.source.base_url)?;
        validation::validate_path("output.directory", &self.output.directory)?;
        validation::validate_encoding("output.encoding", &self.output.encoding)?;
        if self.source.timeout_seconds == Some(0) {
            return Err(LookupError::config(
                "source.timeout_seconds must be at least 1; omit it for no deadline",
            ));
        }
        Ok(())
    }
}
