// Generation settings: defaults, optional JSON file, CLI overrides

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// C source with static descriptor tables
    #[default]
    C,
    /// Pretty-printed JSON dump of the same tables
    Json,
    /// C source with a `print_<Name>` function per struct
    Printers,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::C | OutputFormat::Printers => "c",
            OutputFormat::Json => "json",
        }
    }

    /// Default artifact file name for an input with this stem
    pub fn artifact_name(self, stem: &str) -> String {
        let kind = match self {
            OutputFormat::C | OutputFormat::Json => "structinfo",
            OutputFormat::Printers => "printers",
        };
        format!("{}_{}.{}", stem, kind, self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub analysis_mode: bool,
    pub marker_annotation: String,
    pub marker_macro: String,
    pub symbol_prefix: Option<String>,
    pub header_include: String,
    pub format: OutputFormat,
    pub registry: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis_mode: true,
            marker_annotation: "generate_cinspect".to_string(),
            marker_macro: "CINSPECT_STRUCT".to_string(),
            symbol_prefix: None,
            header_include: "struct_reflect.h".to_string(),
            format: OutputFormat::C,
            registry: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_analysis_mode(mut self, on: bool) -> Self {
        self.analysis_mode = on;
        self
    }

    pub fn with_symbol_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.symbol_prefix = Some(prefix.into());
        self
    }

    pub fn with_header_include(mut self, include: impl Into<String>) -> Self {
        self.header_include = include.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_registry(mut self, on: bool) -> Self {
        self.registry = on;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.marker_macro) {
            return Err(ConfigError::Invalid(format!(
                "marker_macro '{}' is not a C identifier",
                self.marker_macro
            )));
        }
        if self.marker_annotation.is_empty() {
            return Err(ConfigError::Invalid(
                "marker_annotation must not be empty".to_string(),
            ));
        }
        if let Some(prefix) = &self.symbol_prefix {
            if !prefix.is_empty() && !is_identifier(prefix) {
                return Err(ConfigError::Invalid(format!(
                    "symbol_prefix '{}' cannot start a C identifier",
                    prefix
                )));
            }
        }
        if self.header_include.is_empty() || self.header_include.contains(['"', '\n']) {
            return Err(ConfigError::Invalid(format!(
                "header_include '{}' is not a valid include path",
                self.header_include
            )));
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
