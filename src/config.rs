//! TOML configuration (`metrica.toml`)
//!
//! Only report rendering is configurable; the language itself has no knobs.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::{ReportFormat, ReportOptions};

/// Default configuration file name, looked up next to the input sheet.
pub const CONFIG_FILE_NAME: &str = "metrica.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown report format `{0}` (expected `markdown` or `latex`)")]
    UnknownFormat(String),
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub report: ReportSection,
}

/// The `[report]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub precision: usize,
    pub format: String,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            precision: 3,
            format: "markdown".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load `metrica.toml` from the sheet's directory when present,
    /// otherwise fall back to defaults.
    pub fn load_for_sheet(sheet: &Path) -> Result<Self, ConfigError> {
        let candidate = sheet
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CONFIG_FILE_NAME);
        if candidate.exists() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn report_options(&self) -> Result<ReportOptions, ConfigError> {
        let format = match self.report.format.as_str() {
            "markdown" | "md" => ReportFormat::Markdown,
            "latex" | "tex" => ReportFormat::Latex,
            other => return Err(ConfigError::UnknownFormat(other.to_string())),
        };
        Ok(ReportOptions {
            format,
            precision: self.report.precision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        let options = config.report_options().unwrap();
        assert_eq!(options.format, ReportFormat::Markdown);
        assert_eq!(options.precision, 3);
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [report]
            precision = 5
            format = "latex"
            "#,
        )
        .unwrap();
        let options = config.report_options().unwrap();
        assert_eq!(options.format, ReportFormat::Latex);
        assert_eq!(options.precision, 5);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let config: Config = toml::from_str("[report]\nformat = \"html\"").unwrap();
        assert!(matches!(
            config.report_options(),
            Err(ConfigError::UnknownFormat(_))
        ));
    }
}
