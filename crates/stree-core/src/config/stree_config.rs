//! Configuration file schema

use crate::cst::formatter::FormatOptions;
use crate::error::StreeError;
use crate::result::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Files picked up when a configuration names no `include` patterns
pub const DEFAULT_INCLUDE: &[&str] = &[
    "**/*.rb",
    "**/*.rake",
    "**/Gemfile",
    "**/Rakefile",
    "**/*.gemspec",
    "**/*.ru",
];

/// Root of a configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreeConfig {
    /// Layout options
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Formatter options")]
    pub formatter: Option<FormatterConfiguration>,

    /// Which files batch commands operate on
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "File include and exclude patterns")]
    pub files: Option<FilesConfiguration>,
}

/// Formatter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatterConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Maximum line width before groups break (default 80)")]
    pub print_width: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Quote used for plain string literals: '\"' or \"'\"")]
    pub preferred_quote: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Add a trailing comma to broken array, hash and argument lists")]
    pub trailing_comma: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Never turn a short if/else into a ternary")]
    pub disable_auto_ternary: Option<bool>,
}

/// File selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilesConfiguration {
    /// Glob patterns to include
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Glob patterns for files to include")]
    pub include: Option<Vec<String>>,

    /// Glob patterns to exclude
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Glob patterns for files to exclude")]
    pub exclude: Option<Vec<String>>,
}

impl StreeConfig {
    /// Load a configuration, choosing the format by file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StreeError::io_error(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        let parsed = match ext {
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => Err("Unsupported file extension (expected .toml, .yaml, .yml, or .json)".to_string()),
        };
        parsed.map_err(StreeError::config_error)
    }

    /// Formatter configuration with defaults
    pub fn formatter_config(&self) -> FormatterConfiguration {
        self.formatter.clone().unwrap_or_default()
    }

    /// Include patterns, falling back to [`DEFAULT_INCLUDE`]
    pub fn include_patterns(&self) -> Vec<String> {
        self.files
            .as_ref()
            .and_then(|files| files.include.clone())
            .unwrap_or_else(|| DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect())
    }

    pub fn exclude_patterns(&self) -> Vec<String> {
        self.files
            .as_ref()
            .and_then(|files| files.exclude.clone())
            .unwrap_or_default()
    }

    /// Resolve the formatter section into options for the layout engine
    pub fn format_options(&self) -> Result<FormatOptions> {
        self.formatter_config().to_format_options()
    }

    /// A configuration with every default spelled out, for `config init`
    pub fn with_defaults() -> Self {
        let options = FormatOptions::default();
        Self {
            formatter: Some(FormatterConfiguration {
                print_width: Some(options.print_width),
                preferred_quote: Some(options.preferred_quote.to_string()),
                trailing_comma: Some(options.trailing_comma),
                disable_auto_ternary: Some(options.disable_auto_ternary),
            }),
            files: Some(FilesConfiguration {
                include: Some(DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect()),
                exclude: Some(Vec::new()),
            }),
        }
    }

    /// JSON schema of the configuration file
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(StreeConfig)).unwrap_or_default()
    }
}

impl FormatterConfiguration {
    pub fn to_format_options(&self) -> Result<FormatOptions> {
        let defaults = FormatOptions::default();
        let preferred_quote = match self.preferred_quote.as_deref() {
            None => defaults.preferred_quote,
            Some("\"") => '"',
            Some("'") => '\'',
            Some(other) => {
                return Err(StreeError::config_error(format!(
                    "preferredQuote must be '\"' or \"'\", found {other:?}"
                )));
            }
        };
        let print_width = self.print_width.unwrap_or(defaults.print_width);
        if print_width == 0 {
            return Err(StreeError::config_error("printWidth must be greater than zero"));
        }

        Ok(FormatOptions {
            print_width,
            preferred_quote,
            trailing_comma: self.trailing_comma.unwrap_or(defaults.trailing_comma),
            disable_auto_ternary: self
                .disable_auto_ternary
                .unwrap_or(defaults.disable_auto_ternary),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configuration_uses_defaults() {
        let config = StreeConfig::default();
        assert_eq!(config.format_options().unwrap(), FormatOptions::default());
        assert_eq!(config.include_patterns().len(), DEFAULT_INCLUDE.len());
        assert!(config.exclude_patterns().is_empty());
    }

    #[test]
    fn formatter_section_maps_to_options() {
        let config: StreeConfig = toml::from_str(
            "[formatter]\nprintWidth = 100\npreferredQuote = \"'\"\ntrailingComma = true\n",
        )
        .unwrap();
        let options = config.format_options().unwrap();
        assert_eq!(options.print_width, 100);
        assert_eq!(options.preferred_quote, '\'');
        assert!(options.trailing_comma);
        assert!(!options.disable_auto_ternary);
    }

    #[test]
    fn rejects_unknown_quotes() {
        let config = FormatterConfiguration {
            preferred_quote: Some("`".to_string()),
            ..FormatterConfiguration::default()
        };
        assert!(config.to_format_options().is_err());
    }

    #[test]
    fn schema_names_the_sections() {
        let schema = StreeConfig::json_schema().to_string();
        assert!(schema.contains("formatter"));
        assert!(schema.contains("printWidth"));
    }
}
