//! Configuration file discovery and loading

use super::stree_config::StreeConfig;
use crate::error::StreeError;
use crate::result::Result;
use std::path::{Path, PathBuf};

/// File names searched in each directory, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".streerc.toml",
    "stree.toml",
    "stree.yaml",
    "stree.yml",
    "stree.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by walking upward from `start_path`
    ///
    /// Each directory is checked for [`CONFIG_FILE_NAMES`] in order until a
    /// file is found or the filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| StreeError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<StreeConfig> {
        StreeConfig::load(path).map_err(|e| {
            StreeError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load config from an explicit path or auto-discover one
    ///
    /// Unlike an explicit path, a failed discovery is not an error: the
    /// default configuration is returned instead.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<StreeConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(StreeError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(StreeConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            ".streerc.toml",
            "[formatter]\nprintWidth = 120\n",
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.formatter.unwrap().print_width, Some(120));
    }

    #[test]
    fn test_load_from_file_yaml_and_json() {
        let temp_dir = TempDir::new().unwrap();
        let yaml = create_temp_config(
            temp_dir.path(),
            "stree.yml",
            "formatter:\n  trailingComma: true\n",
        );
        let json = create_temp_config(
            temp_dir.path(),
            "stree.json",
            r#"{"files": {"exclude": ["vendor/**"]}}"#,
        );

        let config = ConfigLoader::load_from_file(&yaml).unwrap();
        assert_eq!(config.formatter.unwrap().trailing_comma, Some(true));

        let config = ConfigLoader::load_from_file(&json).unwrap();
        assert_eq!(config.exclude_patterns(), vec!["vendor/**".to_string()]);
    }

    #[test]
    fn test_auto_discover_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("lib/nested");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "stree.toml", "");

        let found = ConfigLoader::auto_discover(&nested).unwrap();
        assert_eq!(
            found.unwrap().file_name().unwrap().to_str(),
            Some("stree.toml")
        );
    }

    #[test]
    fn test_dotfile_takes_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "stree.json", "{}");
        create_temp_config(temp_dir.path(), ".streerc.toml", "");

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap().unwrap();
        assert!(found.ends_with(".streerc.toml"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("nonexistent.toml")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_config(temp_dir.path(), "stree.json", "{ not json");
        assert!(ConfigLoader::load_from_file(&path).is_err());
    }
}
