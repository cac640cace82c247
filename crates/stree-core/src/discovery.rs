//! Ruby source file discovery
//!
//! Batch commands accept files and directories. Directories are walked and
//! filtered through the configured include and exclude globs, plus the
//! patterns listed in a `.gitignore` at the discovery root.

use crate::config::StreeConfig;
use crate::error::StreeError;
use crate::result::Result;
use glob::Pattern;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Trait for file discovery functionality
pub trait FileDiscovery {
    /// Discover source files under the root based on configuration patterns
    fn discover_files(&self, config: &StreeConfig) -> Result<Vec<PathBuf>>;

    /// Check if a file should be included based on configuration
    fn should_include(&self, path: &Path, config: &StreeConfig) -> bool;
}

/// Default implementation of file discovery
#[derive(Debug, Clone)]
pub struct DefaultFileDiscovery {
    /// Root directory for file discovery
    pub root_dir: PathBuf,
}

fn compile_patterns(patterns: &[String], what: &str) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| {
                StreeError::config_error(format!("Invalid {what} pattern '{p}': {e}"))
            })
        })
        .collect()
}

/// Convert one `.gitignore` line into a glob
fn gitignore_glob(line: &str) -> String {
    let line = line.trim_start_matches('/');
    if let Some(dir) = line.strip_suffix('/') {
        format!("**/{dir}/**")
    } else if !line.contains('*') && !line.contains('?') && !line.contains('/') {
        format!("**/{line}")
    } else {
        line.to_string()
    }
}

impl DefaultFileDiscovery {
    /// Create a new file discovery instance
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Load ignore patterns from `.gitignore`
    fn load_ignore_patterns(&self) -> Vec<Pattern> {
        let gitignore_path = self.root_dir.join(".gitignore");
        if !gitignore_path.is_file() {
            return Vec::new();
        }
        match std::fs::read_to_string(&gitignore_path) {
            Ok(content) => {
                let patterns: Vec<Pattern> = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
                    .filter_map(|line| Pattern::new(&gitignore_glob(line)).ok())
                    .collect();
                debug!("Loaded {} patterns from .gitignore", patterns.len());
                patterns
            }
            Err(e) => {
                warn!("Failed to read .gitignore: {}", e);
                Vec::new()
            }
        }
    }

    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root_dir).unwrap_or(path)
    }

    fn matches_any(&self, path: &Path, patterns: &[Pattern]) -> bool {
        let relative = self.relative(path).to_string_lossy();
        patterns.iter().any(|pattern| pattern.matches(&relative))
    }

    /// Expand command-line operands into the files to process
    ///
    /// Files named directly are always kept, whatever the patterns say.
    /// Directories are searched with [`FileDiscovery::discover_files`].
    pub fn expand_paths(paths: &[PathBuf], config: &StreeConfig) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(Self::new(path).discover_files(config)?);
            } else if path.exists() {
                files.push(path.clone());
            } else {
                return Err(StreeError::io_error(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
                ));
            }
        }
        Ok(files)
    }
}

impl FileDiscovery for DefaultFileDiscovery {
    fn discover_files(&self, config: &StreeConfig) -> Result<Vec<PathBuf>> {
        info!("Discovering Ruby files in {}", self.root_dir.display());

        let include = compile_patterns(&config.include_patterns(), "include")?;
        let exclude = compile_patterns(&config.exclude_patterns(), "exclude")?;
        let ignored = self.load_ignore_patterns();

        let mut files = BTreeSet::new();
        let walker = WalkDir::new(&self.root_dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != OsStr::new(".git"));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file()
                && self.matches_any(path, &include)
                && !self.matches_any(path, &exclude)
                && !self.matches_any(path, &ignored)
            {
                files.insert(path.to_path_buf());
            }
        }

        info!("Discovered {} Ruby files", files.len());
        debug!("Files: {:?}", files);
        Ok(files.into_iter().collect())
    }

    fn should_include(&self, path: &Path, config: &StreeConfig) -> bool {
        let (Ok(include), Ok(exclude)) = (
            compile_patterns(&config.include_patterns(), "include"),
            compile_patterns(&config.exclude_patterns(), "exclude"),
        ) else {
            return false;
        };
        self.matches_any(path, &include)
            && !self.matches_any(path, &exclude)
            && !self.matches_any(path, &self.load_ignore_patterns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilesConfiguration;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn finds_ruby_sources_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "app.rb");
        touch(root, "lib/tasks/db.rake");
        touch(root, "Gemfile");
        touch(root, "README.md");

        let files = DefaultFileDiscovery::new(root)
            .discover_files(&StreeConfig::default())
            .unwrap();
        assert_eq!(names(root, &files), vec!["Gemfile", "app.rb", "lib/tasks/db.rake"]);
    }

    #[test]
    fn honors_excludes_and_gitignore() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "app.rb");
        touch(root, "vendor/gem.rb");
        touch(root, "tmp/cache.rb");
        fs::write(root.join(".gitignore"), "# build output\ntmp/\n").unwrap();

        let config = StreeConfig {
            files: Some(FilesConfiguration {
                include: None,
                exclude: Some(vec!["vendor/**".to_string()]),
            }),
            ..StreeConfig::default()
        };
        let discovery = DefaultFileDiscovery::new(root);
        let files = discovery.discover_files(&config).unwrap();
        assert_eq!(names(root, &files), vec!["app.rb"]);
        assert!(!discovery.should_include(&root.join("vendor/gem.rb"), &config));
    }

    #[test]
    fn explicit_files_bypass_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "script");
        touch(root, "lib/a.rb");

        let files = DefaultFileDiscovery::expand_paths(
            &[root.join("script"), root.join("lib")],
            &StreeConfig::default(),
        )
        .unwrap();
        assert_eq!(names(root, &files), vec!["script", "lib/a.rb"]);
    }

    #[test]
    fn missing_operands_are_errors() {
        let temp_dir = TempDir::new().unwrap();
        let result = DefaultFileDiscovery::expand_paths(
            &[temp_dir.path().join("missing.rb")],
            &StreeConfig::default(),
        );
        assert!(result.is_err());
    }
}
