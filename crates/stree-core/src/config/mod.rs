//! Configuration system for stree
//!
//! Formatting options and file selection can be kept in a configuration
//! file next to the code. The loader supports TOML, YAML and JSON, picked by
//! file extension.
//!
//! ## Configuration Discovery
//!
//! When no explicit config path is provided, the loader searches the start
//! directory and then each parent directory for, in order:
//!
//! - `.streerc.toml`
//! - `stree.toml`
//! - `stree.yaml` / `stree.yml`
//! - `stree.json`
//!
//! The first file found wins. Flags given on the command line override the
//! values it holds.
//!
//! ## Example Configuration
//!
//! ```toml
//! [formatter]
//! printWidth = 100
//! preferredQuote = "'"
//! trailingComma = true
//!
//! [files]
//! include = ["**/*.rb", "**/Rakefile"]
//! exclude = ["vendor/**"]
//! ```

mod loader;
mod stree_config;

pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
pub use stree_config::{
    DEFAULT_INCLUDE, FilesConfiguration, FormatterConfiguration, StreeConfig,
};
