//! CLI command implementations

use anyhow::Context as _;
use rayon::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use stree_core::driver;
use stree_core::{ConfigLoader, DefaultFileDiscovery, FormatOptions, StreeConfig, StreeError};
use tracing::{debug, info, warn};

use crate::ConfigFormat;
use crate::output::{self, Summary};

/// Formatter settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub print_width: Option<usize>,
    pub preferred_quote: Option<char>,
    pub trailing_comma: bool,
}

/// Settings shared by every command
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub overrides: Overrides,
    pub use_colors: bool,
}

impl Context {
    /// Load the configuration that applies to `paths`
    fn config(&self, paths: &[PathBuf]) -> stree_core::Result<StreeConfig> {
        if let Some(path) = &self.config_path {
            return ConfigLoader::load_from_file(path);
        }
        let start = match paths.first() {
            Some(path) if path.is_dir() => path.as_path(),
            Some(path) => match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            },
            None => Path::new("."),
        };
        ConfigLoader::load(None, Some(start))
    }

    /// Resolve formatter options, command-line values taking precedence
    fn options(&self, config: &StreeConfig) -> stree_core::Result<FormatOptions> {
        let mut options = config.format_options()?;
        if let Some(width) = self.overrides.print_width {
            options.print_width = width;
        }
        if let Some(quote) = self.overrides.preferred_quote {
            options.preferred_quote = quote;
        }
        if self.overrides.trailing_comma {
            options.trailing_comma = true;
        }
        Ok(options)
    }
}

/// What the printing commands write for each input
#[derive(Debug, Clone, Copy)]
pub enum Dump {
    Formatted,
    Sexp,
    Json,
    Document,
}

/// One unit of source to operate on
struct Input {
    label: String,
    path: Option<PathBuf>,
    source: String,
}

fn read_stdin() -> anyhow::Result<String> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("failed to read standard input")?;
    Ok(source)
}

fn read_inputs(files: &[PathBuf]) -> Vec<stree_core::Result<Input>> {
    files
        .iter()
        .map(|path| {
            driver::read(path).map(|source| Input {
                label: path.display().to_string(),
                path: Some(path.clone()),
                source,
            })
        })
        .collect()
}

/// Files named on the command line, or everything under the current
/// directory when none are
fn expand(paths: Vec<PathBuf>, config: &StreeConfig) -> stree_core::Result<Vec<PathBuf>> {
    let paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };
    let files = DefaultFileDiscovery::expand_paths(&paths, config)?;
    debug!("Found {} files to process", files.len());
    Ok(files)
}

/// Report a per-file failure and keep going
fn report_error(context: &Context, label: &str, source: Option<&str>, err: &StreeError) {
    match (err.as_parse_error(), source) {
        (Some(parse_error), Some(source)) => {
            eprint!(
                "{}",
                output::render_parse_error(label, source, parse_error, context.use_colors)
            );
        }
        _ => eprintln!("{}: {}", label, err),
    }
}

/// `format`, `ast`, `json` and `doc`: print something for each input
pub fn print_command(
    context: &Context,
    paths: Vec<PathBuf>,
    script: Option<String>,
    dump: Dump,
) -> anyhow::Result<bool> {
    let config = context.config(&paths)?;
    let options = context.options(&config)?;

    let inputs = match script {
        Some(source) => vec![Ok(Input {
            label: "-e".to_string(),
            path: None,
            source,
        })],
        None if paths.is_empty() => vec![Ok(Input {
            label: "stdin".to_string(),
            path: None,
            source: read_stdin()?,
        })],
        None => read_inputs(&expand(paths, &config)?),
    };

    let mut success = true;
    for input in inputs {
        let input = match input {
            Ok(input) => input,
            Err(err) => {
                report_error(context, "input", None, &err);
                success = false;
                continue;
            }
        };
        let rendered = match dump {
            Dump::Formatted => driver::format_with(&input.source, &options),
            Dump::Sexp => driver::sexp(&input.source, options.print_width),
            Dump::Json => driver::json(&input.source).map(|value| {
                let mut text = serde_json::to_string_pretty(&value).unwrap_or_default();
                text.push('\n');
                text
            }),
            Dump::Document => driver::document(&input.source, &options),
        };
        match rendered {
            Ok(text) => print!("{text}"),
            Err(err) => {
                report_error(context, &input.label, Some(&input.source), &StreeError::from(err));
                success = false;
            }
        }
        if let Some(path) = &input.path {
            debug!("Printed {}", path.display());
        }
    }
    Ok(success)
}

/// What happened to one file in a batch run
enum FileOutcome {
    Unchanged,
    Changed { original: String, formatted: String },
    Failed,
}

fn process_file(context: &Context, path: &Path, options: &FormatOptions) -> FileOutcome {
    let source = match driver::read(path) {
        Ok(source) => source,
        Err(err) => {
            report_error(context, &path.display().to_string(), None, &err);
            return FileOutcome::Failed;
        }
    };
    match driver::format_checked(&source, options, path) {
        Ok(formatted) if formatted == source => FileOutcome::Unchanged,
        Ok(formatted) => FileOutcome::Changed {
            original: source,
            formatted,
        },
        Err(err) => {
            report_error(context, &path.display().to_string(), Some(&source), &err);
            FileOutcome::Failed
        }
    }
}

/// `write`: format files in place
pub fn write_command(context: &Context, paths: Vec<PathBuf>) -> anyhow::Result<bool> {
    let config = context.config(&paths)?;
    let options = context.options(&config)?;
    let files = expand(paths, &config)?;
    let start_time = Instant::now();

    let outcomes: Vec<(usize, bool)> = files
        .par_iter()
        .map(|path| match process_file(context, path, &options) {
            FileOutcome::Unchanged => (0, true),
            FileOutcome::Changed { formatted, .. } => match std::fs::write(path, formatted) {
                Ok(()) => {
                    info!("Formatted {}", path.display());
                    (1, true)
                }
                Err(e) => {
                    let err = StreeError::io_error(path, e);
                    report_error(context, &path.display().to_string(), None, &err);
                    (0, false)
                }
            },
            FileOutcome::Failed => (0, false),
        })
        .collect();

    let summary = Summary {
        files_checked: files.len(),
        changed: outcomes.iter().map(|(changed, _)| changed).sum(),
        failed: outcomes.iter().filter(|(_, ok)| !ok).count(),
    };
    summary.print_write(start_time.elapsed());
    Ok(summary.failed == 0)
}

/// `check`: list files that are not formatted, optionally with a diff
pub fn check_command(context: &Context, paths: Vec<PathBuf>, diff: bool) -> anyhow::Result<bool> {
    let config = context.config(&paths)?;
    let options = context.options(&config)?;
    let files = expand(paths, &config)?;
    let start_time = Instant::now();

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| process_file(context, path, &options))
        .collect();

    let mut summary = Summary {
        files_checked: files.len(),
        ..Summary::default()
    };
    for (path, outcome) in files.iter().zip(outcomes) {
        match outcome {
            FileOutcome::Unchanged => {}
            FileOutcome::Changed {
                original,
                formatted,
            } => {
                summary.changed += 1;
                println!("{}", path.display());
                if diff {
                    print!("{}", output::render_diff(path, &original, &formatted));
                }
            }
            FileOutcome::Failed => summary.failed += 1,
        }
    }
    summary.print_check(start_time.elapsed());
    Ok(summary.changed == 0 && summary.failed == 0)
}

/// `config init`: write a configuration with every default spelled out
pub fn config_init_command(format: ConfigFormat, force: bool) -> anyhow::Result<bool> {
    let (filename, content) = {
        let config = StreeConfig::with_defaults();
        match format {
            ConfigFormat::Toml => (".streerc.toml", toml::to_string_pretty(&config)?),
            ConfigFormat::Yaml => ("stree.yaml", serde_yaml::to_string(&config)?),
            ConfigFormat::Json => ("stree.json", serde_json::to_string_pretty(&config)? + "\n"),
        }
    };

    let config_path = PathBuf::from(filename);
    if config_path.exists() && !force {
        warn!("Refusing to overwrite {}", filename);
        anyhow::bail!("configuration file '{filename}' already exists, use --force to overwrite");
    }

    std::fs::write(&config_path, content)
        .with_context(|| format!("failed to write {filename}"))?;
    println!("Created configuration file: {filename}");
    Ok(true)
}

/// `config show`: print the configuration in effect, overrides applied
pub fn config_show_command(context: &Context) -> anyhow::Result<bool> {
    let mut config = context.config(&[])?;
    let options = context.options(&config)?;
    let formatter = config.formatter.get_or_insert_with(Default::default);
    formatter.print_width = Some(options.print_width);
    formatter.preferred_quote = Some(options.preferred_quote.to_string());
    formatter.trailing_comma = Some(options.trailing_comma);
    formatter.disable_auto_ternary = Some(options.disable_auto_ternary);

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(true)
}

/// `config schema`: print the JSON schema of the configuration file
pub fn config_schema_command() -> anyhow::Result<bool> {
    println!(
        "{}",
        serde_json::to_string_pretty(&StreeConfig::json_schema())?
    );
    Ok(true)
}
