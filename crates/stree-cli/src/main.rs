//! stree CLI
//!
//! Command-line interface for the stree Ruby formatter

mod commands;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "stree")]
#[command(about = "Parse and format Ruby source")]
#[command(version = stree_core::VERSION)]
#[command(
    long_about = "stree parses Ruby into a concrete syntax tree and prints it back out\n\
in a consistent style.\n\
\n\
Examples:\n  \
stree format app.rb          # Print the formatted file\n  \
stree write lib/             # Format every Ruby file under lib/ in place\n  \
stree check --diff .         # List files that need formatting\n  \
stree ast -e 'foo(1)'        # Dump the syntax tree of a snippet\n  \
stree config init            # Write a default configuration file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.streerc.toml, stree.yaml, stree.json)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,

    /// Maximum line width, overriding the configuration
    #[arg(long, global = true)]
    print_width: Option<usize>,

    /// Preferred string quote, overriding the configuration
    #[arg(long, global = true, value_enum)]
    quote: Option<QuoteStyle>,

    /// Add trailing commas to broken lists
    #[arg(long, global = true)]
    trailing_comma: bool,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print formatted source
    Format {
        #[arg(help = "Files or directories to format (default: stdin)")]
        paths: Vec<PathBuf>,

        /// Format this snippet instead of files
        #[arg(short = 'e', long = "eval", conflicts_with = "paths")]
        script: Option<String>,
    },

    /// Format files in place
    Write {
        #[arg(help = "Files or directories to format (default: current directory)")]
        paths: Vec<PathBuf>,
    },

    /// Report files whose formatting differs
    Check {
        #[arg(help = "Files or directories to check (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Show a unified diff for each file
        #[arg(long)]
        diff: bool,
    },

    /// Print the syntax tree as an S-expression
    Ast {
        paths: Vec<PathBuf>,

        #[arg(short = 'e', long = "eval", conflicts_with = "paths")]
        script: Option<String>,
    },

    /// Print the syntax tree as JSON
    Json {
        paths: Vec<PathBuf>,

        #[arg(short = 'e', long = "eval", conflicts_with = "paths")]
        script: Option<String>,
    },

    /// Print the layout document built by the formatter
    Doc {
        paths: Vec<PathBuf>,

        #[arg(short = 'e', long = "eval", conflicts_with = "paths")]
        script: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a configuration file with every default spelled out
    Init {
        #[arg(short, long, default_value = "toml")]
        format: ConfigFormat,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration that applies to the current directory
    Show,

    /// Print the JSON schema of the configuration file
    Schema,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum QuoteStyle {
    /// `"`
    Double,
    /// `'`
    Single,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return ExitCode::SUCCESS;
    }

    let use_colors =
        !cli.no_color && std::env::var("NO_COLOR").is_err() && io::stdout().is_terminal();
    colored::control::set_override(use_colors);

    let log_level = match cli.verbose {
        0 => "stree=warn",
        1 => "stree=info",
        2 => "stree=debug",
        _ => "stree=trace",
    };
    stree_core::init_tracing_with(log_level);

    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        return ExitCode::FAILURE;
    }

    match run_command(cli, use_colors) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Run the selected command; `Ok(false)` means it finished but should exit
/// with a failure status
fn run_command(cli: Cli, use_colors: bool) -> anyhow::Result<bool> {
    let overrides = commands::Overrides {
        print_width: cli.print_width,
        preferred_quote: cli.quote.map(|quote| match quote {
            QuoteStyle::Double => '"',
            QuoteStyle::Single => '\'',
        }),
        trailing_comma: cli.trailing_comma,
    };
    let context = commands::Context {
        config_path: cli.config,
        overrides,
        use_colors,
    };

    match cli.command {
        Some(Commands::Format { paths, script }) => {
            commands::print_command(&context, paths, script, commands::Dump::Formatted)
        }
        Some(Commands::Write { paths }) => commands::write_command(&context, paths),
        Some(Commands::Check { paths, diff }) => commands::check_command(&context, paths, diff),
        Some(Commands::Ast { paths, script }) => {
            commands::print_command(&context, paths, script, commands::Dump::Sexp)
        }
        Some(Commands::Json { paths, script }) => {
            commands::print_command(&context, paths, script, commands::Dump::Json)
        }
        Some(Commands::Doc { paths, script }) => {
            commands::print_command(&context, paths, script, commands::Dump::Document)
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { format, force } => commands::config_init_command(format, force),
            ConfigAction::Show => commands::config_show_command(&context),
            ConfigAction::Schema => commands::config_schema_command(),
        },
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(true)
        }
    }
}
