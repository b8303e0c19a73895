//! Phrasebook CLI - study bilingual phrases level by level

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use phrasebook::config;
use phrasebook::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "phrasebook")]
#[command(version)]
#[command(about = "Bilingual flashcards - Russian/English phrases ordered by CEFR level")]
#[command(long_about = r#"
Phrasebook keeps Russian/English phrase pairs in a local SQLite file and
serves them one at a time, beginner levels first.

Example usage:
  phrasebook seed
  phrasebook import --file phrases.json
  phrasebook study --level A2
  phrasebook stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Import phrases from a JSON file
    Import {
        /// JSON file with [{"ru", "en", "level"}] records
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Write the sample phrase file if missing, then import it
    Seed {
        /// Where to write the sample file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show the next phrase due for study
    Next {
        /// Only consider one level (A1..C2)
        #[arg(short, long)]
        level: Option<String>,
    },

    /// Mark a phrase as learned
    Done {
        /// Phrase id
        id: i64,
    },

    /// Mark a phrase as not learned
    Undo {
        /// Phrase id
        id: i64,
    },

    /// Show progress per level
    Stats,

    /// Study phrases interactively
    Study {
        /// Only study one level (A1..C2)
        #[arg(short, long)]
        level: Option<String>,
    },

    /// Print the version
    Version,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Print a `{ ok, command, data }` envelope in JSON mode
pub fn emit_success(
    output_mode: OutputMode,
    command: &str,
    data: serde_json::Value,
) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn parse_level(level: Option<String>) -> anyhow::Result<Option<Level>> {
    level
        .map(|l| l.trim().to_uppercase().parse::<Level>())
        .transpose()
        .map_err(Into::into)
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    if let Err(e) = run(cli, output_mode) {
        if output_mode.is_human() {
            phrasebook::ui::error(&format!("{:#}", e));
        } else {
            let envelope = serde_json::json!({ "ok": false, "error": format!("{:#}", e) });
            println!("{}", envelope);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, output_mode: OutputMode) -> anyhow::Result<()> {
    let loaded = config::load_config(cli.config.as_deref())?;
    let base = config::install_dir();

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            commands::run_init(output_mode, &path, &base, force)
        }

        Commands::Import { file } => {
            let paths = config::resolve_paths(loaded.as_ref(), cli.database.as_deref(), file.as_deref(), &base);
            commands::run_import(output_mode, &paths)
        }

        Commands::Seed { file } => {
            let paths = config::resolve_paths(loaded.as_ref(), cli.database.as_deref(), file.as_deref(), &base);
            commands::run_seed(output_mode, &paths)
        }

        Commands::Next { level } => {
            let paths = config::resolve_paths(loaded.as_ref(), cli.database.as_deref(), None, &base);
            commands::run_next(output_mode, &paths, parse_level(level)?)
        }

        Commands::Done { id } => {
            let paths = config::resolve_paths(loaded.as_ref(), cli.database.as_deref(), None, &base);
            commands::run_mark(output_mode, &paths, id, true)
        }

        Commands::Undo { id } => {
            let paths = config::resolve_paths(loaded.as_ref(), cli.database.as_deref(), None, &base);
            commands::run_mark(output_mode, &paths, id, false)
        }

        Commands::Stats => {
            let paths = config::resolve_paths(loaded.as_ref(), cli.database.as_deref(), None, &base);
            commands::run_stats(output_mode, &paths)
        }

        Commands::Study { level } => {
            let paths = config::resolve_paths(loaded.as_ref(), cli.database.as_deref(), None, &base);
            commands::run_study(output_mode, &paths, parse_level(level)?)
        }

        Commands::Version => commands::run_version(output_mode),
    }
}
