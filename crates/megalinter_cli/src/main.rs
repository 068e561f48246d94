//! MegaLinter configuration CLI
//!
//! Resolves the configuration of a workspace and prints what linters would see.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;

use megalinter_config::{ConfigMapping, ConfigResolver, ConfigStore, ConfigValue, RequestId};

/// Resolve MegaLinter configuration for a workspace
#[derive(Parser)]
#[command(name = "megalinter-config")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace directory searched for .mega-linter.yml
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Override a configuration key (KEY=VALUE), highest precedence
    #[arg(short = 's', long = "set", global = true, value_parser = parse_key_value)]
    overrides: Vec<(String, String)>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print which sources produced the configuration
    Sources,

    /// Print the materialized environment
    Env {
        /// Show secured variables instead of redacting them
        #[arg(long)]
        unredacted: bool,

        /// Output as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Print a single value
    Get {
        /// Configuration key
        key: String,
    },

    /// Print a list value, one item per line
    List {
        /// Configuration key
        key: String,
    },

    /// Print an argument vector, one argument per line
    Args {
        /// Configuration key
        key: String,
    },

    /// Print the secured variable names
    Secured,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(found) => {
            if found {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns false when a requested key is absent.
fn run(cli: Cli) -> Result<bool> {
    let store = Arc::new(ConfigStore::new());
    let resolver = ConfigResolver::new(Arc::clone(&store));
    let id = RequestId::from("cli");

    let params: ConfigMapping = cli
        .overrides
        .into_iter()
        .map(|(key, value)| (key, ConfigValue::String(value)))
        .collect();

    resolver
        .init(&id, cli.workspace.as_deref(), params)
        .into_diagnostic()?;

    let found = match cli.command {
        Commands::Sources => {
            println!("{}", store.source_description(&id).into_diagnostic()?);
            true
        }
        Commands::Env { unredacted, json } => {
            let env = store
                .materialize_environment(&id, !unredacted)
                .into_diagnostic()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&env).into_diagnostic()?);
            } else {
                for (key, value) in &env {
                    println!("{}={}", key, value);
                }
            }
            true
        }
        Commands::Get { key } => match store.get_str(&id, &key).into_diagnostic()? {
            Some(value) => {
                println!("{}", value);
                true
            }
            None => false,
        },
        Commands::List { key } => match store.get_list(&id, &key).into_diagnostic()? {
            Some(items) => {
                for item in items {
                    println!("{}", item);
                }
                true
            }
            None => false,
        },
        Commands::Args { key } => match store.get_list_args(&id, &key).into_diagnostic()? {
            Some(args) => {
                for arg in args {
                    println!("{}", arg);
                }
                true
            }
            None => false,
        },
        Commands::Secured => {
            for name in store.secured_variables(&id).into_diagnostic()? {
                println!("{}", name);
            }
            true
        }
    };

    store.delete(&id);
    Ok(found)
}
