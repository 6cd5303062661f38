use clap::{command, Parser};
use lazyparse::{parser::Pattern, Error, PatternConfig, TextParser};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Match a regular expression against the start of standard input without
/// reading past the match.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pattern to match
    pattern: String,

    /// Path to a JSON pattern config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also print the rest of the input after the match
    #[arg(short, long)]
    rest: bool,

    /// Enable debug mode
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: &Cli) -> Result<bool, Error> {
    let config = match &cli.config {
        Some(path) => PatternConfig::from_file(path)?,
        None => PatternConfig::default(),
    };
    debug!("config: {:?}", config);

    let pattern = Pattern::with_config(&cli.pattern, &config)?;
    info!(pattern = %cli.pattern, "pattern compiled");

    match pattern.parse_reader(std::io::stdin()) {
        Ok((rest, value)) => {
            println!("{}", value);
            if cli.rest {
                print!("{}", rest);
            }
            Ok(true)
        }
        Err(e) => {
            eprintln!("No match: {}", e);
            Ok(false)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
