//! webobf CLI
//!
//! Command-line interface for obfuscating a web project directory.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::Parser;
use webobf_core::Level;
use webobf_worker::{Orchestrator, Outcome, ProgressReporter, StartArgs};

#[derive(Parser)]
#[command(name = "webobf")]
#[command(about = "A CLI for obfuscating web projects")]
#[command(version)]
struct Cli {
    /// A web project path
    input: PathBuf,

    /// Obfuscation level
    #[arg(short, long, default_value = "low", value_parser = PossibleValuesParser::new(Level::NAMES))]
    level: String,

    /// Output path (default: <input>_Obfuscated)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run configuration file (default: <input>/webobf.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding <level>.json script options
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

/// Single-line progress display on stdout
struct ConsoleProgress {
    last_width: usize,
}

impl ConsoleProgress {
    fn new() -> Self {
        println!("Preparing...");
        Self { last_width: 0 }
    }

    fn clear(&mut self) {
        if self.last_width > 0 {
            print!("\r{}\r", " ".repeat(self.last_width));
            self.last_width = 0;
        }
    }
}

impl ProgressReporter for ConsoleProgress {
    fn progress(&mut self, percent: u8, text: &str) {
        let line = format!("[{}] {}", percent, text);
        let pad = self.last_width.saturating_sub(line.chars().count());
        print!("\r{}{}", line, " ".repeat(pad));
        let _ = std::io::stdout().flush();
        self.last_width = line.chars().count();
    }

    fn protocol_error(&mut self, error: &webobf_core::ObfuscateError) {
        self.clear();
        println!("Unsupported message: {}", error);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("webobf=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cmd_obfuscate(cli).await
}

/// Obfuscate a project and exit non-zero on failure
async fn cmd_obfuscate(cli: Cli) -> Result<()> {
    let args = StartArgs {
        source: cli.input.to_string_lossy().to_string(),
        level: cli.level,
        output: cli.output.map(|p| p.to_string_lossy().to_string()),
        config: cli.config.map(|p| p.to_string_lossy().to_string()),
        config_dir: cli.config_dir.map(|p| p.to_string_lossy().to_string()),
    };

    let mut display = ConsoleProgress::new();
    let outcome = Orchestrator::new().run(args, &mut display).await?;
    display.clear();

    match outcome {
        Outcome::Success { name } => {
            println!("Succeed to {}", name);
            Ok(())
        }
        Outcome::Failure { name, error } => {
            anyhow::bail!("Failed to {}: {}", name, error)
        }
    }
}
