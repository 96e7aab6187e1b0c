//! Sigil CLI - Decode and simulate effect resources

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{decode, simulate};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sigil")]
#[command(about = "Effect routine and particle generator tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one resource file and print its definition
    Decode {
        /// Path to a .routine, .generator or .keyframes file
        file: String,

        /// Resource kind; inferred from the extension when omitted
        #[arg(long, value_parser = parse_kind)]
        kind: Option<String>,

        /// Output format (json or toml)
        #[arg(long, default_value = "json")]
        format: String,

        /// Path to a simulation config file
        #[arg(long)]
        config: Option<String>,
    },

    /// Run a routine from a resource directory against a test scene
    Simulate {
        /// Resource directory
        dir: String,

        /// Routine id, e.g. "cast" or "[cast]"
        routine: String,

        /// Number of frames to simulate
        #[arg(long, default_value = "120")]
        frames: u32,

        /// Path to a simulation config file
        #[arg(long)]
        config: Option<String>,

        /// Bind to the weather instead of a source/target actor pair
        #[arg(long)]
        weather: bool,

        /// Distance between source and target actors
        #[arg(long, default_value = "10.0")]
        distance: f32,

        /// Print a line every N frames (0 = summary only)
        #[arg(long, default_value = "0")]
        every: u32,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn parse_kind(s: &str) -> Result<String, String> {
    match s {
        "routine" | "generator" | "keyframes" => Ok(s.to_string()),
        _ => Err(format!(
            "unknown resource kind '{}'; valid values: routine, generator, keyframes",
            s
        )),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            file,
            kind,
            format,
            config,
        } => decode::run(&file, kind.as_deref(), &format, config.as_deref()),
        Commands::Simulate {
            dir,
            routine,
            frames,
            config,
            weather,
            distance,
            every,
            format,
        } => simulate::run(simulate::SimulateArgs {
            dir,
            routine,
            frames,
            config,
            weather,
            distance,
            every,
            format,
        }),
    }
}
