use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prdsmith::cli::commands::{self, generate::GenerateOptions};

#[derive(Parser)]
#[command(name = "prdsmith")]
#[command(
    version,
    about = "Turns a source-code repository into a structured product requirements document"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a PRD from an unpacked repository
    Generate {
        #[arg(help = "Repository directory")]
        repo: PathBuf,
        #[arg(long, help = "Text file with the client's brief")]
        brief: Option<PathBuf>,
        #[arg(long, short, help = "Write the JSON output here instead of stdout")]
        output: Option<PathBuf>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
    },

    /// Extract technical facts only (no completion calls)
    Scan {
        #[arg(help = "Repository directory")]
        repo: PathBuf,
        #[arg(long, short, help = "Write the JSON output here instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mprdsmith encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Default hook prints the backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            repo,
            brief,
            output,
            model,
        } => {
            commands::generate::run(GenerateOptions {
                repo,
                brief,
                output,
                model,
            })?;
        }
        Commands::Scan { repo, output } => {
            commands::scan::run(&repo, output)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(&format)?,
            ConfigAction::Path => commands::config::path()?,
        },
    }

    Ok(())
}
