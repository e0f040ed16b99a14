use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "digestpipe")]
#[command(
    version,
    about = "Screen-activity digest pipeline: daily logs and discussion questions via LLM"
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
    /// Run the pipeline once
    Run {
        #[arg(long, help = "Treat as a user-triggered run (no questions email)")]
        from_button: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Serve the HTTP trigger and run on schedule
    Serve {
        #[arg(long, help = "Bind address override")]
        host: Option<String>,
        #[arg(long, short, help = "Port override")]
        port: Option<u16>,
        #[arg(long, help = "Disable the built-in scheduler")]
        no_schedule: bool,
    },

    /// Show onboarding state and recent daily logs
    Status {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
        #[arg(short = 'n', long, default_value = "5", help = "Number of recent logs")]
        limit: usize,
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
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
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
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
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
        eprintln!("\x1b[31mdigestpipe encountered an unexpected error:\x1b[0m");
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

        // backtrace with RUST_BACKTRACE=1
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
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run {
            from_button,
            format,
        } => {
            let rt = Runtime::new()?;
            let succeeded = rt.block_on(digestpipe::cli::commands::run::run(
                from_button,
                &format,
            ))?;
            anyhow::ensure!(succeeded, "pipeline run failed");
        }
        Commands::Serve {
            host,
            port,
            no_schedule,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(digestpipe::cli::commands::serve::run(
                host,
                port,
                no_schedule,
            ))?;
        }
        Commands::Status { format, limit } => {
            let rt = Runtime::new()?;
            rt.block_on(digestpipe::cli::commands::status::run(&format, limit))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                digestpipe::cli::commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                digestpipe::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    digestpipe::cli::commands::config::init_global(force)?;
                } else {
                    digestpipe::cli::commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
