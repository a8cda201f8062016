use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "notify-tally")]
#[command(about = "Counts unacknowledged Slack notifications per channel", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run report cycles on the configured schedule
    Run,
    /// Run a single report cycle now
    Once {
        /// Skip sinks and print the report as JSON
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the pivot view of the recorded history
    Pivot,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notify_tally=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = notify_tally::config::resolve_config_path(cli.config.as_deref());

    match cli.command {
        Some(Commands::Run) | None => {
            notify_tally::cli::run::run(config_path).await?;
        }
        Some(Commands::Once { dry_run }) => {
            notify_tally::cli::run::once(config_path, dry_run).await?;
        }
        Some(Commands::Pivot) => {
            notify_tally::cli::run::pivot(config_path).await?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => {
                notify_tally::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                notify_tally::cli::config::validate(config_path)?;
            }
        },
    }

    Ok(())
}
