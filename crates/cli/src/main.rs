mod config_commands;
mod skills_commands;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    quiver_config::QuiverConfig,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "quiver", about = "Quiver: skills for AI agents", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./quiver.toml and the user config dir).
    #[arg(long, global = true, env = "QUIVER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Skill management.
    Skills {
        #[command(subcommand)]
        action: skills_commands::SkillAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Logs go to stderr so command output stays pipeable.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<QuiverConfig> {
    match path {
        Some(path) => Ok(quiver_config::load_config(path)?),
        None => Ok(quiver_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "quiver starting");

    let config_path = cli.config;
    match cli.command {
        Commands::Skills { action } => {
            let config = load_config(config_path.as_deref())?;
            skills_commands::handle_skills(action, &config.skills).await
        },
        Commands::Config { action } => {
            config_commands::handle_config(action, config_path.as_deref())
        },
    }
}
