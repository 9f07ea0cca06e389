mod config_commands;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    notifeed_config::{NotifeedConfig, Severity, validate, watermark_dir},
    notifeed_feed::{FileWatermarkStore, MemoryWatermarkStore, WatermarkStore},
    notifeed_github::GitHubClient,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::config_commands::ConfigAction;

#[derive(Parser)]
#[command(name = "notifeed", about = "GitHub notifications as RSS feeds")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (default: ./notifeed.toml, then ~/.config/notifeed/).
    #[arg(long, global = true, env = "NOTIFEED_CONFIG")]
    config: Option<PathBuf>,
    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Keep channel watermarks across restarts.
    #[arg(long, global = true, default_value_t = false)]
    persist: bool,
    /// Where watermark files go (implies --persist).
    #[arg(long, global = true)]
    watermark_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the feeds (default when no subcommand is provided).
    Serve,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

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

/// File, then environment, then flags.
fn load_config(cli: &Cli) -> anyhow::Result<NotifeedConfig> {
    let mut config = match &cli.config {
        Some(path) => notifeed_config::load_config(path)?,
        None => notifeed_config::discover_and_load(),
    };
    notifeed_config::apply_env_overrides(&mut config);
    apply_cli_overrides(cli, &mut config);
    Ok(config)
}

fn apply_cli_overrides(cli: &Cli, config: &mut NotifeedConfig) {
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.persist {
        config.persistence.enabled = true;
    }
    if let Some(dir) = &cli.watermark_dir {
        config.persistence.enabled = true;
        config.persistence.dir = Some(dir.clone());
    }
}

async fn serve(config: NotifeedConfig) -> anyhow::Result<()> {
    let result = validate(&config);
    for d in &result.diagnostics {
        match d.severity {
            Severity::Error => error!(path = d.path, "{}", d.message),
            Severity::Warning => warn!(path = d.path, "{}", d.message),
            Severity::Info => info!(path = d.path, "{}", d.message),
        }
    }
    if result.has_errors() {
        anyhow::bail!(
            "invalid configuration ({} error(s)), run `notifeed config check` for details",
            result.of(Severity::Error).count()
        );
    }

    let token = config
        .github
        .token
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no GitHub token configured"))?;
    let source = Arc::new(GitHubClient::new(token, &config.github)?);

    let store: Arc<dyn WatermarkStore> = if config.persistence.enabled {
        let store = FileWatermarkStore::new(watermark_dir(&config));
        info!(dir = %store.dir().display(), "persisting watermarks");
        Arc::new(store)
    } else {
        Arc::new(MemoryWatermarkStore::new())
    };

    notifeed_gateway::start(&config, source, store).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "notifeed starting");

    let config = load_config(&cli)?;
    match cli.command {
        None | Some(Commands::Serve) => serve(config).await,
        Some(Commands::Config { action }) => config_commands::handle_config(action, &config),
    }
}
