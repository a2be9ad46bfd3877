mod commands;
mod gateway;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trigger_channels::telegram::TelegramChannel;
use trigger_core::{config, traits::Channel};
use trigger_store::{open_store, Registry};

#[derive(Parser)]
#[command(
    name = "trigger-bot",
    version,
    about = "Keyword-triggered auto-reply bot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Telegram and start answering messages.
    Start,
    /// Show the configured store, match mode, and channel status.
    Status,
    /// Print every stored trigger.
    List,
    /// Show which reply a message would get.
    Match {
        /// The message text to test.
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    // Only the long-running bot writes log files.
    let log_dir = matches!(cli.command, Commands::Start).then(|| cfg.bot.log_dir());
    let _log_guard = init_logging(log_dir.as_deref())?;
    match &cfg.source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("Config file not found at {}, using defaults", cli.config),
    }

    match cli.command {
        Commands::Start => {
            let tg = cfg
                .channel
                .telegram
                .as_ref()
                .filter(|tg| tg.enabled)
                .context("Telegram is not enabled. Enable [channel.telegram] in config.toml.")?;
            if tg.bot_token.is_empty() {
                anyhow::bail!(
                    "Telegram is enabled but bot_token is empty. \
                     Set it in config.toml or the {} env var.",
                    config::ENV_BOT_TOKEN
                );
            }

            let registry = Arc::new(open_registry(&cfg).await?);

            let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
            channels.insert("telegram".to_string(), Arc::new(TelegramChannel::new(tg)));

            println!("{} starting...", cfg.bot.name);
            let gw = Arc::new(gateway::Gateway::new(channels, registry, &cfg));
            gw.run().await?;
        }
        Commands::Status => {
            println!("{} status\n", cfg.bot.name);
            println!("Config: {}", cli.config);
            println!("Store backend: {}", cfg.store.backend.display_name());
            println!("Match mode: {}", cfg.matching.mode.display_name());
            println!(
                "Admin auth: {}",
                if cfg.auth.enabled {
                    format!("enforced ({} admins)", cfg.auth.admins.len())
                } else {
                    "disabled".to_string()
                }
            );

            match open_registry(&cfg).await {
                Ok(registry) => println!("Triggers: {}", registry.len()),
                Err(e) => println!("Triggers: unavailable ({e:#})"),
            }
            println!();

            if let Some(ref tg) = cfg.channel.telegram {
                println!(
                    "  telegram: {}",
                    if tg.enabled && !tg.bot_token.is_empty() {
                        "configured"
                    } else if tg.enabled {
                        "enabled but missing bot_token"
                    } else {
                        "disabled"
                    }
                );
            } else {
                println!("  telegram: not configured");
            }
        }
        Commands::List => {
            let registry = open_registry(&cfg).await?;
            let triggers = registry.list();
            if triggers.is_empty() {
                println!("No triggers yet.");
            }
            for trigger in &triggers {
                println!("{}", commands::format_entry(trigger));
            }
        }
        Commands::Match { text } => {
            if text.is_empty() {
                anyhow::bail!("no message provided. Usage: trigger-bot match <text>");
            }
            let text = text.join(" ");
            let registry = open_registry(&cfg).await?;
            match registry.find_reply(&text, cfg.matching.mode) {
                Some(reply) => println!("{reply}"),
                None => println!("(no match)"),
            }
        }
    }

    Ok(())
}

/// Open the configured store and load it into a registry.
async fn open_registry(cfg: &config::Config) -> anyhow::Result<Registry> {
    let store = open_store(&cfg.store)
        .await
        .with_context(|| format!("failed to open {} store", cfg.store.backend.display_name()))?;
    let registry = Registry::open(store, cfg.store.timeout())
        .await
        .context("failed to load triggers")?;
    Ok(registry)
}

/// Log to stderr, and to a daily-rotated file under `log_dir` when given.
///
/// The returned guard flushes the file writer on drop and must be held
/// for the life of the process.
fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log dir {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("trigger-bot")
                .filename_suffix("log")
                .build(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}
