use anyhow::Context;
use clap::{Parser, Subcommand};
use fileshare::channels::TelegramChannel;
use fileshare::config::{self, Settings};
use fileshare::relay::{FileResolver, PathResolver};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "tg-file-share")]
#[command(about = "Telegram bot that answers attachments with public download links", long_about = None)]
struct Cli {
    /// Append log output to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a config template (existing config is kept).
    Init {
        /// Config file path (default: TG_FILE_SHARE_CONFIG_PATH or ~/.tg-file-share/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the bot (getUpdates loop) and the public redirect server.
    Serve {
        /// Config file path (default: TG_FILE_SHARE_CONFIG_PATH or ~/.tg-file-share/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 8001)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Resolve one file id through getFile and print the redirect target.
    Resolve {
        /// Telegram file id
        file_id: String,

        /// Config file path (default: TG_FILE_SHARE_CONFIG_PATH or ~/.tg-file-share/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("logging setup failed: {:#}", e);
        std::process::exit(1);
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("tg-file-share {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port, bind }) => {
            if let Err(e) = run_serve(config, port, bind).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Resolve { file_id, config }) => {
            if let Err(e) = run_resolve(config, &file_id).await {
                log::error!("resolve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

/// env_logger with `info` default (RUST_LOG overrides), optionally into an append-mode file.
fn init_logging(log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(config::default_config_path);
    let dir = fileshare::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Load config and validate it; any missing credential stops here, before anything starts.
fn load_settings(config_path: Option<PathBuf>) -> anyhow::Result<Settings> {
    let (config, path) = config::load_config(config_path)?;
    let settings = Settings::from_config(&config)
        .with_context(|| format!("invalid configuration ({})", path.display()))?;
    Ok(settings)
}

async fn run_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let mut settings = load_settings(config_path)?;
    if let Some(p) = port {
        settings.port = p;
    }
    if let Some(b) = bind {
        settings.bind = b;
    }
    log::info!("starting tg-file-share on {}", settings.bind_addr());
    fileshare::gateway::run_relay(settings).await
}

async fn run_resolve(config_path: Option<PathBuf>, file_id: &str) -> anyhow::Result<()> {
    let settings = load_settings(config_path)?;
    let telegram = Arc::new(TelegramChannel::new(&settings));
    let resolver = FileResolver::new(telegram, &settings);
    let path = resolver.resolve(file_id).await?;
    println!("{}", path.redirect_target(&settings.file_server_url));
    Ok(())
}
