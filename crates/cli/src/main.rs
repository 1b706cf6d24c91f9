mod context;
mod device_commands;
mod unlock_commands;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "hubkey", about = "hubkey: unlock hub-managed vaults")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./hubkey.toml and ~/.config/hubkey/).
    #[arg(long, global = true, env = "HUBKEY_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Device identity management.
    Device {
        #[command(subcommand)]
        action: device_commands::DeviceAction,
    },
    /// Generate a user key pair protected by a setup code.
    NewUserKey(unlock_commands::UserKeyArgs),
    /// Register this device: re-wrap the user key for the device key.
    Register(unlock_commands::RegisterArgs),
    /// Recover a vault master key.
    Unlock(unlock_commands::UnlockArgs),
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries command output.
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

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "hubkey starting");

    let config = context::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Device { action } => device_commands::handle_device(action, &config),
        Commands::NewUserKey(args) => unlock_commands::handle_new_user_key(args, &config),
        Commands::Register(args) => unlock_commands::handle_register(args, &config),
        Commands::Unlock(args) => unlock_commands::handle_unlock(args, &config),
    }
}
