use {
    clap::Parser,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "mediarelay",
    about = "mediarelay — forward operator media pairs to a channel"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides the standard discovery locations).
    #[arg(long, env = "MEDIARELAY_CONFIG")]
    config: Option<std::path::PathBuf>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; a missing one is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = match &cli.config {
        Some(path) => {
            let mut config = mediarelay_config::load_config(path)?;
            mediarelay_config::apply_env_overrides(&mut config);
            config
        },
        None => mediarelay_config::discover_and_load()?,
    };
    mediarelay_config::validate(&config)?;

    let store = mediarelay_store::D1Client::new(config.store.clone())?;
    let cancel =
        mediarelay_telegram::bot::start_polling(config.telegram, config.preview, store).await?;

    info!("mediarelay is running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    cancel.cancel();

    Ok(())
}
