mod action;
mod app;
mod app_state;
mod component;
mod components;
mod home;
mod latch;
mod rotation;
mod theme;
mod widgets;

use anime_proto::config::Config;
use anime_proto::CatalogClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = anime_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = anime_proto::platform::log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("anime-schedule log: {}", log_path.display());

    tracing::info!("anime-schedule starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(
            "config: {} unreadable, using defaults: {:#}",
            Config::config_path().display(),
            e
        );
        Config::default()
    });
    tracing::debug!("config: {:?}", config);

    let client = CatalogClient::from_config(&config.api)?;
    tracing::info!("catalog: {}", client.base_url());

    // ── Run TUI ──────────────────────────────────────────────────────────────
    app::App::new(client, &config).run().await
}
