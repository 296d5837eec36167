mod app;
mod catalog;
mod completion;
mod config;
mod conversation;
mod event;
mod selection;
mod state;
mod theme;
mod ui;

use app::AdvisorApp;
use catalog::{CatalogFetcher, CatalogSource};
use completion::HttpCompletionClient;
use eframe::egui;
use selection::JsonFileStore;
use state::AppState;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Loads `.env` into the environment, then builds the log filter so a
/// `RUST_LOG` set there takes effect. Defaults to `info`.
fn load_log_filter(env_file: Option<&Path>) -> EnvFilter {
    let _ = match env_file {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(load_log_filter(None))
        .init();

    let config = config::load_app_configuration()
        .inspect_err(|e| tracing::error!("failed to load configuration: {e}"))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("routine-advisor-runtime")
        .build()?;

    let http = reqwest::Client::builder().build()?;
    let fetcher = CatalogFetcher::new(CatalogSource::parse(&config.catalog), http.clone());
    let completions = Arc::new(HttpCompletionClient::new(
        http,
        config.endpoint.clone(),
        Duration::from_secs(config.request_timeout_secs),
    ));

    let store = JsonFileStore::new(config.data_dir());
    tracing::info!(
        catalog = %fetcher.source().describe(),
        endpoint = %config.endpoint,
        selection = %store.path().display(),
        "starting routine advisor"
    );
    let state = AppState::new(&config, Box::new(store));

    let runtime_handle = runtime.handle().clone();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Routine Advisor",
        native_options,
        Box::new(move |creation_context| {
            Ok(Box::new(AdvisorApp::new(
                creation_context.egui_ctx.clone(),
                runtime_handle,
                fetcher,
                completions,
                state,
            )))
        }),
    )?;

    drop(runtime);
    Ok(())
}
