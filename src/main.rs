mod app;
mod catalog;
mod color;
mod config;
mod data;
mod error;
mod state;
#[cfg(test)]
mod testing;
mod ui;

use std::rc::Rc;

use anyhow::Context;
use app::HospitalLensApp;
use catalog::cache::{CachedCatalog, ResponseCache};
use catalog::client::CkanClient;
use config::Config;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    log::info!("Using catalog at {}", config.base_url);

    let client = CkanClient::new(&config.base_url, config.timeout)
        .context("building the catalog HTTP client")?;
    let catalog = CachedCatalog::new(client, Rc::new(ResponseCache::default()));
    let state = AppState::new(&config, Box::new(catalog));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Hospital Lens – Hospital Management & Service Production",
        options,
        Box::new(|_cc| Ok(Box::new(HospitalLensApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the viewer: {e}"))
}
