use crate::application::tracking_service::TrackingSettings;
use crate::domain::location::Viewport;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub tracking: TrackingConfig,
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    pub poll_interval_ms: u64,
    pub follow_zoom: f64,
    pub default_viewport: Viewport,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    pub path: String,
}

impl AppConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.fetch_timeout_ms)
    }

    pub fn tracking_settings(&self) -> TrackingSettings {
        TrackingSettings {
            poll_interval: Duration::from_millis(self.tracking.poll_interval_ms),
            fetch_timeout: self.fetch_timeout(),
            follow_zoom: self.tracking.follow_zoom,
            default_viewport: self.tracking.default_viewport,
        }
    }
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    load_config_from("config/tracking")
}

/// Defaults, then the optional file at `path`, then `FLEET__*` environment variables.
pub fn load_config_from(path: &str) -> anyhow::Result<AppConfig> {
    let viewport = Viewport::default();
    let settings = config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8080")?
        .set_default("backend.base_url", "http://localhost:5028/api")?
        .set_default("backend.fetch_timeout_ms", 10_000)?
        .set_default("tracking.poll_interval_ms", 2_000)?
        .set_default("tracking.follow_zoom", 15.0)?
        .set_default("tracking.default_viewport.longitude", viewport.longitude)?
        .set_default("tracking.default_viewport.latitude", viewport.latitude)?
        .set_default("tracking.default_viewport.zoom", viewport.zoom)?
        .set_default("session.path", "data/session.json")?
        .add_source(config::File::with_name(path).required(false))
        .add_source(config::Environment::with_prefix("FLEET").separator("__"))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    if config.tracking.poll_interval_ms == 0 {
        anyhow::bail!("tracking.poll_interval_ms must be greater than zero");
    }
    if config.backend.fetch_timeout_ms == 0 {
        anyhow::bail!("backend.fetch_timeout_ms must be greater than zero");
    }
    Ok(config)
}
