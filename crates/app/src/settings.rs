//! Handles settings for the application. Configuration is written in
//! `settings.toml`.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    /// Sqlite file path; in-memory when unset.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub cron_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct Gateway {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct Mail {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct Revenue {
    pub admin_user_id: Option<String>,
    pub founder_user_id: Option<String>,
    pub cofounder_user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Reconcile {
    pub min_age_minutes: Option<i64>,
    pub max_age_days: Option<i64>,
    pub batch_limit: Option<u64>,
    pub gateway_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub server: Server,
    pub gateway: Gateway,
    pub mail: Mail,
    pub revenue: Option<Revenue>,
    pub reconcile: Option<Reconcile>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
