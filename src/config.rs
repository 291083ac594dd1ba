use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::cache::FreshnessWindow;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub listen: SocketAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_ip: Option<String>,
    /// Snapshot lifespan in milliseconds. Negative disables caching.
    pub cache_timeout: i64,
    pub log_level: String,
    pub docker_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 5000)),
            bind_ip: None,
            cache_timeout: -1,
            log_level: "info".into(),
            docker_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("dockerinfo.toml"))
            .merge(Json::file("dockerinfo.json"))
            .merge(Env::prefixed("DOCKERINFO_"))
    }

    pub fn load() -> anyhow::Result<Self> {
        let mut config: Config = Self::figment()
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        // If bind_ip is set, override the IP part of listen
        if let Some(ref ip) = config.bind_ip {
            let port = config.listen.port();
            config.listen = format!("{}:{}", ip, port)
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid bind_ip: {}", e))?;
        }

        Ok(config)
    }

    pub fn freshness(&self) -> FreshnessWindow {
        FreshnessWindow::from_millis(self.cache_timeout)
    }

    pub fn docker_timeout(&self) -> Duration {
        Duration::from_secs(self.docker_timeout_secs)
    }

    /// Unknown levels fall back to `info`.
    pub fn log_filter(&self) -> LevelFilter {
        match self.log_level.to_ascii_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "warning" | "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            _ => LevelFilter::Info,
        }
    }
}
