use std::time::Duration;

use rocket::figment::Figment;
use serde::Deserialize;

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_per_page() -> u64 {
    15
}

fn default_request_timeout() -> u64 {
    30
}

/// The `admin` table of the Rocket configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    /// Seconds before a backend call is abandoned.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            per_page: default_per_page(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl AdminConfig {
    pub fn from_figment(figment: &Figment) -> Result<Self, rocket::figment::Error> {
        let mut config: Self = figment.focus("admin").extract()?;
        config.backend_url = config.backend_url.trim_end_matches('/').to_string();
        config.per_page = config.per_page.max(1);
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
