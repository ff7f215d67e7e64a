use rocket::{
    fairing::{self, Fairing, Info, Kind},
    Build, Rocket,
};

use super::Backend;
use crate::config::AdminConfig;

pub struct BackendFairing;

impl BackendFairing {
    pub fn fairing() -> Self {
        Self {}
    }
}

#[rocket::async_trait]
impl Fairing for BackendFairing {
    fn info(&self) -> Info {
        Info {
            name: "Backend",
            kind: Kind::Ignite | Kind::Singleton,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        let config = match AdminConfig::from_figment(rocket.figment()) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid admin configuration: {e}");
                return Err(rocket);
            }
        };

        let http = match reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("rental-admin/", env!("CARGO_PKG_VERSION")))
            .build()
        {
            Ok(http) => http,
            Err(e) => {
                error!("Could not create the backend client: {e}");
                return Err(rocket);
            }
        };

        info!("Using backend at {}", config.backend_url);
        let backend = Backend::new(http, &config.backend_url, config.per_page);

        Ok(rocket.manage(backend))
    }
}
