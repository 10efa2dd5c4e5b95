use std::{env, net::SocketAddr};

use crate::{error::AppError, models::search::DEFAULT_RADIUS_KM};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    /// Mounts the destructive `POST /api/trips/seed` route. Development only.
    pub enable_seed: bool,
    pub search_radius_km: f64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://carpool.db?mode=rwc".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let enable_seed = match env::var("ENABLE_SEED") {
            Ok(raw) => parse_flag(&raw)
                .ok_or_else(|| AppError::Config(format!("invalid ENABLE_SEED: {raw:?}")))?,
            Err(_) => false,
        };

        let search_radius_km = match env::var("SEARCH_DEFAULT_RADIUS_KM") {
            Ok(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|km| km.is_finite() && *km > 0.0)
                .ok_or_else(|| {
                    AppError::Config(format!("invalid SEARCH_DEFAULT_RADIUS_KM: {raw:?}"))
                })?,
            Err(_) => DEFAULT_RADIUS_KM,
        };

        Ok(Self {
            database_url,
            listen_addr,
            enable_seed,
            search_radius_km,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            enable_seed: false,
            search_radius_km: DEFAULT_RADIUS_KM,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
