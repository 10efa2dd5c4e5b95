use std::sync::Arc;

use crate::{
    config::AppConfig,
    services::{ledger::TripLedger, store::DocumentStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub ledger: TripLedger,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let ledger = TripLedger::new(store).with_default_radius(config.search_radius_km);
        Self { config, ledger }
    }
}
