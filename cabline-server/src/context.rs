use std::sync::Arc;

use axum::extract::FromRef;
use cabline_core::{JsonDatabase, Site};

use crate::Config;

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub site: Arc<Site<JsonDatabase>>,
    pub config: Arc<Config>,
}

impl ServerContext {
    pub fn new(site: Site<JsonDatabase>, config: Config) -> Self {
        Self {
            site: Arc::new(site),
            config: Arc::new(config),
        }
    }
}
