use std::sync::Arc;

use log::Logger;

use crate::catalog::Catalog;
use crate::reviews::Reviews;
use crate::urls::Urls;

/// Everything a route handler needs: a logger, the service it fronts, and
/// the URLs it hands out.
#[derive(Clone)]
pub struct Environment<S: Clone + Send + Sync> {
    pub logger: Arc<Logger>,
    pub service: S,
    pub urls: Arc<Urls>,
    pub config: Config,
}

pub type CatalogEnvironment = Environment<Catalog>;
pub type ReviewEnvironment = Environment<Reviews>;

impl<S: Clone + Send + Sync> Environment<S> {
    pub fn new(logger: Arc<Logger>, service: S, urls: Arc<Urls>, config: Config) -> Self {
        Self {
            logger,
            service,
            urls,
            config,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// The name reported by the health endpoints.
    pub(crate) service_name: &'static str,
}

impl Config {
    pub fn new(service_name: &'static str) -> Self {
        Self { service_name }
    }

    pub fn service_name(&self) -> &'static str {
        self.service_name
    }
}
