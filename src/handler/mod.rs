//! # Handlers
//!
//! Entry points for the reconciliation layer. A handler turns one desired
//! route or consumer into a feature build against the admin API and hands
//! the object back with its status updated.
//!
//! Builders come from an injected [`BuilderFactory`] so tests can run the
//! full build against an in-memory admin API.

pub mod consumer;
pub mod route;

pub use consumer::ConsumerHandler;
pub use route::RouteHandler;

use std::sync::Arc;

use crate::admin::AdminClient;
use crate::domain::{Consumer, Gateway, Realm, Route};
use crate::features::Builder;
use crate::secrets::SecretsClient;

/// Creates builders bound to an admin API
pub trait BuilderFactory: Send + Sync {
    fn admin(&self) -> Arc<dyn AdminClient>;

    fn route_builder(&self, route: Route, realm: Realm, gateway: Gateway) -> Builder;

    fn consumer_builder(&self, consumer: Consumer, realm: Realm, gateway: Gateway) -> Builder;
}

/// Factory sharing one admin client and one secrets backend across builds
#[derive(Clone)]
pub struct DefaultBuilderFactory {
    admin: Arc<dyn AdminClient>,
    secrets: Arc<dyn SecretsClient>,
}

impl DefaultBuilderFactory {
    pub fn new(admin: Arc<dyn AdminClient>, secrets: Arc<dyn SecretsClient>) -> Self {
        Self { admin, secrets }
    }
}

impl BuilderFactory for DefaultBuilderFactory {
    fn admin(&self) -> Arc<dyn AdminClient> {
        self.admin.clone()
    }

    fn route_builder(&self, route: Route, realm: Realm, gateway: Gateway) -> Builder {
        Builder::for_route(self.admin.clone(), self.secrets.clone(), route, realm, gateway)
    }

    fn consumer_builder(&self, consumer: Consumer, realm: Realm, gateway: Gateway) -> Builder {
        Builder::for_consumer(self.admin.clone(), self.secrets.clone(), consumer, realm, gateway)
    }
}
