//! Route handler

use tracing::{debug, info, instrument};

use super::BuilderFactory;
use crate::domain::{ConsumeRoute, Gateway, Realm, Route};
use crate::errors::{GatewayError, Result, ResultExt};
use crate::features::route_features;

pub struct RouteHandler<F: BuilderFactory> {
    factory: F,
}

impl<F: BuilderFactory> RouteHandler<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Synchronize `route` and return it with its status updated.
    ///
    /// `consume_routes` may hold every subscription known to the caller; the
    /// handler picks the ones relevant to this route:
    ///
    /// - pass-through routes admit nobody
    /// - proxy routes that are not a failover secondary only need the
    ///   subscriptions pointing at exactly this route, for the ACL
    /// - every other route needs all subscriptions to a route of this name,
    ///   since their credentials end up in the proxy config
    #[instrument(skip_all, fields(route = %route.name), name = "route_create_or_update")]
    pub async fn create_or_update(
        &self,
        route: Route,
        realm: Realm,
        gateway: Gateway,
        consume_routes: &[ConsumeRoute],
    ) -> Result<Route> {
        let allowed = select_consumers(&route, consume_routes);
        debug!(allowed = allowed.len(), total = consume_routes.len(), "selected route consumers");

        let mut builder = self.factory.route_builder(route, realm, gateway);
        for feature in route_features() {
            builder.enable_feature(feature);
        }
        builder.add_allowed_consumers(allowed);

        builder.build().await.context("failed to build route")?;

        let consumers: Vec<String> = builder
            .direct_consumers()
            .iter()
            .map(|c| c.consumer_name().to_string())
            .collect();
        let mut route = builder.into_route().ok_or(GatewayError::NoRoute)?;
        route.status.consumers = consumers;

        info!(consumers = route.status.consumers.len(), "route processed successfully");
        Ok(route)
    }

    #[instrument(skip_all, fields(route = %route.name), name = "route_delete")]
    pub async fn delete(&self, route: &Route) -> Result<()> {
        self.factory.admin().delete_route(route).await.context("failed to delete route")?;
        info!("route deleted");
        Ok(())
    }
}

fn select_consumers(route: &Route, consume_routes: &[ConsumeRoute]) -> Vec<ConsumeRoute> {
    if route.spec.pass_through {
        return Vec::new();
    }
    if route.is_proxy() && !route.is_failover_secondary() {
        return consume_routes
            .iter()
            .filter(|c| route.is_referenced_by(&c.spec.route))
            .cloned()
            .collect();
    }
    consume_routes.iter().filter(|c| c.spec.route.name == route.name).cloned().collect()
}
