//! # Admin API
//!
//! Everything that talks to the gateway admin API lives behind the
//! [`AdminClient`] trait. Features never see it; only the builder's
//! persistence step and the handlers call into it.
//!
//! ## Module Organization
//!
//! - `client`: reqwest-backed implementation for Kong-compatible admin APIs
//! - `tags`: `key--value` tag identity
//! - `circuit_breaker`: upstream and health-check payloads

pub mod circuit_breaker;
pub mod client;
pub mod tags;

#[cfg(test)]
pub(crate) mod mock;

pub use client::KongAdminClient;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{Consumer, Gateway, Route, Upstream};
use crate::errors::Result;
use crate::plugin::GatewayPlugin;

/// A plugin as the admin API reports it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RemotePlugin {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub config: serde_json::Value,
}

/// Gateway admin operations used by the synchronization engine
#[async_trait]
pub trait AdminClient: Send + Sync {
    /// Environment tag value stamped on every object
    fn environment(&self) -> &str;

    /// Upsert upstream (when circuit breaking), service and route, in that
    /// order. Records the remote ids in the route status.
    async fn create_or_replace_route(
        &self,
        route: &mut Route,
        upstream: &Upstream,
        gateway: &Gateway,
    ) -> Result<()>;

    /// Delete route then service. Already-absent objects are not an error.
    async fn delete_route(&self, route: &Route) -> Result<()>;

    /// Upsert the consumer and make sure it is a member of its own ACL group
    async fn create_or_replace_consumer(&self, consumer: &mut Consumer) -> Result<()>;

    async fn delete_consumer(&self, consumer: &Consumer) -> Result<()>;

    /// Find the remote object for `plugin`: by cached id first, then by its
    /// tag set. More than one tag match is an error.
    async fn load_plugin(&self, plugin: &dyn GatewayPlugin) -> Result<Option<RemotePlugin>>;

    async fn create_or_replace_plugin(&self, plugin: &mut dyn GatewayPlugin)
        -> Result<RemotePlugin>;

    async fn delete_plugin(&self, id: &str) -> Result<()>;

    /// Delete every plugin in the route or consumer scope whose id is not
    /// carried by `keep`
    async fn cleanup_plugins(
        &self,
        route: Option<&Route>,
        consumer: Option<&Consumer>,
        keep: &[&dyn GatewayPlugin],
    ) -> Result<()>;

    /// Settle the id `plugin` will be written under without writing it.
    ///
    /// A remote match wins over the cached id. Without either a new id is
    /// minted so the first write is also the last round trip.
    async fn resolve_plugin_id(&self, plugin: &mut dyn GatewayPlugin) -> Result<()> {
        match self.load_plugin(&*plugin).await? {
            Some(remote) => plugin.set_id(remote.id),
            None if plugin.id().is_none() => plugin.set_id(uuid::Uuid::new_v4().to_string()),
            None => {}
        }
        Ok(())
    }
}

/// Remote plugins a cleanup pass deletes.
///
/// A consumer-scoped pass leaves route-bound plugins of that consumer alone;
/// they belong to the route build that wrote them.
pub fn cleanup_candidates<'a>(
    remote: &'a [RemotePlugin],
    route: Option<&Route>,
    consumer: Option<&Consumer>,
    keep: &[&dyn GatewayPlugin],
) -> Vec<&'a RemotePlugin> {
    let route_scoped = route.is_some();
    remote
        .iter()
        .filter(|plugin| route_scoped || !plugin.tags.iter().any(|t| t.starts_with("route--")))
        .filter(|plugin| consumer.is_some() || route_scoped)
        .filter(|plugin| !keep.iter().any(|k| k.id() == Some(plugin.id.as_str())))
        .collect()
}
