//! In-memory admin API for builder and handler tests

use async_trait::async_trait;
use std::sync::Mutex;

use super::tags::{matches_all, plugin_tags, scope_tags};
use super::{cleanup_candidates, AdminClient, RemotePlugin};
use crate::domain::{
    Consumer, Gateway, Route, Upstream, CONSUMER_ID_PROPERTY, ROUTE_ID_PROPERTY,
    SERVICE_ID_PROPERTY,
};
use crate::errors::{GatewayError, Result};
use crate::plugin::GatewayPlugin;

#[derive(Debug, Default)]
pub struct MockState {
    pub plugins: Vec<RemotePlugin>,
    /// Every call in order, `"<operation> <subject>"`
    pub calls: Vec<String>,
    /// Upstream handed to the last route write
    pub last_upstream: Option<Upstream>,
    pub routes: Vec<String>,
    pub consumers: Vec<String>,
    /// Status returned by the next route write instead of success
    pub fail_route_with: Option<u16>,
}

/// Plugin store with the same identity rules as the real admin API
pub struct MockAdminClient {
    environment: String,
    pub state: Mutex<MockState>,
}

impl MockAdminClient {
    pub fn new(environment: &str) -> Self {
        Self { environment: environment.to_string(), state: Mutex::new(MockState::default()) }
    }

    /// Seed a remote plugin as if an earlier run had written it
    pub fn with_plugin(self, id: &str, name: &str, tags: Vec<String>) -> Self {
        self.state.lock().unwrap().plugins.push(RemotePlugin {
            id: id.to_string(),
            name: name.to_string(),
            tags,
            config: serde_json::Value::Null,
        });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that change remote state
    pub fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("put") || c.starts_with("delete"))
            .collect()
    }

    pub fn plugins(&self) -> Vec<RemotePlugin> {
        self.state.lock().unwrap().plugins.clone()
    }

    pub fn plugin_named(&self, name: &str) -> Vec<RemotePlugin> {
        self.plugins().into_iter().filter(|p| p.name == name).collect()
    }

    pub fn last_upstream(&self) -> Option<Upstream> {
        self.state.lock().unwrap().last_upstream.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl AdminClient for MockAdminClient {
    fn environment(&self) -> &str {
        &self.environment
    }

    async fn create_or_replace_route(
        &self,
        route: &mut Route,
        upstream: &Upstream,
        _gateway: &Gateway,
    ) -> Result<()> {
        self.record(format!("put route {}", route.name));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.fail_route_with.take() {
            return Err(GatewayError::http("create route", status, "mock failure"));
        }
        state.last_upstream = Some(upstream.clone());
        if !state.routes.contains(&route.name) {
            state.routes.push(route.name.clone());
        }
        route.set_property(SERVICE_ID_PROPERTY, format!("service-{}", route.name));
        route.set_property(ROUTE_ID_PROPERTY, format!("route-{}", route.name));
        Ok(())
    }

    async fn delete_route(&self, route: &Route) -> Result<()> {
        self.record(format!("delete route {}", route.name));
        self.state.lock().unwrap().routes.retain(|r| r != &route.name);
        Ok(())
    }

    async fn create_or_replace_consumer(&self, consumer: &mut Consumer) -> Result<()> {
        self.record(format!("put consumer {}", consumer.name));
        let mut state = self.state.lock().unwrap();
        if !state.consumers.contains(&consumer.name) {
            state.consumers.push(consumer.name.clone());
        }
        consumer.set_property(CONSUMER_ID_PROPERTY, format!("consumer-{}", consumer.name));
        Ok(())
    }

    async fn delete_consumer(&self, consumer: &Consumer) -> Result<()> {
        self.record(format!("delete consumer {}", consumer.name));
        self.state.lock().unwrap().consumers.retain(|c| c != &consumer.name);
        Ok(())
    }

    async fn load_plugin(&self, plugin: &dyn GatewayPlugin) -> Result<Option<RemotePlugin>> {
        let tags = plugin_tags(&self.environment, plugin);
        self.record(format!("get plugin {}", tags.join(",")));
        let state = self.state.lock().unwrap();

        if let Some(id) = plugin.id() {
            if let Some(found) = state.plugins.iter().find(|p| p.id == id) {
                return Ok(Some(found.clone()));
            }
        }

        let mut found: Vec<RemotePlugin> =
            state.plugins.iter().filter(|p| matches_all(&p.tags, &tags)).cloned().collect();
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            _ => Err(GatewayError::AmbiguousIdentity { tags }),
        }
    }

    async fn create_or_replace_plugin(
        &self,
        plugin: &mut dyn GatewayPlugin,
    ) -> Result<RemotePlugin> {
        if plugin.id().is_none() {
            self.resolve_plugin_id(plugin).await?;
        }
        let id = plugin.id().unwrap_or_default().to_string();
        self.record(format!("put plugin {} {}", plugin.plugin_name(), id));

        let remote = RemotePlugin {
            id: id.clone(),
            name: plugin.plugin_name().to_string(),
            tags: plugin_tags(&self.environment, plugin),
            config: plugin.config_json()?,
        };
        let mut state = self.state.lock().unwrap();
        match state.plugins.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = remote.clone(),
            None => state.plugins.push(remote.clone()),
        }
        Ok(remote)
    }

    async fn delete_plugin(&self, id: &str) -> Result<()> {
        self.record(format!("delete plugin {}", id));
        self.state.lock().unwrap().plugins.retain(|p| p.id != id);
        Ok(())
    }

    async fn cleanup_plugins(
        &self,
        route: Option<&Route>,
        consumer: Option<&Consumer>,
        keep: &[&dyn GatewayPlugin],
    ) -> Result<()> {
        if route.is_none() && consumer.is_none() {
            return Err(GatewayError::validation(
                "plugin cleanup needs a route or a consumer scope",
            ));
        }
        let tags = scope_tags(
            &self.environment,
            route.map(|r| r.name.as_str()),
            consumer.map(|c| c.name.as_str()),
        );
        self.record(format!("list plugins {}", tags.join(",")));

        let in_scope: Vec<RemotePlugin> = self
            .plugins()
            .into_iter()
            .filter(|p| matches_all(&p.tags, &tags))
            .collect();
        let doomed: Vec<String> = cleanup_candidates(&in_scope, route, consumer, keep)
            .into_iter()
            .map(|p| p.id.clone())
            .collect();

        for id in doomed {
            self.delete_plugin(&id).await?;
        }
        Ok(())
    }
}
