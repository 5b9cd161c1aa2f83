//! # Features Builder
//!
//! Shared context of one route or consumer build. Features read the desired
//! state from it and write into its typed plugin slots; [`Builder::build`] and
//! [`Builder::build_for_consumer`] then persist the result:
//!
//! 1. apply the enabled features in priority order
//! 2. attach the proxy side-channel header (route builds)
//! 3. resolve every plugin id, failing before any write on ambiguity
//! 4. upsert the route or consumer
//! 5. upsert the plugins in key order and record their ids
//! 6. delete remote plugins in scope that were not written

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, Instrument};

use super::Feature;
use crate::admin::AdminClient;
use crate::domain::{ConsumeRoute, Consumer, FeatureType, Gateway, Realm, Route, Upstream};
use crate::errors::{GatewayError, Result, ResultExt};
use crate::plugin::rate_limit::consumer_property_key;
use crate::plugin::{
    acl::ACL_PROPERTY, ip_restriction::IP_RESTRICTION_PROPERTY, jwt::JWT_PROPERTY,
    rate_limit::RATE_LIMIT_PROPERTY, request_transformer::REQUEST_TRANSFORMER_PROPERTY,
};
use crate::plugin::{
    to_base64, AclPlugin, GatewayPlugin, IpRestrictionPlugin, JumperConfig, JwtPlugin,
    RateLimitPlugin, RequestTransformerPlugin, RoutingConfigs, JUMPER_CONFIG_KEY,
    ROUTING_CONFIG_KEY,
};
use crate::secrets::{resolve_secret, SecretsClient};

pub const REQUEST_TRANSFORMER_KEY: &str = "request-transformer";
pub const ACL_KEY: &str = "acl";
pub const JWT_KEY: &str = "jwt";
pub const RATE_LIMIT_KEY: &str = "rate-limiting";
pub const IP_RESTRICTION_KEY: &str = "ip-restriction";

/// Key of the consumer-scoped rate limit plugin of `consumer`
pub fn rate_limit_consumer_key(consumer: &str) -> String {
    format!("{}-consumer--{}", RATE_LIMIT_KEY, consumer)
}

/// One slot per plugin kind a build can produce
#[derive(Debug, Default)]
pub struct Plugins {
    pub request_transformer: Option<RequestTransformerPlugin>,
    pub acl: Option<AclPlugin>,
    pub jwt: Option<JwtPlugin>,
    pub rate_limit_route: Option<RateLimitPlugin>,
    /// Keyed by consumer name
    pub rate_limit_consumers: BTreeMap<String, RateLimitPlugin>,
    pub ip_restriction: Option<IpRestrictionPlugin>,
}

impl Plugins {
    /// Every populated slot with its key, sorted by key
    pub fn entries(&self) -> Vec<(String, &dyn GatewayPlugin)> {
        let mut entries: Vec<(String, &dyn GatewayPlugin)> = Vec::new();
        if let Some(p) = &self.request_transformer {
            entries.push((REQUEST_TRANSFORMER_KEY.to_string(), p as &dyn GatewayPlugin));
        }
        if let Some(p) = &self.acl {
            entries.push((ACL_KEY.to_string(), p as &dyn GatewayPlugin));
        }
        if let Some(p) = &self.jwt {
            entries.push((JWT_KEY.to_string(), p as &dyn GatewayPlugin));
        }
        if let Some(p) = &self.rate_limit_route {
            entries.push((RATE_LIMIT_KEY.to_string(), p as &dyn GatewayPlugin));
        }
        for (consumer, p) in &self.rate_limit_consumers {
            entries.push((rate_limit_consumer_key(consumer), p as &dyn GatewayPlugin));
        }
        if let Some(p) = &self.ip_restriction {
            entries.push((IP_RESTRICTION_KEY.to_string(), p as &dyn GatewayPlugin));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn entries_mut(&mut self) -> Vec<(String, &mut dyn GatewayPlugin)> {
        let mut entries: Vec<(String, &mut dyn GatewayPlugin)> = Vec::new();
        if let Some(p) = &mut self.request_transformer {
            entries.push((REQUEST_TRANSFORMER_KEY.to_string(), p as &mut dyn GatewayPlugin));
        }
        if let Some(p) = &mut self.acl {
            entries.push((ACL_KEY.to_string(), p as &mut dyn GatewayPlugin));
        }
        if let Some(p) = &mut self.jwt {
            entries.push((JWT_KEY.to_string(), p as &mut dyn GatewayPlugin));
        }
        if let Some(p) = &mut self.rate_limit_route {
            entries.push((RATE_LIMIT_KEY.to_string(), p as &mut dyn GatewayPlugin));
        }
        for (consumer, p) in &mut self.rate_limit_consumers {
            entries.push((rate_limit_consumer_key(consumer), p as &mut dyn GatewayPlugin));
        }
        if let Some(p) = &mut self.ip_restriction {
            entries.push((IP_RESTRICTION_KEY.to_string(), p as &mut dyn GatewayPlugin));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|(key, _)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build context for one route or one consumer
pub struct Builder {
    admin: Arc<dyn AdminClient>,
    secrets: Arc<dyn SecretsClient>,

    route: Option<Route>,
    consumer: Option<Consumer>,
    realm: Realm,
    gateway: Gateway,

    /// Subscriptions relevant to the route
    allowed_consumers: Vec<ConsumeRoute>,

    upstream: Option<Upstream>,
    plugins: Plugins,
    jumper_config: Option<JumperConfig>,
    routing_configs: Option<RoutingConfigs>,

    features: BTreeMap<FeatureType, Arc<dyn Feature>>,

    /// Status properties as they were before this build
    cached_ids: BTreeMap<String, String>,
}

impl Builder {
    pub fn new(
        admin: Arc<dyn AdminClient>,
        secrets: Arc<dyn SecretsClient>,
        route: Option<Route>,
        consumer: Option<Consumer>,
        realm: Realm,
        gateway: Gateway,
    ) -> Self {
        let mut cached_ids = BTreeMap::new();
        if let Some(route) = &route {
            cached_ids.extend(route.status.properties.clone());
        }
        if let Some(consumer) = &consumer {
            cached_ids.extend(consumer.status.properties.clone());
        }

        Self {
            admin,
            secrets,
            route,
            consumer,
            realm,
            gateway,
            allowed_consumers: Vec::new(),
            upstream: None,
            plugins: Plugins::default(),
            jumper_config: None,
            routing_configs: None,
            features: BTreeMap::new(),
            cached_ids,
        }
    }

    pub fn for_route(
        admin: Arc<dyn AdminClient>,
        secrets: Arc<dyn SecretsClient>,
        route: Route,
        realm: Realm,
        gateway: Gateway,
    ) -> Self {
        Self::new(admin, secrets, Some(route), None, realm, gateway)
    }

    pub fn for_consumer(
        admin: Arc<dyn AdminClient>,
        secrets: Arc<dyn SecretsClient>,
        consumer: Consumer,
        realm: Realm,
        gateway: Gateway,
    ) -> Self {
        Self::new(admin, secrets, None, Some(consumer), realm, gateway)
    }

    /// Enable a feature; enabling the same type again replaces it
    pub fn enable_feature(&mut self, feature: Arc<dyn Feature>) {
        self.features.insert(feature.feature_type(), feature);
    }

    pub fn enabled_features(&self) -> Vec<FeatureType> {
        self.features.keys().copied().collect()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn consumer(&self) -> Option<&Consumer> {
        self.consumer.as_ref()
    }

    pub fn into_route(self) -> Option<Route> {
        self.route
    }

    pub fn into_consumer(self) -> Option<Consumer> {
        self.consumer
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Environment every object is tagged with
    pub fn environment(&self) -> &str {
        self.admin.environment()
    }

    pub fn allowed_consumers(&self) -> &[ConsumeRoute] {
        &self.allowed_consumers
    }

    pub fn add_allowed_consumers(&mut self, consumers: impl IntoIterator<Item = ConsumeRoute>) {
        self.allowed_consumers.extend(consumers);
    }

    /// Subscriptions that point at this route rather than at a route it proxies
    pub fn direct_consumers(&self) -> Vec<&ConsumeRoute> {
        match &self.route {
            Some(route) => self
                .allowed_consumers
                .iter()
                .filter(|c| c.spec.route.name == route.name && c.spec.route.namespace == route.namespace)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn upstream(&self) -> Option<&Upstream> {
        self.upstream.as_ref()
    }

    /// Overwrite the upstream; the last feature to call this wins
    pub fn set_upstream(&mut self, upstream: Upstream) {
        self.upstream = Some(upstream);
    }

    pub fn plugins(&self) -> &Plugins {
        &self.plugins
    }

    /// Resolve a credential that may be a `$<id>` secret reference
    pub async fn resolve_secret(&self, value: &str) -> Result<String> {
        resolve_secret(self.secrets.as_ref(), value).await
    }

    fn route_name(&self) -> Result<String> {
        self.route.as_ref().map(|r| r.name.clone()).ok_or(GatewayError::NoRoute)
    }

    fn cached_id(&self, property: &str) -> Option<String> {
        self.cached_ids.get(property).cloned()
    }

    pub fn request_transformer_plugin(&mut self) -> Result<&mut RequestTransformerPlugin> {
        let route = self.route_name()?;
        let cached = self.cached_id(REQUEST_TRANSFORMER_PROPERTY);
        Ok(self
            .plugins
            .request_transformer
            .get_or_insert_with(|| RequestTransformerPlugin::for_route(route, cached)))
    }

    pub fn acl_plugin(&mut self) -> Result<&mut AclPlugin> {
        let route = self.route_name()?;
        let cached = self.cached_id(ACL_PROPERTY);
        Ok(self.plugins.acl.get_or_insert_with(|| AclPlugin::for_route(route, cached)))
    }

    pub fn jwt_plugin(&mut self) -> Result<&mut JwtPlugin> {
        let route = self.route_name()?;
        let cached = self.cached_id(JWT_PROPERTY);
        Ok(self.plugins.jwt.get_or_insert_with(|| JwtPlugin::for_route(route, cached)))
    }

    pub fn rate_limit_plugin_route(&mut self) -> Result<&mut RateLimitPlugin> {
        let route = self.route_name()?;
        let cached = self.cached_id(RATE_LIMIT_PROPERTY);
        Ok(self
            .plugins
            .rate_limit_route
            .get_or_insert_with(|| RateLimitPlugin::for_route(route, cached)))
    }

    pub fn rate_limit_plugin_consume_route(
        &mut self,
        consume_route: &ConsumeRoute,
    ) -> Result<&mut RateLimitPlugin> {
        let route = self.route_name()?;
        let consumer = consume_route.consumer_name().to_string();
        let cached = self.cached_id(&consumer_property_key(&consumer));
        Ok(self
            .plugins
            .rate_limit_consumers
            .entry(consumer.clone())
            .or_insert_with(|| RateLimitPlugin::for_consumer_on_route(route, consumer, cached)))
    }

    pub fn ip_restriction_plugin(&mut self) -> Result<&mut IpRestrictionPlugin> {
        let consumer =
            self.consumer.as_ref().map(|c| c.name.clone()).ok_or(GatewayError::NoConsumer)?;
        let cached = self.cached_id(IP_RESTRICTION_PROPERTY);
        Ok(self
            .plugins
            .ip_restriction
            .get_or_insert_with(|| IpRestrictionPlugin::for_consumer(consumer, cached)))
    }

    pub fn jumper_config(&mut self) -> &mut JumperConfig {
        self.jumper_config.get_or_insert_with(JumperConfig::new)
    }

    pub fn jumper_config_ref(&self) -> Option<&JumperConfig> {
        self.jumper_config.as_ref()
    }

    pub fn routing_configs(&mut self) -> &mut RoutingConfigs {
        self.routing_configs.get_or_insert_with(RoutingConfigs::new)
    }

    pub fn routing_configs_ref(&self) -> Option<&RoutingConfigs> {
        self.routing_configs.as_ref()
    }

    /// Persist the route and its plugins
    pub async fn build(&mut self) -> Result<()> {
        let name = self.route_name()?;
        let span = crate::build_span!("route", name);
        self.build_route().instrument(span).await
    }

    async fn build_route(&mut self) -> Result<()> {
        self.apply_features().await?;

        let upstream = self.upstream.clone().ok_or(GatewayError::UpstreamNotSet)?;
        self.attach_side_channel()?;
        self.resolve_plugin_ids().await?;

        let route = self.route.as_mut().ok_or(GatewayError::NoRoute)?;
        route.status.properties.clear();
        self.admin
            .create_or_replace_route(route, &upstream, &self.gateway)
            .await
            .context("failed to create or replace route")?;

        let written = self.write_plugins().await?;
        let route = self.route.as_mut().ok_or(GatewayError::NoRoute)?;
        for (property, id) in written {
            route.set_property(property, id);
        }

        let keep: Vec<&dyn GatewayPlugin> =
            self.plugins.entries().into_iter().map(|(_, p)| p).collect();
        self.admin
            .cleanup_plugins(self.route.as_ref(), None, &keep)
            .await
            .context("failed to cleanup plugins")?;

        info!(upstream = %upstream.url(), plugins = keep.len(), "route build complete");
        Ok(())
    }

    /// Persist the consumer and its plugins
    pub async fn build_for_consumer(&mut self) -> Result<()> {
        let name =
            self.consumer.as_ref().map(|c| c.name.clone()).ok_or(GatewayError::NoConsumer)?;
        let span = crate::build_span!("consumer", name);
        self.build_consumer().instrument(span).await
    }

    async fn build_consumer(&mut self) -> Result<()> {
        self.apply_features().await?;
        self.resolve_plugin_ids().await?;

        let consumer = self.consumer.as_mut().ok_or(GatewayError::NoConsumer)?;
        consumer.status.properties.clear();
        self.admin
            .create_or_replace_consumer(consumer)
            .await
            .context("failed to create or replace consumer")?;

        let written = self.write_plugins().await?;
        let consumer = self.consumer.as_mut().ok_or(GatewayError::NoConsumer)?;
        for (property, id) in written {
            consumer.set_property(property, id);
        }

        let keep: Vec<&dyn GatewayPlugin> =
            self.plugins.entries().into_iter().map(|(_, p)| p).collect();
        self.admin
            .cleanup_plugins(None, self.consumer.as_ref(), &keep)
            .await
            .context("failed to cleanup plugins")?;

        info!(plugins = keep.len(), "consumer build complete");
        Ok(())
    }

    async fn apply_features(&mut self) -> Result<()> {
        let mut features: Vec<Arc<dyn Feature>> = self.features.values().cloned().collect();
        features.sort_by_key(|f| (f.priority(), f.feature_type()));

        for feature in features {
            if feature.is_used(self) {
                debug!(feature = %feature.feature_type(), "applying feature");
                feature.apply(self).await?;
            } else {
                debug!(feature = %feature.feature_type(), "feature is not used");
            }
        }
        Ok(())
    }

    /// Routing configs win over the jumper config. Neither is sent when empty.
    fn attach_side_channel(&mut self) -> Result<()> {
        let header = match (&self.routing_configs, &self.jumper_config) {
            (Some(routing), _) if !routing.is_empty() => {
                Some((ROUTING_CONFIG_KEY, to_base64(routing)?))
            }
            (_, Some(jumper)) if !jumper.is_empty() => Some((JUMPER_CONFIG_KEY, to_base64(jumper)?)),
            _ => None,
        };

        if let Some((key, value)) = header {
            self.request_transformer_plugin()?.config.append.add_header(key, value);
        }
        Ok(())
    }

    async fn resolve_plugin_ids(&mut self) -> Result<()> {
        for (key, plugin) in self.plugins.entries_mut() {
            self.admin
                .resolve_plugin_id(&mut *plugin)
                .await
                .with_context(|| format!("failed to resolve plugin {}", key))?;
        }
        Ok(())
    }

    /// Upsert every plugin, returning `(property key, id)` pairs
    async fn write_plugins(&mut self) -> Result<Vec<(String, String)>> {
        let mut written = Vec::new();
        for (key, plugin) in self.plugins.entries_mut() {
            let remote = self
                .admin
                .create_or_replace_plugin(&mut *plugin)
                .await
                .with_context(|| format!("failed to create or replace plugin {}", key))?;
            written.push((plugin.property_key().to_string(), remote.id));
        }
        Ok(written)
    }
}
