//! # Gateway Plugins
//!
//! Typed configuration for every gateway plugin a build can produce. A
//! [`PluginSpec`] couples a config payload with its scope (route, consumer or
//! both) and its admin API id, which stays empty until identity resolution
//! finds or mints one.
//!
//! The admin client and the builder only see plugins through the object-safe
//! [`GatewayPlugin`] trait.

pub mod acl;
pub mod encoding;
pub mod ip_restriction;
pub mod jumper;
pub mod jwt;
pub mod rate_limit;
pub mod request_transformer;

pub use acl::{AclConfig, AclPlugin};
pub use encoding::{from_base64, to_base64, StringMap, StringSet};
pub use ip_restriction::{IpRestrictionConfig, IpRestrictionPlugin};
pub use jumper::{
    BasicAuthCredentials, JumperConfig, LoadBalancing, LoadBalancingServer, OauthCredentials,
    RoutingConfig, RoutingConfigs, DEFAULT_CONSUMER_KEY, JUMPER_CONFIG_KEY, ROUTING_CONFIG_KEY,
};
pub use jwt::{JwtConfig, JwtPlugin};
pub use rate_limit::{LimitConfig, Limits, Policy, RateLimitConfig, RateLimitPlugin, RedisConfig};
pub use request_transformer::{
    RemoveSection, RequestTransformerConfig, RequestTransformerPlugin, TransformSection,
};

use serde::Serialize;
use std::fmt;

use crate::errors::{GatewayError, Result};

/// Plugin configuration payload bound to a gateway plugin name
pub trait PluginConfig: Serialize + Default + fmt::Debug + Send + Sync {
    /// Plugin name as registered on the gateway
    const NAME: &'static str;
}

/// What the admin client needs to know about a plugin
pub trait GatewayPlugin: fmt::Debug + Send + Sync {
    fn plugin_name(&self) -> &'static str;

    /// Admin API id, `None` until resolved
    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: String);

    fn route_name(&self) -> Option<&str>;

    fn consumer_name(&self) -> Option<&str>;

    /// Status property the id is cached under between builds
    fn property_key(&self) -> &str;

    fn config_json(&self) -> Result<serde_json::Value>;
}

/// A plugin configuration with its scope and identity
#[derive(Debug, Clone, PartialEq)]
pub struct PluginSpec<C> {
    id: Option<String>,
    route: Option<String>,
    consumer: Option<String>,
    property_key: String,
    pub config: C,
}

impl<C: PluginConfig> PluginSpec<C> {
    pub(crate) fn scoped(
        route: Option<String>,
        consumer: Option<String>,
        property_key: impl Into<String>,
        cached_id: Option<String>,
    ) -> Self {
        Self {
            id: cached_id.filter(|id| !id.is_empty()),
            route,
            consumer,
            property_key: property_key.into(),
            config: C::default(),
        }
    }
}

impl<C: PluginConfig> GatewayPlugin for PluginSpec<C> {
    fn plugin_name(&self) -> &'static str {
        C::NAME
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn route_name(&self) -> Option<&str> {
        self.route.as_deref()
    }

    fn consumer_name(&self) -> Option<&str> {
        self.consumer.as_deref()
    }

    fn property_key(&self) -> &str {
        &self.property_key
    }

    fn config_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(&self.config).map_err(|e| GatewayError::Serialization {
            context: format!("encoding {} plugin config", C::NAME),
            source: e,
        })
    }
}
