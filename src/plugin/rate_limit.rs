//! `rate-limiting-merged` plugin
//!
//! One plugin instance carries both service (route owner) and consumer
//! limits. Route-scoped and consumer-scoped instances are separate plugins on
//! the gateway so a consumer override never replaces the route limit.

use serde::{Deserialize, Serialize};

use super::{PluginConfig, PluginSpec};
use crate::domain;

pub type RateLimitPlugin = PluginSpec<RateLimitConfig>;

pub const RATE_LIMIT_PROPERTY: &str = "kongRateLimitingPluginId";

/// Value consumers in this group are never limited
pub const OMIT_CONSUMER: &str = "gateway";

/// Counter storage backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[default]
    Local,
    Cluster,
    Redis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    #[serde(rename = "redis_host", skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(rename = "redis_port", skip_serializing_if = "is_zero_u16")]
    pub port: u16,
    #[serde(rename = "redis_timeout", skip_serializing_if = "is_zero_u32")]
    pub timeout: u32,
    #[serde(rename = "redis_username", skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(rename = "redis_password", skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(rename = "redis_database", skip_serializing_if = "is_zero_u32")]
    pub database: u32,
    #[serde(rename = "redis_ssl", skip_serializing_if = "is_false")]
    pub ssl: bool,
    #[serde(rename = "redis_ssl_verify", skip_serializing_if = "is_false")]
    pub ssl_verify: bool,
    #[serde(rename = "redis_server_name", skip_serializing_if = "String::is_empty")]
    pub server_name: String,
}

fn is_zero_u16(value: &u16) -> bool {
    *value == 0
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub second: u32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub minute: u32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub hour: u32,
}

impl From<&domain::Limits> for LimitConfig {
    fn from(limits: &domain::Limits) -> Self {
        Self { second: limits.second, minute: limits.minute, hour: limits.hour }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<LimitConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<LimitConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub policy: Policy,
    pub fault_tolerant: bool,
    #[serde(flatten)]
    pub redis: RedisConfig,
    pub hide_client_headers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub omit_consumer: String,
    pub limits: Limits,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            fault_tolerant: true,
            redis: RedisConfig::default(),
            hide_client_headers: false,
            error_code: None,
            error_message: String::new(),
            omit_consumer: String::new(),
            limits: Limits::default(),
        }
    }
}

impl PluginConfig for RateLimitConfig {
    const NAME: &'static str = "rate-limiting-merged";
}

impl RateLimitConfig {
    pub fn apply_options(&mut self, options: &domain::RateLimitOptions) {
        self.hide_client_headers = options.hide_client_headers;
        self.fault_tolerant = options.fault_tolerant;
    }
}

impl RateLimitPlugin {
    /// Limits enforced for every caller of the route
    pub fn for_route(route: impl Into<String>, cached_id: Option<String>) -> Self {
        Self::scoped(Some(route.into()), None, RATE_LIMIT_PROPERTY, cached_id)
    }

    /// Limits enforced for one consumer on one route
    pub fn for_consumer_on_route(
        route: impl Into<String>,
        consumer: impl Into<String>,
        cached_id: Option<String>,
    ) -> Self {
        let consumer = consumer.into();
        let property_key = consumer_property_key(&consumer);
        Self::scoped(Some(route.into()), Some(consumer), property_key, cached_id)
    }
}

/// Status property for the consumer-scoped instance of `consumer`
pub fn consumer_property_key(consumer: &str) -> String {
    format!("{}--{}", RATE_LIMIT_PROPERTY, consumer)
}
