//! Consumer and ConsumeRoute domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::route::{Limits, ObjectRef};
use super::security::{OAuth2ClientCredentials, Security};

/// Status property holding the admin API id of the consumer
pub const CONSUMER_ID_PROPERTY: &str = "kongConsumerId";

/// A caller identity known to the gateway
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Consumer {
    pub name: String,
    pub spec: ConsumerSpec,
    pub status: ConsumerStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsumerSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<ConsumerSecurity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsumerSecurity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_restrictions: Option<IpRestrictions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpRestrictions {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

impl IpRestrictions {
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsumerStatus {
    pub properties: BTreeMap<String, String>,
}

impl Consumer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.status.properties.insert(key.into(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.status.properties.get(key).map(String::as_str)
    }

    pub fn ip_restrictions(&self) -> Option<&IpRestrictions> {
        self.spec.security.as_ref().and_then(|s| s.ip_restrictions.as_ref())
    }
}

/// Binds a consumer to one route with consumer-specific overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsumeRoute {
    pub name: String,
    pub spec: ConsumeRouteSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsumeRouteSpec {
    pub route: ObjectRef,
    pub consumer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic: Option<ConsumerTraffic>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsumerTraffic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<ConsumerRateLimit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerRateLimit {
    pub limits: Limits,
}

impl ConsumeRoute {
    pub fn new(name: impl Into<String>, route: ObjectRef, consumer_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: ConsumeRouteSpec {
                route,
                consumer_name: consumer_name.into(),
                ..Default::default()
            },
        }
    }

    pub fn consumer_name(&self) -> &str {
        &self.spec.consumer_name
    }

    pub fn rate_limit(&self) -> Option<&Limits> {
        self.spec
            .traffic
            .as_ref()
            .and_then(|t| t.rate_limit.as_ref())
            .map(|rl| &rl.limits)
    }

    pub fn has_basic_auth(&self) -> bool {
        self.spec.security.as_ref().is_some_and(Security::has_basic_auth)
    }

    pub fn scopes(&self) -> &[String] {
        self.spec.security.as_ref().map(Security::scopes).unwrap_or_default()
    }

    /// Client this consumer uses against an external identity provider
    pub fn external_idp_client(&self) -> Option<&OAuth2ClientCredentials> {
        self.spec
            .security
            .as_ref()
            .and_then(Security::external_idp)
            .and_then(|idp| idp.client.as_ref())
    }
}
