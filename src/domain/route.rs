//! Route domain types
//!
//! A [`Route`] is the desired gateway route as produced by the reconciliation
//! layer. Only its status is written back by a synchronization run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::security::Security;

/// Status property holding the admin API id of the route
pub const ROUTE_ID_PROPERTY: &str = "routeId";

/// Status property holding the admin API id of the service
pub const SERVICE_ID_PROPERTY: &str = "serviceId";

/// Reference to another named object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectRef {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into() }
    }
}

/// Backend target of a route.
///
/// An upstream carrying an issuer URL is itself a gateway (a proxy upstream)
/// reached with client credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Upstream {
    #[serde(skip_serializing_if = "is_zero")]
    pub weight: u32,
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub issuer_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Upstream {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        path: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
            path: path.into(),
            ..Default::default()
        }
    }

    /// Local proxy every secured route is sent through
    pub fn localhost_proxy() -> Self {
        Self::new("http", "localhost", 8080, "/proxy")
    }

    /// `scheme://host:port/path`, the port is left out when unset
    pub fn url(&self) -> String {
        if self.port == 0 {
            format!("{}://{}{}", self.scheme, self.host, self.path)
        } else {
            format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
        }
    }

    pub fn is_proxy(&self) -> bool {
        !self.issuer_url.is_empty()
    }

    /// Token endpoint of an external identity provider, if one is configured
    pub fn external_token_endpoint(&self) -> Option<&str> {
        self.security
            .as_ref()
            .and_then(|s| s.external_idp())
            .map(|idp| idp.token_endpoint.as_str())
            .filter(|endpoint| !endpoint.is_empty())
    }
}

/// Host and path a route is exposed on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Downstream {
    pub host: String,
    pub port: u16,
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub issuer_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Traffic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failover: Option<Failover>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    /// Per-route override of the gateway-wide circuit breaker switch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerSettings>,
}

/// Secondary zone a route falls back to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Failover {
    /// Zone the API is exposed in
    pub target_zone_name: String,
    pub upstreams: Vec<Upstream>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimit {
    pub limits: Limits,
    pub options: RateLimitOptions,
}

/// Requests allowed per window; zero leaves the window unlimited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub second: u32,
    pub minute: u32,
    pub hour: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimitOptions {
    pub hide_client_headers: bool,
    /// Keep serving requests when the counter store is unreachable
    #[serde(default = "fault_tolerant_default")]
    pub fault_tolerant: bool,
}

fn fault_tolerant_default() -> bool {
    true
}

impl Default for RateLimitOptions {
    fn default() -> Self {
        Self { hide_client_headers: false, fault_tolerant: fault_tolerant_default() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transformation {
    pub request: RequestTransformation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestTransformation {
    pub headers: HeaderTransformation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderTransformation {
    /// Headers stripped before the request is forwarded
    pub remove: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteSpec {
    pub realm: ObjectRef,
    /// Forward without authentication
    pub pass_through: bool,
    pub upstreams: Vec<Upstream>,
    pub downstreams: Vec<Downstream>,
    pub traffic: Traffic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Transformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
}

/// Observed state written back by a synchronization run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteStatus {
    /// Admin API ids of everything created for this route
    pub properties: BTreeMap<String, String>,
    /// Upstream created while circuit breaking was enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker_upstream_id: Option<String>,
    /// Consumers subscribed to this route directly
    pub consumers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Route {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub spec: RouteSpec,
    pub status: RouteStatus,
}

impl Route {
    pub fn new(name: impl Into<String>, spec: RouteSpec) -> Self {
        Self { name: name.into(), spec, ..Default::default() }
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.status.properties.insert(key.into(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.status.properties.get(key).map(String::as_str)
    }

    pub fn realm_name(&self) -> &str {
        &self.spec.realm.name
    }

    /// A route whose first upstream is another gateway
    pub fn is_proxy(&self) -> bool {
        self.spec.upstreams.first().is_some_and(Upstream::is_proxy)
    }

    pub fn failover(&self) -> Option<&Failover> {
        self.spec.traffic.failover.as_ref()
    }

    pub fn has_failover(&self) -> bool {
        self.failover().is_some()
    }

    pub fn failover_security(&self) -> Option<&Security> {
        self.failover().and_then(|f| f.security.as_ref())
    }

    /// At least one failover upstream is a real backend rather than another
    /// gateway. Proxy and real upstreams are never mixed in one failover zone.
    pub fn is_failover_secondary(&self) -> bool {
        self.failover().is_some_and(|f| f.upstreams.iter().any(|u| !u.is_proxy()))
    }

    pub fn rate_limit(&self) -> Option<&RateLimit> {
        self.spec.traffic.rate_limit.as_ref()
    }

    pub fn has_rate_limit(&self) -> bool {
        self.rate_limit().is_some()
    }

    /// Request headers the route owner wants removed
    pub fn removed_request_headers(&self) -> &[String] {
        self.spec
            .transformation
            .as_ref()
            .map(|t| t.request.headers.remove.as_slice())
            .unwrap_or_default()
    }

    /// Circuit breaking applies when the route or else the gateway enables it.
    /// Proxy and pass-through routes never get it: their service must keep
    /// pointing at the upstream the features chose.
    pub fn circuit_breaker_enabled(&self, gateway_default: bool) -> bool {
        if self.is_proxy() || self.spec.pass_through {
            return false;
        }
        self.spec
            .traffic
            .circuit_breaker
            .map(|cb| cb.enabled)
            .unwrap_or(gateway_default)
    }

    pub fn is_referenced_by(&self, reference: &ObjectRef) -> bool {
        self.name == reference.name && self.namespace == reference.namespace
    }
}
