//! Side-channel payloads for the local proxy.
//!
//! The proxy behind `http://localhost:8080/proxy` reads per-consumer
//! credentials and load-balancing targets from a base64 JSON request header
//! set by the request-transformer plugin. Empty sections are left out of the
//! JSON entirely; the proxy treats a present-but-empty object differently from
//! an absent one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Upstream;

/// Header carrying a base64 [`JumperConfig`]
pub const JUMPER_CONFIG_KEY: &str = "jumper_config";

/// Header carrying base64 [`RoutingConfigs`]; takes precedence over the jumper config
pub const ROUTING_CONFIG_KEY: &str = "routing_config";

/// Credentials key used for the route owner rather than a named consumer
pub const DEFAULT_CONSUMER_KEY: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OauthCredentials {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    /// Space separated
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scopes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_request: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub grant_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancing {
    pub servers: Vec<LoadBalancingServer>,
}

impl LoadBalancing {
    pub fn from_upstreams(upstreams: &[Upstream]) -> Self {
        Self {
            servers: upstreams
                .iter()
                .map(|u| LoadBalancingServer { upstream: u.url(), weight: u.weight })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancingServer {
    pub upstream: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub weight: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Credentials and targets keyed by consumer name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JumperConfig {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub oauth: BTreeMap<String, OauthCredentials>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub basic_auth: BTreeMap<String, BasicAuthCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancing: Option<LoadBalancing>,
}

impl JumperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing worth sending
    pub fn is_empty(&self) -> bool {
        self.oauth.is_empty() && self.basic_auth.is_empty() && self.load_balancing.is_none()
    }
}

/// Where and how the proxy reaches one zone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingConfig {
    #[serde(flatten)]
    pub jumper: Option<JumperConfig>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remote_api_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_base_path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub realm: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub environment: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub issuer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target_zone_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_endpoint: String,
}

/// Ordered list: primary zone first, failover zone second
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingConfigs {
    configs: Vec<RoutingConfig>,
}

impl RoutingConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, config: RoutingConfig) -> &mut RoutingConfig {
        self.configs.push(config);
        let last = self.configs.len() - 1;
        &mut self.configs[last]
    }

    pub fn get(&self, index: usize) -> Option<&RoutingConfig> {
        self.configs.get(index)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::encoding::{from_base64, to_base64};

    fn upstream(host: &str, weight: u32) -> Upstream {
        Upstream { weight, ..Upstream::new("http", host, 8080, "/api/v1") }
    }

    #[test]
    fn test_empty_jumper_config_omits_every_section() {
        let config = JumperConfig::new();
        assert!(config.is_empty());
        assert_eq!(serde_json::to_string(&config).unwrap(), "{}");
    }

    #[test]
    fn test_jumper_config_header_value() {
        let mut config = JumperConfig::new();
        config.oauth.insert(
            "123".to_string(),
            OauthCredentials {
                client_id: "client-id".to_string(),
                client_secret: "topsecret".to_string(),
                scopes: "scope1 scope2".to_string(),
                ..Default::default()
            },
        );
        config.load_balancing = Some(LoadBalancing::from_upstreams(&[
            upstream("upstream.url", 2),
            upstream("upstream2.url", 1),
        ]));

        let encoded = to_base64(&config).unwrap();
        assert_eq!(
            encoded,
            "eyJvYXV0aCI6eyIxMjMiOnsiY2xpZW50SWQiOiJjbGllbnQtaWQiLCJjbGllbnRTZWNyZXQiOiJ0b3BzZWNyZXQiLCJzY29wZXMiOiJzY29wZTEgc2NvcGUyIn19LCJsb2FkQmFsYW5jaW5nIjp7InNlcnZlcnMiOlt7InVwc3RyZWFtIjoiaHR0cDovL3Vwc3RyZWFtLnVybDo4MDgwL2FwaS92MSIsIndlaWdodCI6Mn0seyJ1cHN0cmVhbSI6Imh0dHA6Ly91cHN0cmVhbTIudXJsOjgwODAvYXBpL3YxIiwid2VpZ2h0IjoxfV19fQ=="
        );

        let decoded: JumperConfig = from_base64(&encoded).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_routing_config_flattens_jumper_fields() {
        let mut configs = RoutingConfigs::new();
        configs.add(RoutingConfig {
            remote_api_url: "http://upstream.url:8080/api/v1".to_string(),
            realm: "default".to_string(),
            ..Default::default()
        });
        let failover = configs.add(RoutingConfig {
            jumper: Some(JumperConfig::new()),
            environment: "prod".to_string(),
            ..Default::default()
        });
        failover.jumper.as_mut().unwrap().load_balancing =
            Some(LoadBalancing::from_upstreams(&[upstream("a", 0)]));

        assert_eq!(
            serde_json::to_value(&configs).unwrap(),
            serde_json::json!([
                { "remoteApiUrl": "http://upstream.url:8080/api/v1", "realm": "default" },
                {
                    "loadBalancing": { "servers": [{ "upstream": "http://a:8080/api/v1" }] },
                    "environment": "prod"
                }
            ])
        );
    }
}
