//! Upstream with health checks, provisioned only when circuit breaking is on.

use serde::Serialize;

/// Loopback target every circuit-breaker upstream balances onto
pub const DEFAULT_TARGET: &str = "localhost:8080";

pub const DEFAULT_TARGET_WEIGHT: u32 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct UpstreamBody {
    pub name: String,
    pub algorithm: &'static str,
    pub healthchecks: Healthchecks,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetBody {
    pub target: String,
    pub weight: u32,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Healthchecks {
    pub active: ActiveHealthcheck,
    pub passive: PassiveHealthcheck,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveHealthcheck {
    #[serde(rename = "type")]
    pub check_type: &'static str,
    pub healthy: StatusList,
    pub unhealthy: StatusList,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusList {
    pub http_statuses: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassiveHealthcheck {
    #[serde(rename = "type")]
    pub check_type: &'static str,
    pub healthy: PassiveHealthy,
    pub unhealthy: PassiveUnhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassiveHealthy {
    pub http_statuses: Vec<u16>,
    pub successes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassiveUnhealthy {
    pub http_failures: u32,
    pub http_statuses: Vec<u16>,
    pub tcp_failures: u32,
    pub timeouts: u32,
}

impl Default for Healthchecks {
    fn default() -> Self {
        Self {
            active: ActiveHealthcheck {
                check_type: "http",
                healthy: StatusList { http_statuses: vec![302, 200] },
                unhealthy: StatusList {
                    http_statuses: vec![429, 404, 500, 501, 502, 503, 504, 505],
                },
            },
            passive: PassiveHealthcheck {
                check_type: "http",
                healthy: PassiveHealthy {
                    http_statuses: vec![
                        200, 201, 202, 203, 204, 205, 206, 207, 208, 226, 300, 301, 302, 303, 304,
                        305, 306, 307, 308,
                    ],
                    successes: 30,
                },
                unhealthy: PassiveUnhealthy {
                    http_failures: 10,
                    http_statuses: vec![429, 500, 503],
                    tcp_failures: 10,
                    timeouts: 10,
                },
            },
        }
    }
}

impl UpstreamBody {
    pub fn new(name: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            name: name.into(),
            algorithm: "round-robin",
            healthchecks: Healthchecks::default(),
            tags,
        }
    }
}

impl TargetBody {
    pub fn loopback(tags: Vec<String>) -> Self {
        Self { target: DEFAULT_TARGET.to_string(), weight: DEFAULT_TARGET_WEIGHT, tags }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_body_shape() {
        let body = UpstreamBody::new("my-route", vec!["env--dev".to_string()]);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["algorithm"], "round-robin");
        assert_eq!(json["healthchecks"]["passive"]["type"], "http");
        assert_eq!(json["healthchecks"]["passive"]["healthy"]["successes"], 30);
        assert_eq!(
            json["healthchecks"]["passive"]["unhealthy"]["http_statuses"],
            serde_json::json!([429, 500, 503])
        );
        assert_eq!(
            json["healthchecks"]["active"]["healthy"]["http_statuses"],
            serde_json::json!([302, 200])
        );
    }
}
