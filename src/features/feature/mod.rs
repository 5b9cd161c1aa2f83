//! Feature implementations
//!
//! Each feature is a unit struct; its priority is a constant so that
//! features which depend on each other can be expressed relative to one
//! another (external IDP runs right before custom scopes).

pub mod access_control;
pub mod basic_auth;
pub mod custom_scopes;
pub mod external_idp;
pub mod failover;
pub mod header_transformation;
pub mod ip_restriction;
pub mod last_mile_security;
pub mod load_balancing;
pub mod pass_through;
pub mod rate_limit;

pub use access_control::AccessControlFeature;
pub use basic_auth::BasicAuthFeature;
pub use custom_scopes::CustomScopesFeature;
pub use external_idp::ExternalIdpFeature;
pub use failover::FailoverFeature;
pub use header_transformation::HeaderTransformationFeature;
pub use ip_restriction::IpRestrictionFeature;
pub use last_mile_security::LastMileSecurityFeature;
pub use load_balancing::LoadBalancingFeature;
pub use pass_through::PassThroughFeature;
pub use rate_limit::RateLimitFeature;

use crate::domain::{Route, Upstream};
use crate::errors::{GatewayError, Result};

/// Request header carrying the full upstream URL to the local proxy
pub const REMOTE_API_URL_HEADER: &str = "remote_api_url";

/// Request header carrying the external token endpoint to the local proxy
pub const TOKEN_ENDPOINT_HEADER: &str = "token_endpoint";

/// First configured upstream, which defines where a route points to
pub(crate) fn primary_upstream(route: &Route) -> Result<&Upstream> {
    route.spec.upstreams.first().ok_or_else(|| {
        GatewayError::validation_field(
            format!("route {} has no upstreams", route.name),
            "spec.upstreams",
        )
    })
}
