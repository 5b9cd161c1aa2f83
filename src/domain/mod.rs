//! Domain layer
//!
//! Desired-state objects handed to the synchronization engine by the
//! reconciliation layer. They are plain data: the engine reads their specs and
//! writes only the status properties that record admin API ids.
//!
//! ## Module Organization
//!
//! - `route`: routes, upstreams, downstreams, traffic policy
//! - `consumer`: consumers and their per-route subscriptions
//! - `gateway`: gateway-wide settings and realms
//! - `security`: machine-to-machine authentication settings
//! - `feature`: feature identifiers

pub mod consumer;
pub mod feature;
pub mod gateway;
pub mod route;
pub mod security;

pub use consumer::{
    ConsumeRoute, ConsumeRouteSpec, Consumer, ConsumerRateLimit, ConsumerSecurity, ConsumerSpec,
    ConsumerStatus, ConsumerTraffic, IpRestrictions, CONSUMER_ID_PROPERTY,
};
pub use feature::FeatureType;
pub use gateway::{Gateway, Realm, RedisSettings};
pub use route::{
    CircuitBreakerSettings, Downstream, Failover, HeaderTransformation, Limits, ObjectRef,
    RateLimit, RateLimitOptions, RequestTransformation, Route, RouteSpec, RouteStatus, Traffic,
    Transformation, Upstream, ROUTE_ID_PROPERTY, SERVICE_ID_PROPERTY,
};
pub use security::{
    BasicAuthCredentials, ExternalIdentityProvider, Machine2MachineAuthentication,
    OAuth2ClientCredentials, Security,
};
