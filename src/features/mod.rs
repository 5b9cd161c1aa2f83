//! # Feature Composition
//!
//! A [`Feature`] is a prioritized policy unit that inspects a [`Builder`] and,
//! when it applies, mutates the build in progress: it picks the upstream,
//! extends plugin configs and fills the proxy side channel. Features never
//! call the admin API; only the builder's persistence step does.
//!
//! Features run in ascending priority. Equal priorities are ordered by
//! [`FeatureType`] so every build applies them in the same order.

pub mod builder;
pub mod feature;

pub use builder::{Builder, Plugins};
pub use feature::{
    AccessControlFeature, BasicAuthFeature, CustomScopesFeature, ExternalIdpFeature,
    FailoverFeature, HeaderTransformationFeature, IpRestrictionFeature, LastMileSecurityFeature,
    LoadBalancingFeature, PassThroughFeature, RateLimitFeature,
};

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::FeatureType;
use crate::errors::Result;

/// A policy unit applied to a build
#[async_trait]
pub trait Feature: Send + Sync {
    fn feature_type(&self) -> FeatureType;

    /// Lower runs earlier
    fn priority(&self) -> i32;

    /// Whether the feature applies to this build. Must not mutate anything.
    fn is_used(&self, builder: &Builder) -> bool;

    /// Mutate the build. An error aborts the whole build.
    async fn apply(&self, builder: &mut Builder) -> Result<()>;
}

/// Every feature the engine knows about
pub fn registry() -> Vec<Arc<dyn Feature>> {
    let mut features = route_features();
    features.extend(consumer_features());
    features
}

/// Features a route build enables
pub fn route_features() -> Vec<Arc<dyn Feature>> {
    vec![
        Arc::new(AccessControlFeature),
        Arc::new(PassThroughFeature),
        Arc::new(LastMileSecurityFeature),
        Arc::new(CustomScopesFeature),
        Arc::new(LoadBalancingFeature),
        Arc::new(ExternalIdpFeature),
        Arc::new(RateLimitFeature),
        Arc::new(FailoverFeature),
        Arc::new(HeaderTransformationFeature),
        Arc::new(BasicAuthFeature),
    ]
}

/// Features a consumer build enables
pub fn consumer_features() -> Vec<Arc<dyn Feature>> {
    vec![Arc::new(IpRestrictionFeature)]
}
