//! Feature identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a policy feature.
///
/// The declaration order is the tie-break when two features share a priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    PassThrough,
    ExternalIdp,
    AccessControl,
    RateLimit,
    CustomScopes,
    BasicAuth,
    HeaderTransformation,
    IpRestriction,
    LastMileSecurity,
    LoadBalancing,
    Failover,
}

impl FeatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::PassThrough => "PassThrough",
            FeatureType::ExternalIdp => "ExternalIDP",
            FeatureType::AccessControl => "AccessControl",
            FeatureType::RateLimit => "RateLimit",
            FeatureType::CustomScopes => "CustomScopes",
            FeatureType::BasicAuth => "BasicAuth",
            FeatureType::HeaderTransformation => "HeaderTransformation",
            FeatureType::IpRestriction => "IpRestriction",
            FeatureType::LastMileSecurity => "LastMileSecurity",
            FeatureType::LoadBalancing => "LoadBalancing",
            FeatureType::Failover => "Failover",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
