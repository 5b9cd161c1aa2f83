use async_trait::async_trait;

use crate::domain::FeatureType;
use crate::errors::{GatewayError, Result};
use crate::features::{Builder, Feature};

pub const PRIORITY: i32 = 10;

/// Token validation (`jwt-keycloak`) and consumer allow-listing (`acl`).
///
/// Applies to every route build, pass-through routes included.
pub struct AccessControlFeature;

#[async_trait]
impl Feature for AccessControlFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::AccessControl
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        builder.route().is_some()
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().ok_or(GatewayError::NoRoute)?;
        let realm_issuer = builder.realm().issuer_url.clone();
        let issuers: Vec<String> = route
            .spec
            .downstreams
            .iter()
            .map(|downstream| {
                if downstream.issuer_url.is_empty() {
                    realm_issuer.clone()
                } else {
                    downstream.issuer_url.clone()
                }
            })
            .collect();

        let mut allowed = builder.realm().default_consumers.clone();
        allowed.extend(builder.allowed_consumers().iter().map(|c| c.consumer_name().to_string()));

        builder.jwt_plugin()?.config.allowed_iss.extend(issuers);
        builder.acl_plugin()?.config.allow.extend(allowed);
        Ok(())
    }
}
