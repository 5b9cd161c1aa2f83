use async_trait::async_trait;

use crate::domain::FeatureType;
use crate::errors::{GatewayError, Result};
use crate::features::{Builder, Feature};
use crate::plugin::{OauthCredentials, DEFAULT_CONSUMER_KEY};

pub const PRIORITY: i32 = 10;

/// Scopes the local proxy requests when it fetches tokens for the upstream
pub struct CustomScopesFeature;

#[async_trait]
impl Feature for CustomScopesFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::CustomScopes
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        builder.route().is_some_and(|route| {
            !route.spec.pass_through && (!route.is_proxy() || route.is_failover_secondary())
        })
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().ok_or(GatewayError::NoRoute)?;
        let route_scopes: Vec<String> =
            route.spec.security.as_ref().map(|s| s.scopes().to_vec()).unwrap_or_default();
        let consumer_scopes: Vec<(String, Vec<String>)> = builder
            .allowed_consumers()
            .iter()
            .filter(|c| !c.scopes().is_empty())
            .map(|c| (c.consumer_name().to_string(), c.scopes().to_vec()))
            .collect();

        let jumper = builder.jumper_config();
        // Populated by the external IDP feature, which owns the scopes then
        if !jumper.oauth.is_empty() {
            return Ok(());
        }

        if !route_scopes.is_empty() {
            jumper.oauth.insert(
                DEFAULT_CONSUMER_KEY.to_string(),
                OauthCredentials { scopes: route_scopes.join(" "), ..Default::default() },
            );
        }
        for (consumer, scopes) in consumer_scopes {
            jumper
                .oauth
                .insert(consumer, OauthCredentials { scopes: scopes.join(" "), ..Default::default() });
        }
        Ok(())
    }
}
