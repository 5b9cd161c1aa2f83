use async_trait::async_trait;

use crate::domain::{self, FeatureType};
use crate::errors::{GatewayError, Result, ResultExt};
use crate::features::{Builder, Feature};
use crate::plugin::{BasicAuthCredentials, DEFAULT_CONSUMER_KEY};

pub const PRIORITY: i32 = 10;

/// Basic credentials the local proxy presents to the upstream.
///
/// The failover zone's security replaces the route's own when it is set.
pub struct BasicAuthFeature;

#[async_trait]
impl Feature for BasicAuthFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::BasicAuth
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        let Some(route) = builder.route() else {
            return false;
        };
        if route.spec.pass_through {
            return false;
        }
        if route.failover_security().is_some_and(|s| s.has_basic_auth()) {
            return true;
        }
        if route.is_proxy() {
            return false;
        }
        route.spec.security.as_ref().is_some_and(|s| s.has_basic_auth())
            || builder.allowed_consumers().iter().any(|c| c.has_basic_auth())
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().ok_or(GatewayError::NoRoute)?;
        let route_name = route.name.clone();
        let security = route.failover_security().or(route.spec.security.as_ref());
        let default_credentials = security.and_then(|s| s.basic_auth()).cloned();

        let consumer_credentials: Vec<(String, domain::BasicAuthCredentials)> = builder
            .allowed_consumers()
            .iter()
            .filter_map(|c| {
                let basic = c.spec.security.as_ref()?.basic_auth()?;
                Some((c.consumer_name().to_string(), basic.clone()))
            })
            .collect();

        if let Some(basic) = default_credentials {
            let password = builder.resolve_secret(&basic.password).await.with_context(|| {
                format!("cannot get basic auth password for route {}", route_name)
            })?;
            builder.jumper_config().basic_auth.insert(
                DEFAULT_CONSUMER_KEY.to_string(),
                BasicAuthCredentials { username: basic.username, password },
            );
        }

        for (consumer, basic) in consumer_credentials {
            let password = builder.resolve_secret(&basic.password).await.with_context(|| {
                format!("cannot get basic auth password for consumer {}", consumer)
            })?;
            builder
                .jumper_config()
                .basic_auth
                .insert(consumer, BasicAuthCredentials { username: basic.username, password });
        }
        Ok(())
    }
}
