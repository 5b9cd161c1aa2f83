//! Zone failover
//!
//! The local proxy receives two routing configs. The first points at the
//! zone that exposes the API; the proxy uses it while that zone is healthy.
//! The second is the fallback: on a failover secondary route it reaches the
//! real backend directly, otherwise it reaches the secondary gateway.

use async_trait::async_trait;

use super::{primary_upstream, TOKEN_ENDPOINT_HEADER};
use crate::domain::{FeatureType, Upstream};
use crate::errors::{GatewayError, Result};
use crate::features::{Builder, Feature};
use crate::plugin::{LoadBalancing, RoutingConfig};

pub const PRIORITY: i32 = 109;

pub struct FailoverFeature;

#[async_trait]
impl Feature for FailoverFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::Failover
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        builder.route().is_some_and(|route| route.has_failover())
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().cloned().ok_or(GatewayError::NoRoute)?;
        let failover = route.failover().cloned().ok_or_else(|| {
            GatewayError::validation(format!("route {} has no failover configured", route.name))
        })?;
        if failover.upstreams.is_empty() {
            return Err(GatewayError::validation_field(
                format!(
                    "failover zone {} of route {} has no upstreams",
                    failover.target_zone_name, route.name
                ),
                "spec.traffic.failover.upstreams",
            ));
        }
        let has_load_balancing = failover.upstreams.len() > 1;
        let secondary = route.is_failover_secondary();
        if has_load_balancing && !secondary {
            return Err(GatewayError::validation(
                "loadbalancing is not supported for proxy routes that are not failover secondary routes",
            ));
        }

        let upstream = primary_upstream(&route)?;
        let environment = builder.environment().to_string();
        let realm = route.realm_name().to_string();

        builder.set_upstream(Upstream::localhost_proxy());

        let primary = RoutingConfig {
            remote_api_url: upstream.url(),
            api_base_path: upstream.path.clone(),
            realm: realm.clone(),
            issuer: upstream.issuer_url.clone(),
            client_id: upstream.client_id.clone(),
            client_secret: upstream.client_secret.clone(),
            environment: environment.clone(),
            target_zone_name: failover.target_zone_name.clone(),
            ..Default::default()
        };

        let mut fallback = RoutingConfig {
            jumper: Some(builder.jumper_config().clone()),
            realm,
            environment,
            ..Default::default()
        };

        if secondary {
            if has_load_balancing {
                if let Some(jumper) = fallback.jumper.as_mut() {
                    jumper.load_balancing = Some(LoadBalancing::from_upstreams(&failover.upstreams));
                }
            } else {
                fallback.remote_api_url = failover.upstreams[0].url();
                fallback.api_base_path = failover.upstreams[0].path.clone();
            }

            // The failover zone's identity provider replaces the upstream's own
            if let Some(idp) = failover.security.as_ref().and_then(|s| s.external_idp()) {
                fallback.token_endpoint = idp.token_endpoint.clone();
                builder
                    .request_transformer_plugin()?
                    .config
                    .append
                    .headers
                    .remove(TOKEN_ENDPOINT_HEADER);
            }
        } else {
            let target = &failover.upstreams[0];
            fallback.remote_api_url = target.url();
            fallback.api_base_path = target.path.clone();
            fallback.issuer = target.issuer_url.clone();
            fallback.client_id = target.client_id.clone();
            fallback.client_secret = target.client_secret.clone();
        }

        let routing = builder.routing_configs();
        routing.add(primary);
        routing.add(fallback);
        Ok(())
    }
}
