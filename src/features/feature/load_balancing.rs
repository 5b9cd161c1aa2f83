use async_trait::async_trait;

use super::{last_mile_security, REMOTE_API_URL_HEADER};
use crate::domain::{FeatureType, Upstream};
use crate::errors::{GatewayError, Result};
use crate::features::{Builder, Feature};
use crate::plugin::LoadBalancing;

pub const PRIORITY: i32 = last_mile_security::PRIORITY + 2;

/// Weighted balancing over several upstreams, performed by the local proxy
pub struct LoadBalancingFeature;

#[async_trait]
impl Feature for LoadBalancingFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::LoadBalancing
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        builder.route().is_some_and(|route| route.spec.upstreams.len() > 1)
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().ok_or(GatewayError::NoRoute)?;
        let load_balancing = LoadBalancing::from_upstreams(&route.spec.upstreams);
        // The proxy ignores the servers list while remote_api_url is present
        let drop_remote_api_url = !route.spec.pass_through && !route.is_proxy();

        builder.set_upstream(Upstream::localhost_proxy());
        builder.jumper_config().load_balancing = Some(load_balancing);

        if drop_remote_api_url {
            builder
                .request_transformer_plugin()?
                .config
                .append
                .headers
                .remove(REMOTE_API_URL_HEADER);
        }
        Ok(())
    }
}
