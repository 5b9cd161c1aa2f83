//! Route and consumer rate limiting.
//!
//! The route-scoped plugin enforces the provider limit for every caller. Each
//! consumer subscribed directly to the route gets its own consumer-scoped
//! plugin; on a real route it repeats the provider limit so that the merged
//! plugin can enforce both windows in one pass.

use async_trait::async_trait;

use crate::domain::{FeatureType, Gateway};
use crate::errors::{GatewayError, Result, ResultExt};
use crate::features::{Builder, Feature};
use crate::plugin::rate_limit::OMIT_CONSUMER;
use crate::plugin::{LimitConfig, Policy, RateLimitPlugin, RedisConfig};

pub const PRIORITY: i32 = 10;

pub struct RateLimitFeature;

#[async_trait]
impl Feature for RateLimitFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::RateLimit
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
        route.has_rate_limit()
            || builder.direct_consumers().iter().any(|c| c.rate_limit().is_some())
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().cloned().ok_or(GatewayError::NoRoute)?;
        let gateway = builder.gateway().clone();
        let redis_password = builder
            .resolve_secret(&gateway.redis.password)
            .await
            .with_context(|| format!("cannot get redis password for gateway {}", gateway.name))?;

        let route_limit = route.rate_limit().cloned();
        let provider_side = !route.is_proxy() && route_limit.is_some();

        if let Some(limit) = route_limit.as_ref().filter(|_| provider_side) {
            let plugin = builder.rate_limit_plugin_route()?;
            set_common_config(plugin, &gateway, &redis_password);
            plugin.config.limits.service = Some(LimitConfig::from(&limit.limits));
            plugin.config.apply_options(&limit.options);
        }

        let subscriptions: Vec<_> = builder
            .direct_consumers()
            .into_iter()
            .filter(|c| c.rate_limit().is_some())
            .cloned()
            .collect();

        for subscription in subscriptions {
            let Some(consumer_limits) = subscription.rate_limit() else {
                continue;
            };
            let plugin = builder.rate_limit_plugin_consume_route(&subscription)?;
            set_common_config(plugin, &gateway, &redis_password);
            plugin.config.limits.consumer = Some(LimitConfig::from(consumer_limits));

            if let Some(limit) = &route_limit {
                if provider_side {
                    plugin.config.limits.service = Some(LimitConfig::from(&limit.limits));
                }
                plugin.config.apply_options(&limit.options);
            }
        }

        Ok(())
    }
}

fn set_common_config(plugin: &mut RateLimitPlugin, gateway: &Gateway, redis_password: &str) {
    plugin.config.policy = Policy::Redis;
    plugin.config.redis = RedisConfig {
        host: gateway.redis.host.clone(),
        port: gateway.redis.port,
        ssl: gateway.redis.enable_tls,
        password: redis_password.to_string(),
        ..Default::default()
    };
    plugin.config.omit_consumer = OMIT_CONSUMER.to_string();
}
