use async_trait::async_trait;

use crate::domain::FeatureType;
use crate::errors::{GatewayError, Result};
use crate::features::{Builder, Feature};

pub const PRIORITY: i32 = 10;

/// Source address allow and deny lists of a consumer
pub struct IpRestrictionFeature;

#[async_trait]
impl Feature for IpRestrictionFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::IpRestriction
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        builder
            .consumer()
            .and_then(|consumer| consumer.ip_restrictions())
            .is_some_and(|restrictions| !restrictions.is_empty())
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let consumer = builder.consumer().ok_or(GatewayError::NoConsumer)?;
        let restrictions = consumer.ip_restrictions().cloned().unwrap_or_default();

        let plugin = builder.ip_restriction_plugin()?;
        plugin.config.allow.extend(restrictions.allow);
        plugin.config.deny.extend(restrictions.deny);
        Ok(())
    }
}
