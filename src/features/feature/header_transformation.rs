use async_trait::async_trait;

use crate::domain::FeatureType;
use crate::errors::{GatewayError, Result};
use crate::features::{Builder, Feature};

pub const PRIORITY: i32 = 10;

/// Strips configured request headers before forwarding.
///
/// Proxy routes forward untouched; the removal happens in the zone that
/// exposes the API.
pub struct HeaderTransformationFeature;

#[async_trait]
impl Feature for HeaderTransformationFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::HeaderTransformation
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        builder
            .route()
            .is_some_and(|route| !route.is_proxy() && !route.removed_request_headers().is_empty())
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().ok_or(GatewayError::NoRoute)?;
        let headers = route.removed_request_headers().to_vec();
        builder.request_transformer_plugin()?.config.remove.headers.extend(headers);
        Ok(())
    }
}
