use async_trait::async_trait;

use super::primary_upstream;
use crate::domain::FeatureType;
use crate::errors::{GatewayError, Result};
use crate::features::{Builder, Feature};

pub const PRIORITY: i32 = 0;

/// Forwards straight to the first upstream without any gateway-side security
pub struct PassThroughFeature;

#[async_trait]
impl Feature for PassThroughFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::PassThrough
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        builder.route().is_some_and(|route| route.spec.pass_through)
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().ok_or(GatewayError::NoRoute)?;
        let upstream = primary_upstream(route)?.clone();
        builder.set_upstream(upstream);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::feature::testing::{builder, real_route};

    #[tokio::test]
    async fn test_pass_through_uses_first_upstream() {
        let mut route = real_route();
        route.spec.pass_through = true;
        let mut builder = builder(route);

        assert!(PassThroughFeature.is_used(&builder));
        PassThroughFeature.apply(&mut builder).await.unwrap();

        assert_eq!(builder.upstream().unwrap().url(), "http://upstream.url:8080/api/v1");
        assert!(builder.plugins().is_empty());
    }

    #[test]
    fn test_not_used_on_secured_route() {
        assert!(!PassThroughFeature.is_used(&builder(real_route())));
    }

    #[tokio::test]
    async fn test_route_without_upstreams_is_rejected() {
        let mut route = real_route();
        route.spec.pass_through = true;
        route.spec.upstreams.clear();
        let mut builder = builder(route);

        let err = PassThroughFeature.apply(&mut builder).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation { .. }));
    }
}
