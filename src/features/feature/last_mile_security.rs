//! Last-mile security
//!
//! Secured routes are sent through the local proxy, which fetches a token for
//! the upstream and forwards the call. The request-transformer plugin tells
//! the proxy where to go:
//!
//! - proxy routes get the issuer and client credentials of the remote gateway
//! - real routes get the upstream URL and base path, the environment and the
//!   realm, and the caller's token is moved from `consumer-token` back into
//!   `Authorization`

use async_trait::async_trait;

use super::{primary_upstream, REMOTE_API_URL_HEADER};
use crate::domain::{FeatureType, Route, Upstream};
use crate::errors::{GatewayError, Result};
use crate::features::{Builder, Feature};

pub const PRIORITY: i32 = 100;

const CONSUMER_TOKEN_HEADER: &str = "consumer-token";
const AUTHORIZATION_HEADER: &str = "Authorization";
const AUTHORIZATION_TEMPLATE: &str = "$(headers['consumer-token'] or headers['Authorization'])";

pub struct LastMileSecurityFeature;

#[async_trait]
impl Feature for LastMileSecurityFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::LastMileSecurity
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        builder.route().is_some_and(|route| !route.spec.pass_through && !route.has_failover())
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().ok_or(GatewayError::NoRoute)?;
        let upstream = primary_upstream(route)?.clone();
        let remote_api_url = remote_api_url(route)?;
        let is_proxy = route.is_proxy();
        let environment = builder.environment().to_string();
        let realm = builder.realm().name.clone();

        builder.set_upstream(Upstream::localhost_proxy());
        let config = &mut builder.request_transformer_plugin()?.config;

        if is_proxy {
            config
                .append
                .add_header("issuer", upstream.issuer_url)
                .add_header("client_id", upstream.client_id)
                .add_header("client_secret", upstream.client_secret)
                .add_header(REMOTE_API_URL_HEADER, remote_api_url);
            return Ok(());
        }

        config.remove.add_header(CONSUMER_TOKEN_HEADER);
        config.replace.add_header(AUTHORIZATION_HEADER, AUTHORIZATION_TEMPLATE);
        config
            .append
            .add_header(REMOTE_API_URL_HEADER, remote_api_url)
            .add_header("api_base_path", upstream.path)
            .add_header("access_token_forwarding", "false");

        // Add keeps a value set by an upstream mesh hop, replace then overwrites it
        // so that the header is never joined into "a,b"
        config
            .add
            .add_header("environment", environment.clone())
            .add_header("realm", realm.clone());
        config
            .replace
            .add_header("environment", environment)
            .add_header("realm", realm);
        Ok(())
    }
}

/// `scheme://host[:port]/path` of the first upstream with duplicate slashes
/// collapsed
pub fn remote_api_url(route: &Route) -> Result<String> {
    let upstream = primary_upstream(route)?;
    let mut address = upstream.host.clone();
    if upstream.port != 0 {
        address.push_str(&format!(":{}", upstream.port));
    }
    address.push_str(&upstream.path);
    Ok(format!("{}://{}", upstream.scheme, address.replace("//", "/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Failover;
    use crate::features::feature::testing::{builder, proxy_route, real_route};

    #[test]
    fn test_remote_api_url() {
        let mut route = real_route();
        assert_eq!(remote_api_url(&route).unwrap(), "http://upstream.url:8080/api/v1");

        route.spec.upstreams[0] = Upstream::new("https", "upstream.url", 0, "//api//v1");
        assert_eq!(remote_api_url(&route).unwrap(), "https://upstream.url/api/v1");
    }

    #[test]
    fn test_is_used() {
        assert!(LastMileSecurityFeature.is_used(&builder(real_route())));

        let mut route = real_route();
        route.spec.pass_through = true;
        assert!(!LastMileSecurityFeature.is_used(&builder(route)));

        let mut route = real_route();
        route.spec.traffic.failover = Some(Failover::default());
        assert!(!LastMileSecurityFeature.is_used(&builder(route)));
    }

    #[tokio::test]
    async fn test_real_route() {
        let mut builder = builder(real_route());

        LastMileSecurityFeature.apply(&mut builder).await.unwrap();

        assert_eq!(builder.upstream(), Some(&Upstream::localhost_proxy()));
        let config = &builder.plugins().request_transformer.as_ref().unwrap().config;
        assert!(config.remove.headers.contains("consumer-token"));
        assert_eq!(config.replace.headers.get("Authorization"), Some(AUTHORIZATION_TEMPLATE));
        assert_eq!(
            config.append.headers.get("remote_api_url"),
            Some("http://upstream.url:8080/api/v1")
        );
        assert_eq!(config.append.headers.get("api_base_path"), Some("/api/v1"));
        assert_eq!(config.append.headers.get("access_token_forwarding"), Some("false"));
        assert_eq!(config.add.headers.get("environment"), Some("test"));
        assert_eq!(config.replace.headers.get("environment"), Some("test"));
        assert_eq!(config.add.headers.get("realm"), Some("default"));
        assert_eq!(config.replace.headers.get("realm"), Some("default"));
        assert!(!config.append.headers.contains("issuer"));
    }

    #[tokio::test]
    async fn test_proxy_route() {
        let mut builder = builder(proxy_route());

        LastMileSecurityFeature.apply(&mut builder).await.unwrap();

        let config = &builder.plugins().request_transformer.as_ref().unwrap().config;
        assert_eq!(config.append.headers.get("issuer"), Some("https://issuer.other-zone"));
        assert_eq!(config.append.headers.get("client_id"), Some("gateway"));
        assert_eq!(config.append.headers.get("client_secret"), Some("topsecret"));
        assert_eq!(
            config.append.headers.get("remote_api_url"),
            Some("https://other-zone.gateway:443/api/v1")
        );
        assert!(config.remove.is_empty());
        assert!(config.replace.is_empty());
    }
}
