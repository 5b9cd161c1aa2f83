//! Token exchange against an identity provider outside the realm.
//!
//! Runs right before [`CustomScopesFeature`](super::CustomScopesFeature) so
//! the scopes it writes are not overwritten.

use async_trait::async_trait;

use super::{custom_scopes, TOKEN_ENDPOINT_HEADER};
use crate::domain::{
    ExternalIdentityProvider, FeatureType, OAuth2ClientCredentials, Route, Upstream,
};
use crate::errors::{GatewayError, Result, ResultExt};
use crate::features::{Builder, Feature};
use crate::plugin::{OauthCredentials, DEFAULT_CONSUMER_KEY};

pub const PRIORITY: i32 = custom_scopes::PRIORITY - 1;

pub struct ExternalIdpFeature;

/// First upstream that names an external token endpoint
fn external_idp_upstream(route: &Route) -> Option<&Upstream> {
    route.spec.upstreams.iter().find(|u| u.external_token_endpoint().is_some())
}

#[async_trait]
impl Feature for ExternalIdpFeature {
    fn feature_type(&self) -> FeatureType {
        FeatureType::ExternalIdp
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn is_used(&self, builder: &Builder) -> bool {
        builder.route().is_some_and(|route| {
            !route.spec.pass_through
                && !route.is_proxy()
                && external_idp_upstream(route).is_some()
        })
    }

    async fn apply(&self, builder: &mut Builder) -> Result<()> {
        let route = builder.route().ok_or(GatewayError::NoRoute)?;
        let route_name = route.name.clone();
        let upstream = external_idp_upstream(route).cloned().ok_or_else(|| {
            GatewayError::validation(format!(
                "no upstream with external IDP config found for route {}",
                route_name
            ))
        })?;
        let idp = upstream
            .security
            .as_ref()
            .and_then(|s| s.external_idp())
            .cloned()
            .unwrap_or_default();
        let consumers: Vec<(String, OAuth2ClientCredentials)> = builder
            .allowed_consumers()
            .iter()
            .filter_map(|c| Some((c.consumer_name().to_string(), c.external_idp_client()?.clone())))
            .collect();

        builder.set_upstream(upstream);
        builder
            .request_transformer_plugin()?
            .config
            .append
            .add_header(TOKEN_ENDPOINT_HEADER, idp.token_endpoint.clone());

        let existing =
            builder.jumper_config().oauth.remove(DEFAULT_CONSUMER_KEY).unwrap_or_default();
        let provider = extend_oauth(builder, existing, &idp, idp.client.as_ref())
            .await
            .with_context(|| format!("cannot get provider secret for route {}", route_name))?;
        builder.jumper_config().oauth.insert(DEFAULT_CONSUMER_KEY.to_string(), provider);

        for (consumer, client) in consumers {
            let existing = builder.jumper_config().oauth.remove(&consumer).unwrap_or_default();
            let oauth = extend_oauth(builder, existing, &idp, Some(&client))
                .await
                .with_context(|| format!("cannot get consumer secret for consumer {}", consumer))?;
            builder.jumper_config().oauth.insert(consumer, oauth);
        }
        Ok(())
    }
}

/// Merge provider settings and client credentials into an oauth entry.
/// Scopes already present are kept.
async fn extend_oauth(
    builder: &Builder,
    mut oauth: OauthCredentials,
    idp: &ExternalIdentityProvider,
    client: Option<&OAuth2ClientCredentials>,
) -> Result<OauthCredentials> {
    if let Some(client) = client {
        oauth.client_id = client.client_id.clone();
        oauth.client_secret = if client.client_secret.is_empty() {
            String::new()
        } else {
            builder.resolve_secret(&client.client_secret).await?
        };
        if oauth.scopes.is_empty() && !client.scopes.is_empty() {
            oauth.scopes = client.scopes.join(" ");
        }
    }
    oauth.token_request = idp.token_request.clone();
    oauth.grant_type = idp.grant_type.clone();
    Ok(oauth)
}
