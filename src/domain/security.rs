//! Security policy types shared by routes, failover zones, upstreams and consume routes.

use serde::{Deserialize, Serialize};

/// Security configuration attached to a route or consumer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Security {
    /// Machine-to-machine authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub m2m: Option<Machine2MachineAuthentication>,
}

impl Security {
    /// Basic credentials configured for machine-to-machine calls
    pub fn basic_auth(&self) -> Option<&BasicAuthCredentials> {
        self.m2m.as_ref().and_then(|m2m| m2m.basic.as_ref())
    }

    pub fn has_basic_auth(&self) -> bool {
        self.basic_auth().is_some()
    }

    /// External identity provider configured for machine-to-machine calls
    pub fn external_idp(&self) -> Option<&ExternalIdentityProvider> {
        self.m2m.as_ref().and_then(|m2m| m2m.external_idp.as_ref())
    }

    pub fn has_external_idp(&self) -> bool {
        self.external_idp().is_some()
    }

    /// Requested OAuth scopes, empty when none are configured
    pub fn scopes(&self) -> &[String] {
        self.m2m.as_ref().map(|m2m| m2m.scopes.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Machine2MachineAuthentication {
    #[serde(rename = "externalIDP", skip_serializing_if = "Option::is_none")]
    pub external_idp: Option<ExternalIdentityProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<OAuth2ClientCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicAuthCredentials>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

/// Token endpoint settings of an identity provider outside the realm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExternalIdentityProvider {
    pub token_endpoint: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token_request: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub grant_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<OAuth2ClientCredentials>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BasicAuthCredentials {
    pub username: String,
    /// Literal password or `$<id>` secret reference
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OAuth2ClientCredentials {
    pub client_id: String,
    /// Literal secret or `$<id>` secret reference
    pub client_secret: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}
