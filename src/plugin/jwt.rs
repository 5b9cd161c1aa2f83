//! `jwt-keycloak` plugin: token validation against allowed issuers

use serde::{Deserialize, Serialize};

use super::encoding::StringSet;
use super::{PluginConfig, PluginSpec};

pub type JwtPlugin = PluginSpec<JwtConfig>;

pub const JWT_PROPERTY: &str = "kongJwtPluginId";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub allowed_iss: StringSet,
    pub consumer_match: bool,
    pub consumer_match_claim: String,
    pub consumer_match_claim_custom_id: bool,
    pub consumer_match_ignore_not_found: bool,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            allowed_iss: StringSet::new(),
            consumer_match: true,
            consumer_match_claim: "clientId".to_string(),
            consumer_match_claim_custom_id: true,
            consumer_match_ignore_not_found: false,
        }
    }
}

impl PluginConfig for JwtConfig {
    const NAME: &'static str = "jwt-keycloak";
}

impl JwtPlugin {
    pub fn for_route(route: impl Into<String>, cached_id: Option<String>) -> Self {
        Self::scoped(Some(route.into()), None, JWT_PROPERTY, cached_id)
    }
}
