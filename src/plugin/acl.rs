//! `acl` plugin: which consumer groups may call a route

use serde::{Deserialize, Serialize};

use super::encoding::StringSet;
use super::{PluginConfig, PluginSpec};

pub type AclPlugin = PluginSpec<AclConfig>;

pub const ACL_PROPERTY: &str = "kongAclPluginId";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    pub allow: StringSet,
    pub hide_groups_header: bool,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self { allow: StringSet::new(), hide_groups_header: true }
    }
}

impl PluginConfig for AclConfig {
    const NAME: &'static str = "acl";
}

impl AclPlugin {
    pub fn for_route(route: impl Into<String>, cached_id: Option<String>) -> Self {
        Self::scoped(Some(route.into()), None, ACL_PROPERTY, cached_id)
    }
}
