//! `ip-restriction` plugin, scoped to a consumer

use serde::{Deserialize, Serialize};

use super::encoding::StringSet;
use super::{PluginConfig, PluginSpec};

pub type IpRestrictionPlugin = PluginSpec<IpRestrictionConfig>;

pub const IP_RESTRICTION_PROPERTY: &str = "kongIpRestrictionPluginId";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpRestrictionConfig {
    #[serde(skip_serializing_if = "StringSet::is_empty")]
    pub allow: StringSet,
    #[serde(skip_serializing_if = "StringSet::is_empty")]
    pub deny: StringSet,
}

impl PluginConfig for IpRestrictionConfig {
    const NAME: &'static str = "ip-restriction";
}

impl IpRestrictionPlugin {
    pub fn for_consumer(consumer: impl Into<String>, cached_id: Option<String>) -> Self {
        Self::scoped(None, Some(consumer.into()), IP_RESTRICTION_PROPERTY, cached_id)
    }
}
