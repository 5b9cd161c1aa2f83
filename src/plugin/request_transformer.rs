//! `request-transformer` plugin
//!
//! Several features write into the same instance: last-mile security adds the
//! upstream coordinates, external IDP adds the token endpoint, the builder
//! appends the jumper or routing payload.

use serde::{Deserialize, Serialize};

use super::encoding::{StringMap, StringSet};
use super::{PluginConfig, PluginSpec};

pub type RequestTransformerPlugin = PluginSpec<RequestTransformerConfig>;

/// Status property the plugin id is cached under
pub const REQUEST_TRANSFORMER_PROPERTY: &str = "kongRequestTransformerPluginId";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestTransformerConfig {
    #[serde(skip_serializing_if = "RemoveSection::is_empty")]
    pub remove: RemoveSection,
    #[serde(skip_serializing_if = "TransformSection::is_empty")]
    pub rename: TransformSection,
    #[serde(skip_serializing_if = "TransformSection::is_empty")]
    pub replace: TransformSection,
    #[serde(skip_serializing_if = "TransformSection::is_empty")]
    pub add: TransformSection,
    #[serde(skip_serializing_if = "TransformSection::is_empty")]
    pub append: TransformSection,
}

impl PluginConfig for RequestTransformerConfig {
    const NAME: &'static str = "request-transformer";
}

/// Names of headers, query parameters and body fields to drop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveSection {
    #[serde(skip_serializing_if = "StringSet::is_empty")]
    pub headers: StringSet,
    #[serde(skip_serializing_if = "StringSet::is_empty")]
    pub querystring: StringSet,
    #[serde(skip_serializing_if = "StringSet::is_empty")]
    pub body: StringSet,
}

impl RemoveSection {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.querystring.is_empty() && self.body.is_empty()
    }

    pub fn add_header(&mut self, name: impl Into<String>) -> &mut Self {
        self.headers.add(name);
        self
    }
}

/// `key:value` entries for rename, replace, add and append
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSection {
    #[serde(skip_serializing_if = "StringMap::is_empty")]
    pub headers: StringMap,
    #[serde(skip_serializing_if = "StringMap::is_empty")]
    pub querystring: StringMap,
    #[serde(skip_serializing_if = "StringMap::is_empty")]
    pub body: StringMap,
}

impl TransformSection {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.querystring.is_empty() && self.body.is_empty()
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.add(name, value);
        self
    }
}

impl RequestTransformerPlugin {
    pub fn for_route(route: impl Into<String>, cached_id: Option<String>) -> Self {
        Self::scoped(Some(route.into()), None, REQUEST_TRANSFORMER_PROPERTY, cached_id)
    }
}
