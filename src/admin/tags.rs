//! Tag-based identity.
//!
//! The gateway has no foreign key back to our objects, so every object we
//! create carries `key--value` tags and is found again by tag search.

use crate::plugin::GatewayPlugin;

/// Consumer tag value for plugins that apply to every consumer
pub const NO_CONSUMER: &str = "none";

pub fn build_tag(key: &str, value: &str) -> String {
    format!("{}--{}", key, value)
}

pub fn env_tag(environment: &str) -> String {
    build_tag("env", environment)
}

pub fn route_tag(route: &str) -> String {
    build_tag("route", route)
}

pub fn consumer_tag(consumer: &str) -> String {
    build_tag("consumer", consumer)
}

/// Natural key of a plugin: environment, plugin name, route and consumer
pub fn plugin_tags(environment: &str, plugin: &dyn GatewayPlugin) -> Vec<String> {
    let mut tags = vec![env_tag(environment), build_tag("plugin", plugin.plugin_name())];
    if let Some(route) = plugin.route_name() {
        tags.push(route_tag(route));
    }
    tags.push(consumer_tag(plugin.consumer_name().unwrap_or(NO_CONSUMER)));
    tags
}

/// Everything a route or consumer owns. Plugins outside this scope are never
/// touched by cleanup.
pub fn scope_tags(environment: &str, route: Option<&str>, consumer: Option<&str>) -> Vec<String> {
    let mut tags = vec![env_tag(environment)];
    if let Some(route) = route {
        tags.push(route_tag(route));
    }
    if let Some(consumer) = consumer {
        tags.push(consumer_tag(consumer));
    }
    tags
}

/// `true` when `tags` carries every tag in `filter`, the way the admin API
/// evaluates a comma-joined `tags` query
pub fn matches_all(tags: &[String], filter: &[String]) -> bool {
    filter.iter().all(|wanted| tags.contains(wanted))
}
