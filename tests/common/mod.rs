//! Shared fixtures for admin API integration tests

#![allow(dead_code)]

use gateway_sync::config::AdminApiConfig;
use gateway_sync::KongAdminClient;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const ENVIRONMENT: &str = "dev";

/// Admin client pointed at a fresh mock server
pub async fn admin() -> (MockServer, KongAdminClient) {
    let server = MockServer::start().await;
    let config = AdminApiConfig { url: server.uri(), ..Default::default() };
    let client = KongAdminClient::new(&config, ENVIRONMENT).expect("client builds");
    (server, client)
}

/// `{"data": [...]}` page without a next offset
pub fn page(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": data, "offset": null }))
}

pub fn object(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "id": id }))
}

pub fn remote_plugin(id: &str, name: &str, tags: &[&str]) -> serde_json::Value {
    json!({ "id": id, "name": name, "tags": tags, "config": {} })
}

/// Services and routes accept any `PUT` and answer with a stable id
pub async fn mount_route_objects(server: &MockServer, name: &str) {
    Mock::given(method("PUT"))
        .and(path(format!("/services/{}", name)))
        .respond_with(object("service-1"))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/routes/{}", name)))
        .respond_with(object("route-1"))
        .mount(server)
        .await;
}

/// Plugin writes echo the id from the path together with the written body
pub async fn mount_plugin_writes(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path_regex(r"^/(routes|consumers)/[^/]+/plugins/[^/]+$"))
        .respond_with(|req: &Request| {
            let id = req.url.path().rsplit('/').next().unwrap_or_default().to_string();
            let mut body: serde_json::Value =
                serde_json::from_slice(&req.body).unwrap_or_else(|_| json!({}));
            body["id"] = json!(id);
            ResponseTemplate::new(200).set_body_json(body)
        })
        .mount(server)
        .await;
}

/// Written plugin bodies, in request order
pub async fn written_plugins(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT" && r.url.path().contains("/plugins/"))
        .filter_map(|r| serde_json::from_slice(&r.body).ok())
        .collect()
}
