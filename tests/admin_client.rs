//! Integration tests for the admin API client
//!
//! Every test runs the reqwest client against a wiremock admin API and checks
//! the requests it makes and how it reads the answers.

mod common;

use common::{admin, mount_plugin_writes, object, page, remote_plugin, ENVIRONMENT};
use gateway_sync::admin::tags::plugin_tags;
use gateway_sync::domain::{
    CircuitBreakerSettings, Consumer, Downstream, Gateway, ObjectRef, Route, RouteSpec, Upstream,
    CONSUMER_ID_PROPERTY, ROUTE_ID_PROPERTY, SERVICE_ID_PROPERTY,
};
use gateway_sync::plugin::{AclPlugin, GatewayPlugin, RateLimitPlugin};
use gateway_sync::{AdminClient, GatewayError};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn route(name: &str) -> Route {
    Route::new(
        name,
        RouteSpec {
            realm: ObjectRef::new("default", ""),
            upstreams: vec![Upstream::new("http", "backend", 8080, "/api")],
            downstreams: vec![Downstream {
                host: "gateway.example".to_string(),
                port: 443,
                path: "/api".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        },
    )
}

fn acl_tags() -> String {
    plugin_tags(ENVIRONMENT, &AclPlugin::for_route("api", None)).join(",")
}

#[tokio::test]
async fn test_plugin_found_by_cached_id() {
    let (server, client) = admin().await;
    Mock::given(method("GET"))
        .and(path("/plugins/known-id"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(remote_plugin("known-id", "acl", &[])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .respond_with(page(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let plugin = AclPlugin::for_route("api", Some("known-id".to_string()));
    let found = client.load_plugin(&plugin).await.unwrap().unwrap();

    assert_eq!(found.id, "known-id");
}

#[tokio::test]
async fn test_stale_cached_id_falls_back_to_tags() {
    let (server, client) = admin().await;
    Mock::given(method("GET"))
        .and(path("/plugins/stale-id"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .and(query_param("tags", acl_tags()))
        .respond_with(page(json!([remote_plugin("fresh-id", "acl", &[])])))
        .expect(1)
        .mount(&server)
        .await;

    let plugin = AclPlugin::for_route("api", Some("stale-id".to_string()));
    let found = client.load_plugin(&plugin).await.unwrap().unwrap();

    assert_eq!(found.id, "fresh-id");
}

#[tokio::test]
async fn test_resolve_mints_id_when_nothing_matches() {
    let (server, client) = admin().await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .respond_with(page(json!([])))
        .mount(&server)
        .await;

    let mut plugin = AclPlugin::for_route("api", None);
    client.resolve_plugin_id(&mut plugin).await.unwrap();

    let id = plugin.id().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_multiple_tag_matches_are_ambiguous() {
    let (server, client) = admin().await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .respond_with(page(json!([
            remote_plugin("one", "acl", &[]),
            remote_plugin("two", "acl", &[]),
        ])))
        .mount(&server)
        .await;

    let err = client.load_plugin(&AclPlugin::for_route("api", None)).await.unwrap_err();

    match err {
        GatewayError::AmbiguousIdentity { tags } => assert_eq!(tags.join(","), acl_tags()),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_plugin_listing_follows_offsets() {
    let (server, client) = admin().await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .and(query_param("offset", "page-2"))
        .respond_with(page(json!([remote_plugin("c", "acl", &[])])))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [remote_plugin("a", "acl", &[]), remote_plugin("b", "acl", &[])],
            "offset": "page-2",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let plugins = client.list_plugins(&["env--dev".to_string()]).await.unwrap();

    let ids: Vec<&str> = plugins.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_route_plugin_write() {
    let (server, client) = admin().await;
    mount_plugin_writes(&server).await;

    let mut plugin = AclPlugin::for_route("api", Some("acl-id".to_string()));
    plugin.config.allow.add("team-a");
    let remote = client.create_or_replace_plugin(&mut plugin).await.unwrap();

    assert_eq!(remote.id, "acl-id");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/routes/api/plugins/acl-id");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["name"], "acl");
    assert_eq!(body["enabled"], true);
    assert_eq!(body["config"]["allow"], json!(["team-a"]));
    assert_eq!(body["tags"], json!(["env--dev", "plugin--acl", "route--api", "consumer--none"]));
    assert!(body.get("route").is_none());
}

#[tokio::test]
async fn test_consumer_plugin_on_route_names_the_route() {
    let (server, client) = admin().await;
    Mock::given(method("PUT"))
        .and(path("/consumers/team-a/plugins/rl-id"))
        .and(body_partial_json(json!({
            "name": "rate-limiting-merged",
            "route": { "name": "api" },
            "tags": ["env--dev", "plugin--rate-limiting-merged", "route--api", "consumer--team-a"],
        })))
        .respond_with(object("rl-id"))
        .expect(1)
        .mount(&server)
        .await;

    let mut plugin = RateLimitPlugin::for_consumer_on_route("api", "team-a", Some("rl-id".into()));
    client.create_or_replace_plugin(&mut plugin).await.unwrap();
}

#[tokio::test]
async fn test_route_without_circuit_breaker() {
    let (server, client) = admin().await;
    Mock::given(method("PUT"))
        .and(path("/services/api"))
        .and(body_json(json!({
            "name": "api",
            "host": "localhost",
            "port": 8080,
            "path": "/proxy",
            "protocol": "http",
            "tags": ["env--dev", "route--api"],
        })))
        .respond_with(object("service-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/routes/api"))
        .and(body_partial_json(json!({
            "paths": ["/api"],
            "hosts": ["gateway.example"],
            "service": { "id": "service-1" },
            "strip_path": true,
        })))
        .respond_with(object("route-1"))
        .expect(1)
        .mount(&server)
        .await;

    let mut route = route("api");
    client
        .create_or_replace_route(&mut route, &Upstream::localhost_proxy(), &Gateway::default())
        .await
        .unwrap();

    assert_eq!(route.property(SERVICE_ID_PROPERTY), Some("service-1"));
    assert_eq!(route.property(ROUTE_ID_PROPERTY), Some("route-1"));
    assert!(route.status.circuit_breaker_upstream_id.is_none());
}

#[tokio::test]
async fn test_circuit_breaker_routes_service_through_upstream() {
    let (server, client) = admin().await;
    Mock::given(method("PUT"))
        .and(path("/upstreams/api"))
        .and(body_partial_json(json!({ "name": "api", "algorithm": "round-robin" })))
        .respond_with(object("upstream-1"))
        .expect(1)
        .mount(&server)
        .await;
    // An existing target is reported as a conflict
    Mock::given(method("POST"))
        .and(path("/upstreams/api/targets"))
        .and(body_partial_json(json!({ "target": "localhost:8080", "weight": 100 })))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/services/api"))
        .and(body_partial_json(json!({ "host": "api" })))
        .respond_with(object("service-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/routes/api"))
        .respond_with(object("route-1"))
        .mount(&server)
        .await;

    let gateway =
        Gateway { circuit_breaker: CircuitBreakerSettings { enabled: true }, ..Default::default() };
    let mut route = route("api");
    client
        .create_or_replace_route(&mut route, &Upstream::localhost_proxy(), &gateway)
        .await
        .unwrap();

    assert_eq!(route.status.circuit_breaker_upstream_id.as_deref(), Some("upstream-1"));
}

#[tokio::test]
async fn test_disabling_circuit_breaker_removes_upstream() {
    let (server, client) = admin().await;
    common::mount_route_objects(&server, "api").await;
    Mock::given(method("DELETE"))
        .and(path("/upstreams/upstream-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut route = route("api");
    route.status.circuit_breaker_upstream_id = Some("upstream-1".to_string());
    client
        .create_or_replace_route(&mut route, &Upstream::localhost_proxy(), &Gateway::default())
        .await
        .unwrap();

    assert!(route.status.circuit_breaker_upstream_id.is_none());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let (server, client) = admin().await;
    Mock::given(method("PUT"))
        .and(path("/services/api"))
        .respond_with(ResponseTemplate::new(503).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let mut route = route("api");
    let err = client
        .create_or_replace_route(&mut route, &Upstream::localhost_proxy(), &Gateway::default())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(503));
    assert!(err.is_retryable());
    assert!(err.to_string().contains("database unavailable"));
    assert!(route.property(SERVICE_ID_PROPERTY).is_none());
}

#[tokio::test]
async fn test_delete_route_tolerates_missing_objects() {
    let (server, client) = admin().await;
    Mock::given(method("DELETE"))
        .and(path("/routes/api"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/services/api"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_route(&route("api")).await.unwrap();
}

#[tokio::test]
async fn test_deleting_twice_succeeds() {
    let (server, client) = admin().await;
    for target in ["/routes/api", "/services/api", "/upstreams/upstream-1"] {
        Mock::given(method("DELETE"))
            .and(path(target))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(target))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut route = route("api");
    route.status.circuit_breaker_upstream_id = Some("upstream-1".to_string());

    client.delete_route(&route).await.unwrap();
    client.delete_route(&route).await.unwrap();

    let deletes = server.received_requests().await.unwrap();
    let paths: Vec<&str> = deletes.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        vec![
            "/routes/api",
            "/services/api",
            "/upstreams/upstream-1",
            "/routes/api",
            "/services/api",
            "/upstreams/upstream-1",
        ]
    );
}

#[tokio::test]
async fn test_pass_through_route_skips_circuit_breaker() {
    let (server, client) = admin().await;
    Mock::given(method("PUT"))
        .and(path("/services/api"))
        .and(body_partial_json(json!({ "host": "backend", "path": "/api" })))
        .respond_with(object("service-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/routes/api"))
        .respond_with(object("route-1"))
        .mount(&server)
        .await;

    let gateway =
        Gateway { circuit_breaker: CircuitBreakerSettings { enabled: true }, ..Default::default() };
    let mut route = route("api");
    route.spec.pass_through = true;
    let upstream = route.spec.upstreams[0].clone();
    client.create_or_replace_route(&mut route, &upstream, &gateway).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.path().starts_with("/upstreams")));
    assert!(route.status.circuit_breaker_upstream_id.is_none());
}

#[tokio::test]
async fn test_consumer_joins_its_group_once() {
    let (server, client) = admin().await;
    Mock::given(method("PUT"))
        .and(path("/consumers/team-a"))
        .and(body_json(json!({
            "username": "team-a",
            "custom_id": "team-a",
            "tags": ["env--dev", "consumer--team-a"],
        })))
        .respond_with(object("consumer-1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/consumers/team-a/acls"))
        .respond_with(page(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/consumers/team-a/acls"))
        .and(body_json(json!({ "group": "team-a" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "group": "team-a" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut consumer = Consumer::new("team-a");
    client.create_or_replace_consumer(&mut consumer).await.unwrap();

    assert_eq!(consumer.property(CONSUMER_ID_PROPERTY), Some("consumer-1"));
}

#[tokio::test]
async fn test_consumer_already_in_group() {
    let (server, client) = admin().await;
    Mock::given(method("PUT"))
        .and(path("/consumers/team-a"))
        .respond_with(object("consumer-1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/consumers/team-a/acls"))
        .respond_with(page(json!([{ "group": "team-a" }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/consumers/team-a/acls"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    client.create_or_replace_consumer(&mut Consumer::new("team-a")).await.unwrap();
}

#[tokio::test]
async fn test_group_membership_found_on_later_page() {
    let (server, client) = admin().await;
    Mock::given(method("PUT"))
        .and(path("/consumers/team-a"))
        .respond_with(object("consumer-1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/consumers/team-a/acls"))
        .and(query_param("offset", "page-2"))
        .respond_with(page(json!([{ "group": "team-a" }])))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/consumers/team-a/acls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "group": "other" }],
            "offset": "page-2",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/consumers/team-a/acls"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    client.create_or_replace_consumer(&mut Consumer::new("team-a")).await.unwrap();
}

#[tokio::test]
async fn test_cleanup_deletes_only_orphans() {
    let (server, client) = admin().await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .and(query_param("tags", "env--dev,route--api"))
        .respond_with(page(json!([
            remote_plugin("kept", "acl", &["env--dev", "route--api"]),
            remote_plugin("orphan", "jwt-keycloak", &["env--dev", "route--api"]),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/plugins/orphan"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/plugins/kept"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let keep = AclPlugin::for_route("api", Some("kept".to_string()));
    client.cleanup_plugins(Some(&route("api")), None, &[&keep]).await.unwrap();
}

#[tokio::test]
async fn test_consumer_cleanup_leaves_route_bound_plugins() {
    let (server, client) = admin().await;
    Mock::given(method("GET"))
        .and(path("/plugins"))
        .and(query_param("tags", "env--dev,consumer--team-a"))
        .respond_with(page(json!([
            remote_plugin("ip", "ip-restriction", &["env--dev", "consumer--team-a"]),
            remote_plugin(
                "rl",
                "rate-limiting-merged",
                &["env--dev", "route--api", "consumer--team-a"]
            ),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/plugins/ip"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/plugins/rl"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    client.cleanup_plugins(None, Some(&Consumer::new("team-a")), &[]).await.unwrap();
}

#[tokio::test]
async fn test_unscoped_cleanup_is_rejected() {
    let (server, client) = admin().await;

    let err = client.cleanup_plugins(None, None, &[]).await.unwrap_err();

    assert!(matches!(err, GatewayError::Validation { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}
