//! HTTP client for Kong-compatible admin APIs
//!
//! Every write is an idempotent `PUT` keyed by name or id, so a build that
//! failed halfway converges on the next run.

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, trace, warn, Instrument};

use super::circuit_breaker::{TargetBody, UpstreamBody};
use super::tags::{build_tag, consumer_tag, env_tag, plugin_tags, route_tag, scope_tags};
use super::{cleanup_candidates, AdminClient, RemotePlugin};
use crate::config::{AdminApiConfig, SyncConfig};
use crate::domain::{
    Consumer, Gateway, Route, Upstream, CONSUMER_ID_PROPERTY, ROUTE_ID_PROPERTY,
    SERVICE_ID_PROPERTY,
};
use crate::errors::{GatewayError, Result};
use crate::plugin::GatewayPlugin;

const OK: &[u16] = &[200];
const CREATED: &[u16] = &[200, 201];
const TARGET_ACCEPTED: &[u16] = &[200, 201, 409];
const DELETED: &[u16] = &[200, 204, 404];

/// Any admin object; only the id matters to us
#[derive(Debug, Deserialize)]
struct AdminObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AclGroup {
    #[serde(default)]
    group: String,
}

#[derive(Debug, Serialize)]
struct NameRef<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct IdRef<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct ServiceBody<'a> {
    name: &'a str,
    host: &'a str,
    port: u16,
    path: &'a str,
    protocol: &'a str,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RouteBody<'a> {
    name: &'a str,
    protocols: [&'static str; 2],
    paths: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hosts: Vec<&'a str>,
    service: IdRef<'a>,
    strip_path: bool,
    request_buffering: bool,
    response_buffering: bool,
    https_redirect_status_code: u16,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ConsumerBody<'a> {
    username: &'a str,
    custom_id: &'a str,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AclBody<'a> {
    group: &'a str,
}

#[derive(Debug, Serialize)]
struct PluginBody<'a> {
    name: &'a str,
    enabled: bool,
    config: serde_json::Value,
    protocols: [&'static str; 1],
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route: Option<NameRef<'a>>,
}

/// Admin API client for one environment
#[derive(Debug, Clone)]
pub struct KongAdminClient {
    client: Client,
    base_url: String,
    environment: String,
}

impl KongAdminClient {
    /// Create a client for the admin API described by `config`
    pub fn new(config: &AdminApiConfig, environment: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| GatewayError::transport("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            environment: environment.into(),
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(&config.admin, config.environment.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let span = crate::admin_span!(method, path);

        async {
            debug!("{} {}", method, url);
            let mut request = self.client.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(|e| GatewayError::transport(format!("{} {}", method, path), e))?;
            debug!("Response status: {}", response.status());
            Ok(response)
        }
        .instrument(span)
        .await
    }

    /// Check the status against `accepted`; anything else becomes an HTTP error
    async fn expect_status(
        response: Response,
        operation: &str,
        accepted: &[u16],
    ) -> Result<(StatusCode, Response)> {
        let status = response.status();
        if accepted.contains(&status.as_u16()) {
            return Ok((status, response));
        }

        let error_text =
            response.text().await.unwrap_or_else(|_| "<unable to read error>".to_string());
        trace!("Error response:\n{}", error_text);
        Err(GatewayError::http(operation, status.as_u16(), error_text))
    }

    async fn expect_json<T: DeserializeOwned>(
        response: Response,
        operation: &str,
        accepted: &[u16],
    ) -> Result<T> {
        let (_, response) = Self::expect_status(response, operation, accepted).await?;
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::transport(format!("{}: reading response", operation), e))?;
        trace!("Response body:\n{}", body);

        serde_json::from_str(&body).map_err(|e| GatewayError::Serialization {
            context: format!("{}: decoding response", operation),
            source: e,
        })
    }

    async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        operation: &str,
        accepted: &[u16],
    ) -> Result<T> {
        let response = self.send(Method::PUT, path, &[], Some(body)).await?;
        Self::expect_json(response, operation, accepted).await
    }

    async fn delete_tolerant(&self, path: &str, operation: &str) -> Result<()> {
        let response = self.send::<()>(Method::DELETE, path, &[], None).await?;
        let (status, _) = Self::expect_status(response, operation, DELETED).await?;
        if status == StatusCode::NOT_FOUND {
            debug!(path = %path, "already absent");
        }
        Ok(())
    }

    /// Every entry of a list endpoint, following `offset` pagination
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        tags: Option<&str>,
        operation: &str,
    ) -> Result<Vec<T>> {
        let mut entries = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let response = {
                let mut query = Vec::new();
                if let Some(tags) = tags {
                    query.push(("tags", tags));
                }
                if let Some(offset) = offset.as_deref() {
                    query.push(("offset", offset));
                }
                self.send::<()>(Method::GET, path, &query, None).await?
            };
            let page: Page<T> = Self::expect_json(response, operation, OK).await?;
            entries.extend(page.data);

            match page.offset.filter(|o| !o.is_empty()) {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(entries)
    }

    /// All plugins carrying every tag in `tags`
    pub async fn list_plugins(&self, tags: &[String]) -> Result<Vec<RemotePlugin>> {
        self.list_all("/plugins", Some(&tags.join(",")), "list plugins").await
    }

    async fn upsert_circuit_breaker(&self, route: &mut Route) -> Result<()> {
        let name = route.name.clone();
        let upstream_tags =
            vec![env_tag(&self.environment), build_tag("upstream", &name), route_tag(&name)];
        let body = UpstreamBody::new(name.as_str(), upstream_tags);
        let upstream: AdminObject = self
            .put_json(&format!("/upstreams/{}", name), &body, "create upstream", OK)
            .await?;

        let target_tags =
            vec![env_tag(&self.environment), build_tag("targets", &name), route_tag(&name)];
        let response = self
            .send(
                Method::POST,
                &format!("/upstreams/{}/targets", name),
                &[],
                Some(&TargetBody::loopback(target_tags)),
            )
            .await?;
        Self::expect_status(response, "create upstream target", TARGET_ACCEPTED).await?;

        debug!(route = %name, upstream_id = %upstream.id, "circuit breaker upstream in place");
        route.status.circuit_breaker_upstream_id = Some(upstream.id);
        Ok(())
    }

    async fn remove_circuit_breaker(&self, route: &mut Route) -> Result<()> {
        if let Some(id) = route.status.circuit_breaker_upstream_id.take() {
            info!(route = %route.name, upstream_id = %id, "removing circuit breaker upstream");
            self.delete_tolerant(&format!("/upstreams/{}", id), "delete upstream").await?;
        }
        Ok(())
    }

    fn plugin_path(plugin: &dyn GatewayPlugin, id: &str) -> String {
        match (plugin.consumer_name(), plugin.route_name()) {
            (Some(consumer), _) => format!("/consumers/{}/plugins/{}", consumer, id),
            (None, Some(route)) => format!("/routes/{}/plugins/{}", route, id),
            (None, None) => format!("/plugins/{}", id),
        }
    }
}

#[async_trait]
impl AdminClient for KongAdminClient {
    fn environment(&self) -> &str {
        &self.environment
    }

    async fn create_or_replace_route(
        &self,
        route: &mut Route,
        upstream: &Upstream,
        gateway: &Gateway,
    ) -> Result<()> {
        let name = route.name.clone();
        let circuit_breaker = route.circuit_breaker_enabled(gateway.circuit_breaker.enabled);

        if circuit_breaker {
            self.upsert_circuit_breaker(route).await?;
        }

        let service_host = if circuit_breaker { name.as_str() } else { upstream.host.as_str() };
        let service = ServiceBody {
            name: &name,
            host: service_host,
            port: upstream.port,
            path: &upstream.path,
            protocol: &upstream.scheme,
            tags: vec![env_tag(&self.environment), route_tag(&name)],
        };
        let service: AdminObject = self
            .put_json(&format!("/services/{}", name), &service, "create service", OK)
            .await?;

        let mut paths: Vec<&str> = Vec::new();
        let mut hosts: Vec<&str> = Vec::new();
        for downstream in &route.spec.downstreams {
            if !downstream.path.is_empty() && !paths.contains(&downstream.path.as_str()) {
                paths.push(&downstream.path);
            }
            if !downstream.host.is_empty() && !hosts.contains(&downstream.host.as_str()) {
                hosts.push(&downstream.host);
            }
        }
        let body = RouteBody {
            name: &name,
            protocols: ["http", "https"],
            paths,
            hosts,
            service: IdRef { id: &service.id },
            strip_path: true,
            request_buffering: true,
            response_buffering: true,
            https_redirect_status_code: 426,
            tags: vec![env_tag(&self.environment), route_tag(&name)],
        };
        let remote_route: AdminObject =
            self.put_json(&format!("/routes/{}", name), &body, "create route", OK).await?;

        route.set_property(SERVICE_ID_PROPERTY, service.id);
        route.set_property(ROUTE_ID_PROPERTY, remote_route.id);

        if !circuit_breaker {
            self.remove_circuit_breaker(route).await?;
        }

        info!(route = %name, circuit_breaker, "route synchronized");
        Ok(())
    }

    async fn delete_route(&self, route: &Route) -> Result<()> {
        self.delete_tolerant(&format!("/routes/{}", route.name), "delete route").await?;
        self.delete_tolerant(&format!("/services/{}", route.name), "delete service").await?;
        if let Some(id) = route.status.circuit_breaker_upstream_id.as_deref() {
            self.delete_tolerant(&format!("/upstreams/{}", id), "delete upstream").await?;
        }
        info!(route = %route.name, "route deleted");
        Ok(())
    }

    async fn create_or_replace_consumer(&self, consumer: &mut Consumer) -> Result<()> {
        let name = consumer.name.clone();
        let body = ConsumerBody {
            username: &name,
            custom_id: &name,
            tags: vec![env_tag(&self.environment), consumer_tag(&name)],
        };
        let remote: AdminObject = self
            .put_json(&format!("/consumers/{}", name), &body, "create consumer", OK)
            .await?;
        consumer.set_property(CONSUMER_ID_PROPERTY, remote.id);

        let acl_path = format!("/consumers/{}/acls", name);
        let groups: Vec<AclGroup> =
            self.list_all(&acl_path, None, "list consumer groups").await?;

        if groups.iter().any(|g| g.group == name) {
            debug!(consumer = %name, "already in group");
        } else {
            let response = self
                .send(Method::POST, &acl_path, &[], Some(&AclBody { group: &name }))
                .await?;
            Self::expect_status(response, "add consumer to group", CREATED).await?;
            debug!(consumer = %name, "added to group");
        }

        info!(consumer = %name, "consumer synchronized");
        Ok(())
    }

    async fn delete_consumer(&self, consumer: &Consumer) -> Result<()> {
        self.delete_tolerant(&format!("/consumers/{}", consumer.name), "delete consumer").await?;
        info!(consumer = %consumer.name, "consumer deleted");
        Ok(())
    }

    async fn load_plugin(&self, plugin: &dyn GatewayPlugin) -> Result<Option<RemotePlugin>> {
        if let Some(id) = plugin.id() {
            let response =
                self.send::<()>(Method::GET, &format!("/plugins/{}", id), &[], None).await?;
            if response.status() == StatusCode::NOT_FOUND {
                warn!(plugin = plugin.plugin_name(), id = %id, "cached plugin id is stale");
            } else {
                let found: RemotePlugin = Self::expect_json(response, "get plugin", OK).await?;
                return Ok(Some(found));
            }
        }

        let tags = plugin_tags(&self.environment, plugin);
        let mut found = self.list_plugins(&tags).await?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            _ => Err(GatewayError::AmbiguousIdentity { tags }),
        }
    }

    async fn create_or_replace_plugin(
        &self,
        plugin: &mut dyn GatewayPlugin,
    ) -> Result<RemotePlugin> {
        if plugin.id().is_none() {
            self.resolve_plugin_id(plugin).await?;
        }
        let id = plugin.id().map(str::to_string).unwrap_or_default();

        let body = PluginBody {
            name: plugin.plugin_name(),
            enabled: true,
            config: plugin.config_json()?,
            protocols: ["http"],
            tags: plugin_tags(&self.environment, plugin),
            route: match (plugin.consumer_name(), plugin.route_name()) {
                (Some(_), Some(route)) => Some(NameRef { name: route }),
                _ => None,
            },
        };
        let path = Self::plugin_path(plugin, &id);
        let operation = format!("create plugin {}", plugin.plugin_name());
        let remote: RemotePlugin = self.put_json(&path, &body, &operation, CREATED).await?;

        debug!(plugin = plugin.plugin_name(), id = %remote.id, "plugin synchronized");
        Ok(remote)
    }

    async fn delete_plugin(&self, id: &str) -> Result<()> {
        self.delete_tolerant(&format!("/plugins/{}", id), "delete plugin").await
    }

    async fn cleanup_plugins(
        &self,
        route: Option<&Route>,
        consumer: Option<&Consumer>,
        keep: &[&dyn GatewayPlugin],
    ) -> Result<()> {
        if route.is_none() && consumer.is_none() {
            return Err(GatewayError::validation(
                "plugin cleanup needs a route or a consumer scope",
            ));
        }

        let tags = scope_tags(
            &self.environment,
            route.map(|r| r.name.as_str()),
            consumer.map(|c| c.name.as_str()),
        );
        let remote = self.list_plugins(&tags).await?;
        info!(found = remote.len(), expected = keep.len(), tags = %tags.join(","), "cleaning up plugins");

        for plugin in cleanup_candidates(&remote, route, consumer, keep) {
            info!(plugin = %plugin.name, id = %plugin.id, "deleting orphaned plugin");
            self.delete_plugin(&plugin.id).await?;
        }
        Ok(())
    }
}
