// File: src/client/core.rs
use crate::client::Backend;
use crate::client::middleware::{DefaultHeadersLayer, DefaultHeadersService};
use crate::model::{ContactLog, Resource, ResourceKind};

use http::{Method, Request, Uri, header};
use http_body_util::BodyExt;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use serde_json::Value;
use tower::ServiceExt;
use tower_layer::Layer;

type HttpsClient =
    DefaultHeadersService<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>;

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// HTTP client for the CMS API rooted at `api_url`.
#[derive(Clone, Debug)]
pub struct RestClient {
    base: String,
    http: HttpsClient,
}

impl RestClient {
    pub fn new(api_url: &str, user_agent: &str, token: Option<String>) -> Result<Self, String> {
        let base = api_url.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            return Err("API URL is empty".to_string());
        }
        let uri: Uri = base
            .parse()
            .map_err(|e: http::uri::InvalidUri| e.to_string())?;

        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() && uri.scheme_str() == Some("https") {
            return Err("No valid system certificates found.".to_string());
        }
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
        let http = DefaultHeadersLayer::new(user_agent.to_string(), token).layer(http_client);
        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}{}", self.base, kind.endpoint())
    }

    fn item_url(&self, resource: &Resource) -> Result<String, String> {
        let kind = resource.kind();
        let id = resource
            .id()
            .ok_or_else(|| format!("Cannot address a {} without an id", kind))?;
        Ok(format!("{}/{}", self.collection_url(kind), id))
    }

    async fn send(&self, method: Method, url: String, body: Option<Value>) -> Result<Vec<u8>, String> {
        let mut builder = Request::builder().method(method.clone()).uri(&url);
        let payload = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                serde_json::to_string(&v).map_err(|e| e.to_string())?
            }
            None => String::new(),
        };
        let req = builder.body(payload).map_err(|e| e.to_string())?;

        log::debug!("{} {}", method, url);
        let response = self
            .http
            .clone()
            .oneshot(req)
            .await
            .map_err(|e| format!("{} {} failed: {}", method, url, e))?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))?
            .to_bytes();

        if status.is_success() {
            Ok(bytes.to_vec())
        } else {
            log::warn!("{} {} returned {}", method, url, status);
            Err(format!("{} {} returned {}", method, url, status))
        }
    }
}

impl Backend for RestClient {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<Resource>, String> {
        let url = format!("{}?format=json", self.collection_url(kind));
        let bytes = self.send(Method::GET, url, None).await?;
        let parsed: ListResponse = serde_json::from_slice(&bytes)
            .map_err(|e| format!("Invalid {} listing: {}", kind, e))?;
        parsed
            .results
            .into_iter()
            .map(|v| Resource::from_value(kind, v))
            .collect()
    }

    async fn create(&self, resource: &Resource) -> Result<(), String> {
        let url = self.collection_url(resource.kind());
        self.send(Method::POST, url, Some(resource.to_body()?))
            .await
            .map(|_| ())
    }

    async fn update(&self, resource: &Resource) -> Result<(), String> {
        let url = self.item_url(resource)?;
        self.send(Method::PUT, url, Some(resource.to_body()?))
            .await
            .map(|_| ())
    }

    async fn delete(&self, kind: ResourceKind, id: u64) -> Result<(), String> {
        let url = format!("{}/{}", self.collection_url(kind), id);
        self.send(Method::DELETE, url, None).await.map(|_| ())
    }

    async fn log_contact(&self, person_id: u64, contact: &ContactLog) -> Result<(), String> {
        let url = format!(
            "{}/{}/contacts",
            self.collection_url(ResourceKind::Person),
            person_id
        );
        self.send(Method::POST, url, Some(contact.to_body()?))
            .await
            .map(|_| ())
    }
}
