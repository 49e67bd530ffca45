//! HTTP implementation of [`ProxyStore`] against the dashboard API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::ProxyStore;
use crate::error::Error;
use crate::models::proxies::{
    ExportFormat, ProxyPage, ProxyPatch, ProxyRecord, ProxySpec, TestReport,
};
use crate::query::QueryState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpStore {
    client: reqwest::Client,
    base: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct ApiMessage {
    error: String,
}

impl HttpStore {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, Error> {
        // validate early so a bad base surfaces at startup, not per call
        let base = Url::parse(base_url)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base: base.as_str().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::new(&crate::api_base_url(), crate::api_token())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base, path);
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Maps non-success responses into the error taxonomy. An HTTP 409,
    /// or any error message carrying "already exists", is a duplicate.
    async fn check(resp: Response) -> Result<Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiMessage>(&body)
            .map(|m| m.error)
            .unwrap_or(body);

        if status == StatusCode::CONFLICT || message.contains("already exists") {
            return Err(Error::Duplicate);
        }
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, Error> {
        let body = Self::check(resp).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ProxyStore for HttpStore {
    async fn list(&self, query: &QueryState) -> Result<ProxyPage, Error> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("limit", query.page_size.to_string()),
        ];
        if !query.search.is_empty() {
            params.push(("search", query.search.clone()));
        }
        if let Some(status) = query.status_filter {
            params.push(("status", status.to_string()));
        }
        if let Some(protocol) = query.protocol_filter {
            params.push(("protocol", protocol.to_string()));
        }
        if let Some((field, direction)) = &query.sort {
            params.push(("sort", field.clone()));
            params.push(("order", direction.as_str().to_string()));
        }

        debug!(page = query.page, limit = query.page_size, "listing proxies");
        let resp = self
            .request(Method::GET, "/api/proxies")
            .query(&params)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn create(&self, spec: &ProxySpec) -> Result<ProxyRecord, Error> {
        let resp = self
            .request(Method::POST, "/api/proxies")
            .json(spec)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn update(&self, id: i64, patch: &ProxyPatch) -> Result<ProxyRecord, Error> {
        let resp = self
            .request(Method::PUT, &format!("/api/proxies/{id}"))
            .json(patch)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn delete(&self, id: i64) -> Result<(), Error> {
        let resp = self
            .request(Method::DELETE, &format!("/api/proxies/{id}"))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[i64]) -> Result<(), Error> {
        let resp = self
            .request(Method::POST, "/api/proxies/bulk-delete")
            .json(&json!({ "ids": ids }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn test(&self, id: i64) -> Result<TestReport, Error> {
        let resp = self
            .request(Method::POST, &format!("/api/proxies/{id}/test"))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn export(&self, format: ExportFormat) -> Result<Vec<u8>, Error> {
        let resp = self
            .request(Method::GET, "/api/proxies/export")
            .query(&[("format", format.as_str())])
            .send()
            .await?;
        let bytes = Self::check(resp).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn reload_pool(&self) -> Result<(), Error> {
        let resp = self.request(Method::POST, "/api/proxies/reload").send().await?;
        Self::check(resp).await?;
        Ok(())
    }
}
