//! Plain HTTP access to the Cloud Controller.
//!
//! Every response body is read to the end before the call returns, so callers
//! only ever see a fully buffered [`RawResponse`]. Reads race the session's
//! cancellation token; writes are refused once it fires but are never
//! interrupted mid-flight.

use reqwest::{Method, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::config::{JobSettings, SessionConfig};
use crate::error::ClientError;
use crate::pagination::{Page, Query, V2Page};

/// A buffered Cloud Controller response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// `Location` header, set by endpoints that start asynchronous jobs.
    pub location: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn into_error(self) -> ClientError {
        ClientError::remote_status(self.status, self.body)
    }

    /// Passes the response through when its status is in `accepted`.
    pub fn accept(self, accepted: &[u16]) -> Result<Self, ClientError> {
        if accepted.contains(&self.status) {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Passes any 2xx response through.
    pub fn success(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }
}

#[derive(Debug, Clone)]
pub struct RawClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    jobs: JobSettings,
    cancel: CancellationToken,
}

impl RawClient {
    pub fn new(config: &SessionConfig, cancel: CancellationToken) -> Result<Self, ClientError> {
        let parsed =
            Url::parse(&config.api_url).map_err(|_| ClientError::Url(config.api_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Url(config.api_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.skip_ssl_validation)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.access_token.clone(),
            jobs: config.jobs,
            cancel,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn job_settings(&self) -> JobSettings {
        self.jobs
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    // Server-provided links (pagination, job locations) are absolute.
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.header(header::ACCEPT, "application/json")
    }

    pub async fn do_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<RawResponse, ClientError> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let url = self.url(path);
        let mut req = self.request(method.clone(), &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let exchange = async {
            let resp = req.send().await?;
            let status = resp.status().as_u16();
            let location = resp
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = resp.text().await?;
            Ok::<_, ClientError>(RawResponse {
                status,
                location,
                body,
            })
        };

        let response = if method == Method::GET {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                response = exchange => response?,
            }
        } else {
            exchange.await?
        };

        debug!(%method, %url, status = response.status, "cloud controller call");
        Ok(response)
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse, ClientError> {
        self.do_request::<()>(Method::GET, path, query, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RawResponse, ClientError> {
        self.do_request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RawResponse, ClientError> {
        self.do_request(Method::PATCH, path, &[], Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<RawResponse, ClientError> {
        self.do_request(Method::PUT, path, &[], body).await
    }

    pub async fn delete(&self, path: &str) -> Result<RawResponse, ClientError> {
        self.do_request::<()>(Method::DELETE, path, &[], None).await
    }

    /// GET a single document; 404 yields `None`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        let resp = self.get(path, &[]).await?;
        if resp.status == 404 {
            return Ok(None);
        }
        resp.success()?.json().map(Some)
    }

    /// Collects every page of a v3 list endpoint.
    pub async fn list_v3<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<Vec<T>, ClientError> {
        let mut page: Page<T> = self.get(path, query.pairs()).await?.success()?.json()?;
        let mut out = Vec::new();
        loop {
            out.append(&mut page.resources);
            match page.pagination.next {
                Some(link) => page = self.get(&link.href, &[]).await?.success()?.json()?,
                None => break,
            }
        }
        Ok(out)
    }

    /// Collects every page of a v2 list endpoint.
    pub async fn list_v2<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<Vec<T>, ClientError> {
        let mut page: V2Page<T> = self.get(path, query.pairs()).await?.success()?.json()?;
        let mut out = Vec::new();
        loop {
            out.append(&mut page.resources);
            match page.next_url.take() {
                Some(next) => page = self.get(&next, &[]).await?.success()?.json()?,
                None => break,
            }
        }
        Ok(out)
    }
}
