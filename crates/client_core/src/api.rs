//! Backend endpoint contracts and the reqwest-backed client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    error::BackendErrorBody,
    protocol::{
        DecomposeResponse, Endpoint, ExploreRequest, HealthResponse, OptionsResponse,
        SummaryResponse,
    },
};
use tracing::debug;

use crate::error::ClientError;

#[async_trait]
pub trait ExploreApi: Send + Sync {
    async fn decompose(&self, request: ExploreRequest) -> Result<DecomposeResponse, ClientError>;
    async fn options(&self, request: ExploreRequest) -> Result<OptionsResponse, ClientError>;
    async fn summary(&self, request: ExploreRequest) -> Result<SummaryResponse, ClientError>;
    async fn health(&self) -> Result<HealthResponse, ClientError>;
}

pub struct HttpExploreApi {
    http: Client,
    base_url: String,
}

impl HttpExploreApi {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    /// The health route lives at the backend root, next to the api prefix.
    fn health_url(&self) -> String {
        match url::Url::parse(&self.base_url) {
            Ok(mut url) => {
                url.set_path("/");
                url.set_query(None);
                url.to_string()
            }
            Err(_) => format!("{}/", self.base_url),
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: &ExploreRequest,
    ) -> Result<T, ClientError> {
        let url = self.endpoint_url(endpoint);
        debug!(%endpoint, %url, "api: posting request");
        let res = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| ClientError::network(endpoint, &err))?;
        decode_response(endpoint, res).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    endpoint: Endpoint,
    res: reqwest::Response,
) -> Result<T, ClientError> {
    let status = res.status();
    let body = res
        .bytes()
        .await
        .map_err(|err| ClientError::network(endpoint, &err))?;

    if !status.is_success() {
        let message = serde_json::from_slice::<BackendErrorBody>(&body)
            .map(|parsed| parsed.message())
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
        return Err(ClientError::Status {
            endpoint,
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice::<T>(&body)
        .map_err(|err| ClientError::invalid_response(endpoint, err.to_string()))
}

#[async_trait]
impl ExploreApi for HttpExploreApi {
    async fn decompose(&self, request: ExploreRequest) -> Result<DecomposeResponse, ClientError> {
        self.post_json(Endpoint::Decompose, &request).await
    }

    async fn options(&self, request: ExploreRequest) -> Result<OptionsResponse, ClientError> {
        self.post_json(Endpoint::Options, &request).await
    }

    async fn summary(&self, request: ExploreRequest) -> Result<SummaryResponse, ClientError> {
        self.post_json(Endpoint::Summary, &request).await
    }

    async fn health(&self) -> Result<HealthResponse, ClientError> {
        let endpoint = Endpoint::Health;
        let res = self
            .http
            .get(self.health_url())
            .send()
            .await
            .map_err(|err| ClientError::network(endpoint, &err))?;
        decode_response(endpoint, res).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
