use std::time::Duration;

use async_trait::async_trait;
use gqlfixture_core::{EndpointConfig, ExecuteError, RequestExecutor, Variables, check_response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult, ReadinessError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request envelope sent to the endpoint.
#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<&'a Variables>,
}

/// GraphQL-over-HTTP client.
///
/// Every request is a JSON POST to a single endpoint URL. Non-success
/// statuses, non-JSON bodies and bodies carrying `errors` all fail the
/// request.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    http: reqwest::Client,
    url: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl GraphqlClient {
    /// Creates a client for `url` with no extra headers.
    pub fn new(url: impl Into<String>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http,
            url: url.into(),
            headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Creates a client from endpoint settings, resolving `${VAR}` header
    /// references from the environment.
    pub fn from_endpoint(endpoint: &EndpointConfig) -> ClientResult<Self> {
        let mut client = Self::new(&endpoint.url)?.with_timeout(endpoint.timeout());
        for (name, value) in endpoint.resolved_headers()? {
            client = client.with_header(&name, &value)?;
        }
        Ok(client)
    }

    /// Adds a header sent with every request.
    pub fn with_header(mut self, name: &str, value: &str) -> ClientResult<Self> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ClientError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| ClientError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Polls the endpoint with `query` until it answers.
    ///
    /// A GraphQL `errors` reply counts as an answer: the server is up even if
    /// it rejects the probe. Sleeps `interval` between attempts and gives up
    /// once another attempt would start after `max_wait`.
    pub async fn wait_until_ready(
        &self,
        query: &str,
        max_wait: Duration,
        interval: Duration,
    ) -> Result<(), ReadinessError> {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.execute(query, None).await {
                Ok(_) | Err(ExecuteError::Protocol(_)) => {
                    info!(url = %self.url, attempts, "GraphQL endpoint is ready");
                    return Ok(());
                }
                Err(e) => {
                    let waited = start.elapsed();
                    if waited + interval > max_wait {
                        return Err(ReadinessError::TimedOut {
                            waited,
                            last_error: e.to_string(),
                        });
                    }
                    debug!(url = %self.url, attempts, error = %e, "GraphQL endpoint not ready yet");
                    sleep(interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl RequestExecutor for GraphqlClient {
    async fn execute(
        &self,
        query: &str,
        variables: Option<&Variables>,
    ) -> Result<Value, ExecuteError> {
        let body = GraphqlRequest { query, variables };

        let response = self
            .http
            .post(&self.url)
            .headers(self.headers.clone())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(ExecuteError::transport)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(ExecuteError::transport)?;

        if !status.is_success() {
            return Err(ExecuteError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let value: Value =
            serde_json::from_str(&text).map_err(|e| ExecuteError::Decode(e.to_string()))?;
        check_response(value)
    }
}
