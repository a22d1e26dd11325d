//! REST client for the Azure Monitor metrics API
//!
//! Issues `GET {resourceUri}/providers/Microsoft.Insights/metrics` with a
//! bearer token from the injected [`CredentialProvider`]. Failures are
//! returned as-is; retrying is left to the caller's polling cadence.

use super::{CredentialProvider, MetricsQuerier, MetricsRequest};
use crate::error::QueryClientError;
use crate::response::MetricResponse;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Azure Resource Manager endpoint of the public cloud
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Metrics API version whose payload [`MetricResponse`] mirrors
pub const DEFAULT_API_VERSION: &str = "2018-01-01";

/// Metrics client for one management endpoint
pub struct AzureMonitorClient {
    http: reqwest::Client,
    endpoint: Url,
    api_version: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl AzureMonitorClient {
    /// Create a client for the public cloud with default settings
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Result<Self, QueryClientError> {
        AzureMonitorClientBuilder::new(credentials).build()
    }

    pub fn builder(credentials: Arc<dyn CredentialProvider>) -> AzureMonitorClientBuilder {
        AzureMonitorClientBuilder::new(credentials)
    }

    /// URL of the metrics collection for a fully qualified resource URI.
    ///
    /// Segments are appended to the endpoint's own path, so a base path on
    /// the endpoint (a proxy prefix, say) is kept.
    pub fn metrics_url(&self, resource_uri: &str) -> Result<Url, QueryClientError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments
                .pop_if_empty()
                .extend(resource_uri.split('/').filter(|s| !s.is_empty()))
                .extend(["providers", "Microsoft.Insights", "metrics"]);
        }
        Ok(url)
    }
}

#[async_trait]
impl MetricsQuerier for AzureMonitorClient {
    async fn query(&self, request: &MetricsRequest<'_>) -> Result<MetricResponse, QueryClientError> {
        let url = self.metrics_url(&request.resource_uri)?;
        let token = self.credentials.access_token().await?;

        let mut params = vec![
            ("api-version", self.api_version.as_str()),
            ("timespan", request.timespan.as_str()),
            ("metricnames", request.metric_name),
            ("aggregation", request.aggregation.as_str()),
        ];
        if let Some(filter) = request.filter.filter(|f| !f.is_empty()) {
            params.push(("$filter", filter));
        }

        debug!(url = %url, timespan = %request.timespan, "Sending metrics request");

        let response = self
            .http
            .get(url)
            .query(&params)
            .bearer_auth(&token.token)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(QueryClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

/// Builder for [`AzureMonitorClient`]
pub struct AzureMonitorClientBuilder {
    credentials: Arc<dyn CredentialProvider>,
    endpoint: String,
    api_version: String,
    timeout: Option<Duration>,
    http: Option<reqwest::Client>,
}

impl AzureMonitorClientBuilder {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_MANAGEMENT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: None,
            http: None,
        }
    }

    /// Management endpoint, e.g. a sovereign cloud or a test server
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Per-request timeout applied by the HTTP client
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Share an existing HTTP client (and its connection pool)
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<AzureMonitorClient, QueryClientError> {
        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(AzureMonitorClient {
            http,
            endpoint: Url::parse(&self.endpoint)?,
            api_version: self.api_version,
            credentials: self.credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::StaticTokenCredential;
    use crate::models::Aggregation;
    use mockito::Matcher;

    const METRICS_PATH: &str = "/subscriptions/s1/resourceGroups/g1/providers/Microsoft.Storage/queueServices/q1/providers/Microsoft.Insights/metrics";

    const BODY: &str = r#"{
        "value": [{
            "name": { "value": "Length" },
            "timeseries": [{ "data": [{ "timeStamp": "2024-03-01T11:59:00Z", "average": 12.6 }] }]
        }]
    }"#;

    fn request(filter: Option<&str>) -> MetricsRequest<'_> {
        MetricsRequest {
            resource_uri:
                "/subscriptions/s1/resourceGroups/g1/providers/Microsoft.Storage/queueServices/q1"
                    .to_string(),
            timespan: "2024-03-01T11:55:00Z/2024-03-01T12:00:00Z".to_string(),
            metric_name: "Length",
            aggregation: Aggregation::Average,
            filter,
        }
    }

    fn client_for(server: &mockito::Server) -> AzureMonitorClient {
        AzureMonitorClient::builder(Arc::new(StaticTokenCredential::new("test-token")))
            .endpoint(server.url())
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn test_metrics_url() {
        let client =
            AzureMonitorClient::new(Arc::new(StaticTokenCredential::new("t"))).unwrap();
        let url = client
            .metrics_url("/subscriptions/s1/resourceGroups/g1/providers/a/b/c")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/s1/resourceGroups/g1/providers/a/b/c/providers/Microsoft.Insights/metrics"
        );
    }

    #[test]
    fn test_metrics_url_keeps_endpoint_path() {
        for endpoint in ["http://proxy.local/azure", "http://proxy.local/azure/"] {
            let client = AzureMonitorClient::builder(Arc::new(StaticTokenCredential::new("t")))
                .endpoint(endpoint)
                .build()
                .unwrap();
            let url = client
                .metrics_url("/subscriptions/s1/resourceGroups/g1/providers/a/b/c")
                .unwrap();
            assert_eq!(
                url.as_str(),
                "http://proxy.local/azure/subscriptions/s1/resourceGroups/g1/providers/a/b/c/providers/Microsoft.Insights/metrics"
            );
        }
    }

    #[tokio::test]
    async fn test_query_sends_expected_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", METRICS_PATH)
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api-version".into(), DEFAULT_API_VERSION.into()),
                Matcher::UrlEncoded(
                    "timespan".into(),
                    "2024-03-01T11:55:00Z/2024-03-01T12:00:00Z".into(),
                ),
                Matcher::UrlEncoded("metricnames".into(), "Length".into()),
                Matcher::UrlEncoded("aggregation".into(), "Average".into()),
                Matcher::UrlEncoded("$filter".into(), "EntityName eq 'q1'".into()),
            ]))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create_async()
            .await;

        let response = client_for(&server)
            .query(&request(Some("EntityName eq 'q1'")))
            .await
            .unwrap();

        mock.assert_async().await;
        let metrics = response.value.unwrap();
        let data = metrics[0].timeseries.as_ref().unwrap()[0].data.as_ref().unwrap();
        assert_eq!(data[0].average, Some(12.6));
    }

    #[tokio::test]
    async fn test_query_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", METRICS_PATH)
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("AuthorizationFailed")
            .create_async()
            .await;

        match client_for(&server).query(&request(None)).await {
            Err(QueryClientError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "AuthorizationFailed");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", METRICS_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        assert!(matches!(
            client_for(&server).query(&request(None)).await,
            Err(QueryClientError::Decode(_))
        ));
    }
}
