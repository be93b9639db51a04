use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use hyper::{Request, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use shared::types::ApiConfig;
use tracing::{debug, warn};

use super::transport::{ApiRequest, ApiResponse, Transport, TransportError};

/// HTTP/1 transport over hyper's pooled client.
#[derive(Clone, Debug)]
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
    timeout: Duration,
}

impl HyperTransport {
    /// `base_url` is the API root; a trailing `/` is added when missing.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = format!("{}/", base_url.into().trim_end_matches('/'));
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            client,
            base_url,
            timeout,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.resolved_base_url(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn uri_for(&self, request: &ApiRequest) -> Result<Uri, TransportError> {
        let url = format!("{}{}", self.base_url, request.path_and_query());
        let uri = url
            .parse::<Uri>()
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", url, e)))?;
        if uri.scheme_str() != Some("http") {
            return Err(TransportError::InvalidRequest(format!(
                "{}: only http:// is supported",
                url
            )));
        }
        Ok(uri)
    }

    fn build(&self, request: ApiRequest) -> Result<Request<Full<Bytes>>, TransportError> {
        let uri = self.uri_for(&request)?;
        let mut builder = Request::builder()
            .method(request.method.clone())
            .uri(uri)
            .header(ACCEPT, "application/json");

        if request.body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }

        if let Some(token) = &request.bearer {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| TransportError::InvalidRequest(format!("bearer token: {}", e)))?;
            builder = builder.header(AUTHORIZATION, value);
        }

        builder
            .body(Full::new(request.body.unwrap_or_default()))
            .map_err(|e: http::Error| TransportError::InvalidRequest(e.to_string()))
    }

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = request.method.clone();
        let target = request.path_and_query();
        let req = self.build(request)?;

        let exchange = async {
            let response = self
                .client
                .request(req)
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?
                .to_bytes();
            Ok::<_, TransportError>(ApiResponse { status, body })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => {
                debug!(
                    "{} {} -> {} ({} bytes)",
                    method,
                    target,
                    response.status.as_u16(),
                    response.body.len()
                );
                Ok(response)
            }
            Ok(Err(e)) => {
                warn!("{} {} failed: {}", method, target, e);
                Err(e)
            }
            Err(_) => {
                warn!("{} {} timed out after {:?}", method, target, self.timeout);
                Err(TransportError::Timeout(self.timeout))
            }
        }
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
        Box::pin(self.execute(request))
    }
}
