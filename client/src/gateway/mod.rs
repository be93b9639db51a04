pub mod endpoints;
pub mod hyper_transport;
mod refresh;
pub mod transport;

pub use hyper_transport::HyperTransport;
pub use transport::{ApiRequest, ApiResponse, Transport, TransportError};

use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use self::refresh::RefreshCoordinator;
use crate::error::{AuthError, ClientError, ClientResult};
use crate::session::SessionStore;

/// Every outbound call goes through here.
///
/// Requests carry the current access token. A 401 triggers one refresh
/// (shared with every other request that hit a 401 for the same session)
/// and exactly one retry; a second 401 is returned to the caller.
#[derive(Clone)]
pub struct RequestGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    refresh: RefreshCoordinator,
}

impl RequestGateway {
    pub fn new(transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                transport,
                session,
                refresh: RefreshCoordinator::default(),
            }),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Send with credentials, refreshing and retrying once on 401.
    pub async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let bearer = self.inner.session.access_token();
        let first = self
            .dispatch(request.clone().with_bearer(bearer.clone()))
            .await?;

        if first.status != StatusCode::UNAUTHORIZED {
            return check(first);
        }

        let Some(sent_with) = bearer else {
            debug!("401 on {} without a session", request.path);
            return Err(ClientError::AuthorizationExpired);
        };

        let fresh = match self
            .inner
            .refresh
            .refreshed_access(
                self.inner.transport.clone(),
                self.inner.session.clone(),
                &sent_with,
            )
            .await
        {
            Ok(token) => token,
            Err(AuthError::NoRefreshCredential | AuthError::SessionChanged) => {
                return Err(ClientError::AuthorizationExpired);
            }
            Err(e) => return Err(ClientError::Auth(e)),
        };

        let path = request.path.clone();
        debug!("Retrying {} {} with refreshed token", request.method, path);
        let retried = self.dispatch(request.with_bearer(Some(fresh))).await?;
        if retried.status == StatusCode::UNAUTHORIZED {
            warn!("{} still unauthorized after refresh", path);
            return Err(ClientError::AuthorizationExpired);
        }
        check(retried)
    }

    /// Send without credentials (login, registration).
    pub async fn send_anonymous(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let response = self.dispatch(request.with_bearer(None)).await?;
        check(response)
    }

    /// `send` and decode the body into `T`.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let endpoint = format!("{} {}", request.method, request.path);
        let response = self.send(request).await?;
        decode(&endpoint, &response)
    }

    /// `send_anonymous` and decode the body into `T`.
    pub async fn call_anonymous<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> ClientResult<T> {
        let endpoint = format!("{} {}", request.method, request.path);
        let response = self.send_anonymous(request).await?;
        decode(&endpoint, &response)
    }

    async fn dispatch(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        Ok(self.inner.transport.send(request).await?)
    }
}

fn check(response: ApiResponse) -> ClientResult<ApiResponse> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::from_status(response.status, &response.body))
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, response: &ApiResponse) -> ClientResult<T> {
    response.json().map_err(|e| {
        warn!("Malformed response from {}: {}", endpoint, e);
        ClientError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    })
}
