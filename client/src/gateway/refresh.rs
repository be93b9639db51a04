use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use shared::types::{ErrorResponse, RefreshRequest, RefreshResponse};
use tracing::{debug, info, warn};

use super::transport::{ApiRequest, Transport};
use crate::error::AuthError;
use crate::session::SessionStore;

pub(crate) const REFRESH_PATH: &str = "auth/token/refresh/";

type RefreshFuture = Shared<BoxFuture<'static, Result<String, AuthError>>>;

struct InFlight {
    /// Refresh credential this flight was started with; identifies the
    /// session it belongs to.
    refresh_token: String,
    future: RefreshFuture,
}

/// Single-flight registry for token refreshes.
///
/// Every request that hits a 401 asks for an access token newer than the one
/// it was sent with. The first caller starts the refresh; callers arriving
/// while it runs await the same shared future; callers arriving after it
/// finished see the new token in the session and skip refreshing entirely.
#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    inflight: Mutex<Option<InFlight>>,
}

impl RefreshCoordinator {
    pub(crate) async fn refreshed_access(
        &self,
        transport: Arc<dyn Transport>,
        session: SessionStore,
        stale_access: &str,
    ) -> Result<String, AuthError> {
        let future = {
            let mut slot = self.slot();

            let current = session.current().ok_or(AuthError::NoRefreshCredential)?;
            if current.access() != stale_access {
                debug!("Access token already refreshed; reusing it");
                return Ok(current.access().to_string());
            }

            match slot.as_ref() {
                Some(flight) if flight.refresh_token == current.refresh() => {
                    debug!("Joining in-flight token refresh");
                    flight.future.clone()
                }
                _ => {
                    let refresh_token = current.refresh().to_string();
                    let future =
                        run_refresh(transport, session.clone(), refresh_token.clone())
                            .boxed()
                            .shared();
                    *slot = Some(InFlight {
                        refresh_token,
                        future: future.clone(),
                    });
                    future
                }
            }
        };

        let outcome = future.clone().await;

        let mut slot = self.slot();
        if slot
            .as_ref()
            .is_some_and(|flight| flight.future.ptr_eq(&future))
        {
            *slot = None;
        }

        outcome
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<InFlight>> {
        self.inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exchange the refresh credential for a new access token and install it.
/// On failure the session is torn down exactly once, here, and only if it is
/// still the one the refresh was started for.
async fn run_refresh(
    transport: Arc<dyn Transport>,
    session: SessionStore,
    refresh_token: String,
) -> Result<String, AuthError> {
    info!("Refreshing access token");

    let outcome = exchange(transport.as_ref(), &session, &refresh_token).await;

    match &outcome {
        Ok(_) => info!("Access token refreshed"),
        Err(AuthError::SessionChanged) => debug!("Refresh outlived its session"),
        Err(e) => {
            warn!("Token refresh failed: {}", e);
            session.force_login_if_current(&refresh_token, e.to_string());
        }
    }

    outcome
}

async fn exchange(
    transport: &dyn Transport,
    session: &SessionStore,
    refresh_token: &str,
) -> Result<String, AuthError> {
    let body = RefreshRequest {
        refresh: refresh_token.to_string(),
    };
    let request = ApiRequest::post(REFRESH_PATH, &body)
        .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

    let response = transport
        .send(request)
        .await
        .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

    if !response.status.is_success() {
        let message = ErrorResponse::from_body(&response.body).message();
        return Err(AuthError::RefreshRejected {
            status: response.status.as_u16(),
            message: if message.is_empty() {
                response
                    .status
                    .canonical_reason()
                    .unwrap_or("refresh rejected")
                    .to_string()
            } else {
                message
            },
        });
    }

    let refreshed: RefreshResponse = response
        .json()
        .map_err(|e| AuthError::RefreshFailed(format!("malformed refresh response: {}", e)))?;

    // The refresh credential is kept verbatim even if the server rotated it.
    let installed = session.establish_if_current(refresh_token, refreshed.access)?;
    Ok(installed.access().to_string())
}
