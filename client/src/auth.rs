use shared::types::{AccessClaims, LoginData, RegistrationData, TokenPair, UserSummary};
use tracing::{info, warn};

use crate::error::{AuthError, ClientError, ClientResult};
use crate::gateway::RequestGateway;
use crate::gateway::endpoints::encode;
use crate::session::SessionStore;

const LOGIN_PATH: &str = "auth/token/";
const REGISTER_PATH: &str = "register/";

/// Login, logout and account creation.
#[derive(Clone)]
pub struct AuthService {
    gateway: RequestGateway,
}

impl AuthService {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    /// Exchange credentials for a token pair and establish the session.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<AccessClaims> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::InvalidArgument(
                "username and password are required".into(),
            ));
        }

        let request = encode(LOGIN_PATH, &LoginData::new(username.trim(), password))?;
        let pair: TokenPair = match self.gateway.call_anonymous(request).await {
            Ok(pair) => pair,
            Err(ClientError::AuthorizationExpired) => {
                warn!("Login rejected for {}", username.trim());
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let session = self.session().establish(pair.access, pair.refresh)?;
        info!(
            "Logged in as {} (role: {})",
            session.username(),
            session.claims().role()
        );
        Ok(session.claims().clone())
    }

    pub fn logout(&self) {
        self.session().clear();
    }

    /// Create an account. Field errors come back as `ClientError::Validation`.
    pub async fn register(&self, data: &RegistrationData) -> ClientResult<UserSummary> {
        let request = encode(REGISTER_PATH, data)?;
        let user: UserSummary = self.gateway.call_anonymous(request).await?;
        info!("Registered account {}", user.username);
        Ok(user)
    }

    pub fn current_user(&self) -> Option<AccessClaims> {
        self.session().claims()
    }
}
