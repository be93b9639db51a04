use std::sync::Arc;

use shared::types::{AccessClaims, ClientConfig};

use crate::auth::AuthService;
use crate::board::BoardSyncEngine;
use crate::gateway::{HyperTransport, RequestGateway, Transport};
use crate::query::ListQueryEngine;
use crate::session::{FileCredentialStore, SessionStore};
use crate::tags::TagDirectory;

/// Every service wired to one session and one transport.
#[derive(Clone)]
pub struct FeedbackClient {
    config: ClientConfig,
    gateway: RequestGateway,
    auth: AuthService,
    board: BoardSyncEngine,
    tags: TagDirectory,
}

impl FeedbackClient {
    /// HTTP transport and a file-backed session, as configured.
    pub fn from_config(config: ClientConfig) -> Self {
        let transport = Arc::new(HyperTransport::from_config(&config.api));
        let session = SessionStore::new(Arc::new(FileCredentialStore::new(
            config.session.store_path.clone(),
        )));
        Self::with_parts(config, transport, session)
    }

    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: SessionStore,
    ) -> Self {
        let gateway = RequestGateway::new(transport, session);
        Self {
            auth: AuthService::new(gateway.clone()),
            board: BoardSyncEngine::from_config(gateway.clone(), &config.sync),
            tags: TagDirectory::new(gateway.clone()),
            gateway,
            config,
        }
    }

    /// Restore the persisted session, if there is a usable one.
    pub fn hydrate(&self) -> Option<AccessClaims> {
        self.gateway.session().hydrate()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        self.gateway.session()
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn board(&self) -> &BoardSyncEngine {
        &self.board
    }

    pub fn tags(&self) -> &TagDirectory {
        &self.tags
    }

    /// A fresh table view using the configured page size.
    pub fn table(&self) -> ListQueryEngine {
        ListQueryEngine::from_config(self.gateway.clone(), &self.config.sync)
    }
}
