use std::sync::{Arc, Mutex, MutexGuard};

use shared::types::{Tag, normalize_name};
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::gateway::RequestGateway;

/// Cached copy of the global tag list.
#[derive(Clone)]
pub struct TagDirectory {
    gateway: RequestGateway,
    tags: Arc<Mutex<Vec<Tag>>>,
}

impl TagDirectory {
    pub fn new(gateway: RequestGateway) -> Self {
        Self {
            gateway,
            tags: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the cache with the server's list.
    pub async fn refresh(&self) -> ClientResult<Vec<Tag>> {
        let tags = self.gateway.list_tags().await?;
        debug!("Loaded {} tags", tags.len());
        *self.cache() = tags.clone();
        Ok(tags)
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.cache().clone()
    }

    pub fn get(&self, id: i64) -> Option<Tag> {
        self.cache().iter().find(|t| t.id == id).cloned()
    }

    /// Cached tag with this name, ignoring case and surrounding spaces.
    pub fn find(&self, name: &str) -> Option<Tag> {
        self.cache().iter().find(|t| t.matches_name(name)).cloned()
    }

    /// The tag called `name`, creating it if the server does not have one.
    pub async fn ensure(&self, name: &str) -> ClientResult<Tag> {
        if normalize_name(name).is_empty() {
            return Err(ClientError::InvalidArgument(
                "tag name must not be empty".into(),
            ));
        }

        if let Some(tag) = self.find(name) {
            return Ok(tag);
        }
        self.refresh().await?;
        if let Some(tag) = self.find(name) {
            return Ok(tag);
        }

        let tag = self.gateway.create_tag(name).await?;
        info!("Created tag {:?}", tag.name);
        self.cache().push(tag.clone());
        Ok(tag)
    }

    fn cache(&self) -> MutexGuard<'_, Vec<Tag>> {
        self.tags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
