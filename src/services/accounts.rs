use std::sync::Arc;
use tracing::info;

use crate::models::user::normalize_username;
use crate::store::{UserDirectory, UserError};

/// Username-only registration and login over a [`UserDirectory`].
#[derive(Clone)]
pub struct Accounts {
    directory: Arc<dyn UserDirectory>,
}

impl Accounts {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Returns the stored identity for a new username.
    pub async fn register(&self, raw: &str) -> Result<String, UserError> {
        let username = normalize_username(raw).ok_or_else(|| UserError::InvalidUsername(raw.to_string()))?;
        self.directory.register(&username).await?;
        info!("User {} registered", username);
        Ok(username)
    }

    pub async fn login(&self, raw: &str) -> Result<String, UserError> {
        let username = normalize_username(raw).ok_or_else(|| UserError::InvalidUsername(raw.to_string()))?;
        if !self.directory.exists(&username).await? {
            return Err(UserError::NotFound(username));
        }
        Ok(username)
    }
}
