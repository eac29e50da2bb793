//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::auth::AuthorizationConfig;
use crate::command::ProducerConfig;

/// Publisher configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Producer executable override.
    pub executable: Option<PathBuf>,
    /// Producer settings.
    pub producer: ProducerConfig,
    /// Authentication.
    pub auth: Option<AuthorizationConfig>,
    /// Deprecated spelling of `auth`.
    #[serde(skip_serializing)]
    pub authorization: Option<AuthorizationConfig>,
}

impl PublisherConfig {
    /// The effective authentication, preferring `auth` over the deprecated
    /// `authorization` table.
    #[must_use]
    pub fn effective_auth(&self) -> AuthorizationConfig {
        if self.authorization.is_some() {
            if self.auth.is_some() {
                tracing::warn!("Both `auth` and deprecated `authorization` set, using `auth`");
            } else {
                tracing::warn!("`authorization` is deprecated, use `auth`");
            }
        }
        self.auth
            .clone()
            .or_else(|| self.authorization.clone())
            .unwrap_or_default()
    }
}
