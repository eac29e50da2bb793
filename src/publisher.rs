//! Public publish/test surface.
//!
//! A [`Publisher`] holds producer settings and the active authentication.
//! Every call builds a fresh argument vector and runs its own producer
//! process; nothing is shared between concurrent calls except those
//! read-only settings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::auth::{encode_auth, AthenzAuth, AuthorizationConfig};
use crate::command::{MessageOptions, Payload, ProducerConfig, PublishCommand};
use crate::config::PublisherConfig;
use crate::error::PublishError;
use crate::executable::{default_executable, ensure_executable, install_dir};
use crate::observer::ObserverBus;
use crate::session::{PendingResult, Session};

/// Publishes messages through the producer executable.
#[derive(Debug, Clone)]
pub struct Publisher {
    executable: PathBuf,
    base_dir: PathBuf,
    producer: ProducerConfig,
    auth: Arc<AuthorizationConfig>,
    observer: Option<ObserverBus>,
}

impl Publisher {
    /// Create a publisher using the default executable location.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::MissingExecutable` if the producer is not installed.
    pub fn new(producer: ProducerConfig) -> Result<Self, PublishError> {
        Self::with_executable(default_executable(), producer)
    }

    /// Create a publisher using the producer at `executable`.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::MissingExecutable` if `executable` does not exist.
    pub fn with_executable(
        executable: impl AsRef<Path>,
        producer: ProducerConfig,
    ) -> Result<Self, PublishError> {
        let executable = executable.as_ref().to_path_buf();
        ensure_executable(&executable)?;

        Ok(Self {
            executable,
            base_dir: install_dir().to_path_buf(),
            producer,
            auth: Arc::new(AuthorizationConfig::None),
            observer: None,
        })
    }

    /// Create a publisher from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::MissingExecutable` if the configured or default
    /// producer does not exist.
    pub fn from_config(config: &PublisherConfig) -> Result<Self, PublishError> {
        let executable = config
            .executable
            .clone()
            .unwrap_or_else(|| default_executable().to_path_buf());
        let mut publisher = Self::with_executable(executable, config.producer.clone())?;
        publisher.set_auth(config.effective_auth());
        Ok(publisher)
    }

    /// Re-broadcast producer records to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: ObserverBus) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Directory that relative token file paths are resolved against.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    #[must_use]
    pub fn producer(&self) -> &ProducerConfig {
        &self.producer
    }

    #[must_use]
    pub fn auth(&self) -> &AuthorizationConfig {
        &self.auth
    }

    #[must_use]
    pub fn observer(&self) -> Option<&ObserverBus> {
        self.observer.as_ref()
    }

    /// Replace the active authentication.
    pub fn set_auth(&mut self, auth: AuthorizationConfig) {
        tracing::debug!(from = self.auth.kind(), to = auth.kind(), "Authentication replaced");
        self.auth = Arc::new(auth);
    }

    /// Authenticate with a JWT, or a path to a file containing one.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if the token is blank.
    pub fn set_jwt(&mut self, token: &str, allow_unverified: bool) -> Result<(), PublishError> {
        self.set_auth(AuthorizationConfig::jwt(token, allow_unverified)?);
        Ok(())
    }

    /// Authenticate with mutual TLS.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if the certificate or key is blank.
    pub fn set_mtls(
        &mut self,
        cert: &str,
        key: &str,
        ca_cert: Option<&str>,
    ) -> Result<(), PublishError> {
        self.set_auth(AuthorizationConfig::mtls(cert, key, ca_cert)?);
        Ok(())
    }

    /// Authenticate with OAuth2 client credentials.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if the issuer or private key is blank.
    pub fn set_oauth2(
        &mut self,
        issuer: &str,
        private_key: &str,
        audience: Option<&str>,
        client_id: Option<&str>,
    ) -> Result<(), PublishError> {
        self.set_auth(AuthorizationConfig::oauth2(
            issuer,
            private_key,
            audience,
            client_id,
        )?);
        Ok(())
    }

    /// Authenticate with username and password.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if either value is blank.
    pub fn set_basic_auth(&mut self, username: &str, password: &str) -> Result<(), PublishError> {
        self.set_auth(AuthorizationConfig::basic(username, password)?);
        Ok(())
    }

    /// Authenticate with Athenz.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if the ZTS URL is blank.
    pub fn set_athenz(&mut self, auth: AthenzAuth) -> Result<(), PublishError> {
        self.set_auth(AuthorizationConfig::athenz(auth)?);
        Ok(())
    }

    /// Drop any configured authentication.
    pub fn clear_auth(&mut self) {
        self.set_auth(AuthorizationConfig::None);
    }

    /// Build the full command for a call.
    #[must_use]
    pub fn prepare(&self, command: PublishCommand, options: MessageOptions) -> PublishCommand {
        command
            .message_options(options)
            .producer(self.producer.clone())
            .auth_flags(encode_auth(&self.auth, &self.base_dir))
    }

    /// Publish `payload` to `target` and return the broker's message id.
    ///
    /// # Errors
    ///
    /// Returns `PublishError` if the producer is missing, fails to start,
    /// reports an error, or exits without a message id.
    pub async fn publish(
        &self,
        target: &str,
        payload: impl Into<Payload>,
        options: MessageOptions,
    ) -> Result<String, PublishError> {
        let command = self.prepare(PublishCommand::publish(target, payload), options);
        match self.run(command).await? {
            PendingResult::MessageId(id) => Ok(id),
            PendingResult::TestResult(_) => Err(PublishError::MissingResult),
        }
    }

    /// Probe connectivity to `target` without sending a message.
    ///
    /// Producer failures resolve to `false` rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `PublishError` if the producer is missing, fails to start, or
    /// exits cleanly without reporting a result.
    pub async fn test(&self, target: &str, options: MessageOptions) -> Result<bool, PublishError> {
        let command = self.prepare(PublishCommand::test(target), options);
        match self.run(command).await? {
            PendingResult::TestResult(ok) => Ok(ok),
            PendingResult::MessageId(_) => Err(PublishError::MissingResult),
        }
    }

    async fn run(&self, command: PublishCommand) -> Result<PendingResult, PublishError> {
        ensure_executable(&self.executable)?;

        let mut session = Session::new(&self.executable, command);
        if let Some(observer) = &self.observer {
            session = session.with_observer(observer.clone());
        }
        let result = session.run().await;
        tracing::debug!(state = ?session.state(), stats = ?session.stats(), "Session finished");
        result
    }
}
