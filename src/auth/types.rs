//! Authentication variants accepted by the producer executable.

use serde::{Deserialize, Serialize};

use crate::error::PublishError;

/// The active authentication method.
///
/// Exactly one variant is active at a time. Setting a new variant replaces the
/// previous value entirely, so fields never leak across variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthorizationConfig {
    #[default]
    None,
    Oidc(OidcAuth),
    Mtls(MtlsAuth),
    Oauth2(OAuth2Auth),
    Basic(BasicAuth),
    Athenz(AthenzAuth),
}

/// Bearer token authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcAuth {
    /// Raw JWT, or a path to a file containing one.
    pub token: Option<String>,
    /// Skip signature verification on the broker side.
    #[serde(default)]
    pub allow_unverified: bool,
}

/// Mutual TLS authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtlsAuth {
    pub cert: Option<String>,
    pub key: Option<String>,
    pub ca_cert: Option<String>,
}

/// OAuth2 client-credentials authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "OAuth2Fields")]
pub struct OAuth2Auth {
    pub issuer: Option<String>,
    pub private_key: Option<String>,
    pub audience: Option<String>,
    pub client_id: Option<String>,
}

/// Wire shape of [`OAuth2Auth`], accepting the deprecated `clientID` spelling.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OAuth2Fields {
    issuer: Option<String>,
    private_key: Option<String>,
    audience: Option<String>,
    client_id: Option<String>,
    #[serde(rename = "clientID")]
    legacy_client_id: Option<String>,
}

impl From<OAuth2Fields> for OAuth2Auth {
    fn from(fields: OAuth2Fields) -> Self {
        if fields.legacy_client_id.is_some() {
            tracing::warn!("oauth2 `clientID` is deprecated, use `clientId`");
        }
        Self {
            issuer: fields.issuer,
            private_key: fields.private_key,
            audience: fields.audience,
            client_id: fields.client_id.or(fields.legacy_client_id),
        }
    }
}

/// Username/password authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Athenz authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthenzAuth {
    /// ZTS server URL.
    pub url: Option<String>,
    pub domain: Option<String>,
    pub tenant: Option<String>,
    pub service: Option<String>,
    pub private_key: Option<String>,
    pub key_id: Option<String>,
    pub ca_cert: Option<String>,
    pub proxy: Option<String>,
}

fn require(field: &str, value: &str) -> Result<String, PublishError> {
    if value.trim().is_empty() {
        return Err(PublishError::InvalidAuthInput(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

impl AuthorizationConfig {
    /// Build an OIDC variant from a JWT or a token file path.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if the token is blank.
    pub fn jwt(token: &str, allow_unverified: bool) -> Result<Self, PublishError> {
        Ok(Self::Oidc(OidcAuth {
            token: Some(require("token", token)?),
            allow_unverified,
        }))
    }

    /// Build an mTLS variant.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if the certificate or key path is blank.
    pub fn mtls(cert: &str, key: &str, ca_cert: Option<&str>) -> Result<Self, PublishError> {
        Ok(Self::Mtls(MtlsAuth {
            cert: Some(require("cert", cert)?),
            key: Some(require("key", key)?),
            ca_cert: optional(ca_cert),
        }))
    }

    /// Build an OAuth2 variant.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if the issuer or private key is blank.
    pub fn oauth2(
        issuer: &str,
        private_key: &str,
        audience: Option<&str>,
        client_id: Option<&str>,
    ) -> Result<Self, PublishError> {
        Ok(Self::Oauth2(OAuth2Auth {
            issuer: Some(require("issuer", issuer)?),
            private_key: Some(require("privateKey", private_key)?),
            audience: optional(audience),
            client_id: optional(client_id),
        }))
    }

    /// Build a basic-auth variant.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if the username or password is blank.
    pub fn basic(username: &str, password: &str) -> Result<Self, PublishError> {
        Ok(Self::Basic(BasicAuth {
            username: Some(require("username", username)?),
            password: Some(require("password", password)?),
        }))
    }

    /// Build an Athenz variant.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::InvalidAuthInput` if the ZTS URL is blank.
    pub fn athenz(auth: AthenzAuth) -> Result<Self, PublishError> {
        require("url", auth.url.as_deref().unwrap_or_default())?;
        Ok(Self::Athenz(auth))
    }

    /// Short name of the active variant, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Oidc(_) => "oidc",
            Self::Mtls(_) => "mtls",
            Self::Oauth2(_) => "oauth2",
            Self::Basic(_) => "basic",
            Self::Athenz(_) => "athenz",
        }
    }
}
