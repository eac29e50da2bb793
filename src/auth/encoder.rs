//! Mapping from an authentication variant to producer flags.

use std::path::Path;

use super::{AthenzAuth, AuthorizationConfig, BasicAuth, MtlsAuth, OAuth2Auth, OidcAuth};

/// Prefix every base64url-encoded JWT header starts with.
pub const JWT_PREFIX: &str = "eyJ";

/// Encode the active authentication variant as an ordered list of flag tokens.
///
/// Token paths are resolved against `base_dir`. Absent fields are omitted;
/// encoding never fails.
#[must_use]
pub fn encode_auth(auth: &AuthorizationConfig, base_dir: &Path) -> Vec<String> {
    let mut args = Vec::new();
    match auth {
        AuthorizationConfig::None => {}
        AuthorizationConfig::Oidc(oidc) => encode_oidc(&mut args, oidc, base_dir),
        AuthorizationConfig::Mtls(mtls) => encode_mtls(&mut args, mtls),
        AuthorizationConfig::Oauth2(oauth2) => encode_oauth2(&mut args, oauth2),
        AuthorizationConfig::Basic(basic) => encode_basic(&mut args, basic),
        AuthorizationConfig::Athenz(athenz) => encode_athenz(&mut args, athenz),
    }
    args
}

fn push_flag(args: &mut Vec<String>, flag: &str, value: Option<&String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        args.push(flag.to_string());
        args.push(value.clone());
    }
}

fn encode_oidc(args: &mut Vec<String>, oidc: &OidcAuth, base_dir: &Path) {
    if let Some(token) = oidc.token.as_deref().filter(|t| !t.is_empty()) {
        args.push("--jwt".to_string());
        args.push(resolve_token(token, base_dir));
    }
    if oidc.allow_unverified {
        args.push("--allow-unverified".to_string());
    }
}

fn encode_mtls(args: &mut Vec<String>, mtls: &MtlsAuth) {
    push_flag(args, "--mtls-cert", mtls.cert.as_ref());
    push_flag(args, "--mtls-key", mtls.key.as_ref());
    push_flag(args, "--mtls-ca-cert", mtls.ca_cert.as_ref());
}

fn encode_oauth2(args: &mut Vec<String>, oauth2: &OAuth2Auth) {
    push_flag(args, "--oauth2-issuer", oauth2.issuer.as_ref());
    push_flag(args, "--oauth2-private-key", oauth2.private_key.as_ref());
    push_flag(args, "--oauth2-audience", oauth2.audience.as_ref());
    push_flag(args, "--oauth2-client-id", oauth2.client_id.as_ref());
}

fn encode_basic(args: &mut Vec<String>, basic: &BasicAuth) {
    push_flag(args, "--username", basic.username.as_ref());
    push_flag(args, "--password", basic.password.as_ref());
}

fn encode_athenz(args: &mut Vec<String>, athenz: &AthenzAuth) {
    push_flag(args, "--athenz", athenz.url.as_ref());
    push_flag(args, "--athenz-domain", athenz.domain.as_ref());
    push_flag(args, "--athenz-tenant", athenz.tenant.as_ref());
    push_flag(args, "--athenz-service", athenz.service.as_ref());
    push_flag(args, "--athenz-private-key", athenz.private_key.as_ref());
    push_flag(args, "--athenz-key-id", athenz.key_id.as_ref());
    push_flag(args, "--athenz-ca-cert", athenz.ca_cert.as_ref());
    push_flag(args, "--athenz-proxy", athenz.proxy.as_ref());
}

/// Resolve token material to the JWT itself.
///
/// Anything that does not look like a JWT is treated as a file path relative
/// to `base_dir` and replaced by the trimmed file contents. An unreadable
/// file leaves the value untouched so the producer reports the failure.
#[must_use]
pub fn resolve_token(token: &str, base_dir: &Path) -> String {
    if token.starts_with(JWT_PREFIX) {
        return token.to_string();
    }

    let path = base_dir.join(token);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            tracing::debug!(path = %path.display(), "Loaded JWT from file");
            contents.trim().to_string()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read JWT file");
            token.to_string()
        }
    }
}
