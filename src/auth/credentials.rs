use std::collections::HashMap;
use std::fmt;

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::claims::UserSessionClaim;

/// Why a user token was refused. Never shown to clients verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,

    #[error("malformed token: {0}")]
    TokenMalformed(String),

    #[error("token signature does not verify")]
    TokenInvalidSignature,
}

/// Credential checks the auth classifier depends on.
///
/// Both checks are synchronous and side-effect free.
pub trait TokenVerifier: Send + Sync {
    fn validate_user_token(&self, token: &str) -> Result<UserSessionClaim, AuthError>;

    /// Returns false on any mismatch, including an unknown service name.
    fn validate_service_token(&self, token: &str, expected_service: &str) -> bool;
}

/// Per-service shared secrets, keyed by lowercase service name.
#[derive(Clone, Default)]
pub struct SecretTable {
    secrets: HashMap<String, String>,
}

impl SecretTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, service: &str, secret: impl Into<String>) {
        self.secrets.insert(service.to_ascii_lowercase(), secret.into());
    }

    pub fn get(&self, service: &str) -> Option<&str> {
        self.secrets
            .get(&service.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, service: &str) -> bool {
        self.get(service).is_some()
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

// Secret values stay out of logs and panics
impl fmt::Debug for SecretTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.secrets.keys().collect();
        names.sort();
        f.debug_struct("SecretTable").field("services", &names).finish()
    }
}

/// HS256 user-token verification plus shared-secret service-token checks.
#[derive(Clone)]
pub struct CredentialValidator {
    decoding_key: DecodingKey,
    leeway_secs: u64,
    secrets: SecretTable,
}

impl CredentialValidator {
    pub fn new(jwt_secret: &str, leeway_secs: u64, secrets: SecretTable) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            leeway_secs,
            secrets,
        }
    }

    pub fn secrets(&self) -> &SecretTable {
        &self.secrets
    }

    /// Validate against an explicit clock (unix seconds).
    ///
    /// Expiry is read from the unverified payload first, so an expired token
    /// is reported as `TokenExpired` whether or not its signature is valid.
    pub fn validate_user_token_at(&self, token: &str, now: i64) -> Result<UserSessionClaim, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::TokenMalformed(e.to_string()))?;

        let mut unverified = Validation::new(header.alg);
        unverified.insecure_disable_signature_validation();
        unverified.validate_exp = false;
        unverified.validate_aud = false;
        unverified.required_spec_claims.clear();

        let payload = decode::<UserSessionClaim>(token, &DecodingKey::from_secret(&[]), &unverified)
            .map_err(|e| AuthError::TokenMalformed(e.to_string()))?
            .claims;

        if payload.is_expired_at(now, self.leeway_secs) {
            return Err(AuthError::TokenExpired);
        }

        if header.alg != Algorithm::HS256 {
            return Err(AuthError::TokenMalformed(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }

        // exp was checked above against the caller's clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let verified = decode::<UserSessionClaim>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::TokenInvalidSignature,
                _ => AuthError::TokenMalformed(e.to_string()),
            }
        })?;

        Ok(verified.claims)
    }
}

impl TokenVerifier for CredentialValidator {
    fn validate_user_token(&self, token: &str) -> Result<UserSessionClaim, AuthError> {
        self.validate_user_token_at(token, chrono::Utc::now().timestamp())
    }

    fn validate_service_token(&self, token: &str, expected_service: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        match self.secrets.get(expected_service) {
            // Constant-time comparison to prevent timing attacks
            Some(secret) => bool::from(token.as_bytes().ct_eq(secret.as_bytes())),
            None => false,
        }
    }
}

impl fmt::Debug for CredentialValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialValidator")
            .field("leeway_secs", &self.leeway_secs)
            .field("secrets", &self.secrets)
            .finish_non_exhaustive()
    }
}
