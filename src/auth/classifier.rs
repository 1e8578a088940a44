// Auth classification
//
// Unclassified -> { Anonymous, User, Service, Rejected }
//
// 1. route does not require auth        -> Anonymous (header ignored)
// 2. no Authorization header            -> Rejected(MissingCredential)
// 3. "Bearer " prefix                   -> user token check -> User | Rejected
// 4. anything else                      -> service token check against the
//                                          route's owning service -> Service | Rejected

use crate::error::GatewayError;

use super::claims::UserSessionClaim;
use super::credentials::{AuthError, TokenVerifier};

const BEARER_PREFIX: &str = "Bearer ";

/// Why classification refused a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingCredential,
    InvalidUserToken(AuthError),
    InvalidServiceToken { service: String },
}

impl From<Rejection> for GatewayError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::MissingCredential => GatewayError::MissingCredential,
            Rejection::InvalidUserToken(err) => GatewayError::InvalidUserToken(err),
            Rejection::InvalidServiceToken { service } => GatewayError::InvalidServiceToken { service },
        }
    }
}

/// Result of classifying one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Anonymous,
    User(UserSessionClaim),
    Service(String),
    Rejected(Rejection),
}

impl AuthOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthOutcome::Anonymous => "anonymous",
            AuthOutcome::User(_) => "user",
            AuthOutcome::Service(_) => "service",
            AuthOutcome::Rejected(_) => "rejected",
        }
    }
}

/// Classify a request for a route owned by `service`.
///
/// `authorization` is the raw header value. Routes with `requires_auth = false`
/// never look at it.
pub fn classify<V>(requires_auth: bool, service: &str, authorization: Option<&str>, verifier: &V) -> AuthOutcome
where
    V: TokenVerifier + ?Sized,
{
    if !requires_auth {
        return AuthOutcome::Anonymous;
    }

    let header = match authorization {
        Some(value) => value,
        None => return AuthOutcome::Rejected(Rejection::MissingCredential),
    };

    if let Some(token) = header.strip_prefix(BEARER_PREFIX) {
        return match verifier.validate_user_token(token.trim()) {
            Ok(claim) => AuthOutcome::User(claim),
            Err(err) => AuthOutcome::Rejected(Rejection::InvalidUserToken(err)),
        };
    }

    if verifier.validate_service_token(header, service) {
        AuthOutcome::Service(service.to_string())
    } else {
        AuthOutcome::Rejected(Rejection::InvalidServiceToken {
            service: service.to_string(),
        })
    }
}
