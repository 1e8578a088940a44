// Credential validation and request classification.
//
// The gateway only verifies credentials. User tokens are issued by the
// Auth Service; service secrets come from the route/secret file.

pub mod claims;
pub mod classifier;
pub mod credentials;

pub use claims::UserSessionClaim;
pub use classifier::{classify, AuthOutcome, Rejection};
pub use credentials::{AuthError, CredentialValidator, SecretTable, TokenVerifier};
