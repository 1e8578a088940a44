// Shared fixtures for unit tests

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::auth::UserSessionClaim;
use crate::config::{ConfigSnapshot, GatewayFile, SecurityConfig};

pub const JWT_SECRET: &str = "unit-test-signing-secret";
pub const EXAM_SECRET: &str = "exam-service-shared-secret";
pub const ADMIN_SECRET: &str = "admin-service-shared-secret";

pub const GATEWAY_YAML: &str = r#"
services:
  auth:
    base_url: "http://auth-service:8080"
  admin:
    base_url: "http://admin-service:8080"
    secret: "admin-service-shared-secret"
  exam:
    base_url: "http://exam-service:8080"
    secret: "exam-service-shared-secret"
routes:
  - { path: "/api/auth/*", service: auth, requires_auth: false }
  - { path: "/api/admin/auth/*", service: admin, requires_auth: false }
  - { path: "/api/admin/*", service: admin }
  - { path: "/api/exams/*", service: exam }
"#;

pub fn security() -> SecurityConfig {
    SecurityConfig {
        jwt_secret: JWT_SECRET.to_string(),
        jwt_leeway_secs: 0,
        enable_cors: false,
        cors_origins: Vec::new(),
        enable_request_logging: false,
    }
}

pub fn snapshot() -> ConfigSnapshot {
    let file = GatewayFile::from_yaml(GATEWAY_YAML).expect("fixture yaml parses");
    ConfigSnapshot::build(&file, &security(), |_| None, 1).expect("fixture snapshot builds")
}

/// HS256 token signed with `JWT_SECRET`, expiring `ttl_secs` from now (negative = already expired)
pub fn user_token(user_id: i64, role: &str, ttl_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let mut claim = UserSessionClaim::new(user_id, role, now + ttl_secs);
    claim.iat = Some(now);
    encode(&Header::default(), &claim, &EncodingKey::from_secret(JWT_SECRET.as_bytes()))
        .expect("token encodes")
}
