use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identity carried by an end-user bearer token.
///
/// Derived per request from the token payload and never stored by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSessionClaim {
    #[serde(alias = "userId", alias = "UserId")]
    pub user_id: i64,
    #[serde(default, alias = "Role")]
    pub role: String,
    /// Expiry as unix seconds
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl UserSessionClaim {
    pub fn new(user_id: i64, role: impl Into<String>, exp: i64) -> Self {
        Self {
            user_id,
            role: role.into(),
            exp,
            iat: None,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// `now` and `leeway` are in seconds
    pub fn is_expired_at(&self, now: i64, leeway: u64) -> bool {
        let leeway = i64::try_from(leeway).unwrap_or(i64::MAX);
        self.exp.saturating_add(leeway) <= now
    }
}
