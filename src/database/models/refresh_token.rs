use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::FromRow;

/// Refresh token row. `token` holds the SHA-256 digest of the value handed to
/// the client, never the value itself.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub token: String,
    pub expiry_date: DateTime<Utc>,
    pub customer_id: i64,
}

impl RefreshToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date < now
    }
}

/// Digest used to store and look up refresh tokens
pub fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_expiring(expiry_date: DateTime<Utc>) -> RefreshToken {
        RefreshToken { id: 1, token: digest_token("refreshtoken"), expiry_date, customer_id: 1 }
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let now = Utc::now();
        assert!(token_expiring(now - Duration::seconds(1)).is_expired_at(now));
        assert!(!token_expiring(now).is_expired_at(now));
        assert!(!token_expiring(now + Duration::hours(1)).is_expired_at(now));
    }

    #[test]
    fn digest_is_stable_hex() {
        let d = digest_token("refreshtoken");
        assert_eq!(d.len(), 64);
        assert_eq!(d, digest_token("refreshtoken"));
        assert_ne!(d, digest_token("refreshtoken2"));
    }
}
