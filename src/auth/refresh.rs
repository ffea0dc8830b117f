use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config;

/// New opaque refresh token and its expiry
pub fn generate_refresh_token(now: DateTime<Utc>) -> (String, DateTime<Utc>) {
    let hours = config::config().security.refresh_token_expiry_hours;
    (Uuid::new_v4().to_string(), now + Duration::hours(hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_expire_after_configured_hours() {
        let now = Utc::now();
        let (a, expiry) = generate_refresh_token(now);
        let (b, _) = generate_refresh_token(now);
        assert_ne!(a, b);
        assert_eq!(expiry - now, Duration::hours(config::config().security.refresh_token_expiry_hours));
    }
}
