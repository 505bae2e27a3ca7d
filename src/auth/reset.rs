//! Single-use password reset tokens.
//!
//! Tokens live in process memory behind a mutex and are lost on restart. Each token
//! maps to the user it was issued for and an expiry instant. A reset first claims its
//! token, which marks the entry in flight so a concurrent reset with the same token is
//! refused, and removes it only once the new password is stored. A claim dropped
//! without [`ResetClaim::consume`] puts the token back for a retry.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

const TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTokenError {
    /// The token was never issued, was already used, is being redeemed by another
    /// request, or was purged after expiring.
    Unknown,
    /// The token exists but its expiry has passed. It is removed on this lookup.
    Expired,
}

impl fmt::Display for ResetTokenError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResetTokenError::Unknown => write!(f, "Invalid or expired token"),
            ResetTokenError::Expired => write!(f, "Token has expired"),
        }
    }
}

impl std::error::Error for ResetTokenError {}

#[derive(Debug, Clone, Copy)]
struct ResetEntry {
    user_id: i32,
    expires: DateTime<Utc>,
    in_flight: bool,
}

impl ResetEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

#[derive(Debug)]
pub struct ResetTokenStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, ResetEntry>>,
}

impl ResetTokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Mints a new token for `user_id`, valid until `now + ttl`.
    ///
    /// Expired entries are dropped first so abandoned tokens do not accumulate.
    pub fn issue(&self, user_id: i32, now: DateTime<Utc>) -> String {
        let mut entries = self.lock();
        entries.retain(|_, entry| !entry.is_expired(now));

        let token = loop {
            let candidate = random_token();
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        entries.insert(
            token.clone(),
            ResetEntry {
                user_id,
                expires: now + self.ttl,
                in_flight: false,
            },
        );
        token
    }

    /// Reserves `token` for a password change.
    ///
    /// An expired token is removed and reported as [`ResetTokenError::Expired`]. The
    /// returned claim must be consumed once the new password is persisted.
    pub fn claim(&self, token: &str, now: DateTime<Utc>) -> Result<ResetClaim<'_>, ResetTokenError> {
        let mut entries = self.lock();
        let entry = entries.get_mut(token).ok_or(ResetTokenError::Unknown)?;

        if entry.is_expired(now) {
            entries.remove(token);
            return Err(ResetTokenError::Expired);
        }
        if entry.in_flight {
            return Err(ResetTokenError::Unknown);
        }
        entry.in_flight = true;

        Ok(ResetClaim {
            store: self,
            token: token.to_string(),
            user_id: entry.user_id,
            consumed: false,
        })
    }

    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ResetEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// An in-flight reservation of a reset token.
#[derive(Debug)]
pub struct ResetClaim<'a> {
    store: &'a ResetTokenStore,
    token: String,
    user_id: i32,
    consumed: bool,
}

impl ResetClaim<'_> {
    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    /// Deletes the token for good.
    pub fn consume(mut self) {
        self.store.lock().remove(&self.token);
        self.consumed = true;
    }
}

impl Drop for ResetClaim<'_> {
    fn drop(&mut self) {
        if self.consumed {
            return;
        }
        if let Some(entry) = self.store.lock().get_mut(&self.token) {
            entry.in_flight = false;
        }
    }
}

fn random_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ResetTokenStore {
        ResetTokenStore::new(Duration::hours(1))
    }

    #[test]
    fn test_token_shape() {
        let store = store();
        let token = store.issue(1, Utc::now());
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, store.issue(1, Utc::now()));
    }

    #[test]
    fn test_consumed_token_is_single_use() {
        let store = store();
        let now = Utc::now();
        let token = store.issue(7, now);

        let claim = store.claim(&token, now).unwrap();
        assert_eq!(claim.user_id(), 7);
        claim.consume();

        assert_eq!(store.claim(&token, now).unwrap_err(), ResetTokenError::Unknown);
        assert!(store.is_empty());
    }

    #[test]
    fn test_dropped_claim_releases_token() {
        let store = store();
        let now = Utc::now();
        let token = store.issue(7, now);

        drop(store.claim(&token, now).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.claim(&token, now).unwrap().user_id(), 7);
    }

    #[test]
    fn test_token_in_flight_cannot_be_claimed_twice() {
        let store = store();
        let now = Utc::now();
        let token = store.issue(7, now);

        let first = store.claim(&token, now).unwrap();
        assert_eq!(store.claim(&token, now).unwrap_err(), ResetTokenError::Unknown);
        first.consume();
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_token_is_rejected_and_removed() {
        let store = store();
        let issued = Utc::now();
        let token = store.issue(7, issued);

        let later = issued + Duration::hours(1) + Duration::seconds(1);
        assert_eq!(store.claim(&token, later).unwrap_err(), ResetTokenError::Expired);
        assert_eq!(store.claim(&token, later).unwrap_err(), ResetTokenError::Unknown);
    }

    #[test]
    fn test_token_expires_at_exact_deadline() {
        let store = store();
        let issued = Utc::now();
        let token = store.issue(9, issued);
        let deadline = issued + Duration::hours(1);

        assert_eq!(store.purge_expired(deadline - Duration::seconds(1)), 0);
        assert_eq!(store.claim(&token, deadline).unwrap_err(), ResetTokenError::Expired);
        assert!(store.is_empty());
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let store = store();
        let issued = Utc::now();
        let token = store.issue(9, issued);

        let almost = issued + Duration::minutes(59);
        assert_eq!(store.claim(&token, almost).unwrap().user_id(), 9);
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(
            store().claim("does-not-exist", Utc::now()).unwrap_err(),
            ResetTokenError::Unknown
        );
    }

    #[test]
    fn test_issue_purges_expired_entries() {
        let store = store();
        let issued = Utc::now();
        store.issue(1, issued);
        store.issue(2, issued);
        assert_eq!(store.len(), 2);

        let later = issued + Duration::hours(2);
        store.issue(3, later);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let store = store();
        let issued = Utc::now();
        store.issue(1, issued);
        store.issue(2, issued + Duration::minutes(30));

        assert_eq!(store.purge_expired(issued + Duration::minutes(61)), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ResetTokenError::Unknown.to_string(), "Invalid or expired token");
        assert_eq!(ResetTokenError::Expired.to_string(), "Token has expired");
    }
}
