// Short-lived single-use sessions bridging the bot login to a web session
//
// A trusted bot backend creates a record after authenticating the user
// through its own channel; the web login redeems it exactly once within
// five minutes. Redemption is an atomic remove so two racing redeems of
// the same token cannot both succeed.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::crypto;

// Lifetime of an unredeemed handoff record
pub const HANDOFF_TTL_SECS: u64 = 300;

// Minimal profile carried from the bot's authentication to the web session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffIdentity {
    pub user_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HandoffRecord {
    pub identity: HandoffIdentity,
    pub created_at: u64,
    pub expires_at: u64,
}

#[derive(Debug, PartialEq)]
pub enum RedeemError {
    // never existed, or already redeemed; indistinguishable by design
    NotFound,
    Expired,
}

#[derive(Debug, PartialEq)]
pub enum HandoffError {
    Rng,
}

// Backing-store capability for handoff records. `take` must atomically
// remove and return the record; a separate lookup followed by a delete
// would let two concurrent redeems both observe the record. A store with
// native TTL support may make `purge_expired` a no-op and evict on
// `expires_at` itself.
pub trait HandoffBacking: Send + Sync {
    fn put(&self, token: String, record: HandoffRecord);
    fn take(&self, token: &str) -> Option<HandoffRecord>;
    fn contains(&self, token: &str) -> bool;
    fn purge_expired(&self, now: u64);
}

#[derive(Default)]
pub struct InMemoryBacking {
    records: DashMap<String, HandoffRecord>,
}

impl HandoffBacking for InMemoryBacking {
    fn put(&self, token: String, record: HandoffRecord) {
        self.records.insert(token, record);
    }

    fn take(&self, token: &str) -> Option<HandoffRecord> {
        self.records.remove(token).map(|(_, record)| record)
    }

    fn contains(&self, token: &str) -> bool {
        self.records.contains_key(token)
    }

    fn purge_expired(&self, now: u64) {
        self.records.retain(|_, record| now <= record.expires_at);
    }
}

pub struct HandoffStore {
    backing: Box<dyn HandoffBacking>,
}

impl HandoffStore {
    pub fn in_memory() -> Self {
        Self {
            backing: Box::new(InMemoryBacking::default()),
        }
    }

    pub fn with_backing(backing: Box<dyn HandoffBacking>) -> Self {
        Self { backing }
    }

    // Stores a pending identity under a fresh 256-bit opaque token and
    // sweeps records past their window while here.
    pub fn create(&self, identity: HandoffIdentity) -> Result<String, HandoffError> {
        self.create_at(identity, crypto::get_current_timestamp())
    }

    pub fn create_at(
        &self,
        identity: HandoffIdentity,
        now: u64,
    ) -> Result<String, HandoffError> {
        let token = crypto::generate_opaque_token().map_err(|_| HandoffError::Rng)?;
        self.backing.put(
            token.clone(),
            HandoffRecord {
                identity,
                created_at: now,
                expires_at: now + HANDOFF_TTL_SECS,
            },
        );
        self.backing.purge_expired(now);
        Ok(token)
    }

    // Single-use redemption: the record is removed whether it turns out
    // fresh or expired, so a token can never be presented twice.
    pub fn redeem(&self, token: &str) -> Result<HandoffIdentity, RedeemError> {
        self.redeem_at(token, crypto::get_current_timestamp())
    }

    pub fn redeem_at(&self, token: &str, now: u64) -> Result<HandoffIdentity, RedeemError> {
        let record = self.backing.take(token).ok_or(RedeemError::NotFound)?;
        if now > record.expires_at {
            return Err(RedeemError::Expired);
        }
        Ok(record.identity)
    }

    // Test/diagnostic visibility into the backing store
    pub fn contains(&self, token: &str) -> bool {
        self.backing.contains(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn identity(id: &str) -> HandoffIdentity {
        HandoffIdentity {
            user_id: id.to_string(),
            first_name: "Ada".to_string(),
            last_name: None,
            username: Some("ada".to_string()),
        }
    }

    #[test]
    fn create_then_redeem_returns_identity() {
        let store = HandoffStore::in_memory();
        let now = 1_700_000_000;
        let token = store.create_at(identity("42"), now).unwrap();
        assert_eq!(store.redeem_at(&token, now + 10), Ok(identity("42")));
    }

    #[test]
    fn redeem_is_single_use() {
        let store = HandoffStore::in_memory();
        let now = 1_700_000_000;
        let token = store.create_at(identity("42"), now).unwrap();
        assert!(store.redeem_at(&token, now).is_ok());
        assert_eq!(store.redeem_at(&token, now), Err(RedeemError::NotFound));
        assert_eq!(store.redeem_at(&token, now), Err(RedeemError::NotFound));
    }

    #[test]
    fn unknown_token_is_not_found() {
        let store = HandoffStore::in_memory();
        assert_eq!(
            store.redeem_at("deadbeef", 1_700_000_000),
            Err(RedeemError::NotFound)
        );
    }

    #[test]
    fn expired_record_is_purged_on_redeem() {
        let store = HandoffStore::in_memory();
        let now = 1_700_000_000;
        let token = store.create_at(identity("42"), now).unwrap();
        assert_eq!(
            store.redeem_at(&token, now + HANDOFF_TTL_SECS + 1),
            Err(RedeemError::Expired)
        );
        // the record is gone, not merely flagged
        assert!(!store.contains(&token));
        assert_eq!(
            store.redeem_at(&token, now + HANDOFF_TTL_SECS + 1),
            Err(RedeemError::NotFound)
        );
    }

    #[test]
    fn redeem_at_window_boundary_succeeds() {
        let store = HandoffStore::in_memory();
        let now = 1_700_000_000;
        let token = store.create_at(identity("42"), now).unwrap();
        assert!(store.redeem_at(&token, now + HANDOFF_TTL_SECS).is_ok());
    }

    #[test]
    fn create_sweeps_older_expired_records() {
        let store = HandoffStore::in_memory();
        let now = 1_700_000_000;
        let stale = store.create_at(identity("1"), now).unwrap();
        let later = now + HANDOFF_TTL_SECS + 60;
        let fresh = store.create_at(identity("2"), later).unwrap();
        assert!(!store.contains(&stale));
        assert!(store.contains(&fresh));
    }

    #[test]
    fn concurrent_redeems_yield_exactly_one_success() {
        let store = Arc::new(HandoffStore::in_memory());
        let now = 1_700_000_000;
        for _ in 0..50 {
            let token = store.create_at(identity("42"), now).unwrap();
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let store = store.clone();
                    let token = token.clone();
                    std::thread::spawn(move || store.redeem_at(&token, now).is_ok())
                })
                .collect();
            let successes = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|&ok| ok)
                .count();
            assert_eq!(successes, 1);
        }
    }
}
