// Registered users, keyed by the provider's numeric id rendered as a
// string. First login creates the record; later logins reuse it.
//
// In-memory only: records do not survive a restart and do not replicate
// across instances. Swapping in a durable store is a deployment concern,
// not a contract change.

use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
    pub wallet_address: Option<String>,
    pub created_at: String,
}

// Profile fields as they arrive from a fresh login
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_url: Option<String>,
    pub wallet_address: Option<String>,
}

#[derive(Default)]
pub struct UserStore {
    users: DashMap<String, User>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|u| u.value().clone())
    }

    // Looks up the user, registering a new record on first sight.
    // Returns the record and whether it was just created. The entry API
    // keeps lookup-or-insert atomic under concurrent first logins.
    pub fn get_or_register(&self, profile: UserProfile) -> (User, bool) {
        match self.users.entry(profile.id.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let user = User {
                    id: profile.id,
                    username: profile.username,
                    first_name: profile.first_name,
                    last_name: profile.last_name,
                    photo_url: profile.photo_url,
                    wallet_address: profile.wallet_address,
                    created_at: Utc::now().to_rfc3339(),
                };
                entry.insert(user.clone());
                (user, true)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
