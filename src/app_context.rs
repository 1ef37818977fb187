use crate::config_loader::{Config, Secrets};
use crate::models::handoff::HandoffStore;
use crate::models::user::UserStore;

pub struct AppContext {
    pub config: Config,
    pub secrets: Secrets,
    pub users: UserStore,
    pub handoff_sessions: HandoffStore,
}

impl AppContext {
    pub fn new(config: Config, secrets: Secrets) -> Self {
        Self {
            config,
            secrets,
            users: UserStore::new(),
            handoff_sessions: HandoffStore::in_memory(),
        }
    }
}
