pub mod crypto;
pub mod handoff;
pub mod telegram;
pub mod user;
