use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Clone)]
pub struct Config {
    pub server: Server,
}

#[derive(Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

// Process-wide secrets, loaded once at startup and immutable thereafter.
// Rotating either secret invalidates everything signed under the old one.
#[derive(Clone)]
pub struct Secrets {
    // shared secret of the identity provider's bot, never sent to clients
    pub bot_token: String,
    // symmetric key for session token signatures
    pub jwt_secret: String,
    // gates the handoff-session creation endpoint; absent means the
    // endpoint rejects every request
    pub bot_api_key: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    MissingSecret(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "failed to load config file: {}", msg),
            ConfigError::Parse(msg) => write!(f, "failed to parse config file: {}", msg),
            ConfigError::MissingSecret(name) => {
                write!(f, "required secret {} is not set", name)
            }
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config_contents =
        fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
    let config: Config =
        toml::from_str(&config_contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(config)
}

// Secrets come from the environment and are validated here, at startup.
// There are no fallback values: a missing required secret is a hard
// startup failure, since a well-known default would let anyone forge
// signatures.
pub fn load_secrets() -> Result<Secrets, ConfigError> {
    let bot_token = require_env("TELEGRAM_BOT_TOKEN")?;
    let jwt_secret = require_env("JWT_SECRET")?;
    let bot_api_key = env::var("BOT_API_KEY").ok().filter(|v| !v.is_empty());
    Ok(Secrets {
        bot_token,
        jwt_secret,
        bot_api_key,
    })
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingSecret(name))
}
