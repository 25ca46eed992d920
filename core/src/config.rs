//! Client configuration and its defaults.

use std::env;

/// Version of the provider's JSON API the default base URL points at.
pub const API_VERSION: &str = "1.3";

/// Default endpoint: `https://cp.pushwoosh.com/json/<API_VERSION>/`.
pub const DEFAULT_BASE_URL: &str = "https://cp.pushwoosh.com/json/1.3/";

/// Default `User-Agent`: `pushwoosh-rs/<crate version>`.
pub const DEFAULT_USER_AGENT: &str = concat!("pushwoosh-rs/", env!("CARGO_PKG_VERSION"));

/// Settings a `Client` is built from.
///
/// `auth_token` is carried for API calls that need it; none of the device
/// operations send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub application: String,
    pub auth_token: String,
    pub base_url: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            application: String::new(),
            auth_token: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            ..Self::default()
        }
    }

    /// Read `PUSHWOOSH_APPLICATION`, `PUSHWOOSH_AUTH_TOKEN`,
    /// `PUSHWOOSH_BASE_URL` and `PUSHWOOSH_USER_AGENT`, falling back to the
    /// defaults for unset variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            application: lookup("PUSHWOOSH_APPLICATION").unwrap_or(defaults.application),
            auth_token: lookup("PUSHWOOSH_AUTH_TOKEN").unwrap_or(defaults.auth_token),
            base_url: lookup("PUSHWOOSH_BASE_URL").unwrap_or(defaults.base_url),
            user_agent: lookup("PUSHWOOSH_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}
