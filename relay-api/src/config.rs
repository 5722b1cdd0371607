use std::borrow::Borrow;
use std::collections::HashMap;
use std::env;
use std::hash::Hash;

use thiserror::Error;
use tracing::debug;

use relay_cloud::{ClientCredentials, PropertyTarget};
use relay_util::types::Secret;

pub const CLIENT_ID_VAR: &str = "ARDUINO_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "ARDUINO_CLIENT_SECRET";
pub const THING_ID_VAR: &str = "ARDUINO_THING_ID";
pub const PROPERTY_ID_VAR: &str = "ARDUINO_PROPERTY_ID";
pub const SHARED_SECRET_VAR: &str = "KPN_SHARED_SECRET";

/// Where invocation settings are read from.
pub trait ConfigSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the running process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ConfigSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl<K, V> ConfigSource for HashMap<K, V>
where
    K: Borrow<str> + Hash + Eq + Send + Sync,
    V: AsRef<str> + Send + Sync,
{
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| value.as_ref().to_owned())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0}")]
    Missing(&'static str),
}

/// Everything an invocation needs to know about who it talks to
#[derive(Clone, Debug)]
pub struct Credentials {
    pub client: ClientCredentials,
    pub target: PropertyTarget,

    /// When unset, inbound messages are not verified
    pub shared_secret: Option<Secret>,
}

impl Credentials {
    /// Read credentials from `source`, failing on the first missing
    /// required key.
    pub fn load(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let required = |key: &'static str| source.var(key).ok_or(ConfigError::Missing(key));

        let client_id = required(CLIENT_ID_VAR)?;
        let client_secret = required(CLIENT_SECRET_VAR)?;
        let thing_id = required(THING_ID_VAR)?;
        let property_id = required(PROPERTY_ID_VAR)?;
        let shared_secret = source
            .var(SHARED_SECRET_VAR)
            .map(Secret::from)
            .filter(|secret| !secret.is_empty());

        debug!(
            client_id = %client_id,
            thing_id = %thing_id,
            property_id = %property_id,
            verify = shared_secret.is_some(),
            "loaded credentials"
        );

        Ok(Self {
            client: ClientCredentials {
                client_id,
                client_secret: client_secret.into(),
            },
            target: PropertyTarget {
                thing_id,
                property_id,
            },
            shared_secret,
        })
    }
}
