/*
This module is home to everything related to the cloud IoT platform the
relay publishes to.

Publishing is a two step affair: exchange the client credentials for a
short lived access token, then update the property of the target thing
with it. Tokens are requested fresh on every publish and never stored.
*/

mod config;
mod publish;
mod token;

pub use config::{ClientCredentials, CloudConfig, PropertyTarget};
pub use publish::{PublishError, publish_property};
pub use token::{AccessToken, AuthError, fetch_token};
