use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use relay_util::http::{Client, ClientError, InvalidUriError, Uri};

use super::config::{ClientCredentials, CloudConfig};

const TOKEN_PATH: &str = "/iot/v1/clients/token";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token endpoint URI: {0}")]
    InvalidRemote(#[from] InvalidUriError),

    #[error("Token request failed: {0}")]
    Request(#[from] ClientError),

    #[error("Failed to get access token from response")]
    MissingToken,
}

/// Bearer token handed out by the token endpoint.
#[derive(Clone)]
pub struct AccessToken {
    token: String,

    /// Lifetime declared by the server, informational only
    pub expires_in: Option<Duration>,
}

impl AccessToken {
    pub fn as_str(&self) -> &str {
        self.token.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"***")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/*
    request (form encoded) {
        grant_type: "client_credentials"
        client_id
        client_secret
        audience
    }
*/
#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

/*
    response {
        access_token,
        expires_in,
        token_type,
    }
*/
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

/// Exchange client credentials for an access token.
#[instrument(skip_all, fields(client_id = %credentials.client_id), err)]
pub async fn fetch_token(
    config: &CloudConfig,
    credentials: &ClientCredentials,
) -> Result<AccessToken, AuthError> {
    let client = Client::new(Some(config.timeout));
    let endpoint = Uri::from_parts(config.api_endpoint.clone(), TOKEN_PATH, None)?;

    let request = TokenRequest {
        grant_type: "client_credentials",
        client_id: &credentials.client_id,
        client_secret: credentials.client_secret.expose(),
        audience: &config.audience,
    };

    debug!("requesting access token");
    let response: TokenResponse = client.post_form(&endpoint, &request).await?;

    let token = response
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;
    let expires_in = response.expires_in.map(Duration::from_secs);

    debug!(expires_in = ?expires_in, "access token received");
    Ok(AccessToken { token, expires_in })
}
