use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{Span, debug, field, instrument};

use relay_util::http::{Auth, Client, ClientError, InvalidUriError, Uri};

use super::config::{CloudConfig, PropertyTarget};
use super::token::AccessToken;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Invalid property endpoint URI: {0}")]
    InvalidRemote(#[from] InvalidUriError),

    #[error("Publish request failed: {0}")]
    Request(#[from] ClientError),
}

#[derive(Serialize)]
struct PropertyValue<'a> {
    value: &'a Value,
}

/// Publish `value` as the current value of the target property.
#[instrument(
    skip_all,
    fields(
        thing = %target.thing_id,
        property = %target.property_id,
        result = field::Empty
    ),
    err
)]
pub async fn publish_property(
    config: &CloudConfig,
    token: &AccessToken,
    target: &PropertyTarget,
    value: &Value,
) -> Result<(), PublishError> {
    let client = Client::new(Some(config.timeout)).auth(Some(Auth::Bearer {
        token: token.as_str().to_owned(),
    }));
    let endpoint = Uri::from_segments(
        &config.api_endpoint,
        &[
            "iot",
            "v2",
            "things",
            target.thing_id.as_str(),
            "properties",
            target.property_id.as_str(),
            "publish",
        ],
    )?;

    debug!("publishing value {value}");
    let response = client.put(&endpoint, &PropertyValue { value }).await?;

    Span::current().record("result", field::display(response.status()));

    Ok(())
}
