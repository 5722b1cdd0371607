use std::str::Utf8Error;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, debug, error, field, info, instrument, warn};

use relay_cloud::{AuthError, CloudConfig, PublishError, fetch_token, publish_property};
use relay_webhook::{
    DEFAULT_MEASUREMENT, ExtractionError, InboundEvent, Measurement, VerifyError, extract, verify,
};

use crate::config::{ConfigError, ConfigSource, Credentials};

const SUCCESS_BODY: &str = r#""Successfully updated Arduino Cloud!""#;

/// Process wide settings, fixed at startup
#[derive(Clone, Debug)]
pub struct Settings {
    /// Name of the SenML record to relay
    pub measurement: String,
    pub cloud: CloudConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            measurement: DEFAULT_MEASUREMENT.to_owned(),
            cloud: CloudConfig::default(),
        }
    }
}

/// The one stage failure that ends an invocation
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Message verification failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("Request body is not valid UTF-8: {0}")]
    Body(#[from] Utf8Error),

    #[error("Could not parse sensor value: {0}")]
    Extract(#[from] ExtractionError),

    #[error("Failed to authenticate with Arduino Cloud: {0}")]
    Auth(#[from] AuthError),

    #[error("Failed during Arduino publish step: {0}")]
    Publish(#[from] PublishError),
}

impl InvocationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InvocationError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            InvocationError::Verify(VerifyError::Malformed(_)) => StatusCode::BAD_REQUEST,
            InvocationError::Verify(_) => StatusCode::UNAUTHORIZED,
            InvocationError::Body(_) | InvocationError::Extract(_) => StatusCode::BAD_REQUEST,
            InvocationError::Auth(_) | InvocationError::Publish(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// What the caller gets to see. Details stay in the logs.
    fn response_body(&self) -> String {
        match self {
            InvocationError::Config(err) => format!("Configuration error: {err}"),
            InvocationError::Verify(VerifyError::Malformed(_)) => {
                "Token verification failed.".to_owned()
            }
            InvocationError::Verify(_) => "Unauthorized".to_owned(),
            InvocationError::Body(_) | InvocationError::Extract(_) => {
                "Invalid request body format.".to_owned()
            }
            InvocationError::Auth(_) | InvocationError::Publish(_) => {
                "Arduino Cloud publish failed.".to_owned()
            }
        }
    }
}

/// Terminal result of an invocation, shaped like a serverless HTTP
/// response event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<InvocationError> for InvocationResponse {
    fn from(err: InvocationError) -> Self {
        Self {
            status_code: err.status_code().as_u16(),
            body: err.response_body(),
        }
    }
}

impl IntoResponse for InvocationResponse {
    fn into_response(self) -> Response {
        (self.status(), self.body).into_response()
    }
}

/// Run a single invocation for `event`.
///
/// Credentials are read from `source` on every call. Stages run in order
/// and the first failure decides the response; nothing is retried.
#[instrument(name = "invoke", skip_all, fields(status = field::Empty))]
pub async fn invoke(
    event: &InboundEvent,
    source: &dyn ConfigSource,
    settings: &Settings,
) -> InvocationResponse {
    debug!(headers = ?event.headers, body = %event.body, "received event");

    respond(relay(event, source, settings).await)
}

/// Answer an invocation whose body could not be decoded as text.
///
/// Configuration is still loaded first, a broken deployment reports as
/// such whatever the request looks like.
#[instrument(name = "invoke", skip_all, fields(status = field::Empty))]
pub(crate) fn reject_body(source: &dyn ConfigSource, err: Utf8Error) -> InvocationResponse {
    let err = match Credentials::load(source) {
        Ok(_) => InvocationError::Body(err),
        Err(config) => config.into(),
    };
    respond(Err(err))
}

fn respond(result: Result<Measurement, InvocationError>) -> InvocationResponse {
    let response = match result {
        Ok(measurement) => {
            info!(
                "published {} value {} to Arduino Cloud",
                measurement.name, measurement.value
            );
            InvocationResponse {
                status_code: StatusCode::OK.as_u16(),
                body: SUCCESS_BODY.to_owned(),
            }
        }
        Err(err) => {
            if err.status_code().is_server_error() {
                error!("{err}");
            } else {
                warn!("{err}");
            }
            err.into()
        }
    };

    Span::current().record("status", response.status_code);
    response
}

async fn relay(
    event: &InboundEvent,
    source: &dyn ConfigSource,
    settings: &Settings,
) -> Result<Measurement, InvocationError> {
    let credentials = Credentials::load(source)?;

    verify(event, credentials.shared_secret.as_ref())?;

    let measurement = extract(&event.body, &settings.measurement)?;
    info!("extracted {} value {}", measurement.name, measurement.value);

    let token = fetch_token(&settings.cloud, &credentials.client).await?;
    publish_property(
        &settings.cloud,
        &token,
        &credentials.target,
        &measurement.value,
    )
    .await?;

    Ok(measurement)
}
