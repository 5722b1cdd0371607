use axum::http::header::ToStrError;
use thiserror::Error;
use tracing::{debug, warn};

use relay_util::crypto::{constant_time_eq, sha256_hex_digest};
use relay_util::types::Secret;

use crate::event::InboundEvent;

/// Header carrying the carrier's message token.
pub const TOKEN_HEADER: &str = "things-message-token";

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("things-message-token header not found")]
    MissingToken,

    #[error("token mismatch, request is not authentic")]
    TokenMismatch,

    #[error("unreadable things-message-token header: {0}")]
    Malformed(#[from] ToStrError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The message token matched the body and shared secret
    Verified,

    /// No shared secret is configured, anyone may call us
    Skipped,
}

/// Compute the token the carrier attaches to a message: the lowercase hex
/// SHA-256 of the raw body immediately followed by the shared secret.
pub fn message_token(body: &str, secret: &Secret) -> String {
    sha256_hex_digest([body.as_bytes(), secret.expose().as_bytes()].concat())
}

/// Check that `event` was sent by the holder of `secret`.
///
/// Without a secret there is nothing to check against and the event is
/// accepted as is.
pub fn verify(event: &InboundEvent, secret: Option<&Secret>) -> Result<Verification, VerifyError> {
    let Some(secret) = secret else {
        warn!("no shared secret configured, skipping message verification");
        return Ok(Verification::Skipped);
    };

    let received = event
        .header(TOKEN_HEADER)
        .ok_or(VerifyError::MissingToken)?
        .to_str()?;

    let expected = message_token(&event.body, secret);
    if !constant_time_eq(expected.as_bytes(), received.as_bytes()) {
        return Err(VerifyError::TokenMismatch);
    }

    debug!("message verified");
    Ok(Verification::Verified)
}
