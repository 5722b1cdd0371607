/*
Everything about the inbound side of the relay: the trigger event handed to
us by the carrier network, checking that it really came from there, and
pulling the measurement we care about out of its SenML body.
*/

mod auth;
mod event;
mod senml;

pub use auth::{TOKEN_HEADER, Verification, VerifyError, message_token, verify};
pub use event::InboundEvent;
pub use senml::{DEFAULT_MEASUREMENT, ExtractionError, Measurement, Record, extract};
