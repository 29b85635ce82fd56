//! Mapping of engine results to HTTP-style status codes.
//!
//! Errors raised by the engine map to fixed statuses. Classified outcomes
//! are answered by the handler; [`StandardReply`] supplies the conventional
//! statuses for handlers that only act on success.

use crate::error::ConfirmError;
use crate::handler::{Handler, HandlerFault, HandlerResult, Reply};
use crate::outcome::Outcome;
use crate::validator::Confirmation;

/// `200 OK`
pub const STATUS_OK: u16 = 200;
/// `400 Bad Request`
pub const STATUS_BAD_REQUEST: u16 = 400;
/// `403 Forbidden`
pub const STATUS_FORBIDDEN: u16 = 403;
/// `404 Not Found`
pub const STATUS_NOT_FOUND: u16 = 404;
/// `410 Gone`
pub const STATUS_GONE: u16 = 410;
/// `500 Internal Server Error`
pub const STATUS_SERVER_ERROR: u16 = 500;

impl ConfirmError {
    /// Status the boundary answers with when the engine fails.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InputInvalid(_) => STATUS_BAD_REQUEST,
            Self::NotFound(_) => STATUS_NOT_FOUND,
            Self::HandlerUnresolved(_)
            | Self::PersistenceFailed(_)
            | Self::KeySpaceExhausted { .. }
            | Self::HandlerFault(_)
            | Self::EntropyUnavailable(_) => STATUS_SERVER_ERROR,
        }
    }
}

/// Status for the result of a confirmation request.
#[must_use]
pub fn status_for(result: &Result<Confirmation, ConfirmError>) -> u16 {
    match result {
        Ok(confirmation) => confirmation.reply.status,
        Err(err) => err.status_code(),
    }
}

/// Conventional status for an outcome.
#[must_use]
pub const fn standard_status(outcome: Outcome) -> u16 {
    match outcome {
        Outcome::Success | Outcome::Again => STATUS_OK,
        Outcome::InvalidHash => STATUS_FORBIDDEN,
        Outcome::Expired => STATUS_GONE,
        Outcome::CantUpdate => STATUS_SERVER_ERROR,
    }
}

/// Handler adapter that runs an action on success only and answers every
/// other outcome with [`standard_status`] and a fixed message.
pub struct StandardReply<F> {
    action: F,
}

impl<F> StandardReply<F>
where
    F: Fn(&str) -> Result<String, HandlerFault> + Send + Sync,
{
    /// Wraps `action`, which receives the argument and returns the body.
    #[must_use]
    pub const fn new(action: F) -> Self {
        Self { action }
    }
}

impl<F> Handler for StandardReply<F>
where
    F: Fn(&str) -> Result<String, HandlerFault> + Send + Sync,
{
    fn invoke(&self, outcome: Outcome, argument: &str) -> HandlerResult {
        let status = standard_status(outcome);
        let body = match outcome {
            Outcome::Success => (self.action)(argument)?,
            Outcome::Again => "already confirmed".to_string(),
            Outcome::InvalidHash => "invalid confirmation link".to_string(),
            Outcome::Expired => "confirmation expired".to_string(),
            Outcome::CantUpdate => "confirmation could not be recorded".to_string(),
        };
        Ok(Reply::new(status, body))
    }
}
