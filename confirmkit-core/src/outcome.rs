//! Outcome flags delivered to handlers.

use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};

/// How a confirmation attempt concluded.
///
/// Every classified attempt is delivered to the handler, which decides what
/// the requester sees.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Outcome {
    /// The token matched and the confirmation was recorded.
    Success,
    /// The confirmation had already succeeded before this attempt.
    Again,
    /// The supplied token hash does not match the stored token.
    InvalidHash,
    /// The token matched but the confirmation expired.
    Expired,
    /// The token matched but recording the confirmation failed.
    CantUpdate,
}

impl Outcome {
    /// Returns `true` only for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}
