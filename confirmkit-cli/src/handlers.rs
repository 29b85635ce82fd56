//! Handlers available to processes created from the command line.

use confirmkit_core::{
    standard_status, HandlerModule, HandlerRegistry, HandlerResult, Outcome, Reply, StandardReply,
};
use tracing::info;

/// Module exporting [`ECHO_METHOD`].
pub const ECHO_MODULE: &str = "echo";
/// Replies with the stored argument once confirmed.
pub const ECHO_METHOD: &str = "reply";
/// Capability group exporting [`AUDIT_METHOD`].
pub const AUDIT_GROUP: &str = "audit";
/// Logs every attempt.
pub const AUDIT_METHOD: &str = "log";

/// Registry with the built-in `echo` module and `audit` group.
#[must_use]
pub fn builtin_registry() -> HandlerRegistry {
    HandlerRegistry::new()
        .with_module(
            ECHO_MODULE,
            HandlerModule::new().with(
                ECHO_METHOD,
                StandardReply::new(|argument: &str| Ok(argument.to_string())),
            ),
        )
        .with_group(AUDIT_GROUP, HandlerModule::new().with(AUDIT_METHOD, audit))
}

fn audit(outcome: Outcome, argument: &str) -> HandlerResult {
    info!(%outcome, argument, "confirmation attempt audited");
    Ok(Reply::new(
        standard_status(outcome),
        format!("{outcome}: {argument}"),
    ))
}
