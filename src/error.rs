/*
 * Error type for fallible internal operations. Nothing in this crate lets an
 * error escape the public surface; callers of the engine see booleans and
 * `Option`s while these values are caught and logged at the boundary. The
 * internal steps (symbol resolution, import-slot patching, attribute
 * propagation) still report failures with enough context to diagnose from a
 * log.
 */
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ThemeError>;

#[derive(Error, Debug)]
pub enum ThemeError {
    /// A required module or entry point could not be resolved.
    #[error("Missing entry point: {0}")]
    MissingEntryPoint(String),

    /// The delay-load import slot targeted by the scroll-bar redirect was
    /// not present in the host module.
    #[error("Patch site unavailable: {0}")]
    PatchSiteUnavailable(String),

    /// An OS call failed in a way that leaves prior state intact.
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}
