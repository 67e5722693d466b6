//! Rule parsing error types.

use thiserror::Error;

/// Errors raised while parsing rule declarations from configuration.
/// These are configuration errors: fatal before any run starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid pin rule '{0}': expected 'vm:host'")]
    InvalidPin(String),

    #[error("invalid {kind} rule '{rule}': needs at least two comma-separated names")]
    GroupTooSmall { kind: &'static str, rule: String },
}

pub type RuleResult<T> = Result<T, RuleError>;
