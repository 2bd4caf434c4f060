pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by configuration and lookup APIs.
///
/// The repair pipeline itself never fails on malformed diagram text; defects are reported
/// through [`crate::ValidationOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown diagram kind: {name}")]
    UnknownDiagramKind { name: String },

    #[error("Invalid repair options JSON: {message}")]
    InvalidOptionsJson { message: String },

    #[error("Invalid repair option `{field}`: {message}")]
    InvalidOption {
        field: &'static str,
        message: String,
    },
}
