//! Context and resource error types.

use thiserror::Error;

use crate::backend::BackendError;
use crate::shader::ShaderStage;
use crate::types::BackendKind;

/// No backend in the priority list could be initialized.
///
/// This is the representable "render on the CPU instead" outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("no rendering backend available (tried: {})", format_attempts(.attempts))]
    Unavailable {
        /// Every backend tried, in order, with the reason it failed.
        attempts: Vec<(BackendKind, BackendError)>,
    },
    #[error("invalid context size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

fn format_attempts(attempts: &[(BackendKind, BackendError)]) -> String {
    if attempts.is_empty() {
        return "nothing".to_string();
    }
    attempts
        .iter()
        .map(|(kind, error)| format!("{kind}: {error}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a resource could not be created or used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("the device context has no active backend")]
    InvalidContext,
    #[error("handle belongs to another device context")]
    ForeignHandle,
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program failed to link: {0}")]
    Link(String),
    #[error("buffer data is empty")]
    EmptyBuffer,
    #[error("buffer holds {0} floats, not a whole number of vertices")]
    PartialVertex(usize),
    #[error("texture size {width}x{height} is outside 1..={max}")]
    InvalidTextureSize { width: u32, height: u32, max: u32 },
    #[error("pixel data is {actual} bytes, expected {expected}")]
    PixelDataLength { expected: usize, actual: usize },
    #[error("no {0} bound")]
    NothingBound(&'static str),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
