//! Backend error types.

use thiserror::Error;

use super::NativeId;

/// Errors raised by a native backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not bring up a device on this platform.
    #[error("backend initialization failed: {0}")]
    InitializationFailed(String),
    /// A native object could not be created.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// The id does not name a live native object.
    #[error("unknown native object {0}")]
    UnknownObject(NativeId),
    /// A call was made with arguments the backend cannot honour.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Reading pixels back from the GPU failed.
    #[error("readback failed: {0}")]
    ReadbackFailed(String),
    /// The device was lost or stopped responding.
    #[error("GPU device lost: {0}")]
    DeviceLost(String),
}
