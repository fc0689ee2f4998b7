use std::time::Duration;

/// Convenience result type used across meshgrad.
pub type ExportResult<T> = Result<T, ExportError>;

/// Closed error taxonomy for the export pipeline.
///
/// Every failure path in the pipeline converges on one of these variants; callers map them
/// to user-facing messages themselves.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// An export parameter or template failed validation. Caught before any resource is
    /// allocated; the input must be corrected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The frame renderer produced no image for a frame.
    #[error("frame rendering failed")]
    FrameRenderingFailed,

    /// The encoder rejected its video input during session setup.
    #[error("failed to add encoder input: {0}")]
    FailedToAddInput(String),

    /// The encoder process/session could not be started.
    #[error("failed to start writing: {0}")]
    FailedToStartWriting(String),

    /// The encoder session has no pixel buffer pool available.
    #[error("pixel buffer pool creation failed")]
    PixelBufferPoolCreationFailed,

    /// A pixel buffer could not be drawn from the pool.
    #[error("pixel buffer creation failed")]
    PixelBufferCreationFailed,

    /// The encoder refused an appended frame. Terminal: encoding is not idempotent per
    /// frame, so appends are never retried.
    #[error("failed to append pixel buffer")]
    FailedToAppendPixelBuffer,

    /// The encoder reported an error while finalizing the container.
    #[error("encoder finalization failed: {0}")]
    Finalization(String),

    /// The export exceeded its configured timeout and was aborted.
    #[error("video export timed out after {0:?}")]
    TimedOut(Duration),

    /// The export was cancelled by the caller.
    #[error("video export cancelled")]
    Cancelled,

    /// The encoder claimed success but no file exists at the output path.
    #[error("output file is not accessible")]
    FileNotAccessible,

    /// No usable codec backend is available on this host.
    #[error("unsupported output format (no codec backend available)")]
    UnsupportedFormat,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExportError {
    /// Build an [`ExportError::InvalidConfiguration`] value.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Build an [`ExportError::FailedToStartWriting`] value.
    pub fn failed_to_start_writing(msg: impl Into<String>) -> Self {
        Self::FailedToStartWriting(msg.into())
    }

    /// Build an [`ExportError::Finalization`] value.
    pub fn finalization(msg: impl Into<String>) -> Self {
        Self::Finalization(msg.into())
    }
}
