/// Convenience result type used across PaperCut.
pub type PapercutResult<T> = Result<T, PapercutError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Every error is reported at the operation boundary; an operation that fails leaves the project
/// and editor state exactly as they were before the call.
#[derive(thiserror::Error, Debug)]
pub enum PapercutError {
    /// Image bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A lasso polygon with fewer than three points.
    #[error("invalid polygon: need at least 3 points, got {0}")]
    InvalidPolygon(usize),

    /// The host lacks a capability the operation needs (e.g. a video recorder).
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// The project store cannot be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The project store holds no saved project.
    #[error("no saved project found")]
    NoSavedProject,

    /// The camera collaborator could not supply a still.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    /// Invalid user-provided data (indices, settings, dimensions).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while rasterizing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while encoding an export artifact.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing the project document.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PapercutError {
    /// Build a [`PapercutError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`PapercutError::UnsupportedEnvironment`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedEnvironment(msg.into())
    }

    /// Build a [`PapercutError::StorageUnavailable`] value.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Build a [`PapercutError::CameraUnavailable`] value.
    pub fn camera(msg: impl Into<String>) -> Self {
        Self::CameraUnavailable(msg.into())
    }

    /// Build a [`PapercutError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PapercutError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PapercutError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`PapercutError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error should be surfaced to the user as a notice rather than a failure.
    ///
    /// Missing recorders, missing storage and missing saves are expected in some hosts.
    pub fn is_notice(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedEnvironment(_)
                | Self::StorageUnavailable(_)
                | Self::NoSavedProject
                | Self::CameraUnavailable(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
