/// Convenience result type used across the crate.
pub type WheelResult<T> = Result<T, WheelError>;

/// Top-level error taxonomy shared by the library, the pipeline and the HTTP layer.
#[derive(thiserror::Error, Debug)]
pub enum WheelError {
    /// Invalid user-provided data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A requested entry, session or artifact does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Errors while rasterizing a frame or preparing render assets.
    #[error("render error: {0}")]
    Render(String),

    /// Errors raised by the external encoder or while feeding it.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The pipeline observed its cancellation token.
    #[error("generation cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WheelError {
    /// Build a [`WheelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`WheelError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`WheelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`WheelError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`WheelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors caused by the caller rather than the pipeline.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
