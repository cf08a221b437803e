use thiserror::Error;

/// Everything that can go wrong inside an editing session. None of these are
/// fatal: the caller logs them and the session keeps its last good state.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to decode image: {0}")]
    DecodeFailure(String),

    #[error("'{0}' is not an image")]
    UnsupportedMedia(String),

    #[error("no further history in that direction")]
    AtBoundary,

    #[error("crop rectangle has no area")]
    DegenerateCrop,

    #[error("failed to encode image: {0}")]
    EncodeFailure(String),

    #[error("no image loaded")]
    NoImage,

    #[error("failed to load font '{0}'")]
    FontLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EditorError>;
