use thiserror::Error;

/// Errors raised while authoring or resolving a building.
///
/// Construction errors are returned immediately and cannot be recovered by
/// the resolver; the caller must fix the input. Problems that do not prevent
/// geometry generation are reported as [`crate::Violation`] data instead.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("story id is already present in the building: {0}")]
    DuplicateStoryId(String),

    #[error("footprint '{footprint}' is already present in story '{story}'")]
    DuplicateFootprint { story: String, footprint: String },

    #[error("story not found: {0}")]
    UnknownStory(String),

    #[error("cannot extrude room '{room}' with height {height}")]
    DegenerateExtrusion { room: String, height: f64 },
}

pub type Result<T> = std::result::Result<T, ModelError>;
