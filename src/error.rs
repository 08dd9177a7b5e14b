use crate::types::BodyId;

#[derive(Debug, thiserror::Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("Bounding radius must be non-negative, got {0}")]
    InvalidRadius(f32),

    #[error("Axis index must be 0 (x) or 1 (y), got {0}")]
    InvalidAxis(usize),

    #[error("No body {0:?} in this world")]
    UnknownBody(BodyId),

    #[error("World has issued every body id")]
    IdsExhausted,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
