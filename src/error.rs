use thiserror::Error;

use crate::scene::{NodeId, RoomId, WallId};

/// Top-level error type for the floorkit engine.
#[derive(Debug, Error)]
pub enum FloorkitError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors raised when a scene is asked about entities it does not hold,
/// or when a scene edit would break a data-model invariant.
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("wall not found: {0:?}")]
    WallNotFound(WallId),

    #[error("room not found: {0:?}")]
    RoomNotFound(RoomId),

    #[error("node is locked: {0:?}")]
    NodeLocked(NodeId),

    #[error("wall endpoints must be distinct nodes, got {0:?} twice")]
    DegenerateWall(NodeId),

    #[error("wall thickness must be positive, got {0}")]
    InvalidThickness(f64),
}

/// Errors related to engine operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for results using [`FloorkitError`].
pub type Result<T> = std::result::Result<T, FloorkitError>;
