pub mod error;
pub mod math;
pub mod operations;
pub mod scene;

pub use error::{FloorkitError, OperationError, Result, SceneError};
pub use scene::{Node, NodeId, Room, RoomId, Scene, Wall, WallId};
