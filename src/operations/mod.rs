pub mod miter;
pub mod rooms;
pub mod snap;
pub mod split;
