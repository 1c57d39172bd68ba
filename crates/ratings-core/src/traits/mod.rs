pub mod entity;
pub mod storage;

pub use entity::EntityResolver;
pub use storage::{IRatingStorage, ISimilarityStorage, VoteTransaction};
