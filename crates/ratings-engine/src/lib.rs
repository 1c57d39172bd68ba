//! # ratings-engine
//!
//! Vote submission and consistency for the ratings system.
//!
//! - [`RatingEngine`] validates a vote against its rating attribute, applies
//!   it to the vote store and the running aggregate in one atomic unit, and
//!   serves the rating read-outs.
//! - [`EntityRegistry`] maps entity type tags to their rating attributes and
//!   resolvers.
//! - [`CascadeRecompute`] rebuilds aggregates from scratch after bulk vote
//!   deletion.

pub mod cascade;
pub mod engine;
pub mod registry;
pub mod summary;
pub mod token;

pub use cascade::{CascadeRecompute, RecomputeReport};
pub use engine::RatingEngine;
pub use registry::EntityRegistry;
pub use summary::RatingSummary;
