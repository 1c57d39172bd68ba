//! # ratings-similarity
//!
//! Offline user-user similarity and the recommendations built on it.
//!
//! [`SimilarityEngine::recompute_all`] is a full rebuild: a pure pairwise pass
//! over every authenticated vote ([`pairwise::compute_edges`]) followed by a
//! transactional replace of the edge set. It is a batch job and never runs
//! inline with vote submission.

pub mod engine;
pub mod pairwise;

pub use engine::{SimilarityEngine, SimilarityReport};
pub use pairwise::{compute_edges, PairwiseResult};
