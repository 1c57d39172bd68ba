//! One module per relation. Every function takes a plain `&Connection`, so the
//! same code runs on the writer, a pooled reader, or inside a transaction.

pub mod aggregate_ops;
pub mod ignored_ops;
pub mod similarity_ops;
pub mod vote_ops;
