//! Caching primitives for use in classcache.
//!
//! Currently there is a [`ComputationCache`] that provides request coalescing and keeps
//! successfully computed entries in memory for the lifetime of the cache.

#![warn(missing_docs)]

mod computation;

pub use computation::*;
