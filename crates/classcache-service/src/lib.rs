//! Caches the classes imported for architecture tests.
//!
//! Test classes declare which packages to analyze and which import filters to apply. Every
//! distinct combination of resolved locations and filters is imported once, and the result is
//! shared by all test classes resolving to it. See [`services::ClassCache`].

#[macro_use]
pub mod metrics;

pub mod config;
pub mod logging;
pub mod services;
pub mod types;
