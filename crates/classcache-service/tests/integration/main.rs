// See <https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html>

pub mod class_cache;
pub mod config;
pub mod utils;

pub use utils::*;
