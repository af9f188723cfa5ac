//! Utilities dealing with class sources.
//!
//! Includes type names, locations of compiled classes and the class path that is scanned for
//! them.

#![warn(missing_docs)]

mod classpath;
mod location;
mod types;

pub use classpath::*;
pub use location::*;
pub use types::*;
