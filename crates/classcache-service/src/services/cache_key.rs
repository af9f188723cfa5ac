use std::fmt::{self, Write};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use classcache_sources::{Location, LocationSet, TypeName};

use super::filters::FilterIdentity;

/// Identifies one import: the locations to scan and the filters to scan them with.
///
/// Two keys are equal if they were built from equal [`LocationSet`]s and [`FilterIdentity`]s.
#[derive(Debug, Clone, Eq)]
pub struct CacheKey {
    metadata: Arc<str>,
    hash: [u8; 32],
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.hash[..8] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl std::hash::Hash for CacheKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl CacheKey {
    /// Creates the [`CacheKey`] for importing `locations` filtered by `filters`.
    pub fn from_import(locations: &LocationSet, filters: &FilterIdentity) -> Self {
        let mut builder = CacheKeyBuilder::default();
        builder.write_locations(locations).unwrap();
        builder.write_filters(filters).unwrap();
        builder.build()
    }

    /// Returns the human-readable metadata that forms the basis of the [`CacheKey`].
    pub fn metadata(&self) -> &str {
        &self.metadata
    }
}

/// A builder for [`CacheKey`]s.
///
/// This builder implements the [`Write`](std::fmt::Write) trait, and the intention of it is to
/// accept human readable, but most importantly **stable**, input.
/// This input in then being hashed to form the [`CacheKey`].
#[derive(Debug, Default)]
pub struct CacheKeyBuilder {
    metadata: String,
}

impl CacheKeyBuilder {
    /// Writes all locations, in their canonical order, into the [`CacheKey`].
    pub fn write_locations(&mut self, locations: &LocationSet) -> fmt::Result {
        self.metadata.write_str("locations:\n")?;
        locations
            .iter()
            .try_for_each(|location: &Location| writeln!(self.metadata, "  {location}"))
    }

    /// Writes all filter type names, in their canonical order, into the [`CacheKey`].
    pub fn write_filters(&mut self, filters: &FilterIdentity) -> fmt::Result {
        self.metadata.write_str("import_filters:\n")?;
        filters
            .iter()
            .try_for_each(|filter: &TypeName| writeln!(self.metadata, "  {filter}"))
    }

    /// Finalize the [`CacheKey`].
    pub fn build(self) -> CacheKey {
        let hash = Sha256::digest(&self.metadata).into();

        CacheKey {
            metadata: self.metadata.into(),
            hash,
        }
    }
}

impl fmt::Write for CacheKeyBuilder {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.metadata.write_str(s)
    }
}
