//! Locations of compiled classes: directories, files and archive entries.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

/// The separator between an archive and the entry path inside of it.
const ARCHIVE_SEPARATOR: &str = "!/";

/// An error constructing or interpreting a [`Location`].
#[derive(Debug, Error)]
pub enum LocationError {
    /// The path cannot be represented as a `file:` URI, for example because it is relative.
    #[error("cannot represent {} as a location", .0.display())]
    InvalidPath(PathBuf),
    /// The URI is neither a `file:` nor a `jar:file:` URI.
    #[error("unsupported location: {0}")]
    Unsupported(String),
    /// The URI could not be parsed.
    #[error("invalid location URI")]
    Parse(#[from] url::ParseError),
}

/// Where a [`Location`] points to on the local file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSource {
    /// A plain file or directory.
    Path(PathBuf),
    /// A prefix of entries inside of an archive.
    ///
    /// The prefix is a `/` separated entry path, empty for the archive root.
    Archive {
        /// Path to the archive file.
        archive: PathBuf,
        /// Entry path prefix inside the archive.
        prefix: String,
    },
}

/// An artifact container on the class path that may hold compiled classes.
///
/// Locations are URIs: directories and files are `file:` URIs, entries inside of archives are
/// `jar:file:/path/to/archive.jar!/entry/path`.
///
/// Locations compare by their URI. Two locations pointing to the same directory are only equal
/// if they are spelled the same, which the constructors guarantee for absolute paths.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location(Url);

impl Location {
    /// Creates a location for a directory.
    ///
    /// The resulting URI always ends in `/`.
    pub fn directory(path: &Path) -> Result<Self, LocationError> {
        Url::from_directory_path(path)
            .map(Self)
            .map_err(|()| LocationError::InvalidPath(path.to_owned()))
    }

    /// Creates a location for a single file.
    pub fn file(path: &Path) -> Result<Self, LocationError> {
        Url::from_file_path(path)
            .map(Self)
            .map_err(|()| LocationError::InvalidPath(path.to_owned()))
    }

    /// Creates a location for an entry, or a prefix of entries, inside of an archive.
    pub fn archive_entry(archive: &Path, entry: &str) -> Result<Self, LocationError> {
        let archive_url = Url::from_file_path(archive)
            .map_err(|()| LocationError::InvalidPath(archive.to_owned()))?;
        let entry = entry.trim_start_matches('/');
        let url = Url::parse(&format!("jar:{archive_url}{ARCHIVE_SEPARATOR}{entry}"))?;
        Ok(Self(url))
    }

    /// Parses a location from its URI representation.
    pub fn parse(uri: &str) -> Result<Self, LocationError> {
        let location = Self(Url::parse(uri)?);
        location.source()?;
        Ok(location)
    }

    /// The URI of this location.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the URI of this location contains the given string.
    pub fn contains(&self, part: &str) -> bool {
        self.0.as_str().contains(part)
    }

    /// Whether this location points into an archive.
    pub fn is_archive(&self) -> bool {
        self.0.scheme() == "jar"
    }

    /// Resolves this location to the file system.
    pub fn source(&self) -> Result<LocationSource, LocationError> {
        let unsupported = || LocationError::Unsupported(self.0.to_string());
        match self.0.scheme() {
            "file" => self
                .0
                .to_file_path()
                .map(LocationSource::Path)
                .map_err(|()| unsupported()),
            "jar" => {
                let (archive, prefix) = self
                    .0
                    .path()
                    .split_once(ARCHIVE_SEPARATOR)
                    .ok_or_else(unsupported)?;
                let archive = Url::parse(archive)?
                    .to_file_path()
                    .map_err(|()| unsupported())?;
                Ok(LocationSource::Archive {
                    archive,
                    prefix: prefix.to_owned(),
                })
            }
            _ => Err(unsupported()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// An unordered, deduplicated set of [`Location`]s.
///
/// Equality is set equality. Iteration yields locations in a stable, sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocationSet(BTreeSet<Location>);

impl LocationSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of distinct locations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this set holds no location at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `location` is part of this set.
    pub fn contains(&self, location: &Location) -> bool {
        self.0.contains(location)
    }

    /// Iterates the locations in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Location> + '_ {
        self.0.iter()
    }
}

impl FromIterator<Location> for LocationSet {
    fn from_iter<I: IntoIterator<Item = Location>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for LocationSet {
    type Item = Location;
    type IntoIter = std::collections::btree_set::IntoIter<Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a LocationSet {
    type Item = &'a Location;
    type IntoIter = std::collections::btree_set::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
