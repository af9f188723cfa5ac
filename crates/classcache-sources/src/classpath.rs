//! The class path: where compiled classes are looked up.

use std::ffi::OsStr;
use std::fs::File;
use std::path::{self, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::types::package_path;

/// Resolves package names to the [`Location`]s on the scan path containing them.
pub trait LocationProvider: Send + Sync {
    /// Returns all locations containing the given package, possibly none.
    ///
    /// The locations returned also contain all subpackages of `package`.
    fn locations_of_package(&self, package: &str) -> Vec<Location>;

    /// Returns the root locations of the whole scan path.
    fn class_path(&self) -> Vec<Location>;
}

/// A single entry of the [`ClassPath`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PathBuf", into = "PathBuf")]
pub enum ClassPathEntry {
    /// A directory of class files laid out by package.
    Directory(PathBuf),
    /// A `.jar` or `.zip` archive of class files laid out by package.
    Archive(PathBuf),
}

impl ClassPathEntry {
    /// The path of this entry on the file system.
    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(path) | Self::Archive(path) => path,
        }
    }

    fn is_archive_path(path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
    }

    fn absolute(self) -> Self {
        let make_absolute = |path: PathBuf| path::absolute(&path).unwrap_or(path);
        match self {
            Self::Directory(path) => Self::Directory(make_absolute(path)),
            Self::Archive(path) => Self::Archive(make_absolute(path)),
        }
    }

    fn root_location(&self) -> Option<Location> {
        if !self.path().exists() {
            tracing::debug!(path = %self.path().display(), "Skipping missing class path entry");
            return None;
        }
        let location = match self {
            Self::Directory(path) => Location::directory(path),
            Self::Archive(path) => Location::archive_entry(path, ""),
        };
        location
            .inspect_err(|err| tracing::debug!(error = %err, "Skipping class path entry"))
            .ok()
    }

    fn locations_of_package(&self, package: &str) -> Option<Location> {
        let prefix = package_path(package);
        match self {
            Self::Directory(root) => {
                let dir = root.join(&prefix);
                if !dir.is_dir() {
                    return None;
                }
                Location::directory(&dir).ok()
            }
            Self::Archive(archive) => {
                let contains_package = match archive_contains(archive, &prefix) {
                    Ok(contains) => contains,
                    Err(err) => {
                        tracing::debug!(
                            error = &err as &dyn std::error::Error,
                            archive = %archive.display(),
                            "Unable to read class path archive"
                        );
                        false
                    }
                };
                if !contains_package {
                    return None;
                }
                Location::archive_entry(archive, &prefix).ok()
            }
        }
    }
}

impl From<PathBuf> for ClassPathEntry {
    fn from(path: PathBuf) -> Self {
        if Self::is_archive_path(&path) {
            Self::Archive(path)
        } else {
            Self::Directory(path)
        }
    }
}

impl From<ClassPathEntry> for PathBuf {
    fn from(entry: ClassPathEntry) -> Self {
        match entry {
            ClassPathEntry::Directory(path) | ClassPathEntry::Archive(path) => path,
        }
    }
}

fn archive_contains(archive: &Path, prefix: &str) -> zip::result::ZipResult<bool> {
    let archive = zip::ZipArchive::new(File::open(archive)?)?;
    Ok(archive.file_names().any(|name| name.starts_with(prefix)))
}

/// A list of directories and archives scanned for classes.
///
/// All entries are made absolute on construction, so that the same entry always yields the
/// same [`Location`]s.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassPath {
    entries: Vec<ClassPathEntry>,
}

impl ClassPath {
    /// Creates a class path from the given entries.
    pub fn new(entries: impl IntoIterator<Item = ClassPathEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(ClassPathEntry::absolute).collect(),
        }
    }

    /// Parses a platform specific path list, like the `CLASSPATH` environment variable.
    pub fn from_path_list(paths: &OsStr) -> Self {
        Self::new(
            std::env::split_paths(paths)
                .filter(|path| !path.as_os_str().is_empty())
                .map(ClassPathEntry::from),
        )
    }

    /// The entries of this class path, in declaration order.
    pub fn entries(&self) -> &[ClassPathEntry] {
        &self.entries
    }

    /// Returns the directory entry that contains `path`.
    ///
    /// If entries are nested, the innermost one wins.
    pub fn directory_root_of(&self, path: &Path) -> Option<&Path> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                ClassPathEntry::Directory(root) if path.starts_with(root) => Some(root.as_path()),
                _ => None,
            })
            .max_by_key(|root| root.components().count())
    }
}

impl LocationProvider for ClassPath {
    fn locations_of_package(&self, package: &str) -> Vec<Location> {
        self.entries
            .iter()
            .filter_map(|entry| entry.locations_of_package(package))
            .collect()
    }

    fn class_path(&self) -> Vec<Location> {
        self.entries
            .iter()
            .filter_map(ClassPathEntry::root_location)
            .collect()
    }
}
