//! Importing classes from their locations.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use classcache_sources::{ClassPath, Location, LocationError, LocationSet, LocationSource, TypeName};

use super::filters::EffectiveFilter;
use crate::types::{ImportedClass, ImportedClasses};

/// Module descriptors are class files, but not classes.
const MODULE_INFO: &str = "module-info.class";

/// An error while importing classes.
#[derive(Debug, Error)]
pub enum ImportError {
    /// A directory or file could not be read.
    #[error("failed to read {location}")]
    Io {
        location: Location,
        #[source]
        source: io::Error,
    },
    /// An archive could not be opened or is corrupt.
    #[error("failed to read archive {location}")]
    Archive {
        location: Location,
        #[source]
        source: zip::result::ZipError,
    },
    /// A directory location that belongs to none of the class path entries.
    ///
    /// Class names are derived from the path relative to the class path entry, so these can not
    /// be imported.
    #[error("{0} is not part of the class path")]
    OutsideClassPath(Location),
    #[error(transparent)]
    Location(#[from] LocationError),
}

/// Imports all classes found at a set of locations.
///
/// Implementations must be deterministic: importing the same locations with the same filter
/// yields the same classes.
pub trait Importer: Send + Sync {
    /// Imports every class at `locations` that passes `filter`.
    fn import_classes(
        &self,
        locations: &LocationSet,
        filter: &EffectiveFilter,
    ) -> Result<ImportedClasses, ImportError>;
}

/// Imports class files from the directories and archives of a [`ClassPath`].
///
/// Class names are derived from the path of each class file, the files themselves are never read.
#[derive(Debug, Clone)]
pub struct ClassPathImporter {
    class_path: Arc<ClassPath>,
}

impl ClassPathImporter {
    pub fn new(class_path: Arc<ClassPath>) -> Self {
        Self { class_path }
    }

    fn import_location(
        &self,
        location: &Location,
        filter: &EffectiveFilter,
    ) -> Result<Vec<ImportedClass>, ImportError> {
        let classes = match location.source()? {
            LocationSource::Path(path) => self.import_directory(location, &path, filter)?,
            LocationSource::Archive { archive, prefix } => {
                import_archive(location, &archive, &prefix, filter)?
            }
        };
        tracing::trace!(%location, classes = classes.len(), "Imported location");
        Ok(classes)
    }

    fn import_directory(
        &self,
        location: &Location,
        path: &Path,
        filter: &EffectiveFilter,
    ) -> Result<Vec<ImportedClass>, ImportError> {
        let root = self
            .class_path
            .directory_root_of(path)
            .ok_or_else(|| ImportError::OutsideClassPath(location.clone()))?;

        let mut classes = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry.map_err(|err| ImportError::Io {
                location: location.clone(),
                source: err.into(),
            })?;
            if !entry.file_type().is_file() || entry.file_name() == MODULE_INFO {
                continue;
            }

            let Some(relative) = entry
                .path()
                .strip_prefix(root)
                .ok()
                .and_then(Path::to_str)
            else {
                continue;
            };
            let Some(name) = TypeName::from_class_file(&relative.replace('\\', "/")) else {
                continue;
            };

            let class_location = Location::file(entry.path())?;
            if filter.includes(&class_location) {
                classes.push(ImportedClass {
                    name,
                    location: class_location,
                });
            }
        }

        Ok(classes)
    }
}

fn import_archive(
    location: &Location,
    archive: &Path,
    prefix: &str,
    filter: &EffectiveFilter,
) -> Result<Vec<ImportedClass>, ImportError> {
    let file = File::open(archive).map_err(|source| ImportError::Io {
        location: location.clone(),
        source,
    })?;
    let zip = zip::ZipArchive::new(file).map_err(|source| ImportError::Archive {
        location: location.clone(),
        source,
    })?;

    let mut classes = Vec::new();
    for entry in zip.file_names() {
        if !entry.starts_with(prefix) || entry.starts_with("META-INF/") {
            continue;
        }
        if entry.rsplit('/').next() == Some(MODULE_INFO) {
            continue;
        }
        let Some(name) = TypeName::from_class_file(entry) else {
            continue;
        };

        let class_location = Location::archive_entry(archive, entry)?;
        if filter.includes(&class_location) {
            classes.push(ImportedClass {
                name,
                location: class_location,
            });
        }
    }

    Ok(classes)
}

impl Importer for ClassPathImporter {
    fn import_classes(
        &self,
        locations: &LocationSet,
        filter: &EffectiveFilter,
    ) -> Result<ImportedClasses, ImportError> {
        let locations: Vec<&Location> = locations.iter().collect();
        let imported = locations
            .par_iter()
            .map(|location| self.import_location(location, filter))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(imported.into_iter().flatten().collect())
    }
}
