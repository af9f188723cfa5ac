//! Types shared between the class cache services.

use std::collections::BTreeMap;
use std::collections::btree_map::Values;

use serde::{Deserialize, Serialize};

use classcache_sources::{Location, TypeName};

/// The marker a test class must carry to be analyzed.
///
/// Error messages refer to this name when a class is missing its configuration.
pub const ANALYZE_CLASSES: &str = "AnalyzeClasses";

/// The declared analysis configuration of a test class.
///
/// This is the raw declaration. The resulting classes depend on what the packages and filters
/// resolve to, so two different declarations may well end up sharing their imported classes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfiguration {
    /// Names of packages to import, including their subpackages.
    pub packages: Vec<String>,
    /// Types whose packages are imported, including their subpackages.
    pub packages_of: Vec<TypeName>,
    /// Import filters, by type name, that every imported class must pass.
    pub import_filters: Vec<TypeName>,
}

/// A class found during an import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedClass {
    /// The binary name of the class.
    pub name: TypeName,
    /// The location of the class file.
    pub location: Location,
}

impl ImportedClass {
    /// The package this class is declared in.
    pub fn package_name(&self) -> &str {
        self.name.package_name()
    }
}

/// All classes of one import, by name.
///
/// If a class is found at multiple locations, the first one in location order wins, just like a
/// class loader would pick the first entry on the class path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportedClasses {
    classes: BTreeMap<TypeName, ImportedClass>,
}

impl ImportedClasses {
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ImportedClass> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Iterates all classes, sorted by name.
    pub fn iter(&self) -> Values<'_, TypeName, ImportedClass> {
        self.classes.values()
    }
}

impl Extend<ImportedClass> for ImportedClasses {
    fn extend<I: IntoIterator<Item = ImportedClass>>(&mut self, iter: I) {
        for class in iter {
            self.classes.entry(class.name.clone()).or_insert(class);
        }
    }
}

impl FromIterator<ImportedClass> for ImportedClasses {
    fn from_iter<I: IntoIterator<Item = ImportedClass>>(iter: I) -> Self {
        let mut classes = Self::default();
        classes.extend(iter);
        classes
    }
}

impl<'a> IntoIterator for &'a ImportedClasses {
    type Item = &'a ImportedClass;
    type IntoIter = Values<'a, TypeName, ImportedClass>;

    fn into_iter(self) -> Self::IntoIter {
        self.classes.values()
    }
}
