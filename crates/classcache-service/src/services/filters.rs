//! Import filters and their identities.
//!
//! Filters are declared by type name. The name, not the behavior of the filter, decides whether
//! two imports are the same: two differently named filters accepting exactly the same locations
//! still cause two separate imports.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, de};

use classcache_sources::{Location, TypeName};

use super::configuration::ValidConfiguration;

/// Excludes classes from test output directories of common build tools.
pub const DO_NOT_INCLUDE_TESTS: &str = "classcache.DoNotIncludeTests";
/// Excludes classes from `.jar` archives.
pub const DO_NOT_INCLUDE_JARS: &str = "classcache.DoNotIncludeJars";
/// Excludes classes from any kind of archive.
pub const DO_NOT_INCLUDE_ARCHIVES: &str = "classcache.DoNotIncludeArchives";

/// A predicate deciding which class files are part of an import.
pub trait ImportFilter: Send + Sync {
    /// Whether the class file at `location` should be imported.
    fn includes(&self, location: &Location) -> bool;
}

impl<F> ImportFilter for F
where
    F: Fn(&Location) -> bool + Send + Sync,
{
    fn includes(&self, location: &Location) -> bool {
        self(location)
    }
}

/// Creates a new instance of a registered filter.
pub type FilterFactory = Arc<dyn Fn() -> Arc<dyn ImportFilter> + Send + Sync>;

/// All filter types that can be declared in an analysis configuration.
#[derive(Clone)]
pub struct FilterRegistry {
    factories: HashMap<TypeName, FilterFactory>,
}

impl FilterRegistry {
    /// Creates a registry with the predefined filters.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<DoNotIncludeTests>(DO_NOT_INCLUDE_TESTS);
        registry.register::<DoNotIncludeJars>(DO_NOT_INCLUDE_JARS);
        registry.register::<DoNotIncludeArchives>(DO_NOT_INCLUDE_ARCHIVES);
        registry
    }

    /// Creates a registry without any filters.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a filter type that is instantiated through [`Default`].
    pub fn register<F>(&mut self, name: impl Into<TypeName>)
    where
        F: ImportFilter + Default + 'static,
    {
        self.register_with(name, F::default);
    }

    /// Registers a filter type that is instantiated by calling `factory`.
    ///
    /// Registering a name a second time replaces the previous factory.
    pub fn register_with<F, G>(&mut self, name: impl Into<TypeName>, factory: F)
    where
        F: Fn() -> G + Send + Sync + 'static,
        G: ImportFilter + 'static,
    {
        let factory: FilterFactory =
            Arc::new(move || Arc::new(factory()) as Arc<dyn ImportFilter>);
        self.factories.insert(name.into(), factory);
    }

    /// Registers a named [`PatternFilter`].
    pub fn register_pattern(&mut self, name: impl Into<TypeName>, filter: PatternFilter) {
        let filter: Arc<dyn ImportFilter> = Arc::new(filter);
        let factory: FilterFactory = Arc::new(move || filter.clone());
        self.factories.insert(name.into(), factory);
    }

    /// Whether a filter with the given type name has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub(crate) fn factory(&self, name: &str) -> Option<&FilterFactory> {
        self.factories.get(name)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("FilterRegistry")
            .field("filters", &names)
            .finish()
    }
}

/// The declared type names of the filters making up an [`EffectiveFilter`].
///
/// Order and duplicates of the declaration do not matter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterIdentity(BTreeSet<TypeName>);

impl FilterIdentity {
    /// Whether no filters were declared at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the type names, sorted.
    pub fn iter(&self) -> impl Iterator<Item = &TypeName> + '_ {
        self.0.iter()
    }
}

impl FromIterator<TypeName> for FilterIdentity {
    fn from_iter<I: IntoIterator<Item = TypeName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The combination of all declared filters of a configuration.
///
/// A location is included only if every filter includes it. Without any filters, everything is
/// included.
#[derive(Clone, Default)]
pub struct EffectiveFilter {
    identity: FilterIdentity,
    filters: Vec<Arc<dyn ImportFilter>>,
}

impl EffectiveFilter {
    /// The identity of this filter, used for caching.
    pub fn identity(&self) -> &FilterIdentity {
        &self.identity
    }

    /// Whether all filters include the class file at `location`.
    pub fn includes(&self, location: &Location) -> bool {
        self.filters.iter().all(|filter| filter.includes(location))
    }
}

impl fmt::Debug for EffectiveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EffectiveFilter")
            .field(&self.identity)
            .finish()
    }
}

/// Instantiates and combines the declared filters of a validated configuration.
///
/// A filter type declared more than once is only instantiated once.
pub fn resolve(configuration: &ValidConfiguration) -> EffectiveFilter {
    let factories: BTreeMap<_, _> = configuration.filter_factories().collect();
    let filters = factories.values().map(|factory| factory()).collect();
    let identity = factories.into_keys().cloned().collect();

    EffectiveFilter { identity, filters }
}

/// Test output directories of maven, gradle, intellij and eclipse.
const TEST_OUTPUT_DIRECTORIES: &[&str] = &[
    "/test-classes/",
    "/build/classes/java/test/",
    "/build/classes/kotlin/test/",
    "/build/classes/scala/test/",
    "/out/test/",
    "/bin/test/",
];

/// Filter for [`DO_NOT_INCLUDE_TESTS`].
#[derive(Debug, Default)]
pub struct DoNotIncludeTests;

impl ImportFilter for DoNotIncludeTests {
    fn includes(&self, location: &Location) -> bool {
        !TEST_OUTPUT_DIRECTORIES
            .iter()
            .any(|dir| location.contains(dir))
    }
}

/// Filter for [`DO_NOT_INCLUDE_JARS`].
#[derive(Debug, Default)]
pub struct DoNotIncludeJars;

impl ImportFilter for DoNotIncludeJars {
    fn includes(&self, location: &Location) -> bool {
        !(location.is_archive() && location.contains(".jar!/"))
    }
}

/// Filter for [`DO_NOT_INCLUDE_ARCHIVES`].
#[derive(Debug, Default)]
pub struct DoNotIncludeArchives;

impl ImportFilter for DoNotIncludeArchives {
    fn includes(&self, location: &Location) -> bool {
        !location.is_archive()
    }
}

/// A Wrapper around [`glob::Pattern`] that allows de/serialization.
#[derive(Debug, Clone)]
pub struct Glob(pub glob::Pattern);

impl<'de> Deserialize<'de> for Glob {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Cow::<str>::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom).map(Glob)
    }
}

impl Serialize for Glob {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl Deref for Glob {
    type Target = glob::Pattern;

    fn deref(&self) -> &glob::Pattern {
        &self.0
    }
}

/// A filter matching glob patterns against location URIs.
///
/// `*` also matches `/`, so `*/test-classes/*` matches every class below any `test-classes`
/// directory.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternFilter {
    /// If not empty, a location must match at least one of these patterns.
    pub include: Vec<Glob>,
    /// A location matching any of these patterns is excluded.
    pub exclude: Vec<Glob>,
}

impl ImportFilter for PatternFilter {
    fn includes(&self, location: &Location) -> bool {
        let uri = location.as_str();
        let included =
            self.include.is_empty() || self.include.iter().any(|pattern| pattern.matches(uri));
        included && !self.exclude.iter().any(|pattern| pattern.matches(uri))
    }
}
