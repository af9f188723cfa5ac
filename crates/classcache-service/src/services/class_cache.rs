//! The [`ClassCache`], serving the classes each test class wants analyzed.
//!
//! A request goes through these steps:
//!
//! - The analysis configuration of the requesting class is looked up and validated.
//! - The declared packages are resolved to a [`LocationSet`], and the declared filters to an
//!   [`EffectiveFilter`].
//! - Both together form the [`CacheKey`]. Classes are imported at most once per key, no matter
//!   how many requesting classes resolve to it.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use classcache_cache::{ComputationCache, ComputationDriver};
use classcache_sources::{LocationProvider, LocationSet, TypeName};

use super::cache_key::CacheKey;
use super::configuration::{ConfigurationError, ConfigurationSource, StaticConfigurationSource, validate};
use super::filters::{self, EffectiveFilter, FilterRegistry};
use super::importer::{ClassPathImporter, ImportError, Importer};
use super::locations::LocationResolver;
use crate::config::Config;
use crate::types::ImportedClasses;

/// An error returned from [`ClassCache::get_classes_to_analyze_for`].
#[derive(Debug, Clone, Error)]
pub enum ClassCacheError {
    /// The requesting class is not configured correctly. Nothing was imported.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Importing the classes failed.
    ///
    /// The failure is shared with all concurrent requests waiting on the same import. It is not
    /// cached, the next request imports again.
    #[error("failed to import classes")]
    Import(#[source] Arc<ImportError>),
}

/// Everything needed to run one import.
struct ImportRequest {
    key: CacheKey,
    locations: LocationSet,
    filter: EffectiveFilter,
}

struct ImportDriver {
    importer: Arc<dyn Importer>,
}

impl ComputationDriver for ImportDriver {
    type Arg = ImportRequest;
    type Key = CacheKey;
    type Output = ImportedClasses;
    type Error = ImportError;

    fn cache_key(&self, request: &ImportRequest) -> CacheKey {
        request.key.clone()
    }

    #[tracing::instrument(name = "import_classes", skip_all, fields(key = %request.key))]
    fn compute(&self, request: ImportRequest) -> Result<ImportedClasses, ImportError> {
        let start = Instant::now();
        let result = self
            .importer
            .import_classes(&request.locations, &request.filter);

        let status = match &result {
            Ok(classes) => {
                tracing::debug!(
                    locations = request.locations.len(),
                    classes = classes.len(),
                    "Imported classes"
                );
                "success"
            }
            Err(err) => {
                tracing::debug!(error = err as &dyn std::error::Error, "Import failed");
                "failure"
            }
        };
        metric!(counter("class_cache.imports") += 1, "status" => status);
        metric!(timer("class_cache.import.duration") = start.elapsed(), "status" => status);

        result
    }
}

/// Serves the classes to analyze for test classes, importing each distinct set of classes once.
///
/// The cache is safe to share between threads, typically through an [`Arc`]. Successful imports
/// are kept for the lifetime of the cache.
pub struct ClassCache {
    configurations: Arc<dyn ConfigurationSource>,
    filters: Arc<FilterRegistry>,
    locations: LocationResolver,
    /// Results by requesting class, so repeated requests skip resolution entirely.
    requesters: moka::sync::Cache<TypeName, Arc<ImportedClasses>>,
    imports: ComputationCache<ImportDriver>,
}

impl ClassCache {
    /// Creates a cache using the predefined import filters.
    pub fn new(
        importer: Arc<dyn Importer>,
        provider: Arc<dyn LocationProvider>,
        configurations: Arc<dyn ConfigurationSource>,
    ) -> Self {
        Self::with_filters(importer, provider, configurations, FilterRegistry::new())
    }

    /// Creates a cache that resolves import filters from `filters`.
    pub fn with_filters(
        importer: Arc<dyn Importer>,
        provider: Arc<dyn LocationProvider>,
        configurations: Arc<dyn ConfigurationSource>,
        filters: FilterRegistry,
    ) -> Self {
        Self {
            configurations,
            filters: Arc::new(filters),
            locations: LocationResolver::new(provider),
            requesters: moka::sync::Cache::builder().name("requesters").build(),
            imports: ComputationCache::with_name(ImportDriver { importer }, "imports"),
        }
    }

    /// Creates a cache scanning the class path, filters and analysis configurations of `config`.
    pub fn from_config(config: &Config) -> Self {
        let class_path = Arc::new(config.class_path());
        let importer = Arc::new(ClassPathImporter::new(class_path.clone()));
        let configurations = StaticConfigurationSource::from(config.analyze.clone());

        Self::with_filters(
            importer,
            class_path,
            Arc::new(configurations),
            config.filter_registry(),
        )
    }

    /// Returns the classes to analyze for the test class `class`.
    ///
    /// Fails if `class` has no valid analysis configuration, or if importing fails. Requests that
    /// resolve to the same locations and filters share a single import.
    pub fn get_classes_to_analyze_for(
        &self,
        class: &TypeName,
    ) -> Result<Arc<ImportedClasses>, ClassCacheError> {
        if let Some(classes) = self.requesters.get(class) {
            metric!(counter("class_cache.requester.hit") += 1);
            return Ok(classes);
        }

        let span = tracing::debug_span!("get_classes_to_analyze_for", %class);
        let _guard = span.enter();

        let configuration = validate(class, self.configurations.as_ref(), &self.filters)?;
        let locations = self.locations.resolve(configuration.configuration());
        let filter = filters::resolve(&configuration);
        let key = CacheKey::from_import(&locations, filter.identity());

        let cached = self
            .imports
            .get(ImportRequest {
                key,
                locations,
                filter,
            })
            .map_err(ClassCacheError::Import)?;

        if !cached.fresh {
            tracing::debug!("Reusing imported classes");
            metric!(counter("class_cache.key.hit") += 1);
        }

        self.requesters.insert(class.clone(), cached.value.clone());
        Ok(cached.value)
    }
}

impl std::fmt::Debug for ClassCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassCache")
            .field("filters", &self.filters)
            .field("imports", &self.imports)
            .finish_non_exhaustive()
    }
}
