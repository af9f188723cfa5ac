use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use classcache_service::services::ClassCache;
use classcache_service::services::configuration::StaticConfigurationSource;
use classcache_service::services::filters::{EffectiveFilter, FilterRegistry};
use classcache_service::services::importer::{ClassPathImporter, ImportError, Importer};
use classcache_service::types::{AnalysisConfiguration, ImportedClasses};
use classcache_sources::LocationSet;
use classcache_test as test;

pub use test::{ClassPathFixture, project_class_path};

/// A [`ClassPathImporter`] that counts how often it imports.
pub struct CountingImporter {
    inner: ClassPathImporter,
    imports: AtomicUsize,
}

impl CountingImporter {
    pub fn imports(&self) -> usize {
        self.imports.load(Ordering::SeqCst)
    }
}

impl Importer for CountingImporter {
    fn import_classes(
        &self,
        locations: &LocationSet,
        filter: &EffectiveFilter,
    ) -> Result<ImportedClasses, ImportError> {
        self.imports.fetch_add(1, Ordering::SeqCst);
        self.inner.import_classes(locations, filter)
    }
}

/// Setup tests and create a class cache scanning the class path of `fixture`.
///
/// Returns the cache along with the importer used by it, to observe how often classes are
/// imported.
pub fn setup_class_cache(
    fixture: &ClassPathFixture,
    configurations: StaticConfigurationSource,
    filters: FilterRegistry,
) -> (ClassCache, Arc<CountingImporter>) {
    test::setup();

    let class_path = Arc::new(fixture.class_path());
    let importer = Arc::new(CountingImporter {
        inner: ClassPathImporter::new(class_path.clone()),
        imports: AtomicUsize::new(0),
    });
    let cache = ClassCache::with_filters(
        importer.clone(),
        class_path,
        Arc::new(configurations),
        filters,
    );

    (cache, importer)
}

/// An analysis configuration of the given packages.
pub fn packages(packages: &[&str]) -> AnalysisConfiguration {
    AnalysisConfiguration {
        packages: packages.iter().map(|package| package.to_string()).collect(),
        ..Default::default()
    }
}
