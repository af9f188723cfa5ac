//! Looking up and validating the analysis configuration of test classes.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use classcache_sources::TypeName;

use super::filters::{FilterFactory, FilterRegistry};
use crate::types::{ANALYZE_CLASSES, AnalysisConfiguration};

/// Provides the declared [`AnalysisConfiguration`] of test classes.
pub trait ConfigurationSource: Send + Sync {
    /// Returns the configuration declared on `class`, or `None` if it carries none.
    fn analysis_configuration(&self, class: &TypeName) -> Option<AnalysisConfiguration>;
}

/// A [`ConfigurationSource`] backed by a fixed map from class names to configurations.
#[derive(Clone, Debug, Default)]
pub struct StaticConfigurationSource {
    configurations: HashMap<TypeName, AnalysisConfiguration>,
}

impl StaticConfigurationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the configuration of `class`, replacing any previous one.
    pub fn insert(&mut self, class: impl Into<TypeName>, configuration: AnalysisConfiguration) {
        self.configurations.insert(class.into(), configuration);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, class: impl Into<TypeName>, configuration: AnalysisConfiguration) -> Self {
        self.insert(class, configuration);
        self
    }
}

impl From<BTreeMap<TypeName, AnalysisConfiguration>> for StaticConfigurationSource {
    fn from(configurations: BTreeMap<TypeName, AnalysisConfiguration>) -> Self {
        Self {
            configurations: configurations.into_iter().collect(),
        }
    }
}

impl ConfigurationSource for StaticConfigurationSource {
    fn analysis_configuration(&self, class: &TypeName) -> Option<AnalysisConfiguration> {
        self.configurations.get(class).cloned()
    }
}

/// An error in the analysis configuration of a test class.
///
/// These are raised before anything is resolved or imported, and are never cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The class does not carry an analysis configuration at all.
    #[error("Class {class} must be annotated with @{marker}")]
    MissingAnnotation {
        /// Simple name of the offending class.
        class: String,
        /// Simple name of the required marker.
        marker: &'static str,
    },
    /// The class declares an import filter that is not registered.
    #[error("Class {class} declares unknown import filter {filter}")]
    UnknownImportFilter {
        /// Simple name of the offending class.
        class: String,
        /// The declared filter type.
        filter: TypeName,
    },
}

/// An [`AnalysisConfiguration`] that passed [`validate`].
///
/// Holds on to the factories of all declared filters, so resolving them can not fail anymore.
#[derive(Clone)]
pub struct ValidConfiguration {
    configuration: AnalysisConfiguration,
    filters: Vec<(TypeName, FilterFactory)>,
}

impl ValidConfiguration {
    /// The validated configuration.
    pub fn configuration(&self) -> &AnalysisConfiguration {
        &self.configuration
    }

    pub(crate) fn filter_factories(&self) -> impl Iterator<Item = (&TypeName, &FilterFactory)> {
        self.filters.iter().map(|(name, factory)| (name, factory))
    }
}

impl std::fmt::Debug for ValidConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ValidConfiguration")
            .field(&self.configuration)
            .finish()
    }
}

/// Checks that `class` carries a usable analysis configuration.
pub fn validate(
    class: &TypeName,
    source: &dyn ConfigurationSource,
    registry: &FilterRegistry,
) -> Result<ValidConfiguration, ConfigurationError> {
    let configuration = source.analysis_configuration(class).ok_or_else(|| {
        ConfigurationError::MissingAnnotation {
            class: class.simple_name().to_owned(),
            marker: ANALYZE_CLASSES,
        }
    })?;

    let filters = configuration
        .import_filters
        .iter()
        .map(|filter| match registry.factory(filter.as_str()) {
            Some(factory) => Ok((filter.clone(), factory.clone())),
            None => Err(ConfigurationError::UnknownImportFilter {
                class: class.simple_name().to_owned(),
                filter: filter.clone(),
            }),
        })
        .collect::<Result<_, _>>()?;

    Ok(ValidConfiguration {
        configuration,
        filters,
    })
}
