//! Provides the class cache services and a way to initialize them.
//!
//! The main [`create_service`] fn wires all services according to the provided [`Config`] and
//! returns the [`ClassCache`] as the main interface.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::metrics;

pub mod cache_key;
pub mod class_cache;
pub mod configuration;
pub mod filters;
pub mod importer;
pub mod locations;

pub use self::class_cache::{ClassCache, ClassCacheError};

/// Creates the [`ClassCache`] described by `config`.
///
/// Also starts reporting metrics if a statsd server is configured.
pub fn create_service(config: &Config) -> Result<ClassCache> {
    if let Some(ref statsd) = config.metrics.statsd {
        metrics::configure_statsd(
            &config.metrics.prefix,
            statsd,
            config.metrics.custom_tags.clone(),
        )
        .context("failed to configure metrics")?;
    }

    let class_cache = ClassCache::from_config(config);
    tracing::debug!(
        entries = config.class_path().entries().len(),
        configurations = config.analyze.len(),
        "Created class cache"
    );
    Ok(class_cache)
}
