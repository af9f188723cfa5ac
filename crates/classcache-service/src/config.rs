use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, de};
use tracing::level_filters::LevelFilter;

use classcache_sources::{ClassPath, ClassPathEntry, TypeName};

use crate::services::filters::{FilterRegistry, PatternFilter};
use crate::types::AnalysisConfiguration;

/// Controls the log format
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect (pretty for tty, simplified for other)
    Auto,
    /// With colors
    Pretty,
    /// Simplified log output
    Simplified,
    /// Dump out JSON lines
    Json,
}

/// Controls the logging system.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// The log level.
    #[serde(deserialize_with = "deserialize_level_filter")]
    pub level: LevelFilter,
    /// Controls the log format.
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Control the metrics.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Metrics {
    /// host/port of statsd instance
    pub statsd: Option<String>,
    /// The prefix that should be added to all metrics.
    pub prefix: String,
    /// A map containing custom tags and their values.
    ///
    /// These tags will be appended to every metric.
    pub custom_tags: BTreeMap<String, String>,
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics {
            statsd: env::var("STATSD_SERVER").ok(),
            prefix: "classcache".into(),
            custom_tags: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories and archives scanned for classes.
    ///
    /// Relative entries are resolved against the directory of the config file. If empty, the
    /// `CLASSPATH` environment variable is used instead.
    pub class_path: Vec<ClassPathEntry>,

    /// Configuration for the logging system.
    pub logging: Logging,

    /// Configuration for reporting metrics to a statsd instance.
    pub metrics: Metrics,

    /// Additional import filters, by type name.
    ///
    /// These can be declared in `analyze` just like the predefined filters.
    pub import_filters: BTreeMap<TypeName, PatternFilter>,

    /// The analysis configuration of test classes, by class name.
    pub analyze: BTreeMap<TypeName, AnalysisConfiguration>,
}

impl Config {
    pub fn get(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let mut config = Self::from_reader(
                    fs::File::open(path).context("failed to open configuration file")?,
                )?;
                if let Some(base) = path.parent() {
                    config.resolve_relative_entries(base);
                }
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }

    fn from_reader(mut reader: impl std::io::Read) -> Result<Self> {
        let mut config = String::new();
        reader
            .read_to_string(&mut config)
            .context("failed reading config file")?;
        // check for empty files explicitly
        if config.trim().is_empty() {
            anyhow::bail!("config file empty");
        }
        serde_yaml::from_str(&config).context("failed to parse config YAML")
    }

    /// Entries given in the config file are resolved relative to the config file.
    fn resolve_relative_entries(&mut self, base: &Path) {
        self.class_path = std::mem::take(&mut self.class_path)
            .into_iter()
            .map(|entry| {
                let path = PathBuf::from(entry);
                ClassPathEntry::from(if path.is_relative() {
                    base.join(path)
                } else {
                    path
                })
            })
            .collect();
    }

    /// The class path to scan, falling back to the `CLASSPATH` environment variable.
    pub fn class_path(&self) -> ClassPath {
        if !self.class_path.is_empty() {
            return ClassPath::new(self.class_path.iter().cloned());
        }
        match env::var_os("CLASSPATH") {
            Some(paths) => ClassPath::from_path_list(&paths),
            None => ClassPath::default(),
        }
    }

    /// A registry of the predefined filters and all filters declared in `import_filters`.
    pub fn filter_registry(&self) -> FilterRegistry {
        let mut registry = FilterRegistry::new();
        for (name, filter) in &self.import_filters {
            registry.register_pattern(name.clone(), filter.clone());
        }
        registry
    }
}

#[derive(Debug)]
struct LevelFilterVisitor;

impl<'de> de::Visitor<'de> for LevelFilterVisitor {
    type Value = LevelFilter;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> std::fmt::Result {
        write!(
            formatter,
            r#"one of the strings "off", "error", "warn", "info", "debug", or "trace""#
        )
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match v {
            "off" => Ok(LevelFilter::OFF),
            "error" => Ok(LevelFilter::ERROR),
            "warn" => Ok(LevelFilter::WARN),
            "info" => Ok(LevelFilter::INFO),
            "debug" => Ok(LevelFilter::DEBUG),
            "trace" => Ok(LevelFilter::TRACE),
            _ => Err(de::Error::unknown_variant(
                v,
                &["off", "error", "warn", "info", "debug", "trace"],
            )),
        }
    }
}

fn deserialize_level_filter<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<LevelFilter, D::Error> {
    deserializer.deserialize_str(LevelFilterVisitor)
}
