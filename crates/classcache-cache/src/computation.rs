use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use moka::sync::Cache;

/// The Cache Computation Driver
///
/// The driver is responsible for providing the actual computation that is supposed to be cached,
/// as well as determining the cache key.
pub trait ComputationDriver {
    /// Input argument to the driver.
    type Arg;
    /// Cache Key for the computation.
    type Key: Eq + Hash + Send + Sync + 'static;
    /// The resulting output of the computation.
    type Output: Send + Sync + 'static;
    /// The error of a failed computation.
    type Error: Send + Sync + 'static;

    /// Returns the cache key corresponding to the `arg`.
    fn cache_key(&self, arg: &Self::Arg) -> Self::Key;

    /// Compute a new value that should be cached.
    fn compute(&self, arg: Self::Arg) -> Result<Self::Output, Self::Error>;
}

/// A value returned from the [`ComputationCache`].
#[derive(Debug)]
pub struct Cached<T> {
    /// The shared value.
    pub value: Arc<T>,
    /// `true` if this call computed the value, `false` if it was already cached or
    /// computed by a concurrent call.
    pub fresh: bool,
}

/// An in-memory Cache for Computations.
///
/// The purpose of this Cache is to do request coalescing, and to hold the results of successful
/// computations in memory for as long as the cache lives. Entries are never evicted.
///
/// For every key, the [`ComputationDriver`] computes at most once at a time: concurrent requests
/// for the same key wait for the running computation and share its result. Requests for other
/// keys proceed independently. Failed computations are not cached; the error is handed to all
/// requests waiting for that computation, and the next request computes again.
pub struct ComputationCache<D: ComputationDriver> {
    driver: D,
    computations: Cache<D::Key, Arc<D::Output>>,
}

impl<D: ComputationDriver> fmt::Debug for ComputationCache<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputationCache")
            .field("name", &self.computations.name())
            .field("entries", &self.computations.entry_count())
            .finish()
    }
}

impl<D> ComputationCache<D>
where
    D: ComputationDriver,
{
    /// Creates a new, unbounded Computation Cache.
    pub fn new(driver: D) -> Self {
        Self::with_name(driver, "computations")
    }

    /// Creates a new, unbounded Computation Cache with the given name.
    ///
    /// The name only shows up in debug output.
    pub fn with_name(driver: D, name: &str) -> Self {
        let computations = Cache::builder().name(name).build();
        Self {
            driver,
            computations,
        }
    }

    /// The driver computing values for this cache.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get or compute the output value for the provided `arg`.
    ///
    /// See [`ComputationCache`] docs for how the output value is computed.
    pub fn get(&self, arg: D::Arg) -> Result<Cached<D::Output>, Arc<D::Error>> {
        let key = self.driver.cache_key(&arg);

        let entry = self
            .computations
            .entry(key)
            .or_try_insert_with(|| self.driver.compute(arg).map(Arc::new))?;

        Ok(Cached {
            fresh: entry.is_fresh(),
            value: entry.into_value(),
        })
    }

    /// Returns the cached output for `key` without computing it.
    pub fn get_cached(&self, key: &D::Key) -> Option<Arc<D::Output>> {
        self.computations.get(key)
    }

    /// Whether a value for `key` has been computed successfully.
    pub fn contains(&self, key: &D::Key) -> bool {
        self.computations.contains_key(key)
    }
}
