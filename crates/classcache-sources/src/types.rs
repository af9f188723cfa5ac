use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A binary class name, as found on a JVM class path.
///
/// Packages are separated by `.`, nested classes by `$`, for example
/// `com.example.Outer$Inner`.
///
/// This is essentially a newtype for a shared string, so cloning is cheap.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Creates a new [`TypeName`].
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().into())
    }

    /// Creates a [`TypeName`] from a class file path relative to its class path root.
    ///
    /// `com/example/Foo$Bar.class` becomes `com.example.Foo$Bar`. Returns `None` for anything
    /// that is not a class file.
    pub fn from_class_file(relative_path: &str) -> Option<Self> {
        let stem = relative_path.strip_suffix(".class")?;
        if stem.is_empty() {
            return None;
        }
        Some(Self::new(stem.trim_start_matches('/').replace(['/', '\\'], ".")))
    }

    /// The fully qualified name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The package this type is declared in.
    ///
    /// Types in the default package return an empty string.
    pub fn package_name(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(package, _)| package)
    }

    /// The name without its package and without enclosing classes.
    pub fn simple_name(&self) -> &str {
        let name = self.0.rsplit_once('.').map_or(&*self.0, |(_, name)| name);
        name.rsplit_once('$').map_or(name, |(_, name)| name)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name.into())
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Converts a package name into the directory prefix it occupies inside a class path entry.
///
/// `com.example` becomes `com/example/`, the default package becomes an empty prefix.
pub fn package_path(package: &str) -> String {
    let package = package.trim_matches('.');
    if package.is_empty() {
        String::new()
    } else {
        format!("{}/", package.replace('.', "/"))
    }
}
