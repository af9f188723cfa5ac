//! Helpers for testing the class cache.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all console output
//!    is captured by the test runner.
//!
//!  - When using [`ClassPathFixture`] or [`tempdir`], make sure that the handle is held for the
//!    entire lifetime of the test. When dropped, the temp directory and all class files in it are
//!    deleted, and the class path silently stops resolving to anything.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;
use zip::write::SimpleFileOptions;

use classcache_sources::{ClassPath, ClassPathEntry};

pub use tempfile::TempDir;

/// The magic header of every class file.
const CLASS_FILE_MAGIC: &[u8] = b"\xca\xfe\xba\xbe";

/// Setup the test environment.
///
///  - Initializes logs: The logger only captures logs from the `classcache` crates and mutes all
///    other logs.
pub fn setup() {
    fmt()
        .with_env_filter(EnvFilter::new(
            "classcache_service=trace,classcache_sources=trace",
        ))
        .with_target(false)
        .pretty()
        .with_test_writer()
        .try_init()
        .ok();
}

/// Creates a temporary directory.
///
/// The directory is deleted when the [`TempDir`] instance is dropped, unless
/// [`into_path`](TempDir::into_path) is called. Use it as a guard to automatically clean up after
/// tests.
pub fn tempdir() -> TempDir {
    TempDir::new().unwrap()
}

fn class_file_path(class: &str) -> String {
    format!("{}.class", class.replace('.', "/"))
}

/// A class path of directories and archives in a temporary directory.
///
/// Classes are given as binary names, like `com.example.Outer$Inner`, and are written as stub
/// class files at the location a compiler would put them.
///
/// # Panics
///
/// All methods panic if the file system cannot be written.
pub struct ClassPathFixture {
    dir: TempDir,
    entries: Vec<ClassPathEntry>,
}

impl ClassPathFixture {
    /// Creates an empty class path fixture.
    pub fn new() -> Self {
        Self {
            dir: tempdir(),
            entries: Vec::new(),
        }
    }

    /// The root of the temporary directory holding all class path entries.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the absolute path of a class path entry.
    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Adds a directory entry containing the given classes.
    ///
    /// `name` may contain `/` to create nested directories, like `build/test-classes`.
    pub fn directory(mut self, name: &str, classes: &[&str]) -> Self {
        let root = self.entry_path(name);
        fs::create_dir_all(&root).unwrap();
        for class in classes {
            let path = root.join(class_file_path(class));
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, CLASS_FILE_MAGIC).unwrap();
        }
        self.entries.push(ClassPathEntry::Directory(root));
        self
    }

    /// Adds an archive entry containing the given classes.
    ///
    /// Archives also get a manifest, which is not a class and must never be imported.
    pub fn archive(mut self, name: &str, classes: &[&str]) -> Self {
        let path = self.entry_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        writer
            .start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"Manifest-Version: 1.0\n").unwrap();
        for class in classes {
            writer
                .start_file(class_file_path(class), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(CLASS_FILE_MAGIC).unwrap();
        }
        writer.finish().unwrap();

        self.entries.push(ClassPathEntry::Archive(path));
        self
    }

    /// Adds an entry which is listed on the class path but does not exist.
    pub fn missing(mut self, name: &str) -> Self {
        let path = self.entry_path(name);
        self.entries.push(ClassPathEntry::from(path));
        self
    }

    /// The class path made up of all entries, in the order they were added.
    pub fn class_path(&self) -> ClassPath {
        ClassPath::new(self.entries.iter().cloned())
    }
}

impl Default for ClassPathFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A class path resembling a typical project build.
///
///  - `classes`: production classes in `com.example.service` and `com.example.web`
///  - `test-classes`: tests for the production classes
///  - `lib/junit-4.12.jar`: `org.junit`, `org.junit.rules` and `junit.framework`
///  - `lib/hamcrest-core-1.3.jar`: `org.hamcrest`
pub fn project_class_path() -> ClassPathFixture {
    ClassPathFixture::new()
        .directory(
            "classes",
            &[
                "com.example.service.Service",
                "com.example.service.ServiceImpl",
                "com.example.service.ServiceImpl$Helper",
                "com.example.web.Controller",
            ],
        )
        .directory(
            "test-classes",
            &[
                "com.example.service.ServiceTest",
                "com.example.web.ControllerTest",
            ],
        )
        .archive(
            "lib/junit-4.12.jar",
            &[
                "org.junit.Rule",
                "org.junit.Test",
                "org.junit.Assert",
                "org.junit.rules.TestRule",
                "org.junit.rules.ExpectedException",
                "junit.framework.TestCase",
            ],
        )
        .archive(
            "lib/hamcrest-core-1.3.jar",
            &["org.hamcrest.Matcher", "org.hamcrest.CoreMatchers"],
        )
}
