use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use classcache_service::services::ClassCacheError;
use classcache_service::services::configuration::StaticConfigurationSource;
use classcache_service::services::filters::{DO_NOT_INCLUDE_TESTS, FilterRegistry, PatternFilter};
use classcache_service::services::importer::ImportError;
use classcache_service::types::AnalysisConfiguration;
use classcache_sources::TypeName;

use crate::{packages, project_class_path, setup_class_cache};

fn junit_jars() -> PatternFilter {
    serde_yaml::from_str(r#"include: ["*junit*.jar!/*"]"#).unwrap()
}

fn configurations() -> StaticConfigurationSource {
    StaticConfigurationSource::new()
        .with("com.example.JUnitTest", packages(&["org.junit"]))
        .with(
            "com.example.JUnitMarkerTest",
            AnalysisConfiguration {
                packages_of: vec!["org.junit.Rule".into()],
                ..Default::default()
            },
        )
        .with(
            "com.example.MissingPackageTest",
            packages(&["org.junit", "something.that.doesnt.exist"]),
        )
        .with("com.example.ServiceTest", packages(&["com.example.service"]))
        .with(
            "com.example.ProductionServiceTest",
            AnalysisConfiguration {
                import_filters: vec![DO_NOT_INCLUDE_TESTS.into()],
                ..packages(&["com.example.service"])
            },
        )
        .with(
            "com.example.JUnitJarsTest",
            AnalysisConfiguration {
                import_filters: vec!["com.example.JUnitJars".into()],
                ..Default::default()
            },
        )
        .with(
            "com.example.AnotherJUnitJarsTest",
            AnalysisConfiguration {
                import_filters: vec!["com.example.AnotherJUnitJars".into()],
                ..Default::default()
            },
        )
        .with("com.example.EverythingTest", AnalysisConfiguration::default())
}

fn filters() -> FilterRegistry {
    let mut filters = FilterRegistry::new();
    filters.register_pattern("com.example.JUnitJars", junit_jars());
    filters.register_pattern("com.example.AnotherJUnitJars", junit_jars());
    filters
}

#[test]
fn test_repeated_requests_import_once() {
    let fixture = project_class_path();
    let (cache, importer) = setup_class_cache(&fixture, configurations(), filters());
    let class = TypeName::new("com.example.JUnitTest");

    let first = cache.get_classes_to_analyze_for(&class).unwrap();
    let second = cache.get_classes_to_analyze_for(&class).unwrap();

    assert_eq!(importer.imports(), 1);
    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(|class| class.name.as_str()).collect::<Vec<_>>(),
        vec![
            "org.junit.Assert",
            "org.junit.Rule",
            "org.junit.Test",
            "org.junit.rules.ExpectedException",
            "org.junit.rules.TestRule",
        ]
    );
}

#[test]
fn test_different_requesters_share_import() {
    let fixture = project_class_path();
    let (cache, importer) = setup_class_cache(&fixture, configurations(), filters());

    let by_package = cache
        .get_classes_to_analyze_for(&"com.example.JUnitTest".into())
        .unwrap();
    let by_marker = cache
        .get_classes_to_analyze_for(&"com.example.JUnitMarkerTest".into())
        .unwrap();

    assert_eq!(importer.imports(), 1);
    assert_eq!(by_package, by_marker);
}

#[test]
fn test_unconfigured_class() {
    let fixture = project_class_path();
    let (cache, importer) = setup_class_cache(&fixture, configurations(), filters());

    let err = cache
        .get_classes_to_analyze_for(&"java.lang.Object".into())
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Object"));
    assert!(message.contains("must be annotated"));
    assert!(message.contains("AnalyzeClasses"));
    assert!(matches!(err, ClassCacheError::Configuration(_)));
    assert_eq!(importer.imports(), 0);
}

#[test]
fn test_classes_of_package() {
    let fixture = project_class_path();
    let (cache, _importer) = setup_class_cache(&fixture, configurations(), filters());

    let classes = cache
        .get_classes_to_analyze_for(&"com.example.ServiceTest".into())
        .unwrap();

    assert_eq!(classes.len(), 4);
    assert!(classes.contains("com.example.service.ServiceImpl$Helper"));
    assert!(classes.contains("com.example.service.ServiceTest"));
    assert!(
        classes
            .iter()
            .all(|class| class.package_name().starts_with("com.example.service"))
    );
}

#[test]
fn test_predefined_filter() {
    let fixture = project_class_path();
    let (cache, importer) = setup_class_cache(&fixture, configurations(), filters());

    let all = cache
        .get_classes_to_analyze_for(&"com.example.ServiceTest".into())
        .unwrap();
    let production = cache
        .get_classes_to_analyze_for(&"com.example.ProductionServiceTest".into())
        .unwrap();

    assert_eq!(importer.imports(), 2);
    assert_eq!(production.len(), 3);
    assert!(!production.contains("com.example.service.ServiceTest"));
    assert!(production.iter().all(|class| all.contains(class.name.as_str())));
}

#[test]
fn test_missing_package_is_ignored() {
    let fixture = project_class_path();
    let (cache, importer) = setup_class_cache(&fixture, configurations(), filters());

    let with_missing = cache
        .get_classes_to_analyze_for(&"com.example.MissingPackageTest".into())
        .unwrap();
    let without_missing = cache
        .get_classes_to_analyze_for(&"com.example.JUnitTest".into())
        .unwrap();

    assert_eq!(importer.imports(), 1);
    assert_eq!(with_missing, without_missing);
    assert!(!with_missing.is_empty());
}

#[test]
fn test_filters_are_compared_by_name() {
    let fixture = project_class_path();
    let (cache, importer) = setup_class_cache(&fixture, configurations(), filters());

    let first = cache
        .get_classes_to_analyze_for(&"com.example.JUnitJarsTest".into())
        .unwrap();
    let second = cache
        .get_classes_to_analyze_for(&"com.example.AnotherJUnitJarsTest".into())
        .unwrap();

    assert_eq!(importer.imports(), 2);
    assert_eq!(first.len(), second.len());
    assert_eq!(first.len(), 6);
    assert!(first.contains("junit.framework.TestCase"));
    assert!(!first.contains("org.hamcrest.Matcher"));
}

#[test]
fn test_concurrent_requests() {
    let fixture = project_class_path();
    let (cache, importer) = setup_class_cache(&fixture, configurations(), filters());
    let cache = Arc::new(cache);
    let barrier = Arc::new(Barrier::new(8));

    let requesters = [
        "com.example.JUnitTest",
        "com.example.JUnitMarkerTest",
        "com.example.MissingPackageTest",
        "com.example.JUnitTest",
    ];
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            let barrier = barrier.clone();
            let class = TypeName::new(requesters[i % requesters.len()]);
            thread::spawn(move || {
                barrier.wait();
                cache.get_classes_to_analyze_for(&class).unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(importer.imports(), 1);
    assert!(results.iter().all(|classes| *classes == results[0]));
}

#[test]
fn test_failed_import_is_not_cached() {
    let fixture = project_class_path();
    let (cache, importer) = setup_class_cache(&fixture, configurations(), filters());
    let class = TypeName::new("com.example.EverythingTest");

    let hamcrest = fixture.entry_path("lib/hamcrest-core-1.3.jar");
    let contents = fs::read(&hamcrest).unwrap();
    fs::write(&hamcrest, b"not an archive").unwrap();

    let err = cache.get_classes_to_analyze_for(&class).unwrap_err();
    let ClassCacheError::Import(err) = err else {
        panic!("expected an import error");
    };
    assert!(matches!(*err, ImportError::Archive { .. }));

    fs::write(&hamcrest, contents).unwrap();

    let classes = cache.get_classes_to_analyze_for(&class).unwrap();
    assert_eq!(importer.imports(), 2);
    assert_eq!(classes.len(), 14);
    assert!(classes.contains("org.hamcrest.CoreMatchers"));
}
