use std::fs;

use classcache_service::config::Config;
use classcache_service::services::create_service;

use crate::project_class_path;

#[test]
fn test_class_cache_from_config_file() {
    classcache_test::setup();
    let fixture = project_class_path();

    let config_path = fixture.path().join("classcache.yml");
    fs::write(
        &config_path,
        r#"
class_path:
  - classes
  - test-classes
  - lib/junit-4.12.jar
  - lib/hamcrest-core-1.3.jar
import_filters:
  com.example.NoRules:
    exclude: ["*/rules/*"]
analyze:
  com.example.ArchitectureTest:
    packages: [com.example]
    import_filters: [classcache.DoNotIncludeTests]
  com.example.JUnitTest:
    packages_of: [org.junit.Rule]
    import_filters: [com.example.NoRules]
  com.example.BrokenTest:
    import_filters: [com.example.DoesNotExist]
"#,
    )
    .unwrap();

    let config = Config::get(Some(&config_path)).unwrap();
    let cache = create_service(&config).unwrap();

    let architecture = cache
        .get_classes_to_analyze_for(&"com.example.ArchitectureTest".into())
        .unwrap();
    assert_eq!(
        architecture
            .iter()
            .map(|class| class.name.as_str())
            .collect::<Vec<_>>(),
        vec![
            "com.example.service.Service",
            "com.example.service.ServiceImpl",
            "com.example.service.ServiceImpl$Helper",
            "com.example.web.Controller",
        ]
    );

    let junit = cache
        .get_classes_to_analyze_for(&"com.example.JUnitTest".into())
        .unwrap();
    assert_eq!(junit.len(), 3);
    assert!(!junit.contains("org.junit.rules.TestRule"));

    let err = cache
        .get_classes_to_analyze_for(&"com.example.BrokenTest".into())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Class BrokenTest declares unknown import filter com.example.DoesNotExist"
    );
}

#[test]
fn test_missing_config_file() {
    let fixture = project_class_path();
    let result = Config::get(Some(&fixture.path().join("does-not-exist.yml")));

    let err = format!("{:#}", result.unwrap_err());
    assert!(err.starts_with("failed to open configuration file"));
}
