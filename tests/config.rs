use assert_matches::assert_matches;

use rhea_idmap::config::{BuildMetadata, Config, ConfigLoader, MetadataEntry};
use rhea_idmap::domain::EmissionMode;
use rhea_idmap::error::IdmapError;
use rhea_idmap::fetch::DEFAULT_SOURCE_URL;

#[test]
fn config_file_overrides_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("rhea-idmap.json");
    std::fs::write(
        &path,
        r#"{
            "staging_path": "cache/rhea2xrefs.txt",
            "emission": "per-line",
            "metadata": { "datasource_version": "2.0.0" }
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.source_url, DEFAULT_SOURCE_URL);
    assert_eq!(resolved.staging_path.as_str(), "cache/rhea2xrefs.txt");
    assert_eq!(resolved.emission, EmissionMode::PerLine);
    assert_eq!(resolved.metadata.datasource_version, "2.0.0");
    assert_eq!(resolved.metadata.datasource_name, "EBI-RHEA");
}

#[test]
fn resolve_metadata_entry() {
    let config = Config {
        metadata: Some(MetadataEntry {
            series: Some("nightly-interaction".to_string()),
            ..MetadataEntry::default()
        }),
        ..Config::default()
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    assert_eq!(
        resolved.metadata,
        BuildMetadata {
            series: "nightly-interaction".to_string(),
            ..BuildMetadata::default()
        }
    );
}

#[test]
fn explicit_missing_config_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, IdmapError::ConfigRead(_));
}

#[test]
fn invalid_json_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(&path, r#"{ "emission": "#).unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, IdmapError::ConfigParse(_));
}

#[test]
fn unknown_emission_mode_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("rhea-idmap.json");
    std::fs::write(&path, r#"{ "emission": "twice" }"#).unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, IdmapError::InvalidEmissionMode(value) if value == "twice");
}

#[test]
fn emission_mode_spellings_are_accepted() {
    for value in ["per-line", "per_line", "PerLine"] {
        let config = Config {
            emission: Some(value.to_string()),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.emission, EmissionMode::PerLine);
    }
}
