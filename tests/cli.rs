use std::process::{Command, Output};

fn run_cli(args: &[&str], cwd: &std::path::Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rhea-idmap"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn failure_line_goes_to_stdout() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("absent.json");

    let output = run_cli(
        &["interactions.bridge", "--config", missing.to_str().unwrap()],
        temp.path(),
    );

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Interaction database creation failed!"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Interaction database creation failed!"));
}

#[test]
fn unknown_emission_in_config_exits_with_usage_code() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp.path().join("rhea-idmap.json");
    std::fs::write(&config, r#"{ "emission": "twice" }"#).unwrap();

    let output = run_cli(&["interactions.bridge", "--offline"], temp.path());

    assert_eq!(output.status.code(), Some(2));
    assert!(!temp.path().join("interactions.bridge").exists());
}

#[test]
fn offline_run_without_staged_file_commits_nothing() {
    let temp = tempfile::tempdir().unwrap();

    let output = run_cli(
        &[
            "interactions.bridge",
            "--offline",
            "--staging",
            "resources/rhea2xrefs.txt",
        ],
        temp.path(),
    );

    assert_eq!(output.status.code(), Some(2));
    let db = rhea_idmap::mapdb::MappingDb::open(&temp.path().join("interactions.bridge")).unwrap();
    assert!(db.entity_count().is_err());
}
