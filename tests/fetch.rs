use std::fs;

use rhea_idmap::fetch::{StageStats, stage_to_file};

#[test]
fn staging_twice_leaves_only_the_latest_payload() {
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("resources").join("rhea2xrefs.txt");

    let first = "RHEA_ID\tDIRECTION\tMASTER_ID\tID\tDB\n10000\tUN\t10000\t2.7.1.1\tEC\n10004\tUN\t10004\tP35557\tUNIPROT\n";
    let stats = stage_to_file(first.as_bytes(), &destination).unwrap();
    assert_eq!(stats, StageStats { kept: 2, skipped: 1 });

    let second = "RHEA_ID\tDIRECTION\tMASTER_ID\tID\tDB\n20000\tUN\t20000\tR00001\tKEGG_REACTION\n";
    stage_to_file(second.as_bytes(), &destination).unwrap();

    let staged = fs::read_to_string(&destination).unwrap();
    assert_eq!(staged, "20000\tUN\t20000\tR00001\tKEGG_REACTION\n");

    let leftovers = fs::read_dir(destination.parent().unwrap())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name() != "rhea2xrefs.txt")
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn empty_payload_stages_an_empty_file() {
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("rhea2xrefs.txt");

    let stats = stage_to_file("".as_bytes(), &destination).unwrap();
    assert_eq!(stats, StageStats::default());
    assert_eq!(fs::read_to_string(&destination).unwrap(), "");
}
