#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Command {
    Command::cargo_bin("tournus-cli").unwrap()
}

#[test]
fn build_validate_and_plan() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedule.json");
    let path = path.to_str().unwrap();

    cli()
        .args([
            "build", "--schedule", path, "--name", "Mardi", "--stations", "a,b,c",
            "--players", "p1,p2,p3,p4,p5,p6", "--groups", "3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("written to"));

    cli()
        .args(["validate", "--schedule", path])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: schedule is valid"));

    cli()
        .args(["plan", "--schedule", path])
        .assert()
        .success()
        .stdout(predicate::str::contains("rotation 3 | g1 -> c | g2 -> a | g3 -> b"));
}

#[test]
fn invalid_schedule_exits_with_code_2() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{ "id": "bad", "name": "bad", "stations": [], "groups": [],
             "rotation_duration": 0 }"#,
    )
    .unwrap();

    cli()
        .args(["validate", "--schedule", path.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("schedule has no group"));
}

#[test]
fn run_completes_fast_schedule() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fast.json");
    let archive = dir.path().join("archive.json");
    let path = path.to_str().unwrap();

    cli()
        .args([
            "build", "--schedule", path, "--name", "Rapide", "--stations", "a,b",
            "--players", "p1,p2", "--rotation-duration", "2", "--transition-time", "1",
        ])
        .assert()
        .success();

    cli()
        .args(["run", "--schedule", path, "--tick-ms", "5", "--archive", archive.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed after 2 rotation(s)"));
    assert!(archive.exists());
}

#[test]
fn negative_capacity_is_reported_not_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("negative.json");
    std::fs::write(
        &path,
        r#"{ "id": "neg", "name": "neg",
             "stations": [
               { "id": "a", "name": "A", "capacity": -1, "workout": { "type": "rest" } },
               { "id": "b", "name": "B", "capacity": 4, "workout": { "type": "rest" } }
             ],
             "groups": [
               { "id": "g1", "name": "G1", "players": ["p1", "p2"], "starting_station": "a",
                 "rotation_order": ["a", "b"] }
             ],
             "rotation_duration": 60 }"#,
    )
    .unwrap();

    cli()
        .args(["validate", "--schedule", path.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("station a must have a positive capacity"));
}
