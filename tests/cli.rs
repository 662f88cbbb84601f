use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn valid_periods_json() -> &'static str {
    r#"
{
  "version": 1,
  "school": "Cabot High",
  "periods": [
    { "name": "Before School", "short": "Before School", "start": "00:00" },
    { "name": "Zero Hour", "short": "Zero Hour", "start": "07:50" },
    { "name": "1st Period", "short": "1st", "start": "08:25" },
    { "name": "2nd Period", "short": "2nd", "start": "09:18" },
    { "name": "End of School Day", "short": "School Dismissed", "start": "15:20" },
    { "name": "End of Day", "short": "End of Day", "start": "23:59" }
  ]
}
"#
}

fn valid_events_json() -> &'static str {
    r#"
{
  "version": 1,
  "category": "studentCalendar",
  "events": [
    { "name": "Spring Break", "date": "3/23/2099", "special": { "endDate": "3/27/2099" } },
    { "name": "Graduation", "date": "5/20/2099" }
  ]
}
"#
}

#[test]
fn diagnostics_succeeds_with_valid_schedule_file() {
    let dir = tempdir().expect("tempdir");
    let periods = dir.path().join("periods.json");
    fs::write(&periods, valid_periods_json()).expect("write json");

    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--diagnostics")
        .arg("--periods")
        .arg(periods)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded schedule for Cabot High"))
        .stdout(predicate::str::contains("08:25 1st Period (1st)"));
}

#[test]
fn malformed_json_fails_with_clear_error() {
    let dir = tempdir().expect("tempdir");
    let periods = dir.path().join("periods.json");
    fs::write(&periods, "{ not-valid-json ").expect("write invalid json");

    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--diagnostics")
        .arg("--periods")
        .arg(periods)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn missing_schedule_file_fails_with_its_path() {
    let dir = tempdir().expect("tempdir");
    let periods = dir.path().join("nowhere.json");

    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--diagnostics")
        .arg("--periods")
        .arg(&periods)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load"))
        .stderr(predicate::str::contains("nowhere.json"));
}

#[test]
fn out_of_order_schedule_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let periods = dir.path().join("periods.json");
    fs::write(
        &periods,
        r#"
{
  "version": 1,
  "school": "Cabot High",
  "periods": [
    { "name": "Before School", "short": "Before School", "start": "00:00" },
    { "name": "2nd Period", "short": "2nd", "start": "09:18" },
    { "name": "1st Period", "short": "1st", "start": "08:25" },
    { "name": "End of Day", "short": "End of Day", "start": "23:59" }
  ]
}
"#,
    )
    .expect("write json");

    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--diagnostics")
        .arg("--periods")
        .arg(periods)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "starts earlier than the entry before it",
        ));
}

#[test]
fn unsupported_schedule_version_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let periods = dir.path().join("periods.json");
    fs::write(
        &periods,
        r#"{ "version": 2, "school": "Cabot High", "periods": [] }"#,
    )
    .expect("write json");

    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--diagnostics")
        .arg("--periods")
        .arg(periods)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "unsupported schedule config version",
        ));
}

#[test]
fn event_record_missing_name_warns_without_failing() {
    let dir = tempdir().expect("tempdir");
    let periods = dir.path().join("periods.json");
    let events = dir.path().join("events.json");
    fs::write(&periods, valid_periods_json()).expect("write json");
    fs::write(
        &events,
        r#"
{
  "version": 1,
  "category": "studentCalendar",
  "events": [
    { "date": "3/23/2099" },
    { "name": "Graduation", "date": "5/20/2099" }
  ]
}
"#,
    )
    .expect("write json");

    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--diagnostics")
        .arg("--periods")
        .arg(periods)
        .arg("--calendar-events")
        .arg(events)
        .assert()
        .success()
        .stdout(predicate::str::contains("Student calendar events: 1"))
        .stderr(predicate::str::contains(
            "event 0: missing required field \"name\"",
        ));
}

#[test]
fn mismatched_event_category_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let periods = dir.path().join("periods.json");
    let events = dir.path().join("events.json");
    fs::write(&periods, valid_periods_json()).expect("write json");
    fs::write(&events, valid_events_json()).expect("write json");

    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--diagnostics")
        .arg("--periods")
        .arg(periods)
        .arg("--extra-events")
        .arg(events)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "declares category \"studentCalendar\"",
        ));
}

#[test]
fn single_tick_prints_a_countdown_frame() {
    let dir = tempdir().expect("tempdir");
    let periods = dir.path().join("periods.json");
    let events = dir.path().join("events.json");
    fs::write(&periods, valid_periods_json()).expect("write json");
    fs::write(&events, valid_events_json()).expect("write json");

    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--periods")
        .arg(periods)
        .arg("--calendar-events")
        .arg(events)
        .arg("--ticks")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("left until"))
        .stdout(predicate::str::contains("Day progress:"))
        .stdout(predicate::str::contains("Spring Break"))
        .stdout(predicate::str::contains("Spring Break ends"));
}

#[test]
fn invalid_checkout_time_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let periods = dir.path().join("periods.json");
    fs::write(&periods, valid_periods_json()).expect("write json");

    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--periods")
        .arg(periods)
        .arg("--checkout")
        .arg("25:00")
        .arg("--ticks")
        .arg("1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid clock time"));
}

#[test]
fn zero_interval_is_rejected() {
    let mut cmd = cargo_bin_cmd!("schoolclock");
    cmd.arg("--interval-ms")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "--interval-ms must be greater than zero",
        ));
}
