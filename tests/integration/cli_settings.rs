use predicates::prelude::*;
use serde_json::Value;

#[test]
fn missing_issue_is_a_usage_error() {
  let dir = test_support::tempdir();
  test_support::cmd_bin("issue-cycle-time")
    .arg("--settings")
    .arg(dir.path().join("settings.json"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Provide --issue"));
}

#[test]
fn saved_settings_drive_the_next_run() {
  let dir = test_support::tempdir();
  let settings = dir.path().join("cfg").join("settings.json");
  let input = test_support::fixture_path("hierarchy.json");

  test_support::cmd_bin("issue-cycle-time")
    .arg("--input")
    .arg(&input)
    .arg("--settings")
    .arg(&settings)
    .args([
      "--issue",
      "FREE-100",
      "--exclude-type",
      "Bug",
      "--group",
      "dev:Dev:api",
      "--save-settings",
      "--now-override",
      "2025-01-10T17:00:00-08:00",
    ])
    .assert()
    .success();

  let saved: Value = serde_json::from_str(&std::fs::read_to_string(&settings).unwrap()).unwrap();
  assert_eq!(saved["last_issue_id"], "FREE-100");
  assert_eq!(saved["excluded_issue_types"][0], "Bug");
  assert_eq!(saved["sub_task_groups"][0]["id"], "dev");
  assert_eq!(saved["excluded_statuses"].as_array().unwrap().len(), 6);

  // No --issue: the saved issue and exclusions apply.
  let out = test_support::cmd_bin("issue-cycle-time")
    .arg("--input")
    .arg(&input)
    .arg("--settings")
    .arg(&settings)
    .args(["--now-override", "2025-01-10T17:00:00-08:00"])
    .output()
    .unwrap();
  assert!(out.status.success());
  let v: Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(v["issue"], "FREE-100");
  assert_eq!(v["issue_count"], 5);
}

#[test]
fn corrupt_settings_file_is_reported() {
  let dir = test_support::tempdir();
  let settings = dir.path().join("settings.json");
  std::fs::write(&settings, "{ nope").unwrap();
  test_support::cmd_bin("issue-cycle-time")
    .arg("--settings")
    .arg(&settings)
    .args(["--issue", "FREE-1"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("parsing settings"));
}
