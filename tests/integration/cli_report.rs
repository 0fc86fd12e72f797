use predicates::prelude::*;
use serde_json::Value;

const NOW: &str = "2025-01-10T17:00:00-08:00";

fn approx(v: &Value, expected: f64) -> bool {
  v.as_f64().is_some_and(|x| (x - expected).abs() < 1e-9)
}

fn run_report(extra: &[&str]) -> Value {
  let settings_dir = test_support::tempdir();
  let settings = settings_dir.path().join("settings.json");
  let input = test_support::fixture_path("hierarchy.json");

  let mut cmd = test_support::cmd_bin("issue-cycle-time");
  let out = cmd
    .arg("--input")
    .arg(&input)
    .arg("--settings")
    .arg(&settings)
    .args(["--issue", "FREE-100", "--now-override", NOW])
    .args(extra)
    .output()
    .unwrap();

  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
  assert!(!settings.exists(), "settings must only be written on request");
  serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn report_from_export_has_timelines_tree_and_stats() {
  let v = run_report(&[
    "--select",
    "FREE-100",
    "--group",
    "dev:Dev:api",
    "--group",
    "qa:QA:test",
  ]);

  assert_eq!(v["issue"], "FREE-100");
  assert_eq!(v["issue_count"], 6);

  let keys: Vec<&str> = v["timelines"].as_array().unwrap().iter().map(|t| t["key"].as_str().unwrap()).collect();
  assert_eq!(keys, vec!["FREE-100", "FREE-101", "FREE-102", "FREE-103", "FREE-104", "FREE-105"]);

  // Default exclusions drop To Do / Open / Done intervals.
  let story = &v["timelines"][1];
  assert_eq!(story["segments"].as_array().unwrap().len(), 1);
  assert!(approx(&story["total_cycle_time"], 2.0));
  assert!(v["timelines"][4]["segments"].as_array().unwrap().is_empty());

  let tree = v["tree"].as_array().unwrap();
  assert_eq!(tree.len(), 2);
  assert_eq!(tree[0]["key"], "FREE-100");
  assert_eq!(tree[1]["key"], "FREE-105");

  let stats = &v["stats"];
  assert_eq!(stats["participant_count"], 5);
  assert!(approx(&stats["total_cycle_time"], 4.0));
  assert_eq!(stats["cycle_time_label"], "4 work days");
  assert_eq!(stats["calendar_label"], "0.4 weeks");
  assert_eq!(stats["root_summary"], "Checkout revamp");
  assert_eq!(stats["epic_stats"]["average"], "4 ± 0 work days");
  assert_eq!(stats["story_stats"]["issue_count"], 2);
  assert_eq!(stats["story_stats"]["longest"]["key"], "FREE-101");

  let sub = &stats["sub_task_stats"];
  assert_eq!(sub["global_average"], "1.3 ± 0.4 work days");
  assert_eq!(sub["groups"].as_array().unwrap().len(), 2);
  assert_eq!(sub["longest_group"]["group_id"], "qa");
  assert_eq!(sub["last_group"]["group_name"], "QA");
}

#[test]
fn no_tree_and_root_only_selection() {
  let v = run_report(&["--no-tree", "--root-only", "--exclude-status", "Nothing"]);
  assert!(v.get("tree").is_none());
  assert_eq!(v["stats"]["participant_count"], 1);
  assert!(v["stats"].get("sub_task_stats").is_none());
  // Nothing excluded: the epic keeps its To Do interval.
  assert_eq!(v["timelines"][0]["segments"][0]["status"], "To Do");
}

#[test]
fn default_selection_covers_the_whole_hierarchy() {
  let v = run_report(&[]);
  // FREE-100 and its four descendants; FREE-105 is a separate root.
  assert_eq!(v["stats"]["participant_count"], 5);
  assert_eq!(v["stats"]["sub_task_stats"]["global_average"], "1.3 ± 0.4 work days");
}

#[test]
fn excluded_types_are_removed_with_descendants() {
  let v = run_report(&["--exclude-type", "story"]);
  let keys: Vec<&str> = v["timelines"].as_array().unwrap().iter().map(|t| t["key"].as_str().unwrap()).collect();
  assert_eq!(keys, vec!["FREE-100", "FREE-104"]);
}

#[test]
fn report_can_be_written_to_a_file() {
  let dir = test_support::tempdir();
  let out = dir.path().join("reports").join("free-100.json");
  let settings = dir.path().join("settings.json");

  test_support::cmd_bin("issue-cycle-time")
    .arg("--input")
    .arg(test_support::fixture_path("parent_children.json"))
    .arg("--settings")
    .arg(&settings)
    .arg("--out")
    .arg(&out)
    .args(["--issue", "P", "--now-override", "2023-01-10"])
    .assert()
    .success()
    .stdout(predicate::str::is_empty());

  let v: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
  assert_eq!(v["issue_count"], 2);
  assert_eq!(v["tree"][0]["sub_rows"][0]["key"], "C");
}

#[test]
fn tracker_failures_surface_on_stderr() {
  let dir = test_support::tempdir();
  test_support::cmd_bin("issue-cycle-time")
    .arg("--input")
    .arg(test_support::fixture_path("not_found.json"))
    .arg("--settings")
    .arg(dir.path().join("settings.json"))
    .args(["--issue", "FREE-404"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Issue FREE-404 not found."));
}

#[test]
fn network_source_requires_credentials() {
  let dir = test_support::tempdir();
  test_support::cmd_bin("issue-cycle-time")
    .arg("--settings")
    .arg(dir.path().join("settings.json"))
    .args(["--issue", "FREE-1"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("JIRA_HOST"));
}
