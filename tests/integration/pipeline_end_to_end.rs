use chrono::{DateTime, Utc};
use serde_json::Value;

use issue_cycle_time::hierarchy::flatten_tree;
use issue_cycle_time::model::{IssueTimeline, SubTaskGroup};
use issue_cycle_time::pipeline::{pull, AnalysisOptions, Report};
use issue_cycle_time::selection::Selection;
use issue_cycle_time::settings::Settings;

fn now() -> DateTime<Utc> {
  DateTime::parse_from_rfc3339("2025-01-10T17:00:00-08:00").unwrap().with_timezone(&Utc)
}

fn outline(tree: &[IssueTimeline], level: usize, out: &mut Vec<String>) {
  for node in tree {
    out.push(format!("{}{}", "--".repeat(level), node.key));
    if let Some(children) = &node.sub_rows {
      outline(children, level + 1, out);
    }
  }
}

fn default_options() -> AnalysisOptions {
  let settings = Settings::default();
  AnalysisOptions {
    excluded_statuses: settings.excluded_statuses,
    excluded_issue_types: settings.excluded_issue_types,
  }
}

#[test]
fn export_becomes_nested_tree() {
  test_support::init_tracing();
  test_support::init_insta();
  let raw: Vec<Value> = test_support::read_fixture_json("hierarchy.json");
  let pulled = pull(&raw, &default_options(), now()).unwrap();

  let mut lines = Vec::new();
  outline(&pulled.tree, 0, &mut lines);
  insta::assert_snapshot!(lines.join("\n"), @r"
  FREE-100
  --FREE-101
  ----FREE-102
  ----FREE-103
  --FREE-104
  FREE-105
  ");

  let depths: Vec<usize> = pulled.timelines.iter().map(|t| t.depth).collect();
  assert_eq!(depths, vec![0, 1, 2, 2, 1, 0]);
  assert!(pulled.timelines[5].parent_id.is_none());

  let flat_keys: Vec<String> = flatten_tree(&pulled.tree).into_iter().map(|t| t.key).collect();
  let keys: Vec<String> = pulled.timelines.iter().map(|t| t.key.clone()).collect();
  assert_eq!(flat_keys, keys);
}

#[test]
fn cycle_times_follow_business_hours() {
  let raw: Vec<Value> = test_support::read_fixture_json("hierarchy.json");
  let pulled = pull(&raw, &default_options(), now()).unwrap();

  let totals: Vec<(String, f64)> = pulled.timelines.iter().map(|t| (t.key.clone(), t.total_cycle_time)).collect();
  let expected = [("FREE-100", 4.0), ("FREE-101", 2.0), ("FREE-102", 1.0), ("FREE-103", 1.5), ("FREE-104", 0.0), ("FREE-105", 3.0)];
  for ((key, total), (want_key, want)) in totals.iter().zip(expected) {
    assert_eq!(key, want_key);
    assert!((total - want).abs() < 1e-9, "{key}: {total} != {want}");
  }
}

#[test]
fn stats_and_report_for_the_epic() {
  let raw: Vec<Value> = test_support::read_fixture_json("hierarchy.json");
  let pulled = pull(&raw, &default_options(), now()).unwrap();
  let groups = vec![
    SubTaskGroup { id: "dev".into(), name: "Dev".into(), keywords: vec!["api".into()] },
    SubTaskGroup { id: "qa".into(), name: "QA".into(), keywords: vec!["test".into()] },
  ];
  let selection: Selection = ["FREE-100".to_string()].into_iter().collect();

  let only_root = pulled.stats(&selection, &groups, false).unwrap();
  assert_eq!(only_root.participant_count, 1);
  assert!(only_root.sub_task_stats.is_none());

  let stats = pulled.stats(&selection, &groups, true).unwrap();
  assert_eq!(stats.participant_count, 5);
  assert_eq!(stats.cycle_time_label, "4 work days");
  assert_eq!(stats.root_summary.as_deref(), Some("Checkout revamp"));
  let sub = stats.sub_task_stats.as_ref().unwrap();
  assert_eq!(sub.global_average.as_deref(), Some("1.3 ± 0.4 work days"));
  assert_eq!(sub.last_group.as_ref().map(|g| g.group_id.as_str()), Some("qa"));

  let report = Report::new("FREE-100", pulled, Some(stats), now(), false);
  assert_eq!(report.issue_count, 6);
  let v = serde_json::to_value(&report).unwrap();
  assert!(v.get("tree").is_none());
  assert_eq!(v["timelines"][0]["issue_type_icon_url"], "https://tracker.example.com/icons/epic.svg");
}
