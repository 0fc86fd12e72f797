use std::collections::HashMap;

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use serde_json::{json, Value};

use issue_cycle_time::filter::filter_statuses;
use issue_cycle_time::pipeline::{pull, AnalysisOptions};

const TYPES: [&str; 4] = ["Epic", "Story", "Sub-task", "Bug"];
const STATUSES: [&str; 4] = ["To Do", "In Progress", "Review", "Done"];

fn now() -> DateTime<Utc> {
  DateTime::parse_from_rfc3339("2025-02-28T17:00:00Z").unwrap().with_timezone(&Utc)
}

/// Node i may only point at an earlier node, so every generated forest is acyclic.
fn forest() -> impl Strategy<Value = Vec<(Option<usize>, usize, usize)>> {
  prop::collection::vec((any::<Option<prop::sample::Index>>(), 0..TYPES.len(), 0..STATUSES.len()), 1..24).prop_map(|nodes| {
    nodes
      .into_iter()
      .enumerate()
      .map(|(i, (parent, ty, status))| (parent.filter(|_| i > 0).map(|p| p.index(i)), ty, status))
      .collect()
  })
}

fn raw_issues(nodes: &[(Option<usize>, usize, usize)]) -> Vec<Value> {
  nodes
    .iter()
    .enumerate()
    .map(|(i, (parent, ty, status))| {
      let mut issue = json!({
        "key": format!("K-{i}"),
        "summary": format!("issue {i}"),
        "status": STATUSES[*status],
        "issueType": TYPES[*ty],
        "created": format!("2025-01-{:02}T10:00:00Z", (i % 27) + 1),
        "changelog": { "histories": [
          { "created": "2025-02-03T18:00:00Z",
            "items": [ { "field": "status", "fromString": "To Do", "toString": STATUSES[*status] } ] }
        ] }
      });
      if let Some(p) = parent {
        issue["parentKey"] = json!(format!("K-{p}"));
      }
      issue
    })
    .collect()
}

proptest! {
  #[test]
  fn excluded_types_take_every_descendant_with_them(nodes in forest(), excluded in 0..TYPES.len()) {
    let raw = raw_issues(&nodes);
    let opts = AnalysisOptions { excluded_statuses: vec![], excluded_issue_types: vec![TYPES[excluded].to_lowercase()] };
    let pulled = pull(&raw, &opts, now()).unwrap();

    let parents: HashMap<String, String> = nodes
      .iter()
      .enumerate()
      .filter_map(|(i, (p, _, _))| p.map(|p| (format!("K-{i}"), format!("K-{p}"))))
      .collect();
    let types: HashMap<String, &str> = nodes.iter().enumerate().map(|(i, (_, t, _))| (format!("K-{i}"), TYPES[*t])).collect();

    for t in &pulled.timelines {
      let mut cursor = Some(t.key.clone());
      while let Some(key) = cursor {
        prop_assert_ne!(types[key.as_str()], TYPES[excluded]);
        cursor = parents.get(&key).cloned();
      }
    }
  }

  #[test]
  fn status_filtering_is_idempotent_on_pipeline_output(nodes in forest(), excluded in 0..STATUSES.len()) {
    let raw = raw_issues(&nodes);
    let statuses = vec![STATUSES[excluded].to_string()];
    let opts = AnalysisOptions { excluded_statuses: statuses.clone(), excluded_issue_types: vec![] };
    let pulled = pull(&raw, &opts, now()).unwrap();

    prop_assert_eq!(pulled.timelines.len(), nodes.len());
    prop_assert_eq!(filter_statuses(&pulled.timelines, &statuses), pulled.timelines.clone());
    for t in &pulled.timelines {
      prop_assert!(t.segments.iter().all(|s| s.status != STATUSES[excluded]));
    }
  }
}
