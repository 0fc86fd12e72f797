// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Drop status intervals whose status is excluded and recompute each issue's total cycle time
// role: core/filter
// inputs: Flat IssueTimeline list; excluded status names
// outputs: New IssueTimeline list with surviving intervals only
// invariants:
// - Comparison is trim + lowercase on both sides
// - depth, parent_id and has_children are untouched; total_cycle_time is the sum of surviving intervals
// - Applying the same exclusion twice is a no-op
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashSet;

use crate::model::IssueTimeline;
use crate::timeline::total_duration;

fn status_key(name: &str) -> String {
  name.trim().to_lowercase()
}

pub fn filter_statuses(timelines: &[IssueTimeline], excluded_statuses: &[String]) -> Vec<IssueTimeline> {
  let excluded: HashSet<String> = excluded_statuses
    .iter()
    .map(|s| status_key(s))
    .filter(|s| !s.is_empty())
    .collect();

  timelines
    .iter()
    .map(|t| {
      let segments: Vec<_> = t
        .segments
        .iter()
        .filter(|s| !excluded.contains(&status_key(&s.status)))
        .cloned()
        .collect();

      IssueTimeline {
        total_cycle_time: total_duration(&segments),
        segments,
        ..t.clone()
      }
    })
    .collect()
}
