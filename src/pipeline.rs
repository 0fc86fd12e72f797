// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate one pull: raw issues -> flat timelines -> type exclusion -> status filter -> tree; statistics over a selection
// role: processing/orchestrator
// inputs: Raw issue JSON values, AnalysisOptions, analysis cutoff; selection and groups for statistics
// outputs: Pull (flat list, adjacency, tree) and the serializable Report
// invariants:
// - Adjacency is rebuilt after cascading type exclusion, before anything consumes it
// - Status filtering never changes hierarchy fields, so the tree is built from the filtered list
// - Every pull rebuilds everything from scratch; nothing is cached between pulls
// errors: Normalization failures surface with the offending issue in context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::filter::filter_statuses;
use crate::hierarchy::{build_tree, filter_timeline_by_issue_type, reconstruct, Adjacency};
use crate::model::{IssueTimeline, SelectedIssueStats, SubTaskGroup};
use crate::selection::{expand_with_descendants, Selection};
use crate::stats::compute_stats;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisOptions {
  pub excluded_statuses: Vec<String>,
  pub excluded_issue_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Pull {
  /// Flat preorder list after type exclusion and status filtering.
  pub timelines: Vec<IssueTimeline>,
  pub adjacency: Adjacency,
  pub tree: Vec<IssueTimeline>,
}

pub fn pull(raw: &[Value], options: &AnalysisOptions, now: DateTime<Utc>) -> Result<Pull> {
  let reconstructed = reconstruct(raw, now).context("normalizing raw issues")?;
  debug!(count = reconstructed.len(), "reconstructed hierarchy");

  let adjacency = Adjacency::build(&reconstructed);
  let kept = filter_timeline_by_issue_type(&reconstructed, &options.excluded_issue_types, &adjacency);
  if kept.len() != reconstructed.len() {
    debug!(removed = reconstructed.len() - kept.len(), "excluded by issue type");
  }
  let adjacency = Adjacency::build(&kept);

  let timelines = filter_statuses(&kept, &options.excluded_statuses);
  let tree = build_tree(&timelines);

  info!(issues = timelines.len(), roots = tree.len(), "pull complete");
  Ok(Pull { timelines, adjacency, tree })
}

impl Pull {
  /// Statistics over `selection`, optionally closed over descendants first.
  pub fn stats(&self, selection: &Selection, groups: &[SubTaskGroup], with_descendants: bool) -> Option<SelectedIssueStats> {
    let participants = if with_descendants {
      expand_with_descendants(selection, &self.adjacency)
    } else {
      selection.clone()
    };
    compute_stats(&participants, &self.timelines, &self.adjacency, groups)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
  pub issue: String,
  pub generated_at: DateTime<Utc>,
  pub issue_count: usize,
  pub timelines: Vec<IssueTimeline>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tree: Option<Vec<IssueTimeline>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stats: Option<SelectedIssueStats>,
}

impl Report {
  pub fn new(issue: &str, pull: Pull, stats: Option<SelectedIssueStats>, generated_at: DateTime<Utc>, with_tree: bool) -> Self {
    Self {
      issue: issue.to_string(),
      generated_at,
      issue_count: pull.timelines.len(),
      tree: with_tree.then_some(pull.tree),
      timelines: pull.timelines,
      stats,
    }
  }
}
