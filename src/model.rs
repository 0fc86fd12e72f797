// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the JSON model (intervals, timelines, groups, statistics) shared by the core and the report
// role: model/types
// outputs: Serializable structs with stable field names and optional nested/derived fields
// invariants: Intervals within one timeline are contiguous and ordered; total_cycle_time equals the sum of segment durations
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One contiguous stretch of time an issue spent in a single status.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusInterval {
  pub status: String,
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
  pub duration_work_days: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IssueTimeline {
  pub key: String,
  pub url: String,
  pub summary: String,
  pub issue_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub issue_type_icon_url: Option<String>,
  pub segments: Vec<StatusInterval>,
  pub total_cycle_time: f64,
  pub depth: usize,
  pub has_children: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub sub_rows: Option<Vec<IssueTimeline>>,
}

impl IssueTimeline {
  pub fn first_start(&self) -> Option<DateTime<Utc>> {
    self.segments.first().map(|s| s.start)
  }

  pub fn last_end(&self) -> Option<DateTime<Utc>> {
    self.segments.last().map(|s| s.end)
  }
}

/// A status transition pulled out of one changelog history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
  pub date: DateTime<Utc>,
  pub from_status: String,
  pub to_status: String,
}

/// Keyword bucket for sub-task classification. List position is priority.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubTaskGroup {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub keywords: Vec<String>,
}

/// Short reference to an issue surfaced in statistics (longest, last).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IssueRef {
  pub key: String,
  pub summary: String,
  pub value: f64,
  pub label: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DistributionPoint {
  pub key: String,
  pub summary: String,
  pub issue_type: String,
  pub cycle_time: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TierStats {
  pub issue_count: usize,
  pub average: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub longest: Option<IssueRef>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last: Option<IssueRef>,
  pub distribution: Vec<DistributionPoint>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GroupStats {
  pub group_id: String,
  pub group_name: String,
  pub count: usize,
  pub average: f64,
  pub std_dev: f64,
  pub label: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubTaskStats {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tier: Option<TierStats>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub global_average: Option<String>,
  pub groups: Vec<GroupStats>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub longest_group: Option<GroupStats>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_group: Option<GroupStats>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SelectedIssueStats {
  pub participant_count: usize,
  pub total_cycle_time: f64,
  pub cycle_time_label: String,
  pub calendar_weeks: f64,
  pub calendar_label: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub root_summary: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub epic_stats: Option<TierStats>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub story_stats: Option<TierStats>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sub_task_stats: Option<SubTaskStats>,
}
