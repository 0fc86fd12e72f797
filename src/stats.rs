// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Aggregate statistics over a selection of issues: global cycle time, calendar weeks, tier and sub-task group summaries
// role: core/stats
// inputs: Selected keys, flat IssueTimeline list, adjacency map, ordered sub-task groups
// outputs: SelectedIssueStats or None when nothing is selected or nothing matches
// invariants:
// - Participants are exactly the selected keys present in the list; the engine never walks the tree to add more
// - Mean and sample stddev ignore zero cycle times; a tier or group without positive values is omitted
// - Group ties resolve by configured order, "other" last
// errors: None; stale keys are ignored
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{HashMap, HashSet};

use crate::calendar::work_duration;
use crate::format::{format_mean_stddev, format_weeks, format_work_days, round1};
use crate::grouping::{classify, group_all, GroupBucket};
use crate::hierarchy::Adjacency;
use crate::model::{
  DistributionPoint, GroupStats, IssueRef, IssueTimeline, SelectedIssueStats, SubTaskGroup, SubTaskStats, TierStats,
};
use crate::selection::Selection;

pub const SUB_TASK_TYPE: &str = "Sub-task";
pub const EPIC_LIKE_TYPES: [&str; 3] = ["Epic", "Feature", "Initiative"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
  EpicLike,
  Standard,
  SubTask,
}

impl Tier {
  pub fn of(issue_type: &str) -> Self {
    if EPIC_LIKE_TYPES.contains(&issue_type) {
      Tier::EpicLike
    } else if issue_type == SUB_TASK_TYPE {
      Tier::SubTask
    } else {
      Tier::Standard
    }
  }
}

/// Mean and sample standard deviation over strictly positive values.
pub fn mean_std_dev(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
  let positive: Vec<f64> = values.into_iter().filter(|v| *v > 0.0).collect();
  if positive.is_empty() {
    return None;
  }
  let n = positive.len() as f64;
  let mean = positive.iter().sum::<f64>() / n;
  let variance = if positive.len() > 1 {
    positive.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
  } else {
    0.0
  };
  Some((mean, variance.sqrt()))
}

fn issue_ref(issue: &IssueTimeline) -> IssueRef {
  IssueRef {
    key: issue.key.clone(),
    summary: issue.summary.clone(),
    value: issue.total_cycle_time,
    label: format_work_days(issue.total_cycle_time),
  }
}

/// First maximum wins.
fn max_by<'a, K: PartialOrd>(issues: &[&'a IssueTimeline], key: impl Fn(&IssueTimeline) -> K) -> Option<&'a IssueTimeline> {
  let mut best: Option<(&'a IssueTimeline, K)> = None;
  for &issue in issues {
    let k = key(issue);
    let better = match &best {
      Some((_, current)) => k > *current,
      None => true,
    };
    if better {
      best = Some((issue, k));
    }
  }
  best.map(|(issue, _)| issue)
}

fn tier_stats(issues: &[&IssueTimeline]) -> Option<TierStats> {
  let (mean, std_dev) = mean_std_dev(issues.iter().map(|i| i.total_cycle_time))?;

  Some(TierStats {
    issue_count: issues.len(),
    average: format_mean_stddev(mean, std_dev),
    longest: max_by(issues, |i| i.total_cycle_time).map(issue_ref),
    last: max_by(issues, |i| i.last_end()).map(issue_ref),
    distribution: issues
      .iter()
      .map(|i| DistributionPoint {
        key: i.key.clone(),
        summary: i.summary.clone(),
        issue_type: i.issue_type.clone(),
        cycle_time: i.total_cycle_time,
        end: i.last_end(),
      })
      .collect(),
  })
}

fn group_stats(bucket: &GroupBucket<'_>) -> Option<GroupStats> {
  let (average, std_dev) = mean_std_dev(bucket.items.iter().map(|i| i.total_cycle_time))?;
  Some(GroupStats {
    group_id: bucket.id.clone(),
    group_name: bucket.name.clone(),
    count: bucket.items.len(),
    average,
    std_dev,
    label: format_mean_stddev(average, std_dev),
  })
}

fn zero_group_stats(bucket: &GroupBucket<'_>) -> GroupStats {
  GroupStats {
    group_id: bucket.id.clone(),
    group_name: bucket.name.clone(),
    count: bucket.items.len(),
    average: 0.0,
    std_dev: 0.0,
    label: format_mean_stddev(0.0, 0.0),
  }
}

/// One vote per parent: the group of that parent's latest-ending selected sub-task.
fn last_group_id(
  sub_tasks: &[&IssueTimeline],
  adjacency: &Adjacency,
  groups: &[SubTaskGroup],
  bucket_order: &[String],
) -> Option<String> {
  let selected: HashMap<&str, &IssueTimeline> = sub_tasks.iter().map(|t| (t.key.as_str(), *t)).collect();

  let mut parents: Vec<&str> = Vec::new();
  let mut seen: HashSet<&str> = HashSet::new();
  for task in sub_tasks {
    if let Some(parent) = task.parent_id.as_deref() {
      if seen.insert(parent) {
        parents.push(parent);
      }
    }
  }

  let mut votes: HashMap<String, usize> = HashMap::new();
  for parent in parents {
    let children: Vec<&IssueTimeline> = adjacency
      .children(parent)
      .iter()
      .filter_map(|k| selected.get(k.as_str()).copied())
      .collect();
    if let Some(latest) = max_by(&children, |c| c.last_end()) {
      *votes.entry(classify(&latest.summary, groups)).or_default() += 1;
    }
  }

  let mut winner: Option<(&String, usize)> = None;
  for id in bucket_order {
    let count = votes.get(id).copied().unwrap_or(0);
    if count > 0 && winner.map_or(true, |(_, best)| count > best) {
      winner = Some((id, count));
    }
  }
  winner.map(|(id, _)| id.clone())
}

fn sub_task_stats(sub_tasks: &[&IssueTimeline], adjacency: &Adjacency, groups: &[SubTaskGroup]) -> SubTaskStats {
  let buckets = group_all(sub_tasks, groups);
  let order: Vec<String> = buckets.iter().map(|b| b.id.clone()).collect();

  let group_list: Vec<GroupStats> = buckets.iter().filter_map(group_stats).collect();

  let mut longest_group: Option<&GroupStats> = None;
  for g in &group_list {
    if longest_group.map_or(true, |best| g.average > best.average) {
      longest_group = Some(g);
    }
  }

  // The vote winner is reported even when none of its members has a positive cycle time.
  let last_group = last_group_id(sub_tasks, adjacency, groups, &order)
    .and_then(|id| buckets.iter().find(|b| b.id == id))
    .map(|b| group_stats(b).unwrap_or_else(|| zero_group_stats(b)));

  SubTaskStats {
    tier: tier_stats(sub_tasks),
    global_average: mean_std_dev(sub_tasks.iter().map(|t| t.total_cycle_time)).map(|(m, s)| format_mean_stddev(m, s)),
    longest_group: longest_group.cloned(),
    last_group,
    groups: group_list,
  }
}

pub fn compute_stats(
  selection: &Selection,
  all_issues: &[IssueTimeline],
  adjacency: &Adjacency,
  groups: &[SubTaskGroup],
) -> Option<SelectedIssueStats> {
  if selection.is_empty() || all_issues.is_empty() {
    return None;
  }

  let mut seen: HashSet<&str> = HashSet::new();
  let participants: Vec<&IssueTimeline> = all_issues
    .iter()
    .filter(|t| selection.contains(&t.key) && seen.insert(t.key.as_str()))
    .collect();
  if participants.is_empty() {
    return None;
  }

  let min_start = participants.iter().flat_map(|t| t.segments.iter().map(|s| s.start)).min();
  let max_end = participants.iter().flat_map(|t| t.segments.iter().map(|s| s.end)).max();
  let (total_cycle_time, calendar_weeks) = match (min_start, max_end) {
    (Some(start), Some(end)) => {
      let days = (end - start).num_days();
      (work_duration(start, end), round1(days as f64 / 7.0))
    }
    _ => (0.0, 0.0),
  };

  let root_summary = participants.iter().map(|t| t.depth).min().and_then(|min_depth| {
    let mut roots = participants.iter().filter(|t| t.depth == min_depth);
    match (roots.next(), roots.next()) {
      (Some(only), None) => Some(only.summary.clone()),
      _ => None,
    }
  });

  let by_tier = |tier: Tier| -> Vec<&IssueTimeline> {
    participants
      .iter()
      .copied()
      .filter(|t| Tier::of(&t.issue_type) == tier)
      .collect()
  };
  let epics = by_tier(Tier::EpicLike);
  let standard = by_tier(Tier::Standard);
  let sub_tasks = by_tier(Tier::SubTask);

  Some(SelectedIssueStats {
    participant_count: participants.len(),
    total_cycle_time,
    cycle_time_label: format_work_days(total_cycle_time),
    calendar_weeks,
    calendar_label: format_weeks(calendar_weeks),
    root_summary,
    epic_stats: tier_stats(&epics),
    story_stats: tier_stats(&standard),
    sub_task_stats: if sub_tasks.is_empty() {
      None
    } else {
      Some(sub_task_stats(&sub_tasks, adjacency, groups))
    },
  })
}
