// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Classify sub-task summaries into keyword groups; bucket issues per group
// role: core/grouping
// inputs: Summary text or IssueTimeline list; ordered SubTaskGroup list
// outputs: Group id per summary; ordered buckets for every configured group plus "other"
// invariants:
// - Group list order is priority; within a group, keyword order; first substring hit wins
// - `*` is stripped from keywords and matching is a plain contains test
// - Buckets exist for every configured group and for "other", even when empty
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::model::{IssueTimeline, SubTaskGroup};

pub const OTHER_GROUP_ID: &str = "other";
pub const OTHER_GROUP_NAME: &str = "Other";

fn keyword_needle(keyword: &str) -> String {
  keyword.trim().to_lowercase().replace('*', "")
}

pub fn classify(summary: &str, groups: &[SubTaskGroup]) -> String {
  let haystack = summary.to_lowercase();

  for group in groups {
    let hit = group
      .keywords
      .iter()
      .map(|k| keyword_needle(k))
      .any(|needle| !needle.is_empty() && haystack.contains(&needle));
    if hit {
      return group.id.clone();
    }
  }
  OTHER_GROUP_ID.to_string()
}

/// One bucket of classified issues.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBucket<'a> {
  pub id: String,
  pub name: String,
  pub items: Vec<&'a IssueTimeline>,
}

/// Buckets in configured order with "other" last. A configured "other" group names that bucket.
pub fn group_all<'a>(items: &[&'a IssueTimeline], groups: &[SubTaskGroup]) -> Vec<GroupBucket<'a>> {
  let mut buckets: Vec<GroupBucket<'a>> = groups
    .iter()
    .filter(|g| g.id != OTHER_GROUP_ID)
    .map(|g| GroupBucket { id: g.id.clone(), name: g.name.clone(), items: Vec::new() })
    .collect();
  let other_name = groups
    .iter()
    .find(|g| g.id == OTHER_GROUP_ID)
    .map_or(OTHER_GROUP_NAME, |g| g.name.as_str());
  buckets.push(GroupBucket { id: OTHER_GROUP_ID.into(), name: other_name.into(), items: Vec::new() });

  for &item in items {
    let id = classify(&item.summary, groups);
    let slot = buckets
      .iter()
      .position(|b| b.id == id)
      .unwrap_or(buckets.len() - 1);
    buckets[slot].items.push(item);
  }
  buckets
}

/// Parse the `id:Name:kw1,kw2` command-line form.
pub fn parse_group_spec(raw: &str) -> Option<SubTaskGroup> {
  let mut parts = raw.splitn(3, ':');
  let id = parts.next()?.trim();
  let name = parts.next()?.trim();
  if id.is_empty() || name.is_empty() {
    return None;
  }
  let keywords = parts
    .next()
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|k| !k.is_empty())
    .map(String::from)
    .collect();
  Some(SubTaskGroup { id: id.into(), name: name.into(), keywords })
}
