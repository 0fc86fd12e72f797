// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Selection and expand/collapse state transitions over the issue hierarchy
// role: core/selection
// inputs: Current and requested key sets; adjacency map; nested tree
// outputs: Next selection sets; next expanded-row map and sub-task visibility flag
// invariants:
// - Adding a key adds all its descendants; removing a key removes all its descendants
// - Single selection never holds more than one key
// - Epic and Feature rows are never toggled by the sub-task visibility switch
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};

use crate::hierarchy::Adjacency;
use crate::model::IssueTimeline;

pub type Selection = BTreeSet<String>;

/// Apply `next` over `current`, cascading adds and removals to descendants.
pub fn toggle_with_descendants(current: &Selection, next: &Selection, adjacency: &Adjacency) -> Selection {
  let mut result = next.clone();

  for added in next.difference(current) {
    result.extend(adjacency.descendants(added));
  }
  for removed in current.difference(next) {
    for d in adjacency.descendants(removed) {
      result.remove(&d);
    }
  }
  result
}

/// Keep only the newly added key; otherwise the last requested key.
pub fn single_selection(current: &[String], next: &[String]) -> Selection {
  let pick = next
    .iter()
    .find(|k| !current.contains(*k))
    .or_else(|| next.last());
  pick.into_iter().cloned().collect()
}

/// Selection closed over descendants.
pub fn expand_with_descendants(keys: &Selection, adjacency: &Adjacency) -> Selection {
  let mut out = keys.clone();
  for key in keys {
    out.extend(adjacency.descendants(key));
  }
  out
}

pub fn extract_all_keys(tree: &[IssueTimeline]) -> BTreeMap<String, bool> {
  let mut acc = BTreeMap::new();
  let mut stack: Vec<&IssueTimeline> = tree.iter().collect();
  while let Some(node) = stack.pop() {
    acc.insert(node.key.clone(), true);
    if let Some(kids) = &node.sub_rows {
      stack.extend(kids.iter());
    }
  }
  acc
}

/// Row expansion state: everything expanded, or an explicit per-key map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expanded {
  All,
  Keys(BTreeMap<String, bool>),
}

fn toggles_with_sub_tasks(node: &IssueTimeline) -> bool {
  node.has_children && node.issue_type != "Epic" && node.issue_type != "Feature"
}

/// Flip sub-task visibility: every non-Epic/Feature parent row is set to the new visibility.
pub fn next_expanded(current: &Expanded, tree: &[IssueTimeline], subtasks_visible: bool) -> (BTreeMap<String, bool>, bool) {
  let mut next = match current {
    Expanded::All => extract_all_keys(tree),
    Expanded::Keys(keys) => keys.clone(),
  };

  let mut stack: Vec<&IssueTimeline> = tree.iter().collect();
  while let Some(node) = stack.pop() {
    if toggles_with_sub_tasks(node) {
      next.insert(node.key.clone(), !subtasks_visible);
    }
    if let Some(kids) = &node.sub_rows {
      stack.extend(kids.iter());
    }
  }
  (next, !subtasks_visible)
}
