// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Rebuild the parent/child hierarchy from flat issue records; DFS flattening, nested tree, sibling sort, cascading type exclusion
// role: core/hierarchy
// inputs: Raw issues or normalized records; flat IssueTimeline lists; adjacency maps
// outputs: Preorder flat list with depth/parent_id/has_children; nested roots with sub_rows; filtered flat lists
// invariants:
// - Edges are trusted only when the parent key exists in the input set and differs from the child key
// - A parent reference to an absent key makes the issue a root; nothing is dropped
// - Cycles never loop: unreached members are promoted to roots (parent cleared) in input order
// - Empty child lists are pruned to None in the tree
// errors: NormalizeError from raw input only; tree operations are infallible
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::model::IssueTimeline;
use crate::normalize::{normalize, IssueRecord, NormalizeError};
use crate::timeline::build_timeline;

/// parent key -> child keys, in flat-list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
  children: HashMap<String, Vec<String>>,
}

impl Adjacency {
  pub fn build(flat: &[IssueTimeline]) -> Self {
    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    for item in flat {
      if let Some(parent) = &item.parent_id {
        children.entry(parent.clone()).or_default().push(item.key.clone());
      }
    }
    Self { children }
  }

  pub fn children(&self, key: &str) -> &[String] {
    self.children.get(key).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn has_children(&self, key: &str) -> bool {
    !self.children(key).is_empty()
  }

  /// All descendants of `key`, breadth first, excluding `key` itself.
  pub fn descendants(&self, key: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::from([key]);
    let mut queue: VecDeque<&str> = VecDeque::from([key]);

    while let Some(current) = queue.pop_front() {
      for child in self.children(current) {
        if seen.insert(child.as_str()) {
          out.push(child.clone());
          queue.push_back(child.as_str());
        }
      }
    }
    out
  }

  pub fn is_empty(&self) -> bool {
    self.children.is_empty()
  }
}

/// Normalize raw issues, build their timelines and return them in hierarchy preorder.
pub fn reconstruct(raw: &[Value], now: DateTime<Utc>) -> Result<Vec<IssueTimeline>, NormalizeError> {
  let records = raw.iter().map(normalize).collect::<Result<Vec<_>, _>>()?;
  Ok(reconstruct_records(&records, now))
}

pub fn reconstruct_records(records: &[IssueRecord], now: DateTime<Utc>) -> Vec<IssueTimeline> {
  let n = records.len();

  let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
  let mut canonical = vec![false; n];
  for (i, r) in records.iter().enumerate() {
    if index.contains_key(r.key.as_str()) {
      warn!(key = %r.key, "duplicate issue key in input; keeping first occurrence");
      continue;
    }
    index.insert(r.key.as_str(), i);
    canonical[i] = true;
  }

  let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
  let mut has_parent = vec![false; n];
  for (i, r) in records.iter().enumerate() {
    if !canonical[i] {
      continue;
    }
    let parent = r.parent_key.as_deref().and_then(|k| index.get(k).copied());
    if let Some(p) = parent.filter(|p| *p != i) {
      children[p].push(i);
      has_parent[i] = true;
    }
  }

  let timelines: Vec<IssueTimeline> = records.iter().map(|r| build_timeline(r, now)).collect();

  let mut visited = vec![false; n];
  let mut out: Vec<IssueTimeline> = Vec::with_capacity(n);

  let roots = (0..n).filter(|i| canonical[*i] && !has_parent[*i]);
  // Roots first, then anything only reachable through a cycle.
  let starts: Vec<usize> = roots.chain(0..n).collect();

  for start in starts {
    if !canonical[start] || visited[start] {
      continue;
    }

    let mut stack: Vec<(usize, usize, Option<usize>)> = vec![(start, 0, None)];
    while let Some((i, depth, parent)) = stack.pop() {
      if visited[i] {
        continue;
      }
      visited[i] = true;

      let pending: Vec<usize> = children[i].iter().copied().filter(|c| !visited[*c]).collect();

      let mut node = timelines[i].clone();
      node.depth = depth;
      node.has_children = !pending.is_empty();
      node.parent_id = parent.map(|p| records[p].key.clone());
      out.push(node);

      for child in pending.into_iter().rev() {
        stack.push((child, depth + 1, Some(i)));
      }
    }
  }

  out
}

/// Order siblings: issues with intervals by first start, then interval-less issues by key.
pub fn sort_issue_timelines(items: Vec<IssueTimeline>) -> Vec<IssueTimeline> {
  let (mut dated, mut undated): (Vec<IssueTimeline>, Vec<IssueTimeline>) =
    items.into_iter().partition(|t| !t.segments.is_empty());

  dated.sort_by_key(|t| t.first_start());
  undated.sort_by(|a, b| a.key.cmp(&b.key));

  dated.extend(undated);
  dated
}

/// Nest a flat list into roots with `sub_rows`, sorted at every level.
pub fn build_tree(flat: &[IssueTimeline]) -> Vec<IssueTimeline> {
  let n = flat.len();
  let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
  for (i, item) in flat.iter().enumerate() {
    index.entry(item.key.as_str()).or_insert(i);
  }

  let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
  let mut roots: Vec<usize> = Vec::new();
  for (i, item) in flat.iter().enumerate() {
    if index.get(item.key.as_str()) != Some(&i) {
      continue;
    }
    match item.parent_id.as_deref().and_then(|p| index.get(p).copied()) {
      Some(p) if p != i => children[p].push(i),
      _ => roots.push(i),
    }
  }

  let mut visited = vec![false; n];
  let mut tree: Vec<IssueTimeline> = Vec::new();

  for i in roots {
    if let Some(node) = assemble(i, flat, &children, &mut visited) {
      tree.push(node);
    }
  }

  // Members of a parent cycle are never reached from a root.
  for i in 0..n {
    if index.get(flat[i].key.as_str()) == Some(&i) && !visited[i] {
      warn!(key = %flat[i].key, "issue unreachable from any root; promoting to root");
      if let Some(mut node) = assemble(i, flat, &children, &mut visited) {
        node.parent_id = None;
        tree.push(node);
      }
    }
  }

  sort_issue_timelines(tree)
}

fn assemble(i: usize, flat: &[IssueTimeline], children: &[Vec<usize>], visited: &mut [bool]) -> Option<IssueTimeline> {
  if visited[i] {
    return None;
  }
  visited[i] = true;

  let mut kids: Vec<IssueTimeline> = Vec::new();
  for c in &children[i] {
    if let Some(child) = assemble(*c, flat, children, visited) {
      kids.push(child);
    }
  }

  let mut node = flat[i].clone();
  node.has_children = !kids.is_empty();
  node.sub_rows = if kids.is_empty() { None } else { Some(sort_issue_timelines(kids)) };
  Some(node)
}

/// Preorder walk of a tree back into a flat list (sub_rows stripped).
pub fn flatten_tree(tree: &[IssueTimeline]) -> Vec<IssueTimeline> {
  let mut out: Vec<IssueTimeline> = Vec::new();
  let mut stack: Vec<&IssueTimeline> = tree.iter().rev().collect();

  while let Some(node) = stack.pop() {
    let mut flat = node.clone();
    flat.sub_rows = None;
    out.push(flat);
    if let Some(kids) = &node.sub_rows {
      stack.extend(kids.iter().rev());
    }
  }
  out
}

/// Drop every issue whose type is excluded (case-insensitive) together with all of its descendants.
pub fn filter_timeline_by_issue_type(
  flat: &[IssueTimeline],
  excluded_types: &[String],
  adjacency: &Adjacency,
) -> Vec<IssueTimeline> {
  let excluded: HashSet<String> = excluded_types
    .iter()
    .map(|t| t.trim().to_lowercase())
    .filter(|t| !t.is_empty())
    .collect();

  if excluded.is_empty() {
    return flat.to_vec();
  }

  let mut removed: HashSet<String> = HashSet::new();
  for item in flat {
    if excluded.contains(&item.issue_type.trim().to_lowercase()) {
      removed.insert(item.key.clone());
      removed.extend(adjacency.descendants(&item.key));
    }
  }

  flat
    .iter()
    .filter(|t| !removed.contains(&t.key))
    .cloned()
    .collect()
}
