// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Turn one issue's changelog into a gapless, chronological sequence of status intervals
// role: core/timeline
// inputs: IssueRecord (normalized raw issue), analysis cutoff `now`
// outputs: IssueTimeline with segments and total_cycle_time (depth/parent set later by hierarchy)
// invariants:
// - First interval starts at creation; last interval ends at max(now, last cursor)
// - Consecutive intervals share endpoints; durations come from the business calendar only
// - Zero status history yields exactly one interval tagged with the current status
// errors: None; unparseable history dates and non-status items are skipped
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};

use crate::calendar::{parse_tracker_timestamp, work_duration};
use crate::model::{ChangeEvent, IssueTimeline, StatusInterval};
use crate::normalize::{HistoryEntry, IssueRecord};

const STATUS_FIELD: &str = "status";

/// Status transitions from changelog histories, oldest first.
pub fn extract_changes(histories: &[HistoryEntry]) -> Vec<ChangeEvent> {
  let mut changes: Vec<ChangeEvent> = histories
    .iter()
    .filter_map(|entry| {
      let item = entry
        .items
        .iter()
        .find(|i| i.field.as_deref() == Some(STATUS_FIELD))?;
      let date = entry.created.as_deref().and_then(parse_tracker_timestamp)?;

      Some(ChangeEvent {
        date,
        from_status: item.from_status.as_deref().unwrap_or_default().trim().to_string(),
        to_status: item.to_status.as_deref().unwrap_or_default().trim().to_string(),
      })
    })
    .collect();

  // Stable: equal timestamps keep history order.
  changes.sort_by_key(|c| c.date);
  changes
}

fn interval(status: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> StatusInterval {
  StatusInterval {
    status: status.to_string(),
    start,
    end,
    duration_work_days: work_duration(start, end),
  }
}

/// Sum of interval durations, in order.
pub fn total_duration(segments: &[StatusInterval]) -> f64 {
  segments.iter().map(|s| s.duration_work_days).sum()
}

pub fn build_timeline(record: &IssueRecord, now: DateTime<Utc>) -> IssueTimeline {
  let changes = extract_changes(&record.histories);

  let mut current = match changes.first() {
    Some(first) => first.from_status.clone(),
    None => record.status.trim().to_string(),
  };
  let mut cursor = record.created;
  let mut segments: Vec<StatusInterval> = Vec::with_capacity(changes.len() + 1);

  for change in &changes {
    if change.date > cursor {
      segments.push(interval(&current, cursor, change.date));
      cursor = change.date;
    }
    current = change.to_status.clone();
  }

  segments.push(interval(&current, cursor, now.max(cursor)));

  IssueTimeline {
    key: record.key.clone(),
    url: record.url.clone(),
    summary: record.summary.clone(),
    issue_type: record.issue_type.clone(),
    issue_type_icon_url: record.issue_type_icon_url.clone(),
    total_cycle_time: total_duration(&segments),
    segments,
    depth: 0,
    has_children: false,
    parent_id: None,
    sub_rows: None,
  }
}
