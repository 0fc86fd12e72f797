// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Place intervals on a horizontal timeline as percentages and generate weekly Monday ticks
// role: presentation/layout
// inputs: Instants, a range start and its length in whole minutes
// outputs: Percent offsets/widths; Monday-midnight instants in the reference timezone
// invariants: A zero-length range yields 0 for every position and width; positions before the range start are negative
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::calendar::{from_wall_time, to_wall_time};

fn whole_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
  (to - from).num_minutes()
}

pub fn total_minutes(min: DateTime<Utc>, max: DateTime<Utc>) -> i64 {
  whole_minutes(min, max)
}

pub fn timeline_position(date: DateTime<Utc>, min: DateTime<Utc>, total_minutes: i64) -> f64 {
  if total_minutes == 0 {
    return 0.0;
  }
  whole_minutes(min, date) as f64 / total_minutes as f64 * 100.0
}

pub fn timeline_width(start: DateTime<Utc>, end: DateTime<Utc>, total_minutes: i64) -> f64 {
  if total_minutes == 0 {
    return 0.0;
  }
  whole_minutes(start, end) as f64 / total_minutes as f64 * 100.0
}

/// Every Monday 00:00 (reference wall time) from the week containing `min` through `max`.
pub fn monday_ticks(min: DateTime<Utc>, max: DateTime<Utc>) -> Vec<DateTime<Utc>> {
  let first = to_wall_time(min).date();
  let mut monday = first - Duration::days(first.weekday().num_days_from_monday() as i64);
  let last = to_wall_time(max).date();

  let mut ticks = Vec::new();
  while monday <= last {
    if let Some(at) = from_wall_time(monday.and_time(NaiveTime::MIN)) {
      ticks.push(at);
    }
    monday += Duration::weeks(1);
  }
  ticks
}
