// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Business calendar (09:00-17:00 Pacific, weekends and holidays off) and tracker timestamp parsing
// role: core/calendar
// inputs: UTC instants; static holiday list (data/holidays.json) as YYYY-MM-DD in the reference timezone
// outputs: Elapsed work days (8h = 1.0) as f64; parsed UTC instants
// invariants:
// - work_duration(start, end) == 0.0 whenever start > end; never panics
// - No rounding; fractional days are meaningful
// - Day walk is inclusive of both wall-clock end days
// errors: None; unparseable timestamps yield None
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use once_cell::sync::Lazy;

/// The one timezone whose wall clock defines the workday.
pub const REFERENCE_TZ: Tz = chrono_tz::America::Los_Angeles;

pub const WORKDAY_START_HOUR: i64 = 9;
pub const WORKDAY_END_HOUR: i64 = 17;
pub const MINUTES_PER_WORKDAY: f64 = 480.0;

static BUILTIN_HOLIDAYS: &str = include_str!("../data/holidays.json");

static DEFAULT_CALENDAR: Lazy<BusinessCalendar> = Lazy::new(BusinessCalendar::with_builtin_holidays);

#[derive(Debug, Clone, Default)]
pub struct BusinessCalendar {
  holidays: BTreeSet<NaiveDate>,
}

impl BusinessCalendar {
  pub fn new<I>(holidays: I) -> Self
  where
    I: IntoIterator<Item = NaiveDate>,
  {
    Self {
      holidays: holidays.into_iter().collect(),
    }
  }

  /// Calendar backed by the holiday list compiled into the binary.
  pub fn with_builtin_holidays() -> Self {
    let raw: Vec<String> = serde_json::from_str(BUILTIN_HOLIDAYS).unwrap_or_default();
    Self::new(
      raw
        .iter()
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
    )
  }

  pub fn is_holiday(&self, day: NaiveDate) -> bool {
    self.holidays.contains(&day)
  }

  pub fn is_workday(&self, day: NaiveDate) -> bool {
    !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(day)
  }

  /// Work days elapsed between two instants.
  pub fn work_duration(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    if start > end {
      return 0.0;
    }

    let start_wall = to_wall_time(start);
    let end_wall = to_wall_time(end);

    let mut day = start_wall.date();
    let last_day = end_wall.date();
    let mut total_ms: i64 = 0;

    while day <= last_day {
      if self.is_workday(day) {
        let midnight = day.and_time(NaiveTime::MIN);
        let open = midnight + Duration::hours(WORKDAY_START_HOUR);
        let close = midnight + Duration::hours(WORKDAY_END_HOUR);

        let from = start_wall.max(open);
        let to = end_wall.min(close);

        if from < to {
          total_ms += (to - from).num_milliseconds();
        }
      }

      day = match day.succ_opt() {
        Some(next) => next,
        None => break,
      };
    }

    total_ms as f64 / 60_000.0 / MINUTES_PER_WORKDAY
  }
}

/// Work days between two instants on the built-in calendar.
pub fn work_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
  DEFAULT_CALENDAR.work_duration(start, end)
}

/// Wall-clock time of an instant in the reference timezone.
pub fn to_wall_time(instant: DateTime<Utc>) -> NaiveDateTime {
  instant.with_timezone(&REFERENCE_TZ).naive_local()
}

/// Parse the timestamp shapes trackers emit.
///
/// Accepts RFC3339, Jira's `2024-01-05T10:00:00.000+0000` (offset without colon),
/// a naive `YYYY-MM-DDTHH:MM:SS[.fff]` and a bare `YYYY-MM-DD`. Naive values are
/// read as wall time in the reference timezone.
pub fn parse_tracker_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let s = raw.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }

  for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"] {
    if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
      return Some(dt.with_timezone(&Utc));
    }
  }

  if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
    return from_wall_time(naive);
  }

  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| from_wall_time(d.and_time(NaiveTime::MIN)))
}

/// Instant of a wall-clock time in the reference timezone; the earlier one on DST overlaps.
pub fn from_wall_time(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
  naive
    .and_local_timezone(REFERENCE_TZ)
    .earliest()
    .map(|dt| dt.with_timezone(&Utc))
}
