// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Render durations and mean ± stddev pairs as display labels
// role: presentation/format
// inputs: Work-day values, instants
// outputs: Labels such as "5.1 work days", "12 ± 3 work days", "2.0 weeks"
// invariants:
// - Values >= 10 render as integers (round half up); smaller values keep one decimal, a trailing ".0" dropped
// - The stddev follows the mean's precision, never its own magnitude
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};

const WORK_DAYS: &str = "work days";
const MS_PER_DAY: f64 = 86_400_000.0;

/// Round to one decimal, half away from zero.
pub fn round1(v: f64) -> f64 {
  (v * 10.0).round() / 10.0
}

fn one_decimal(v: f64) -> String {
  let s = format!("{:.1}", round1(v));
  match s.strip_suffix(".0") {
    Some(whole) => whole.to_string(),
    None => s,
  }
}

pub fn format_metric(v: f64) -> String {
  if v >= 10.0 {
    format!("{}", v.round() as i64)
  } else {
    one_decimal(v)
  }
}

pub fn format_work_days(v: f64) -> String {
  format!("{} {WORK_DAYS}", format_metric(v))
}

pub fn format_mean_stddev(mean: f64, std_dev: f64) -> String {
  let (m, s) = if mean >= 10.0 {
    (format!("{}", mean.round() as i64), format!("{}", std_dev.round() as i64))
  } else {
    (one_decimal(mean), one_decimal(std_dev))
  };
  format!("{m} ± {s} {WORK_DAYS}")
}

pub fn format_weeks(weeks: f64) -> String {
  format!("{:.1} weeks", round1(weeks))
}

/// Wall-clock span in weeks, partial days counted as whole days.
pub fn format_calendar_weeks(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
  let ms = (end - start).num_milliseconds().unsigned_abs() as f64;
  let weeks = (ms / MS_PER_DAY).ceil() / 7.0;
  if weeks < 0.1 {
    return "0.0 weeks".to_string();
  }
  format_weeks(weeks)
}
