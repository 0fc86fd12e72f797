// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for the analysis cutoff ("now"), report output, and man page rendering
// role: utilities/helpers
// inputs: Optional now-override strings; report text and an output target; clap CommandFactory
// outputs: Effective UTC instant; files or stdout written; man page text
// side_effects: write_output creates parent directories and writes files
// invariants:
// - effective_now is the single place the wall clock is read
// - "-" as an output target means stdout
// errors: IO errors bubble with context; unparseable overrides are reported with the raw input
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::CommandFactory;

use crate::calendar::parse_tracker_timestamp;

/// Return the effective "now" for timeline cutoffs.
///
/// When `override_now` is `Some`, that instant is returned; otherwise
/// the current time is used. Keeps `Utc::now()` out of the core so
/// timelines stay reproducible under test.
pub fn effective_now(override_now: Option<DateTime<Utc>>) -> DateTime<Utc> {
  override_now.unwrap_or_else(Utc::now)
}

/// Parse a `--now-override` value with the same leniency as tracker timestamps.
pub fn parse_now_override(raw: &str) -> Result<DateTime<Utc>> {
  parse_tracker_timestamp(raw).with_context(|| format!("invalid --now-override value: {raw}"))
}

/// Write `text` to `out`, or to stdout when `out` is "-".
pub fn write_output(out: &str, text: &str) -> Result<()> {
  if out == "-" {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    lock.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
      lock.write_all(b"\n")?;
    }
    return Ok(());
  }

  let path = Path::new(out);
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }
  std::fs::write(path, text).with_context(|| format!("writing report to {}", path.display()))
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
