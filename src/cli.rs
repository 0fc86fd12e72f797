use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use issue_cycle_time::grouping::parse_group_spec;
use issue_cycle_time::model::SubTaskGroup;
use issue_cycle_time::pipeline::AnalysisOptions;
use issue_cycle_time::selection::Selection;
use issue_cycle_time::settings::Settings;
use issue_cycle_time::tracker::is_issue_key;
use issue_cycle_time::util;

#[derive(Parser, Debug)]
#[command(
    name = "issue-cycle-time",
    version,
    about = "Reconstruct issue status timelines and report business-day cycle-time statistics as JSON",
    long_about = None
)]
pub struct Cli {
  /// Root issue key to analyze (default: last issue saved in settings)
  #[arg(long)]
  pub issue: Option<String>,

  /// Read raw issues from a JSON export instead of the tracker API
  #[arg(long)]
  pub input: Option<PathBuf>,

  /// Status to drop from timelines (repeatable; replaces the saved list)
  #[arg(long = "exclude-status")]
  pub exclude_status: Vec<String>,

  /// Issue type to drop together with its descendants (repeatable; replaces the saved list)
  #[arg(long = "exclude-type")]
  pub exclude_type: Vec<String>,

  /// Sub-task group as `id:Name:kw1,kw2` (repeatable, in priority order; replaces the saved groups)
  #[arg(long = "group")]
  pub group: Vec<String>,

  /// Issue keys to compute statistics for (repeatable; default: the root issue)
  #[arg(long = "select")]
  pub select: Vec<String>,

  /// Compute statistics over the selected issues only (default: selected issues plus all descendants)
  #[arg(long)]
  pub root_only: bool,

  /// Leave the nested tree out of the report
  #[arg(long)]
  pub no_tree: bool,

  /// Output file path (default stdout "-")
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Settings file (default: <config dir>/issue-cycle-time/settings.json)
  #[arg(long)]
  pub settings: Option<PathBuf>,

  /// Persist the effective issue, groups and exclusions back to the settings file
  #[arg(long)]
  pub save_settings: bool,

  /// Debug logging to stderr
  #[arg(long, short)]
  pub verbose: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant that closes open intervals (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EffectiveConfig {
  pub issue: String,
  pub input: Option<PathBuf>,
  pub excluded_statuses: Vec<String>,
  pub excluded_issue_types: Vec<String>,
  pub groups: Vec<SubTaskGroup>,
  pub selection: Vec<String>,
  pub with_descendants: bool,
  pub tree: bool,
  pub out: String,
  pub save_settings: bool,
  pub now: Option<DateTime<Utc>>,
}

impl EffectiveConfig {
  pub fn analysis(&self) -> AnalysisOptions {
    AnalysisOptions {
      excluded_statuses: self.excluded_statuses.clone(),
      excluded_issue_types: self.excluded_issue_types.clone(),
    }
  }

  pub fn selection_set(&self) -> Selection {
    self.selection.iter().cloned().collect()
  }

  /// Fold the effective choices back into the persisted settings.
  pub fn apply_to(&self, settings: &mut Settings) {
    settings.last_issue_id = Some(self.issue.clone());
    settings.sub_task_groups = self.groups.clone();
    settings.excluded_statuses = self.excluded_statuses.clone();
    settings.excluded_issue_types = self.excluded_issue_types.clone();
  }
}

fn or_saved<T: Clone>(flags: Vec<T>, saved: &[T]) -> Vec<T> {
  if flags.is_empty() {
    saved.to_vec()
  } else {
    flags
  }
}

pub fn normalize(cli: Cli, settings: &Settings) -> Result<EffectiveConfig> {
  let issue = match cli.issue.as_deref().or(settings.last_issue_id.as_deref()) {
    Some(i) if !i.trim().is_empty() => i.trim().to_string(),
    _ => bail!("Provide --issue KEY (no previous issue saved in settings)"),
  };
  // File exports may use any key; the tracker query needs a real one.
  if cli.input.is_none() && !is_issue_key(&issue) {
    bail!("'{issue}' is not a valid issue key (expected e.g. PROJ-123)");
  }

  let mut groups: Vec<SubTaskGroup> = Vec::with_capacity(cli.group.len());
  for raw in &cli.group {
    match parse_group_spec(raw) {
      Some(g) => groups.push(g),
      None => bail!("Malformed --group '{raw}': expected id:Name:kw1,kw2"),
    }
  }
  let groups = or_saved(groups, &settings.sub_task_groups);

  let selection = if cli.select.is_empty() {
    vec![issue.clone()]
  } else {
    cli.select.iter().map(|k| k.trim().to_string()).collect()
  };

  let now = match cli.now_override.as_deref() {
    Some(raw) => Some(util::parse_now_override(raw)?),
    None => None,
  };

  Ok(EffectiveConfig {
    issue,
    input: cli.input,
    excluded_statuses: or_saved(cli.exclude_status, &settings.excluded_statuses),
    excluded_issue_types: or_saved(cli.exclude_type, &settings.excluded_issue_types),
    groups,
    selection,
    with_descendants: !cli.root_only,
    tree: !cli.no_tree,
    out: cli.out,
    save_settings: cli.save_settings,
    now,
  })
}
