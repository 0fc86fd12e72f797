use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;

use crate::cli::{normalize, Cli};
use issue_cycle_time::pipeline::{pull, Report};
use issue_cycle_time::settings::{default_settings_path, Settings};
use issue_cycle_time::tracker::{FileSource, IssueSource, JiraClient};
use issue_cycle_time::util;

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  init_tracing(cli.verbose);

  // Phase 1: settings + normalize CLI
  let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);
  let mut settings = Settings::load(&settings_path)?;
  let cfg = normalize(cli, &settings)?;
  debug!(?cfg, settings = %settings_path.display(), "effective configuration");

  // Phase 2: fetch raw issues
  let source: Box<dyn IssueSource> = match &cfg.input {
    Some(path) => Box::new(FileSource::new(path)),
    None => Box::new(JiraClient::from_env()?),
  };
  let raw = source
    .fetch_issue_and_descendants(&cfg.issue)
    .with_context(|| format!("fetching {} and its descendants", cfg.issue))?;

  // Phase 3: timelines, tree and statistics
  let now = util::effective_now(cfg.now);
  let pulled = pull(&raw, &cfg.analysis(), now)?;
  let stats = pulled.stats(&cfg.selection_set(), &cfg.groups, cfg.with_descendants);
  let report = Report::new(&cfg.issue, pulled, stats, now, cfg.tree);
  util::write_output(&cfg.out, &serde_json::to_string_pretty(&report)?)?;

  // Phase 4: persist choices
  if cfg.save_settings {
    cfg.apply_to(&mut settings);
    settings.save(&settings_path)?;
  }

  Ok(())
}
