// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Load and save the persisted local settings blob (last issue, groups, exclusions, collapsed rows)
// role: config/settings
// inputs: Optional explicit path; otherwise <config_dir>/issue-cycle-time/settings.json
// outputs: Settings struct; pretty JSON on save (parent directories created)
// invariants:
// - A missing file yields defaults; unknown fields are ignored
// - Credentials are never part of this blob
// errors: anyhow with the offending path for unreadable or corrupt files
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::SubTaskGroup;

pub const APP_DIR: &str = "issue-cycle-time";
pub const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_EXCLUDED_STATUSES: [&str; 6] = ["To Do", "Open", "Backlog", "Done", "Resolved", "Closed"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub last_issue_id: Option<String>,
  pub sub_task_groups: Vec<SubTaskGroup>,
  pub excluded_statuses: Vec<String>,
  pub excluded_issue_types: Vec<String>,
  pub collapsed_ids: Vec<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      last_issue_id: None,
      sub_task_groups: Vec::new(),
      excluded_statuses: DEFAULT_EXCLUDED_STATUSES.iter().map(|s| s.to_string()).collect(),
      excluded_issue_types: Vec::new(),
      collapsed_ids: Vec::new(),
    }
  }
}

pub fn default_settings_path() -> PathBuf {
  dirs::config_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join(APP_DIR)
    .join(SETTINGS_FILE)
}

impl Settings {
  pub fn load(path: &Path) -> Result<Self> {
    if !path.exists() {
      return Ok(Self::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("reading settings from {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing settings at {}", path.display()))
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(self)?;
    fs::write(path, body + "\n").with_context(|| format!("writing settings to {}", path.display()))
  }
}
