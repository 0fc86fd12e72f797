// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Map either raw issue shape (tracker-native `fields.*` or pre-flattened) into one canonical IssueRecord
// role: core/adapter
// inputs: serde_json::Value per raw issue
// outputs: IssueRecord with parsed creation instant and raw changelog histories
// invariants:
// - Shape detection happens once here; downstream code never branches on shape
// - Missing status/type fall back to "Unknown"; missing summary/url fall back to ""
// - Changelog entries that do not deserialize are dropped, not fatal
// errors: NormalizeError for a missing key or missing/unparseable creation timestamp
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::calendar::parse_tracker_timestamp;
use crate::ext::serde_json::JsonFetch;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
  #[error("raw issue has no key")]
  MissingKey,
  #[error("issue {key} has no creation timestamp")]
  MissingCreated { key: String },
  #[error("issue {key} has an unparseable creation timestamp: {raw}")]
  InvalidCreated { key: String, raw: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawShape {
  /// Fields nested under `fields`, status at `fields.status.name`.
  TrackerNative,
  /// Status as a bare string, camelCase top-level attributes.
  Flattened,
}

impl RawShape {
  pub fn detect(raw: &Value) -> Self {
    if raw.get("fields").is_some_and(Value::is_object) {
      RawShape::TrackerNative
    } else {
      RawShape::Flattened
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct HistoryItem {
  #[serde(default)]
  pub field: Option<String>,
  #[serde(rename = "fromString", default)]
  pub from_status: Option<String>,
  #[serde(rename = "toString", default)]
  pub to_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct HistoryEntry {
  #[serde(default)]
  pub created: Option<String>,
  #[serde(default)]
  pub items: Vec<HistoryItem>,
}

/// Canonical, shape-independent view of one raw issue.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
  pub key: String,
  pub url: String,
  pub summary: String,
  pub status: String,
  pub created: DateTime<Utc>,
  pub issue_type: String,
  pub issue_type_icon_url: Option<String>,
  pub parent_key: Option<String>,
  pub histories: Vec<HistoryEntry>,
}

pub fn normalize(raw: &Value) -> Result<IssueRecord, NormalizeError> {
  let key = raw.fetch("key").string().ok_or(NormalizeError::MissingKey)?;
  let shape = RawShape::detect(raw);

  let (summary, status, created, issue_type, icon, parent) = match shape {
    RawShape::TrackerNative => (
      raw.first_string(&["fields.summary", "summary"]),
      raw.first_string(&["fields.status.name", "status.name", "status"]),
      raw.first_string(&["fields.created", "created"]),
      raw.first_string(&["fields.issuetype.name", "issueType"]),
      raw.first_string(&["fields.issuetype.iconUrl", "issueTypeIconUrl"]),
      raw.first_string(&["parentKey", "fields.parent.key"]),
    ),
    RawShape::Flattened => (
      raw.first_string(&["summary"]),
      raw.first_string(&["status", "status.name"]),
      raw.first_string(&["created"]),
      raw.first_string(&["issueType", "issuetype.name"]),
      raw.first_string(&["issueTypeIconUrl"]),
      raw.first_string(&["parentKey", "parent.key", "parent"]),
    ),
  };

  let created_raw = created.ok_or_else(|| NormalizeError::MissingCreated { key: key.clone() })?;
  let created = parse_tracker_timestamp(&created_raw).ok_or_else(|| NormalizeError::InvalidCreated {
    key: key.clone(),
    raw: created_raw.clone(),
  })?;

  Ok(IssueRecord {
    url: raw.fetch("url").string().unwrap_or_default(),
    summary: summary.unwrap_or_default(),
    status: status.unwrap_or_else(|| UNKNOWN.to_string()),
    created,
    issue_type: issue_type.unwrap_or_else(|| UNKNOWN.to_string()),
    issue_type_icon_url: icon,
    parent_key: parent.map(|p| p.trim().to_string()),
    histories: histories(raw),
    key,
  })
}

/// History entries live under `changelog.histories`; some exports put the list at `changelog` directly.
fn histories(raw: &Value) -> Vec<HistoryEntry> {
  let list = raw
    .fetch("changelog.histories")
    .value()
    .or_else(|| raw.fetch("changelog").value())
    .and_then(Value::as_array);

  match list {
    Some(entries) => entries
      .iter()
      .filter_map(|e| serde_json::from_value::<HistoryEntry>(e.clone()).ok())
      .collect(),
    None => Vec::new(),
  }
}
