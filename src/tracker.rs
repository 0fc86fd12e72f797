// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Fetch an issue and all of its descendants as raw JSON, from the Jira REST API or a local export file
// role: io/tracker
// inputs: Issue key; JIRA_HOST/JIRA_EMAIL/JIRA_API_TOKEN for the network source; a JSON file for the file source
// outputs: Vec<serde_json::Value> in the pre-flattened raw shape (network) or as exported (file)
// side_effects: HTTPS calls to the tracker host; reads the export file
// invariants:
// - Tracker error payloads become explicit TrackerError values; the core never sees partial garbage
// - Roots above Epic level (Initiative, Theme) are refused before the hierarchy query runs
// - Custom field ids are looked up once per client instance; a failed lookup is remembered as "none"
// errors: TrackerError (thiserror)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ext::serde_json::JsonFetch;

pub const ENV_HOST: &str = "JIRA_HOST";
pub const ENV_EMAIL: &str = "JIRA_EMAIL";
pub const ENV_TOKEN: &str = "JIRA_API_TOKEN";

const MAX_RESULTS: &str = "500";
const SEARCH_FIELDS: &str = "summary,status,issuetype,parent,created,*all";
const BLOCKED_ROOT_TYPES: [&str; 2] = ["Initiative", "Theme"];
const EPIC_LINK: &str = "Epic Link";
const PARENT_LINK: &str = "Parent Link";

static ISSUE_KEY: Lazy<regex::Regex> = Lazy::new(|| regex::Regex::new(r"^[A-Za-z][A-Za-z0-9_]*-\d+$").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
  #[error("missing tracker credentials: set {0}")]
  MissingCredentials(&'static str),
  #[error("'{0}' is not a valid issue key")]
  InvalidKey(String),
  #[error("Issue {0} not found.")]
  NotFound(String),
  #[error("{0}")]
  Unsupported(String),
  #[error("tracker request failed: {0}")]
  Http(String),
  #[error("could not decode tracker payload: {0}")]
  Decode(String),
  #[error("reading {path}: {message}")]
  Io { path: PathBuf, message: String },
  #[error("{0}")]
  Reported(String),
}

pub fn is_issue_key(key: &str) -> bool {
  ISSUE_KEY.is_match(key.trim())
}

/// Upstream seam: everything the core needs from an issue tracker.
pub trait IssueSource {
  fn fetch_issue_and_descendants(&self, key: &str) -> Result<Vec<Value>, TrackerError>;
}

/// `{success, data?, error?}` envelope exchanged at the tracker boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl FetchOutcome {
  pub fn into_result(self) -> Result<Vec<Value>, TrackerError> {
    if !self.success {
      return Err(TrackerError::Reported(
        self.error.unwrap_or_else(|| "tracker reported a failure without a message".into()),
      ));
    }
    match self.data {
      Some(data) => raw_issue_list(data),
      None => Ok(Vec::new()),
    }
  }

  pub fn from_result(result: &Result<Vec<Value>, TrackerError>) -> Self {
    match result {
      Ok(issues) => Self { success: true, data: Some(Value::Array(issues.clone())), error: None },
      Err(e) => Self { success: false, data: None, error: Some(e.to_string()) },
    }
  }
}

/// Accept a bare issue array or a `{parent, children}` object.
fn raw_issue_list(data: Value) -> Result<Vec<Value>, TrackerError> {
  match data {
    Value::Array(items) => Ok(items),
    Value::Object(mut obj) if obj.contains_key("parent") || obj.contains_key("children") => {
      let mut out: Vec<Value> = Vec::new();
      if let Some(parent) = obj.remove("parent").filter(|p| !p.is_null()) {
        out.push(parent);
      }
      match obj.remove("children") {
        Some(Value::Array(children)) => out.extend(children),
        Some(Value::Null) | None => {}
        Some(other) => return Err(TrackerError::Decode(format!("children is not a list: {other}"))),
      }
      Ok(out)
    }
    other => Err(TrackerError::Decode(format!("expected a list of issues, got {}", kind(&other)))),
  }
}

fn kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "a list",
    Value::Object(_) => "an object",
  }
}

/// Interpret a whole export document: issue list, `{parent, children}` or a FetchOutcome envelope.
pub fn raw_issues_from_document(doc: Value) -> Result<Vec<Value>, TrackerError> {
  if doc.get("success").is_some_and(Value::is_boolean) {
    let outcome: FetchOutcome = serde_json::from_value(doc).map_err(|e| TrackerError::Decode(e.to_string()))?;
    return outcome.into_result();
  }
  raw_issue_list(doc)
}

/// Issues from a local JSON export.
#[derive(Debug, Clone)]
pub struct FileSource {
  path: PathBuf,
}

impl FileSource {
  pub fn new<P: AsRef<Path>>(path: P) -> Self {
    Self { path: path.as_ref().to_path_buf() }
  }
}

impl IssueSource for FileSource {
  fn fetch_issue_and_descendants(&self, key: &str) -> Result<Vec<Value>, TrackerError> {
    let io_err = |e: std::io::Error| TrackerError::Io { path: self.path.clone(), message: e.to_string() };
    let text = std::fs::read_to_string(&self.path).map_err(io_err)?;
    let doc: Value = serde_json::from_str(&text).map_err(|e| TrackerError::Decode(e.to_string()))?;
    let issues = raw_issues_from_document(doc)?;
    debug!(path = %self.path.display(), key, count = issues.len(), "loaded issues from file");
    Ok(issues)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub host: String,
  pub email: Option<String>,
  pub api_token: String,
}

fn env_value(name: &str) -> Option<String> {
  std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Credentials {
  pub fn from_env() -> Result<Self, TrackerError> {
    Ok(Self {
      host: env_value(ENV_HOST).ok_or(TrackerError::MissingCredentials(ENV_HOST))?,
      email: env_value(ENV_EMAIL),
      api_token: env_value(ENV_TOKEN).ok_or(TrackerError::MissingCredentials(ENV_TOKEN))?,
    })
  }

  /// Host without scheme or trailing slash.
  pub fn clean_host(&self) -> String {
    let h = self.host.trim();
    let h = h.strip_prefix("https://").or_else(|| h.strip_prefix("http://")).unwrap_or(h);
    h.trim_end_matches('/').to_string()
  }

  /// Basic with an email, Bearer without.
  pub fn auth_header(&self) -> String {
    match &self.email {
      Some(email) => {
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{email}:{}", self.api_token));
        format!("Basic {encoded}")
      }
      None => format!("Bearer {}", self.api_token),
    }
  }
}

/// Raw REST calls; split out so the hierarchy flow can run against canned responses.
pub trait JiraApi {
  fn host(&self) -> String;
  /// `issues` array of a JQL search with changelog expanded.
  fn search(&self, jql: &str) -> Result<Vec<Value>, TrackerError>;
  /// Field catalogue (`[{id, name}, ...]`).
  fn fields(&self) -> Result<Vec<Value>, TrackerError>;
}

pub struct HttpJiraApi {
  creds: Credentials,
  agent: ureq::Agent,
}

impl HttpJiraApi {
  pub fn new(creds: Credentials) -> Self {
    let agent: ureq::Agent = ureq::Agent::config_builder()
      .http_status_as_error(false)
      .timeout_global(Some(Duration::from_secs(60)))
      .build()
      .into();
    Self { creds, agent }
  }

  fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, TrackerError> {
    let url = format!("https://{}{}", self.creds.clean_host(), path);
    let mut req = self
      .agent
      .get(&url)
      .header("Accept", "application/json")
      .header("Authorization", &self.creds.auth_header());
    for (k, v) in query {
      req = req.query(*k, *v);
    }

    let mut resp = req.call().map_err(|e| TrackerError::Http(e.to_string()))?;
    let status = resp.status();
    let body: Value = resp
      .body_mut()
      .read_json::<Value>()
      .map_err(|e| TrackerError::Decode(format!("{url}: {e}")))?;

    if !status.is_success() {
      return Err(TrackerError::Http(error_messages(&body).unwrap_or_else(|| format!("HTTP {status} from {url}"))));
    }
    Ok(body)
  }
}

/// Jira error payloads carry `errorMessages: [..]`.
fn error_messages(body: &Value) -> Option<String> {
  let msgs: Vec<String> = body.fetch("errorMessages").to_or_default();
  if msgs.is_empty() {
    None
  } else {
    Some(msgs.join(", "))
  }
}

impl JiraApi for HttpJiraApi {
  fn host(&self) -> String {
    self.creds.clean_host()
  }

  fn search(&self, jql: &str) -> Result<Vec<Value>, TrackerError> {
    debug!(jql, "tracker search");
    let body = self.get_json(
      "/rest/api/2/search",
      &[("jql", jql), ("expand", "changelog"), ("maxResults", MAX_RESULTS), ("fields", SEARCH_FIELDS)],
    )?;
    Ok(body.fetch("issues").to_or_default())
  }

  fn fields(&self) -> Result<Vec<Value>, TrackerError> {
    let body = self.get_json("/rest/api/2/field", &[])?;
    serde_json::from_value(body).map_err(|e| TrackerError::Decode(e.to_string()))
  }
}

/// Ids of the custom fields that can carry a parent reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldIds {
  pub epic_link: Option<String>,
  pub parent_link: Option<String>,
}

impl FieldIds {
  pub fn from_catalogue(fields: &[Value]) -> Self {
    let id_of = |name: &str| {
      fields
        .iter()
        .find(|f| f.fetch("name").string().as_deref() == Some(name))
        .and_then(|f| f.fetch("id").string())
    };
    Self { epic_link: id_of(EPIC_LINK), parent_link: id_of(PARENT_LINK) }
  }
}

pub struct JiraClient {
  api: Box<dyn JiraApi>,
  field_ids: OnceCell<FieldIds>,
}

impl JiraClient {
  pub fn new(api: Box<dyn JiraApi>) -> Self {
    Self { api, field_ids: OnceCell::new() }
  }

  pub fn from_env() -> Result<Self, TrackerError> {
    Ok(Self::new(Box::new(HttpJiraApi::new(Credentials::from_env()?))))
  }

  fn field_ids(&self) -> &FieldIds {
    self.field_ids.get_or_init(|| match self.api.fields() {
      Ok(fields) => FieldIds::from_catalogue(&fields),
      Err(e) => {
        warn!(error = %e, "custom field lookup failed; parent links limited to the standard parent field");
        FieldIds::default()
      }
    })
  }
}

/// Parent key from the standard parent, then Epic Link, then Parent Link (string, `{key}` or `{data:{key}}`).
fn parent_key(issue: &Value, ids: &FieldIds) -> Option<String> {
  if let Some(key) = issue.fetch("fields.parent.key").string() {
    return Some(key);
  }
  if let Some(id) = &ids.epic_link {
    if let Some(key) = issue.fetch(&format!("fields.{id}")).string() {
      return Some(key);
    }
  }
  let id = ids.parent_link.as_ref()?;
  let link = issue.fetch(&format!("fields.{id}")).value()?;
  link.fetch("").string().or_else(|| link.first_string(&["key", "data.key"]))
}

/// Flattened raw shape handed to the core.
pub fn flatten_issue(issue: &Value, host: &str, ids: &FieldIds) -> Value {
  let key = issue.fetch("key").string().unwrap_or_default();
  json!({
    "key": key,
    "url": format!("https://{host}/browse/{key}"),
    "summary": issue.fetch("fields.summary").string().unwrap_or_default(),
    "status": issue.fetch("fields.status.name").string().unwrap_or_else(|| "Unknown".into()),
    "created": issue.fetch("fields.created").value().cloned().unwrap_or(Value::Null),
    "issueType": issue.fetch("fields.issuetype.name").string().unwrap_or_else(|| "Unknown".into()),
    "issueTypeIconUrl": issue.fetch("fields.issuetype.iconUrl").string(),
    "parentKey": parent_key(issue, ids),
    "changelog": issue.fetch("changelog").value().cloned().unwrap_or(Value::Null),
  })
}

impl IssueSource for JiraClient {
  fn fetch_issue_and_descendants(&self, key: &str) -> Result<Vec<Value>, TrackerError> {
    let key = key.trim();
    if !is_issue_key(key) {
      return Err(TrackerError::InvalidKey(key.to_string()));
    }
    let ids = self.field_ids();

    let roots = self.api.search(&format!("key = \"{key}\""))?;
    let root = roots.first().ok_or_else(|| TrackerError::NotFound(key.to_string()))?;
    let root_type = root.fetch("fields.issuetype.name").string().unwrap_or_default();
    if BLOCKED_ROOT_TYPES.contains(&root_type.as_str()) {
      return Err(TrackerError::Unsupported("Hierarchy levels above Epic are currently not supported.".into()));
    }

    let issues = self.api.search(&format!("key = \"{key}\" OR issue in childIssuesOf(\"{key}\")"))?;
    let host = self.api.host();
    let flat: Vec<Value> = issues.iter().map(|i| flatten_issue(i, &host, ids)).collect();

    info!(key, count = flat.len(), "fetched issue hierarchy");
    Ok(flat)
  }
}
