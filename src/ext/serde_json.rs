// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Provide nested JSON fetching via dotted paths and typed extraction for raw tracker payloads
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper; first_string helper for shape-tolerant lookups
// invariants: No panics; missing paths yield None; to_or_default returns T::default on failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;

/// Wrapper around a JSON location to allow typed extraction via a clear second step.
pub struct JsonFetched<'a> {
  inner: Option<&'a serde_json::Value>,
}

impl<'a> JsonFetched<'a> {
  /// Attempt to deserialize the fetched value as `T`.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self.inner.and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  /// Deserialize as `T`, returning `T::default()` on failure.
  pub fn to_or_default<T>(&self) -> T
  where
    T: DeserializeOwned + Default,
  {
    self.to::<T>().unwrap_or_default()
  }

  /// Borrow the raw value when present and not `null`.
  pub fn value(&self) -> Option<&'a serde_json::Value> {
    self.inner.filter(|v| !v.is_null())
  }

  /// Non-empty string at this location.
  pub fn string(&self) -> Option<String> {
    self
      .inner
      .and_then(|v| v.as_str())
      .filter(|s| !s.trim().is_empty())
      .map(|s| s.to_string())
  }
}

/// Extension to fetch nested values via dotted paths like "fields.status.name".
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;

  /// First non-empty string among several candidate paths.
  fn first_string(&self, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|p| self.fetch(p).string())
  }
}

impl JsonFetch for serde_json::Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      match cur.get(key) {
        Some(next) => cur = next,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
