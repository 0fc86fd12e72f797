// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Library root for issue timeline reconstruction and cycle-time statistics
// role: module/aggregation
// outputs: Public modules consumed by the issue-cycle-time binary and integration tests
// invariants: Core modules (calendar..stats) are pure; IO lives in tracker, settings and util
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod calendar;
pub mod ext;
pub mod filter;
pub mod format;
pub mod grouping;
pub mod hierarchy;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod selection;
pub mod settings;
pub mod stats;
pub mod timeline;
pub mod tracker;
pub mod util;
