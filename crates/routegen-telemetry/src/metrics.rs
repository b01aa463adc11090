//! Generation metrics.
//!
//! Recorded through the `metrics` facade; the host installs whatever
//! recorder it uses. Without a recorder every call is a no-op.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `routegen_endpoints_total` | Counter | `outcome` | Endpoints built per pass |
//! | `routegen_thunk_groups_total` | Counter | - | Thunks emitted |
//! | `routegen_diagnostics_total` | Counter | `code`, `severity` | Diagnostics reported |
//! | `routegen_cache_hits_total` | Counter | `kind` | Incremental cache hits |
//! | `routegen_cache_misses_total` | Counter | `kind` | Incremental cache misses |

use metrics::{counter, describe_counter};

/// Endpoints built.
pub const ENDPOINTS_TOTAL: &str = "routegen_endpoints_total";
/// Thunks emitted.
pub const THUNK_GROUPS_TOTAL: &str = "routegen_thunk_groups_total";
/// Diagnostics reported.
pub const DIAGNOSTICS_TOTAL: &str = "routegen_diagnostics_total";
/// Cache hits.
pub const CACHE_HITS_TOTAL: &str = "routegen_cache_hits_total";
/// Cache misses.
pub const CACHE_MISSES_TOTAL: &str = "routegen_cache_misses_total";

/// Registers descriptions for all routegen metrics.
pub fn describe_metrics() {
    describe_counter!(ENDPOINTS_TOTAL, "Endpoints built by outcome");
    describe_counter!(THUNK_GROUPS_TOTAL, "Dispatch thunks emitted");
    describe_counter!(DIAGNOSTICS_TOTAL, "Diagnostics reported by code and severity");
    describe_counter!(CACHE_HITS_TOTAL, "Incremental cache hits by entry kind");
    describe_counter!(CACHE_MISSES_TOTAL, "Incremental cache misses by entry kind");
}

/// Records the endpoints of one pass.
///
/// `emitted` endpoints got code, `invalid` ones carry errors and `dropped`
/// registrations were malformed.
pub fn record_endpoints(emitted: usize, invalid: usize, dropped: usize) {
    for (outcome, count) in [("emitted", emitted), ("invalid", invalid), ("dropped", dropped)] {
        counter!(ENDPOINTS_TOTAL, "outcome" => outcome).increment(count as u64);
    }
}

/// Records the thunks emitted in one pass.
pub fn record_thunk_groups(count: usize) {
    counter!(THUNK_GROUPS_TOTAL).increment(count as u64);
}

/// Records one diagnostic.
pub fn record_diagnostic(code: &'static str, severity: &'static str) {
    counter!(DIAGNOSTICS_TOTAL, "code" => code, "severity" => severity).increment(1);
}

/// Records a cache lookup for `kind` ("endpoint" or "thunk").
pub fn record_cache_lookup(kind: &'static str, hit: bool) {
    let name = if hit { CACHE_HITS_TOTAL } else { CACHE_MISSES_TOTAL };
    counter!(name, "kind" => kind).increment(1);
}
