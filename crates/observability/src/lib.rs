//! Tracing and logging (shared setup).

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize process-wide observability with the `RUST_LOG` filter
/// (default `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(None);
}

/// Like [`init`], with an explicit fallback filter used when `RUST_LOG` is
/// unset (e.g. `"debug"` for a verbose CLI run).
pub fn init_with_default(default_filter: &str) {
    tracing::init(Some(default_filter));
}
