//! Observability module providing structured logging.
//!
//! Initializes the global `tracing` subscriber with a configurable output
//! format (pretty, compact, JSON) and environment-based filtering.
//! Authorization decisions are emitted on the
//! [`AUDIT_TARGET`](crate::authz::AUDIT_TARGET) target and can be filtered
//! separately, e.g. `pathgate::audit=info`.

mod tracing_init;

pub use tracing_init::*;
