//! Projection module
//!
//! Keeps the cached per-user counters in line with the content tables.

mod reconciler;

pub use reconciler::{
    CounterReconciler, ReconcileFailure, ReconcileReport, ReconcilerConfig, UserCounters,
};
