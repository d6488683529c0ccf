//! Optional operation counters (`metrics` feature).
//!
//! Recording lives in [`metrics_impl`], the read side in [`snapshot`], and
//! the seams between them in [`traits`].

pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use metrics_impl::LruMetrics;
pub use snapshot::CacheMetricsSnapshot;
pub use traits::{CoreMetricsRecorder, CostMetricsRecorder, MetricsSnapshotProvider};
