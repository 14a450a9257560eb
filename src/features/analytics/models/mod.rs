mod snapshot;

pub use snapshot::AnalyticsSnapshot;
