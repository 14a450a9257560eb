mod analytics_worker;

pub use analytics_worker::AnalyticsWorker;
