pub mod analytics_handler;

pub use analytics_handler::{
    __path_generate_analytics, __path_get_dashboard_summary, generate_analytics,
    get_dashboard_summary,
};
