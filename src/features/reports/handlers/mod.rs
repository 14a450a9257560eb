pub mod report_handler;

pub use report_handler::{
    __path_assign_report, __path_change_report_status, __path_get_my_reports, __path_get_report,
    __path_get_report_assignment, __path_get_report_history, __path_list_reports,
    __path_resolve_report, __path_submit_report, __path_update_assignment_status, assign_report,
    change_report_status, get_my_reports, get_report, get_report_assignment, get_report_history,
    list_reports, resolve_report, submit_report, update_assignment_status, ReportState,
};
