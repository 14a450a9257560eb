mod report_dto;

pub use report_dto::{
    AssignReportDto, AssignmentResponseDto, ChangeStatusDto, HistoryEntryResponseDto,
    ReportDraftDto, ReportResponseDto, ReportStatusFilter, ResolveReportForm, SubmitReportForm,
    UpdateAssignmentStatusDto,
};
