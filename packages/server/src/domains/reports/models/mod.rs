pub mod report;

pub use report::{
    NewReport, Report, ReportEntityType, ReportPriority, ReportStatus, ReportType,
};
