mod job;
pub mod weekly;

pub use job::{EstablishmentOutcome, JobSummary, ReportStatus, WeeklyReportJob};
pub use weekly::{aggregate, ReportWindows, WeeklyReport};
