pub mod analysis;
pub mod csv_export;
pub mod dashboard;
pub mod text_report;

pub use analysis::Analysis;
pub use csv_export::CsvExportSink;
pub use dashboard::DashboardSink;
pub use text_report::TextReportSink;
