//! Export of training results for external tools

pub mod grid_csv;

pub use grid_csv::{GridReportExporter, GridReportRecord};
