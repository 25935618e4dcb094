//! File exports: DATEV interchange CSV, batch exports, audit-log dumps and
//! the rendered UStVA report.
//!
//! Everything here is generation only. Selecting cases, transitioning them
//! and recording filenames in the audit trail is the engine's job.

pub mod audit_log;
pub mod batch;
pub mod datev;
pub mod ustva_report;

use serde::Serialize;

/// A rendered export artifact, ready to be written or attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFile {
    pub filename: String,
    pub content: String,
}

/// Output flavor for the exports that support both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

pub use audit_log::export_audit_logs;
pub use batch::{generate_batch_datev, generate_batch_summary, select_batch};
pub use datev::{export_case_datev, format_datev_amount, DatevRow, DATEV_HEADER};
pub use ustva_report::render_ustva;
