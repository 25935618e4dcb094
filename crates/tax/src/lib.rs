//! Periodic tax aggregation (UStVA) over posted cases.

pub mod ustva;

pub use ustva::{aggregate_ustva, zm_report, UstvaFigures};
