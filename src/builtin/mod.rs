//! Built-in tasks for a cellular controller.
//!
//! Both consume the modem only through the [`Radio`](crate::radio::Radio)
//! seam:
//!
//! - [`SignalQualityTask`]: periodic radio-parameter measurement, published
//!   as a JSON report;
//! - [`CellScanTask`]: one-shot operator scan with cancel-on-resubmit.

mod cell_scan;
mod signal_quality;

pub use cell_scan::CellScanTask;
pub use signal_quality::{SignalQualityCommand, SignalQualityTask};
