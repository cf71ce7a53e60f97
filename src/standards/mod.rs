//! Reference standards and status classification

pub mod table;
pub mod classify;

pub use table::{GapThresholds, ReferenceStandard, StandardsTable};
pub use classify::{classify, classify_all, status_for, ClassifiedParameter, Status};
