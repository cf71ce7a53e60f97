//! Utility modules shared by the resolver and section builders
//!
//! - Sanitize: fault-tolerant numeric parsing
//! - Normalization: parameter label canonicalisation
//! - Lookup tables: alias sets per domain

pub mod sanitize;
pub mod normalization;
pub mod lookup_tables;

// Re-export commonly used items
pub use sanitize::{parse_numeric, sanitize, sanitize_opt, sanitize_range, Numeric};
pub use normalization::{match_label, normalize, normalize_key, MatchKind, NormalizedName};
