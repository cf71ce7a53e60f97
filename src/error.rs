//! Error taxonomy for the report pipeline.
//!
//! Only `ReportError` ever leaves a report-generation call. The other kinds are
//! recovered at the component that produces them.

use thiserror::Error;

/// A raw value could not be converted to a finite number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseFailure {
    #[error("empty value")]
    Empty,

    /// Laboratory "not detected" marker such as `N.D.` or `<0.01`.
    #[error("not detected ({0})")]
    NotDetected(String),

    #[error("no numeric content in {0:?}")]
    NotNumeric(String),

    #[error("value is not finite")]
    NonFinite,

    #[error("unsupported value type: {0}")]
    UnsupportedType(&'static str),
}

/// Why an observation is unresolved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionMiss {
    #[error("not found in any candidate location")]
    NotFound,

    #[error("found but unparseable: {0}")]
    Unparseable(#[from] ParseFailure),
}

/// Failure inside one section builder. Never crosses the section boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SectionError {
    /// The section has nothing to show; the message becomes the fallback text.
    #[error("{0}")]
    NoData(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("section builder panicked: {0}")]
    Panicked(String),
}

/// Errors returned by report generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    /// The assembled document would contain no sections at all.
    #[error("fatal assembly failure: {0}")]
    FatalAssemblyFailure(String),
}
