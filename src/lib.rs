//! Plantation Report Engine
//!
//! Turns an AI-produced agronomic analysis result into an ordered, gracefully
//! degraded multi-section report.
//!
//! Pipeline (leaves first):
//! - `utils/`: numeric sanitizer, name normalizer, alias tables
//! - `analysis/`: canonical parameters and the multi-path parameter resolver
//! - `standards/`: reference standards table and status classifier
//! - `report/`: section builders, layout engine, document assembler, formatters
//!
//! Every stage is a pure in-process transformation; a `ReportEngine` built by
//! the caller carries the read-only tables and can be shared across threads.

pub mod error;
pub mod config;
pub mod utils;
pub mod analysis;
pub mod standards;
pub mod report;

// Re-export commonly used types
pub use error::{ParseFailure, ReportError, ResolutionMiss, SectionError};
pub use config::{EngineConfig, Options};
pub use analysis::{Domain, Parameter, ParameterObservation, Resolver};
pub use standards::{classify, ClassifiedParameter, ReferenceStandard, StandardsTable, Status};
pub use report::{
    ContentBlock, ReportDocument, ReportEngine, ReportMetadata, ReportRequest, ReportSection,
    SectionId,
};
