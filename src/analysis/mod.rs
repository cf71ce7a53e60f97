//! Analysis document resolution
//!
//! - `types`: domains, units, canonical parameters, observations
//! - `strategies`: candidate locations in the raw analysis document
//! - `resolver`: ordered strategy chain per domain

pub mod types;
pub mod strategies;
pub mod resolver;

pub use types::{Domain, Parameter, ParameterObservation, Unit};
pub use strategies::{
    default_strategies, DeepScanStrategy, KeyedMapStrategy, PrefixedFieldStrategy, Probe,
    ResolveStrategy, SampleListStrategy,
};
pub use resolver::Resolver;
