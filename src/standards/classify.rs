//! Status Classifier
//!
//! Compares one observation against its reference standard. Bounds are
//! inclusive: a value equal to min or max is Optimal.

use serde::{Deserialize, Serialize};

use crate::analysis::types::ParameterObservation;
use crate::standards::table::{ReferenceStandard, StandardsTable};

/// Position of an observed value relative to its acceptable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// value < min
    Deficient,
    /// min <= value <= max
    Optimal,
    /// value > max
    Excessive,
    /// Unresolved value or no standard for the parameter
    Unknown,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Deficient => "Deficient",
            Status::Optimal => "Optimal",
            Status::Excessive => "Excessive",
            Status::Unknown => "Unknown",
        }
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Status::Deficient | Status::Excessive)
    }
}

/// An observation paired with its standard and status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedParameter {
    pub observation: ParameterObservation,
    pub status: Status,
    pub standard: Option<ReferenceStandard>,
}

impl ClassifiedParameter {
    pub fn name(&self) -> &str {
        self.observation.canonical_name()
    }

    pub fn value(&self) -> Option<f64> {
        self.observation.value
    }
}

/// Status of a value against one standard.
pub fn status_for(value: f64, standard: &ReferenceStandard) -> Status {
    if value < standard.min {
        Status::Deficient
    } else if value > standard.max {
        Status::Excessive
    } else {
        Status::Optimal
    }
}

/// Classify one observation. Never fails; missing inputs give `Unknown`.
pub fn classify(observation: ParameterObservation, table: &StandardsTable) -> ClassifiedParameter {
    let standard = table.lookup(&observation.name).cloned();
    let status = match (observation.value, &standard) {
        (Some(v), Some(s)) => status_for(v, s),
        _ => Status::Unknown,
    };

    ClassifiedParameter {
        observation,
        status,
        standard,
    }
}

pub fn classify_all(observations: Vec<ParameterObservation>, table: &StandardsTable) -> Vec<ClassifiedParameter> {
    observations.into_iter().map(|o| classify(o, table)).collect()
}
