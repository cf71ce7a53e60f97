//! Canonical parameter identifiers and resolved observations.

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ResolutionMiss;
use crate::utils::normalization::NormalizedName;

/// Sample domain. Selects the alias table and candidate paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Soil,
    Leaf,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Soil, Domain::Leaf];

    /// Lower-case key used in document paths ("soil", "leaf").
    pub fn key(&self) -> &'static str {
        match self {
            Domain::Soil => "soil",
            Domain::Leaf => "leaf",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Domain::Soil => "Soil",
            Domain::Leaf => "Leaf",
        }
    }
}

/// Measurement unit. Ratios are only formed between equal units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    PhUnits,
    Percent,
    MgPerKg,
    MeqPercent,
}

impl Unit {
    pub fn label(&self) -> &'static str {
        match self {
            Unit::PhUnits => "",
            Unit::Percent => "%",
            Unit::MgPerKg => "mg/kg",
            Unit::MeqPercent => "meq%",
        }
    }
}

/// One agronomic measurement, independent of how the source labelled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    SoilPh,
    SoilNitrogen,
    SoilOrganicCarbon,
    SoilTotalP,
    SoilAvailP,
    SoilExchK,
    SoilExchCa,
    SoilExchMg,
    SoilCec,
    LeafN,
    LeafP,
    LeafK,
    LeafMg,
    LeafCa,
    LeafB,
    LeafCu,
    LeafZn,
}

static SOIL_PARAMETERS: &[Parameter] = &[
    Parameter::SoilPh,
    Parameter::SoilNitrogen,
    Parameter::SoilOrganicCarbon,
    Parameter::SoilTotalP,
    Parameter::SoilAvailP,
    Parameter::SoilExchK,
    Parameter::SoilExchCa,
    Parameter::SoilExchMg,
    Parameter::SoilCec,
];

static LEAF_PARAMETERS: &[Parameter] = &[
    Parameter::LeafN,
    Parameter::LeafP,
    Parameter::LeafK,
    Parameter::LeafMg,
    Parameter::LeafCa,
    Parameter::LeafB,
    Parameter::LeafCu,
    Parameter::LeafZn,
];

impl Parameter {
    /// All parameters of a domain in report display order.
    pub fn all(domain: Domain) -> &'static [Parameter] {
        match domain {
            Domain::Soil => SOIL_PARAMETERS,
            Domain::Leaf => LEAF_PARAMETERS,
        }
    }

    pub fn domain(&self) -> Domain {
        use Parameter::*;
        match self {
            SoilPh | SoilNitrogen | SoilOrganicCarbon | SoilTotalP | SoilAvailP | SoilExchK
            | SoilExchCa | SoilExchMg | SoilCec => Domain::Soil,
            LeafN | LeafP | LeafK | LeafMg | LeafCa | LeafB | LeafCu | LeafZn => Domain::Leaf,
        }
    }

    pub fn canonical_name(&self) -> &'static str {
        use Parameter::*;
        match self {
            SoilPh => "pH",
            SoilNitrogen => "N (%)",
            SoilOrganicCarbon => "Org. C (%)",
            SoilTotalP => "Total P (mg/kg)",
            SoilAvailP => "Avail P (mg/kg)",
            SoilExchK => "Exch. K (meq%)",
            SoilExchCa => "Exch. Ca (meq%)",
            SoilExchMg => "Exch. Mg (meq%)",
            SoilCec => "CEC (meq%)",
            LeafN => "N (%)",
            LeafP => "P (%)",
            LeafK => "K (%)",
            LeafMg => "Mg (%)",
            LeafCa => "Ca (%)",
            LeafB => "B (mg/kg)",
            LeafCu => "Cu (mg/kg)",
            LeafZn => "Zn (mg/kg)",
        }
    }

    pub fn unit(&self) -> Unit {
        use Parameter::*;
        match self {
            SoilPh => Unit::PhUnits,
            SoilNitrogen | SoilOrganicCarbon => Unit::Percent,
            SoilTotalP | SoilAvailP => Unit::MgPerKg,
            SoilExchK | SoilExchCa | SoilExchMg | SoilCec => Unit::MeqPercent,
            LeafN | LeafP | LeafK | LeafMg | LeafCa => Unit::Percent,
            LeafB | LeafCu | LeafZn => Unit::MgPerKg,
        }
    }

    /// Coarser parameter this one replaces when both are present.
    pub fn supersedes(&self) -> Option<Parameter> {
        match self {
            Parameter::SoilAvailP => Some(Parameter::SoilTotalP),
            _ => None,
        }
    }
}

/// A resolved (or explicitly unresolved) reading for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterObservation {
    pub name: NormalizedName,
    pub domain: Domain,
    pub value: Option<f64>,
    /// Present when the source value was a range; `value` is its midpoint.
    pub range: Option<(f64, f64)>,
    pub unit: String,
    /// Where the value came from, or the last path inspected when unresolved.
    pub source_path: Option<String>,
    pub raw_text: Option<String>,
    #[serde(serialize_with = "serialize_miss")]
    pub miss: Option<ResolutionMiss>,
}

impl ParameterObservation {
    pub fn unresolved(
        name: NormalizedName,
        domain: Domain,
        last_path: Option<String>,
        miss: ResolutionMiss,
    ) -> Self {
        let unit = unit_label(&name);
        Self {
            name,
            domain,
            value: None,
            range: None,
            unit,
            source_path: last_path,
            raw_text: None,
            miss: Some(miss),
        }
    }

    pub fn canonical_name(&self) -> &str {
        self.name.as_str()
    }

    pub fn parameter(&self) -> Option<Parameter> {
        self.name.parameter()
    }

    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }
}

pub(crate) fn unit_label(name: &NormalizedName) -> String {
    name.parameter()
        .map(|p| p.unit().label().to_string())
        .unwrap_or_default()
}

fn serialize_miss<S: Serializer>(
    miss: &Option<ResolutionMiss>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match miss {
        Some(m) => serializer.serialize_some(&m.to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_parameter_listed_in_its_domain() {
        for domain in Domain::ALL {
            for p in Parameter::all(domain) {
                assert_eq!(p.domain(), domain, "{:?}", p);
            }
        }
        assert_eq!(Parameter::all(Domain::Soil).len() + Parameter::all(Domain::Leaf).len(), 17);
    }

    #[test]
    fn test_avail_p_supersedes_total_p() {
        assert_eq!(Parameter::SoilAvailP.supersedes(), Some(Parameter::SoilTotalP));
        assert_eq!(Parameter::SoilTotalP.supersedes(), None);
        assert_eq!(Parameter::SoilTotalP.unit(), Parameter::SoilAvailP.unit());
    }

    #[test]
    fn test_unresolved_observation_keeps_path() {
        let obs = ParameterObservation::unresolved(
            NormalizedName::Canonical(Parameter::LeafK),
            Domain::Leaf,
            Some("leaf_data".to_string()),
            ResolutionMiss::NotFound,
        );
        assert!(!obs.is_resolved());
        assert_eq!(obs.unit, "%");
        assert_eq!(obs.canonical_name(), "K (%)");
        assert_eq!(obs.source_path.as_deref(), Some("leaf_data"));
    }
}
