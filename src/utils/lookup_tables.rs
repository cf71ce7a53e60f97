//! Parameter Alias Lookup Tables
//!
//! Maps the many labels an analysis document uses for a measurement onto one
//! canonical `Parameter` per domain.
//!
//! - `aliases`: raw labels, normalised with `normalize_key` when the index is built
//! - `fragments`: already-normalised token runs for partial matching
//!
//! Entries are ordered most specific first; partial matching stops at the first
//! entry with a matching fragment.

use crate::analysis::types::{Domain, Parameter};

/// Alias set for one canonical parameter.
#[derive(Debug, Clone)]
pub struct AliasEntry {
    pub parameter: Parameter,
    pub aliases: &'static [&'static str],
    pub fragments: &'static [&'static str],
}

/// Trailing tokens that only carry unit notation ("Cu mg/kg", "Mg cmol/kg").
///
/// `mg` is absent: it is also the magnesium symbol. A split "mg kg" pair is
/// handled by the normaliser.
pub static UNIT_TOKENS: &[&str] = &[
    "pct", "percent", "mgkg", "kg", "ppm", "meq", "meq100g", "cmol", "cmolkg", "cmolckg", "g", "dw",
];

/// Element symbols as written in laboratory labels. Two of them joined by
/// `:` or `/` make a ratio label ("Ca:Mg", "Mg/K").
pub static ELEMENT_SYMBOLS: &[&str] = &[
    "N", "P", "K", "Ca", "Mg", "B", "Cu", "Zn", "C", "S", "Fe", "Mn", "Na", "Al",
];

/// Tokens marking a derived figure rather than the measurement itself.
pub static DERIVED_TOKENS: &[&str] = &[
    "ratio", "ratios", "std", "stdev", "stddev", "sd", "cv", "variance", "count", "min", "max", "minimum",
    "maximum",
];

// ============================================================================
// SOIL
// ============================================================================

static SOIL_ALIASES: &[AliasEntry] = &[
    AliasEntry {
        parameter: Parameter::SoilAvailP,
        aliases: &["Avail P (mg/kg)", "Avail P", "Available P", "Available Phosphorus", "Avail. P", "P (mg/kg)", "P", "Bray P"],
        fragments: &["avail_p", "available_p", "available_phosphorus", "bray_p", "bray"],
    },
    AliasEntry {
        parameter: Parameter::SoilTotalP,
        aliases: &["Total P (mg/kg)", "Total P", "Total Phosphorus", "TP", "Total_P"],
        fragments: &["total_p", "total_phosphorus"],
    },
    AliasEntry {
        parameter: Parameter::SoilExchK,
        aliases: &["Exch. K (meq%)", "Exch K", "Exchangeable K", "Exchangeable Potassium", "K (meq%)", "K", "Exch_K"],
        fragments: &["exch_k", "exchangeable_k", "exchangeable_potassium", "potassium"],
    },
    AliasEntry {
        parameter: Parameter::SoilExchCa,
        aliases: &["Exch. Ca (meq%)", "Exch Ca", "Exchangeable Ca", "Exchangeable Calcium", "Ca (meq%)", "Ca", "Exch_Ca"],
        fragments: &["exch_ca", "exchangeable_ca", "exchangeable_calcium", "calcium"],
    },
    AliasEntry {
        parameter: Parameter::SoilExchMg,
        aliases: &["Exch. Mg (meq%)", "Exch Mg", "Exchangeable Mg", "Exchangeable Magnesium", "Mg (meq%)", "Mg", "Exch_Mg"],
        fragments: &["exch_mg", "exchangeable_mg", "exchangeable_magnesium", "magnesium"],
    },
    AliasEntry {
        parameter: Parameter::SoilCec,
        aliases: &["CEC (meq%)", "CEC", "Cation Exchange Capacity", "C.E.C.", "CEC (cmol/kg)"],
        fragments: &["cec", "cation_exchange_capacity", "c_e_c"],
    },
    AliasEntry {
        parameter: Parameter::SoilOrganicCarbon,
        aliases: &["Org. C (%)", "Organic Carbon", "Org C", "OC", "Organic C (%)", "Org. Carbon"],
        fragments: &["organic_carbon", "org_c", "organic_c", "org_carbon"],
    },
    AliasEntry {
        parameter: Parameter::SoilNitrogen,
        aliases: &["N (%)", "N", "Nitrogen", "Total N", "Total Nitrogen", "N%"],
        fragments: &["nitrogen", "total_n"],
    },
    AliasEntry {
        parameter: Parameter::SoilPh,
        aliases: &["pH", "pH (H2O)", "Soil pH", "pH H2O", "pH_value", "pH Value"],
        fragments: &["ph"],
    },
];

// ============================================================================
// LEAF
// ============================================================================

static LEAF_ALIASES: &[AliasEntry] = &[
    AliasEntry {
        parameter: Parameter::LeafN,
        aliases: &["N (%)", "N", "Nitrogen", "Leaf N", "N %", "Total N"],
        fragments: &["nitrogen", "leaf_n"],
    },
    AliasEntry {
        parameter: Parameter::LeafP,
        aliases: &["P (%)", "P", "Phosphorus", "Leaf P", "Total P"],
        fragments: &["phosphorus", "leaf_p"],
    },
    AliasEntry {
        parameter: Parameter::LeafK,
        aliases: &["K (%)", "K", "Potassium", "Leaf K"],
        fragments: &["potassium", "leaf_k"],
    },
    AliasEntry {
        parameter: Parameter::LeafMg,
        aliases: &["Mg (%)", "Mg", "Magnesium", "Leaf Mg"],
        fragments: &["magnesium", "leaf_mg"],
    },
    AliasEntry {
        parameter: Parameter::LeafCa,
        aliases: &["Ca (%)", "Ca", "Calcium", "Leaf Ca"],
        fragments: &["calcium", "leaf_ca"],
    },
    AliasEntry {
        parameter: Parameter::LeafB,
        aliases: &["B (mg/kg)", "B", "Boron", "Leaf B", "B (ppm)"],
        fragments: &["boron", "leaf_b"],
    },
    AliasEntry {
        parameter: Parameter::LeafCu,
        aliases: &["Cu (mg/kg)", "Cu", "Copper", "Leaf Cu", "Cu (ppm)"],
        fragments: &["copper", "leaf_cu"],
    },
    AliasEntry {
        parameter: Parameter::LeafZn,
        aliases: &["Zn (mg/kg)", "Zn", "Zinc", "Leaf Zn", "Zn (ppm)"],
        fragments: &["zinc", "leaf_zn"],
    },
];

/// Alias table for a domain.
pub fn alias_table(domain: Domain) -> &'static [AliasEntry] {
    match domain {
        Domain::Soil => SOIL_ALIASES,
        Domain::Leaf => LEAF_ALIASES,
    }
}

/// Alias entry for a parameter.
pub fn aliases_for(parameter: Parameter) -> Option<&'static AliasEntry> {
    alias_table(parameter.domain())
        .iter()
        .find(|e| e.parameter == parameter)
}
