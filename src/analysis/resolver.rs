//! Parameter Resolver
//!
//! Walks an ordered chain of candidate-path strategies per domain and returns
//! the first usable observation for each canonical parameter.
//!
//! Absence is a valid outcome: the resolver never fails, it returns an
//! unresolved observation recording the last path it inspected and why.

use serde_json::Value;

use crate::analysis::strategies::{default_strategies, LabelMatcher, Probe, ResolveStrategy};
use crate::analysis::types::{unit_label, Domain, Parameter, ParameterObservation};
use crate::error::ResolutionMiss;
use crate::utils::normalization::{normalize, NormalizedName};

/// Ordered strategy chains for soil and leaf parameters.
pub struct Resolver {
    soil: Vec<Box<dyn ResolveStrategy>>,
    leaf: Vec<Box<dyn ResolveStrategy>>,
}

impl Resolver {
    /// Resolver with the default candidate paths for both domains.
    pub fn new() -> Self {
        Self {
            soil: default_strategies(Domain::Soil),
            leaf: default_strategies(Domain::Leaf),
        }
    }

    /// Resolver with no strategies; populate with `push_strategy`.
    pub fn empty() -> Self {
        Self {
            soil: Vec::new(),
            leaf: Vec::new(),
        }
    }

    /// Append a strategy to the end of a domain's chain.
    pub fn push_strategy(&mut self, domain: Domain, strategy: Box<dyn ResolveStrategy>) {
        self.chain_mut(domain).push(strategy);
    }

    /// Insert a strategy ahead of all others in a domain's chain.
    pub fn prepend_strategy(&mut self, domain: Domain, strategy: Box<dyn ResolveStrategy>) {
        self.chain_mut(domain).insert(0, strategy);
    }

    pub fn candidate_paths(&self, domain: Domain) -> Vec<&str> {
        self.chain(domain).iter().map(|s| s.path()).collect()
    }

    fn chain(&self, domain: Domain) -> &[Box<dyn ResolveStrategy>] {
        match domain {
            Domain::Soil => &self.soil,
            Domain::Leaf => &self.leaf,
        }
    }

    fn chain_mut(&mut self, domain: Domain) -> &mut Vec<Box<dyn ResolveStrategy>> {
        match domain {
            Domain::Soil => &mut self.soil,
            Domain::Leaf => &mut self.leaf,
        }
    }

    /// Resolve one canonical parameter.
    pub fn resolve(&self, document: &Value, parameter: Parameter) -> ParameterObservation {
        self.resolve_name(document, NormalizedName::Canonical(parameter), parameter.domain())
    }

    /// Resolve by raw label. Unrecognised labels match only identical keys.
    pub fn resolve_named(&self, document: &Value, label: &str, domain: Domain) -> ParameterObservation {
        self.resolve_name(document, normalize(label, domain), domain)
    }

    fn resolve_name(&self, document: &Value, name: NormalizedName, domain: Domain) -> ParameterObservation {
        let matcher = LabelMatcher::new(&name, domain);
        let mut last_path: Option<String> = None;
        let mut last_failure = None;

        for strategy in self.chain(domain) {
            match strategy.probe(document, &matcher) {
                Probe::Unreachable => {}
                Probe::Miss => last_path = Some(strategy.path().to_string()),
                Probe::Unparseable { path, failure } => {
                    tracing::debug!("{} at {} unparseable: {}", name, path, failure);
                    last_path = Some(path);
                    last_failure = Some(failure);
                }
                Probe::Found(found) => {
                    tracing::debug!("{} resolved from {} ({})", name, found.path, found.raw_text);
                    let unit = unit_label(&name);
                    return ParameterObservation {
                        name,
                        domain,
                        value: Some(found.value.point()),
                        range: found.value.is_range().then(|| found.value.bounds()),
                        unit,
                        source_path: Some(found.path),
                        raw_text: Some(found.raw_text),
                        miss: None,
                    };
                }
            }
        }

        let miss = last_failure
            .map(ResolutionMiss::Unparseable)
            .unwrap_or(ResolutionMiss::NotFound);
        tracing::debug!("{} unresolved ({}), last path {:?}", name, miss, last_path);
        ParameterObservation::unresolved(name, domain, last_path, miss)
    }

    /// Resolve every parameter of a domain in display order.
    ///
    /// A coarser parameter is dropped when the finer one that supersedes it
    /// resolved; the two are never averaged.
    pub fn resolve_domain(&self, document: &Value, domain: Domain) -> Vec<ParameterObservation> {
        let mut observations: Vec<ParameterObservation> = Parameter::all(domain)
            .iter()
            .map(|p| self.resolve(document, *p))
            .collect();

        let superseded: Vec<Parameter> = observations
            .iter()
            .filter(|o| o.is_resolved())
            .filter_map(|o| o.parameter().and_then(|p| p.supersedes()))
            .collect();

        if !superseded.is_empty() {
            observations.retain(|o| o.parameter().map_or(true, |p| !superseded.contains(&p)));
        }
        observations
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::strategies::KeyedMapStrategy;
    use crate::error::ParseFailure;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_override_wins_over_later_candidates() {
        let doc = json!({
            "user_overrides": {"soil": {"pH": 5.1}},
            "raw_data": {"soil_parameters": {"parameter_statistics": {"pH": {"average": 4.0}}}}
        });
        let obs = Resolver::new().resolve(&doc, Parameter::SoilPh);
        assert_eq!(obs.value, Some(5.1));
        assert_eq!(obs.source_path.as_deref(), Some("user_overrides.soil.pH"));
    }

    #[test]
    fn test_falls_through_to_statistics() {
        let doc = json!({
            "structured_soil_data": {"CEC": 7.5},
            "raw_data": {"soil_parameters": {"parameter_statistics": {
                "pH": {"average": "4.0", "min": 3.6, "max": 4.4}
            }}}
        });
        let obs = Resolver::new().resolve(&doc, Parameter::SoilPh);
        assert_eq!(obs.value, Some(4.0));
        assert_eq!(
            obs.source_path.as_deref(),
            Some("raw_data.soil_parameters.parameter_statistics.pH")
        );
        assert!(obs.miss.is_none());
    }

    #[test]
    fn test_unparseable_candidate_skipped_for_later_value() {
        let doc = json!({
            "structured_leaf_data": {"K": "N.D."},
            "leaf_data": {"K (%)": 0.92}
        });
        let obs = Resolver::new().resolve(&doc, Parameter::LeafK);
        assert_eq!(obs.value, Some(0.92));
    }

    #[test]
    fn test_unresolved_records_last_path_and_reason() {
        let doc = json!({"leaf_data": {"K": "N.D."}});
        let obs = Resolver::new().resolve(&doc, Parameter::LeafK);
        assert!(!obs.is_resolved());
        assert_eq!(obs.source_path.as_deref(), Some("leaf_data.K"));
        assert_eq!(
            obs.miss,
            Some(ResolutionMiss::Unparseable(ParseFailure::NotDetected("N.D.".to_string())))
        );

        let empty = Resolver::new().resolve(&json!({}), Parameter::LeafK);
        assert_eq!(empty.miss, Some(ResolutionMiss::NotFound));
        assert_eq!(empty.source_path.as_deref(), Some("**.leaf*"));
    }

    #[test]
    fn test_range_value_keeps_bounds() {
        let doc = json!({"soil_data": {"pH": "4.2-4.8"}});
        let obs = Resolver::new().resolve(&doc, Parameter::SoilPh);
        assert_relative_eq!(obs.value.unwrap(), 4.5);
        assert_eq!(obs.range, Some((4.2, 4.8)));
    }

    #[test]
    fn test_finer_phosphorus_supersedes_total() {
        let doc = json!({"soil_data": {"Total P (mg/kg)": 50, "Avail P (mg/kg)": 20}});
        let observations = Resolver::new().resolve_domain(&doc, Domain::Soil);
        let names: Vec<&str> = observations.iter().map(|o| o.canonical_name()).collect();
        assert!(names.contains(&"Avail P (mg/kg)"));
        assert!(!names.contains(&"Total P (mg/kg)"));
        let p = observations
            .iter()
            .find(|o| o.parameter() == Some(Parameter::SoilAvailP))
            .unwrap();
        assert_eq!(p.value, Some(20.0));
    }

    #[test]
    fn test_total_p_kept_when_avail_p_missing() {
        let doc = json!({"soil_data": {"Total P (mg/kg)": 50}});
        let observations = Resolver::new().resolve_domain(&doc, Domain::Soil);
        assert_eq!(observations.len(), Parameter::all(Domain::Soil).len());
    }

    #[test]
    fn test_resolve_named_with_alias_and_unknown_label() {
        let doc = json!({"leaf_data": {"Leaf Zn": 14, "S (%)": 0.2}});
        let resolver = Resolver::new();
        let zn = resolver.resolve_named(&doc, "zinc", Domain::Leaf);
        assert_eq!(zn.canonical_name(), "Zn (mg/kg)");
        assert_eq!(zn.value, Some(14.0));

        let s = resolver.resolve_named(&doc, "S (%)", Domain::Leaf);
        assert_eq!(s.canonical_name(), "S (%)");
        assert_eq!(s.value, Some(0.2));
        assert_eq!(s.unit, "");
    }

    #[test]
    fn test_custom_strategy_prepended() {
        let mut resolver = Resolver::new();
        resolver.prepend_strategy(Domain::Soil, Box::new(KeyedMapStrategy::new(["lab", "soil"])));
        let doc = json!({"lab": {"soil": {"pH": 6.0}}, "soil_data": {"pH": 4.0}});
        assert_eq!(resolver.resolve(&doc, Parameter::SoilPh).value, Some(6.0));
        assert_eq!(resolver.candidate_paths(Domain::Soil)[0], "lab.soil");
    }

    #[test]
    fn test_ratio_key_sorted_ahead_is_skipped() {
        // "Ca:Mg" sorts before "Exch. Ca (meq%)" in the map
        let doc = json!({"soil_data": {"Ca:Mg": 3.2, "Exch. Ca (meq%)": 0.8}});
        let obs = Resolver::new().resolve(&doc, Parameter::SoilExchCa);
        assert_eq!(obs.value, Some(0.8));
        assert_eq!(obs.source_path.as_deref(), Some("soil_data.Exch. Ca (meq%)"));
    }

    #[test]
    fn test_derived_keys_do_not_shadow_measurement() {
        let doc = json!({"leaf_data": {"K max": 1.4, "K:Mg": 3.0, "Mg/K": 0.3, "Potassium": 0.9}});
        let resolver = Resolver::new();

        let k = resolver.resolve(&doc, Parameter::LeafK);
        assert_eq!(k.value, Some(0.9));
        assert_eq!(k.source_path.as_deref(), Some("leaf_data.Potassium"));

        assert!(!resolver.resolve(&doc, Parameter::LeafMg).is_resolved());
    }

    #[test]
    fn test_ratio_subtree_yields_no_nutrient() {
        let doc = json!({"soil_analysis": {"nutrient_ratios": {"K:Mg": 0.6, "Ca/Mg": 2.5}}});
        let resolver = Resolver::new();
        for parameter in [Parameter::SoilExchK, Parameter::SoilExchCa, Parameter::SoilExchMg] {
            let obs = resolver.resolve(&doc, parameter);
            assert!(!obs.is_resolved(), "{:?}", parameter);
            assert_eq!(obs.miss, Some(ResolutionMiss::NotFound));
        }
    }

    #[test]
    fn test_non_object_document_never_panics() {
        let resolver = Resolver::new();
        for doc in [json!(null), json!([1, 2, 3]), json!("text"), json!(42)] {
            let obs = resolver.resolve(&doc, Parameter::SoilPh);
            assert!(!obs.is_resolved());
        }
    }
}
