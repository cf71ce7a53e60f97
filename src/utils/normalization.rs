//! Name Normalizer
//!
//! Maps an observed parameter label (any casing, punctuation, alias or unit
//! notation) to one canonical parameter of a domain.
//!
//! Ratio labels ("Ca:Mg", "Mg/K") and derived figures ("pH std", "K max")
//! never match.
//!
//! Matching order:
//! 1. exact match of the normalised key against the domain's aliases
//! 2. exact match without a trailing bracketed unit group ("Cu (mg / kg)" -> "cu")
//! 3. exact match after dropping trailing unit tokens ("Cu mg/kg" -> "cu")
//! 4. partial match: an alias fragment appears as a contiguous token run
//!
//! Unmatched labels are returned unchanged and used as a best-effort name.
//! The normaliser is total and deterministic.

use std::fmt;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};

use crate::analysis::types::{Domain, Parameter};
use crate::utils::lookup_tables::{alias_table, DERIVED_TOKENS, ELEMENT_SYMBOLS, UNIT_TOKENS};

/// Normalised alias key -> parameter, per domain.
static ALIAS_INDEX: LazyLock<FxHashMap<(Domain, String), Parameter>> = LazyLock::new(|| {
    let mut index = FxHashMap::default();
    for domain in Domain::ALL {
        for entry in alias_table(domain) {
            let canonical = normalize_key(entry.parameter.canonical_name());
            index.insert((domain, canonical), entry.parameter);
            for alias in entry.aliases {
                index.insert((domain, normalize_key(alias)), entry.parameter);
            }
        }
    }
    index
});

/// Result of normalising a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedName {
    Canonical(Parameter),
    /// No alias matched; the original label is kept.
    Unmatched(String),
}

impl NormalizedName {
    /// Canonical name, or the original label when unmatched.
    pub fn as_str(&self) -> &str {
        match self {
            NormalizedName::Canonical(p) => p.canonical_name(),
            NormalizedName::Unmatched(label) => label.as_str(),
        }
    }

    pub fn parameter(&self) -> Option<Parameter> {
        match self {
            NormalizedName::Canonical(p) => Some(*p),
            NormalizedName::Unmatched(_) => None,
        }
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NormalizedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How a label matched its parameter. Exact sorts before Partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    Partial,
}

/// Case-fold, drop punctuation, join words with `_`.
///
/// Brackets, dots, dashes and whitespace separate words; other punctuation
/// (`%`, `/`, `*`) is removed without splitting.
pub fn normalize_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    let mut pending_sep = false;

    for c in label.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.extend(c.to_lowercase());
        } else if c.is_whitespace() || "_-.()[]{},:;".contains(c) {
            pending_sep = true;
        }
    }

    key
}

/// Match a label against a domain's alias table.
pub fn match_label(label: &str, domain: Domain) -> Option<(Parameter, MatchKind)> {
    let key = normalize_key(label);
    if key.is_empty() || is_ratio_label(label) {
        return None;
    }

    let tokens: Vec<&str> = key.split('_').collect();
    if tokens.iter().any(|t| DERIVED_TOKENS.contains(t)) {
        return None;
    }

    if let Some(p) = ALIAS_INDEX.get(&(domain, key.clone())) {
        return Some((*p, MatchKind::Exact));
    }

    if let Some(head) = without_unit_group(label) {
        if let Some(p) = ALIAS_INDEX.get(&(domain, normalize_key(head))) {
            return Some((*p, MatchKind::Exact));
        }
    }

    // Unit-stripped exact match; the first token is never stripped.
    let mut end = tokens.len();
    while end > 1 {
        if end > 2 && tokens[end - 2..end] == ["mg", "kg"] {
            end -= 2;
        } else if UNIT_TOKENS.contains(&tokens[end - 1]) {
            end -= 1;
        } else {
            break;
        }
        if let Some(p) = ALIAS_INDEX.get(&(domain, tokens[..end].join("_"))) {
            return Some((*p, MatchKind::Exact));
        }
    }

    for entry in alias_table(domain) {
        for fragment in entry.fragments {
            let frag_tokens: Vec<&str> = fragment.split('_').collect();
            if contains_token_run(&tokens, &frag_tokens) {
                return Some((entry.parameter, MatchKind::Partial));
            }
        }
    }

    None
}

/// Two different element symbols joined by `:` or `/` ("Ca:Mg", "N/P ratio",
/// "Exch. Ca:Exch. Mg").
///
/// Symbols anywhere on either side count when written in their usual case.
/// Around `:` the adjacent words are also compared case-insensitively; `:`
/// never appears in unit notation, unlike `/` ("mg/kg").
pub fn is_ratio_label(label: &str) -> bool {
    let symbol = |word: &str, exact_case: bool| {
        ELEMENT_SYMBOLS
            .iter()
            .find(|s| if exact_case { **s == word } else { s.eq_ignore_ascii_case(word) })
            .copied()
    };
    let symbols_in = |text: &str| -> Vec<&'static str> {
        words(text).filter_map(|w| symbol(w, true)).collect()
    };

    for sep in [':', '/'] {
        let parts: Vec<&str> = label.split(sep).collect();
        for pair in parts.windows(2) {
            let (left, right) = (symbols_in(pair[0]), symbols_in(pair[1]));
            if left.iter().any(|l| right.iter().any(|r| l != r)) {
                return true;
            }
            if sep == ':' {
                let adjacent = (words(pair[0]).last(), words(pair[1]).next());
                if let (Some(l), Some(r)) = adjacent {
                    if let (Some(l), Some(r)) = (symbol(l, false), symbol(r, false)) {
                        if l != r {
                            return true;
                        }
                    }
                }
            }
        }
    }
    false
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphabetic()).filter(|w| !w.is_empty())
}

/// Label without a trailing "(...)" or "[...]" group of unit notation.
///
/// Inside brackets `mg` is a unit, so "(mg / kg)" qualifies; "(KCl)" does not.
fn without_unit_group(label: &str) -> Option<&str> {
    let trimmed = label.trim_end();
    let open = match trimmed.chars().last()? {
        ')' => '(',
        ']' => '[',
        _ => return None,
    };
    let start = trimmed.rfind(open)?;
    let inner = normalize_key(&trimmed[start + 1..trimmed.len() - 1]);
    let is_unit = inner.is_empty()
        || inner.split('_').all(|t| t == "mg" || UNIT_TOKENS.contains(&t));
    let head = trimmed[..start].trim_end();
    (is_unit && !head.is_empty()).then_some(head)
}

/// Normalise a label to its canonical name, or keep it unchanged.
pub fn normalize(raw_label: &str, domain: Domain) -> NormalizedName {
    match match_label(raw_label, domain) {
        Some((p, _)) => NormalizedName::Canonical(p),
        None => NormalizedName::Unmatched(raw_label.to_string()),
    }
}

fn contains_token_run(haystack: &[&str], needle: &[&str]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::lookup_tables::alias_table;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Avail P (mg/kg)"), "avail_p_mgkg");
        assert_eq!(normalize_key("  Exch. K (meq%) "), "exch_k_meq");
        assert_eq!(normalize_key("N (%)"), "n");
        assert_eq!(normalize_key("pH(H2O)"), "ph_h2o");
        assert_eq!(normalize_key("Soil__pH--value"), "soil_ph_value");
        assert_eq!(normalize_key("%"), "");
    }

    #[test]
    fn test_all_aliases_agree_with_siblings() {
        for domain in Domain::ALL {
            for entry in alias_table(domain) {
                let canonical = normalize(entry.parameter.canonical_name(), domain);
                assert_eq!(canonical, NormalizedName::Canonical(entry.parameter));
                for alias in entry.aliases {
                    assert_eq!(
                        normalize(alias, domain),
                        canonical,
                        "alias {:?} in {:?}",
                        alias,
                        domain
                    );
                }
            }
        }
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        assert_eq!(normalize("AVAILABLE phosphorus", Domain::Soil).as_str(), "Avail P (mg/kg)");
        assert_eq!(normalize("exch.mg", Domain::Soil).as_str(), "Exch. Mg (meq%)");
        assert_eq!(normalize("PH", Domain::Soil).as_str(), "pH");
    }

    #[test]
    fn test_unit_notation_stripped() {
        assert_eq!(match_label("Cu (mg / kg)", Domain::Leaf), Some((Parameter::LeafCu, MatchKind::Exact)));
        assert_eq!(match_label("Mg (cmol/kg)", Domain::Soil), Some((Parameter::SoilExchMg, MatchKind::Exact)));
        assert_eq!(match_label("Leaf Mg (mg/kg)", Domain::Leaf), Some((Parameter::LeafMg, MatchKind::Exact)));
    }

    #[test]
    fn test_partial_match() {
        assert_eq!(
            match_label("Soil pH (KCl) average", Domain::Soil),
            Some((Parameter::SoilPh, MatchKind::Partial))
        );
        assert_eq!(
            match_label("exchangeable_potassium_content", Domain::Soil),
            Some((Parameter::SoilExchK, MatchKind::Partial))
        );
        assert_eq!(
            match_label("Frond 17 Boron content", Domain::Leaf),
            Some((Parameter::LeafB, MatchKind::Partial))
        );
    }

    #[test]
    fn test_ph_fragment_does_not_match_phosphorus() {
        assert_eq!(
            match_label("Total Phosphorus Content", Domain::Soil),
            Some((Parameter::SoilTotalP, MatchKind::Partial))
        );
    }

    #[test]
    fn test_ratio_labels_never_match() {
        for label in ["Ca:Mg", "K:Mg", "K : Mg", "N:P ratio", "Mg/K", "Ca/Mg ratio", "CA:MG"] {
            assert_eq!(match_label(label, Domain::Soil), None, "{label:?}");
            assert_eq!(match_label(label, Domain::Leaf), None, "{label:?}");
        }
        assert_eq!(normalize("Ca:Mg", Domain::Soil), NormalizedName::Unmatched("Ca:Mg".to_string()));
        assert!(is_ratio_label("Exch. Ca:Exch. Mg"));
        assert!(!is_ratio_label("Mg (mg/kg)"));
        assert!(!is_ratio_label("B (mg/kg)"));
    }

    #[test]
    fn test_magnesium_symbol_is_not_a_unit() {
        assert_eq!(match_label("K Mg", Domain::Leaf), None);
        assert_eq!(match_label("Cu mg kg", Domain::Leaf), Some((Parameter::LeafCu, MatchKind::Exact)));
        assert_eq!(match_label("Cu mg/kg", Domain::Leaf), Some((Parameter::LeafCu, MatchKind::Exact)));
    }

    #[test]
    fn test_derived_figures_never_match() {
        assert_eq!(match_label("pH std", Domain::Soil), None);
        assert_eq!(match_label("Exch. K (meq%) max", Domain::Soil), None);
        assert_eq!(match_label("min", Domain::Leaf), None);
    }

    #[test]
    fn test_domain_selects_table() {
        assert_eq!(normalize("K", Domain::Soil), NormalizedName::Canonical(Parameter::SoilExchK));
        assert_eq!(normalize("K", Domain::Leaf), NormalizedName::Canonical(Parameter::LeafK));
        assert_eq!(normalize("Total P", Domain::Leaf), NormalizedName::Canonical(Parameter::LeafP));
    }

    #[test]
    fn test_unmatched_label_returned_unchanged() {
        let name = normalize("Sulphur (ppm)", Domain::Leaf);
        assert_eq!(name, NormalizedName::Unmatched("Sulphur (ppm)".to_string()));
        assert_eq!(name.as_str(), "Sulphur (ppm)");
        assert_eq!(normalize("", Domain::Soil).as_str(), "");
    }
}
