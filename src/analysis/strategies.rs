//! Candidate-path strategies for the parameter resolver.
//!
//! Each strategy knows one place (or one shape) where a parameter may live in
//! the raw analysis document. The resolver asks them in order and keeps the
//! first usable value; supporting a new document shape means adding a strategy.

use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::analysis::types::Domain;
use crate::error::ParseFailure;
use crate::utils::normalization::{match_label, normalize_key, MatchKind, NormalizedName};
use crate::utils::sanitize::{parse_numeric, Numeric};

/// Keys holding a summary statistic inside a per-parameter object.
const STAT_KEYS: &[&str] = &["average", "mean", "avg", "value", "mean_value", "observed"];

/// Keys holding a list of sample values inside a per-parameter object.
const SAMPLE_VALUE_KEYS: &[&str] = &["values", "samples", "sample_values"];

/// Keys naming the parameter in record-shaped entries (`{"parameter": "pH", "average": 4.2}`).
const RECORD_LABEL_KEYS: &[&str] = &["parameter", "name", "label", "param"];

/// Deep scan stops descending below this depth.
pub const MAX_SCAN_DEPTH: usize = 8;

pub type PathSegments = SmallVec<[String; 4]>;

/// Outcome of asking one strategy for one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    /// The location does not exist in this document.
    Unreachable,
    /// The location exists but has no entry for the parameter.
    Miss,
    /// An entry exists but its value could not be parsed.
    Unparseable { path: String, failure: ParseFailure },
    Found(Found),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Found {
    pub value: Numeric,
    pub raw_text: String,
    pub path: String,
}

/// Decides whether a document key names the parameter being resolved.
#[derive(Debug, Clone, Copy)]
pub struct LabelMatcher<'a> {
    target: &'a NormalizedName,
    domain: Domain,
}

impl<'a> LabelMatcher<'a> {
    pub fn new(target: &'a NormalizedName, domain: Domain) -> Self {
        Self { target, domain }
    }

    pub fn matches(&self, key: &str) -> Option<MatchKind> {
        match self.target {
            NormalizedName::Canonical(p) => match_label(key, self.domain)
                .filter(|(found, _)| found == p)
                .map(|(_, kind)| kind),
            NormalizedName::Unmatched(label) => {
                let wanted = normalize_key(label);
                (!wanted.is_empty() && normalize_key(key) == wanted).then_some(MatchKind::Exact)
            }
        }
    }
}

/// One candidate location in the raw analysis document.
pub trait ResolveStrategy: Send + Sync {
    /// Dotted description of the location, used for diagnostics.
    fn path(&self) -> &str;

    fn probe(&self, document: &Value, matcher: &LabelMatcher<'_>) -> Probe;
}

// ============================================================================
// Value extraction
// ============================================================================

/// Pull a number out of an entry: a scalar, a statistics object, or a list of
/// sample values (averaged).
pub fn extract_value(value: &Value) -> Result<(Numeric, String), ParseFailure> {
    match value {
        Value::Object(map) => {
            for key in STAT_KEYS {
                if let Some(v) = get_normalized(map, key) {
                    return extract_value(v);
                }
            }
            for key in SAMPLE_VALUE_KEYS {
                if let Some(v @ Value::Array(_)) = get_normalized(map, key) {
                    return extract_value(v);
                }
            }
            Err(ParseFailure::UnsupportedType("object"))
        }
        Value::Array(items) => {
            let mut points = Vec::with_capacity(items.len());
            let mut first_failure = None;
            for item in items {
                match extract_value(item) {
                    Ok((n, _)) => points.push(n.point()),
                    Err(e) => {
                        first_failure.get_or_insert(e);
                    }
                }
            }
            match mean(&points) {
                Some(value) => Ok((
                    Numeric::Point { value },
                    format!("mean of {} values", points.len()),
                )),
                None => Err(first_failure.unwrap_or(ParseFailure::Empty)),
            }
        }
        scalar => parse_numeric(scalar).map(|n| (n, raw_text(scalar))),
    }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Object lookup tolerant of key casing and punctuation.
pub(crate) fn get_normalized<'v>(map: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    if let Some(v) = map.get(key) {
        return Some(v);
    }
    let wanted = normalize_key(key);
    map.iter()
        .find(|(k, _)| normalize_key(k) == wanted)
        .map(|(_, v)| v)
}

/// Follow object keys from the document root.
pub(crate) fn walk<'v, S: AsRef<str>>(document: &'v Value, segments: &[S]) -> Option<&'v Value> {
    let mut current = document;
    for segment in segments {
        current = match current {
            Value::Object(map) => get_normalized(map, segment.as_ref())?,
            _ => return None,
        };
    }
    Some(current)
}

/// Best matching entry in a map: exact beats partial, first wins on ties.
fn best_entry<'v>(
    map: &'v Map<String, Value>,
    matcher: &LabelMatcher<'_>,
) -> Option<(&'v String, &'v Value)> {
    let mut best: Option<(MatchKind, &String, &Value)> = None;
    for (key, value) in map {
        if let Some(kind) = matcher.matches(key) {
            if best.as_ref().map_or(true, |(b, _, _)| kind < *b) {
                best = Some((kind, key, value));
            }
            if kind == MatchKind::Exact {
                break;
            }
        }
    }
    best.map(|(_, k, v)| (k, v))
}

fn record_label(record: &Map<String, Value>) -> Option<&str> {
    RECORD_LABEL_KEYS
        .iter()
        .find_map(|k| get_normalized(record, k))
        .and_then(|v| v.as_str())
}

fn probe_entry(path: String, value: &Value) -> Probe {
    match extract_value(value) {
        Ok((value, raw_text)) => Probe::Found(Found { value, raw_text, path }),
        Err(failure) => Probe::Unparseable { path, failure },
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// A map of label -> value at a fixed path, or a list of
/// `{"parameter": .., "average": ..}` records.
#[derive(Debug, Clone)]
pub struct KeyedMapStrategy {
    segments: PathSegments,
    path: String,
}

impl KeyedMapStrategy {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: PathSegments = segments.into_iter().map(Into::into).collect();
        let path = segments.join(".");
        Self { segments, path }
    }
}

impl ResolveStrategy for KeyedMapStrategy {
    fn path(&self) -> &str {
        &self.path
    }

    fn probe(&self, document: &Value, matcher: &LabelMatcher<'_>) -> Probe {
        match walk(document, self.segments.as_slice()) {
            None => Probe::Unreachable,
            Some(Value::Object(map)) => match best_entry(map, matcher) {
                Some((key, value)) => probe_entry(format!("{}.{}", self.path, key), value),
                None => Probe::Miss,
            },
            Some(Value::Array(records)) => {
                let mut best: Option<(MatchKind, usize)> = None;
                for (i, record) in records.iter().enumerate() {
                    let Value::Object(record) = record else { continue };
                    let Some(kind) = record_label(record).and_then(|l| matcher.matches(l)) else {
                        continue;
                    };
                    if best.map_or(true, |(b, _)| kind < b) {
                        best = Some((kind, i));
                    }
                }
                match best {
                    Some((_, i)) => probe_entry(format!("{}[{}]", self.path, i), &records[i]),
                    None => Probe::Miss,
                }
            }
            Some(_) => Probe::Miss,
        }
    }
}

/// A list of per-sample objects; the parameter's value is the sample mean.
#[derive(Debug, Clone)]
pub struct SampleListStrategy {
    segments: PathSegments,
    path: String,
}

impl SampleListStrategy {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: PathSegments = segments.into_iter().map(Into::into).collect();
        let path = segments.join(".");
        Self { segments, path }
    }
}

impl ResolveStrategy for SampleListStrategy {
    fn path(&self) -> &str {
        &self.path
    }

    fn probe(&self, document: &Value, matcher: &LabelMatcher<'_>) -> Probe {
        let samples = match walk(document, self.segments.as_slice()) {
            None => return Probe::Unreachable,
            Some(Value::Array(samples)) => samples,
            Some(_) => return Probe::Miss,
        };

        let mut points = Vec::new();
        let mut last_failure = None;
        let mut matched_key = None;
        for sample in samples {
            let Value::Object(sample) = sample else { continue };
            if let Some((key, value)) = best_entry(sample, matcher) {
                matched_key.get_or_insert_with(|| key.clone());
                match extract_value(value) {
                    Ok((n, _)) => points.push(n.point()),
                    Err(e) => last_failure = Some(e),
                }
            }
        }

        let Some(key) = matched_key else {
            return Probe::Miss;
        };
        let path = format!("{}[*].{}", self.path, key);
        match mean(&points) {
            Some(value) => Probe::Found(Found {
                value: Numeric::Point { value },
                raw_text: format!("mean of {} samples", points.len()),
                path,
            }),
            None => Probe::Unparseable {
                path,
                failure: last_failure.unwrap_or(ParseFailure::Empty),
            },
        }
    }
}

/// Flat top-level fields carrying a domain prefix, e.g. `soil_pH`.
#[derive(Debug, Clone)]
pub struct PrefixedFieldStrategy {
    prefix: String,
    path: String,
}

impl PrefixedFieldStrategy {
    pub fn new(domain: Domain) -> Self {
        let prefix = format!("{}_", domain.key());
        let path = format!("{}*", prefix);
        Self { prefix, path }
    }
}

impl ResolveStrategy for PrefixedFieldStrategy {
    fn path(&self) -> &str {
        &self.path
    }

    fn probe(&self, document: &Value, matcher: &LabelMatcher<'_>) -> Probe {
        let Value::Object(root) = document else {
            return Probe::Unreachable;
        };

        let mut best: Option<(MatchKind, &String, &Value)> = None;
        let mut any_prefixed = false;
        for (key, value) in root {
            let Some(rest) = strip_prefix_ignore_case(key, &self.prefix) else {
                continue;
            };
            any_prefixed = true;
            if let Some(kind) = matcher.matches(rest) {
                if best.as_ref().map_or(true, |(b, _, _)| kind < *b) {
                    best = Some((kind, key, value));
                }
            }
        }

        match best {
            Some((_, key, value)) => probe_entry(key.clone(), value),
            None if any_prefixed => Probe::Miss,
            None => Probe::Unreachable,
        }
    }
}

fn strip_prefix_ignore_case<'k>(key: &'k str, prefix: &str) -> Option<&'k str> {
    let head = key.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &key[prefix.len()..])
}

/// Last resort: scan every subtree whose key mentions the domain.
#[derive(Debug, Clone)]
pub struct DeepScanStrategy {
    domain_key: &'static str,
    path: String,
}

impl DeepScanStrategy {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain_key: domain.key(),
            path: format!("**.{}*", domain.key()),
        }
    }

    fn mentions_domain(&self, key: &str) -> bool {
        normalize_key(key)
            .split('_')
            .any(|t| t.starts_with(self.domain_key))
    }

    fn scan<'v>(
        &self,
        value: &'v Value,
        path: &str,
        depth: usize,
        in_domain: bool,
        matcher: &LabelMatcher<'_>,
        best: &mut Option<(MatchKind, String, &'v Value)>,
    ) {
        if depth > MAX_SCAN_DEPTH || matches!(best, Some((MatchKind::Exact, _, _))) {
            return;
        }
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    if in_domain {
                        if let Some(kind) = matcher.matches(key) {
                            if best.as_ref().map_or(true, |(b, _, _)| kind < *b) {
                                *best = Some((kind, child_path.clone(), child));
                            }
                            if kind == MatchKind::Exact {
                                return;
                            }
                            continue;
                        }
                    }
                    let child_in_domain = in_domain || self.mentions_domain(key);
                    self.scan(child, &child_path, depth + 1, child_in_domain, matcher, best);
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let child_path = format!("{}[{}]", path, i);
                    self.scan(item, &child_path, depth + 1, in_domain, matcher, best);
                }
            }
            _ => {}
        }
    }
}

impl ResolveStrategy for DeepScanStrategy {
    fn path(&self) -> &str {
        &self.path
    }

    fn probe(&self, document: &Value, matcher: &LabelMatcher<'_>) -> Probe {
        if !document.is_object() {
            return Probe::Unreachable;
        }
        let mut best = None;
        self.scan(document, "", 0, false, matcher, &mut best);
        match best {
            Some((_, path, value)) => probe_entry(path, value),
            None => Probe::Miss,
        }
    }
}

/// Default candidate order for a domain.
pub fn default_strategies(domain: Domain) -> Vec<Box<dyn ResolveStrategy>> {
    let d = domain.key();
    vec![
        Box::new(KeyedMapStrategy::new(["user_overrides", d])),
        Box::new(KeyedMapStrategy::new([format!("structured_{}_data", d)])),
        Box::new(KeyedMapStrategy::new([
            format!("structured_{}_data", d),
            "parameter_statistics".to_string(),
        ])),
        Box::new(KeyedMapStrategy::new([
            "raw_data".to_string(),
            format!("{}_parameters", d),
            "parameter_statistics".to_string(),
        ])),
        Box::new(KeyedMapStrategy::new([
            format!("{}_parameters", d),
            "parameter_statistics".to_string(),
        ])),
        Box::new(SampleListStrategy::new(["raw_data".to_string(), format!("{}_samples", d)])),
        Box::new(SampleListStrategy::new([format!("{}_samples", d)])),
        Box::new(KeyedMapStrategy::new([format!("{}_data", d)])),
        Box::new(PrefixedFieldStrategy::new(domain)),
        Box::new(DeepScanStrategy::new(domain)),
    ]
}
