use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily-rate range. At least one bound is set, bounds are positive and
/// ordered. Only [`RateRange::new`] builds one, so every value upholds this.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRange {
    min: Option<f64>,
    max: Option<f64>,
    currency: String,
}

impl RateRange {
    /// Validate and build a range. Returns `None` when the bounds break the
    /// invariants (both absent, non-positive, non-finite, or `min > max`).
    pub fn new(min: Option<f64>, max: Option<f64>, currency: impl Into<String>) -> Option<Self> {
        if min.is_none() && max.is_none() {
            return None;
        }
        let valid = |v: Option<f64>| v.is_none_or(|v| v.is_finite() && v > 0.0);
        if !valid(min) || !valid(max) {
            return None;
        }
        if let (Some(lo), Some(hi)) = (min, max)
            && lo > hi
        {
            return None;
        }
        Some(Self {
            min,
            max,
            currency: currency.into(),
        })
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Midpoint of the range, or the single bound when only one is set.
    pub fn average(&self) -> f64 {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => (lo + hi) / 2.0,
            (Some(v), None) | (None, Some(v)) => v,
            // unreachable by construction
            (None, None) => 0.0,
        }
    }
}

/// Geographic location of an offer. `country` is always populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: String,
    pub raw_text: Option<String>,
}

impl Location {
    /// True when at least a city or a region was resolved.
    pub fn is_known(&self) -> bool {
        self.city.is_some() || self.region.is_some()
    }

    /// Single display string used by the flattened row (`"Paris, Île-de-France, France"`).
    /// `None` when neither city nor region is known.
    pub fn display(&self) -> Option<String> {
        if !self.is_known() {
            return None;
        }
        let parts: Vec<&str> = [self.city.as_deref(), self.region.as_deref()]
            .into_iter()
            .flatten()
            .chain(std::iter::once(self.country.as_str()))
            .collect();
        Some(parts.join(", "))
    }
}

/// Ordered, case-insensitively deduplicated, capped list of canonical
/// technology names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TechnologySet(Vec<String>);

impl TechnologySet {
    /// Deduplicate (first occurrence wins), sort, then truncate to `cap`.
    pub fn new(names: impl IntoIterator<Item = String>, cap: usize) -> Self {
        let mut seen = BTreeSet::new();
        let mut items: Vec<String> = names
            .into_iter()
            .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
            .collect();
        items.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
        items.truncate(cap);
        Self(items)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Contract type of an offer. Freelance is the most common value and the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    #[default]
    Freelance,
    Cdi,
    Cdd,
    Stage,
    Apprentissage,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Freelance => "freelance",
            ContractType::Cdi => "cdi",
            ContractType::Cdd => "cdd",
            ContractType::Stage => "stage",
            ContractType::Apprentissage => "apprentissage",
        }
    }
}

/// Remote-work policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePolicy {
    OnSite,
    Remote,
    Hybrid,
    Negotiable,
    #[default]
    Unspecified,
}

impl RemotePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemotePolicy::OnSite => "on_site",
            RemotePolicy::Remote => "remote",
            RemotePolicy::Hybrid => "hybrid",
            RemotePolicy::Negotiable => "negotiable",
            RemotePolicy::Unspecified => "unspecified",
        }
    }

    pub fn is_specified(&self) -> bool {
        *self != RemotePolicy::Unspecified
    }
}

/// Seniority level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeniorityLevel {
    Junior,
    Middle,
    Senior,
    Lead,
    Expert,
    #[default]
    Unknown,
}

impl SeniorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeniorityLevel::Junior => "junior",
            SeniorityLevel::Middle => "middle",
            SeniorityLevel::Senior => "senior",
            SeniorityLevel::Lead => "lead",
            SeniorityLevel::Expert => "expert",
            SeniorityLevel::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != SeniorityLevel::Unknown
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display_as_str!(ContractType, RemotePolicy, SeniorityLevel);

/// Trust score of one offer.
///
/// `overall` is always the mean of the three sub-scores; it has no setter
/// and is recomputed whenever a sub-score changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityMetrics {
    completeness: f64,
    accuracy: f64,
    consistency: f64,
    overall: f64,
    pub missing_fields: BTreeSet<String>,
    pub issues: Vec<String>,
}

impl QualityMetrics {
    pub fn new(completeness: f64, accuracy: f64, consistency: f64) -> Self {
        let mut metrics = Self {
            completeness: clamp_unit(completeness),
            accuracy: clamp_unit(accuracy),
            consistency: clamp_unit(consistency),
            overall: 0.0,
            missing_fields: BTreeSet::new(),
            issues: Vec::new(),
        };
        metrics.recompute();
        metrics
    }

    pub fn completeness(&self) -> f64 {
        self.completeness
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn consistency(&self) -> f64 {
        self.consistency
    }

    pub fn overall(&self) -> f64 {
        self.overall
    }

    pub fn set_completeness(&mut self, value: f64) {
        self.completeness = clamp_unit(value);
        self.recompute();
    }

    pub fn set_accuracy(&mut self, value: f64) {
        self.accuracy = clamp_unit(value);
        self.recompute();
    }

    pub fn set_consistency(&mut self, value: f64) {
        self.consistency = clamp_unit(value);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.overall = (self.completeness + self.accuracy + self.consistency) / 3.0;
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// A fully typed, scored job offer. Built once per raw record by the
/// transformer and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct JobOffer {
    pub source: String,
    pub source_id: String,
    pub url: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub company: Option<String>,
    pub rate: Option<RateRange>,
    pub technologies: TechnologySet,
    pub seniority: SeniorityLevel,
    pub location: Option<Location>,
    pub remote_policy: RemotePolicy,
    pub contract_type: ContractType,
    pub scraped_at: Option<DateTime<Utc>>,
    pub processed_at: DateTime<Utc>,
    pub quality: QualityMetrics,
    pub raw_payload: serde_json::Value,
}

impl JobOffer {
    /// `source:source_id`, used in logs and error messages.
    pub fn natural_key(&self) -> String {
        format!("{}:{}", self.source, self.source_id)
    }

    /// Flatten into the row shape shared by every sink.
    pub fn to_row(&self) -> OfferRow {
        OfferRow {
            source: self.source.clone(),
            source_id: self.source_id.clone(),
            url: self.url.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            company: self.company.clone(),
            tjm_min: self.rate.as_ref().and_then(RateRange::min),
            tjm_max: self.rate.as_ref().and_then(RateRange::max),
            tjm_currency: self
                .rate
                .as_ref()
                .map_or_else(|| "EUR".to_string(), |r| r.currency().to_string()),
            technologies: self.technologies.to_vec(),
            seniority_level: self.seniority.as_str().to_string(),
            location: self.location.as_ref().and_then(Location::display),
            remote_policy: self.remote_policy.as_str().to_string(),
            contract_type: self.contract_type.as_str().to_string(),
            scraped_at: self.scraped_at,
            processed_at: self.processed_at,
            quality_score: self.quality.overall(),
            raw_payload: self.raw_payload.clone(),
        }
    }
}

/// Flattened, persistence-ready view of a [`JobOffer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRow {
    pub source: String,
    pub source_id: String,
    pub url: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub company: Option<String>,
    pub tjm_min: Option<f64>,
    pub tjm_max: Option<f64>,
    pub tjm_currency: String,
    pub technologies: Vec<String>,
    pub seniority_level: String,
    pub location: Option<String>,
    pub remote_policy: String,
    pub contract_type: String,
    pub scraped_at: Option<DateTime<Utc>>,
    pub processed_at: DateTime<Utc>,
    pub quality_score: f64,
    pub raw_payload: serde_json::Value,
}

impl OfferRow {
    pub fn natural_key(&self) -> String {
        format!("{}:{}", self.source, self.source_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_range_rejects_invalid_bounds() {
        assert!(RateRange::new(None, None, "EUR").is_none());
        assert!(RateRange::new(Some(700.0), Some(500.0), "EUR").is_none());
        assert!(RateRange::new(Some(0.0), Some(500.0), "EUR").is_none());
        assert!(RateRange::new(Some(-5.0), None, "EUR").is_none());
        assert!(RateRange::new(Some(f64::NAN), None, "EUR").is_none());
    }

    #[test]
    fn test_rate_range_average() {
        let both = RateRange::new(Some(500.0), Some(700.0), "EUR").unwrap();
        assert_eq!(both.average(), 600.0);
        let single = RateRange::new(None, Some(450.0), "EUR").unwrap();
        assert_eq!(single.average(), 450.0);
    }

    #[test]
    fn test_technology_set_dedup_sort_cap() {
        let set = TechnologySet::new(
            ["Rust", "go", "rust", "AWS", "Docker"].map(String::from),
            3,
        );
        assert_eq!(set.as_slice(), &["AWS", "Docker", "go"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_quality_overall_recomputed() {
        let mut q = QualityMetrics::new(1.0, 0.5, 0.0);
        assert!((q.overall() - 0.5).abs() < 1e-9);
        q.set_consistency(1.0);
        assert!((q.overall() - 2.5 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_location_display() {
        let loc = Location {
            city: Some("Paris".into()),
            region: Some("Île-de-France".into()),
            country: "France".into(),
            raw_text: Some("Paris".into()),
        };
        assert_eq!(loc.display().as_deref(), Some("Paris, Île-de-France, France"));

        let unknown = Location {
            city: None,
            region: None,
            country: "France".into(),
            raw_text: Some("???".into()),
        };
        assert!(unknown.display().is_none());
    }

    #[test]
    fn test_enum_defaults() {
        assert_eq!(ContractType::default(), ContractType::Freelance);
        assert_eq!(RemotePolicy::default(), RemotePolicy::Unspecified);
        assert_eq!(SeniorityLevel::default(), SeniorityLevel::Unknown);
        assert_eq!(RemotePolicy::OnSite.to_string(), "on_site");
    }
}
