//! Quality Scorer: rule-based completeness, accuracy and consistency checks.
//!
//! Missing optional data earns partial credit in accuracy (0.7) and never
//! adds a consistency check that could fail, so filling in a previously
//! missing field can only raise the overall score.

use std::collections::HashSet;

use crate::models::{JobOffer, QualityMetrics};

const CORE_WEIGHT: f64 = 0.4;
const IMPORTANT_WEIGHT: f64 = 0.4;
const OPTIONAL_WEIGHT: f64 = 0.2;

const ABSENT_CREDIT: f64 = 0.7;
const IMPLAUSIBLE_CREDIT: f64 = 0.5;
const UNKNOWN_TIMESTAMP_CREDIT: f64 = 0.8;

const MIN_TITLE_CHARS: usize = 10;
const MIN_COMPANY_CHARS: usize = 3;

/// Thresholds used by the accuracy checks.
#[derive(Debug, Clone)]
pub struct QualityConfig {
    /// Realistic daily-rate band, inclusive.
    pub min_rate: f64,
    pub max_rate: f64,
    /// Plausible technology count, inclusive.
    pub min_technologies: usize,
    pub max_technologies: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_rate: 100.0,
            max_rate: 2000.0,
            min_technologies: 1,
            max_technologies: 15,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Score a partially built offer. `offer.quality` is ignored.
    pub fn score(&self, offer: &JobOffer) -> QualityMetrics {
        let mut issues = Vec::new();
        let completeness = completeness(offer);
        let accuracy = self.accuracy(offer, &mut issues);
        let consistency = consistency(offer, &mut issues);

        let mut metrics = QualityMetrics::new(completeness, accuracy, consistency);
        metrics.missing_fields = missing_fields(offer);
        metrics.issues = issues;
        metrics
    }

    fn accuracy(&self, offer: &JobOffer, issues: &mut Vec<String>) -> f64 {
        let cfg = &self.config;

        let title = if is_descriptive_title(&offer.title) {
            1.0
        } else {
            issues.push(format!("Title too short or not descriptive: '{}'", offer.title));
            0.0
        };

        let rate = match &offer.rate {
            None => ABSENT_CREDIT,
            Some(rate) => {
                let avg = rate.average();
                if (cfg.min_rate..=cfg.max_rate).contains(&avg) {
                    1.0
                } else {
                    issues.push(format!("Unrealistic rate value: {avg}"));
                    IMPLAUSIBLE_CREDIT
                }
            }
        };

        let count = offer.technologies.len();
        let technologies = if count == 0 {
            ABSENT_CREDIT
        } else if (cfg.min_technologies..=cfg.max_technologies).contains(&count) {
            1.0
        } else {
            issues.push(format!("Unusual technology count: {count}"));
            IMPLAUSIBLE_CREDIT
        };

        let company = match offer.company.as_deref() {
            None => ABSENT_CREDIT,
            Some(name) if name.chars().count() >= MIN_COMPANY_CHARS => 1.0,
            Some(name) => {
                issues.push(format!("Implausible company name: '{name}'"));
                IMPLAUSIBLE_CREDIT
            }
        };

        (title + rate + technologies + company) / 4.0
    }
}

fn present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn tier(fields: &[bool]) -> f64 {
    if fields.is_empty() {
        return 1.0;
    }
    fields.iter().filter(|f| **f).count() as f64 / fields.len() as f64
}

fn completeness(offer: &JobOffer) -> f64 {
    let core = tier(&[
        present(Some(&offer.source)),
        present(Some(&offer.source_id)),
        present(Some(&offer.title)),
        present(offer.url.as_deref()),
    ]);
    let important = tier(&important_fields(offer).map(|(_, ok)| ok));
    let optional = tier(&[
        present(offer.description.as_deref()),
        offer.seniority.is_known(),
        offer.remote_policy.is_specified(),
    ]);

    CORE_WEIGHT * core + IMPORTANT_WEIGHT * important + OPTIONAL_WEIGHT * optional
}

fn important_fields(offer: &JobOffer) -> [(&'static str, bool); 4] {
    [
        ("company", present(offer.company.as_deref())),
        ("rate", offer.rate.is_some()),
        ("technologies", !offer.technologies.is_empty()),
        ("location", offer.location.as_ref().is_some_and(|l| l.is_known())),
    ]
}

fn missing_fields(offer: &JobOffer) -> std::collections::BTreeSet<String> {
    important_fields(offer)
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn is_descriptive_title(title: &str) -> bool {
    let title = title.trim();
    title.chars().count() >= MIN_TITLE_CHARS && title.chars().any(char::is_alphabetic)
}

fn consistency(offer: &JobOffer, issues: &mut Vec<String>) -> f64 {
    let mut checks = Vec::with_capacity(3);

    if let Some(rate) = &offer.rate {
        match (rate.min(), rate.max()) {
            (Some(lo), Some(hi)) if lo > hi => {
                issues.push(format!("Rate min {lo} greater than max {hi}"));
                checks.push(0.0);
            }
            _ => checks.push(1.0),
        }
    }

    if !offer.technologies.is_empty() {
        let mut seen = HashSet::new();
        let has_dupes = offer
            .technologies
            .iter()
            .any(|t| !seen.insert(t.to_lowercase()));
        if has_dupes {
            issues.push("Duplicate technologies".to_string());
            checks.push(IMPLAUSIBLE_CREDIT);
        } else {
            checks.push(1.0);
        }
    }

    match offer.scraped_at {
        Some(scraped) if scraped <= offer.processed_at => checks.push(1.0),
        Some(scraped) => {
            issues.push(format!(
                "Scraped at {scraped} is after processed at {}",
                offer.processed_at
            ));
            checks.push(0.0);
        }
        None => checks.push(UNKNOWN_TIMESTAMP_CREDIT),
    }

    if checks.is_empty() {
        1.0
    } else {
        checks.iter().sum::<f64>() / checks.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ContractType, Location, RateRange, RemotePolicy, SeniorityLevel, TechnologySet,
    };
    use chrono::{Duration, Utc};

    fn bare_offer() -> JobOffer {
        JobOffer {
            source: "freework".into(),
            source_id: "42".into(),
            url: None,
            title: "Senior Go Developer".into(),
            description: None,
            company: None,
            rate: None,
            technologies: TechnologySet::default(),
            seniority: SeniorityLevel::Unknown,
            location: None,
            remote_policy: RemotePolicy::Unspecified,
            contract_type: ContractType::Freelance,
            scraped_at: None,
            processed_at: Utc::now(),
            quality: QualityMetrics::new(0.0, 0.0, 0.0),
            raw_payload: serde_json::Value::Null,
        }
    }

    fn paris() -> Location {
        Location {
            city: Some("Paris".into()),
            region: Some("Île-de-France".into()),
            country: "France".into(),
            raw_text: Some("Paris".into()),
        }
    }

    #[test]
    fn test_overall_is_mean() {
        let q = QualityScorer::default().score(&bare_offer());
        let mean = (q.completeness() + q.accuracy() + q.consistency()) / 3.0;
        assert!((q.overall() - mean).abs() < 1e-9);
    }

    #[test]
    fn test_missing_fields_reported() {
        let q = QualityScorer::default().score(&bare_offer());
        let missing: Vec<&str> = q.missing_fields.iter().map(String::as_str).collect();
        assert_eq!(missing, vec!["company", "location", "rate", "technologies"]);
    }

    #[test]
    fn test_unrealistic_rate_issue() {
        let mut offer = bare_offer();
        offer.rate = RateRange::new(Some(45.0), Some(45.0), "EUR");
        let q = QualityScorer::default().score(&offer);
        assert!(q.issues.iter().any(|i| i == "Unrealistic rate value: 45"));
    }

    #[test]
    fn test_short_title_zeroes_title_check_only() {
        let mut offer = bare_offer();
        offer.title = "Dev".into();
        let q = QualityScorer::default().score(&offer);
        // title 0.0, rate/tech/company absent 0.7 each
        assert!((q.accuracy() - 2.1 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_adding_important_fields_never_lowers_overall() {
        let scorer = QualityScorer::default();
        let mut offer = bare_offer();
        let mut previous = scorer.score(&offer).overall();

        // deliberately implausible values: completeness gain must outweigh
        offer.company = Some("AB".into());
        let next = scorer.score(&offer).overall();
        assert!(next >= previous);
        previous = next;

        offer.rate = RateRange::new(Some(5000.0), None, "EUR");
        let next = scorer.score(&offer).overall();
        assert!(next >= previous);
        previous = next;

        offer.technologies = TechnologySet::new(vec!["Go".to_string()], 15);
        let next = scorer.score(&offer).overall();
        assert!(next >= previous);
        previous = next;

        offer.location = Some(paris());
        let next = scorer.score(&offer).overall();
        assert!(next >= previous);
    }

    #[test]
    fn test_adding_rate_with_inverted_timestamps_still_monotone() {
        let scorer = QualityScorer::default();
        let mut offer = bare_offer();
        offer.scraped_at = Some(offer.processed_at + Duration::hours(1));
        let before = scorer.score(&offer);
        assert!(before.issues.iter().any(|i| i.starts_with("Scraped at")));

        offer.rate = RateRange::new(Some(500.0), Some(600.0), "EUR");
        let after = scorer.score(&offer);
        assert!(after.overall() >= before.overall());
    }

    #[test]
    fn test_clean_offer_scores_high() {
        let mut offer = bare_offer();
        offer.rate = RateRange::new(Some(500.0), Some(700.0), "EUR");
        offer.technologies =
            TechnologySet::new(vec!["Go".to_string(), "Kubernetes".to_string()], 15);
        offer.location = Some(paris());
        let q = QualityScorer::default().score(&offer);
        assert!(q.overall() >= 0.7, "overall = {}", q.overall());
        assert!(q.issues.is_empty());
    }
}
