//! Record Transformer: one raw record in, one scored [`JobOffer`] out.
//!
//! The only hard failure is a structurally invalid record. Every other
//! field degrades to absent/default and leaves a note in `quality.issues`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::models::{JobOffer, QualityMetrics, RemotePolicy, TechnologySet};
use crate::normalize::{
    lookup_contract_type, normalize_company, normalize_currency, normalize_technologies,
    parse_contract_type, parse_location, parse_rate, parse_remote_policy, parse_seniority,
};
use crate::normalize::rate::DEFAULT_CURRENCY;
use crate::quality::{QualityConfig, QualityScorer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

#[derive(Debug, Clone)]
pub struct RecordTransformer {
    scorer: QualityScorer,
    max_technologies: usize,
    home_country: String,
}

impl Default for RecordTransformer {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl RecordTransformer {
    pub fn new(config: &PipelineConfig) -> Self {
        let quality = QualityConfig {
            max_technologies: config.max_technologies,
            ..QualityConfig::default()
        };
        Self {
            scorer: QualityScorer::new(quality),
            max_technologies: config.max_technologies,
            home_country: config.home_country.clone(),
        }
    }

    pub fn transform(&self, raw: &Value) -> Result<JobOffer, AppError> {
        self.transform_at(raw, Utc::now())
    }

    /// Transform with an explicit processing time.
    pub fn transform_at(&self, raw: &Value, processed_at: DateTime<Utc>) -> Result<JobOffer, AppError> {
        let record = raw
            .as_object()
            .ok_or_else(|| AppError::StructuralError("record is not a JSON object".into()))?;

        let source = identity_field(record, &["source"])?;
        let source_id = identity_field(record, &["source_id", "sourceId"])?;
        let title = identity_field(record, &["title"])?;

        let mut degraded = Vec::new();

        let description = text_field(record, "description");
        let rate_text = format!("{title} {}", description.as_deref().unwrap_or_default());
        let currency_raw = text_field(record, "tjm_currency");
        if let Some(raw) = &currency_raw
            && normalize_currency(raw).is_none()
        {
            degraded.push(format!("Unknown currency '{raw}', using {DEFAULT_CURRENCY}"));
        }
        let rate = parse_rate(
            present(record, "tjm_min"),
            present(record, "tjm_max"),
            currency_raw.as_deref(),
            &rate_text,
        );
        if rate.is_none() {
            for key in ["tjm_min", "tjm_max"] {
                if let Some(value) = present(record, key) {
                    degraded.push(format!("Unparseable rate field {key}: {value}"));
                }
            }
        }

        let technologies = record
            .get("technologies")
            .map(|v| normalize_technologies(v, self.max_technologies))
            .unwrap_or_else(TechnologySet::default);

        let seniority_raw = first_text(record, &["seniority_level", "seniority"]);
        let seniority = parse_seniority(seniority_raw.as_deref());
        if let Some(raw) = &seniority_raw
            && !seniority.is_known()
        {
            degraded.push(format!("Unknown seniority level: '{raw}'"));
        }

        let remote_raw = first_text(record, &["remote_policy", "remote"]);
        let mut remote_policy = parse_remote_policy(remote_raw.as_deref());
        if let Some(raw) = &remote_raw
            && !remote_policy.is_specified()
        {
            degraded.push(format!("Unknown remote policy: '{raw}'"));
        }

        let contract_raw = text_field(record, "contract_type");
        let contract_type = parse_contract_type(contract_raw.as_deref());
        if let Some(raw) = &contract_raw
            && lookup_contract_type(raw).is_none()
        {
            degraded.push(format!("Unknown contract type '{raw}', using {contract_type}"));
        }

        let location = match text_field(record, "location") {
            None => None,
            Some(text) => {
                let parsed = parse_location(&text, &self.home_country);
                if parsed.remote_hint && !remote_policy.is_specified() {
                    remote_policy = RemotePolicy::Remote;
                }
                if let Some(loc) = &parsed.location
                    && !loc.is_known()
                    && !parsed.remote_hint
                {
                    degraded.push(format!("Unresolved location: '{text}'"));
                }
                parsed.location
            }
        };

        let scraped_at = match present(record, "scraped_at") {
            None => None,
            Some(value) => {
                let parsed = value.as_str().and_then(parse_timestamp);
                if parsed.is_none() {
                    degraded.push(format!("Unparseable scraped_at: {value}"));
                }
                parsed
            }
        };

        let mut offer = JobOffer {
            source,
            source_id,
            url: text_field(record, "url"),
            title,
            description,
            company: text_field(record, "company").and_then(|c| normalize_company(&c)),
            rate,
            technologies,
            seniority,
            location,
            remote_policy,
            contract_type,
            scraped_at,
            processed_at,
            quality: QualityMetrics::new(0.0, 0.0, 0.0),
            raw_payload: raw.clone(),
        };

        let mut quality = self.scorer.score(&offer);
        quality.issues.extend(degraded);
        offer.quality = quality;
        Ok(offer)
    }
}

/// A value that is present and not JSON `null`.
fn present<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    record.get(key).filter(|v| !v.is_null())
}

/// Trimmed, non-empty string field.
fn text_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| text_field(record, k))
}

/// Non-empty identity field; numbers are stringified.
fn identity_field(record: &Map<String, Value>, keys: &[&str]) -> Result<String, AppError> {
    keys.iter()
        .find_map(|key| match record.get(*key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| {
            AppError::StructuralError(format!("missing or empty field '{}'", keys[0]))
        })
}

/// RFC 3339, or a naive timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
