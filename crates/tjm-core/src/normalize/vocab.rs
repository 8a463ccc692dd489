//! Keyword tables for the enum fields, remote keywords and placeholder
//! company names. Lookups are case-insensitive on trimmed input.

use super::squash_whitespace;
use crate::models::{ContractType, RemotePolicy, SeniorityLevel};

const CONTRACT_TYPES: &[(&str, ContractType)] = &[
    ("freelance", ContractType::Freelance),
    ("free-lance", ContractType::Freelance),
    ("indépendant", ContractType::Freelance),
    ("independant", ContractType::Freelance),
    ("portage", ContractType::Freelance),
    ("portage salarial", ContractType::Freelance),
    ("cdi", ContractType::Cdi),
    ("permanent", ContractType::Cdi),
    ("cdd", ContractType::Cdd),
    ("fixed-term", ContractType::Cdd),
    ("stage", ContractType::Stage),
    ("internship", ContractType::Stage),
    ("stagiaire", ContractType::Stage),
    ("apprentissage", ContractType::Apprentissage),
    ("alternance", ContractType::Apprentissage),
    ("apprenticeship", ContractType::Apprentissage),
];

const REMOTE_POLICIES: &[(&str, RemotePolicy)] = &[
    ("on_site", RemotePolicy::OnSite),
    ("on-site", RemotePolicy::OnSite),
    ("on site", RemotePolicy::OnSite),
    ("onsite", RemotePolicy::OnSite),
    ("sur site", RemotePolicy::OnSite),
    ("présentiel", RemotePolicy::OnSite),
    ("presentiel", RemotePolicy::OnSite),
    ("remote", RemotePolicy::Remote),
    ("full remote", RemotePolicy::Remote),
    ("100% remote", RemotePolicy::Remote),
    ("télétravail", RemotePolicy::Remote),
    ("teletravail", RemotePolicy::Remote),
    ("télétravail complet", RemotePolicy::Remote),
    ("100% télétravail", RemotePolicy::Remote),
    ("hybrid", RemotePolicy::Hybrid),
    ("hybride", RemotePolicy::Hybrid),
    ("mixte", RemotePolicy::Hybrid),
    ("télétravail partiel", RemotePolicy::Hybrid),
    ("negotiable", RemotePolicy::Negotiable),
    ("négociable", RemotePolicy::Negotiable),
    ("negociable", RemotePolicy::Negotiable),
    ("à négocier", RemotePolicy::Negotiable),
];

const SENIORITY_LEVELS: &[(&str, SeniorityLevel)] = &[
    ("junior", SeniorityLevel::Junior),
    ("débutant", SeniorityLevel::Junior),
    ("debutant", SeniorityLevel::Junior),
    ("middle", SeniorityLevel::Middle),
    ("intermédiaire", SeniorityLevel::Middle),
    ("intermediaire", SeniorityLevel::Middle),
    ("confirmé", SeniorityLevel::Middle),
    ("confirme", SeniorityLevel::Middle),
    ("senior", SeniorityLevel::Senior),
    ("expérimenté", SeniorityLevel::Senior),
    ("experimente", SeniorityLevel::Senior),
    ("lead", SeniorityLevel::Lead),
    ("tech lead", SeniorityLevel::Lead),
    ("lead dev", SeniorityLevel::Lead),
    ("expert", SeniorityLevel::Expert),
    ("architect", SeniorityLevel::Expert),
    ("architecte", SeniorityLevel::Expert),
];

/// Location fragments that describe remote work rather than a place.
const REMOTE_KEYWORDS: &[&str] = &[
    "remote",
    "full remote",
    "100% remote",
    "télétravail",
    "teletravail",
    "100% télétravail",
    "télétravail complet",
    "à distance",
    "a distance",
    "home office",
];

const PLACEHOLDERS: &[&str] = &[
    "",
    "-",
    "--",
    "n/a",
    "na",
    "n.a.",
    "none",
    "null",
    "unknown",
    "inconnu",
    "inconnue",
    "non communiqué",
    "non communique",
    "non précisé",
    "non precise",
    "confidentiel",
    "confidential",
    "tbd",
    "à définir",
    "?",
];

fn lookup<T: Copy>(table: &[(&str, T)], raw: &str) -> Option<T> {
    let key = squash_whitespace(raw).to_lowercase();
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Exact keyword lookup, `None` when the text is not in the table.
pub fn lookup_contract_type(raw: &str) -> Option<ContractType> {
    lookup(CONTRACT_TYPES, raw)
}

/// Unmatched or absent input yields [`ContractType::Freelance`].
pub fn parse_contract_type(raw: Option<&str>) -> ContractType {
    raw.and_then(lookup_contract_type).unwrap_or_default()
}

/// Unmatched or absent input yields [`RemotePolicy::Unspecified`].
pub fn parse_remote_policy(raw: Option<&str>) -> RemotePolicy {
    raw.and_then(|r| lookup(REMOTE_POLICIES, r)).unwrap_or_default()
}

/// Unmatched or absent input yields [`SeniorityLevel::Unknown`].
pub fn parse_seniority(raw: Option<&str>) -> SeniorityLevel {
    raw.and_then(|r| lookup(SENIORITY_LEVELS, r)).unwrap_or_default()
}

pub fn is_remote_keyword(text: &str) -> bool {
    let key = squash_whitespace(text).to_lowercase();
    REMOTE_KEYWORDS.contains(&key.as_str())
}

/// True for empty strings and the usual "not disclosed" fillers.
pub fn is_placeholder(text: &str) -> bool {
    let key = squash_whitespace(text).to_lowercase();
    PLACEHOLDERS.contains(&key.as_str())
}

/// Trimmed company name, or `None` for placeholders.
pub fn normalize_company(raw: &str) -> Option<String> {
    let name = squash_whitespace(raw);
    (!is_placeholder(&name)).then_some(name)
}
