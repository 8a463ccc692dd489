//! Location parsing for French job boards.
//!
//! The raw text is split into components on commas, spaced dashes and
//! parentheses. Postal codes are stripped and remote keywords removed, then
//! each remaining component is classified as a region (via the alias table)
//! or a city (via the city alias table). A lone city infers its region.

use std::sync::LazyLock;

use regex::Regex;

use super::vocab::{is_placeholder, is_remote_keyword};
use super::{squash_whitespace, title_case};
use crate::models::Location;

const REGIONS: &[(&str, &[&str])] = &[
    (
        "Île-de-France",
        &["ile-de-france", "ile de france", "île de france", "idf", "paris region", "région parisienne", "region parisienne"],
    ),
    ("Auvergne-Rhône-Alpes", &["aura", "rhône-alpes", "rhone-alpes", "auvergne"]),
    (
        "Provence-Alpes-Côte d'Azur",
        &["paca", "côte d'azur", "cote d'azur", "provence", "provence-alpes-cote d'azur"],
    ),
    ("Occitanie", &["languedoc", "midi-pyrénées", "midi-pyrenees"]),
    ("Nouvelle-Aquitaine", &["aquitaine", "limousin", "poitou-charentes"]),
    ("Pays de la Loire", &[]),
    ("Hauts-de-France", &["nord-pas-de-calais", "picardie"]),
    ("Grand Est", &["alsace", "lorraine", "champagne-ardenne"]),
    ("Normandie", &["basse-normandie", "haute-normandie"]),
    ("Bretagne", &[]),
    ("Centre-Val de Loire", &["centre"]),
    ("Bourgogne-Franche-Comté", &["bourgogne", "franche-comté", "franche-comte"]),
];

/// Lowercase spelling -> canonical city. Business districts map to the city
/// they are attached to.
const CITY_ALIASES: &[(&str, &str)] = &[
    ("paris", "Paris"),
    ("la défense", "Paris"),
    ("la defense", "Paris"),
    ("paris la défense", "Paris"),
    ("lyon", "Lyon"),
    ("part-dieu", "Lyon"),
    ("marseille", "Marseille"),
    ("toulouse", "Toulouse"),
    ("nice", "Nice"),
    ("sophia antipolis", "Sophia Antipolis"),
    ("sophia-antipolis", "Sophia Antipolis"),
    ("nantes", "Nantes"),
    ("montpellier", "Montpellier"),
    ("strasbourg", "Strasbourg"),
    ("bordeaux", "Bordeaux"),
    ("lille", "Lille"),
    ("rennes", "Rennes"),
];

/// Lowercase canonical city -> region.
const CITY_REGIONS: &[(&str, &str)] = &[
    ("paris", "Île-de-France"),
    ("boulogne-billancourt", "Île-de-France"),
    ("issy-les-moulineaux", "Île-de-France"),
    ("lyon", "Auvergne-Rhône-Alpes"),
    ("villeurbanne", "Auvergne-Rhône-Alpes"),
    ("grenoble", "Auvergne-Rhône-Alpes"),
    ("clermont-ferrand", "Auvergne-Rhône-Alpes"),
    ("marseille", "Provence-Alpes-Côte d'Azur"),
    ("nice", "Provence-Alpes-Côte d'Azur"),
    ("sophia antipolis", "Provence-Alpes-Côte d'Azur"),
    ("aix-en-provence", "Provence-Alpes-Côte d'Azur"),
    ("toulouse", "Occitanie"),
    ("montpellier", "Occitanie"),
    ("nîmes", "Occitanie"),
    ("nantes", "Pays de la Loire"),
    ("angers", "Pays de la Loire"),
    ("strasbourg", "Grand Est"),
    ("reims", "Grand Est"),
    ("nancy", "Grand Est"),
    ("bordeaux", "Nouvelle-Aquitaine"),
    ("lille", "Hauts-de-France"),
    ("rennes", "Bretagne"),
    ("rouen", "Normandie"),
    ("caen", "Normandie"),
    ("dijon", "Bourgogne-Franche-Comté"),
    ("tours", "Centre-Val de Loire"),
    ("orléans", "Centre-Val de Loire"),
];

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",|;|\(|\)|\s[-–—]\s|\s[–—]|[–—]\s").unwrap());

static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{2,5}\b").unwrap());

/// Result of parsing a location string.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationParse {
    /// `None` only when the input was empty.
    pub location: Option<Location>,
    /// The text mentioned remote work.
    pub remote_hint: bool,
}

pub fn canonical_region(text: &str) -> Option<&'static str> {
    let key = squash_whitespace(text).to_lowercase();
    REGIONS.iter().find_map(|(name, aliases)| {
        (name.to_lowercase() == key || aliases.contains(&key.as_str())).then_some(*name)
    })
}

pub fn canonical_city(text: &str) -> String {
    let cleaned = squash_whitespace(text);
    let key = cleaned.to_lowercase();
    CITY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map_or_else(|| title_case(&cleaned), |(_, city)| (*city).to_string())
}

pub fn infer_region(city: &str) -> Option<&'static str> {
    let key = city.to_lowercase();
    CITY_REGIONS
        .iter()
        .find(|(c, _)| *c == key)
        .map(|(_, region)| *region)
}

/// A component can stand for a place name when it is mostly letters.
fn is_place_name(text: &str) -> bool {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 2
        && text.chars().count() <= 50
        && text
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '’' | '.'))
        && !is_placeholder(text)
}

/// Parse free location text. `home_country` fills [`Location::country`].
pub fn parse_location(raw: &str, home_country: &str) -> LocationParse {
    let text = squash_whitespace(raw);
    if text.is_empty() {
        return LocationParse {
            location: None,
            remote_hint: false,
        };
    }

    let mut remote_hint = false;
    let mut city: Option<String> = None;
    let mut region: Option<String> = None;
    let mut extra: Option<String> = None;

    for part in SEPARATORS.split(&text) {
        if is_remote_keyword(part) {
            remote_hint = true;
            continue;
        }
        let part = squash_whitespace(&POSTAL_CODE.replace_all(part, ""));
        if part.is_empty() || part.eq_ignore_ascii_case(home_country) {
            continue;
        }
        if let Some(found) = canonical_region(&part) {
            region.get_or_insert_with(|| found.to_string());
        } else if is_place_name(&part) {
            if city.is_none() {
                city = Some(canonical_city(&part));
            } else if extra.is_none() {
                extra = Some(title_case(&part));
            }
        }
    }

    if region.is_none() {
        region = city
            .as_deref()
            .and_then(infer_region)
            .map(str::to_string)
            .or(extra);
    }

    LocationParse {
        location: Some(Location {
            city,
            region,
            country: home_country.to_string(),
            raw_text: Some(text),
        }),
        remote_hint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Location {
        parse_location(text, "France").location.unwrap()
    }

    #[test]
    fn test_city_and_region() {
        let loc = parse("Paris, Île-de-France");
        assert_eq!(loc.city.as_deref(), Some("Paris"));
        assert_eq!(loc.region.as_deref(), Some("Île-de-France"));
        assert_eq!(loc.country, "France");
    }

    #[test]
    fn test_region_alias_and_parentheses() {
        let loc = parse("Marseille (PACA)");
        assert_eq!(loc.city.as_deref(), Some("Marseille"));
        assert_eq!(loc.region.as_deref(), Some("Provence-Alpes-Côte d'Azur"));
    }

    #[test]
    fn test_single_city_infers_region() {
        let loc = parse("lyon");
        assert_eq!(loc.city.as_deref(), Some("Lyon"));
        assert_eq!(loc.region.as_deref(), Some("Auvergne-Rhône-Alpes"));
    }

    #[test]
    fn test_hyphenated_city_not_split() {
        let loc = parse("Clermont-Ferrand");
        assert_eq!(loc.city.as_deref(), Some("Clermont-Ferrand"));
        assert_eq!(loc.region.as_deref(), Some("Auvergne-Rhône-Alpes"));
    }

    #[test]
    fn test_postal_codes_stripped() {
        assert_eq!(parse("75001 Paris").city.as_deref(), Some("Paris"));
        assert_eq!(parse("Paris 75").city.as_deref(), Some("Paris"));
        assert_eq!(parse("Nantes (44)").city.as_deref(), Some("Nantes"));
    }

    #[test]
    fn test_business_district() {
        let loc = parse("La Défense");
        assert_eq!(loc.city.as_deref(), Some("Paris"));
        assert_eq!(loc.region.as_deref(), Some("Île-de-France"));
    }

    #[test]
    fn test_region_only() {
        let loc = parse("IDF");
        assert_eq!(loc.city, None);
        assert_eq!(loc.region.as_deref(), Some("Île-de-France"));
    }

    #[test]
    fn test_remote_keyword_not_a_city() {
        let parsed = parse_location("Paris - Full remote", "France");
        assert!(parsed.remote_hint);
        assert_eq!(parsed.location.unwrap().city.as_deref(), Some("Paris"));

        let parsed = parse_location("Télétravail", "France");
        assert!(parsed.remote_hint);
        let loc = parsed.location.unwrap();
        assert!(!loc.is_known());
        assert_eq!(loc.raw_text.as_deref(), Some("Télétravail"));
    }

    #[test]
    fn test_unresolvable_kept_as_raw_text() {
        let loc = parse("???");
        assert!(!loc.is_known());
        assert_eq!(loc.raw_text.as_deref(), Some("???"));
        assert_eq!(loc.country, "France");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_location("   ", "France").location.is_none());
    }
}
