//! Normalization Library: pure conversions from raw scraped values into the
//! typed entities of [`crate::models`].
//!
//! Every function here takes its input plus static tables and nothing else.
//! None of them fail: input that cannot be understood yields `None` or the
//! type's default.

pub mod location;
pub mod rate;
pub mod technology;
pub mod vocab;

pub use location::{LocationParse, parse_location};
pub use rate::{normalize_currency, parse_rate, parse_rate_value};
pub use technology::{normalize_technologies, normalize_technology};
pub use vocab::{
    is_placeholder, is_remote_keyword, lookup_contract_type, normalize_company, parse_contract_type,
    parse_remote_policy, parse_seniority,
};

/// Collapse runs of whitespace into single spaces and trim.
pub(crate) fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercase the first letter of every word and lowercase the rest, where a
/// word starts after any non-alphabetic character (`"vue.js"` -> `"Vue.Js"`,
/// `"saint-denis"` -> `"Saint-Denis"`).
pub(crate) fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
