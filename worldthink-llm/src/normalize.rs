//! Turn a model's free-form answer into a [`ClaimResult`].
//!
//! Models rarely agree on field names, so every output field is resolved
//! from an ordered list of candidate keys: the first key holding a usable
//! value wins, otherwise the field's default applies. Only a response with
//! no parseable JSON at all is an error.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use worldthink_common::{
    ClaimResult, CountryAnalysis, Headline, Result, Stance, WorldThinkError,
};

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("fence pattern is valid")
});

pub const TRUTH_INDEX_KEYS: &[&str] = &["globalTruthIndex", "global_truth_index", "truthIndex"];
pub const CONSENSUS_KEYS: &[&str] = &[
    "globalConsensusSummary",
    "global_consensus_summary",
    "globalConsensus",
];
pub const COUNTRIES_KEYS: &[&str] = &["countries", "countryAnalysis"];

pub const COUNTRY_CODE_KEYS: &[&str] = &["countryCode", "country_code"];
pub const COUNTRY_NAME_KEYS: &[&str] = &["countryName", "country", "country_name"];
pub const STANCE_KEYS: &[&str] = &["stance", "agreement"];
pub const CONFIDENCE_KEYS: &[&str] = &["confidence"];
pub const SUMMARY_KEYS: &[&str] = &["summary"];
pub const HEADLINES_KEYS: &[&str] = &["headlines"];
pub const CULTURAL_CONTEXT_KEYS: &[&str] = &[
    "culturalContextTags",
    "cultural_context_tags",
    "culturalContext",
    "cultural_context",
];

pub const HEADLINE_TITLE_KEYS: &[&str] = &["title"];
pub const HEADLINE_SOURCE_KEYS: &[&str] = &["source"];
pub const HEADLINE_URL_KEYS: &[&str] = &["url"];
pub const HEADLINE_STANCE_KEYS: &[&str] = &["stance"];
pub const HEADLINE_DATE_KEYS: &[&str] = &["date"];

pub const DEFAULT_TRUTH_INDEX: u8 = 50;
pub const DEFAULT_CONFIDENCE: u8 = 50;
pub const DEFAULT_COUNTRY_STANCE: Stance = Stance::Mixed;
pub const DEFAULT_HEADLINE_STANCE: Stance = Stance::Unknown;

/// Locate and parse the JSON document inside a model response.
///
/// A ```` ```json ```` fence takes precedence; without one the whole text
/// must be JSON. A fence whose body does not parse is not retried as bare
/// JSON.
pub fn extract_payload(text: &str) -> Result<Value> {
    if let Some(inner) = JSON_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        return serde_json::from_str(inner).map_err(|e| {
            tracing::warn!(error = %e, "normalize.fenced_block_unparseable");
            WorldThinkError::MalformedResponse(format!("fenced JSON block did not parse: {e}"))
        });
    }

    serde_json::from_str(text.trim()).map_err(|e| {
        tracing::warn!(error = %e, text_len = text.len(), "normalize.no_json_found");
        WorldThinkError::MalformedResponse(format!("response is not JSON: {e}"))
    })
}

/// Extract and normalize one model response.
///
/// `captured_at` becomes the result timestamp and the default headline date,
/// so identical inputs produce identical results.
pub fn normalize(text: &str, claim: &str, captured_at: DateTime<Utc>) -> Result<ClaimResult> {
    let payload = extract_payload(text)?;
    Ok(normalize_value(&payload, claim, captured_at))
}

/// Map an already-parsed payload onto a [`ClaimResult`]. Never fails.
pub fn normalize_value(payload: &Value, claim: &str, captured_at: DateTime<Utc>) -> ClaimResult {
    let default_date = captured_at.to_rfc3339_opts(SecondsFormat::Millis, true);

    let country_analysis = first_present(payload, COUNTRIES_KEYS)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| country_from(entry, &default_date))
                .collect()
        })
        .unwrap_or_default();

    ClaimResult {
        claim: claim.to_string(),
        truth_index: score_field(payload, TRUTH_INDEX_KEYS).unwrap_or(DEFAULT_TRUTH_INDEX),
        global_consensus: text_field(payload, CONSENSUS_KEYS).unwrap_or_default(),
        country_analysis,
        timestamp: captured_at,
    }
}

fn country_from(entry: &Value, default_date: &str) -> Option<CountryAnalysis> {
    match entry {
        // A bare name is still a country, just without any analysis.
        Value::String(name) => Some(CountryAnalysis {
            country_code: String::new(),
            country_name: name.trim().to_string(),
            stance: DEFAULT_COUNTRY_STANCE,
            confidence: DEFAULT_CONFIDENCE,
            summary: String::new(),
            headlines: Vec::new(),
            cultural_context: Vec::new(),
        }),
        Value::Object(_) => Some(CountryAnalysis {
            country_code: text_field(entry, COUNTRY_CODE_KEYS).unwrap_or_default(),
            country_name: text_field(entry, COUNTRY_NAME_KEYS).unwrap_or_default(),
            stance: stance_field(entry, STANCE_KEYS, DEFAULT_COUNTRY_STANCE),
            confidence: score_field(entry, CONFIDENCE_KEYS).unwrap_or(DEFAULT_CONFIDENCE),
            summary: text_field(entry, SUMMARY_KEYS).unwrap_or_default(),
            headlines: first_present(entry, HEADLINES_KEYS)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|h| headline_from(h, default_date))
                        .collect()
                })
                .unwrap_or_default(),
            cultural_context: first_present(entry, CULTURAL_CONTEXT_KEYS)
                .map(tags_from)
                .unwrap_or_default(),
        }),
        _ => {
            tracing::debug!(entry = %entry, "normalize.country_entry_skipped");
            None
        }
    }
}

fn headline_from(item: &Value, default_date: &str) -> Option<Headline> {
    match item {
        Value::String(title) => Some(Headline {
            title: title.clone(),
            url: String::new(),
            source: String::new(),
            stance: DEFAULT_HEADLINE_STANCE,
            date: default_date.to_string(),
        }),
        Value::Object(_) => Some(Headline {
            title: text_field(item, HEADLINE_TITLE_KEYS).unwrap_or_default(),
            url: text_field(item, HEADLINE_URL_KEYS).unwrap_or_default(),
            source: text_field(item, HEADLINE_SOURCE_KEYS).unwrap_or_default(),
            stance: stance_field(item, HEADLINE_STANCE_KEYS, DEFAULT_HEADLINE_STANCE),
            date: text_field(item, HEADLINE_DATE_KEYS).unwrap_or_else(|| default_date.to_string()),
        }),
        _ => None,
    }
}

/// First candidate key holding something other than `null` or blank text.
pub fn first_present<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| obj.get(*k)).find(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

fn text_field(obj: &Value, keys: &[&str]) -> Option<String> {
    first_present(obj, keys).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// 0-100 score; numeric strings are accepted, out-of-range values clamped.
fn score_field(obj: &Value, keys: &[&str]) -> Option<u8> {
    let raw = match first_present(obj, keys)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

fn stance_field(obj: &Value, keys: &[&str], fallback: Stance) -> Stance {
    match first_present(obj, keys) {
        Some(Value::String(s)) => Stance::parse_or(s, fallback),
        _ => fallback,
    }
}

fn tags_from(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|t| match t {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
