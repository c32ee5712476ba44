//! Fixed-shape records produced by one claim analysis.
//!
//! These mirror the JSON the rest of the system exchanges: field names are
//! camelCase on the wire and every record is owned by exactly one
//! [`ClaimResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A country's classified reaction to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Agree,
    Disagree,
    Mixed,
    Unknown,
}

impl Stance {
    pub const ALL: [Stance; 4] = [
        Stance::Agree,
        Stance::Disagree,
        Stance::Mixed,
        Stance::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stance::Agree => "agree",
            Stance::Disagree => "disagree",
            Stance::Mixed => "mixed",
            Stance::Unknown => "unknown",
        }
    }

    /// Case-insensitive match against the closed set, `fallback` otherwise.
    pub fn parse_or(raw: &str, fallback: Stance) -> Stance {
        let lowered = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == lowered)
            .unwrap_or(fallback)
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cited source snippet backing a country's stance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    pub title: String,
    pub url: String,
    pub source: String,
    pub stance: Stance,
    /// ISO-8601 timestamp as reported upstream.
    pub date: String,
}

/// One country's stance on the analysed claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryAnalysis {
    pub country_code: String,
    /// Join key for map matching.
    pub country_name: String,
    pub stance: Stance,
    /// 0-100.
    pub confidence: u8,
    pub summary: String,
    pub headlines: Vec<Headline>,
    #[serde(default)]
    pub cultural_context: Vec<String>,
}

/// The outcome of one analysis request.
///
/// Replaced wholesale by the next successful analysis, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResult {
    pub claim: String,
    /// 0-100 global agreement score.
    pub truth_index: u8,
    pub global_consensus: String,
    /// In the order the API returned them.
    pub country_analysis: Vec<CountryAnalysis>,
    pub timestamp: DateTime<Utc>,
}

impl ClaimResult {
    pub fn has_country_data(&self) -> bool {
        !self.country_analysis.is_empty()
    }

    /// Countries whose stance is `stance`, in API order.
    pub fn countries_with(&self, stance: Stance) -> impl Iterator<Item = &CountryAnalysis> {
        self.country_analysis
            .iter()
            .filter(move |c| c.stance == stance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stance_parsing_is_case_insensitive() {
        assert_eq!(Stance::parse_or("Disagree", Stance::Mixed), Stance::Disagree);
        assert_eq!(Stance::parse_or("UNKNOWN", Stance::Mixed), Stance::Unknown);
        assert_eq!(Stance::parse_or("", Stance::Unknown), Stance::Unknown);
        assert_eq!(Stance::parse_or("neutral", Stance::Mixed), Stance::Mixed);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let result = ClaimResult {
            claim: "Coffee is healthy".into(),
            truth_index: 61,
            global_consensus: "Broadly accepted".into(),
            country_analysis: vec![CountryAnalysis {
                country_code: "IT".into(),
                country_name: "Italy".into(),
                stance: Stance::Agree,
                confidence: 80,
                summary: "Espresso culture".into(),
                headlines: vec![],
                cultural_context: vec!["cafe culture".into()],
            }],
            timestamp: DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["truthIndex"], json!(61));
        assert_eq!(value["globalConsensus"], json!("Broadly accepted"));
        assert_eq!(value["countryAnalysis"][0]["countryName"], json!("Italy"));
        assert_eq!(value["countryAnalysis"][0]["stance"], json!("agree"));
        assert_eq!(
            value["countryAnalysis"][0]["culturalContext"],
            json!(["cafe culture"])
        );
        assert_eq!(result.countries_with(Stance::Agree).count(), 1);
    }
}
