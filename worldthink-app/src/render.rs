//! Plain-text rendering of an analysis for the terminal.
use std::fmt::Write as _;
use worldthink_common::summary::{StanceTally, TruthTone};
use worldthink_common::{ClaimResult, CountryAnalysis, Headline};
use worldthink_geo::map::{LEGEND, MatchStats, NEUTRAL_COLOR, stance_color};

const RULE: &str = "────────────────────────────────────────────────────────";

pub fn summary_card(result: &ClaimResult) -> String {
    let tally = StanceTally::of(result);
    let tone = TruthTone::from_index(result.truth_index);

    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Claim: \"{}\"", result.claim);
    let _ = writeln!(
        out,
        "Global truth index: {}/100 ({})",
        result.truth_index,
        tone.label()
    );
    if !result.global_consensus.is_empty() {
        let _ = writeln!(out, "\n{}\n", result.global_consensus);
    }
    let _ = writeln!(
        out,
        "Agree {} ({}%)   Mixed {} ({}%)   Disagree {} ({}%)",
        tally.agree.count,
        tally.agree.percent,
        tally.mixed.count,
        tally.mixed.percent,
        tally.disagree.count,
        tally.disagree.percent
    );
    let _ = writeln!(out, "{}", tally.coverage_line());
    let _ = writeln!(
        out,
        "Analyzed {}",
        result.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = write!(out, "{RULE}");
    out
}

pub fn country_card(country: &CountryAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} [{}] confidence {}%",
        display_name(country),
        country.stance.as_str().to_uppercase(),
        country.confidence
    );
    if !country.summary.is_empty() {
        let _ = writeln!(out, "  {}", country.summary);
    }
    if !country.cultural_context.is_empty() {
        let _ = writeln!(out, "  Context: {}", country.cultural_context.join(" · "));
    }
    for headline in &country.headlines {
        let _ = writeln!(out, "  - {}", headline_line(headline));
    }
    out.trim_end().to_string()
}

fn display_name(country: &CountryAnalysis) -> String {
    match (country.country_name.as_str(), country.country_code.as_str()) {
        ("", "") => "(unnamed)".to_string(),
        (name, "") => name.to_string(),
        ("", code) => code.to_string(),
        (name, code) => format!("{name} ({code})"),
    }
}

fn headline_line(headline: &Headline) -> String {
    let mut line = headline.title.clone();
    if !headline.source.is_empty() {
        let _ = write!(line, " | {}", headline.source);
    }
    if let Some(day) = headline.date.get(..10) {
        let _ = write!(line, " | {day}");
    }
    if !headline.url.is_empty() {
        let _ = write!(line, " <{}>", headline.url);
    }
    line
}

/// Cards for every country, in API order.
pub fn country_cards<'a>(countries: impl IntoIterator<Item = &'a CountryAnalysis>) -> String {
    countries
        .into_iter()
        .map(country_card)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn legend() -> String {
    let mut parts: Vec<String> = LEGEND
        .iter()
        .map(|(stance, label)| format!("{label} {}", stance_color(*stance)))
        .collect();
    parts.push(format!("No data {NEUTRAL_COLOR}"));
    format!("Legend: {}", parts.join("  "))
}

pub fn map_stats(stats: &MatchStats) -> String {
    let mut out = format!(
        "Map rendering complete - Matched: {} countries, Unmatched: {} countries",
        stats.hits, stats.misses
    );
    if !stats.missed.is_empty() {
        let _ = write!(out, "\nCountries without data: {}", stats.missed.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use worldthink_common::Stance;

    fn result() -> ClaimResult {
        ClaimResult {
            claim: "Tea is better than coffee".into(),
            truth_index: 64,
            global_consensus: "Opinions split along cultural lines.".into(),
            country_analysis: vec![
                CountryAnalysis {
                    country_code: "GB".into(),
                    country_name: "United Kingdom".into(),
                    stance: Stance::Agree,
                    confidence: 85,
                    summary: "Tea is a national staple.".into(),
                    headlines: vec![Headline {
                        title: "Tea sales steady".into(),
                        url: String::new(),
                        source: "BBC".into(),
                        stance: Stance::Agree,
                        date: "2025-03-01T10:00:00.000Z".into(),
                    }],
                    cultural_context: vec!["tradition".into(), "afternoon tea".into()],
                },
                CountryAnalysis {
                    country_code: String::new(),
                    country_name: "Italy".into(),
                    stance: Stance::Disagree,
                    confidence: 70,
                    summary: String::new(),
                    headlines: vec![],
                    cultural_context: vec![],
                },
            ],
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn summary_card_shows_label_and_tallies() {
        let card = summary_card(&result());
        assert!(card.contains("Global truth index: 64/100 (Mostly Agreed Upon)"));
        assert!(card.contains("Agree 1 (50%)   Mixed 0 (0%)   Disagree 1 (50%)"));
        assert!(card.contains("Analysis includes 2 countries from around the world"));
        assert!(card.contains("Analyzed 2025-03-01 12:00:00 UTC"));
    }

    #[test]
    fn country_card_lists_badge_tags_and_headlines() {
        let r = result();
        let card = country_card(&r.country_analysis[0]);
        assert!(card.starts_with("United Kingdom (GB) [AGREE] confidence 85%"));
        assert!(card.contains("Context: tradition · afternoon tea"));
        assert!(card.contains("- Tea sales steady | BBC | 2025-03-01"));

        let bare = country_card(&r.country_analysis[1]);
        assert_eq!(bare, "Italy [DISAGREE] confidence 70%");
    }

    #[test]
    fn legend_and_stats_lines() {
        assert_eq!(
            legend(),
            "Legend: Agree #22c55e  Mixed #eab308  Disagree #ef4444  No data #e5e7eb"
        );
        let stats = MatchStats {
            hits: 2,
            misses: 1,
            missed: vec!["Antarctica".into()],
        };
        assert_eq!(
            map_stats(&stats),
            "Map rendering complete - Matched: 2 countries, Unmatched: 1 countries\nCountries without data: Antarctica"
        );
    }
}
