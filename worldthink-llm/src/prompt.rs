//! Instruction text sent with every claim analysis.

/// Reference countries the model is asked to cover explicitly, by region.
pub const REGIONS: &[(&str, &[&str])] = &[
    ("North America", &["USA", "Canada", "Mexico", "Cuba"]),
    (
        "South America",
        &[
            "Brazil",
            "Argentina",
            "Colombia",
            "Chile",
            "Peru",
            "Venezuela",
            "Ecuador",
        ],
    ),
    (
        "Europe",
        &[
            "UK",
            "France",
            "Germany",
            "Italy",
            "Spain",
            "Sweden",
            "Poland",
            "Netherlands",
            "Belgium",
            "Switzerland",
            "Norway",
            "Denmark",
            "Finland",
            "Greece",
            "Portugal",
            "Ireland",
            "Austria",
            "Russia",
            "Ukraine",
        ],
    ),
    (
        "Asia",
        &[
            "China",
            "Japan",
            "India",
            "South Korea",
            "Indonesia",
            "Singapore",
            "Thailand",
            "Vietnam",
            "Philippines",
            "Malaysia",
            "Taiwan",
            "Pakistan",
            "Bangladesh",
            "Sri Lanka",
        ],
    ),
    (
        "Middle East",
        &[
            "Saudi Arabia",
            "UAE",
            "Israel",
            "Turkey",
            "Iran",
            "Qatar",
            "Iraq",
            "Jordan",
            "Lebanon",
        ],
    ),
    (
        "Africa",
        &[
            "South Africa",
            "Nigeria",
            "Egypt",
            "Kenya",
            "Morocco",
            "Ethiopia",
            "Ghana",
            "Tanzania",
            "Uganda",
            "Senegal",
            "Algeria",
            "Ivory Coast",
        ],
    ),
    (
        "Oceania",
        &["Australia", "New Zealand", "Papua New Guinea", "Fiji"],
    ),
];

/// Shape the model is told to answer in. Mirrors the keys the normalizer
/// looks for first.
pub const RESPONSE_SCHEMA: &str = r#"{
  "globalTruthIndex": number,            // 0-100
  "globalConsensusSummary": string,
  "countries": [
    {
      "countryName": string,
      "stance": "agree" | "disagree" | "mixed",
      "summary": string,                 // 1-2 sentences
      "culturalContext": [ string ]
    }
  ]
}"#;

pub const SYSTEM_PROMPT: &str = "You are an expert at analyzing global perspectives on claims. \
Respond with clean JSON only, using this structure: { \"globalTruthIndex\": number, \
\"globalConsensusSummary\": string, \"countries\": [{ \"countryName\": string, \
\"stance\": \"agree\"|\"disagree\"|\"mixed\", \"summary\": string, \"culturalContext\": string[] }] }";

/// Build the analysis prompt for `claim`.
///
/// The claim is embedded verbatim; trimming is up to the caller.
///
/// ```
/// use worldthink_llm::prompt::build_prompt;
///
/// let prompt = build_prompt("Tea is better than coffee");
/// assert!(prompt.contains("\"Tea is better than coffee\""));
/// ```
pub fn build_prompt(claim: &str) -> String {
    let roster = REGIONS
        .iter()
        .map(|(region, countries)| format!("{region}: {}", countries.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze this claim globally: "{claim}"

Give a structured analysis of how different countries around the world would likely respond to this claim, based on their media, cultural values, and political climate.

Analyze this claim for ALL United Nations member states, with special attention to these reference countries:

{roster}

For each country, determine:
1. Whether the country would generally AGREE, DISAGREE, or have MIXED opinions about the claim
2. A 1-2 sentence summary of the country's perspective
3. Any relevant cultural context tags

Also provide:
- A global "truth index" score from 0-100 indicating how globally agreed-upon this claim is
- A one-paragraph summary of the global consensus

Format your response as JSON that can be parsed programmatically, following this schema:

{RESPONSE_SCHEMA}
"#
    )
}
