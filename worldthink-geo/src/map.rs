//! Choropleth styling of a world boundary dataset.
//!
//! The renderer fetches a GeoJSON `FeatureCollection`, matches every
//! feature's `properties.name` against the held country analyses through
//! [`CountryIndex`], and returns the same collection with `style`, `tooltip`
//! and (on a match) `stance` properties attached. Anything a map widget
//! needs to colour, label and click a country is on the feature itself.

use crate::index::CountryIndex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use worldthink_common::{CountryAnalysis, Result, Stance, WorldThinkError};
use worldthink_http::{HttpClient, HttpError, RequestOpts};

pub const DEFAULT_GEOJSON_URL: &str =
    "https://raw.githubusercontent.com/holtzy/D3-graph-gallery/master/DATA/world.geojson";

/// Fill for countries without data, or with an unknown stance.
pub const NEUTRAL_COLOR: &str = "#e5e7eb";

pub fn stance_color(stance: Stance) -> &'static str {
    match stance {
        Stance::Agree => "#22c55e",
        Stance::Disagree => "#ef4444",
        Stance::Mixed => "#eab308",
        Stance::Unknown => NEUTRAL_COLOR,
    }
}

/// Legend entries in display order.
pub const LEGEND: [(Stance, &str); 3] = [
    (Stance::Agree, "Agree"),
    (Stance::Mixed, "Mixed"),
    (Stance::Disagree, "Disagree"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub fill_color: &'static str,
    pub weight: u8,
    pub opacity: f64,
    pub color: &'static str,
    pub fill_opacity: f64,
}

impl FeatureStyle {
    pub fn filled(fill_color: &'static str) -> Self {
        Self {
            fill_color,
            weight: 1,
            opacity: 1.0,
            color: "white",
            fill_opacity: 0.7,
        }
    }
}

/// Hover text for a matched feature.
pub fn tooltip_for(country: &CountryAnalysis) -> String {
    format!(
        "{}\nStance: {}\n{}",
        country.country_name,
        country.stance.as_str().to_uppercase(),
        country.summary
    )
}

/// Hover text for a feature with no analysis behind it.
pub fn tooltip_for_missing(feature_name: &str) -> String {
    format!("{feature_name}\nNo data available")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub hits: usize,
    pub misses: usize,
    /// Names of features that had a name but no matching analysis.
    pub missed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledMap {
    pub collection: Value,
    pub stats: MatchStats,
}

/// Attach styles and tooltips to every feature of `geojson`.
///
/// Fails only when `geojson` is not a feature collection; individual
/// features without a usable name are styled neutral and counted as misses.
pub fn style_features(geojson: &Value, countries: &[CountryAnalysis]) -> Result<StyledMap> {
    let features = geojson
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| WorldThinkError::MapData("dataset has no features array".to_string()))?;

    let index = CountryIndex::build(countries);
    let mut stats = MatchStats::default();
    let mut styled = Vec::with_capacity(features.len());

    for feature in features {
        let mut feature = feature.clone();
        let name = feature
            .pointer("/properties/name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let matched = name.as_deref().and_then(|n| index.lookup(n));
        let (style, tooltip) = match (matched, name.as_deref()) {
            (Some(country), _) => {
                stats.hits += 1;
                (
                    FeatureStyle::filled(stance_color(country.stance)),
                    Some(tooltip_for(country)),
                )
            }
            (None, Some(n)) => {
                stats.misses += 1;
                stats.missed.push(n.to_string());
                (
                    FeatureStyle::filled(NEUTRAL_COLOR),
                    Some(tooltip_for_missing(n)),
                )
            }
            (None, None) => {
                stats.misses += 1;
                (FeatureStyle::filled(NEUTRAL_COLOR), None)
            }
        };

        if let Some(properties) = properties_mut(&mut feature) {
            let style = serde_json::to_value(&style)
                .map_err(|e| WorldThinkError::MapData(e.to_string()))?;
            properties.insert("style".to_string(), style);
            if let Some(tooltip) = tooltip {
                properties.insert("tooltip".to_string(), Value::String(tooltip));
            }
            if let Some(country) = matched {
                properties.insert(
                    "stance".to_string(),
                    Value::String(country.stance.as_str().to_string()),
                );
            }
        }
        styled.push(feature);
    }

    let mut collection = geojson.clone();
    if let Some(obj) = collection.as_object_mut() {
        obj.insert("features".to_string(), Value::Array(styled));
    }

    tracing::info!(
        matched = stats.hits,
        unmatched = stats.misses,
        "Map rendering complete"
    );
    tracing::debug!(missing = %stats.missed.join(", "), "geo.map.unmatched_features");

    Ok(StyledMap { collection, stats })
}

fn properties_mut(feature: &mut Value) -> Option<&mut Map<String, Value>> {
    let props = feature
        .as_object_mut()?
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    if !props.is_object() {
        *props = Value::Object(Map::new());
    }
    props.as_object_mut()
}

/// Fetches the boundary dataset and styles it, one render at a time.
pub struct MapRenderer {
    http: HttpClient,
    url: String,
    render_lock: Mutex<()>,
}

impl MapRenderer {
    pub fn new(url: &str) -> Result<Self> {
        let http = HttpClient::new(url)
            .map_err(|e| WorldThinkError::Config(format!("invalid map data URL: {e}")))?;
        Ok(Self {
            http,
            url: url.to_string(),
            render_lock: Mutex::new(()),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Value> {
        let opts = RequestOpts {
            allow_absolute: true,
            ..Default::default()
        };
        self.http
            .get_json(&self.url, opts)
            .await
            .map_err(|e: HttpError| {
                tracing::error!(url = %self.url, error = %e, "Error loading GeoJSON");
                WorldThinkError::MapData(e.to_string())
            })
    }

    /// Fetch the dataset and style it for `countries`.
    ///
    /// Concurrent calls queue behind the render lock; a render in progress
    /// always runs to completion.
    pub async fn render(&self, countries: &[CountryAnalysis]) -> Result<StyledMap> {
        let _guard = self.render_lock.lock().await;
        tracing::debug!(url = %self.url, countries = countries.len(), "geo.map.render");
        let dataset = self.fetch().await?;
        style_features(&dataset, countries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn country(name: &str, stance: Stance, summary: &str) -> CountryAnalysis {
        CountryAnalysis {
            country_code: String::new(),
            country_name: name.to_string(),
            stance,
            confidence: 70,
            summary: summary.to_string(),
            headlines: Vec::new(),
            cultural_context: Vec::new(),
        }
    }

    fn dataset() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "USA"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "France"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "Antarctica"}, "geometry": null},
                {"type": "Feature", "geometry": null}
            ]
        })
    }

    #[test]
    fn matched_features_get_stance_colour_and_tooltip() {
        let countries = vec![
            country("United States of America", Stance::Agree, "Broad support"),
            country("France", Stance::Unknown, ""),
        ];

        let styled = style_features(&dataset(), &countries).unwrap();
        let features = styled.collection["features"].as_array().unwrap();

        let usa = &features[0]["properties"];
        assert_eq!(usa["style"]["fillColor"], "#22c55e");
        assert_eq!(usa["style"]["color"], "white");
        assert_eq!(usa["style"]["weight"], 1);
        assert_eq!(usa["style"]["opacity"], 1.0);
        assert_eq!(usa["style"]["fillOpacity"], 0.7);
        assert_eq!(usa["stance"], "agree");
        assert_eq!(
            usa["tooltip"],
            "United States of America\nStance: AGREE\nBroad support"
        );

        assert_eq!(features[1]["properties"]["style"]["fillColor"], NEUTRAL_COLOR);
        assert_eq!(features[1]["properties"]["style"]["fillOpacity"], 0.7);
    }

    #[test]
    fn misses_are_neutral_and_counted() {
        let styled = style_features(&dataset(), &[]).unwrap();
        let features = styled.collection["features"].as_array().unwrap();

        assert_eq!(features[2]["properties"]["style"]["fillColor"], NEUTRAL_COLOR);
        assert_eq!(
            features[2]["properties"]["tooltip"],
            "Antarctica\nNo data available"
        );
        assert!(features[2]["properties"].get("stance").is_none());
        assert!(features[3]["properties"].get("tooltip").is_none());

        assert_eq!(styled.stats.hits, 0);
        assert_eq!(styled.stats.misses, 4);
        assert_eq!(styled.stats.missed, vec!["USA", "France", "Antarctica"]);
    }

    #[test]
    fn stats_split_hits_and_misses() {
        let countries = vec![country("usa", Stance::Disagree, "Opposed")];
        let styled = style_features(&dataset(), &countries).unwrap();

        assert_eq!(styled.stats.hits, 1);
        assert_eq!(styled.stats.misses, 3);
        assert_eq!(styled.collection["type"], "FeatureCollection");
    }

    #[test]
    fn non_collection_is_map_data_error() {
        let err = style_features(&json!({"type": "Feature"}), &[]).unwrap_err();
        assert!(matches!(err, WorldThinkError::MapData(_)));
    }

    #[test]
    fn unknown_stance_shares_the_neutral_fill() {
        assert_eq!(stance_color(Stance::Unknown), NEUTRAL_COLOR);
        assert_ne!(stance_color(Stance::Mixed), NEUTRAL_COLOR);
    }
}
