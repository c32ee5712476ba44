use crate::aliases::{alias_of, normalize_key};
use std::collections::HashMap;
use worldthink_common::CountryAnalysis;

/// Country analyses keyed for matching against boundary feature names.
///
/// Each analysis is reachable under its uppercased name and, when the alias
/// table knows that name, under the alias target too. A later analysis with
/// the same key replaces an earlier one.
#[derive(Debug, Default)]
pub struct CountryIndex<'a> {
    by_key: HashMap<String, &'a CountryAnalysis>,
}

impl<'a> CountryIndex<'a> {
    pub fn build(countries: &'a [CountryAnalysis]) -> Self {
        let mut by_key = HashMap::with_capacity(countries.len() * 2);
        for country in countries {
            let key = normalize_key(&country.country_name);
            if key.is_empty() {
                tracing::debug!(code = %country.country_code, "geo.index.skip_unnamed");
                continue;
            }
            if let Some(alias) = alias_of(&key) {
                by_key.insert(alias.to_string(), country);
            }
            by_key.insert(key, country);
        }
        Self { by_key }
    }

    /// Find the analysis for a feature name: direct key first, then its alias.
    pub fn lookup(&self, name: &str) -> Option<&'a CountryAnalysis> {
        let key = normalize_key(name);
        if let Some(hit) = self.by_key.get(&key) {
            return Some(*hit);
        }
        alias_of(&key).and_then(|alias| self.by_key.get(alias).copied())
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldthink_common::Stance;

    fn country(name: &str, stance: Stance) -> CountryAnalysis {
        CountryAnalysis {
            country_code: String::new(),
            country_name: name.to_string(),
            stance,
            confidence: 50,
            summary: String::new(),
            headlines: Vec::new(),
            cultural_context: Vec::new(),
        }
    }

    #[test]
    fn long_form_name_matches_short_feature() {
        let countries = vec![country("United States of America", Stance::Agree)];
        let index = CountryIndex::build(&countries);

        let hit = index.lookup("USA").expect("alias hit");
        assert_eq!(hit.stance, Stance::Agree);
        assert!(index.lookup("united states of america").is_some());
    }

    #[test]
    fn usa_feature_matches_every_spelling_through_the_index() {
        // resolve alone lands one hop away from the dataset's key.
        assert_eq!(crate::aliases::resolve("USA"), "UNITED STATES");

        for name in ["United States of America", "United States", "USA"] {
            let countries = vec![country(name, Stance::Mixed)];
            let index = CountryIndex::build(&countries);
            assert!(index.lookup("USA").is_some(), "{name} missed the USA feature");
        }
    }

    #[test]
    fn short_name_matches_short_feature() {
        let countries = vec![country("USA", Stance::Disagree)];
        let index = CountryIndex::build(&countries);

        assert_eq!(index.lookup("USA").unwrap().stance, Stance::Disagree);
        assert!(index.lookup("United States").is_some());
    }

    #[test]
    fn feature_alias_is_tried_after_direct_key() {
        let countries = vec![country("Russian Federation", Stance::Mixed)];
        let index = CountryIndex::build(&countries);

        assert!(index.lookup("Russia").is_some());
    }

    #[test]
    fn unknown_feature_is_a_miss() {
        let countries = vec![country("France", Stance::Agree)];
        let index = CountryIndex::build(&countries);

        assert!(index.lookup("Antarctica").is_none());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn later_duplicate_wins() {
        let countries = vec![
            country("Brazil", Stance::Agree),
            country("BRAZIL", Stance::Disagree),
        ];
        let index = CountryIndex::build(&countries);

        assert_eq!(index.lookup("Brazil").unwrap().stance, Stance::Disagree);
    }

    #[test]
    fn unnamed_entries_are_not_indexed() {
        let countries = vec![country("   ", Stance::Agree)];
        assert!(CountryIndex::build(&countries).is_empty());
    }
}
