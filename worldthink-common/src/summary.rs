//! Derived figures shown alongside a [`ClaimResult`].

use crate::claim::{ClaimResult, Stance};

/// Coarse reading of the truth index, from consensus down to contested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruthTone {
    Agree,
    LeaningAgree,
    Mixed,
    LeaningContested,
    Contested,
}

impl TruthTone {
    pub fn from_index(truth_index: u8) -> Self {
        match truth_index {
            80..=u8::MAX => TruthTone::Agree,
            60..=79 => TruthTone::LeaningAgree,
            40..=59 => TruthTone::Mixed,
            20..=39 => TruthTone::LeaningContested,
            _ => TruthTone::Contested,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TruthTone::Agree => "Highly Agreed Upon",
            TruthTone::LeaningAgree => "Mostly Agreed Upon",
            TruthTone::Mixed => "Mixed Global Opinions",
            TruthTone::LeaningContested => "Mostly Contested",
            TruthTone::Contested => "Highly Contested",
        }
    }
}

/// Count and rounded share of one stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StanceShare {
    pub count: usize,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StanceTally {
    pub total: usize,
    pub agree: StanceShare,
    pub mixed: StanceShare,
    pub disagree: StanceShare,
}

impl StanceTally {
    pub fn of(result: &ClaimResult) -> Self {
        let total = result.country_analysis.len();
        let share = |stance: Stance| {
            let count = result.countries_with(stance).count();
            let percent = if total > 0 {
                ((count as f64 / total as f64) * 100.0).round() as u32
            } else {
                0
            };
            StanceShare { count, percent }
        };

        Self {
            total,
            agree: share(Stance::Agree),
            mixed: share(Stance::Mixed),
            disagree: share(Stance::Disagree),
        }
    }

    pub fn coverage_line(&self) -> String {
        if self.total > 0 {
            format!(
                "Analysis includes {} countries from around the world",
                self.total
            )
        } else {
            "No country data available".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::CountryAnalysis;
    use chrono::Utc;

    fn country(name: &str, stance: Stance) -> CountryAnalysis {
        CountryAnalysis {
            country_code: String::new(),
            country_name: name.to_string(),
            stance,
            confidence: 50,
            summary: String::new(),
            headlines: vec![],
            cultural_context: vec![],
        }
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(TruthTone::from_index(100).label(), "Highly Agreed Upon");
        assert_eq!(TruthTone::from_index(80).label(), "Highly Agreed Upon");
        assert_eq!(TruthTone::from_index(79).label(), "Mostly Agreed Upon");
        assert_eq!(TruthTone::from_index(40).label(), "Mixed Global Opinions");
        assert_eq!(TruthTone::from_index(20).label(), "Mostly Contested");
        assert_eq!(TruthTone::from_index(0).label(), "Highly Contested");
    }

    #[test]
    fn tally_rounds_percentages() {
        let result = ClaimResult {
            claim: "c".into(),
            truth_index: 50,
            global_consensus: String::new(),
            country_analysis: vec![
                country("Japan", Stance::Agree),
                country("Chile", Stance::Disagree),
                country("Kenya", Stance::Mixed),
                country("Peru", Stance::Unknown),
                country("Fiji", Stance::Agree),
                country("Iran", Stance::Agree),
            ],
            timestamp: Utc::now(),
        };

        let tally = StanceTally::of(&result);
        assert_eq!(tally.total, 6);
        assert_eq!(tally.agree, StanceShare { count: 3, percent: 50 });
        assert_eq!(tally.mixed, StanceShare { count: 1, percent: 17 });
        assert_eq!(tally.disagree, StanceShare { count: 1, percent: 17 });
        assert!(tally.coverage_line().contains("6 countries"));
    }

    #[test]
    fn empty_result_has_zero_shares() {
        let result = ClaimResult {
            claim: "c".into(),
            truth_index: 50,
            global_consensus: String::new(),
            country_analysis: vec![],
            timestamp: Utc::now(),
        };
        let tally = StanceTally::of(&result);
        assert_eq!(tally.agree.percent, 0);
        assert_eq!(tally.coverage_line(), "No country data available");
    }
}
