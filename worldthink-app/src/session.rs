//! What the interactive mode remembers between claims.
use worldthink_common::{ClaimResult, CountryAnalysis, WorldThinkError};
use worldthink_geo::CountryIndex;
use worldthink_llm::analyzer::Analysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

/// Transient message shown after an analysis attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn for_failure(err: &WorldThinkError) -> Self {
        Self {
            level: Level::Error,
            message: format!("Error analyzing claim: {err}"),
        }
    }

    pub fn for_analysis(analysis: &Analysis) -> Self {
        let level = if analysis.notice.is_warning() {
            Level::Warning
        } else {
            Level::Success
        };
        Self {
            level,
            message: analysis.notice.message(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    result: Option<ClaimResult>,
    selected: Option<usize>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn result(&self) -> Option<&ClaimResult> {
        self.result.as_ref()
    }

    /// Take in the outcome of one analysis. Success replaces the held result
    /// and drops the selection; failure leaves both untouched.
    pub fn record(&mut self, outcome: Result<Analysis, WorldThinkError>) -> Notification {
        match outcome {
            Ok(analysis) => {
                let note = Notification::for_analysis(&analysis);
                self.result = Some(analysis.result);
                self.selected = None;
                note
            }
            Err(err) => {
                tracing::error!(error = %err, "Error analyzing claim");
                Notification::for_failure(&err)
            }
        }
    }

    /// Select a country by any name the alias table understands.
    pub fn select(&mut self, name: &str) -> Option<&CountryAnalysis> {
        let countries = &self.result.as_ref()?.country_analysis;
        let hit = CountryIndex::build(countries).lookup(name)?;
        let position = countries.iter().position(|c| std::ptr::eq(c, hit))?;
        self.selected = Some(position);
        countries.get(position)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&CountryAnalysis> {
        let result = self.result.as_ref()?;
        result.country_analysis.get(self.selected?)
    }

    /// The selected country alone, otherwise every country in API order.
    pub fn visible_countries(&self) -> &[CountryAnalysis] {
        let Some(result) = &self.result else {
            return &[];
        };
        match self.selected {
            Some(i) => result.country_analysis.get(i..=i).unwrap_or(&[]),
            None => &result.country_analysis,
        }
    }
}
