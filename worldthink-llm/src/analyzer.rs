//! One claim in, one [`ClaimResult`] out, one request at a time.

use crate::normalize::normalize;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::traits::LlmClient;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use worldthink_common::{ClaimResult, Result, WorldThinkError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    Busy,
}

/// Single-slot guard for the outstanding analysis request.
///
/// Idle → Busy on [`RequestSlot::try_begin`], back to Idle when the returned
/// [`InFlight`] is dropped, whether the request succeeded, failed or was
/// abandoned. A second caller is refused, never queued.
#[derive(Debug, Default)]
pub struct RequestSlot {
    busy: AtomicBool,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Option<InFlight<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight { slot: self })
    }

    pub fn state(&self) -> SlotState {
        if self.busy.load(Ordering::Acquire) {
            SlotState::Busy
        } else {
            SlotState::Idle
        }
    }
}

#[derive(Debug)]
pub struct InFlight<'a> {
    slot: &'a RequestSlot,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
    }
}

/// What the user should be told after a successful analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Completed { countries: usize },
    NoCountryData,
}

impl Notice {
    pub fn for_result(result: &ClaimResult) -> Self {
        match result.country_analysis.len() {
            0 => Notice::NoCountryData,
            countries => Notice::Completed { countries },
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Notice::NoCountryData)
    }

    pub fn message(&self) -> String {
        match self {
            Notice::Completed { countries } => {
                format!("Analysis completed for {countries} countries")
            }
            Notice::NoCountryData => {
                "Analysis completed but no country data was returned".to_string()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: ClaimResult,
    pub notice: Notice,
}

/// Generation parameters for the analysis request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: Some(8000),
            temperature: Some(0.2),
        }
    }
}

pub struct Analyzer {
    client: Arc<dyn LlmClient + Send + Sync>,
    params: GenerationParams,
    slot: RequestSlot,
}

impl Analyzer {
    pub fn new(client: Arc<dyn LlmClient + Send + Sync>) -> Self {
        Self {
            client,
            params: GenerationParams::default(),
            slot: RequestSlot::new(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn slot_state(&self) -> SlotState {
        self.slot.state()
    }

    /// Run one analysis. Fails fast with [`WorldThinkError::Busy`] while
    /// another is outstanding.
    pub async fn analyze(&self, claim: &str) -> Result<Analysis> {
        if claim.trim().is_empty() {
            return Err(WorldThinkError::EmptyClaim);
        }
        let _in_flight = self.slot.try_begin().ok_or(WorldThinkError::Busy)?;

        let prompt = build_prompt(claim);
        tracing::debug!(model = %self.client.model_name(), %prompt, "analysis.prompt");

        let response = self
            .client
            .generate(
                &prompt,
                Some(SYSTEM_PROMPT),
                self.params.max_tokens,
                self.params.temperature,
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, "analysis.request_failed"))?;

        tracing::debug!(
            text_len = response.text.len(),
            tokens_used = ?response.tokens_used,
            "analysis.response"
        );

        let result = normalize(&response.text, claim, Utc::now())
            .inspect_err(|e| tracing::error!(error = %e, "analysis.normalize_failed"))?;
        let notice = Notice::for_result(&result);

        if notice.is_warning() {
            tracing::warn!("No country data received from API");
        } else {
            tracing::info!(
                countries = result.country_analysis.len(),
                truth_index = result.truth_index,
                "analysis.completed"
            );
        }

        Ok(Analysis { result, notice })
    }
}
