//! Common types and utilities shared across WorldThink crates.
//!
//! This crate defines the claim-analysis data model, summary statistics,
//! observability helpers, and the shared error type used throughout the
//! workspace. It stays dependency-light so that every crate can depend on it.
//!
//! # Overview
//!
//! - [`ClaimResult`], [`CountryAnalysis`], [`Headline`], [`Stance`]: the
//!   fixed-shape outcome of one analysis
//! - [`summary`]: truth-index labels and stance tallies
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`WorldThinkError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use worldthink_common::Stance;
//!
//! assert_eq!(Stance::parse_or(" AGREE ", Stance::Mixed), Stance::Agree);
//! assert_eq!(Stance::parse_or("sort of", Stance::Mixed), Stance::Mixed);
//! ```
pub mod claim;
pub mod observability;
pub mod summary;

pub use claim::{ClaimResult, CountryAnalysis, Headline, Stance};

/// Error types used across the WorldThink system.
///
/// Only [`WorldThinkError::Transport`] and [`WorldThinkError::MalformedResponse`]
/// come out of an analysis request; the rest belong to the surrounding
/// plumbing (configuration, map rendering, the request slot).
#[derive(thiserror::Error, Debug)]
pub enum WorldThinkError {
    /// The remote service answered with a non-success status or could not be reached.
    #[error("API request failed{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// No JSON payload could be extracted from the model output.
    #[error("Received malformed response from AI: {0}")]
    MalformedResponse(String),

    #[error("Claim must not be empty")]
    EmptyClaim,

    /// An analysis is already in flight.
    #[error("An analysis is already in progress")]
    Busy,

    /// The boundary dataset could not be fetched or parsed.
    #[error("Failed to load map data: {0}")]
    MapData(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorldThinkError {
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" with status: {s}"))
        .unwrap_or_default()
}

/// Convenient alias for results that use [`WorldThinkError`].
pub type Result<T> = std::result::Result<T, WorldThinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_includes_status_when_known() {
        let err = WorldThinkError::transport(Some(401), "invalid key");
        assert_eq!(
            err.to_string(),
            "API request failed with status: 401: invalid key"
        );

        let err = WorldThinkError::transport(None, "connection refused");
        assert_eq!(err.to_string(), "API request failed: connection refused");
    }
}
