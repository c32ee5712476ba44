//! LLM integration for WorldThink.
//!
//! This crate exposes the [`traits::LlmClient`] interface, a chat-completions
//! client for Perplexity (and OpenAI-compatible endpoints), the claim prompt,
//! the response normalizer, and the single-flight [`analyzer::Analyzer`]
//! that ties them together.
//!
//! # Examples
//! ```no_run
//! use std::sync::Arc;
//! use worldthink_llm::analyzer::Analyzer;
//! use worldthink_llm::perplexity::PerplexityClient;
//!
//! # #[tokio::main]
//! # async fn main() -> worldthink_common::Result<()> {
//! let client = PerplexityClient::new("pplx-...".into(), "sonar".into())?;
//! let analyzer = Analyzer::new(Arc::new(client));
//! let analysis = analyzer.analyze("Cats are better than dogs").await?;
//! println!("{}", analysis.notice.message());
//! # Ok(())
//! # }
//! ```
pub mod analyzer;
pub mod normalize;
pub mod perplexity;
pub mod prompt;
pub mod traits;

pub const DEFAULT_PERPLEXITY_MODEL: &str = "llama-3.1-sonar-small-128k-online";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";
