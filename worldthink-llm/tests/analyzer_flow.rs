mod common;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use worldthink_common::{Result, WorldThinkError};
use worldthink_llm::analyzer::{Analyzer, GenerationParams, Notice, SlotState};
use worldthink_llm::prompt::SYSTEM_PROMPT;
use worldthink_llm::traits::{LlmClient, LlmResponse};

/// Replays a fixed reply and remembers what it was asked.
struct CannedClient {
    reply: std::result::Result<String, u16>,
    seen: Mutex<Vec<(String, Option<String>, Option<u32>, Option<f32>)>>,
}

impl CannedClient {
    fn ok(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for CannedClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.seen.lock().unwrap().push((
            prompt.to_string(),
            system_prompt.map(str::to_string),
            max_tokens,
            temperature,
        ));
        match &self.reply {
            Ok(text) => Ok(LlmResponse {
                text: text.clone(),
                model: Some("canned".into()),
                tokens_used: None,
            }),
            Err(status) => Err(WorldThinkError::transport(Some(*status), "rate limited")),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

/// Holds every request open until released.
struct GatedClient {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    calls: AtomicUsize,
}

#[async_trait]
impl LlmClient for GatedClient {
    async fn generate(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(LlmResponse {
            text: r#"{"globalTruthIndex": 55, "countries": [{"countryName": "Kenya"}]}"#.into(),
            model: None,
            tokens_used: None,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn model_name(&self) -> &str {
        "gated"
    }
}

#[tokio::test]
async fn request_carries_prompt_system_prompt_and_params() {
    common::init_test_tracing();
    let client = Arc::new(CannedClient::ok(
        r#"{"globalTruthIndex": 90, "globalConsensusSummary": "Yes", "countries": [{"countryName": "Peru", "stance": "agree"}]}"#,
    ));
    let analyzer = Analyzer::new(client.clone());

    let analysis = analyzer.analyze("Water is wet").await.unwrap();
    assert_eq!(analysis.notice, Notice::Completed { countries: 1 });
    assert_eq!(
        analysis.notice.message(),
        "Analysis completed for 1 countries"
    );

    let seen = client.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (prompt, system, max_tokens, temperature) = &seen[0];
    assert!(prompt.contains("\"Water is wet\""));
    assert_eq!(system.as_deref(), Some(SYSTEM_PROMPT));
    assert_eq!(*max_tokens, Some(8000));
    assert_eq!(*temperature, Some(0.2));
}

#[tokio::test]
async fn custom_generation_params_are_forwarded() {
    let client = Arc::new(CannedClient::ok(r#"{"countries": []}"#));
    let analyzer = Analyzer::new(client.clone()).with_params(GenerationParams {
        max_tokens: Some(2048),
        temperature: None,
    });

    analyzer.analyze("Anything at all").await.unwrap();

    let seen = client.seen.lock().unwrap();
    assert_eq!(seen[0].2, Some(2048));
    assert_eq!(seen[0].3, None);
}

#[tokio::test]
async fn blank_claim_is_rejected_without_a_request() {
    let client = Arc::new(CannedClient::ok("{}"));
    let analyzer = Analyzer::new(client.clone());

    let err = analyzer.analyze("   \n").await.unwrap_err();

    assert!(matches!(err, WorldThinkError::EmptyClaim));
    assert!(client.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transport_failure_propagates_and_slot_returns_to_idle() {
    let analyzer = Analyzer::new(Arc::new(CannedClient::failing(429)));

    let err = analyzer.analyze("Claim").await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "API request failed with status: 429: rate limited"
    );
    assert_eq!(analyzer.slot_state(), SlotState::Idle);
}

#[tokio::test]
async fn malformed_reply_propagates_and_slot_returns_to_idle() {
    let analyzer = Analyzer::new(Arc::new(CannedClient::ok(
        "Sorry, I can't help with that.",
    )));

    let err = analyzer.analyze("Claim").await.unwrap_err();

    assert!(matches!(err, WorldThinkError::MalformedResponse(_)));
    assert_eq!(analyzer.slot_state(), SlotState::Idle);
}

#[tokio::test]
async fn second_request_while_busy_is_refused() {
    common::init_test_tracing();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let client = Arc::new(GatedClient {
        entered: entered.clone(),
        release: release.clone(),
        calls: AtomicUsize::new(0),
    });
    let analyzer = Arc::new(Analyzer::new(client.clone()));

    let first = tokio::spawn({
        let analyzer = analyzer.clone();
        async move { analyzer.analyze("First claim").await }
    });

    entered.notified().await;
    assert_eq!(analyzer.slot_state(), SlotState::Busy);

    let err = analyzer.analyze("Second claim").await.unwrap_err();
    assert!(matches!(err, WorldThinkError::Busy));

    release.notify_one();
    let analysis = first.await.unwrap().unwrap();

    assert_eq!(analysis.result.claim, "First claim");
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    assert_eq!(analyzer.slot_state(), SlotState::Idle);
}

#[tokio::test]
async fn abandoned_request_frees_the_slot() {
    let client = Arc::new(GatedClient {
        entered: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
        calls: AtomicUsize::new(0),
    });
    let analyzer = Analyzer::new(client.clone());

    let outcome = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        analyzer.analyze("Never answered"),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(analyzer.slot_state(), SlotState::Idle);
}
