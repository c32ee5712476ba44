//! Turns loaded configuration into live clients.
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use worldthink_common::WorldThinkError;
use worldthink_config::{CredentialStore, LlmSettings, MapSettings, Provider};
use worldthink_geo::MapRenderer;
use worldthink_geo::map::DEFAULT_GEOJSON_URL;
use worldthink_llm::analyzer::{Analyzer, GenerationParams};
use worldthink_llm::perplexity::{ChatOptions, PERPLEXITY_API_BASE, PerplexityClient};
use worldthink_llm::traits::LlmClient;
use worldthink_llm::{DEFAULT_OPENAI_MODEL, DEFAULT_PERPLEXITY_MODEL, OPENAI_API_BASE};

/// Config wins over the credential store.
pub fn resolve_api_key(settings: &LlmSettings, store: &CredentialStore) -> Result<String> {
    if let Some(key) = settings.api_key() {
        tracing::debug!("api key taken from configuration");
        return Ok(key.to_string());
    }
    let record = store.load()?;
    match record.key() {
        Some(key) => {
            tracing::debug!(path = %store.path().display(), "api key taken from credential store");
            Ok(key.to_string())
        }
        None => Err(WorldThinkError::Config(
            "no Perplexity API key set; run `worldthink key set <KEY>` or set llm.api_key"
                .to_string(),
        )
        .into()),
    }
}

pub fn build_llm_client(
    settings: &LlmSettings,
    api_key: String,
) -> Result<Arc<dyn LlmClient + Send + Sync>> {
    let (model, endpoint, options) = match settings.provider {
        Provider::Perplexity => (
            settings.model.as_deref().unwrap_or(DEFAULT_PERPLEXITY_MODEL),
            settings.endpoint.as_deref().unwrap_or(PERPLEXITY_API_BASE),
            ChatOptions {
                top_p: settings.top_p,
                search_recency_filter: settings.search_recency_filter.clone(),
                perplexity_extras: true,
            },
        ),
        Provider::Openai => (
            settings.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL),
            settings.endpoint.as_deref().unwrap_or(OPENAI_API_BASE),
            ChatOptions {
                top_p: settings.top_p,
                ..ChatOptions::openai()
            },
        ),
    };

    let mut client = PerplexityClient::with_endpoint(api_key, model.to_string(), endpoint)?
        .with_options(options);
    if let Some(secs) = settings.timeout_secs {
        client = client.with_timeout(Duration::from_secs(secs));
    }
    tracing::info!(provider = ?settings.provider, %model, %endpoint, "llm client ready");
    Ok(Arc::new(client))
}

pub fn build_analyzer(settings: &LlmSettings, store: &CredentialStore) -> Result<Analyzer> {
    let api_key = resolve_api_key(settings, store)?;
    let client = build_llm_client(settings, api_key)?;
    Ok(Analyzer::new(client).with_params(GenerationParams {
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    }))
}

pub fn build_map_renderer(settings: &MapSettings) -> Result<MapRenderer> {
    let url = settings.geojson_url.as_deref().unwrap_or(DEFAULT_GEOJSON_URL);
    Ok(MapRenderer::new(url)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_key_beats_stored_key() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::at(tmp.path().join("credentials.json"));
        store.save("pplx-stored").unwrap();

        let settings = LlmSettings {
            api_key: Some("pplx-config".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&settings, &store).unwrap(), "pplx-config");

        let settings = LlmSettings::default();
        assert_eq!(resolve_api_key(&settings, &store).unwrap(), "pplx-stored");
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::at(tmp.path().join("credentials.json"));

        let err = resolve_api_key(&LlmSettings::default(), &store).unwrap_err();
        let err = err.downcast::<WorldThinkError>().unwrap();
        assert!(matches!(err, WorldThinkError::Config(_)));
    }

    #[test]
    fn default_provider_uses_perplexity_model() {
        let client = build_llm_client(&LlmSettings::default(), "pplx-k".into()).unwrap();
        assert_eq!(client.model_name(), DEFAULT_PERPLEXITY_MODEL);

        let openai = LlmSettings {
            provider: Provider::Openai,
            ..Default::default()
        };
        let client = build_llm_client(&openai, "sk-k".into()).unwrap();
        assert_eq!(client.model_name(), DEFAULT_OPENAI_MODEL);
    }
}
