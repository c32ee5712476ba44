//! Loader for WorldThink configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (an empty configuration is valid)
//! 2. `worldthink.yaml` from the user config directory, then the working directory
//!    (both optional), or a single file given explicitly (required)
//! 3. `WORLDTHINK__SECTION__KEY` environment variables
//!
//! `${VAR}` placeholders in string values are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use worldthink_common::observability::LogFormat;

pub mod credentials;

pub use credentials::{ApiKeyRecord, CredentialError, CredentialStore};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "WORLDTHINK";
pub const CONFIG_FILE_NAME: &str = "worldthink.yaml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldThinkConfig {
    pub llm: LlmSettings,
    pub map: MapSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Perplexity,
    /// Any OpenAI-compatible chat-completions endpoint.
    Openai,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: Provider,
    /// `None` picks the provider's default model.
    pub model: Option<String>,
    /// `None` picks the provider's public endpoint.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub search_recency_filter: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Perplexity,
            model: None,
            endpoint: None,
            api_key: None,
            temperature: Some(0.2),
            top_p: Some(0.9),
            max_tokens: Some(8000),
            timeout_secs: None,
            search_recency_filter: Some("month".to_string()),
        }
    }
}

impl LlmSettings {
    /// The configured key, unless it is blank or an unexpanded `${VAR}`.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !k.contains("${"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Boundary dataset; `None` uses the public world GeoJSON.
    pub geojson_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub dir: Option<PathBuf>,
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// `worldthink.yaml` locations consulted when no file is given explicitly,
/// lowest precedence first.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("worldthink").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from(CONFIG_FILE_NAME));
    paths
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct WorldThinkConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for WorldThinkConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldThinkConfigLoader {
    /// Start with no file sources; environment overrides are applied at [`load`](Self::load).
    ///
    /// ```
    /// use worldthink_config::{Provider, WorldThinkConfigLoader};
    ///
    /// let config = WorldThinkConfigLoader::new()
    ///     .with_yaml_str("llm:\n  provider: openai\n  model: gpt-4o-mini")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.llm.provider, Provider::Openai);
    /// assert_eq!(config.llm.model.as_deref(), Some("gpt-4o-mini"));
    /// assert_eq!(config.llm.max_tokens, Some(8000));
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Attach every [`default_config_paths`] entry as optional.
    pub fn with_default_files(self) -> Self {
        default_config_paths()
            .into_iter()
            .fold(self, |loader, path| loader.with_optional_file(path))
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge the sources, overlay `WORLDTHINK__*` variables, expand `${VAR}`
    /// placeholders and deserialize.
    ///
    /// ```
    /// use worldthink_config::WorldThinkConfigLoader;
    ///
    /// unsafe { std::env::set_var("WT_DOC_PPLX_KEY", "pplx-from-env"); }
    ///
    /// let config = WorldThinkConfigLoader::new()
    ///     .with_yaml_str("llm:\n  api_key: \"${WT_DOC_PPLX_KEY}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.llm.api_key(), Some("pplx-from-env"));
    ///
    /// unsafe { std::env::remove_var("WT_DOC_PPLX_KEY"); }
    /// ```
    pub fn load(self) -> Result<WorldThinkConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        if v.is_null() {
            v = Value::Object(Default::default());
        }
        expand_env_in_value(&mut v);

        let typed: WorldThinkConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        tracing::debug!(
            provider = ?typed.llm.provider,
            model = ?typed.llm.model,
            has_api_key = typed.llm.api_key().is_some(),
            "config.loaded"
        );
        Ok(typed)
    }
}
