//! Model access: send the instructions and page images, get the raw reply.
//!
//! The workflow talks to a [`FeedbackModel`], not to a provider directly, so
//! tests can swap in a canned reply. [`LlmFeedbackModel`] is the real thing:
//! one chat call per analysis, bounded by `api_timeout_secs`, retried with
//! exponential backoff (`retry_backoff_ms * 2^(attempt-1)`) when
//! `max_retries > 0`.

use crate::config::{AnalysisConfig, DEFAULT_MODEL};
use crate::error::ResumindError;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Raw reply from one analysis call.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub content: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    /// Attempts beyond the first.
    pub retries: u32,
    pub duration_ms: u64,
}

/// Something that can read a resume and answer with feedback text.
#[async_trait]
pub trait FeedbackModel: Send + Sync {
    async fn analyze(
        &self,
        instructions: &str,
        images: Vec<ImageData>,
    ) -> Result<ModelReply, ResumindError>;
}

/// [`FeedbackModel`] over an `edgequake-llm` provider.
pub struct LlmFeedbackModel {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    options: CompletionOptions,
    max_retries: u32,
    retry_backoff_ms: u64,
    api_timeout_secs: u64,
}

impl std::fmt::Debug for LlmFeedbackModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmFeedbackModel")
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl LlmFeedbackModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            options: build_options(config),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_timeout_secs: config.api_timeout_secs,
        }
    }

    /// Resolve the provider from `config` and wrap it.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ResumindError> {
        Ok(Self::new(resolve_provider(config)?, config))
    }
}

#[async_trait]
impl FeedbackModel for LlmFeedbackModel {
    async fn analyze(
        &self,
        instructions: &str,
        images: Vec<ImageData>,
    ) -> Result<ModelReply, ResumindError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user_with_images(instructions, images),
        ];
        let limit = Duration::from_secs(self.api_timeout_secs);

        let mut last_err: Option<ResumindError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(self.retry_backoff_ms, attempt);
                warn!(
                    "Analysis retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match timeout(limit, self.provider.chat(&messages, Some(&self.options))).await {
                Ok(Ok(response)) => {
                    let duration = start.elapsed();
                    debug!(
                        "Model reply: {} input tokens, {} output tokens, {:?}",
                        response.prompt_tokens, response.completion_tokens, duration
                    );
                    return Ok(ModelReply {
                        content: response.content,
                        input_tokens: response.prompt_tokens,
                        output_tokens: response.completion_tokens,
                        retries: attempt,
                        duration_ms: duration.as_millis() as u64,
                    });
                }
                Ok(Err(e)) => {
                    warn!("Analysis attempt {} failed: {}", attempt + 1, e);
                    last_err = Some(ResumindError::LlmApiError {
                        message: e.to_string(),
                        retries: attempt,
                    });
                }
                Err(_) => {
                    warn!(
                        "Analysis attempt {} timed out after {}s",
                        attempt + 1,
                        self.api_timeout_secs
                    );
                    last_err = Some(ResumindError::ApiTimeout {
                        secs: self.api_timeout_secs,
                    });
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ResumindError::Internal("no model attempt ran".into())))
    }
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)`, saturating.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ResumindError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        ResumindError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Pick the provider, most specific source first:
///
/// 1. a pre-built `config.provider`
/// 2. `config.provider_name` with `config.model`
/// 3. `RESUMIND_PROVIDER` + `RESUMIND_MODEL`, when both are set
/// 4. OpenAI, when `OPENAI_API_KEY` is set
/// 5. whatever `ProviderFactory::from_env` detects
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, ResumindError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("RESUMIND_PROVIDER"),
        std::env::var("RESUMIND_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ResumindError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be detected from the environment.\n\
                Set OPENAI_API_KEY or pass --provider/--model.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = AnalysisConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(4096));
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 4), 4000);
        assert_eq!(backoff_ms(500, 64), u64::MAX);
        assert_eq!(backoff_ms(500, u32::MAX), u64::MAX);
        assert_eq!(backoff_ms(0, 100), 0);
    }

    #[test]
    fn build_options_follow_builder() {
        let config = AnalysisConfig::builder()
            .temperature(0.7)
            .max_tokens(1024)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(1024));
    }
}
