use crate::openai::error::OpenAiError;
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use typed_builder::TypedBuilder;

pub const DEFAULT_INTERPRETATION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(TypedBuilder, Debug, Clone)]
pub struct LlmConfig {
    #[builder(default)]
    pub api_key: Option<String>,
    #[builder(default)]
    pub api_base: Option<String>,
    #[builder(setter(into), default = String::from(DEFAULT_INTERPRETATION_MODEL))]
    pub interpretation_model: String,
    #[builder(setter(into), default = String::from(DEFAULT_IMAGE_MODEL))]
    pub image_model: String,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
}

/// Shared handle to the OpenAI compatible endpoint, built once at startup.
///
/// Without an api key the handle still constructs, requests then fail
/// with [`OpenAiError::MissingApiKey`] when they reach for the client.
#[derive(Clone)]
pub struct LlmClient {
    client: Option<Client<OpenAIConfig>>,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, OpenAiError> {
        let client = match &config.api_key {
            Some(api_key) => {
                let mut openai_config = OpenAIConfig::default().with_api_key(api_key);
                if let Some(api_base) = &config.api_base {
                    openai_config = openai_config.with_api_base(api_base);
                }
                let http_client = reqwest::Client::builder().timeout(config.timeout).build()?;
                // Zero elapsed time budget: the first failure surfaces, nothing is retried.
                let backoff = ExponentialBackoffBuilder::new()
                    .with_max_elapsed_time(Some(Duration::ZERO))
                    .build();
                Some(
                    Client::with_config(openai_config)
                        .with_http_client(http_client)
                        .with_backoff(backoff),
                )
            }
            None => None,
        };
        Ok(Self { client, config })
    }

    pub fn client(&self) -> Result<&Client<OpenAIConfig>, OpenAiError> {
        self.client.as_ref().ok_or(OpenAiError::MissingApiKey)
    }

    #[must_use]
    pub fn interpretation_model(&self) -> &str {
        &self.config.interpretation_model
    }

    #[must_use]
    pub fn image_model(&self) -> &str {
        &self.config.image_model
    }
}
