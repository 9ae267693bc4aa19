use std::sync::Arc;

use anyhow::{Context, Result};
use tabeval_core::{Llm, LlmResponse};
use tabeval_eval::{ModelSettings, Provider};
use tabeval_model::{MockLlm, OpenAIClient, OpenAIConfig};

use crate::cli::ModelArgs;

/// Reply of the mock provider when the config scripts none.
pub const DEFAULT_MOCK_REPLY: &str =
    "Criteria: Not evaluated\nSupporting Evidence: Reply from the mock provider\nScore: 0";

/// Apply command-line overrides on top of the file settings.
pub fn apply_overrides(settings: &mut ModelSettings, args: &ModelArgs) {
    match args.provider.as_deref() {
        Some("mock") => settings.provider = Provider::Mock,
        Some("openai") => settings.provider = Provider::OpenAI,
        _ => {}
    }
    if let Some(model) = &args.model {
        settings.model = model.clone();
    }
    if let Some(base_url) = &args.base_url {
        settings.base_url = Some(base_url.clone());
    }
}

/// Build the judge model named by `settings`.
pub fn build_model(settings: &ModelSettings) -> Result<Arc<dyn Llm>> {
    match settings.provider {
        Provider::OpenAI => {
            let api_key = std::env::var(&settings.api_key_env).with_context(|| {
                format!("{} environment variable not set", settings.api_key_env)
            })?;

            let mut config = OpenAIConfig::new(api_key, &settings.model);
            if let Some(base_url) = &settings.base_url {
                config = config.with_base_url(base_url);
            }
            Ok(Arc::new(OpenAIClient::new(config)?))
        }
        Provider::Mock => {
            let mut mock = MockLlm::new(format!("mock/{}", settings.model));
            if settings.mock_replies.is_empty() {
                mock = mock.with_text(DEFAULT_MOCK_REPLY);
            }
            for reply in &settings.mock_replies {
                mock = mock.with_response(LlmResponse::text(reply));
            }
            Ok(Arc::new(mock))
        }
    }
}
