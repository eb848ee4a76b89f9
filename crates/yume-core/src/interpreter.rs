use crate::llm::LlmClient;
use crate::openai::error::OpenAiError;
use crate::openai::{FunctionResponse, call_function};
use async_openai::types::{ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;
use yume_model::interpretation::Interpretation;

const SYSTEM_PROMPT: &str = "You are a thoughtful dream interpreter. Given the retelling of a dream, \
    you produce a short summary, keywords for its main motifs, the dream's mood, the symbolism of its \
    central images, a gentle psychological perspective and questions that invite the dreamer to reflect. \
    Blend symbolic, psychological and spiritual readings without judging the dreamer, and never invent \
    details that are not in the dream. Use the function call provided. Use valid JSON as the arguments.";

#[derive(Error, Debug)]
pub enum InterpretError {
    #[error("The dream text is empty")]
    EmptyDream,

    #[error(transparent)]
    OpenAi(#[from] OpenAiError),

    #[error("The interpretation is missing {0}")]
    Incomplete(&'static str),
}

impl FunctionResponse for Interpretation {
    fn function_name() -> &'static str {
        "record_interpretation"
    }

    fn function_description() -> &'static str {
        "Records the structured interpretation of the user's dream."
    }

    fn function_definition() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "dream_summary": {
                    "type": "string",
                    "description": "One or two sentences capturing the essence of the dream."
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Short keywords naming the dream's main motifs."
                },
                "mood": {
                    "type": "string",
                    "description": "The overall emotional tone of the dream."
                },
                "symbolism": {
                    "type": "string",
                    "description": "What the central images of the dream commonly stand for."
                },
                "psychological_perspective": {
                    "type": "string",
                    "description": "A gentle psychological reading of the dream."
                },
                "reflective_prompts": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Questions inviting the dreamer to reflect."
                },
                "tone": {
                    "type": "string",
                    "description": "The voice of the interpretation, for example reassuring or curious."
                }
            },
            "required": [
                "dream_summary",
                "tags",
                "mood",
                "symbolism",
                "psychological_perspective",
                "reflective_prompts",
                "tone"
            ]
        })
    }

    fn fix_escapes(&mut self) {
        self.dream_summary = html_escape::decode_html_entities(&self.dream_summary).to_string();
        self.mood = html_escape::decode_html_entities(&self.mood).to_string();
        self.symbolism = html_escape::decode_html_entities(&self.symbolism).to_string();
        self.psychological_perspective = html_escape::decode_html_entities(&self.psychological_perspective).to_string();
        self.tone = html_escape::decode_html_entities(&self.tone).to_string();
        for tag in &mut self.tags {
            *tag = html_escape::decode_html_entities(tag).to_string();
        }
        for prompt in &mut self.reflective_prompts {
            *prompt = html_escape::decode_html_entities(prompt).to_string();
        }
    }
}

/// Interprets a dream through a forced function call.
///
/// Empty input is rejected before anything goes over the wire.
#[instrument(skip_all)]
pub async fn interpret(llm: &LlmClient, dream_text: &str) -> Result<Interpretation, InterpretError> {
    if dream_text.trim().is_empty() {
        return Err(InterpretError::EmptyDream);
    }
    let client = llm.client()?;

    let messages = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(OpenAiError::from)?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(dream_text)
            .build()
            .map_err(OpenAiError::from)?
            .into(),
    ];

    let interpretation: Interpretation = call_function(client, llm.interpretation_model(), messages).await?;
    validate(&interpretation)?;
    Ok(interpretation)
}

/// The model occasionally returns syntactically valid but hollow output,
/// which must not reach the journal.
fn validate(interpretation: &Interpretation) -> Result<(), InterpretError> {
    if interpretation.dream_summary.trim().is_empty() {
        return Err(InterpretError::Incomplete("dream_summary"));
    }
    if interpretation.tags.is_empty() {
        return Err(InterpretError::Incomplete("tags"));
    }
    if interpretation.mood.trim().is_empty() {
        return Err(InterpretError::Incomplete("mood"));
    }
    if interpretation.symbolism.trim().is_empty() {
        return Err(InterpretError::Incomplete("symbolism"));
    }
    if interpretation.psychological_perspective.trim().is_empty() {
        return Err(InterpretError::Incomplete("psychological_perspective"));
    }
    if interpretation.reflective_prompts.is_empty() {
        return Err(InterpretError::Incomplete("reflective_prompts"));
    }
    if interpretation.tone.trim().is_empty() {
        return Err(InterpretError::Incomplete("tone"));
    }
    Ok(())
}
