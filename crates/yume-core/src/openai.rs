use crate::openai::error::{FunctionCallError, OpenAiError};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionNamedToolChoice, ChatCompletionRequestMessage, ChatCompletionTool, ChatCompletionToolChoiceOption,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, CreateChatCompletionResponse, FunctionName,
    FunctionObject,
};
use serde::de::DeserializeOwned;
use std::error::Error;

pub mod error;

/// A response type the assistant is forced to produce through a function call.
pub trait FunctionResponse: DeserializeOwned {
    fn function_name() -> &'static str;
    fn function_description() -> &'static str;
    fn function_definition() -> serde_json::Value;

    /// Undoes the html escaping the model tends to apply to free text fields.
    fn fix_escapes(&mut self);
}

/// Sends the messages and forces the assistant to answer by calling the
/// function described by `T`.
pub async fn call_function<T: FunctionResponse>(
    client: &Client<OpenAIConfig>,
    model: &str,
    messages: Vec<ChatCompletionRequestMessage>,
) -> Result<T, OpenAiError> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .max_tokens(1024u32)
        .tools(vec![ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: T::function_name().to_owned(),
                description: Some(T::function_description().to_owned()),
                parameters: Some(T::function_definition()),
                strict: None,
            },
        }])
        .tool_choice(ChatCompletionToolChoiceOption::Named(ChatCompletionNamedToolChoice {
            r#type: ChatCompletionToolType::Function,
            function: FunctionName {
                name: T::function_name().to_owned(),
            },
        }))
        .build()?;

    let chat_completion = client.chat().create(request).await?;
    check_function_call(&chat_completion)
}

fn check_function_call<T: FunctionResponse>(chat_completion: &CreateChatCompletionResponse) -> Result<T, OpenAiError> {
    let choice = chat_completion.choices.first().ok_or(OpenAiError::EmptyResponse)?;
    let function_call = choice
        .message
        .tool_calls
        .as_ref()
        .ok_or(FunctionCallError::Missing)?
        .first()
        .ok_or(FunctionCallError::Missing)?;

    if function_call.function.name != T::function_name() {
        tracing::warn!(
            expected_function = T::function_name(),
            called_function = %function_call.function.name,
            "assistant tried to call the wrong function"
        );
        return Err(FunctionCallError::WrongFunction.into());
    }

    let mut response: T = serde_json::from_str(&function_call.function.arguments).map_err(|error| {
        tracing::warn!(
            error = &error as &dyn Error,
            arguments = %function_call.function.arguments,
            "assistant function call arguments are not valid json"
        );
        FunctionCallError::InvalidSyntax
    })?;
    response.fix_escapes();
    Ok(response)
}
