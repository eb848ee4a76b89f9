use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error(transparent)]
    Api(#[from] async_openai::error::OpenAIError),

    #[error(transparent)]
    FunctionCall(#[from] FunctionCallError),

    #[error("No response from OpenAi")]
    EmptyResponse,

    #[error("No api key is configured")]
    MissingApiKey,

    #[error("Error building the http client")]
    HttpClientBuild(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum FunctionCallError {
    #[error("The assistant called the wrong function")]
    WrongFunction,

    #[error("The assistant function call arguments are not valid json")]
    InvalidSyntax,

    #[error("The assistant did not call a function")]
    Missing,
}
