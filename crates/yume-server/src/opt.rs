use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::time::Duration;
use url::Url;
use yume_core::llm::{DEFAULT_IMAGE_MODEL, DEFAULT_INTERPRETATION_MODEL, LlmConfig};

#[derive(Debug, Parser)]
#[command(name = "yume", about = "Run the dream journal api")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    Run(Run),
}

#[derive(Debug, Clone, Args)]
#[group(multiple = true, required = false)]
pub(crate) struct Db {
    #[arg(long, env = "DATABASE_URL")]
    pub(crate) database_url: Url,

    #[arg(long, help = "Min connections")]
    pub(crate) db_min_connections: Option<u32>,

    #[arg(long, help = "Max connections")]
    pub(crate) db_max_connections: Option<u32>,
}

#[derive(Debug, Clone, Args)]
#[group(multiple = true, required = false)]
pub(crate) struct Auth {
    #[arg(long, env = "OIDC_ISSUER_URL", required = true)]
    pub(crate) oidc_issuer_url: Url,

    #[arg(long = "aud", value_delimiter = ',')]
    pub(crate) audience: Vec<String>,

    #[arg(long)]
    pub(crate) origins: Vec<String>,
}

#[derive(Debug, Clone, Args)]
#[group(multiple = true, required = false)]
pub(crate) struct Llm {
    #[arg(long, env = "OPENAI_API_KEY", required = false)]
    pub(crate) openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_BASE", required = false, help = "Alternative OpenAI compatible endpoint")]
    pub(crate) openai_api_base: Option<String>,

    #[arg(long, default_value = DEFAULT_INTERPRETATION_MODEL)]
    pub(crate) interpretation_model: String,

    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    pub(crate) image_model: String,

    #[arg(long, default_value_t = 60, help = "Upstream request timeout in seconds")]
    pub(crate) llm_timeout_secs: u64,
}

impl From<&Llm> for LlmConfig {
    fn from(llm: &Llm) -> Self {
        Self::builder()
            .api_key(llm.openai_api_key.clone())
            .api_base(llm.openai_api_base.clone())
            .interpretation_model(llm.interpretation_model.clone())
            .image_model(llm.image_model.clone())
            .timeout(Duration::from_secs(llm.llm_timeout_secs))
            .build()
    }
}

#[derive(Debug, Clone, Parser)]
pub(crate) struct Run {
    #[arg(long)]
    pub(crate) host: Option<IpAddr>,

    #[arg(short, long)]
    pub(crate) port: Option<u16>,

    #[command(flatten)]
    pub(crate) auth: Auth,

    #[command(flatten)]
    pub(crate) llm: Llm,

    #[command(flatten)]
    pub(crate) db: Db,
}
