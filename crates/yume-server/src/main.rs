use crate::opt::{Commands, Db, Run};
use anyhow::Result;
use axum::serve;
use clap::Parser;
use sea_orm::{ConnectOptions, Database};
use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use url::Url;
use yume_core::llm::{LlmClient, LlmConfig};
use yume_db::schema::ensure_schema;
use yume_utils::net::create_listener;

mod app;
mod opt;
mod routes;
mod user;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const DEFAULT_PORT: u16 = 3030;

pub(crate) struct InnerAppConfig {
    llm: LlmClient,
}

#[derive(Clone)]
pub(crate) struct AppConfig(Arc<InnerAppConfig>);

impl AppConfig {
    pub fn new(llm: LlmClient) -> Self {
        Self(Arc::new(InnerAppConfig { llm }))
    }

    pub fn llm(&self) -> &LlmClient {
        &self.0.llm
    }
}

async fn run(opt: Run) -> Result<()> {
    yume_utils::tracing::setup(
        yume_utils::tracing::TracingConfig::builder()
            .package(env!("CARGO_PKG_NAME"))
            .version(env!("CARGO_PKG_VERSION"))
            .build(),
    )?;

    let seaorm_pool_options = build_connect_options(&opt.db, opt.db.database_url.clone());
    let seaorm_pool = Database::connect(seaorm_pool_options).await?;
    ensure_schema(&seaorm_pool)
        .await
        .inspect_err(|error| tracing::error!(error = error as &dyn std::error::Error, "failed to prepare the schema"))?;

    if opt.llm.openai_api_key.is_none() {
        tracing::warn!("no api key configured, interpretation and visualization will be unavailable");
    }
    let llm = LlmClient::new(LlmConfig::from(&opt.llm))?;

    let Run { host, port, auth, .. } = opt;

    let app = app::create_app(&auth, llm, seaorm_pool).await?;

    let listener = create_listener((host, port), (DEFAULT_HOST, DEFAULT_PORT)).await?;

    let service = app.into_make_service();
    tracing::info!(local_addr = %listener.local_addr()?, "starting app");
    serve::serve(listener, service).await?;
    Ok(())
}

fn build_connect_options(db_options: &Db, db_url: Url) -> ConnectOptions {
    let mut seaorm_pool_options = ConnectOptions::new(db_url);
    if let Some(min_connections) = db_options.db_min_connections {
        seaorm_pool_options.min_connections(min_connections);
    }
    if let Some(max_connections) = db_options.db_max_connections {
        seaorm_pool_options.max_connections(max_connections);
    }
    seaorm_pool_options.sqlx_logging_level(log::LevelFilter::Debug);
    seaorm_pool_options
}

fn main() -> Result<()> {
    unsafe { env::set_var("RUST_BACKTRACE", "1") };

    let main = async {
        let opt = opt::Cli::parse();

        match opt.command {
            Commands::Run(o) => run(o).await?,
        }
        Ok(())
    };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(main)
}
