use anyhow::Context;
use vitrine_core::Config;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads .env, then the process environment; an unset STORAGE_BACKEND stops here.
    let config = Config::from_env().context("Failed to load configuration")?;

    let (_state, router) = vitrine_api::setup::initialize_app(config.clone()).await?;

    vitrine_api::setup::server::start_server(&config, router).await
}
