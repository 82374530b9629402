use std::error::Error;

use tracing_subscriber::{
    EnvFilter, filter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env when present; a plain
    // environment is fine too.
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,chat_pipeline=info"))?;

    // llm-service ships its own scoped layer with file:line and span timings;
    // the general layer handles everything else.
    let general = fmt::layer()
        .with_target(false)
        .with_filter(filter::filter_fn(|meta| {
            !meta
                .target()
                .starts_with(llm_service::telemetry::TARGET_PREFIX)
        }));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(general)
        .with(llm_service::telemetry::layer())
        .init();

    api::start().await?;

    Ok(())
}
