use inventory_ingestion::{
    bootstrap,
    config::{RunMode, Settings},
    infrastructure::http,
    sqs_worker::SqsWorker,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "inventory_ingestion=debug,aws_sdk=warn,sqlx=warn,tower_http=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting inventory ingestion");
    let settings = Settings::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    debug!("Settings: {:?}", settings);

    let fetcher = bootstrap::build_fetcher(&settings).await?;
    let state = bootstrap::build_state(&settings, fetcher).await?;

    match settings.run_mode {
        RunMode::Http => http::serve(state, &settings.bind_addr()).await,
        RunMode::SqsWorker => {
            let queue_url = settings
                .sqs_queue_url
                .clone()
                .ok_or("SQS_QUEUE_URL must be set when RUN_MODE=sqs-worker")?;
            let client = bootstrap::sqs_client(&settings).await;
            SqsWorker::new(state.service, client, queue_url).run().await
        }
    }
}
