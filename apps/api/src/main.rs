mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod matching;
mod models;
mod pipeline;
mod questions;
mod routes;
mod schema;
mod state;
mod store;
#[cfg(test)]
mod testing;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, S3Config};
use crate::db::create_pool;
use crate::extraction::{PdfTextExtractor, ResumeExtractionService};
use crate::llm_client::analysis::AiAnalysisClient;
use crate::llm_client::retry::RetryPolicy;
use crate::llm_client::LlmClient;
use crate::matching::JobMatchService;
use crate::pipeline::events::TracingSink;
use crate::pipeline::{BatchCoordinator, ResumePipeline};
use crate::questions::QuestionGenerationService;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{
    InMemoryResultStore, NoopArchive, PgResultStore, ResultStore, ResumeArchive, S3Archive,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Analyzer v{}", env!("CARGO_PKG_VERSION"));

    // Result store: PostgreSQL when configured, in-memory otherwise
    let store: Arc<dyn ResultStore> = match &config.database_url {
        Some(url) => {
            // One connection per worker plus headroom for the read endpoints.
            let pool = create_pool(url, config.max_concurrency as u32 + 4).await?;
            Arc::new(PgResultStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; reports are kept in memory and lost on restart");
            Arc::new(InMemoryResultStore::new())
        }
    };

    // Raw PDF archive: S3 / MinIO when configured
    let archive: Arc<dyn ResumeArchive> = match &config.s3 {
        Some(s3) => {
            let client = build_s3_client(s3).await;
            info!("S3 archive initialized (bucket: {})", s3.bucket);
            Arc::new(S3Archive::new(client, s3.bucket.clone()))
        }
        None => {
            info!("S3_BUCKET not set; raw PDFs are not archived");
            Arc::new(NoopArchive)
        }
    };

    // Initialize LLM client and the shared analysis client
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.anthropic_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());
    let ai = Arc::new(AiAnalysisClient::new(
        Arc::new(llm),
        RetryPolicy::new(
            config.ai_max_attempts,
            config.ai_backoff_base,
            config.ai_backoff_max,
        ),
        config.ai_timeout,
        config.max_concurrency,
    ));

    let pipeline = Arc::new(ResumePipeline::new(
        ResumeExtractionService::new(
            Arc::new(PdfTextExtractor::new(config.max_upload_bytes)),
            Arc::clone(&ai),
        ),
        JobMatchService::new(Arc::clone(&ai)),
        QuestionGenerationService::new(ai),
        store,
        Arc::new(TracingSink),
    ));
    let coordinator = Arc::new(BatchCoordinator::new(
        Arc::clone(&pipeline),
        config.max_concurrency,
    ));
    info!("Pipeline ready ({} workers)", config.max_concurrency);

    let state = AppState {
        pipeline,
        coordinator,
        archive,
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "resume-analyzer-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
