use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auditdesk::audit::HolidayCalendar;
use auditdesk::config;
use auditdesk::ingest::PdfiumRenderer;
use auditdesk::search::DocIndex;
use auditdesk::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auditdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| app_config.get_database_url());

    let index = DocIndex::connect(&database_url).await?;
    index.init().await?;

    // Holiday calendar is read once and shared read-only / 节假日表只加载一次
    let holidays = HolidayCalendar::load_or_empty(Path::new(&app_config.audit.holiday_file));
    let renderer = Arc::new(PdfiumRenderer::from_config(&app_config.ingest));

    let bind_addr = app_config.get_bind_address();
    let state = Arc::new(AppState::new(app_config, index, holidays, renderer));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
