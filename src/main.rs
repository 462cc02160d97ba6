use anyhow::{Context, Result};
use clap::Parser;
use interview_session::{
    create_router, AppState, ArtifactStore, Config, HttpAnalysisClient, NatsAgentTransport,
    SessionComponents, SessionController, SyntheticDevices, SyntheticRecorder,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "interview-session", version, about = "Realtime AI interview session service")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/interview-session")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Interview Session v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let interview = cfg.interview_config();
    if interview.agent_id.trim().is_empty() {
        warn!("No interview agent configured; attempts will fail until interview.agent_id is set");
    }
    info!(
        "Countdown {}s, max duration {}s",
        interview.countdown.as_secs(),
        interview.max_duration.as_secs()
    );

    let store = match &cfg.recordings.path {
        Some(path) => Some(ArtifactStore::new(path)?),
        None => None,
    };

    let analysis = HttpAnalysisClient::new(cfg.analysis.endpoint.clone(), cfg.analysis_timeout())
        .context("Failed to build analysis client")?;

    let components = SessionComponents {
        devices: Arc::new(SyntheticDevices::default()),
        recorder: Box::new(SyntheticRecorder::default()),
        transport: Arc::new(NatsAgentTransport::new(cfg.agent.nats_url.clone())),
        analysis: Arc::new(analysis),
        store,
    };

    let (session, controller_task) = SessionController::spawn(interview, components);

    let bind = cli.bind.unwrap_or_else(|| cfg.service.http.bind.clone());
    let port = cli.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    let app = create_router(AppState::new(session.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    session.shutdown().await?;
    controller_task.await.context("Session controller panicked")?;

    Ok(())
}
