//! Task helper service binary.

use std::net::SocketAddr;
use std::sync::Arc;

use ai::{detect_providers, OpenAISettings, SummaryGenerator, WorkflowSuggester};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use clickup::{ClickUpClient, ClickUpSettings, TaskStore};
use escalation::{EscalationFields, EscalationService};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wait_node::{WaitNodeFields, WaitNodeService};

use task_helper::{build_router, AppState, Config, RateLimiter, SessionSigner};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Task helper HTTP service
#[derive(Debug, Parser)]
#[command(name = "task-helper", version, about)]
struct Args {
    /// Port to listen on (overrides TASK_HELPER_PORT)
    #[arg(long, env = "TASK_HELPER_PORT")]
    port: Option<u16>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("task_helper=info".parse()?)
        .add_directive("escalation=info".parse()?)
        .add_directive("wait_node=info".parse()?)
        .add_directive("clickup=info".parse()?)
        .add_directive("ai=info".parse()?);
    match args.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
    }

    info!("Starting task helper service...");

    // Load configuration
    let mut config = Config::default();
    if let Some(port) = args.port {
        config.port = port;
    }

    // ClickUp
    let api_token = config
        .clickup
        .api_token
        .clone()
        .context("CLICKUP_API_TOKEN must be set")?;
    if config.clickup.team_id.is_empty() {
        warn!("CLICKUP_TEAM_ID is not set - custom task ids like TICKET-123 will not resolve");
    }
    let mut settings = ClickUpSettings::new(api_token, config.clickup.team_id.clone())
        .with_base_url(config.clickup.base_url.clone())
        .with_retry(config.clickup.retry_policy());
    settings.timeout = config.clickup.timeout;
    let clickup = ClickUpClient::new(settings).context("Failed to create ClickUp client")?;
    info!(base_url = %config.clickup.base_url, "ClickUp client configured");

    // Escalation workflow
    let store: Arc<dyn TaskStore> = Arc::new(clickup);
    let mut service = EscalationService::new(Arc::clone(&store), EscalationFields::from_env())
        .with_property_link_depth(config.property_link_max_depth);
    if let Some(url) = &config.ai.suggestion_webhook_url {
        let suggester = WorkflowSuggester::new(url.clone(), config.ai.suggestion_timeout)
            .context("Failed to create suggestion webhook client")?;
        service = service.with_suggestions(Arc::new(suggester));
        info!("Workflow suggestions enabled");
    } else {
        info!("No N8N_SUGGESTION_WEBHOOK_URL configured - suggestions disabled");
    }

    // Wait-node approvals
    let wait_nodes = WaitNodeService::new(store, WaitNodeFields::from_env())
        .with_library_type(config.wait_node.process_library_type)
        .with_max_depth(config.wait_node.max_depth)
        .with_verify_delay(config.wait_node.verify_delay);

    // Summary providers
    let openai = OpenAISettings {
        api_key: config.ai.openai_api_key.clone(),
        base_url: config.ai.openai_base_url.clone(),
        timeout: config.ai.timeout,
    };
    let (detection, providers) = detect_providers(&openai).await;
    info!(outcome = ?detection, providers = providers.len(), "AI providers detected");
    let summaries = SummaryGenerator::new(providers, config.ai.models.clone(), config.ai.timeout)
        .with_deadline(config.ai.total_timeout);
    if !summaries.is_enabled() {
        info!("No OPENAI_API_KEY configured - summaries will use the template");
    }

    // Sessions
    let secret = config
        .session_secret
        .as_deref()
        .context("SESSION_SECRET must be set")?;
    let signer = SessionSigner::new(secret, config.session_cookie_name.clone())
        .context("Invalid session configuration")?;

    // Build application state
    let state = AppState {
        service: Arc::new(service),
        wait_nodes: Arc::new(wait_nodes),
        summaries: Arc::new(summaries),
        signer: Arc::new(signer),
        limiter: Arc::new(RateLimiter::new(config.rate_limits)),
        cors_allowed_origins: config.cors_allowed_origins.clone(),
    };

    // Build router
    let app = build_router(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "Task helper service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Task helper service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
