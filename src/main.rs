use std::sync::Arc;

use legal_intake::account::{AccountStub, JsonFileStore};
use legal_intake::channels::CliChannel;
use legal_intake::chat::ChatService;
use legal_intake::config::IntakeConfig;
use legal_intake::flow::{FlowTable, legal_intake_flow};
use legal_intake::server::build_router;
use legal_intake::session::{Pacer, Session, SessionOptions};
use legal_intake::submission::{FanoutSink, LogSink, SubmissionSink, WebhookSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = IntakeConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    // ── Flow table ───────────────────────────────────────────────────────
    let flow = match &config.flow_path {
        Some(path) => FlowTable::load(path).await.unwrap_or_else(|e| {
            eprintln!("Error: Failed to load flow from {}: {}", path.display(), e);
            std::process::exit(1);
        }),
        None => legal_intake_flow()?,
    };
    let flow = Arc::new(flow);

    // ── Submission sinks ─────────────────────────────────────────────────
    let sink: Arc<dyn SubmissionSink> = match &config.webhook_url {
        Some(url) => Arc::new(FanoutSink::new(vec![
            Arc::new(LogSink),
            Arc::new(WebhookSink::new(url.clone())),
        ])),
        None => Arc::new(LogSink),
    };

    // ── Chat ─────────────────────────────────────────────────────────────
    let options = SessionOptions {
        strict_options: config.strict_options,
        ..SessionOptions::default()
    };
    let chat = ChatService::new(
        Session::new(Arc::clone(&flow), options),
        Pacer::new(config.reply_delay),
        sink,
    );

    // ── Account stub ─────────────────────────────────────────────────────
    let store = Arc::new(JsonFileStore::new(config.account_path.clone()));
    let accounts = Arc::new(AccountStub::new(store, config.account_latency));
    if let Err(e) = accounts.restore().await {
        tracing::warn!("Failed to restore account: {}", e);
    }

    eprintln!("⚖️  Legal Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Questions: {}", flow.len());
    eprintln!("   Chat WS: ws://0.0.0.0:{}/ws/chat", config.port);
    eprintln!("   Chat API: http://0.0.0.0:{}/api/chat", config.port);
    eprintln!("   Auth API: http://0.0.0.0:{}/api/auth/me", config.port);
    if let Some(url) = &config.webhook_url {
        eprintln!("   Webhook: {}", url);
    }

    // ── HTTP server ──────────────────────────────────────────────────────
    let app = build_router(Arc::clone(&chat), accounts);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    if config.cli_enabled {
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Server error: {}", e);
            }
        });
        CliChannel::new(chat).run().await?;
    } else {
        axum::serve(listener, app).await?;
    }

    Ok(())
}
