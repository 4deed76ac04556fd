//! Hooklift host
//!
//! Loads configuration, registers the built-in hooks, runs the hook
//! lifecycle once and keeps the process alive until shutdown.

mod builtin;

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use hooklift_core::config::AppConfig;
use hooklift_core::error::AppError;
use hooklift_hooks::{
    AppContext, BroadcastObserver, HookDefinition, HookObserver, HookOrchestrator, NoopObserver,
};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Startup failed: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("HOOKLIFT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Hooklift v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Shared configuration + built-in hooks ────────────
    let app = AppContext::with_settings(config.shared_settings());
    builtin::register(&app.registry).await?;

    // ── Step 2: Host-level hook overrides ────────────────────────
    for (id, value) in &config.hooks {
        let definition = HookDefinition::from(value.clone());
        if definition.is_disabled() {
            app.registry.set_definition(id.as_str(), definition).await;
        } else {
            tracing::warn!(
                hook = %id,
                "Only `false` is supported as a hook override; ignoring `{}`",
                value
            );
        }
    }

    // ── Step 3: Observer ─────────────────────────────────────────
    let observer: Arc<dyn HookObserver> = if config.orchestrator.publish_events {
        let observer = BroadcastObserver::new(64);
        let mut events = observer.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                tracing::debug!(event = %event.event_name(), id = %event.id, "Hook event");
            }
        });
        Arc::new(observer)
    } else {
        Arc::new(NoopObserver)
    };

    // ── Step 4: Run the hook lifecycle ───────────────────────────
    let orchestrator = HookOrchestrator::new(app.clone(), observer)
        .with_reserved(config.orchestrator.reserved.clone());
    let report = orchestrator.run().await?;

    tracing::info!(
        loaded = report.loaded.len(),
        removed = report.removed.len(),
        elapsed_ms = report.elapsed_ms,
        "Hooklift ready"
    );
    tracing::debug!(report = %serde_json::to_string(&report)?, "Load report");
    for (id, state) in app.registry.snapshot_states().await {
        tracing::debug!(hook = %id, state = %state, "Hook state");
    }

    // ── Step 5: Wait for shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping hooks...");
    orchestrator.timers().cancel_all();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
