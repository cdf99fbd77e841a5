mod bootstrap;
mod transport;

use std::sync::Arc;

use anyhow::Result;
use nudge_core::registry::EntityRegistry;
use nudge_core::settings::Settings;
use nudge_runtime::{CorrelationBridge, HintSink, HostLink, RenderHint, SyncEngine, ViewCoordinator};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    let data_dir = settings.data_dir();
    bootstrap::ensure_directories(&data_dir)?;
    bootstrap::setup_logging(&settings.log_level, &settings.log_file_path())?;

    tracing::info!("nudge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data dir: {}, call timeout: {:?}",
        data_dir.display(),
        settings.call_timeout()
    );

    // Host channel: stdin events in, stdout requests out.
    let (bridge, outbound) = CorrelationBridge::channel(settings.call_timeout());
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (notes_tx, mut notes_rx) = mpsc::unbounded_channel();

    let reader = tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        transport::read_events(stdin, events_tx).await
    });
    let writer = tokio::spawn(transport::write_requests(tokio::io::stdout(), outbound));
    let link = HostLink::spawn(events_rx, bridge.clone(), notes_tx);

    let (hints, mut hints_rx) = HintSink::channel();
    let registry = Arc::new(EntityRegistry::default());
    let engine = SyncEngine::new(bridge, registry, hints);
    let mut coordinator = ViewCoordinator::new(engine);

    let view = coordinator.start().await;
    tracing::info!(%view, "initial view");

    loop {
        tokio::select! {
            note = notes_rx.recv() => match note {
                Some(notification) => {
                    tracing::debug!(?notification, "host notification");
                    coordinator.handle_notification(notification);
                }
                None => {
                    tracing::info!("host disconnected; shutting down");
                    break;
                }
            },
            Some(hint) = hints_rx.recv() => log_hint(&hint),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received; shutting down");
                break;
            }
        }
    }

    coordinator.shutdown();
    link.abort();
    reader.abort();
    writer.abort();
    Ok(())
}

/// Render hints have no screen here; they are traced for the log.
fn log_hint(hint: &RenderHint) {
    match hint {
        RenderHint::Tabs(tabs) => {
            let labels: Vec<&str> = tabs.iter().map(|t| t.label.as_str()).collect();
            tracing::info!(?labels, "tabs");
        }
        RenderHint::ActiveView(view) => tracing::info!(%view, "active view"),
        RenderHint::Items {
            key,
            kind,
            items,
            updated_at,
        } => tracing::info!(
            %key,
            %kind,
            count = items.len(),
            updated_at = %updated_at.format("%H:%M:%S"),
            "items"
        ),
        RenderHint::HabitControl {
            key,
            item_id,
            state,
        } => tracing::debug!(%key, %item_id, ?state, "habit control"),
        RenderHint::Error(Some(message)) => tracing::warn!(error = %message, "error shown"),
        RenderHint::Error(None) => tracing::debug!("error cleared"),
        RenderHint::Credential(present) => tracing::info!(present, "credential"),
    }
}
