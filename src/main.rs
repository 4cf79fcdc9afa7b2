use anyhow::{Context, Result};
use eframe::egui;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voice_overlay::ui::OverlayApp;
use voice_overlay::{Overlay, OverlayConfig, OverlayError, WsTransport};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voice_overlay=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting voice overlay");

    let config = OverlayConfig::load_or_default().map_err(report)?;
    let (overlay, handle) = Overlay::new(&config, Arc::new(WsTransport::new())).map_err(report)?;

    // Single-threaded cooperative runtime for the dispatch loop
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([280.0, 180.0])
            .with_always_on_top()
            .with_title("Voice Overlay"),
        ..Default::default()
    };

    eframe::run_native(
        "Voice Overlay",
        options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            let overlay = overlay.with_repaint_hook(move || ctx.request_repaint());
            let thread = std::thread::Builder::new()
                .name("overlay-runtime".to_string())
                .spawn(move || runtime.block_on(overlay.run()))?;
            Ok(Box::new(OverlayApp::new(cc, handle, thread)))
        }),
    )
    .map_err(|e| report(OverlayError::UiError(e.to_string())))?;

    info!("Voice overlay exited");
    Ok(())
}

/// Log a startup failure in user terms and pass it on
fn report(e: OverlayError) -> anyhow::Error {
    error!("{}", e.user_message());
    e.into()
}
