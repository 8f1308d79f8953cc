//! Hookcap runner entry point.
//!
//! Wires together the infrastructure services and runs the press capture
//! pipeline on a single-threaded Tokio runtime: every toolchain
//! invocation, permission step, spawn, and stream read is multiplexed
//! cooperatively on one event loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML config with defaults
//!  └─ detect_host()          -- host names → enums, resolved ONCE
//!  └─ PreflightGate          -- platform prerequisites, fatal on denial
//!  └─ CapturePipeline        -- build → chmod → spawn → translate
//!       └─ EventBus          -- ordered fan-out + first-event accessor
//!            └─ stdout       -- captured events as JSON lines
//! ```

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hookcap_core::{resolve_target, Capability};
use hookcap_runner::application::event_bus::EventBus;
use hookcap_runner::application::pipeline::{
    detect_host, CapturePipeline, HelperPaths, SystemLauncher,
};
use hookcap_runner::infrastructure::exec::{CommandExecutor, SystemExecutor};
use hookcap_runner::infrastructure::preflight::PreflightGate;
use hookcap_runner::infrastructure::process::StreamSettings;
use hookcap_runner::infrastructure::storage::{self, config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;

    // Initialise structured logging.  Level comes from the config file and
    // is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.clone())),
        )
        .init();

    info!("Hookcap runner starting");

    // ── Host resolution (exactly once per run) ────────────────────────────────
    let (platform, arch) = detect_host()?;
    let target = resolve_target(platform, arch)?;
    info!("resolved build target {target} for {platform}/{arch}");

    let executor = Arc::new(SystemExecutor);

    // ── Preflight gate ────────────────────────────────────────────────────────
    PreflightGate::new(
        Arc::clone(&executor) as Arc<dyn CommandExecutor>,
        platform,
    )
    .check()
    .await?;

    storage::ensure_output_dir(&cfg.helper.output_dir)?;

    // ── Event bus and consumer output ─────────────────────────────────────────
    let bus = Arc::new(EventBus::new(
        cfg.streams.bus_max_listeners,
        cfg.streams.channel_capacity,
    ));

    // Captured events go to stdout as JSON lines for downstream consumers.
    let mut events = bus.subscribe()?;
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => error!("failed to encode event: {e}"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("event output lagged; {missed} events missed");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Log the first capture (or the failure that preceded it) as soon as it
    // lands.
    let first_watch = {
        let bus = Arc::clone(&bus);
        tokio::spawn(async move {
            match bus.first_event().await {
                Ok(payload) => info!("first capture: {payload:?}"),
                Err(e) => error!("capture failed before the first event: {e}"),
            }
        })
    };

    // ── Press pipeline ────────────────────────────────────────────────────────
    let pipeline = CapturePipeline::new(
        Capability::Press,
        platform,
        target,
        HelperPaths {
            source_dir: cfg.helper.source_dir.clone(),
            output_dir: cfg.helper.output_dir.clone(),
        },
        StreamSettings {
            max_listeners: cfg.streams.max_listeners,
            channel_capacity: cfg.streams.channel_capacity,
        },
        Arc::clone(&executor) as Arc<dyn CommandExecutor>,
        Arc::new(SystemLauncher),
    );

    let run_result = pipeline.run(&bus).await;

    // A helper that exited without producing data leaves the first-event
    // accessor pending forever; don't wait on it in that case.
    if first_watch.is_finished() {
        first_watch.await.ok();
    } else {
        first_watch.abort();
    }

    // Dropping the last bus handle closes the event stream and ends the
    // printer.
    drop(bus);
    printer.await.ok();

    run_result?;
    info!("Hookcap runner stopped");
    Ok(())
}
