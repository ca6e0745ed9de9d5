//! tracing subscriber wiring: terse stderr diagnostics plus a full
//! plain-text copy in the session log

use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::preferences::EnvMap;

/// Environment variable holding an `EnvFilter` directive for stderr output
pub const ENV_TRACE: &str = "DESKSET_TRACE";

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbose: bool, env: &EnvMap, session_log: Option<Arc<File>>) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let stderr_filter = env
        .get(ENV_TRACE)
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(stderr_filter);

    let file_layer = session_log.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(false)
            .with_filter(EnvFilter::new("debug"))
    });

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}
