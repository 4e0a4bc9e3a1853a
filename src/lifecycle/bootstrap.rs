/*!
 * Lifecycle Bootstrap
 *
 * One-time startup of the native collector. Startup failure is fatal: no
 * allocator can be trusted afterwards, so the bootstrap panics instead of
 * handing back a context over an unusable heap.
 */

use super::config::GcConfig;
use super::context::ExecutionContext;
use super::warnings::install_warning_handler;
use crate::memory::native::NativeCollector;
use std::sync::Arc;
use tracing::{error, info, warn};

#[cfg(feature = "bdwgc")]
use crate::memory::native::Bdwgc;

/// Start `collector` with `config` and return a context using the default policy
///
/// Safe to call repeatedly: the collector's own `init` is idempotent, and the
/// remaining settings are re-applied with the same values.
///
/// # Panics
/// If the collector cannot be started.
pub fn bootstrap<C: NativeCollector>(collector: Arc<C>, config: GcConfig) -> ExecutionContext<C> {
    info!(
        incremental = config.incremental,
        warnings = %config.warnings,
        "Bootstrapping garbage collector"
    );

    if let Err(reason) = collector.init() {
        error!(%reason, "Collector startup failed");
        panic!("garbage collector failed to start: {}", reason);
    }

    if config.incremental {
        collector.enable_incremental();
    }

    install_warning_handler(&*collector, config.warnings);

    if let Some(max) = config.max_heap {
        collector.set_max_heap_size(max);
        info!(max_heap = max, "Heap growth capped");
    }

    if let Some(initial) = config.initial_heap {
        if collector.expand_heap(initial) {
            info!(initial_heap = initial, "Heap pre-expanded");
        } else {
            warn!(initial_heap = initial, "Collector refused to pre-expand heap");
        }
    }

    info!("Garbage collector ready");
    ExecutionContext::new(collector, config)
}

/// Start libgc, optionally in incremental mode
///
/// The first call must be made on the process main thread, which libgc then
/// keeps registered until exit. Later calls may come from any thread. Other
/// threads must hold a [`Bdwgc::register_current_thread`] guard while they
/// use collected memory.
///
/// # Panics
/// If libgc cannot start, including when first called off the main thread.
#[cfg(feature = "bdwgc")]
pub fn initialize(incremental: bool) -> ExecutionContext<Bdwgc> {
    bootstrap(
        Arc::new(Bdwgc::new()),
        GcConfig::new().with_incremental(incremental),
    )
}

/// Start libgc with settings read from the environment
///
/// Same threading rules as [`initialize`].
///
/// # Panics
/// If the environment holds malformed settings, or libgc cannot start.
#[cfg(feature = "bdwgc")]
pub fn initialize_from_env() -> ExecutionContext<Bdwgc> {
    let config = match GcConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid collector configuration");
            panic!("invalid collector configuration: {}", e);
        }
    };
    bootstrap(Arc::new(Bdwgc::new()), config)
}
