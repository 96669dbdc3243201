//! Scoped profiling into Chrome trace files.
//!
//! Instrumented code opens ordinary `tracing` spans. [`ChromeTraceLayer`]
//! turns each enter/exit pair into a complete (`"ph": "X"`) event and appends
//! it to the [`Instrumentor`] session, if one is open. The output loads in
//! `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
//!
//! ```no_run
//! use tessera_engine::profiling::{Instrumentor, init_profiling};
//!
//! static PROFILER: Instrumentor = Instrumentor::new();
//!
//! init_profiling(&PROFILER);
//! let _session = PROFILER.scoped_session("Runtime", "tessera-runtime.json")?;
//! # Ok::<(), std::io::Error>(())
//! ```

mod chrome_layer;
mod instrumentor;

use tracing_subscriber::layer::SubscriberExt;

pub use chrome_layer::ChromeTraceLayer;
pub use instrumentor::{Instrumentor, ProfileResult, SessionGuard};

/// Installs a global subscriber feeding `sink`.
///
/// Returns `false` when another global subscriber is already set.
pub fn init_profiling(sink: &'static Instrumentor) -> bool {
    let subscriber = tracing_subscriber::registry().with(ChromeTraceLayer::new(sink));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
