use std::sync::Once;

use log::LevelFilter;

/// Logger configuration.
///
/// `env_filter` uses `env_logger` filter syntax ("info",
/// "tessera_engine=debug,wgpu_core=warn"). When unset, `RUST_LOG` is read,
/// then `default_level` applies.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: LevelFilter,

    /// Caps the very chatty wgpu/naga targets unless a filter names them.
    pub quiet_gpu_stack: bool,

    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: LevelFilter::Info,
            quiet_gpu_stack: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

const GPU_TARGETS: &[&str] = &["wgpu_core", "wgpu_hal", "naga"];

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.default_level);

        if config.quiet_gpu_stack {
            for target in GPU_TARGETS {
                builder.filter_module(target, LevelFilter::Warn);
            }
        }

        // Explicit filters come last so they override the defaults above.
        let filter = config.env_filter.or_else(|| std::env::var("RUST_LOG").ok());
        if let Some(filter) = filter {
            builder.parse_filters(&filter);
        }

        builder.write_style(config.write_style);

        // Test harnesses may have installed a logger already.
        if let Err(e) = builder.try_init() {
            eprintln!("tessera: logger already initialized ({e})");
            return;
        }

        log::debug!("logging initialized");
    });
}
