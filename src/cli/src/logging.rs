//! Tracing setup.
//!
//! The subscriber is installed before the config file is read so events
//! emitted while loading it are not lost. Once the config is known its
//! `log_level` replaces the startup filter, unless `RUST_LOG` is set.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use autorun_core::config::{LogLevel, ENV_LOG};

/// Handle for adjusting the filter after startup.
pub struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    from_rust_log: bool,
}

/// Filter used until the config is loaded: `RUST_LOG`, then `AUTORUN_LOG`,
/// then `warn`.
pub fn startup_directive(rust_log: Option<&str>, autorun_log: Option<&str>) -> String {
    if let Some(directive) = rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        return directive.to_string();
    }
    autorun_log
        .and_then(|level| level.parse::<LogLevel>().ok())
        .unwrap_or(LogLevel::Warn)
        .as_str()
        .to_string()
}

/// Install the global subscriber. Logs go to stderr so `--print` output
/// stays clean.
pub fn init() -> Logging {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let autorun_log = std::env::var(ENV_LOG).ok();
    let directive = startup_directive(rust_log.as_deref(), autorun_log.as_deref());
    let from_rust_log = rust_log.is_some_and(|d| !d.trim().is_empty());

    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Logging {
        handle,
        from_rust_log,
    }
}

impl Logging {
    /// Switch to the configured level. `RUST_LOG` keeps precedence.
    pub fn apply(&self, level: LogLevel) {
        if self.from_rust_log {
            return;
        }
        if let Err(e) = self.handle.reload(EnvFilter::new(level.as_str())) {
            tracing::warn!(error = %e, "Failed to apply configured log level");
        }
    }
}
