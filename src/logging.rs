//! Subscriber setup. `RICA_LOG` takes precedence over `RUST_LOG`; without
//! either, `-v` selects debug output and the default is warnings only.

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_ENV: &str = "RICA_LOG";

/// Crate targets raised to debug under `-v`.
const TARGETS: &[&str] = &["session", "selection", "cache", "bridge", "io", "rica"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Normal,
    Verbose,
}

impl Verbosity {
    pub const fn from_flag(verbose: bool) -> Self {
        if verbose { Self::Verbose } else { Self::Normal }
    }

    pub const fn default_level(self) -> Level {
        match self {
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Installs the global stderr subscriber. A second call is a no-op.
pub fn init_subscriber(verbosity: Verbosity) {
    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(true);

    let result = match verbosity {
        Verbosity::Verbose => tracing_subscriber::registry()
            .with(env_filter(verbosity))
            .with(fmt_layer.with_timer(fmt::time::uptime()))
            .try_init(),
        Verbosity::Normal => tracing_subscriber::registry()
            .with(env_filter(verbosity))
            .with(fmt_layer.without_time().compact())
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!(target: "rica", "subscriber already installed");
    }
}

fn env_filter(verbosity: Verbosity) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::try_new(default_directive(verbosity))
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_level().as_str()))
}

fn default_directive(verbosity: Verbosity) -> String {
    let level = verbosity.default_level();
    match verbosity {
        Verbosity::Normal => level.to_string(),
        Verbosity::Verbose => {
            let targets: Vec<String> = TARGETS.iter().map(|t| format!("{t}=debug")).collect();
            format!("info,{}", targets.join(","))
        }
    }
}
