//! Logging infrastructure for docloom.
//!
//! Sets up `tracing` with an `EnvFilter` so operators can tune verbosity via
//! `DOCLOOM_LOG` (or `RUST_LOG`) without recompiling.

use std::io::IsTerminal;

use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Check if colored output should be used.
///
/// Returns true only if stdout is a terminal and `NO_COLOR` is not set.
fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber for structured logging.
///
/// Filter precedence: `DOCLOOM_LOG` env var, then `RUST_LOG`, then a built-in
/// default of `docloom=info` (or `docloom=debug` when `verbose` is set).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_env("DOCLOOM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("docloom=debug,info")
            } else {
                EnvFilter::try_new("docloom=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_line_number(false)
                .with_file(false)
                .with_ansi(use_color())
                .compact(),
        )
        .try_init()?;

    Ok(())
}
