//! Global logging setup.

use std::{env, io, panic};

use anyhow::{Context, Result};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Our binary reports at info, the libraries stay quiet unless asked.
const DEFAULT_FILTER: &str = "warn,umbra_cli=info";

/// Installs a compact stderr `tracing` subscriber honouring `RUST_LOG`.
///
/// `RUST_LOG` directives are appended to the default filter, so
/// `RUST_LOG=umbra_world=debug` adds map and path logging without silencing
/// the binary. Panic messages are routed through the subscriber as well.
pub(crate) fn init_logging() -> Result<()> {
    let mut filter = DEFAULT_FILTER.to_owned();
    if let Ok(env_filter) = env::var(EnvFilter::DEFAULT_ENV) {
        filter.push(',');
        filter.push_str(&env_filter);
    }

    let format = fmt::format().compact().with_line_number(true);
    let stderr_log = fmt::layer().event_format(format).with_writer(io::stderr);

    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("invalid log filter `{filter}`"))?;
    let subscriber = Registry::default().with(env_filter).with(stderr_log);
    tracing::subscriber::set_global_default(subscriber)
        .context("unable to install log subscriber")?;

    panic::set_hook(Box::new(|info| {
        error!("{info}");
    }));
    Ok(())
}
