use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

/// `RUST_LOG` wins over the configured level so operators can raise verbosity per module.
fn build_filter(configured_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured_level))
}

pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let telemetry = settings.telemetry();
    let builder = fmt()
        .with_env_filter(build_filter(&telemetry.log_level))
        .with_target(false)
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    let result = if telemetry.json { builder.json().try_init() } else { builder.try_init() };
    result.map_err(|err| anyhow::anyhow!(err.to_string()))?;

    tracing::debug!(
        level = %telemetry.log_level,
        json = telemetry.json,
        environment = %settings.runtime().environment.as_str(),
        "Tracing initialised"
    );

    Ok(())
}
