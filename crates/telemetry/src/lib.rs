//! Tracing bootstrap shared by every Shelf binary.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use shelf_kernel::settings::{LogFormat, TelemetrySettings};

/// Build the log filter, letting `RUST_LOG` override the configured level.
pub fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.log_level)
        .map_err(|e| anyhow!("invalid log level '{}': {}", settings.log_level, e))
}

/// Install the global tracing subscriber.
///
/// Calling this more than once is harmless; later calls keep the first
/// subscriber.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().flatten_event(true).try_init().is_ok(),
    };

    if installed {
        tracing::info!(
            target: "shelf-telemetry",
            format = ?settings.log_format,
            "telemetry initialized"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_level() {
        std::env::remove_var("RUST_LOG");
        let settings = TelemetrySettings {
            log_format: LogFormat::Pretty,
            log_level: "shelf=notalevel".to_string(),
        };
        assert!(env_filter(&settings).is_err());
    }

    #[test]
    fn init_twice_is_harmless() {
        let settings = TelemetrySettings::default();
        init(&settings).unwrap();
        init(&settings).unwrap();
    }
}
