use anyhow::anyhow;
use funckit_models::LoggingConfig;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

pub struct TracingService;

impl TracingService {
    /// Installs the global subscriber. `RUST_LOG` wins over the configured
    /// level; `verbose` lowers the fallback to `debug`. Logs go to stderr so
    /// command output on stdout stays clean.
    pub fn init(config: &LoggingConfig, verbose: bool, json: bool) -> anyhow::Result<()> {
        let fallback = if verbose { "debug" } else { config.level.as_str() };
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(fallback))
            .map_err(|e| anyhow!("invalid log level '{fallback}': {e}"))?;

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_timer(UtcTime::rfc_3339());

        let result = if json || config.json {
            builder.json().try_init()
        } else {
            builder.with_target(false).try_init()
        };
        result.map_err(|e| anyhow!("failed to initialise logging: {e}"))
    }
}
