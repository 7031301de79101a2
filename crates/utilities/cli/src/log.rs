//! Logging arguments and the tracing subscriber they configure.

use crate::CliResult;
use clap::{ArgAction, Parser, ValueEnum};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    filter::LevelFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines with every field.
    #[default]
    Full,
    /// One JSON object per line.
    Json,
    /// Shortened human readable lines.
    Compact,
}

/// Logging arguments.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogArgs {
    /// Verbosity level: warn by default, `-v` info, `-vv` debug, `-vvv` trace.
    ///
    /// `RUST_LOG` directives take precedence.
    #[arg(short = 'v', long = "verbosity", action = ArgAction::Count, global = true)]
    pub v: u8,
    /// Log output format.
    #[arg(long = "log.format", env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Full)]
    pub log_format: LogFormat,
}

impl LogArgs {
    /// The default level selected by the verbosity count.
    pub const fn level(&self) -> LevelFilter {
        match self.v {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Builds the filter: `RUST_LOG` directives on top of [`LogArgs::level`].
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder().with_default_directive(self.level().into()).from_env_lossy()
    }

    /// Installs the global tracing subscriber.
    ///
    /// `filter` replaces the filter derived from the arguments when given.
    pub fn init_tracing_subscriber(&self, filter: Option<EnvFilter>) -> CliResult<()> {
        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.log_format {
            LogFormat::Full => fmt::layer().boxed(),
            LogFormat::Json => fmt::layer().json().boxed(),
            LogFormat::Compact => fmt::layer().compact().boxed(),
        };
        let filter = filter.unwrap_or_else(|| self.env_filter());

        tracing_subscriber::registry().with(layer).with(filter).try_init()?;
        Ok(())
    }
}
