//! Logging configuration and initialization.
//!
//! Presets pick a level per `renoplan::` target; `--log target=level` flags
//! refine them, and `RUST_LOG` replaces the whole filter when set.

use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const TARGET_PREFIX: &str = "renoplan::";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Request and generation milestones; chatty targets at warn
    #[default]
    Production,
    Verbose,
    /// Everything at debug except per-chunk relay output
    Debug,
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    fn directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &[
                "renoplan::startup=info",
                "renoplan::api=info",
                "renoplan::chat=info",
                "renoplan::relay=warn",
                "renoplan::store=warn",
                "renoplan::bom=info",
                "renoplan::products=info",
                "renoplan::gateway=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &["renoplan=info", "tower_http=info"],
            LogPreset::Debug => &["renoplan=debug", "renoplan::relay=info", "tower_http=debug"],
            LogPreset::Trace => &["renoplan=trace", "tower_http=trace"],
            LogPreset::Quiet => &["renoplan=warn", "tower_http=error"],
        }
    }
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target level overrides, keyed by full target name.
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Build from CLI flags. The quietest/most detailed flag wins in the
    /// order quiet, trace, debug, verbose.
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = match (quiet, trace, debug, verbose) {
            (true, ..) => LogPreset::Quiet,
            (_, true, ..) => LogPreset::Trace,
            (_, _, true, _) => LogPreset::Debug,
            (_, _, _, true) => LogPreset::Verbose,
            _ => LogPreset::Production,
        };

        let overrides = log_overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(parse_override)
            .collect();

        Self {
            preset,
            overrides,
            format,
        }
    }

    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }

        let directives: Vec<String> = self
            .preset
            .directives()
            .iter()
            .map(|d| d.to_string())
            .chain(
                self.overrides
                    .iter()
                    .map(|(target, level)| format!("{}={}", target, level.as_str().to_lowercase())),
            )
            .collect();

        EnvFilter::try_new(directives.join(",")).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Parse one `target=level` pair, prefixing bare targets with `renoplan::`.
fn parse_override(part: &str) -> Option<(String, Level)> {
    let (target, level) = part.split_once('=')?;
    let target = target.trim();
    let level = Level::from_str(level.trim()).ok()?;

    let full_target = if target.starts_with(TARGET_PREFIX) || target == "tower_http" {
        target.to_string()
    } else {
        format!("{}{}", TARGET_PREFIX, target)
    };
    Some((full_target, level))
}

/// Initialize the tracing subscriber with the given configuration.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}
