use color_eyre::eyre::{Result, eyre};
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per line, for log shippers.
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Unknown names fall back to `info`.
pub fn parse_level(s: &str) -> Level {
    s.trim().parse::<Level>().unwrap_or(Level::INFO)
}

/// Installs the global subscriber. Logs go to stderr so `--stdout` records stay clean.
pub fn init(level: Level, format: LogFormat) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
        }
    };
    result.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}
