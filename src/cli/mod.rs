//! Command-line parsing for the liquidity report.
//!
//! Every flag is optional; a bare `liquidity-report` fetches from the default
//! source and writes `public/index.html`.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::SourceKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "liquidity-report",
    version,
    about = "PBOC open-market operations vs DR007 liquidity report (static HTML)"
)]
pub struct Cli {
    /// Upstream source to fetch both series from.
    #[arg(short = 's', long, value_enum, default_value_t = SourceKind::Datayes)]
    pub source: SourceKind,

    /// TOML settings file (endpoints, headers, timeouts).
    #[arg(short = 'c', long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Override the report path.
    #[arg(short = 'o', long, value_name = "HTML")]
    pub output: Option<PathBuf>,

    /// Override the number of trailing rows kept per series.
    #[arg(long)]
    pub lookback: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_uses_defaults() {
        let cli = Cli::parse_from(["liquidity-report"]);
        assert_eq!(cli.source, SourceKind::Datayes);
        assert!(cli.config.is_none());
        assert!(cli.output.is_none());
        assert!(cli.lookback.is_none());
    }

    #[test]
    fn parses_source_and_overrides() {
        let cli = Cli::parse_from([
            "liquidity-report",
            "--source",
            "browser",
            "-o",
            "out/report.html",
            "--lookback",
            "30",
        ]);
        assert_eq!(cli.source, SourceKind::Browser);
        assert_eq!(cli.output, Some(PathBuf::from("out/report.html")));
        assert_eq!(cli.lookback, Some(30));
    }
}
