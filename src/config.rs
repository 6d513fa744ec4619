//! CLI argument parsing and the resolved run configuration assembled
//! from it, in the style of `assay-core`'s config module: one place that
//! turns parsed flags into the values the rest of the binary consumes.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Html,
}

/// Audits a corpus of compiled class files for cryptographic API usage
/// against a YAML catalog and policy, producing PASS/FAIL/UNKNOWN
/// verdicts per call site.
#[derive(Debug, Parser)]
#[command(name = "clscan", version, about)]
pub struct Cli {
    /// Directory to scan, recursively, for `.class` files and
    /// `.jar`/`.zip` archives.
    #[arg(long)]
    pub input: PathBuf,

    /// Path to a catalog YAML file. Falls back to the bundled default.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Path to a policy YAML file. Falls back to the bundled default.
    #[arg(long)]
    pub policy: Option<PathBuf>,

    /// Report output format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Where to write the report. For `text`, a file path (stdout if
    /// omitted); for `html`, a directory that will hold `index.html`
    /// and any per-class pages.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Enable verbose (debug-level) logging.
    #[arg(long, short)]
    pub verbose: bool,
}

pub struct Config {
    pub input: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub policy_path: Option<PathBuf>,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            input: cli.input,
            catalog_path: cli.catalog,
            policy_path: cli.policy,
            format: cli.format,
            output: cli.output,
        }
    }
}
