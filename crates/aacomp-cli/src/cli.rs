use aacomp::engine::report::ImageFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "AACOMP CLI - Compare amino-acid composition and residue ratios (E/Q, E/P, Y/F, D/N, G/S) across UniProt proteins.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch proteins, compare their composition and write a report.
    Compare(CompareArgs),
    /// Inspect the configuration file.
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// An Excel workbook, one worksheet per section with its charts embedded.
    Xlsx,
    /// A single zstd-compressed tar archive of CSV tables and SVG charts.
    Archive,
    /// A plain directory with the same layout as the archive.
    Dir,
}

impl OutputFormat {
    /// The chart format the report layout can embed.
    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Xlsx => ImageFormat::Png,
            OutputFormat::Archive | OutputFormat::Dir => ImageFormat::Svg,
        }
    }
}

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// UniProt accession codes separated by commas (e.g. "P69905, P68871, P02042").
    #[arg(required = true, value_name = "ACCESSIONS")]
    pub accessions: String,

    /// Path of the report to write.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Layout of the written report.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to a configuration file in TOML format.
    /// Defaults to the per-user configuration file if it exists.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read sequences from a local FASTA file instead of the UniProt REST API.
    #[arg(long, value_name = "PATH")]
    pub fasta: Option<PathBuf>,

    /// Override the maximum number of concurrent retrievals.
    #[arg(short = 'j', long, value_name = "NUM")]
    pub max_concurrent: Option<usize>,

    /// Override the per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Skip chart rendering; the report then holds tables only.
    #[arg(long)]
    pub no_charts: bool,

    /// Only print the tables, do not write a report.
    #[arg(long, conflicts_with_all = ["output", "format"])]
    pub no_report: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S fetch.max-concurrent=8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `config` subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the built-in defaults as a TOML configuration file.
    Show,
    /// Show the path of the per-user configuration file.
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compare_with_overrides() {
        let cli = Cli::parse_from([
            "aacomp",
            "-vv",
            "compare",
            "P69905, P68871",
            "-o",
            "out.tar.zst",
            "--format",
            "archive",
            "-j",
            "2",
            "-S",
            "charts.width=640",
        ]);

        assert_eq!(cli.verbose, 2);
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare command");
        };
        assert_eq!(args.accessions, "P69905, P68871");
        assert_eq!(args.output, Some(PathBuf::from("out.tar.zst")));
        assert_eq!(args.format, Some(OutputFormat::Archive));
        assert_eq!(args.max_concurrent, Some(2));
        assert_eq!(args.set_values, vec!["charts.width=640".to_string()]);
        assert!(!args.no_charts);
    }

    #[test]
    fn no_report_conflicts_with_output() {
        let result = Cli::try_parse_from(["aacomp", "compare", "P69905", "--no-report", "-o", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn only_workbooks_need_raster_charts() {
        assert_eq!(OutputFormat::Xlsx.image_format(), ImageFormat::Png);
        assert_eq!(OutputFormat::Archive.image_format(), ImageFormat::Svg);
        assert_eq!(OutputFormat::Dir.image_format(), ImageFormat::Svg);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["aacomp", "-q", "-v", "config", "show"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
