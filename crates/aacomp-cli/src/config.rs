mod defaults;

use defaults::DefaultsConfig;

use crate::cli::{CompareArgs, OutputFormat};
use crate::error::{CliError, Result};
use aacomp::engine::config as core_config;
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialFetchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_concurrent: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialChartsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialReportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ratio_section: Option<String>,
}

/// The configuration file as written by the user; every key is optional.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    fetch: Option<PartialFetchConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    charts: Option<PartialChartsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<PartialReportConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub path: PathBuf,
    pub format: OutputFormat,
}

/// Fully resolved settings for one `compare` invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub core: core_config::ComparisonConfig,
    pub fetch: FetchSettings,
    pub charts: ChartSettings,
    /// `None` when the report is disabled.
    pub report: Option<ReportSettings>,
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads `explicit` if given, else the per-user configuration file if it exists,
    /// else an empty configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Ok(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No configuration file found, using built-in defaults.");
                Ok(Self::default())
            }
        }
    }

    pub fn default_path() -> Result<PathBuf> {
        ProjectDirs::from("org", "aacomp", "aacomp")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or_else(|| {
                CliError::Config("Could not determine config directory path.".to_string())
            })
    }

    /// A configuration with every key set to its built-in default.
    pub fn defaults() -> Self {
        let d = DefaultsConfig::default();
        Self {
            fetch: Some(PartialFetchConfig {
                base_url: Some(d.base_url),
                max_concurrent: Some(d.max_concurrent),
                timeout_secs: Some(d.timeout_secs),
            }),
            charts: Some(PartialChartsConfig {
                enabled: Some(d.charts_enabled),
                width: Some(d.chart_width),
                height: Some(d.chart_height),
            }),
            report: Some(PartialReportConfig {
                output: Some(DefaultsConfig::output_for(d.format)),
                format: Some(d.format),
                frequency_section: Some(d.frequency_section),
                ratio_section: Some(d.ratio_section),
            }),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize configuration: {}", e)))
    }

    pub fn merge_with_cli(mut self, args: &CompareArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;

        let defaults = DefaultsConfig::default();
        let fetch = self.fetch.take().unwrap_or_default();
        let charts = self.charts.take().unwrap_or_default();
        let report = self.report.take().unwrap_or_default();

        let mut builder = core_config::ComparisonConfigBuilder::new().max_concurrent_fetches(
            args.max_concurrent
                .or(fetch.max_concurrent)
                .unwrap_or(defaults.max_concurrent),
        );
        if let Some(name) = report.frequency_section {
            builder = builder.frequency_section(name);
        }
        if let Some(name) = report.ratio_section {
            builder = builder.ratio_section(name);
        }
        let core = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

        let base_url = fetch.base_url.unwrap_or(defaults.base_url);
        reqwest::Url::parse(&base_url).map_err(|e| {
            CliError::Config(format!("Invalid value for fetch.base-url '{}': {}", base_url, e))
        })?;
        let timeout_secs = args
            .timeout_secs
            .or(fetch.timeout_secs)
            .unwrap_or(defaults.timeout_secs);
        if timeout_secs == 0 {
            return Err(CliError::Config(
                "`fetch.timeout-secs` must be at least 1.".to_string(),
            ));
        }

        let charts = ChartSettings {
            enabled: !args.no_charts && charts.enabled.unwrap_or(defaults.charts_enabled),
            width: charts.width.unwrap_or(defaults.chart_width),
            height: charts.height.unwrap_or(defaults.chart_height),
        };
        if charts.width == 0 || charts.height == 0 {
            return Err(CliError::Config(
                "`charts.width` and `charts.height` must be positive.".to_string(),
            ));
        }

        let report = if args.no_report {
            None
        } else {
            let format = args.format.or(report.format).unwrap_or(defaults.format);
            Some(ReportSettings {
                path: args
                    .output
                    .clone()
                    .or(report.output)
                    .unwrap_or_else(|| DefaultsConfig::output_for(format)),
                format,
            })
        };

        Ok(AppConfig {
            core,
            fetch: FetchSettings {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            charts,
            report,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "fetch.base-url" => {
                    self.fetch.get_or_insert_with(Default::default).base_url =
                        Some(value_str.to_string());
                }
                "fetch.max-concurrent" => {
                    self.fetch.get_or_insert_with(Default::default).max_concurrent =
                        Some(parse_value(key, value_str)?);
                }
                "fetch.timeout-secs" => {
                    self.fetch.get_or_insert_with(Default::default).timeout_secs =
                        Some(parse_value(key, value_str)?);
                }
                "charts.enabled" => {
                    self.charts.get_or_insert_with(Default::default).enabled =
                        Some(parse_value(key, value_str)?);
                }
                "charts.width" => {
                    self.charts.get_or_insert_with(Default::default).width =
                        Some(parse_value(key, value_str)?);
                }
                "charts.height" => {
                    self.charts.get_or_insert_with(Default::default).height =
                        Some(parse_value(key, value_str)?);
                }
                "report.output" => {
                    self.report.get_or_insert_with(Default::default).output =
                        Some(PathBuf::from(value_str));
                }
                "report.format" => {
                    let format = <OutputFormat as ValueEnum>::from_str(value_str.trim(), true).map_err(|_| {
                        CliError::Config(format!(
                            "Invalid value for {}: {} (expected 'xlsx', 'archive' or 'dir')",
                            key, value_str
                        ))
                    })?;
                    self.report.get_or_insert_with(Default::default).format = Some(format);
                }
                "report.frequency-section" => {
                    self.report
                        .get_or_insert_with(Default::default)
                        .frequency_section = Some(value_str.to_string());
                }
                "report.ratio-section" => {
                    self.report.get_or_insert_with(Default::default).ratio_section =
                        Some(value_str.to_string());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value_str
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn compare_args(extra: &[&str]) -> CompareArgs {
        let mut argv = vec!["aacomp", "compare", "P69905"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Compare(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn merge_uses_defaults_when_nothing_is_set() {
        let config = PartialAppConfig::default()
            .merge_with_cli(&compare_args(&[]))
            .unwrap();
        let defaults = DefaultsConfig::default();

        assert_eq!(config.core.max_concurrent_fetches, defaults.max_concurrent);
        assert_eq!(config.fetch.base_url, defaults.base_url);
        assert_eq!(config.fetch.timeout, Duration::from_secs(defaults.timeout_secs));
        assert!(config.charts.enabled);
        let report = config.report.unwrap();
        assert_eq!(report.format, OutputFormat::Xlsx);
        assert_eq!(report.path, DefaultsConfig::output_for(OutputFormat::Xlsx));
    }

    #[test]
    fn default_report_path_follows_the_chosen_format() {
        let config = PartialAppConfig::default()
            .merge_with_cli(&compare_args(&["-S", "report.format=archive"]))
            .unwrap();
        let report = config.report.unwrap();
        assert_eq!(report.format, OutputFormat::Archive);
        assert_eq!(report.path, PathBuf::from("UniProt_comparison_results.tar.zst"));

        let config = PartialAppConfig::default()
            .merge_with_cli(&compare_args(&["--format", "dir", "-o", "out"]))
            .unwrap();
        assert_eq!(config.report.unwrap().path, PathBuf::from("out"));
    }

    #[test]
    fn file_values_are_read_with_kebab_case_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[fetch]
base-url = "http://localhost:8080"
max-concurrent = 2

[charts]
enabled = false
width = 640

[report]
format = "dir"
frequency-section = "frequencies"
"#,
        )
        .unwrap();

        let config = PartialAppConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&compare_args(&[]))
            .unwrap();

        assert_eq!(config.fetch.base_url, "http://localhost:8080");
        assert_eq!(config.core.max_concurrent_fetches, 2);
        assert!(!config.charts.enabled);
        assert_eq!(config.charts.width, 640);
        assert_eq!(config.report.unwrap().format, OutputFormat::Dir);
        assert_eq!(config.core.naming.frequency_section, "frequencies");
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[fetch]\nretries = 3\n").unwrap();

        let result = PartialAppConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn cli_flags_override_set_values_which_override_file() {
        let partial: PartialAppConfig =
            toml::from_str("[fetch]\nmax-concurrent = 2\ntimeout-secs = 5\n").unwrap();
        let args = compare_args(&[
            "-j",
            "8",
            "-S",
            "fetch.max-concurrent=3",
            "fetch.timeout-secs=9",
        ]);

        let config = partial.merge_with_cli(&args).unwrap();

        assert_eq!(config.core.max_concurrent_fetches, 8);
        assert_eq!(config.fetch.timeout, Duration::from_secs(9));
    }

    #[test]
    fn no_charts_and_no_report_flags_disable_outputs() {
        let config = PartialAppConfig::default()
            .merge_with_cli(&compare_args(&["--no-charts", "--no-report"]))
            .unwrap();
        assert!(!config.charts.enabled);
        assert!(config.report.is_none());
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for bad in [
            "fetch.max-concurrent",
            "fetch.max-concurrent=many",
            "fetch.retries=3",
            "report.format=pdf",
        ] {
            let result =
                PartialAppConfig::default().merge_with_cli(&compare_args(&["-S", bad]));
            assert!(
                matches!(result, Err(CliError::Config(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn invalid_values_fail_validation() {
        let cases: [&[&str]; 4] = [
            &["-j", "0"],
            &["--timeout-secs", "0"],
            &["-S", "charts.width=0"],
            &["-S", "fetch.base-url=not a url"],
        ];
        for extra in cases {
            let result = PartialAppConfig::default().merge_with_cli(&compare_args(extra));
            assert!(matches!(result, Err(CliError::Config(_))), "{:?}", extra);
        }
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = PartialAppConfig::defaults().to_toml().unwrap();
        let parsed: PartialAppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, PartialAppConfig::defaults());
        assert!(text.contains("max-concurrent = 4"));
    }
}
