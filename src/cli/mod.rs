use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::services::batch::{run_all, BatchStatus};
use crate::services::catalog::{builtin_reports, find_report};
use crate::services::{DataApiSource, FixtureSource, ReportRunner, ReportingSource};
use crate::types::ReportOutcome;

/// Weekly web-analytics reports rendered as HTML
#[derive(Parser)]
#[command(name = "gareport")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.gareport/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Analytics property id, overrides the config file
    #[arg(long, global = true)]
    property: Option<String>,

    /// Directory for the generated HTML files
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Replay saved API responses from a JSON file instead of calling the API
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every built-in report (default)
    All,

    /// Generate one report
    Run {
        /// Report id (see `gareport list`)
        report: String,

        /// Print the report model as JSON instead of writing HTML
        #[arg(long)]
        json: bool,
    },

    /// List built-in reports
    List,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = self.load_config()?;

        match &self.command {
            Some(Commands::List) => {
                for report in builtin_reports(&config) {
                    println!("{:<22} {}", report.id, report.title_for(None));
                }
                Ok(())
            }
            Some(Commands::Run { report, json }) => {
                let def = find_report(&config, report)
                    .with_context(|| format!("unknown report '{}' (see `gareport list`)", report))?;
                let source = self.source(&config)?;
                let runner = ReportRunner::new(source.as_ref(), config.property_id()?, Local::now().date_naive());

                if *json {
                    match runner.build(&def)? {
                        ReportOutcome::Ready(doc) => println!("{}", serde_json::to_string_pretty(&doc)?),
                        ReportOutcome::NoData => println!("No data returned for {}", def.id),
                    }
                    return Ok(());
                }

                match runner.generate(&def, &config.output_dir)? {
                    ReportOutcome::Ready(path) => {
                        println!("Report successfully generated: {}", path.display())
                    }
                    ReportOutcome::NoData => println!("No data returned for {}", def.id),
                }
                Ok(())
            }
            None | Some(Commands::All) => {
                let source = self.source(&config)?;
                let runner = ReportRunner::new(source.as_ref(), config.property_id()?, Local::now().date_naive());
                let reports = builtin_reports(&config);

                let results = run_all(&runner, &reports, &config.output_dir);
                let mut failed = 0;
                for (id, status) in &results {
                    match status {
                        BatchStatus::Written(path) => {
                            println!("Report successfully generated: {}", path.display())
                        }
                        BatchStatus::NoData => println!("No data returned for {}", id),
                        BatchStatus::Failed(error) => {
                            failed += 1;
                            eprintln!("[gareport] {} failed: {}", id, error);
                        }
                    }
                }

                if failed > 0 {
                    bail!("{} of {} reports failed", failed, results.len());
                }
                Ok(())
            }
        }
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::load()?,
        };
        if let Some(property) = &self.property {
            config.property_id = Some(property.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }

    fn source(&self, config: &Config) -> anyhow::Result<Box<dyn ReportingSource>> {
        Ok(match &self.fixture {
            Some(path) => Box::new(
                FixtureSource::load(path)
                    .with_context(|| format!("failed to load fixture {}", path.display()))?,
            ),
            None => Box::new(DataApiSource::new(config)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::try_parse_from(["gareport"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::try_parse_from(["gareport", "run", "campaign"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Run { ref report, json: false }) if report == "campaign"
        ));
    }

    #[test]
    fn test_cli_parse_run_json() {
        let cli = Cli::try_parse_from(["gareport", "run", "overview", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run { json: true, .. })));
    }

    #[test]
    fn test_cli_parse_global_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gareport",
            "all",
            "--property",
            "280436820",
            "--output-dir",
            "out",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::All)));
        assert_eq!(cli.property.as_deref(), Some("280436820"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_cli_parse_run_requires_report() {
        assert!(Cli::try_parse_from(["gareport", "run"]).is_err());
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"property_id": "1", "output_dir": "a"}"#).unwrap();
        let path_arg = path.to_string_lossy().to_string();

        let cli = Cli::try_parse_from([
            "gareport",
            "--config",
            path_arg.as_str(),
            "--property",
            "2",
            "list",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.property_id().unwrap(), "2");
        assert_eq!(config.output_dir, PathBuf::from("a"));
    }
}
