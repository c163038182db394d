//! negcase CLI - negative and boundary API test generation from OpenAPI contracts

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use negcase_core::dryrun::{self, DryRunPlan};
use negcase_core::{Config, RunSummary};
use negcase_runner::{Contract, Runner, load_contract, load_filter, write_reports};

#[derive(Parser)]
#[command(name = "negcase")]
#[command(about = "Negative, boundary and combinatorial API tests from OpenAPI contracts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every suite and execute it against the service
    Run {
        /// Config file (default: .negcase.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// JSON array of operation paths to test
        #[arg(long)]
        filter_file: Option<PathBuf>,

        /// CSV report path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Concurrent requests
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Stop on first failed variant
        #[arg(long)]
        stop_on_failure: bool,

        /// Max variants executed per operation
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show generated variant counts without sending requests
    Plan {
        /// Config file (default: .negcase.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// JSON array of operation paths to include
        #[arg(long)]
        filter_file: Option<PathBuf>,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema of a report row
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "negcase=debug" } else { "negcase=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    Ok(config)
}

/// Load the contract and apply the filter file, if any.
fn load_selected(config: &Config) -> Result<(Contract, Option<Vec<String>>)> {
    let contract = load_contract(config)
        .with_context(|| format!("loading contract {}", config.spec.display()))?;
    let filter = config.filter_file.as_deref().map(load_filter).transpose()?;
    let contract = match &filter {
        Some(paths) => contract.filtered(paths),
        None => contract,
    };
    Ok((contract, filter))
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            filter_file,
            report,
            concurrency,
            stop_on_failure,
            limit,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if filter_file.is_some() {
                cfg.filter_file = filter_file;
            }
            if let Some(report) = report {
                cfg.report = report;
            }
            if let Some(concurrency) = concurrency {
                cfg.concurrency = concurrency;
            }

            let (contract, _) = load_selected(&cfg)?;
            tracing::info!(
                base_url = %contract.base_url,
                operations = contract.operations.len(),
                "contract loaded"
            );
            if contract.operations.is_empty() {
                anyhow::bail!("No operations selected. Check the contract paths and filter file.");
            }

            let runner = Runner::from_config(&cfg)?
                .with_stop_on_failure(stop_on_failure)
                .with_limit(limit);

            let started = Instant::now();
            let output = runner.run(&contract);
            let duration_secs = started.elapsed().as_secs_f64();

            if output.rows.is_empty() {
                anyhow::bail!("No variants were executed.");
            }

            let http = write_reports(&cfg.report, &output.rows)?;
            let summary = RunSummary::from_rows(&output.rows);

            match cli.output {
                OutputFormat::Terminal => {
                    println!("{}", summary.to_terminal());
                    if output.skipped > 0 {
                        println!("  Stopped early: {} variants not executed", output.skipped);
                    }
                    println!("  Duration: {duration_secs:.1}s");
                    println!("Report: {}", cfg.report.display());
                    if let Some(path) = &http {
                        println!("Reproductions: {}", path.display());
                    }
                }
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "summary": summary,
                        "skipped": output.skipped,
                        "duration_secs": duration_secs,
                        "report": cfg.report,
                        "rows": output.rows,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Silent => {}
            }

            Ok(summary.exit_code())
        }

        Commands::Plan {
            config,
            filter_file,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if filter_file.is_some() {
                cfg.filter_file = filter_file;
            }

            let (contract, filter) = load_selected(&cfg)?;
            let mut validations = dryrun::validate_config(&cfg);
            validations.extend(dryrun::validate_operations(
                &contract.operations,
                &cfg,
                filter.as_deref(),
            ));
            let plan = DryRunPlan::build(&contract.operations, &cfg, validations);

            match cli.output {
                OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                OutputFormat::Silent => {}
            }
            Ok(i32::from(plan.has_errors()))
        }

        Commands::Init => {
            let config_path = ".negcase.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - spec: path to your OpenAPI contract");
            println!("  - headers: auth tokens sent with every request");
            println!("  - path_params: entity IDs for path and query parameters");
            println!("  - mandatory_headers: headers the service must reject when missing");
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", negcase_core::report::generate_schema()?);
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_overrides() {
        let cli = Cli::try_parse_from([
            "negcase",
            "run",
            "--filter-file",
            "paths.json",
            "-j",
            "8",
            "--stop-on-failure",
            "--limit",
            "5",
            "--output",
            "json",
        ])
        .unwrap();

        assert!(cli.output == OutputFormat::Json);
        match cli.command {
            Commands::Run {
                filter_file,
                concurrency,
                stop_on_failure,
                limit,
                ..
            } => {
                assert_eq!(filter_file, Some(PathBuf::from("paths.json")));
                assert_eq!(concurrency, Some(8));
                assert!(stop_on_failure);
                assert_eq!(limit, Some(5));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn plan_accepts_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["negcase", "plan", "-v", "--output", "silent"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.output == OutputFormat::Silent);
    }

    #[test]
    fn plan_counts_selected_operations() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("api.json");
        std::fs::write(
            &spec,
            r#"{"servers":[{"url":"http://localhost"}],"paths":{
                "/a":{"get":{"responses":{"200":{}}}},
                "/b":{"delete":{"responses":{"204":{}}}}}}"#,
        )
        .unwrap();
        let filter = dir.path().join("paths.json");
        std::fs::write(&filter, r#"["/b", "/missing"]"#).unwrap();

        let cfg = Config {
            spec,
            filter_file: Some(filter),
            ..Config::default()
        };
        let (contract, filter) = load_selected(&cfg).unwrap();
        assert_eq!(contract.operations.len(), 1);

        let validations = dryrun::validate_operations(&contract.operations, &cfg, filter.as_deref());
        assert!(validations.iter().any(|v| v.message.contains("'/missing'")));
    }
}
