//! CLI command handling
//!
//! Dispatches CLI commands and formats their output.

use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::cases::{load_cases, CaseRecord};
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::runner::{run_file, CaseOutcome, RunReport};
use crate::verdict::Verdict;

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when the command ran but some case failed.
pub async fn dispatch(command: Commands, config: &Config, config_path: Option<&Path>) -> Result<bool> {
    match command {
        Commands::Run {
            path,
            json,
            verbose,
        } => {
            let sources = case_sources(path, config)?;
            let mut reports = Vec::with_capacity(sources.len());

            for source in &sources {
                if !json {
                    println!(
                        "\n{} {} {}",
                        "Running:".blue().bold(),
                        source.display().to_string().white().bold(),
                        format!("[{}]", config.environment.name).dimmed()
                    );
                }
                let report = run_file(source, config, |outcome| {
                    if !json {
                        print_outcome(outcome, verbose);
                    }
                })
                .await?;
                if !json {
                    print_summary(&report);
                }
                reports.push(report);
            }

            if json {
                let value = if reports.len() == 1 {
                    serde_json::to_string_pretty(&reports[0])?
                } else {
                    serde_json::to_string_pretty(&reports)?
                };
                println!("{}", value);
            }

            Ok(reports.iter().all(RunReport::is_success))
        }

        Commands::List { path, json } => {
            let sources = case_sources(path, config)?;
            let mut all = Vec::new();
            for source in &sources {
                let cases = load_cases(source, config)?;
                if !json {
                    println!("{}", source.display().to_string().white().bold());
                    for case in &cases {
                        print_case(case);
                    }
                    if cases.is_empty() {
                        println!("  {}", "(no cases)".dimmed());
                    }
                }
                all.extend(cases);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            }
            Ok(true)
        }

        Commands::Config => {
            print_config(config, config_path);
            Ok(true)
        }
    }
}

/// Case files to use: the explicit path, or every source named in the config
fn case_sources(path: Option<PathBuf>, config: &Config) -> Result<Vec<PathBuf>> {
    if let Some(path) = path {
        return Ok(vec![path]);
    }
    let sources: Vec<PathBuf> = [&config.cases.table, &config.cases.document]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    if sources.is_empty() {
        return Err(Error::Config(
            "No case file given. Pass a path or set [cases] table/document in the config".to_string(),
        ));
    }
    Ok(sources)
}

fn print_outcome(outcome: &CaseOutcome, verbose: bool) {
    let elapsed = outcome
        .response
        .as_ref()
        .map(|r| format!("{:.2}s", r.elapsed_seconds))
        .unwrap_or_default();

    let (mark, name) = match outcome.verdict() {
        Verdict::Pass => ("✓".green(), outcome.name().normal()),
        Verdict::Fail => ("✗".red(), outcome.name().red()),
        Verdict::Skip => ("-".magenta(), outcome.name().dimmed()),
    };
    println!(
        "  {} {} {} {}",
        mark,
        name,
        format!("(row {})", outcome.row_index).dimmed(),
        elapsed.dimmed()
    );

    if outcome.verdict() == Verdict::Fail {
        if verbose {
            println!(
                "      {} {}",
                outcome.request.method.dimmed(),
                outcome.request.url.dimmed()
            );
        }
        for mismatch in &outcome.mismatches {
            println!("      {}", mismatch.to_string().dimmed());
        }
        if let Some(fault) = &outcome.fault {
            println!("      {}", fault.red());
        }
        if verbose {
            println!("      response: {}", outcome.record.response_text.dimmed());
        }
    }

    if let Some(error) = &outcome.write_error {
        println!("      {} {}", "warning:".yellow(), error);
    }
}

fn print_summary(report: &RunReport) {
    let s = &report.summary;
    let status = if report.is_success() {
        "PASSED".green().bold()
    } else {
        "FAILED".red().bold()
    };
    println!(
        "\n{} {} total, {} passed, {} failed, {} skipped ({:.2}% success) in {:.2}s",
        status,
        s.total,
        s.passed.to_string().green(),
        s.failed.to_string().red(),
        s.skipped.to_string().magenta(),
        s.success_rate,
        s.duration_secs
    );

    let write_errors = report.write_errors().count();
    if write_errors > 0 {
        println!(
            "{} {} result(s) could not be written back to {}",
            "warning:".yellow(),
            write_errors,
            report.source
        );
    }
}

fn print_case(case: &CaseRecord) {
    let run = if case.should_run() {
        "run".green()
    } else {
        "skip".magenta()
    };
    let auth = if case.needs_auth() { " auth" } else { "" };
    println!(
        "  {:>4} {} {:<6} {} {} {}",
        case.row_index,
        run,
        case.request.method,
        case.name.white().bold(),
        case.request.url.dimmed(),
        format!("[{}{}]", case.request.payload_mode, auth).dimmed()
    );
}

fn print_config(config: &Config, config_path: Option<&Path>) {
    match config_path {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} {}", path.display(), "(not found, using defaults)".dimmed()),
        None => println!("Config file: {}", "(no config directory)".dimmed()),
    }

    let env = &config.environment;
    println!("\n{}", "[environment]".cyan());
    println!("  name   = {}", env.name);
    println!("  host   = {}", display_or_unset(&env.host));
    println!("  token  = {}", mask(&env.token));
    if let Some(tester) = &env.tester {
        println!("  tester = {}", tester);
    }

    println!("\n{}", "[request]".cyan());
    println!("  timeout_secs = {}", config.request.timeout_secs);
    println!("  user_agent   = {}", config.request.user_agent);
    for (name, value) in &config.request.default_headers {
        println!("  header       = {}: {}", name, value);
    }

    println!("\n{}", "[cases]".cyan());
    println!("  table       = {}", display_path(config.cases.table.as_deref()));
    println!("  document    = {}", display_path(config.cases.document.as_deref()));
    println!("  header_rows = {}", config.cases.header_rows);

    println!("\n{}", "[logging]".cyan());
    println!("  dir = {}", display_path(config.logging.dir.as_deref()));
}

fn display_or_unset(value: &str) -> String {
    if value.is_empty() {
        "(unset)".to_string()
    } else {
        value.to_string()
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unset)".to_string())
}

/// Hide all but the last four characters of a secret
fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return "(unset)".to_string();
    }
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}
