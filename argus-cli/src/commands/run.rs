//! `argus run` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use argus_scenario::{Composer, SuiteReport, SuiteRun, SuiteRunner, TestStatus};

use crate::cli::RunArgs;
use crate::commands::{load_config, select_scenarios};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Reports are rendered before a failing run turns into an error.
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = Arc::new(load_config(config_path).await?);
    let descriptors = select_scenarios(&config, &args.scenarios)?;

    let catalog = argus_checks::catalog()?;
    let variants = Arc::new(argus_collaborators::builtin_registry()?);
    let suites = Composer::new(&catalog).compose_all(descriptors)?;

    let runs: Vec<SuiteRun> = suites
        .into_iter()
        .map(|suite| SuiteRun::new(suite, Arc::clone(&config), Arc::clone(&variants)))
        .collect();

    let runner = match args.filter {
        Some(pattern) => SuiteRunner::new().with_filter(pattern),
        None => SuiteRunner::new(),
    };
    info!(suites = runs.len(), parallel = args.parallel, "running scenarios");
    let suites = runner.run_many(runs, args.parallel).await;

    let report = RunReport::new(suites);
    writer.render(&report)?;

    if report.failed > 0 {
        return Err(CliError::SuitesFailed {
            failed: report.failed,
            total: report.suites.len(),
        });
    }
    Ok(())
}

/// Reports of every suite run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub suites: Vec<SuiteReport>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunReport {
    fn new(suites: Vec<SuiteReport>) -> Self {
        let skipped = suites.iter().filter(|s| s.skipped.is_some()).count();
        let failed = suites.iter().filter(|s| !s.is_success()).count();
        Self {
            passed: suites.len() - skipped - failed,
            failed,
            skipped,
            suites,
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for suite in &self.suites {
            if let Some(reason) = &suite.skipped {
                writeln!(w, "{} {} ({reason})", "SKIP".yellow(), suite.suite.bold())?;
                continue;
            }
            let verdict = if suite.is_success() {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            };
            writeln!(
                w,
                "{verdict} {} [{}] {} passed, {} failed, {} not run ({} ms)",
                suite.suite.bold(),
                suite.service_tag,
                suite.passed(),
                suite.failed(),
                suite.not_run(),
                suite.duration_ms,
            )?;
            if let Some(err) = &suite.setup_error {
                writeln!(w, "  setup: {}", err.red())?;
            }
            for test in &suite.tests {
                match &test.status {
                    TestStatus::Passed => writeln!(w, "  {} {}", "ok".green(), test.name)?,
                    TestStatus::Failed { message } => {
                        writeln!(w, "  {} {}: {message}", "FAILED".red(), test.name)?;
                    }
                    TestStatus::NotRun { reason } => {
                        writeln!(w, "  {} {}: {reason}", "not run".yellow(), test.name)?;
                    }
                }
            }
            if let Some(err) = &suite.cleanup_error {
                writeln!(w, "  cleanup: {}", err.red())?;
            }
        }
        writeln!(
            w,
            "\n{} passed, {} failed, {} skipped",
            self.passed, self.failed, self.skipped
        )
    }
}
