//! `argus list` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use argus_scenario::{Composer, RunnableSuite};

use crate::cli::ListArgs;
use crate::commands::{load_config, select_scenarios};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
pub async fn execute(
    args: ListArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let descriptors = select_scenarios(&config, &args.scenarios)?;

    let catalog = argus_checks::catalog()?;
    let suites = Composer::new(&catalog).compose_all(descriptors)?;
    info!(suites = suites.len(), "scenarios composed");

    let report = ListReport {
        scenarios: suites.iter().map(ScenarioListing::from_suite).collect(),
    };
    writer.render(&report)?;
    Ok(())
}

/// Composed scenarios.
#[derive(Debug, Serialize)]
pub struct ListReport {
    pub scenarios: Vec<ScenarioListing>,
}

/// One composed scenario.
#[derive(Debug, Serialize)]
pub struct ScenarioListing {
    pub name: String,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub backend: Option<String>,
    pub introspection: Option<String>,
    pub recipe: Option<String>,
    pub service_tag: String,
    pub test_groups: Vec<String>,
    pub tests: Vec<TestListing>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// One bound test.
#[derive(Debug, Serialize)]
pub struct TestListing {
    pub name: String,
    pub origin: String,
}

impl ScenarioListing {
    fn from_suite(suite: &RunnableSuite) -> Self {
        let d = suite.descriptor();
        Self {
            name: suite.name().to_owned(),
            is_abstract: suite.is_abstract(),
            backend: d.backend.clone(),
            introspection: d.introspection.clone(),
            recipe: d.recipe.clone(),
            service_tag: d.service_tag.clone(),
            test_groups: d.test_groups.clone(),
            tests: suite
                .tests()
                .map(|t| TestListing {
                    name: t.name().to_owned(),
                    origin: t.origin().to_string(),
                })
                .collect(),
            diagnostics: suite.diagnostics().to_vec(),
        }
    }
}

impl Render for ListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for scenario in &self.scenarios {
            if scenario.is_abstract {
                writeln!(w, "{} {}", scenario.name.bold(), "(abstract)".dimmed())?;
            } else {
                writeln!(
                    w,
                    "{} [{}] backend={} introspection={} recipe={}",
                    scenario.name.bold(),
                    scenario.service_tag,
                    scenario.backend.as_deref().unwrap_or("-"),
                    scenario.introspection.as_deref().unwrap_or("-"),
                    scenario.recipe.as_deref().unwrap_or("-"),
                )?;
            }
            for test in &scenario.tests {
                writeln!(w, "  {:<40} {}", test.name, test.origin.dimmed())?;
            }
            for note in &scenario.diagnostics {
                writeln!(w, "  {}", note.yellow())?;
            }
        }
        Ok(())
    }
}
