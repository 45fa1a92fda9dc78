//! `mrt calib` command - Calibration data management
//!
//! Every analysis result carries a stamp (version + digest) of the
//! calibration it ran with. This command shows which calibration is
//! active, whether stored results are stale against it, and resets a
//! project copy back to the shipped defaults.

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::analytics::calibration::Calibration;
use crate::core::identity::EntityPrefix;
use crate::core::project::Project;
use crate::entities::equipment::Equipment;
use crate::entities::reading::Reading;

#[derive(clap::Subcommand, Debug)]
pub enum CalibCommands {
    /// Print the active calibration data
    Show,

    /// Show calibration version, digest and staleness
    Status,

    /// Replace the project calibration with the shipped defaults
    Reset(ResetArgs),
}

#[derive(clap::Args, Debug)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Run a calibration subcommand
pub fn run(cmd: CalibCommands) -> Result<()> {
    match cmd {
        CalibCommands::Show => run_show(),
        CalibCommands::Status => run_status(),
        CalibCommands::Reset(args) => run_reset(args),
    }
}

fn run_show() -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let path = project.calibration_path();

    if path.exists() {
        // Print the file as-is; comments and ordering survive
        let content = fs::read_to_string(&path).into_diagnostic()?;
        print!("{}", content);
    } else {
        let calibration = Calibration::shipped().map_err(|e| miette::miette!("{}", e))?;
        let yaml = serde_yml::to_string(&calibration).into_diagnostic()?;
        print!("{}", yaml);
        eprintln!();
        eprintln!(
            "{} No project calibration at {}; showing shipped defaults",
            style("!").yellow(),
            style(path.display()).dim()
        );
    }

    Ok(())
}

fn run_status() -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let path = project.calibration_path();

    let calibration =
        Calibration::load_or_shipped(&path).map_err(|e| miette::miette!("{}", e))?;
    let source = if path.exists() {
        format!("{}", path.display())
    } else {
        "shipped defaults".to_string()
    };

    println!("{}", style("Calibration").cyan().bold());
    println!("  Version:       {}", style(&calibration.version).white());
    println!("  Calibrated:    {}", calibration.calibrated_at);
    println!("  Digest:        {}", style(calibration.digest()).dim());
    println!("  Source:        {}", source);
    println!(
        "  Weibull rows:  {} (+ default)",
        calibration.weibull.entries.len()
    );
    println!("  Rate rows:     {}", calibration.base_failure_rates.len());

    match calibration.validate() {
        Ok(()) => println!("  Consistency:   {}", style("ok").green()),
        Err(e) => println!("  Consistency:   {} {}", style("invalid").red(), e),
    }

    // Count stored results stamped with a different calibration
    let stamp = calibration.stamp();
    let mut stale_readings = 0usize;
    let mut stale_equipment = 0usize;

    for file in project.iter_entity_files(EntityPrefix::Rdg) {
        let Ok(content) = fs::read_to_string(&file) else { continue };
        let Ok(reading) = serde_yml::from_str::<Reading>(&content) else { continue };
        if let Some(analysis) = reading.analysis {
            if analysis.calibration != stamp {
                stale_readings += 1;
            }
        }
    }
    for file in project.iter_entity_files(EntityPrefix::Eqp) {
        let Ok(content) = fs::read_to_string(&file) else { continue };
        let Ok(equipment) = serde_yml::from_str::<Equipment>(&content) else { continue };
        if let Some(weibull) = equipment.analysis_results.weibull {
            if weibull.calibration != stamp {
                stale_equipment += 1;
            }
        }
    }

    println!();
    if stale_readings == 0 && stale_equipment == 0 {
        println!(
            "{} All stored analysis results match this calibration",
            style("✓").green()
        );
    } else {
        println!(
            "{} {} reading(s) and {} equipment record(s) carry stale results",
            style("!").yellow(),
            stale_readings,
            stale_equipment
        );
        println!(
            "   Run {} and {} to refresh them",
            style("mrt rdg analyze --all --force").cyan(),
            style("mrt eqp analyze --all").cyan()
        );
    }

    Ok(())
}

fn run_reset(args: ResetArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let path = project.calibration_path();

    if !args.force {
        let prompt = if path.exists() {
            format!("Overwrite {} with the shipped defaults?", path.display())
        } else {
            format!("Write shipped defaults to {}?", path.display())
        };
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let calibration = Calibration::shipped().map_err(|e| miette::miette!("{}", e))?;
    calibration
        .write(&path)
        .map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Wrote calibration {} to {}",
        style("✓").green(),
        style(&calibration.version).cyan(),
        style(path.display()).dim()
    );
    println!(
        "   Stored analysis results may now be stale; see {}",
        style("mrt calib status").cyan()
    );

    Ok(())
}
