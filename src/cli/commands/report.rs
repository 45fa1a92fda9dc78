//! `mrt report` command - Markdown report generation
//!
//! Reports aggregate across the whole project and print to stdout or a
//! file. They read only what is stored on disk; run the analyze commands
//! first if results are missing or stale.

use chrono::Local;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::analytics::calibration::Calibration;
use crate::analytics::pareto;
use crate::analytics::weibull::Distribution;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::entities::equipment::Equipment;
use crate::entities::failure::FailureEvent;
use crate::entities::reading::Reading;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Pareto breakdown of failure modes
    Pareto(ParetoArgs),

    /// Fleet condition summary
    Fleet(FleetArgs),

    /// Survival curve for one equipment
    Survival(SurvivalArgs),
}

#[derive(clap::Args, Debug)]
pub struct ParetoArgs {
    /// Restrict to one equipment (ID or EQP@N)
    #[arg(long, short = 'E')]
    pub equipment: Option<String>,

    /// Write to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct FleetArgs {
    /// Write to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct SurvivalArgs {
    /// Equipment ID or short ID (EQP@N)
    pub equipment: String,

    /// Horizon in operating hours
    #[arg(long, default_value = "87600")]
    pub horizon: f64,

    /// Number of curve points
    #[arg(long, default_value = "20")]
    pub points: usize,

    /// Write to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Run a report subcommand
pub fn run(cmd: ReportCommands) -> Result<()> {
    match cmd {
        ReportCommands::Pareto(args) => run_pareto(args),
        ReportCommands::Fleet(args) => run_fleet(args),
        ReportCommands::Survival(args) => run_survival(args),
    }
}

fn run_pareto(args: ParetoArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let flr_dir = project.root().join(Project::entity_directory(EntityPrefix::Flr));
    let mut failures: Vec<FailureEvent> = loader::load_all(&flr_dir)?;

    let mut scope = "all equipment".to_string();
    if let Some(ref reference) = args.equipment {
        let short_ids = ShortIdIndex::load(&project);
        let resolved = short_ids
            .resolve(EntityPrefix::Eqp, reference)
            .unwrap_or_else(|| reference.clone());
        failures.retain(|f| f.equipment.to_string().contains(&resolved));
        scope = resolved;
    }

    let modes: Vec<String> = failures.iter().map(|f| f.failure_mode.clone()).collect();
    let analysis = pareto::analyze(&modes);

    let mut content = String::new();
    content.push_str("# Failure Mode Pareto\n\n");
    content.push_str(&format!(
        "Generated: {}  \nScope: {}  \nTotal failures: {}\n\n",
        Local::now().format("%Y-%m-%d %H:%M"),
        scope,
        analysis.total_failures
    ));

    if analysis.modes.is_empty() {
        content.push_str("No failure events recorded.\n");
    } else {
        content.push_str("| Rank | Mode | Count | % | Cumulative % | |\n");
        content.push_str("|------|------|-------|---|--------------|---|\n");
        for (rank, mode) in analysis.modes.iter().enumerate() {
            let marker = if analysis.vital_few.contains(&mode.mode) {
                "vital few"
            } else {
                ""
            };
            content.push_str(&format!(
                "| {} | {} | {} | {:.1} | {:.1} | {} |\n",
                rank + 1,
                mode.mode,
                mode.count,
                mode.percentage,
                mode.cumulative_percentage,
                marker
            ));
        }
        content.push('\n');
        content.push_str(&format!(
            "**Vital few:** {} mode(s) account for 80% of failures: {}\n",
            analysis.vital_few.len(),
            analysis.vital_few.join(", ")
        ));
    }

    write_output(&content, args.output)
}

fn run_fleet(args: FleetArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let eqp_dir = project.root().join(Project::entity_directory(EntityPrefix::Eqp));
    let rdg_dir = project.root().join(Project::entity_directory(EntityPrefix::Rdg));
    let flr_dir = project.root().join(Project::entity_directory(EntityPrefix::Flr));

    let mut equipment: Vec<Equipment> = loader::load_all(&eqp_dir)?;
    let readings: Vec<Reading> = loader::load_all(&rdg_dir)?;
    let failures: Vec<FailureEvent> = loader::load_all(&flr_dir)?;

    // Worst health first; unanalyzed machines sort to the top
    equipment.sort_by(|a, b| {
        let ha = a.analysis_results.health.as_ref().map(|h| h.score);
        let hb = b.analysis_results.health.as_ref().map(|h| h.score);
        ha.partial_cmp(&hb).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut content = String::new();
    content.push_str("# Fleet Condition Summary\n\n");
    content.push_str(&format!(
        "Generated: {}  \nEquipment: {}  \nReadings: {}  \nFailure events: {}\n\n",
        Local::now().format("%Y-%m-%d %H:%M"),
        equipment.len(),
        readings.len(),
        failures.len()
    ));

    if equipment.is_empty() {
        content.push_str("No equipment registered.\n");
        return write_output(&content, args.output);
    }

    // Build table with tabled
    let mut builder = Builder::default();
    builder.push_record([
        "Tag", "Category", "Crit", "Health", "Zone", "Risk", "MTTF (h)", "Avail",
    ]);

    for eqp in &equipment {
        let results = &eqp.analysis_results;
        let health = results
            .health
            .as_ref()
            .map(|h| format!("{:.0} ({})", h.score, h.status))
            .unwrap_or_else(|| "-".to_string());
        let zone = latest_zone(eqp, &readings).unwrap_or_else(|| "-".to_string());
        let risk = results
            .risk
            .as_ref()
            .map(|r| r.level.to_string())
            .unwrap_or_else(|| "-".to_string());
        let mttf = results
            .weibull
            .as_ref()
            .map(|w| format!("{:.0}", w.mttf_hours))
            .unwrap_or_else(|| "-".to_string());
        let avail = results
            .availability
            .as_ref()
            .map(|a| format!("{:.2}%", a.availability * 100.0))
            .unwrap_or_else(|| "-".to_string());

        builder.push_record([
            eqp.tag.clone(),
            eqp.category.to_string(),
            eqp.criticality.to_string(),
            health,
            zone,
            risk,
            mttf,
            avail,
        ]);
    }
    content.push_str(&builder.build().with(Style::markdown()).to_string());
    content.push('\n');

    let overdue: Vec<&Equipment> = equipment
        .iter()
        .filter(|e| {
            e.analysis_results
                .maintenance
                .as_ref()
                .map(|m| m.days_until_due < 0)
                .unwrap_or(false)
        })
        .collect();
    if !overdue.is_empty() {
        content.push_str("\n## Overdue Maintenance\n\n");
        for eqp in overdue {
            if let Some(maintenance) = &eqp.analysis_results.maintenance {
                content.push_str(&format!(
                    "- **{}**: {} overdue by {} day(s) (due {})\n",
                    eqp.tag,
                    maintenance.maintenance_type,
                    -maintenance.days_until_due,
                    maintenance.next_due
                ));
            }
        }
    }

    write_output(&content, args.output)
}

fn run_survival(args: SurvivalArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let short_ids = ShortIdIndex::load(&project);
    let resolved = short_ids
        .resolve(EntityPrefix::Eqp, &args.equipment)
        .unwrap_or_else(|| args.equipment.clone());

    let eqp_dir = project.root().join(Project::entity_directory(EntityPrefix::Eqp));
    let (_, equipment) = loader::load_entity::<Equipment>(&eqp_dir, &resolved)?
        .ok_or_else(|| miette::miette!("No equipment found matching '{}'", args.equipment))?;

    let calibration = Calibration::load_or_shipped(&project.calibration_path())
        .map_err(|e| miette::miette!("{}", e))?;

    let lookup = equipment.weibull_lookup(&calibration);
    let dist = Distribution::new(lookup.params);
    let curve = dist.curve(args.horizon, args.points);

    let mut content = String::new();
    content.push_str(&format!("# Survival Curve: {}\n\n", equipment.tag));
    content.push_str(&format!(
        "Generated: {}  \nParameters: β={:.2}, η={:.0} h, γ={:.0} h{}  \nMTTF: {:.0} h  \nCurrent hours: {:.0}\n\n",
        Local::now().format("%Y-%m-%d %H:%M"),
        lookup.params.shape,
        lookup.params.scale,
        lookup.params.location,
        if lookup.used_fallback {
            " (fallback parameters)"
        } else {
            ""
        },
        dist.mttf(),
        equipment.operating_hours
    ));

    content.push_str("| Hours | R(t) | f(t) | h(t) |\n");
    content.push_str("|-------|------|------|------|\n");
    for point in &curve {
        content.push_str(&format!(
            "| {:.0} | {:.4} | {:.3e} | {:.3e} |\n",
            point.hours, point.reliability, point.failure_density, point.hazard_rate
        ));
    }

    content.push('\n');
    content.push_str(&format!(
        "B10 life: {:.0} h  \nB50 life: {:.0} h  \nB90 life: {:.0} h\n",
        dist.b10(),
        dist.b50(),
        dist.b90()
    ));

    write_output(&content, args.output)
}

// Helper functions

/// Severity zone of the most recent analyzed reading for one equipment
fn latest_zone(equipment: &Equipment, readings: &[Reading]) -> Option<String> {
    readings
        .iter()
        .filter(|r| r.equipment == equipment.id && r.analysis.is_some())
        .max_by_key(|r| r.taken_at)
        .and_then(|r| r.analysis.as_ref())
        .map(|a| a.zone.to_string())
}

fn write_output(content: &str, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(&path, content).into_diagnostic()?;
            println!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}
