//! `mrt flr` command - Failure event management
//!
//! Failure events feed the Weibull fitting (`eqp fit`), availability
//! figures and the Pareto report. `flr new` ties an event to an existing
//! equipment record.

use chrono::{Local, NaiveDate};
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::format_hours;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::OutputFormat;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::equipment::Equipment;
use crate::entities::failure::{FailureEvent, Resolution};
use crate::schema::template::{TemplateContext, TemplateGenerator};
use crate::schema::wizard::SchemaWizard;
use crate::yaml::write_yaml_file;

#[derive(Subcommand, Debug)]
pub enum FlrCommands {
    /// List failure events with filtering
    List(ListArgs),

    /// Record a new failure event
    New(NewArgs),

    /// Show a failure event's details
    Show(ShowArgs),

    /// Edit a failure event in your editor
    Edit(EditArgs),

    /// Mark a failure event resolved
    Resolve(ResolveArgs),
}

/// Resolution filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ResolutionFilter {
    Open,
    Resolved,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Occurred,
    Hours,
    Mode,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by equipment ID or short ID (EQP@N)
    #[arg(long, short = 'E')]
    pub equipment: Option<String>,

    /// Filter by failure mode (substring match)
    #[arg(long, short = 'm')]
    pub mode: Option<String>,

    /// Filter by resolution state
    #[arg(long, default_value = "all")]
    pub resolution: ResolutionFilter,

    /// Sort by field
    #[arg(long, default_value = "occurred")]
    pub sort: SortField,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "auto")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Equipment ID or short ID (EQP@N)
    pub equipment: String,

    /// Failure mode (e.g., bearing-seizure)
    #[arg(long, short = 'm')]
    pub mode: Option<String>,

    /// Date the failure occurred (YYYY-MM-DD, default today)
    #[arg(long)]
    pub occurred: Option<NaiveDate>,

    /// Operating hours on the machine when it failed
    #[arg(long)]
    pub hours: Option<f64>,

    /// Downtime caused by the failure, hours
    #[arg(long)]
    pub downtime: Option<f64>,

    /// Use the interactive wizard
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Skip opening the editor
    #[arg(long)]
    pub no_edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Failure event ID or short ID (FLR@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Failure event ID or short ID (FLR@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Failure event ID or short ID (FLR@N)
    pub id: String,
}

/// Run a failure subcommand
pub fn run(cmd: FlrCommands) -> Result<()> {
    match cmd {
        FlrCommands::List(args) => run_list(args),
        FlrCommands::New(args) => run_new(args),
        FlrCommands::Show(args) => run_show(args),
        FlrCommands::Edit(args) => run_edit(args),
        FlrCommands::Resolve(args) => run_resolve(args),
    }
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("equipment", "EQUIPMENT", 17),
    ColumnDef::new("occurred", "OCCURRED", 12),
    ColumnDef::new("mode", "MODE", 22),
    ColumnDef::new("hours", "HOURS", 10),
    ColumnDef::new("downtime", "DOWNTIME", 10),
    ColumnDef::new("resolution", "STATE", 10),
];

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let flr_dir = project.root().join(Project::entity_directory(EntityPrefix::Flr));

    let mut failures: Vec<FailureEvent> = loader::load_all(&flr_dir)?;

    // Apply filters
    if let Some(ref reference) = args.equipment {
        let short_ids = ShortIdIndex::load(&project);
        let resolved = short_ids
            .resolve(EntityPrefix::Eqp, reference)
            .unwrap_or_else(|| reference.clone());
        failures.retain(|f| f.equipment.to_string().contains(&resolved));
    }
    if let Some(ref mode) = args.mode {
        let needle = mode.to_lowercase();
        failures.retain(|f| f.failure_mode.to_lowercase().contains(&needle));
    }
    failures.retain(|f| match args.resolution {
        ResolutionFilter::Open => f.resolution == Resolution::Open,
        ResolutionFilter::Resolved => f.resolution == Resolution::Resolved,
        ResolutionFilter::All => true,
    });

    // Sort
    match args.sort {
        SortField::Occurred => failures.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at)),
        SortField::Hours => failures.sort_by(|a, b| {
            a.hours_at_failure
                .partial_cmp(&b.hours_at_failure)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortField::Mode => failures.sort_by(|a, b| a.failure_mode.cmp(&b.failure_mode)),
        SortField::Created => failures.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        failures.reverse();
    }

    if let Some(limit) = args.limit {
        failures.truncate(limit);
    }

    if args.count {
        println!("{}", failures.len());
        return Ok(());
    }

    if failures.is_empty() {
        println!("No failure events found.");
        return Ok(());
    }

    // Update short ID index
    let mut short_ids = ShortIdIndex::load(&project);
    for f in &failures {
        short_ids.add(&f.id.to_string());
    }
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&failures).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&failures).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let rows = failures.iter().map(|f| {
                TableRow::new(f.id.to_string(), &short_ids)
                    .cell("id", CellValue::Id(f.id.to_string()))
                    .cell("equipment", CellValue::Id(f.equipment.to_string()))
                    .cell("occurred", CellValue::Day(f.occurred_at))
                    .cell("mode", CellValue::Text(f.failure_mode.clone()))
                    .cell("hours", CellValue::Float(f.hours_at_failure, 1))
                    .cell("downtime", CellValue::OptionalFloat(f.downtime_hours, 1))
                    .cell("resolution", CellValue::Text(f.resolution.to_string()))
            });

            TableFormatter::new(LIST_COLUMNS, "failure event", "FLR").output(
                rows,
                format,
                &[
                    "id",
                    "equipment",
                    "occurred",
                    "mode",
                    "hours",
                    "downtime",
                    "resolution",
                ],
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    // The equipment must exist; its real ID goes into the event
    let (_, equipment) = find_equipment(&project, &args.equipment)?;

    let id = EntityId::new(EntityPrefix::Flr);
    let generator = TemplateGenerator::new().map_err(|e| miette::miette!("{}", e))?;

    let mut ctx = TemplateContext::new(id.clone(), config.author())
        .with_equipment(equipment.id.clone());

    let mode: String;
    let hours: f64;

    if args.interactive || args.mode.is_none() || args.hours.is_none() {
        // Schema-driven wizard
        let wizard = SchemaWizard::new();
        let result = wizard.run(EntityPrefix::Flr)?;

        mode = result
            .get_string("failure_mode")
            .map(str::to_string)
            .or(args.mode)
            .ok_or_else(|| miette::miette!("Failure mode is required (use --mode or -m)"))?;
        hours = result
            .get_f64("hours_at_failure")
            .or(args.hours)
            .ok_or_else(|| miette::miette!("Hours at failure are required (use --hours)"))?;

        if let Some(occurred) = result
            .get_string("occurred_at")
            .and_then(|s| s.parse::<NaiveDate>().ok())
            .or(args.occurred)
        {
            ctx = ctx.with_occurred_at(occurred);
        } else {
            ctx = ctx.with_occurred_at(Local::now().date_naive());
        }
        if let Some(downtime) = result.get_f64("downtime_hours").or(args.downtime) {
            ctx = ctx.with_downtime_hours(downtime);
        }
    } else {
        mode = args.mode.unwrap();
        hours = args.hours.unwrap();

        ctx = ctx.with_occurred_at(args.occurred.unwrap_or_else(|| Local::now().date_naive()));
        if let Some(downtime) = args.downtime {
            ctx = ctx.with_downtime_hours(downtime);
        }
    }

    if !hours.is_finite() || hours < 0.0 {
        return Err(miette::miette!(
            "Hours at failure must be a non-negative number (got {})",
            hours
        ));
    }

    ctx = ctx.with_failure_mode(&mode).with_hours_at_failure(hours);

    let yaml_content = generator
        .generate_failure(&ctx)
        .map_err(|e| miette::miette!("{}", e))?;

    let file_path = project.entity_path(EntityPrefix::Flr, &id);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(&file_path, &yaml_content).into_diagnostic()?;

    // Add to short ID index
    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(&id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Recorded failure {}",
        style("✓").green(),
        style(format!("FLR@{}", short_id)).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!(
        "   {} | {} | {}",
        style(&equipment.tag).yellow(),
        style(&mode).magenta(),
        style(format_hours(hours)).white()
    );
    println!(
        "   Run {} to refresh the Weibull fit",
        style("mrt eqp fit").cyan()
    );

    if args.edit || (!args.no_edit && !args.interactive) {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&file_path).into_diagnostic()?;
    }

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _) = find_failure(&project, &args.id)?;

    let content = fs::read_to_string(&path).into_diagnostic()?;

    match args.format {
        OutputFormat::Json => {
            let failure: FailureEvent = serde_yml::from_str(&content).into_diagnostic()?;
            let json = serde_json::to_string_pretty(&failure).into_diagnostic()?;
            println!("{}", json);
        }
        _ => {
            print!("{}", content);
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();
    let (path, _) = find_failure(&project, &args.id)?;

    println!(
        "Opening {} in {}...",
        style(path.display()).cyan(),
        style(config.editor()).yellow()
    );

    config.run_editor(&path).into_diagnostic()?;

    Ok(())
}

fn run_resolve(args: ResolveArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut failure) = find_failure(&project, &args.id)?;

    if failure.resolution == Resolution::Resolved {
        println!(
            "{} {} is already resolved",
            style("!").yellow(),
            style(failure.id.to_string()).cyan()
        );
        return Ok(());
    }

    failure.resolution = Resolution::Resolved;
    failure.entity_revision += 1;
    write_yaml_file(&path, &failure).map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Resolved {} ({})",
        style("✓").green(),
        style(failure.id.to_string()).cyan(),
        failure.failure_mode
    );

    Ok(())
}

// Helper functions

fn find_failure(project: &Project, reference: &str) -> Result<(PathBuf, FailureEvent)> {
    let short_ids = ShortIdIndex::load(project);
    let resolved = short_ids
        .resolve(EntityPrefix::Flr, reference)
        .unwrap_or_else(|| reference.to_string());

    let flr_dir = project.root().join(Project::entity_directory(EntityPrefix::Flr));
    loader::load_entity::<FailureEvent>(&flr_dir, &resolved)?
        .ok_or_else(|| miette::miette!("No failure event found matching '{}'", reference))
}

fn find_equipment(project: &Project, reference: &str) -> Result<(PathBuf, Equipment)> {
    let short_ids = ShortIdIndex::load(project);
    let resolved = short_ids
        .resolve(EntityPrefix::Eqp, reference)
        .unwrap_or_else(|| reference.to_string());

    let eqp_dir = project.root().join(Project::entity_directory(EntityPrefix::Eqp));
    loader::load_entity::<Equipment>(&eqp_dir, &resolved)?
        .ok_or_else(|| miette::miette!("No equipment found matching '{}'", reference))
}
