//! `mrt eqp` command - Equipment management
//!
//! Equipment carries nameplate data plus the stored analysis block.
//! `analyze`, `simulate` and `fit` recompute that block and write the
//! entity back, so results live in the YAML under version control.

use chrono::Local;
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::analytics::calibration::Calibration;
use crate::analytics::weibull::WeibullFit;
use crate::cli::helpers::format_short_id;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{Criticality, Status};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::equipment::{Category, Environment, Equipment};
use crate::entities::failure::FailureEvent;
use crate::entities::reading::Reading;
use crate::schema::template::{TemplateContext, TemplateGenerator};
use crate::schema::wizard::SchemaWizard;
use crate::yaml::write_yaml_file;

#[derive(Subcommand, Debug)]
pub enum EqpCommands {
    /// List equipment with filtering
    List(ListArgs),

    /// Register a new equipment
    New(NewArgs),

    /// Show an equipment's details
    Show(ShowArgs),

    /// Edit an equipment in your editor
    Edit(EditArgs),

    /// Run reliability analysis and store the results
    Analyze(AnalyzeArgs),

    /// Monte Carlo life simulation
    Simulate(SimulateArgs),

    /// Estimate Weibull parameters from recorded failures
    Fit(FitArgs),
}

/// Category filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryFilter {
    Pump,
    Motor,
    Compressor,
    Valve,
    All,
}

/// Operational status filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusFilter {
    Active,
    Standby,
    Maintenance,
    Decommissioned,
    All,
}

/// Criticality filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CriticalityFilter {
    Low,
    Medium,
    High,
    Critical,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    Tag,
    Title,
    Category,
    Criticality,
    Hours,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by category
    #[arg(long, short = 'c', default_value = "all")]
    pub category: CategoryFilter,

    /// Filter by operational status
    #[arg(long, default_value = "all")]
    pub eqp_status: StatusFilter,

    /// Filter by criticality
    #[arg(long, short = 'C', default_value = "all")]
    pub criticality: CriticalityFilter,

    /// Search in tag, title and location
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by field
    #[arg(long, default_value = "tag")]
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
    /// Equipment tag (e.g., P-101A)
    #[arg(long, short = 't')]
    pub tag: Option<String>,

    /// Equipment title
    #[arg(long, short = 'T')]
    pub title: Option<String>,

    /// Category (pump, motor, compressor, valve)
    #[arg(long, short = 'c', default_value = "pump")]
    pub category: String,

    /// Subtype for base-rate lookup (e.g., centrifugal)
    #[arg(long)]
    pub subtype: Option<String>,

    /// Manufacturer name
    #[arg(long, short = 'm')]
    pub manufacturer: Option<String>,

    /// Model designation
    #[arg(long)]
    pub model: Option<String>,

    /// Physical location
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    /// Criticality (low, medium, high, critical)
    #[arg(long, short = 'C', default_value = "medium")]
    pub criticality: String,

    /// Environment (onshore, offshore, harsh)
    #[arg(long, short = 'E', default_value = "onshore")]
    pub environment: String,

    /// Cumulative operating hours
    #[arg(long)]
    pub operating_hours: Option<f64>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Skip opening in editor
    #[arg(long)]
    pub no_edit: bool,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Equipment ID or short ID (EQP@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Equipment ID or short ID (EQP@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Equipment ID or short ID (EQP@N)
    pub id: Option<String>,

    /// Analyze all equipment
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(clap::Args, Debug)]
pub struct SimulateArgs {
    /// Equipment ID or short ID (EQP@N)
    pub id: String,

    /// Number of Monte Carlo samples
    #[arg(long, short = 'n', default_value = "10000")]
    pub samples: usize,

    /// Random seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub struct FitArgs {
    /// Equipment ID or short ID (EQP@N)
    pub id: String,

    /// Use the fitted parameters for later analyses
    #[arg(long)]
    pub apply: bool,
}

/// Run an equipment subcommand
pub fn run(cmd: EqpCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EqpCommands::List(args) => run_list(args),
        EqpCommands::New(args) => run_new(args),
        EqpCommands::Show(args) => run_show(args),
        EqpCommands::Edit(args) => run_edit(args),
        EqpCommands::Analyze(args) => run_analyze(args, global),
        EqpCommands::Simulate(args) => run_simulate(args, global),
        EqpCommands::Fit(args) => run_fit(args, global),
    }
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("tag", "TAG", 12),
    ColumnDef::new("title", "TITLE", 28),
    ColumnDef::new("category", "CATEGORY", 12),
    ColumnDef::new("crit", "CRIT", 10),
    ColumnDef::new("hours", "HOURS", 10),
    ColumnDef::new("health", "HEALTH", 11),
    ColumnDef::new("status", "STATUS", 16),
];

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let eqp_dir = project.root().join(Project::entity_directory(EntityPrefix::Eqp));

    let mut equipment: Vec<Equipment> = loader::load_all(&eqp_dir)?;

    // Apply filters
    equipment.retain(|e| match args.category {
        CategoryFilter::Pump => e.category == Category::Pump,
        CategoryFilter::Motor => e.category == Category::Motor,
        CategoryFilter::Compressor => e.category == Category::Compressor,
        CategoryFilter::Valve => e.category == Category::Valve,
        CategoryFilter::All => true,
    });
    equipment.retain(|e| match args.eqp_status {
        StatusFilter::Active => e.status == Status::Active,
        StatusFilter::Standby => e.status == Status::Standby,
        StatusFilter::Maintenance => e.status == Status::Maintenance,
        StatusFilter::Decommissioned => e.status == Status::Decommissioned,
        StatusFilter::All => true,
    });
    equipment.retain(|e| match args.criticality {
        CriticalityFilter::Low => e.criticality == Criticality::Low,
        CriticalityFilter::Medium => e.criticality == Criticality::Medium,
        CriticalityFilter::High => e.criticality == Criticality::High,
        CriticalityFilter::Critical => e.criticality == Criticality::Critical,
        CriticalityFilter::All => true,
    });
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        equipment.retain(|e| {
            e.tag.to_lowercase().contains(&needle)
                || e.title.to_lowercase().contains(&needle)
                || e.location
                    .as_ref()
                    .is_some_and(|l| l.to_lowercase().contains(&needle))
        });
    }

    // Sort
    match args.sort {
        SortField::Tag => equipment.sort_by(|a, b| a.tag.cmp(&b.tag)),
        SortField::Title => equipment.sort_by(|a, b| a.title.cmp(&b.title)),
        SortField::Category => {
            equipment.sort_by(|a, b| a.category.as_str().cmp(b.category.as_str()))
        }
        SortField::Criticality => equipment.sort_by(|a, b| a.criticality.cmp(&b.criticality)),
        SortField::Hours => equipment.sort_by(|a, b| {
            a.operating_hours
                .partial_cmp(&b.operating_hours)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortField::Created => equipment.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        equipment.reverse();
    }

    if let Some(limit) = args.limit {
        equipment.truncate(limit);
    }

    if args.count {
        println!("{}", equipment.len());
        return Ok(());
    }

    if equipment.is_empty() {
        println!("No equipment found.");
        return Ok(());
    }

    // Update short ID index
    let mut short_ids = ShortIdIndex::load(&project);
    for e in &equipment {
        short_ids.add(&e.id.to_string());
    }
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&equipment).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&equipment).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let rows = equipment.iter().map(|e| {
                TableRow::new(e.id.to_string(), &short_ids)
                    .cell("id", CellValue::Id(e.id.to_string()))
                    .cell("tag", CellValue::Text(e.tag.clone()))
                    .cell("title", CellValue::Text(e.title.clone()))
                    .cell("category", CellValue::Type(e.category.to_string()))
                    .cell("crit", CellValue::Criticality(e.criticality))
                    .cell("hours", CellValue::Float(e.operating_hours, 0))
                    .cell(
                        "health",
                        CellValue::Health(
                            e.analysis_results.health.as_ref().map(|h| h.status),
                        ),
                    )
                    .cell("status", CellValue::Status(e.status))
            });

            TableFormatter::new(LIST_COLUMNS, "equipment", "EQP").output(
                rows,
                format,
                &["id", "tag", "title", "category", "crit", "hours", "health", "status"],
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let id = EntityId::new(EntityPrefix::Eqp);
    let generator = TemplateGenerator::new().map_err(|e| miette::miette!("{}", e))?;

    let mut ctx = TemplateContext::new(id.clone(), config.author());

    let tag: String;
    let title: String;
    let category: String;

    if args.interactive || args.tag.is_none() || args.title.is_none() {
        // Schema-driven wizard
        let wizard = SchemaWizard::new();
        let result = wizard.run(EntityPrefix::Eqp)?;

        tag = result
            .get_string("tag")
            .map(str::to_string)
            .or(args.tag)
            .ok_or_else(|| miette::miette!("Tag is required (use --tag or -t)"))?;
        title = result
            .get_string("title")
            .map(str::to_string)
            .or(args.title)
            .ok_or_else(|| miette::miette!("Title is required (use --title or -T)"))?;
        category = result
            .get_string("category")
            .map(str::to_string)
            .unwrap_or(args.category);

        if let Some(subtype) = result.get_string("subtype") {
            ctx = ctx.with_subtype(subtype);
        }
        if let Some(manufacturer) = result.get_string("manufacturer") {
            ctx = ctx.with_manufacturer(manufacturer);
        }
        if let Some(model) = result.get_string("model") {
            ctx = ctx.with_model(model);
        }
        if let Some(location) = result.get_string("location") {
            ctx = ctx.with_location(location);
        }
        if let Some(criticality) = result.get_string("criticality") {
            ctx = ctx.with_criticality(criticality);
        }
        if let Some(environment) = result.get_string("environment") {
            ctx = ctx.with_environment(environment);
        }
        if let Some(hours) = result.get_f64("operating_hours") {
            ctx = ctx.with_operating_hours(hours);
        }
    } else {
        tag = args.tag.unwrap();
        title = args.title.unwrap();
        category = args.category;

        if let Some(subtype) = args.subtype {
            ctx = ctx.with_subtype(subtype);
        }
        if let Some(manufacturer) = args.manufacturer {
            ctx = ctx.with_manufacturer(manufacturer);
        }
        if let Some(model) = args.model {
            ctx = ctx.with_model(model);
        }
        if let Some(location) = args.location {
            ctx = ctx.with_location(location);
        }
        ctx = ctx
            .with_criticality(&args.criticality)
            .with_environment(&args.environment);
        if let Some(hours) = args.operating_hours {
            ctx = ctx.with_operating_hours(hours);
        }
    }

    // Validate enums before writing anything
    category
        .parse::<Category>()
        .map_err(|e| miette::miette!("{}", e))?;
    args.criticality
        .parse::<Criticality>()
        .map_err(|e| miette::miette!("{}", e))?;
    args.environment
        .parse::<Environment>()
        .map_err(|e| miette::miette!("{}", e))?;

    ctx = ctx
        .with_tag(&tag)
        .with_title(&title)
        .with_category(&category);

    let yaml_content = generator
        .generate_equipment(&ctx)
        .map_err(|e| miette::miette!("{}", e))?;

    let file_path = project.entity_path(EntityPrefix::Eqp, &id);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(&file_path, &yaml_content).into_diagnostic()?;

    // Add to short ID index
    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(&id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created equipment {}",
        style("✓").green(),
        style(format!("EQP@{}", short_id)).cyan()
    );
    println!("   {}", style(file_path.display()).dim());
    println!(
        "   {} | {} | {}",
        style(&tag).yellow(),
        style(&category).magenta(),
        style(&title).white()
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
    let (path, _equipment) = find_equipment(&project, &args.id)?;

    let content = fs::read_to_string(&path).into_diagnostic()?;

    match args.format {
        OutputFormat::Json => {
            let eqp: Equipment = serde_yml::from_str(&content).into_diagnostic()?;
            let json = serde_json::to_string_pretty(&eqp).into_diagnostic()?;
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
    let (path, _equipment) = find_equipment(&project, &args.id)?;

    println!(
        "Opening {} in {}...",
        style(path.display()).cyan(),
        style(config.editor()).yellow()
    );

    config.run_editor(&path).into_diagnostic()?;

    Ok(())
}

fn run_analyze(args: AnalyzeArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let calibration = Calibration::load_or_shipped(&project.calibration_path())
        .map_err(|e| miette::miette!("{}", e))?;
    let today = Local::now().date_naive();

    let targets: Vec<(PathBuf, Equipment)> = if args.all {
        let mut targets = Vec::new();
        for path in project.iter_entity_files(EntityPrefix::Eqp) {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(eqp) = serde_yml::from_str::<Equipment>(&content) {
                    targets.push((path, eqp));
                }
            }
        }
        targets
    } else {
        let id = args
            .id
            .as_deref()
            .ok_or_else(|| miette::miette!("Give an equipment ID or use --all"))?;
        vec![find_equipment(&project, id)?]
    };

    if targets.is_empty() {
        println!("No equipment to analyze.");
        return Ok(());
    }

    let readings = load_readings(&project);

    for (path, mut eqp) in targets {
        let latest_rms = latest_rms_for(&eqp.id, &readings);
        eqp.analyze(&calibration, latest_rms, today);
        write_yaml_file(&path, &eqp).map_err(|e| miette::miette!("{}", e))?;

        if !global.quiet {
            print_analysis_summary(&eqp, latest_rms);
        }
    }

    Ok(())
}

fn print_analysis_summary(eqp: &Equipment, latest_rms: Option<f64>) {
    println!(
        "{} Analyzed {} ({})",
        style("✓").green(),
        style(&eqp.tag).cyan(),
        format_short_id(&eqp.id)
    );

    if let Some(health) = &eqp.analysis_results.health {
        let status = health.status.to_string();
        let styled = match health.status.color() {
            "green" => style(status).green(),
            "yellow" => style(status).yellow(),
            _ => style(status).red(),
        };
        println!("   Health:       {:.1} ({})", health.score, styled);
    }
    if let Some(risk) = &eqp.analysis_results.risk {
        println!("   Risk:         {:.1} ({})", risk.score, risk.level);
    }
    if let Some(weibull) = &eqp.analysis_results.weibull {
        println!(
            "   MTTF:         {:.0} h   RUL: {:.0} h   R(now): {:.3}",
            weibull.mttf_hours, weibull.remaining_useful_life, weibull.reliability_now
        );
        if weibull.used_fallback {
            println!(
                "   {}",
                style("(default Weibull parameters - no calibrated entry)").yellow()
            );
        }
    }
    if let Some(availability) = &eqp.analysis_results.availability {
        println!(
            "   Availability: {:.4}   MTBF: {:.0} h",
            availability.availability, availability.mtbf_hours
        );
    }
    if let Some(maintenance) = &eqp.analysis_results.maintenance {
        println!(
            "   Maintenance:  {} due {} ({} days)",
            maintenance.maintenance_type, maintenance.next_due, maintenance.days_until_due
        );
    }
    if latest_rms.is_none() {
        println!(
            "   {}",
            style("(no analyzed readings - vibration not scored)").dim()
        );
    }
}

fn run_simulate(args: SimulateArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let calibration = Calibration::load_or_shipped(&project.calibration_path())
        .map_err(|e| miette::miette!("{}", e))?;

    let (path, mut eqp) = find_equipment(&project, &args.id)?;
    eqp.simulate(&calibration, args.samples, args.seed);
    write_yaml_file(&path, &eqp).map_err(|e| miette::miette!("{}", e))?;

    if let Some(sim) = &eqp.analysis_results.simulation {
        if !global.quiet {
            println!(
                "{} Simulated {} lives for {}",
                style("✓").green(),
                style(sim.samples).cyan(),
                style(&eqp.tag).cyan()
            );
            println!("   Mean life:  {:.0} h (σ {:.0})", sim.mean, sim.std_dev);
            println!(
                "   95% band:   {:.0} .. {:.0} h",
                sim.percentile_2_5, sim.percentile_97_5
            );
            println!("   Range:      {:.0} .. {:.0} h", sim.min, sim.max);
            if let Some(seed) = sim.seed {
                println!("   Seed:       {}", seed);
            }
        }
    }

    Ok(())
}

fn run_fit(args: FitArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, mut eqp) = find_equipment(&project, &args.id)?;

    // Collect failure ages for this equipment
    let flr_dir = project.root().join(Project::entity_directory(EntityPrefix::Flr));
    let failures: Vec<FailureEvent> = loader::load_all(&flr_dir)?;
    let ages: Vec<f64> = failures
        .iter()
        .filter(|f| f.equipment == eqp.id)
        .map(|f| f.hours_at_failure)
        .collect();

    let fit = WeibullFit::from_failure_ages(&ages).map_err(|e| miette::miette!("{}", e))?;
    eqp.record_fit(fit, args.apply);
    write_yaml_file(&path, &eqp).map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Fitted Weibull parameters for {} from {} failure(s)",
            style("✓").green(),
            style(&eqp.tag).cyan(),
            style(fit.sample_count).cyan()
        );
        println!(
            "   β (shape):  {:.3}   η (scale): {:.0} h   γ (location): {:.0} h",
            fit.params.shape, fit.params.scale, fit.params.location
        );
        println!(
            "   Fit:        KS {:.3}   R² {:.3}",
            fit.ks_statistic, fit.r_squared
        );
        if args.apply {
            println!(
                "   {}",
                style("Fitted parameters now override the calibration lookup.").yellow()
            );
        } else {
            println!(
                "   {}",
                style("Stored for review. Re-run with --apply to use them.").dim()
            );
        }
    }

    Ok(())
}

// Helper functions

/// Resolve a reference (short ID, full or partial ID) to an equipment file
fn find_equipment(project: &Project, reference: &str) -> Result<(PathBuf, Equipment)> {
    let short_ids = ShortIdIndex::load(project);
    let resolved = short_ids
        .resolve(EntityPrefix::Eqp, reference)
        .unwrap_or_else(|| reference.to_string());

    let eqp_dir = project.root().join(Project::entity_directory(EntityPrefix::Eqp));
    loader::load_entity::<Equipment>(&eqp_dir, &resolved)?
        .ok_or_else(|| miette::miette!("No equipment found matching '{}'", reference))
}

fn load_readings(project: &Project) -> Vec<Reading> {
    let rdg_dir = project.root().join(Project::entity_directory(EntityPrefix::Rdg));
    loader::load_all(&rdg_dir).unwrap_or_default()
}

/// RMS velocity of the most recent analyzed reading for one equipment
fn latest_rms_for(equipment: &EntityId, readings: &[Reading]) -> Option<f64> {
    readings
        .iter()
        .filter(|r| r.equipment == *equipment)
        .filter(|r| r.analysis.is_some())
        .max_by_key(|r| r.taken_at)
        .and_then(|r| r.analysis.as_ref())
        .map(|a| a.rms_velocity)
}
