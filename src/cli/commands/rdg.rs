//! `mrt rdg` command - Reading management
//!
//! Readings are raw data-logger channel values. `rdg analyze` derives the
//! RMS velocity and severity zone and writes the derived block back into
//! the file, stamped with the calibration it ran with. `rdg import`
//! ingests a CSV export from a route-based collector.

use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::analytics::calibration::Calibration;
use crate::analytics::zones::{classify, Zone};
use crate::analytics::trend;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::equipment::Equipment;
use crate::entities::reading::Reading;
use crate::schema::template::{TemplateContext, TemplateGenerator};
use crate::yaml::write_yaml_file;

#[derive(Subcommand, Debug)]
pub enum RdgCommands {
    /// List readings with filtering
    List(ListArgs),

    /// Record a new reading
    New(NewArgs),

    /// Show a reading's details
    Show(ShowArgs),

    /// Edit a reading in your editor
    Edit(EditArgs),

    /// Derive RMS velocity and severity zone
    Analyze(AnalyzeArgs),

    /// Import readings from a CSV collector export
    Import(ImportArgs),

    /// Forecast the RMS trend for one equipment
    Trend(TrendArgs),
}

/// Zone filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ZoneFilter {
    A,
    B,
    C,
    D,
    All,
}

/// Analysis state filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AnalysisFilter {
    Analyzed,
    Pending,
    All,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortField {
    TakenAt,
    Point,
    Rms,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by equipment ID or short ID (EQP@N)
    #[arg(long, short = 'E')]
    pub equipment: Option<String>,

    /// Filter by severity zone
    #[arg(long, short = 'z', default_value = "all")]
    pub zone: ZoneFilter,

    /// Filter by analysis state
    #[arg(long, default_value = "all")]
    pub state: AnalysisFilter,

    /// Sort by field
    #[arg(long, default_value = "taken-at")]
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

    /// Measurement point on the machine (e.g., pump-nde)
    #[arg(long, short = 'p')]
    pub point: Option<String>,

    /// Vertical velocity, mm/s RMS
    #[arg(long)]
    pub vel_v: Option<f64>,

    /// Horizontal velocity, mm/s RMS
    #[arg(long)]
    pub vel_h: Option<f64>,

    /// Axial velocity, mm/s RMS
    #[arg(long)]
    pub vel_axl: Option<f64>,

    /// Vertical acceleration, m/s²
    #[arg(long)]
    pub acc_v: Option<f64>,

    /// Horizontal acceleration, m/s²
    #[arg(long)]
    pub acc_h: Option<f64>,

    /// Axial acceleration, m/s²
    #[arg(long)]
    pub acc_axl: Option<f64>,

    /// Bearing housing velocity, mm/s RMS
    #[arg(long)]
    pub brg_v: Option<f64>,

    /// Bearing gap, micrometers
    #[arg(long)]
    pub brg_gap: Option<f64>,

    /// Surface temperature, Celsius
    #[arg(long)]
    pub temp: Option<f64>,

    /// Analyze immediately after creation
    #[arg(long, short = 'a')]
    pub analyze: bool,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Reading ID or short ID (RDG@N)
    pub id: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "yaml")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Reading ID or short ID (RDG@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Reading ID or short ID (RDG@N)
    pub id: Option<String>,

    /// Analyze all pending readings
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Re-analyze readings that already have a derived block
    #[arg(long)]
    pub force: bool,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,

    /// Analyze each reading after import
    #[arg(long, short = 'a')]
    pub analyze: bool,
}

#[derive(clap::Args, Debug)]
pub struct TrendArgs {
    /// Equipment ID or short ID (EQP@N)
    pub equipment: String,

    /// Restrict to one measurement point
    #[arg(long, short = 'p')]
    pub point: Option<String>,

    /// Number of future readings to project
    #[arg(long, short = 's', default_value = "5")]
    pub steps: usize,
}

/// Run a reading subcommand
pub fn run(cmd: RdgCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RdgCommands::List(args) => run_list(args),
        RdgCommands::New(args) => run_new(args, global),
        RdgCommands::Show(args) => run_show(args),
        RdgCommands::Edit(args) => run_edit(args),
        RdgCommands::Analyze(args) => run_analyze(args, global),
        RdgCommands::Import(args) => run_import(args, global),
        RdgCommands::Trend(args) => run_trend(args),
    }
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 17),
    ColumnDef::new("equipment", "EQUIPMENT", 17),
    ColumnDef::new("point", "POINT", 16),
    ColumnDef::new("taken", "TAKEN", 18),
    ColumnDef::new("rms", "RMS", 8),
    ColumnDef::new("zone", "ZONE", 6),
    ColumnDef::new("state", "STATE", 10),
];

fn run_list(args: ListArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let rdg_dir = project.root().join(Project::entity_directory(EntityPrefix::Rdg));

    let mut readings: Vec<Reading> = loader::load_all(&rdg_dir)?;

    // Apply filters
    if let Some(ref reference) = args.equipment {
        let short_ids = ShortIdIndex::load(&project);
        let resolved = short_ids
            .resolve(EntityPrefix::Eqp, reference)
            .unwrap_or_else(|| reference.clone());
        readings.retain(|r| r.equipment.to_string().contains(&resolved));
    }
    readings.retain(|r| {
        let zone = r.analysis.as_ref().map(|a| a.zone);
        match args.zone {
            ZoneFilter::A => zone == Some(Zone::A),
            ZoneFilter::B => zone == Some(Zone::B),
            ZoneFilter::C => zone == Some(Zone::C),
            ZoneFilter::D => zone == Some(Zone::D),
            ZoneFilter::All => true,
        }
    });
    readings.retain(|r| match args.state {
        AnalysisFilter::Analyzed => r.analysis.is_some(),
        AnalysisFilter::Pending => r.analysis.is_none(),
        AnalysisFilter::All => true,
    });

    // Sort
    match args.sort {
        SortField::TakenAt => readings.sort_by(|a, b| a.taken_at.cmp(&b.taken_at)),
        SortField::Point => {
            readings.sort_by(|a, b| a.measurement_point.cmp(&b.measurement_point))
        }
        SortField::Rms => readings.sort_by(|a, b| {
            let ra = a.analysis.as_ref().map(|x| x.rms_velocity);
            let rb = b.analysis.as_ref().map(|x| x.rms_velocity);
            ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortField::Created => readings.sort_by(|a, b| a.created.cmp(&b.created)),
    }

    if args.reverse {
        readings.reverse();
    }

    if let Some(limit) = args.limit {
        readings.truncate(limit);
    }

    if args.count {
        println!("{}", readings.len());
        return Ok(());
    }

    if readings.is_empty() {
        println!("No readings found.");
        return Ok(());
    }

    // Update short ID index
    let mut short_ids = ShortIdIndex::load(&project);
    for r in &readings {
        short_ids.add(&r.id.to_string());
    }
    let _ = short_ids.save(&project);

    let format = if args.format == OutputFormat::Auto {
        OutputFormat::Tsv
    } else {
        args.format
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&readings).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&readings).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let rows = readings.iter().map(|r| {
                let state = if r.analysis.is_some() {
                    "analyzed"
                } else {
                    "pending"
                };
                TableRow::new(r.id.to_string(), &short_ids)
                    .cell("id", CellValue::Id(r.id.to_string()))
                    .cell("equipment", CellValue::Id(r.equipment.to_string()))
                    .cell("point", CellValue::Text(r.measurement_point.clone()))
                    .cell("taken", CellValue::DateTime(r.taken_at))
                    .cell(
                        "rms",
                        CellValue::OptionalFloat(
                            r.analysis.as_ref().map(|a| a.rms_velocity),
                            2,
                        ),
                    )
                    .cell("zone", CellValue::Zone(r.analysis.as_ref().map(|a| a.zone)))
                    .cell("state", CellValue::Text(state.to_string()))
            });

            TableFormatter::new(LIST_COLUMNS, "reading", "RDG").output(
                rows,
                format,
                &["id", "equipment", "point", "taken", "rms", "zone", "state"],
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    // The equipment must exist; its real ID goes into the reading
    let (_, equipment) = find_equipment(&project, &args.equipment)?;

    let point = args
        .point
        .ok_or_else(|| miette::miette!("Measurement point is required (use --point or -p)"))?;

    let id = EntityId::new(EntityPrefix::Rdg);
    let generator = TemplateGenerator::new().map_err(|e| miette::miette!("{}", e))?;

    let mut ctx = TemplateContext::new(id.clone(), config.author())
        .with_equipment(equipment.id.clone())
        .with_measurement_point(&point)
        .with_taken_at(Utc::now());

    let channels: [(&str, Option<f64>); 9] = [
        ("vel_v", args.vel_v),
        ("vel_h", args.vel_h),
        ("vel_axl", args.vel_axl),
        ("acc_v", args.acc_v),
        ("acc_h", args.acc_h),
        ("acc_axl", args.acc_axl),
        ("brg_v", args.brg_v),
        ("brg_gap", args.brg_gap),
        ("temp", args.temp),
    ];
    for (name, value) in channels {
        if let Some(value) = value {
            ctx = ctx.with_channel(name, value);
        }
    }

    let yaml_content = generator
        .generate_reading(&ctx)
        .map_err(|e| miette::miette!("{}", e))?;

    let file_path = project.entity_path(EntityPrefix::Rdg, &id);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(&file_path, &yaml_content).into_diagnostic()?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(&id.to_string());
    let _ = short_ids.save(&project);

    println!(
        "{} Created reading {} for {} at {}",
        style("✓").green(),
        style(format!("RDG@{}", short_id)).cyan(),
        style(&equipment.tag).yellow(),
        style(&point).white()
    );
    println!("   {}", style(file_path.display()).dim());

    if args.analyze {
        let calibration = Calibration::load_or_shipped(&project.calibration_path())
            .map_err(|e| miette::miette!("{}", e))?;
        let content = fs::read_to_string(&file_path).into_diagnostic()?;
        let mut reading: Reading = serde_yml::from_str(&content).into_diagnostic()?;
        analyze_one(&mut reading, &file_path, &calibration, global.quiet)?;
    } else if args.edit {
        println!();
        println!("Opening in {}...", style(config.editor()).yellow());
        config.run_editor(&file_path).into_diagnostic()?;
    }

    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (path, _) = find_reading(&project, &args.id)?;

    let content = fs::read_to_string(&path).into_diagnostic()?;

    match args.format {
        OutputFormat::Json => {
            let reading: Reading = serde_yml::from_str(&content).into_diagnostic()?;
            let json = serde_json::to_string_pretty(&reading).into_diagnostic()?;
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
    let (path, _) = find_reading(&project, &args.id)?;

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

    if args.all {
        let mut analyzed = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for path in project.iter_entity_files(EntityPrefix::Rdg) {
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(_) => continue,
            };
            let mut reading: Reading = match serde_yml::from_str(&content) {
                Ok(r) => r,
                Err(_) => continue,
            };

            if reading.analysis.is_some() && !args.force {
                skipped += 1;
                continue;
            }

            match analyze_one(&mut reading, &path, &calibration, true) {
                Ok(()) => analyzed += 1,
                Err(e) => {
                    failed += 1;
                    if !global.quiet {
                        println!("{} {} - {}", style("✗").red(), path.display(), e);
                    }
                }
            }
        }

        println!(
            "{} Analyzed {} reading(s), {} already done, {} failed",
            style("✓").green(),
            style(analyzed).cyan(),
            skipped,
            failed
        );
        return Ok(());
    }

    let id = args
        .id
        .as_deref()
        .ok_or_else(|| miette::miette!("Give a reading ID or use --all"))?;
    let (path, mut reading) = find_reading(&project, id)?;
    analyze_one(&mut reading, &path, &calibration, global.quiet)
}

/// Row shape of a collector CSV export. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct ImportRow {
    equipment: String,
    measurement_point: String,
    taken_at: String,
    #[serde(default)]
    vel_v: Option<f64>,
    #[serde(default)]
    vel_h: Option<f64>,
    #[serde(default)]
    vel_axl: Option<f64>,
    #[serde(default)]
    acc_v: Option<f64>,
    #[serde(default)]
    acc_h: Option<f64>,
    #[serde(default)]
    acc_axl: Option<f64>,
    #[serde(default)]
    brg_v: Option<f64>,
    #[serde(default)]
    brg_gap: Option<f64>,
    #[serde(default)]
    temp: Option<f64>,
    #[serde(default)]
    notes: Option<String>,
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load();

    let eqp_dir = project.root().join(Project::entity_directory(EntityPrefix::Eqp));
    let equipment: Vec<Equipment> = loader::load_all(&eqp_dir)?;
    let short_ids = ShortIdIndex::load(&project);

    let mut reader = csv::Reader::from_path(&args.file)
        .map_err(|e| miette::miette!("Cannot open {}: {}", args.file.display(), e))?;

    let calibration = if args.analyze {
        Some(
            Calibration::load_or_shipped(&project.calibration_path())
                .map_err(|e| miette::miette!("{}", e))?,
        )
    } else {
        None
    };

    let mut imported = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for (index, record) in reader.deserialize::<ImportRow>().enumerate() {
        let line = index + 2; // header is line 1
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                errors.push(format!("line {}: {}", line, e));
                continue;
            }
        };

        // Equipment column is a tag, a short ID or a full/partial ID
        let target = match resolve_import_equipment(&row.equipment, &equipment, &short_ids) {
            Some(eqp) => eqp,
            None => {
                errors.push(format!(
                    "line {}: no equipment matching '{}'",
                    line, row.equipment
                ));
                continue;
            }
        };

        let taken_at = match DateTime::parse_from_rfc3339(&row.taken_at) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                errors.push(format!(
                    "line {}: bad taken_at '{}': {}",
                    line, row.taken_at, e
                ));
                continue;
            }
        };

        let mut reading = Reading::new(target.id.clone(), &row.measurement_point, config.author());
        reading.taken_at = taken_at;
        reading.channels.vel_v = row.vel_v;
        reading.channels.vel_h = row.vel_h;
        reading.channels.vel_axl = row.vel_axl;
        reading.channels.acc_v = row.acc_v;
        reading.channels.acc_h = row.acc_h;
        reading.channels.acc_axl = row.acc_axl;
        reading.channels.brg_v = row.brg_v;
        reading.channels.brg_gap = row.brg_gap;
        reading.channels.temp = row.temp;
        reading.notes = row.notes;

        if let Some(ref calibration) = calibration {
            if let Err(e) = reading.analyze(calibration) {
                errors.push(format!("line {}: {}", line, e));
                // Keep the raw reading; it can be fixed and re-analyzed
            }
        }

        let file_path = project.entity_path(EntityPrefix::Rdg, &reading.id);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
        write_yaml_file(&file_path, &reading).map_err(|e| miette::miette!("{}", e))?;
        imported += 1;
    }

    println!(
        "{} Imported {} reading(s) from {}",
        style("✓").green(),
        style(imported).cyan(),
        style(args.file.display()).dim()
    );

    if !errors.is_empty() && !global.quiet {
        println!();
        println!("{} {} row(s) skipped:", style("!").yellow(), errors.len());
        for error in &errors {
            println!("   {}", style(error).yellow());
        }
    }

    Ok(())
}

fn run_trend(args: TrendArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let (_, equipment) = find_equipment(&project, &args.equipment)?;
    let calibration = Calibration::load_or_shipped(&project.calibration_path())
        .map_err(|e| miette::miette!("{}", e))?;

    let rdg_dir = project.root().join(Project::entity_directory(EntityPrefix::Rdg));
    let mut readings: Vec<Reading> = loader::load_all(&rdg_dir)?;
    readings.retain(|r| r.equipment == equipment.id && r.analysis.is_some());
    if let Some(ref point) = args.point {
        readings.retain(|r| r.measurement_point == *point);
    }
    readings.sort_by(|a, b| a.taken_at.cmp(&b.taken_at));

    let values: Vec<f64> = readings
        .iter()
        .filter_map(|r| r.analysis.as_ref())
        .map(|a| a.rms_velocity)
        .collect();

    if values.len() < 2 {
        return Err(miette::miette!(
            "Need at least 2 analyzed readings for a trend (have {})",
            values.len()
        ));
    }

    let forecast = trend::forecast(&values, args.steps);

    println!(
        "{} RMS trend for {} over {} reading(s)",
        style("→").blue(),
        style(&equipment.tag).cyan(),
        forecast.samples
    );
    let direction = forecast.direction.to_string();
    let direction_styled = match forecast.direction {
        trend::TrendDirection::Rising => style(direction).red(),
        trend::TrendDirection::Falling => style(direction).green(),
        trend::TrendDirection::Stable => style(direction).dim(),
    };
    println!(
        "   Direction: {}   Slope: {:+.4} mm/s per reading",
        direction_styled, forecast.slope
    );

    if !forecast.predicted.is_empty() {
        println!();
        println!("   {:<6} {:>8} {:>6}", "STEP", "RMS", "ZONE");
        for (i, rms) in forecast.predicted.iter().enumerate() {
            let zone = classify(rms.max(0.0), &calibration.zone_bands).ok();
            let zone_display = zone.map(|z| z.to_string()).unwrap_or_else(|| "-".into());
            println!("   +{:<5} {:>8.2} {:>6}", i + 1, rms, zone_display);
        }

        let last_zone = values
            .last()
            .and_then(|rms| classify(*rms, &calibration.zone_bands).ok());
        let projected_zone = forecast
            .predicted
            .last()
            .and_then(|rms| classify(rms.max(0.0), &calibration.zone_bands).ok());
        if let (Some(now), Some(later)) = (last_zone, projected_zone) {
            if later.severity() > now.severity() {
                println!();
                println!(
                    "   {} Projection crosses from zone {} into zone {}",
                    style("⚠").yellow(),
                    now,
                    later
                );
            }
        }
    }

    Ok(())
}

// Helper functions

fn analyze_one(
    reading: &mut Reading,
    path: &std::path::Path,
    calibration: &Calibration,
    quiet: bool,
) -> Result<()> {
    match reading.analyze(calibration) {
        Ok(analysis) => {
            write_yaml_file(path, reading).map_err(|e| miette::miette!("{}", e))?;
            if !quiet {
                let zone = analysis.zone.to_string();
                let zone_styled = match analysis.zone {
                    Zone::A => style(zone).green(),
                    Zone::B => style(zone).yellow(),
                    Zone::C => style(zone).magenta(),
                    Zone::D => style(zone).red().bold(),
                };
                println!(
                    "{} {} at {}: {:.2} mm/s over {} channel(s), zone {} ({})",
                    style("✓").green(),
                    style(reading.id.to_string()).cyan(),
                    reading.measurement_point,
                    analysis.rms_velocity,
                    analysis.channels_used,
                    zone_styled,
                    analysis.zone.label()
                );
            }
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}: {}", reading.id, e)),
    }
}

fn find_reading(project: &Project, reference: &str) -> Result<(PathBuf, Reading)> {
    let short_ids = ShortIdIndex::load(project);
    let resolved = short_ids
        .resolve(EntityPrefix::Rdg, reference)
        .unwrap_or_else(|| reference.to_string());

    let rdg_dir = project.root().join(Project::entity_directory(EntityPrefix::Rdg));
    loader::load_entity::<Reading>(&rdg_dir, &resolved)?
        .ok_or_else(|| miette::miette!("No reading found matching '{}'", reference))
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

/// Match a CSV equipment column against tag, short ID or entity ID
fn resolve_import_equipment<'a>(
    reference: &str,
    equipment: &'a [Equipment],
    short_ids: &ShortIdIndex,
) -> Option<&'a Equipment> {
    // Exact tag match first; collectors usually export tags
    if let Some(found) = equipment.iter().find(|e| e.tag == reference) {
        return Some(found);
    }

    let resolved = short_ids
        .resolve(EntityPrefix::Eqp, reference)
        .unwrap_or_else(|| reference.to_string());
    equipment
        .iter()
        .find(|e| e.id.to_string().contains(&resolved))
}
