//! `mrt validate` command - Validate project files against schemas
//!
//! Beyond schema shape, readings and equipment carry derived blocks that
//! can drift: a hand-edited RMS, a zone computed under an older
//! calibration. Those show up as warnings (errors with --strict) and
//! --fix recomputes them in place.

use console::style;
use miette::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::analytics::calibration::Calibration;
use crate::analytics::vibration::rms_velocity;
use crate::analytics::zones::classify;
use crate::core::project::Project;
use crate::core::EntityPrefix;
use crate::entities::equipment::Equipment;
use crate::entities::failure::FailureEvent;
use crate::entities::reading::Reading;
use crate::schema::registry::SchemaRegistry;
use crate::schema::validator::Validator;
use crate::yaml::write_yaml_file;

const RMS_TOLERANCE: f64 = 1e-6;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Paths to validate (default: entire project)
    #[arg()]
    pub paths: Vec<PathBuf>,

    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Only validate git-staged files
    #[arg(long)]
    pub staged: bool,

    /// Specific entity type to validate (eqp, rdg, flr)
    #[arg(long, short = 't')]
    pub entity_type: Option<String>,

    /// Continue validation after first error
    #[arg(long)]
    pub keep_going: bool,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,

    /// Recompute derived values (RMS, zone, stale stamps) in-place
    #[arg(long)]
    pub fix: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    total_errors: usize,
    total_warnings: usize,
    files_fixed: usize,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
    let registry = SchemaRegistry::default();
    let validator = Validator::new(&registry);
    let calibration = Calibration::load_or_shipped(&project.calibration_path())
        .map_err(|e| miette::miette!("{}", e))?;

    let mut stats = ValidationStats::default();
    let mut had_error = false;

    // Determine which files to validate
    let files_to_validate: Vec<PathBuf> = if args.staged {
        get_staged_files(&project)?
    } else if args.paths.is_empty() {
        get_all_mrt_files(&project)
    } else {
        expand_paths(&args.paths)
    };

    // Filter by entity type if specified
    let entity_filter: Option<EntityPrefix> =
        args.entity_type.as_ref().and_then(|t| t.to_uppercase().parse().ok());

    println!(
        "{} Validating {} file(s)...\n",
        style("→").blue(),
        files_to_validate.len()
    );

    for path in &files_to_validate {
        // Skip non-.mrt.yaml files
        if !path.to_string_lossy().ends_with(".mrt.yaml") {
            continue;
        }

        // Determine entity type from path
        let prefix = EntityPrefix::from_filename(
            &path.file_name().unwrap_or_default().to_string_lossy(),
        )
        .or_else(|| EntityPrefix::from_path(path));

        // Skip if filtering by entity type and this doesn't match
        if let Some(filter) = entity_filter {
            if prefix != Some(filter) {
                continue;
            }
        }

        stats.files_checked += 1;

        // Read file content
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if !args.summary {
                    println!("{} {} - {}", style("✗").red(), path.display(), e);
                }
                stats.files_failed += 1;
                stats.total_errors += 1;
                had_error = true;
                if !args.keep_going {
                    break;
                }
                continue;
            }
        };

        let filename = path.file_name().unwrap_or_default().to_string_lossy();

        // Skip if we can't determine entity type
        let entity_prefix = match prefix {
            Some(p) => p,
            None => {
                if !args.summary {
                    println!(
                        "{} {} - {}",
                        style("?").yellow(),
                        path.display(),
                        "unknown entity type (skipped)"
                    );
                }
                continue;
            }
        };

        // Validate schema
        match validator.validate(&content, &filename, entity_prefix) {
            Ok(_) => {
                // Schema validation passed - now check derived values
                let derived_issues = match entity_prefix {
                    EntityPrefix::Rdg => {
                        check_reading_values(&content, path, &calibration, args.fix, &mut stats)?
                    }
                    EntityPrefix::Eqp => check_equipment_values(&content, &calibration)?,
                    EntityPrefix::Flr => {
                        check_failure_references(&content, project.root())?
                    }
                };

                if derived_issues.is_empty() {
                    stats.files_passed += 1;
                    if !args.summary {
                        println!("{} {}", style("✓").green(), path.display());
                    }
                } else if args.fix && entity_prefix == EntityPrefix::Rdg {
                    stats.files_passed += 1;
                    if !args.summary {
                        println!("{} {} (fixed)", style("✓").green(), path.display());
                    }
                } else {
                    stats.total_warnings += derived_issues.len();
                    if !args.summary {
                        println!(
                            "{} {} - {} warning(s)",
                            style("!").yellow(),
                            path.display(),
                            derived_issues.len()
                        );
                        for issue in &derived_issues {
                            println!("    {}", style(issue).yellow());
                        }
                    }
                    if args.strict {
                        stats.files_failed += 1;
                        had_error = true;
                    } else {
                        stats.files_passed += 1;
                    }
                }
            }
            Err(e) => {
                stats.files_failed += 1;
                stats.total_errors += e.violation_count();
                had_error = true;

                if !args.summary {
                    println!(
                        "{} {} - {} error(s)",
                        style("✗").red(),
                        path.display(),
                        e.violation_count()
                    );

                    // Print detailed error using miette
                    let report = miette::Report::new(e);
                    println!("{:?}", report);
                }

                if !args.keep_going {
                    break;
                }
            }
        }
    }

    // Print summary
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:  {}", style(stats.files_checked).cyan());
    println!("  Files passed:   {}", style(stats.files_passed).green());
    println!("  Files failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:   {}", style(stats.total_errors).red());

    if stats.total_warnings > 0 {
        println!("  Total warnings: {}", style(stats.total_warnings).yellow());
    }

    if stats.files_fixed > 0 {
        println!("  Files fixed:    {}", style(stats.files_fixed).cyan());
    }

    println!();

    if had_error {
        if stats.files_failed == 1 {
            Err(miette::miette!("Validation failed: 1 file has errors"))
        } else {
            Err(miette::miette!(
                "Validation failed: {} files have errors",
                stats.files_failed
            ))
        }
    } else {
        println!("{} All files passed validation!", style("✓").green().bold());
        Ok(())
    }
}

/// Get all .mrt.yaml files in the project
fn get_all_mrt_files(project: &Project) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(project.root())
        .into_iter()
        .filter_entry(|e| {
            // Skip .git and .mrt directories
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') || e.depth() == 0
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.to_string_lossy().ends_with(".mrt.yaml") {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}

/// Get git-staged .mrt.yaml files
fn get_staged_files(project: &Project) -> Result<Vec<PathBuf>> {
    let output = std::process::Command::new("git")
        .args(["diff", "--cached", "--name-only", "--diff-filter=ACM"])
        .current_dir(project.root())
        .output()
        .map_err(|e| miette::miette!("Failed to run git: {}", e))?;

    if !output.status.success() {
        return Err(miette::miette!(
            "git diff failed: {}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    let files: Vec<PathBuf> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| line.ends_with(".mrt.yaml"))
        .map(|line| project.root().join(line))
        .filter(|path| path.exists())
        .collect();

    Ok(files)
}

/// Expand paths - if a directory is given, find all .mrt.yaml files in it
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if entry.path().to_string_lossy().ends_with(".mrt.yaml") {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else if path.exists() {
            files.push(path.clone());
        }
    }

    files.sort();
    files
}

/// Check and optionally recompute the derived block of a reading
fn check_reading_values(
    content: &str,
    path: &PathBuf,
    calibration: &Calibration,
    fix: bool,
    stats: &mut ValidationStats,
) -> Result<Vec<String>> {
    let mut issues = Vec::new();

    let mut reading: Reading = match serde_yml::from_str(content) {
        Ok(r) => r,
        Err(_) => return Ok(issues), // Already reported by schema validation
    };

    let Some(stored) = reading.analysis.clone() else {
        // Unanalyzed readings are fine as-is
        return Ok(issues);
    };

    // Recompute RMS from the raw channels
    match rms_velocity(&reading.channels.velocity()) {
        Ok(rms) => {
            if (stored.rms_velocity - rms.value).abs() > RMS_TOLERANCE {
                issues.push(format!(
                    "rms_velocity mismatch: stored {:.4} but calculated {:.4} from {} channel(s)",
                    stored.rms_velocity, rms.value, rms.channels_used
                ));
            }

            // Zone against the active calibration's bands
            match classify(rms.value, &calibration.zone_bands) {
                Ok(expected_zone) => {
                    if stored.zone != expected_zone {
                        issues.push(format!(
                            "zone mismatch: stored {} but {:.4} mm/s falls in zone {}",
                            stored.zone, rms.value, expected_zone
                        ));
                    }
                }
                Err(e) => issues.push(format!("zone check failed: {}", e)),
            }
        }
        Err(e) => issues.push(format!("cannot recompute RMS: {}", e)),
    }

    // Stale calibration stamp
    if stored.calibration != calibration.stamp() {
        issues.push(format!(
            "analysis stamped with calibration {} ({}), active is {} ({})",
            stored.calibration.version,
            &stored.calibration.digest,
            calibration.version,
            calibration.digest()
        ));
    }

    if fix && !issues.is_empty() {
        reading
            .analyze(calibration)
            .map_err(|e| miette::miette!("Failed to re-analyze {}: {}", path.display(), e))?;
        write_yaml_file(path, &reading).map_err(|e| miette::miette!("{}", e))?;
        stats.files_fixed += 1;
        issues.clear();
    }

    Ok(issues)
}

/// Flag equipment whose stored analysis ran under a different calibration
fn check_equipment_values(content: &str, calibration: &Calibration) -> Result<Vec<String>> {
    let mut issues = Vec::new();

    let equipment: Equipment = match serde_yml::from_str(content) {
        Ok(e) => e,
        Err(_) => return Ok(issues),
    };

    if let Some(weibull) = &equipment.analysis_results.weibull {
        if !weibull.calibration.matches(calibration) {
            issues.push(format!(
                "analysis stamped with calibration {}, active is {} (re-run `mrt eqp analyze`)",
                weibull.calibration.version, calibration.version
            ));
        }
    }

    if equipment.operating_hours < 0.0 {
        issues.push(format!(
            "operating_hours is negative ({})",
            equipment.operating_hours
        ));
    }

    Ok(issues)
}

/// Failure events must point at an equipment file that exists
fn check_failure_references(content: &str, project_root: &Path) -> Result<Vec<String>> {
    let mut issues = Vec::new();

    let failure: FailureEvent = match serde_yml::from_str(content) {
        Ok(f) => f,
        Err(_) => return Ok(issues),
    };

    let eqp_dir = project_root.join(Project::entity_directory(EntityPrefix::Eqp));
    let target = failure.equipment.to_string();
    if crate::core::loader::find_entity_file(&eqp_dir, &target).is_none() {
        issues.push(format!("references unknown equipment: {}", target));
    }

    if !failure.hours_at_failure.is_finite() || failure.hours_at_failure < 0.0 {
        issues.push(format!(
            "hours_at_failure must be a non-negative number (got {})",
            failure.hours_at_failure
        ));
    }

    Ok(issues)
}
