//! `mrt status` command - Project status dashboard

use console::style;
use miette::Result;
use std::collections::HashMap;

use crate::analytics::calibration::Calibration;
use crate::analytics::zones::Zone;
use crate::cli::helpers::format_hours;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::project::Project;
use crate::entities::equipment::Equipment;
use crate::entities::failure::{FailureEvent, Resolution};
use crate::entities::reading::Reading;

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Show detailed breakdown
    #[arg(long)]
    pub detailed: bool,
}

pub fn run(_args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;

    let equipment: Vec<Equipment> =
        loader::load_all(&project.root().join(Project::entity_directory(EntityPrefix::Eqp)))?;
    let readings: Vec<Reading> =
        loader::load_all(&project.root().join(Project::entity_directory(EntityPrefix::Rdg)))?;
    let failures: Vec<FailureEvent> =
        loader::load_all(&project.root().join(Project::entity_directory(EntityPrefix::Flr)))?;

    // Collect metrics
    let eqp_metrics = collect_equipment_metrics(&equipment);
    let condition_metrics = collect_condition_metrics(&equipment, &readings);
    let reliability_metrics = collect_reliability_metrics(&equipment);
    let failure_metrics = collect_failure_metrics(&failures);
    let calib_metrics = collect_calibration_metrics(&project, &equipment, &readings);

    match global.format {
        OutputFormat::Json => {
            let status = serde_json::json!({
                "equipment": eqp_metrics,
                "condition": condition_metrics,
                "reliability": reliability_metrics,
                "failures": failure_metrics,
                "calibration": calib_metrics,
            });
            println!("{}", serde_json::to_string_pretty(&status).unwrap_or_default());
        }
        _ => {
            // Human-readable dashboard
            let width = 68;

            println!("{}", style("MRT Project Status").bold().underlined());
            println!("{}", "═".repeat(width));
            println!();

            print_two_columns(
                "EQUIPMENT",
                &format_equipment_metrics(&eqp_metrics),
                "CONDITION",
                &format_condition_metrics(&condition_metrics),
            );

            println!();

            print_two_columns(
                "RELIABILITY",
                &format_reliability_metrics(&reliability_metrics),
                "FAILURES",
                &format_failure_metrics(&failure_metrics),
            );

            println!();

            print_two_columns(
                "CALIBRATION",
                &format_calibration_metrics(&calib_metrics),
                "",
                &[],
            );

            println!();
            println!("{}", "═".repeat(width));

            // Overall health indicator
            let health = calculate_health(
                &condition_metrics,
                &reliability_metrics,
                &failure_metrics,
                &calib_metrics,
            );
            let health_style = match health.as_str() {
                "Healthy" => style(health.clone()).green().bold(),
                "Warning" => style(health.clone()).yellow().bold(),
                "Critical" => style(health.clone()).red().bold(),
                _ => style(health.clone()).dim(),
            };
            println!("Fleet Health: {}", health_style);
        }
    }

    Ok(())
}

#[derive(serde::Serialize, Default)]
struct EquipmentMetrics {
    total: usize,
    by_status: HashMap<String, usize>,
    by_category: HashMap<String, usize>,
    by_criticality: HashMap<String, usize>,
}

#[derive(serde::Serialize, Default)]
struct ConditionMetrics {
    readings_total: usize,
    analyzed: usize,
    pending: usize,
    /// Latest zone per monitored equipment
    by_zone: HashMap<String, usize>,
    machines_monitored: usize,
    machines_in_alarm: usize,
}

#[derive(serde::Serialize, Default)]
struct ReliabilityMetrics {
    analyzed: usize,
    unanalyzed: usize,
    avg_health: f64,
    by_health: HashMap<String, usize>,
    critical_risk: usize,
    high_risk: usize,
    fallback_params: usize,
    overdue_maintenance: usize,
}

#[derive(serde::Serialize, Default)]
struct FailureMetrics {
    total: usize,
    open: usize,
    resolved: usize,
    total_downtime_hours: f64,
    top_mode: Option<String>,
}

#[derive(serde::Serialize, Default)]
struct CalibrationMetrics {
    version: String,
    digest: String,
    source: String,
    stale_results: usize,
}

fn collect_equipment_metrics(equipment: &[Equipment]) -> EquipmentMetrics {
    let mut metrics = EquipmentMetrics::default();

    for eqp in equipment {
        metrics.total += 1;

        let status_str = format!("{:?}", eqp.status).to_lowercase();
        *metrics.by_status.entry(status_str).or_insert(0) += 1;

        let category_str = eqp.category.to_string();
        *metrics.by_category.entry(category_str).or_insert(0) += 1;

        let crit_str = format!("{:?}", eqp.criticality).to_lowercase();
        *metrics.by_criticality.entry(crit_str).or_insert(0) += 1;
    }

    metrics
}

fn collect_condition_metrics(equipment: &[Equipment], readings: &[Reading]) -> ConditionMetrics {
    let mut metrics = ConditionMetrics::default();

    metrics.readings_total = readings.len();
    metrics.analyzed = readings.iter().filter(|r| r.analysis.is_some()).count();
    metrics.pending = metrics.readings_total - metrics.analyzed;

    // Latest analyzed reading per equipment decides its zone
    for eqp in equipment {
        let latest = readings
            .iter()
            .filter(|r| r.equipment == eqp.id && r.analysis.is_some())
            .max_by_key(|r| r.taken_at);
        if let Some(reading) = latest {
            if let Some(analysis) = &reading.analysis {
                metrics.machines_monitored += 1;
                let zone_str = analysis.zone.to_string();
                *metrics.by_zone.entry(zone_str).or_insert(0) += 1;
                if matches!(analysis.zone, Zone::C | Zone::D) {
                    metrics.machines_in_alarm += 1;
                }
            }
        }
    }

    metrics
}

fn collect_reliability_metrics(equipment: &[Equipment]) -> ReliabilityMetrics {
    let mut metrics = ReliabilityMetrics::default();
    let mut health_scores: Vec<f64> = Vec::new();
    let today = chrono::Local::now().date_naive();

    for eqp in equipment {
        let results = &eqp.analysis_results;

        if let Some(health) = &results.health {
            metrics.analyzed += 1;
            health_scores.push(health.score);

            let status_str = format!("{:?}", health.status).to_lowercase();
            *metrics.by_health.entry(status_str).or_insert(0) += 1;
        } else {
            metrics.unanalyzed += 1;
        }

        if let Some(risk) = &results.risk {
            match format!("{:?}", risk.level).to_lowercase().as_str() {
                "critical" => metrics.critical_risk += 1,
                "high" => metrics.high_risk += 1,
                _ => {}
            }
        }

        if let Some(weibull) = &results.weibull {
            if weibull.used_fallback {
                metrics.fallback_params += 1;
            }
        }

        if let Some(maintenance) = &results.maintenance {
            if maintenance.next_due < today {
                metrics.overdue_maintenance += 1;
            }
        }
    }

    if !health_scores.is_empty() {
        metrics.avg_health = health_scores.iter().sum::<f64>() / health_scores.len() as f64;
    }

    metrics
}

fn collect_failure_metrics(failures: &[FailureEvent]) -> FailureMetrics {
    let mut metrics = FailureMetrics::default();
    let mut mode_counts: HashMap<&str, usize> = HashMap::new();

    for f in failures {
        metrics.total += 1;
        match f.resolution {
            Resolution::Open => metrics.open += 1,
            Resolution::Resolved => metrics.resolved += 1,
        }
        metrics.total_downtime_hours += f.downtime_hours.unwrap_or(0.0);
        *mode_counts.entry(f.failure_mode.as_str()).or_insert(0) += 1;
    }

    metrics.top_mode = mode_counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(mode, _)| mode.to_string());

    metrics
}

fn collect_calibration_metrics(
    project: &Project,
    equipment: &[Equipment],
    readings: &[Reading],
) -> CalibrationMetrics {
    let mut metrics = CalibrationMetrics::default();

    let path = project.calibration_path();
    let Ok(calibration) = Calibration::load_or_shipped(&path) else {
        metrics.version = "unreadable".to_string();
        return metrics;
    };

    metrics.version = calibration.version.clone();
    metrics.digest = calibration.digest();
    metrics.source = if path.exists() {
        "project".to_string()
    } else {
        "shipped".to_string()
    };

    let stamp = calibration.stamp();
    for reading in readings {
        if let Some(analysis) = &reading.analysis {
            if analysis.calibration != stamp {
                metrics.stale_results += 1;
            }
        }
    }
    for eqp in equipment {
        if let Some(weibull) = &eqp.analysis_results.weibull {
            if weibull.calibration != stamp {
                metrics.stale_results += 1;
            }
        }
    }

    metrics
}

fn format_equipment_metrics(m: &EquipmentMetrics) -> Vec<String> {
    let mut lines = vec![
        format!("Total:      {}", m.total),
        format!("Active:     {}", m.by_status.get("active").unwrap_or(&0)),
    ];

    let maintenance = *m.by_status.get("maintenance").unwrap_or(&0);
    if maintenance > 0 {
        lines.push(format!("In maint.:  {}", maintenance));
    }

    let critical = *m.by_criticality.get("critical").unwrap_or(&0);
    let high = *m.by_criticality.get("high").unwrap_or(&0);
    lines.push(format!("Crit/High:  {}/{}", critical, high));

    lines
}

fn format_condition_metrics(m: &ConditionMetrics) -> Vec<String> {
    let mut lines = vec![
        format!("Readings:   {} ({} pending)", m.readings_total, m.pending),
        format!("Monitored:  {}", m.machines_monitored),
    ];

    let zone_c = *m.by_zone.get("C").unwrap_or(&0);
    let zone_d = *m.by_zone.get("D").unwrap_or(&0);
    if zone_d > 0 {
        lines.push(format!("Zone D:     {} {}", zone_d, style("⚠").red()));
    }
    if zone_c > 0 {
        lines.push(format!("Zone C:     {} {}", zone_c, style("⚠").yellow()));
    }
    lines.push(format!(
        "Zone A/B:   {}/{}",
        m.by_zone.get("A").unwrap_or(&0),
        m.by_zone.get("B").unwrap_or(&0)
    ));

    lines
}

fn format_reliability_metrics(m: &ReliabilityMetrics) -> Vec<String> {
    let mut lines = vec![
        format!("Analyzed:   {} ({} pending)", m.analyzed, m.unanalyzed),
        format!("Avg health: {:.0}", m.avg_health),
    ];

    if m.critical_risk > 0 {
        lines.push(format!("Crit risk:  {} {}", m.critical_risk, style("⚠").red()));
    }
    if m.high_risk > 0 {
        lines.push(format!("High risk:  {}", m.high_risk));
    }
    if m.overdue_maintenance > 0 {
        lines.push(format!(
            "Overdue:    {} {}",
            m.overdue_maintenance,
            style("⚠").yellow()
        ));
    }
    if m.fallback_params > 0 {
        lines.push(format!("Fallback β/η: {}", m.fallback_params));
    }

    lines
}

fn format_failure_metrics(m: &FailureMetrics) -> Vec<String> {
    let mut lines = vec![
        format!("Total:      {}", m.total),
        format!("Open:       {}", m.open),
        format!("Downtime:   {}", format_hours(m.total_downtime_hours)),
    ];

    if let Some(ref mode) = m.top_mode {
        lines.push(format!("Top mode:   {}", mode));
    }

    lines
}

fn format_calibration_metrics(m: &CalibrationMetrics) -> Vec<String> {
    let mut lines = vec![
        format!("Version:    {} ({})", m.version, m.source),
    ];

    if m.stale_results > 0 {
        lines.push(format!(
            "Stale:      {} result(s) {}",
            m.stale_results,
            style("⚠").yellow()
        ));
    } else {
        lines.push("Stale:      0".to_string());
    }

    lines
}

fn print_two_columns(title1: &str, lines1: &[String], title2: &str, lines2: &[String]) {
    let col_width = 32;

    println!("{:<col_width$} {}", style(title1).bold(), style(title2).bold());
    if title2.is_empty() {
        println!("{:-<col_width$}", "");
    } else {
        println!("{:-<col_width$} {:-<col_width$}", "", "");
    }

    let max_lines = lines1.len().max(lines2.len());

    for i in 0..max_lines {
        let l1 = lines1.get(i).map(|s| s.as_str()).unwrap_or("");
        let l2 = lines2.get(i).map(|s| s.as_str()).unwrap_or("");
        println!("  {:<30} {}", l1, l2);
    }
}

fn calculate_health(
    condition: &ConditionMetrics,
    reliability: &ReliabilityMetrics,
    failures: &FailureMetrics,
    calibration: &CalibrationMetrics,
) -> String {
    let mut score = 100i32;

    // Machines vibrating in the alarm zones
    let zone_d = *condition.by_zone.get("D").unwrap_or(&0);
    let zone_c = *condition.by_zone.get("C").unwrap_or(&0);
    score -= 20 * zone_d as i32;
    score -= 8 * zone_c as i32;

    // Risk posture
    score -= 15 * reliability.critical_risk as i32;
    score -= 5 * reliability.high_risk as i32;

    // Overdue maintenance
    score -= 10 * reliability.overdue_maintenance as i32;

    // Open failure backlog
    if failures.open > 3 {
        score -= 15;
    } else {
        score -= 5 * failures.open as i32;
    }

    // Stale analysis results
    if calibration.stale_results > 0 {
        score -= 10;
    }

    match score {
        80..=100 => "Healthy".to_string(),
        50..=79 => "Warning".to_string(),
        _ => "Critical".to_string(),
    }
}
