//! Integration tests for the MRT CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get an mrt command
fn mrt() -> Command {
    Command::cargo_bin("mrt").unwrap()
}

/// Helper to create a test project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    mrt().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Helper to create a test equipment, returning its full ID
fn create_test_equipment(tmp: &TempDir, tag: &str, title: &str) -> String {
    mrt()
        .current_dir(tmp.path())
        .args([
            "eqp",
            "new",
            "--tag",
            tag,
            "--title",
            title,
            "--category",
            "pump",
            "--subtype",
            "centrifugal",
            "--operating-hours",
            "12000",
            "--no-edit",
        ])
        .assert()
        .success();

    // The file is named {ID}.mrt.yaml
    find_latest_id(tmp, "equipment")
}

/// Helper to record a reading against an equipment reference
fn create_test_reading(tmp: &TempDir, equipment: &str, point: &str, vel_v: &str) {
    mrt()
        .current_dir(tmp.path())
        .args([
            "rdg", "new", equipment, "--point", point, "--vel-v", vel_v, "--vel-h", "2.0",
        ])
        .assert()
        .success();
}

/// Helper to record a failure event
fn create_test_failure(tmp: &TempDir, equipment: &str, mode: &str, hours: &str) {
    mrt()
        .current_dir(tmp.path())
        .args([
            "flr", "new", equipment, "--mode", mode, "--hours", hours, "--no-edit",
        ])
        .assert()
        .success();
}

/// Newest entity ID in one of the project directories
fn find_latest_id(tmp: &TempDir, dir: &str) -> String {
    let mut entries: Vec<_> = fs::read_dir(tmp.path().join(dir))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().to_string_lossy().ends_with(".mrt.yaml"))
        .collect();
    entries.sort_by_key(|e| e.file_name());
    let name = entries.last().unwrap().file_name();
    name.to_string_lossy()
        .trim_end_matches(".mrt.yaml")
        .to_string()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    mrt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Machine Reliability Toolkit"));
}

#[test]
fn test_version_displays() {
    mrt().arg("--version").assert().success();
}

#[test]
fn test_completions_bash() {
    mrt()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mrt"));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_structure() {
    let tmp = TempDir::new().unwrap();
    mrt()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success();

    assert!(tmp.path().join(".mrt").is_dir());
    assert!(tmp.path().join(".mrt/calibration.yaml").is_file());
    assert!(tmp.path().join("equipment").is_dir());
    assert!(tmp.path().join("readings").is_dir());
    assert!(tmp.path().join("failures").is_dir());
}

#[test]
fn test_init_twice_warns_without_force() {
    let tmp = setup_test_project();
    mrt()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

// ============================================================================
// Equipment Tests
// ============================================================================

#[test]
fn test_eqp_new_and_list() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-101A", "Feed Pump A");

    mrt()
        .current_dir(tmp.path())
        .args(["eqp", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P-101A"));
}

#[test]
fn test_eqp_new_writes_yaml_file() {
    let tmp = setup_test_project();
    let id = create_test_equipment(&tmp, "C-201", "Gas Compressor");

    assert!(id.starts_with("EQP-"));
    let content =
        fs::read_to_string(tmp.path().join("equipment").join(format!("{}.mrt.yaml", id)))
            .unwrap();
    assert!(content.contains("C-201"));
    assert!(content.contains("pump"));
}

#[test]
fn test_eqp_show_by_short_id() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-102", "Transfer Pump");

    mrt()
        .current_dir(tmp.path())
        .args(["eqp", "show", "EQP@1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("P-102"));
}

#[test]
fn test_eqp_list_count() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-103", "Pump One");
    create_test_equipment(&tmp, "P-104", "Pump Two");

    mrt()
        .current_dir(tmp.path())
        .args(["eqp", "list", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2"));
}

#[test]
fn test_eqp_analyze_writes_results() {
    let tmp = setup_test_project();
    let id = create_test_equipment(&tmp, "P-105", "Booster Pump");

    mrt()
        .current_dir(tmp.path())
        .args(["eqp", "analyze", "EQP@1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MTTF"));

    let content =
        fs::read_to_string(tmp.path().join("equipment").join(format!("{}.mrt.yaml", id)))
            .unwrap();
    assert!(content.contains("weibull:"));
    assert!(content.contains("health:"));
}

#[test]
fn test_eqp_simulate_is_reproducible() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-106", "Injection Pump");

    let first = mrt()
        .current_dir(tmp.path())
        .args(["eqp", "simulate", "EQP@1", "--samples", "500", "--seed", "42"])
        .output()
        .unwrap();
    let second = mrt()
        .current_dir(tmp.path())
        .args(["eqp", "simulate", "EQP@1", "--samples", "500", "--seed", "42"])
        .output()
        .unwrap();

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_eqp_fit_needs_two_failures() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-107", "Sump Pump");
    create_test_failure(&tmp, "EQP@1", "seal-leak", "8000");

    mrt()
        .current_dir(tmp.path())
        .args(["eqp", "fit", "EQP@1"])
        .assert()
        .failure();
}

#[test]
fn test_eqp_fit_with_history() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-108", "Firewater Pump");
    create_test_failure(&tmp, "EQP@1", "bearing-wear", "9000");
    create_test_failure(&tmp, "EQP@1", "bearing-wear", "15000");
    create_test_failure(&tmp, "EQP@1", "seal-leak", "21000");

    mrt()
        .current_dir(tmp.path())
        .args(["eqp", "fit", "EQP@1"])
        .assert()
        .success();
}

// ============================================================================
// Reading Tests
// ============================================================================

#[test]
fn test_rdg_new_and_analyze() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-110", "Charge Pump");
    create_test_reading(&tmp, "EQP@1", "pump-nde", "2.1");

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "analyze", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Analyzed 1"));

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("analyzed"));
}

#[test]
fn test_rdg_new_rejects_unknown_equipment() {
    let tmp = setup_test_project();

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "new", "EQP-NOPE", "--point", "pump-de", "--vel-v", "1.0"])
        .assert()
        .failure();
}

#[test]
fn test_rdg_analyze_zone_in_output() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-111", "Cooling Pump");

    // 10 mm/s on each axis is deep in zone D for the default bands
    mrt()
        .current_dir(tmp.path())
        .args([
            "rdg", "new", "EQP@1", "--point", "pump-de", "--vel-v", "10.0", "--vel-h", "10.0",
            "--analyze",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("zone"));
}

#[test]
fn test_rdg_import_csv() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-112", "Process Pump");

    let csv_path = tmp.path().join("route.csv");
    fs::write(
        &csv_path,
        "equipment,measurement_point,taken_at,vel_v,vel_h\n\
         P-112,pump-nde,2026-08-01T10:00:00Z,2.1,2.4\n\
         P-112,pump-de,2026-08-01T10:05:00Z,1.8,1.9\n",
    )
    .unwrap();

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "import", "route.csv", "--analyze"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2"));

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "list", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2"));
}

#[test]
fn test_rdg_import_skips_unknown_equipment() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-113", "Metering Pump");

    let csv_path = tmp.path().join("route.csv");
    fs::write(
        &csv_path,
        "equipment,measurement_point,taken_at,vel_v\n\
         P-113,pump-nde,2026-08-01T10:00:00Z,2.1\n\
         GHOST,pump-de,2026-08-01T10:05:00Z,1.8\n",
    )
    .unwrap();

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "import", "route.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1"));
}

#[test]
fn test_rdg_trend_needs_two_readings() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-114", "Vacuum Pump");
    create_test_reading(&tmp, "EQP@1", "pump-nde", "2.0");

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "analyze", "--all"])
        .assert()
        .success();

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "trend", "EQP@1"])
        .assert()
        .failure();
}

#[test]
fn test_rdg_trend_direction() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-115", "Screw Pump");
    create_test_reading(&tmp, "EQP@1", "pump-nde", "1.0");
    create_test_reading(&tmp, "EQP@1", "pump-nde", "2.0");
    create_test_reading(&tmp, "EQP@1", "pump-nde", "3.0");

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "analyze", "--all"])
        .assert()
        .success();

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "trend", "EQP@1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rising"));
}

// ============================================================================
// Failure Tests
// ============================================================================

#[test]
fn test_flr_new_and_list() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-120", "Dosing Pump");
    create_test_failure(&tmp, "EQP@1", "seal-leak", "14000");

    mrt()
        .current_dir(tmp.path())
        .args(["flr", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seal-leak"));
}

#[test]
fn test_flr_resolve() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-121", "Slurry Pump");
    create_test_failure(&tmp, "EQP@1", "impeller-erosion", "6000");

    mrt()
        .current_dir(tmp.path())
        .args(["flr", "resolve", "FLR@1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolved"));

    mrt()
        .current_dir(tmp.path())
        .args(["flr", "list", "--resolution", "open", "--count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0"));
}

#[test]
fn test_flr_new_rejects_negative_hours() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-122", "Chemical Pump");

    mrt()
        .current_dir(tmp.path())
        .args([
            "flr", "new", "EQP@1", "--mode", "seal-leak", "--hours", "-5", "--no-edit",
        ])
        .assert()
        .failure();
}

// ============================================================================
// Calibration Tests
// ============================================================================

#[test]
fn test_calib_status() {
    let tmp = setup_test_project();

    mrt()
        .current_dir(tmp.path())
        .args(["calib", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Version:"));
}

#[test]
fn test_calib_reset_force() {
    let tmp = setup_test_project();

    mrt()
        .current_dir(tmp.path())
        .args(["calib", "reset", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote calibration"));

    assert!(tmp.path().join(".mrt/calibration.yaml").is_file());
}

// ============================================================================
// Validate Tests
// ============================================================================

#[test]
fn test_validate_clean_project_passes() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-130", "Feed Pump");
    create_test_reading(&tmp, "EQP@1", "pump-nde", "2.1");

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "analyze", "--all"])
        .assert()
        .success();

    mrt()
        .current_dir(tmp.path())
        .args(["validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All files passed"));
}

#[test]
fn test_validate_catches_schema_violation() {
    let tmp = setup_test_project();
    let id = create_test_equipment(&tmp, "P-131", "Export Pump");

    // Strip a required field
    let path = tmp.path().join("equipment").join(format!("{}.mrt.yaml", id));
    let content = fs::read_to_string(&path).unwrap();
    let broken: String = content
        .lines()
        .filter(|l| !l.starts_with("tag:"))
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(&path, broken).unwrap();

    mrt()
        .current_dir(tmp.path())
        .args(["validate", "--keep-going"])
        .assert()
        .failure();
}

#[test]
fn test_validate_fix_recomputes_rms() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-132", "Seawater Pump");
    create_test_reading(&tmp, "EQP@1", "pump-nde", "2.1");

    mrt()
        .current_dir(tmp.path())
        .args(["rdg", "analyze", "--all"])
        .assert()
        .success();

    // Tamper with the stored RMS
    let id = find_latest_id(&tmp, "readings");
    let path = tmp.path().join("readings").join(format!("{}.mrt.yaml", id));
    let content = fs::read_to_string(&path).unwrap();
    fs::write(&path, tamper_rms(&content)).unwrap();

    // With --strict the drift is an error
    mrt()
        .current_dir(tmp.path())
        .args(["validate", "--strict", "--keep-going"])
        .assert()
        .failure();

    // --fix rewrites the derived block
    mrt()
        .current_dir(tmp.path())
        .args(["validate", "--fix"])
        .assert()
        .success();

    mrt()
        .current_dir(tmp.path())
        .args(["validate", "--strict"])
        .assert()
        .success();
}

/// Replace the stored rms_velocity with an obviously wrong value
fn tamper_rms(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            if line.trim_start().starts_with("rms_velocity:") {
                let indent = &line[..line.len() - line.trim_start().len()];
                format!("{}rms_velocity: 99.0", indent)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Status and Report Tests
// ============================================================================

#[test]
fn test_status_dashboard() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-140", "Main Pump");

    mrt()
        .current_dir(tmp.path())
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("EQUIPMENT"))
        .stdout(predicate::str::contains("Fleet Health"));
}

#[test]
fn test_status_json() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-141", "Spare Pump");

    let output = mrt()
        .current_dir(tmp.path())
        .args(["-f", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status -f json should emit valid JSON");
    assert_eq!(parsed["equipment"]["total"], 1);
}

#[test]
fn test_report_pareto() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-142", "Feed Pump");
    create_test_failure(&tmp, "EQP@1", "bearing-wear", "9000");
    create_test_failure(&tmp, "EQP@1", "bearing-wear", "15000");
    create_test_failure(&tmp, "EQP@1", "seal-leak", "11000");

    mrt()
        .current_dir(tmp.path())
        .args(["report", "pareto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bearing-wear"))
        .stdout(predicate::str::contains("Vital few"));
}

#[test]
fn test_report_fleet_to_file() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-143", "Lube Oil Pump");

    mrt()
        .current_dir(tmp.path())
        .args(["eqp", "analyze", "--all"])
        .assert()
        .success();

    mrt()
        .current_dir(tmp.path())
        .args(["report", "fleet", "-o", "fleet.md"])
        .assert()
        .success();

    let report = fs::read_to_string(tmp.path().join("fleet.md")).unwrap();
    assert!(report.contains("# Fleet Condition Summary"));
    assert!(report.contains("P-143"));
}

#[test]
fn test_report_survival() {
    let tmp = setup_test_project();
    create_test_equipment(&tmp, "P-144", "Condensate Pump");

    mrt()
        .current_dir(tmp.path())
        .args(["report", "survival", "EQP@1", "--points", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Survival Curve"))
        .stdout(predicate::str::contains("B10 life"));
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_config_set_and_show() {
    let tmp = setup_test_project();

    mrt()
        .current_dir(tmp.path())
        .args(["config", "set", "author", "Test Engineer"])
        .assert()
        .success();

    mrt()
        .current_dir(tmp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Engineer"));
}
