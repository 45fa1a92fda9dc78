//! Pareto analysis of failure modes
//!
//! Ranks failure modes by frequency and finds the vital few: the modes
//! covering the first 80% of all failures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Cumulative-percentage cutoff for the vital few
const VITAL_FEW_CUTOFF: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoMode {
    pub mode: String,
    pub count: usize,
    pub percentage: f64,
    pub cumulative_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParetoAnalysis {
    /// Modes sorted by count descending; ties break alphabetically
    pub modes: Vec<ParetoMode>,
    pub total_failures: usize,
    /// Mode names with cumulative percentage <= 80, never empty when any
    /// failures exist
    pub vital_few: Vec<String>,
}

pub fn analyze(failure_modes: &[String]) -> ParetoAnalysis {
    if failure_modes.is_empty() {
        return ParetoAnalysis::default();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for mode in failure_modes {
        *counts.entry(mode.as_str()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total = failure_modes.len();
    let mut cumulative = 0.0;
    let modes: Vec<ParetoMode> = ranked
        .into_iter()
        .map(|(mode, count)| {
            let percentage = count as f64 / total as f64 * 100.0;
            cumulative += percentage;
            ParetoMode {
                mode: mode.to_string(),
                count,
                percentage,
                cumulative_percentage: cumulative,
            }
        })
        .collect();

    let mut vital_few: Vec<String> = modes
        .iter()
        .filter(|mode| mode.cumulative_percentage <= VITAL_FEW_CUTOFF)
        .map(|mode| mode.mode.clone())
        .collect();
    // A single dominant mode past the cutoff is still the vital few
    if vital_few.is_empty() {
        vital_few.push(modes[0].mode.clone());
    }

    ParetoAnalysis {
        modes,
        total_failures: total,
        vital_few,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modes(counts: &[(&str, usize)]) -> Vec<String> {
        counts
            .iter()
            .flat_map(|(mode, count)| std::iter::repeat_n(mode.to_string(), *count))
            .collect()
    }

    #[test]
    fn test_ranking_and_percentages() {
        let analysis = analyze(&modes(&[
            ("Bearing Failure", 5),
            ("Unbalance", 3),
            ("Misalignment", 1),
            ("Looseness", 1),
        ]));

        assert_eq!(analysis.total_failures, 10);
        assert_eq!(analysis.modes.len(), 4);

        assert_eq!(analysis.modes[0].mode, "Bearing Failure");
        assert!((analysis.modes[0].percentage - 50.0).abs() < 1e-9);
        assert!((analysis.modes[0].cumulative_percentage - 50.0).abs() < 1e-9);

        assert_eq!(analysis.modes[1].mode, "Unbalance");
        assert!((analysis.modes[1].cumulative_percentage - 80.0).abs() < 1e-9);

        // Equal counts rank alphabetically
        assert_eq!(analysis.modes[2].mode, "Looseness");
        assert_eq!(analysis.modes[3].mode, "Misalignment");

        let sum: f64 = analysis.modes.iter().map(|m| m.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cumulative_is_non_decreasing() {
        let analysis = analyze(&modes(&[
            ("Cavitation", 4),
            ("Seal Leak", 2),
            ("Corrosion", 2),
            ("Fatigue", 1),
        ]));

        let mut last = 0.0;
        for mode in &analysis.modes {
            assert!(mode.cumulative_percentage >= last);
            last = mode.cumulative_percentage;
        }
        assert!((last - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_vital_few_at_cutoff() {
        // 50% + 30% lands exactly on the 80% boundary: both are vital
        let analysis = analyze(&modes(&[
            ("Bearing Failure", 5),
            ("Unbalance", 3),
            ("Misalignment", 2),
        ]));
        assert_eq!(
            analysis.vital_few,
            vec!["Bearing Failure".to_string(), "Unbalance".to_string()]
        );
    }

    #[test]
    fn test_single_dominant_mode_is_vital() {
        let analysis = analyze(&modes(&[("Seal Leak", 9), ("Other", 1)]));
        assert!(analysis.modes[0].cumulative_percentage > 80.0);
        assert_eq!(analysis.vital_few, vec!["Seal Leak".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        let analysis = analyze(&[]);
        assert!(analysis.modes.is_empty());
        assert!(analysis.vital_few.is_empty());
        assert_eq!(analysis.total_failures, 0);
    }
}
