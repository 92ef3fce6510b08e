//! Pareto and quadrant breakdowns of defect populations

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::geometry::Quadrant;
use crate::core::verification::Verified;
use crate::entities::layer::PlacedDefect;

/// Column a Pareto chart counts by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParetoGroup {
    /// Verification code when any row carries one, otherwise defect type
    #[default]
    Auto,
    DefectType,
    Verification,
}

impl ParetoGroup {
    /// Resolve `Auto` against the data
    pub fn resolve(self, defects: &[&PlacedDefect]) -> ParetoGroup {
        match self {
            ParetoGroup::Auto if defects.iter().any(|d| d.verification().is_some()) => {
                ParetoGroup::Verification
            }
            ParetoGroup::Auto => ParetoGroup::DefectType,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoEntry {
    pub category: String,
    pub count: usize,
    /// Share of the total in percent
    pub percent: f64,
    pub cumulative_percent: f64,
}

/// Count defects per category, most frequent first (ties alphabetical)
pub fn defect_pareto(defects: &[&PlacedDefect], group: ParetoGroup) -> Vec<ParetoEntry> {
    let group = group.resolve(defects);
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for d in defects {
        let category = match group {
            ParetoGroup::Verification => d.verification().unwrap_or("N/A"),
            _ => d.defect_type(),
        };
        *counts.entry(category).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let total = defects.len() as f64;
    let mut running = 0usize;
    ranked
        .into_iter()
        .map(|(category, count)| {
            running += count;
            ParetoEntry {
                category: category.to_string(),
                count,
                percent: count as f64 / total * 100.0,
                cumulative_percent: running as f64 / total * 100.0,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadrantSummary {
    pub quadrant: Quadrant,
    pub count: usize,
    pub percent: f64,
}

/// Defect counts for all four quadrants, in quadrant order
pub fn quadrant_summary(defects: &[&PlacedDefect]) -> Vec<QuadrantSummary> {
    let total = defects.len();
    Quadrant::ALL
        .into_iter()
        .map(|quadrant| {
            let count = defects.iter().filter(|d| d.quadrant == quadrant).count();
            let percent = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            };
            QuadrantSummary {
                quadrant,
                count,
                percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::geometry::PanelGrid;
    use crate::core::layout::place_defect;
    use crate::entities::defect::DefectRecord;

    fn place(records: Vec<DefectRecord>) -> Vec<PlacedDefect> {
        let ctx = Config::default().geometry().unwrap();
        let grid = PanelGrid::new(2, 2).unwrap();
        records
            .into_iter()
            .map(|r| place_defect(r, &ctx, &grid, (0.0, 0.0)))
            .collect()
    }

    #[test]
    fn test_pareto_by_defect_type() {
        let placed = place(vec![
            DefectRecord::new(0, 0, "Short"),
            DefectRecord::new(0, 0, "Nick"),
            DefectRecord::new(1, 0, "Short"),
            DefectRecord::new(1, 0, "Cut"),
        ]);
        let refs: Vec<&PlacedDefect> = placed.iter().collect();
        let pareto = defect_pareto(&refs, ParetoGroup::Auto);

        let categories: Vec<&str> = pareto.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories, vec!["Short", "Cut", "Nick"]);
        assert_eq!(pareto[0].count, 2);
        assert!((pareto[0].percent - 50.0).abs() < 1e-10);
        assert!((pareto[2].cumulative_percent - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_pareto_auto_prefers_verification() {
        let placed = place(vec![
            DefectRecord::new(0, 0, "Short").with_verification("CU18"),
            DefectRecord::new(0, 0, "Nick").with_verification("CU18"),
            DefectRecord::new(1, 0, "Short"),
        ]);
        let refs: Vec<&PlacedDefect> = placed.iter().collect();
        let pareto = defect_pareto(&refs, ParetoGroup::Auto);
        assert_eq!(pareto[0].category, "CU18");
        assert_eq!(pareto[0].count, 2);
        assert_eq!(pareto[1].category, "N/A");

        let by_type = defect_pareto(&refs, ParetoGroup::DefectType);
        assert_eq!(by_type[0].category, "Short");
    }

    #[test]
    fn test_empty_pareto() {
        assert!(defect_pareto(&[], ParetoGroup::Auto).is_empty());
    }

    #[test]
    fn test_quadrant_summary() {
        let placed = place(vec![
            DefectRecord::new(0, 0, "Short"),
            DefectRecord::new(3, 0, "Short"),
            DefectRecord::new(3, 3, "Short"),
            DefectRecord::new(2, 2, "Short"),
        ]);
        let refs: Vec<&PlacedDefect> = placed.iter().collect();
        let summary = quadrant_summary(&refs);

        assert_eq!(summary.len(), 4);
        assert_eq!(summary[0].count, 1);
        assert_eq!(summary[1].count, 1);
        assert_eq!(summary[2].count, 0);
        assert_eq!(summary[3].count, 2);
        assert!((summary[3].percent - 50.0).abs() < 1e-10);

        let empty = quadrant_summary(&[]);
        assert!(empty.iter().all(|q| q.count == 0 && q.percent == 0.0));
    }
}
