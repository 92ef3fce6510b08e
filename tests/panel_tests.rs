//! Library-level tests across geometry, layout and aggregation

mod common;

use common::{small_layout, small_panel};
use panelmap::analytics::{
    aggregate_stress_data, calculate_yield_killers, cross_section_matrix,
    get_true_defect_coordinates, CellFilter, SideBias, SliceAxis, StressFilter, NO_DEFECTS,
};
use panelmap::core::config::{Config, FrameConfig, LayoutConfig};
use panelmap::core::geometry::{calculate_layout, PanelGrid, Quadrant};
use panelmap::core::verification::{DefectClassifier, Verified};
use panelmap::entities::{DefectRecord, LayerKey, PanelData, Side};
use panelmap::io::{generate_sample_data, DEFAULT_SEED};

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn test_scenario_small_grid_without_dynamic_gap() {
    let (ctx, _) = small_layout();
    assert_eq!(ctx.panel_width, 480.0);
    assert_eq!(ctx.quad_width, 240.0);
    assert_eq!(ctx.cell_width, (240.0 - 3.0 * 0.25) / 2.0);
}

#[test]
fn test_geometry_formulas_hold_across_inputs() {
    let frame = FrameConfig::default();
    for (rows, cols, dyn_x, dyn_y) in [(1, 1, 0.0, 0.0), (6, 6, 5.0, 3.5), (3, 8, 1.25, 0.5)] {
        let layout = LayoutConfig {
            panel_rows: rows,
            panel_cols: cols,
            dyn_gap_x: dyn_x,
            dyn_gap_y: dyn_y,
            ..LayoutConfig::default()
        };
        let ctx = calculate_layout(&frame, &layout).unwrap();

        let expected_width =
            frame.width - 2.0 * layout.fixed_offset_x - layout.fixed_gap_x - 4.0 * dyn_x;
        assert_eq!(ctx.panel_width, expected_width);
        assert_eq!(ctx.quad_width, expected_width / 2.0);
        assert_eq!(
            ctx.cell_width,
            (ctx.quad_width - (cols as f64 + 1.0) * frame.inter_unit_gap) / cols as f64
        );

        let (q1x, q1y) = ctx.quadrant_origin(Quadrant::Q1);
        let (q2x, q2y) = ctx.quadrant_origin(Quadrant::Q2);
        let (q3x, q3y) = ctx.quadrant_origin(Quadrant::Q3);
        let (q4x, q4y) = ctx.quadrant_origin(Quadrant::Q4);
        assert!((q2x - (q1x + ctx.quad_width + ctx.effective_gap_x)).abs() < 1e-10);
        assert_eq!(q2y, q1y);
        assert_eq!(q3x, q1x);
        assert!((q3y - (q1y + ctx.quad_height + ctx.effective_gap_y)).abs() < 1e-10);
        assert_eq!((q4x, q4y), (q2x, q3y));
    }
}

#[test]
fn test_geometry_is_deterministic() {
    let config = Config::default();
    let a = config.geometry().unwrap();
    let b = config.geometry().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.panel_width.to_bits(), b.panel_width.to_bits());
    assert_eq!(a.cell_height.to_bits(), b.cell_height.to_bits());
}

#[test]
fn test_degenerate_layout_is_rejected() {
    let layout = LayoutConfig {
        fixed_offset_x: 300.0,
        ..LayoutConfig::default()
    };
    let err = calculate_layout(&FrameConfig::default(), &layout).unwrap_err();
    assert!(err.to_string().contains("exceed the frame"));
}

// ============================================================================
// Layout and classification
// ============================================================================

#[test]
fn test_scenario_back_side_flip() {
    let panel = small_panel(vec![(1, Side::Back, vec![DefectRecord::new(3, 0, "Short")])]);
    let layer = panel.get_layer(1, Side::Back).unwrap();
    let defect = &layer.data()[0];
    assert_eq!(defect.physical_x_raw, 3);
    assert_eq!(defect.physical_x_flipped, 0);
    assert_eq!(defect.quadrant, Quadrant::Q2);
}

#[test]
fn test_front_side_is_never_mirrored() {
    let records = (0..4).map(|x| DefectRecord::new(x, 1, "Nick")).collect();
    let panel = small_panel(vec![(2, Side::Front, records)]);
    for d in panel.get_layer(2, Side::Front).unwrap().data() {
        assert_eq!(d.physical_x_flipped, d.physical_x_raw);
        assert_eq!(d.physical_x_raw, d.unit_x());
    }
}

#[test]
fn test_back_side_flip_is_an_involution() {
    let grid = PanelGrid::new(3, 5).unwrap();
    for x in 0..10 {
        let flipped = grid.mirror_x(x, Side::Back);
        assert_eq!(flipped, 9 - x);
        assert_eq!(grid.mirror_x(flipped, Side::Back), x);
    }
}

#[test]
fn test_verification_normalization() {
    let classifier = DefectClassifier::default();
    assert!(!classifier.is_true_defect(Some("ge57")));
    assert!(!classifier.is_true_defect(Some(" GE57 ")));
    assert!(!classifier.is_true_defect(Some("GE57")));
    assert!(classifier.is_true_defect(None));
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_scenario_true_defect_in_stress_map() {
    let panel = small_panel(vec![(
        1,
        Side::Front,
        vec![DefectRecord::new(0, 0, "Short").with_verification("T")],
    )]);
    let (_, grid) = small_layout();
    let data = aggregate_stress_data(
        &panel,
        &panel.keys(),
        &grid,
        &StressFilter::default(),
        &DefectClassifier::default(),
    );
    assert_eq!(data.count_at(0, 0), Some(1));
    assert!(data.hover_at(0, 0).unwrap().contains("Total: 1"));
}

#[test]
fn test_scenario_safe_defect_excluded_everywhere() {
    let panel = small_panel(vec![(
        1,
        Side::Front,
        vec![DefectRecord::new(0, 0, "Short").with_verification("N")],
    )]);
    let (_, grid) = small_layout();
    let classifier = DefectClassifier::default();

    let stress = aggregate_stress_data(&panel, &panel.keys(), &grid, &StressFilter::default(), &classifier);
    assert_eq!(stress.total_defects, 0);

    assert!(calculate_yield_killers(&panel, &classifier).is_none());

    let section = cross_section_matrix(&panel, SliceAxis::Y, 0, &grid, &classifier);
    assert_eq!(section.layer_labels, vec!["L1"]);
    assert!(section.matrix.iter().all(|c| *c == 0));

    assert!(get_true_defect_coordinates(&panel, &classifier, &CellFilter::default()).is_empty());
}

fn sample_panel() -> (PanelData, PanelGrid) {
    let config = Config::default();
    let grid = config.grid().unwrap();
    (
        generate_sample_data(&config.geometry().unwrap(), grid, DEFAULT_SEED),
        grid,
    )
}

#[test]
fn test_stress_total_matches_true_in_bounds_rows() {
    let (panel, grid) = sample_panel();
    let classifier = DefectClassifier::default();
    let keys = panel.keys();

    let data = aggregate_stress_data(&panel, &keys, &grid, &StressFilter::default(), &classifier);
    let expected = panel
        .get_combined_dataframe(None)
        .iter()
        .filter(|d| classifier.is_true_defect(d.verification()))
        .filter(|d| grid.contains(d.unit_x(), d.unit_y()))
        .count();

    assert_eq!(data.total_defects as usize, expected);
    assert_eq!(data.grid_counts.iter().map(|c| *c as usize).sum::<usize>(), expected);

    let (rows, cols) = data.shape();
    for y in 0..rows {
        for x in 0..cols {
            if data.count_at(x, y) == Some(0) {
                assert_eq!(data.hover_at(x, y), Some(NO_DEFECTS));
            }
        }
    }
}

#[test]
fn test_cross_section_column_sums_match_row_counts() {
    let (panel, grid) = sample_panel();
    let classifier = DefectClassifier::default();
    let combined = panel.get_combined_dataframe(None);

    for s in 0..grid.total_rows() as i32 {
        let section = cross_section_matrix(&panel, SliceAxis::Y, s, &grid, &classifier);
        let total: u32 = section.matrix.iter().sum();
        let expected = combined
            .iter()
            .filter(|d| classifier.is_true_defect(d.verification()))
            .filter(|d| d.unit_y() == s)
            .count();
        assert_eq!(total as usize, expected, "slice Y={}", s);
    }
}

#[test]
fn test_side_bias_matches_side_counts() {
    let (panel, _) = sample_panel();
    let classifier = DefectClassifier::default();
    let combined = panel.get_combined_dataframe(None);

    let count_side = |side: Side| {
        combined
            .iter()
            .filter(|d| d.side() == side)
            .filter(|d| classifier.is_true_defect(d.verification()))
            .count()
    };
    let (front, back) = (count_side(Side::Front), count_side(Side::Back));

    let metrics = calculate_yield_killers(&panel, &classifier).unwrap();
    assert_eq!(metrics.side_bias_diff, front.abs_diff(back));
    assert_eq!(metrics.side_bias == SideBias::Balanced, front == back);
}

#[test]
fn test_unique_cells_and_worst_unit_use_different_x() {
    // Front (0, 0) and back (3, 0) are the same physical unit
    let panel = small_panel(vec![
        (1, Side::Front, vec![DefectRecord::new(0, 0, "Nick")]),
        (2, Side::Back, vec![DefectRecord::new(3, 0, "Nick"), DefectRecord::new(3, 0, "Cut")]),
    ]);
    let classifier = DefectClassifier::default();

    let cells = get_true_defect_coordinates(&panel, &classifier, &CellFilter::default());
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[&(0, 0)].first_killer_layer, 1);
    assert_eq!(cells[&(0, 0)].defect_summary, "L1: 1, L2: 2");

    let metrics = calculate_yield_killers(&panel, &classifier).unwrap();
    assert_eq!(metrics.worst_unit, (3, 0));
    assert_eq!(metrics.worst_unit_count, 2);
}

#[test]
fn test_visual_origin_does_not_change_aggregation() {
    let (panel, grid) = sample_panel();
    let mut shifted_config = Config::default();
    shifted_config.layout.visual_origin_x = 12.0;
    shifted_config.layout.visual_origin_y = -4.0;
    let shifted = generate_sample_data(&shifted_config.geometry().unwrap(), grid, DEFAULT_SEED);

    let classifier = DefectClassifier::default();
    let a = aggregate_stress_data(&panel, &panel.keys(), &grid, &StressFilter::default(), &classifier);
    let b = aggregate_stress_data(&shifted, &shifted.keys(), &grid, &StressFilter::default(), &classifier);
    assert_eq!(a, b);
}

#[test]
fn test_missing_keys_are_skipped() {
    let (panel, grid) = sample_panel();
    let classifier = DefectClassifier::default();
    let data = aggregate_stress_data(
        &panel,
        &[LayerKey::new(99, Side::Front)],
        &grid,
        &StressFilter::default(),
        &classifier,
    );
    assert_eq!(data.total_defects, 0);
}
