//! Tests for console formatting.

use cutflow_core::Variation;
use cutflow_cuts::CutFlowHistogram;

use crate::table::format_weight;
use crate::{format_event, render_cut_flow, EventVisitor};

fn histogram() -> CutFlowHistogram {
    let labels = ["Initial", "PassGRL", ">= 2 jets", "MetTST > 50 GeV"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut histogram = CutFlowHistogram::new("SR", Variation::nominal(), labels);
    for _ in 0..1500 {
        histogram.fill_bin(1, 1.5);
    }
    for _ in 0..1200 {
        histogram.fill_bin(3, 1.5);
    }
    for _ in 0..300 {
        histogram.fill_bin(4, 1.5);
    }
    histogram
}

// ============================================================================
// Cut-flow tables
// ============================================================================

#[test]
fn test_table_lists_every_bin() {
    let table = render_cut_flow(&histogram());
    assert!(table.contains("SR (Nominal)"));
    for label in ["Initial", "PassGRL", ">= 2 jets", "MetTST > 50 GeV"] {
        assert!(table.contains(label), "missing {}", label);
    }
    assert!(table.contains("3,000"));
    assert!(table.contains("1,500"));
    assert!(table.contains("4,500.00"));
}

#[test]
fn test_table_relative_efficiency() {
    let table = render_cut_flow(&histogram());
    assert!(table.contains("100.00%"));
    assert!(table.contains("50.00%"));
    assert!(table.contains("20.00%"));
}

#[test]
fn test_empty_bins_have_no_efficiency() {
    let labels = vec!["Initial".to_string(), "cut".to_string(), "next".to_string()];
    let table = render_cut_flow(&CutFlowHistogram::new("CR", Variation::new("JET_JES__1up"), labels));
    assert!(table.contains("CR (JET_JES__1up)"));
    assert!(table.contains(" -"));
}

#[test]
fn test_weight_formatting() {
    assert_eq!(format_weight(0.0), "0.00");
    assert_eq!(format_weight(1234567.891), "1,234,567.89");
    assert_eq!(format_weight(-2.5), "-2.50");
}

// ============================================================================
// Lifecycle events
// ============================================================================

#[test]
fn test_lifecycle_events_are_formatted() {
    let visitor = EventVisitor {
        event: Some("registry_locked".to_string()),
        scopes: Some(2),
        variables: Some(12_500),
        containers: Some(3),
        ..EventVisitor::default()
    };
    let line = format_event(&visitor);
    assert!(line.contains("Registry locked"));
    assert!(line.contains("12,500"));

    let visitor = EventVisitor {
        event: Some("cut_flow_added".to_string()),
        cut_flow: Some("SR".to_string()),
        cuts: Some(3),
        ..EventVisitor::default()
    };
    assert!(format_event(&visitor).contains("SR"));
}

#[test]
fn test_unknown_events_are_silent() {
    let visitor = EventVisitor {
        event: Some("something_else".to_string()),
        ..EventVisitor::default()
    };
    assert!(format_event(&visitor).is_empty());
    assert!(format_event(&EventVisitor::default()).is_empty());
}
