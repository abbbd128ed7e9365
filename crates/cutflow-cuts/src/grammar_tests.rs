//! Tests for the cut string grammar.

use cutflow_core::CutflowError;

use crate::grammar::{parse_condition, parse_target, CutTarget};
use crate::relation::{canonicalize, Relation, Threshold};

// ============================================================================
// Targets
// ============================================================================

#[test]
fn test_scalar_target() {
    assert_eq!(
        parse_target("N_Jets").unwrap(),
        CutTarget::Variable("N_Jets".to_string())
    );
    assert_eq!(
        parse_target("  MetTST ").unwrap(),
        CutTarget::Variable("MetTST".to_string())
    );
}

#[test]
fn test_element_target() {
    assert_eq!(
        parse_target("Muon pt[0]").unwrap(),
        CutTarget::Element {
            container: "Muon".to_string(),
            field: "pt".to_string(),
            index: 0,
        }
    );
    assert_eq!(
        parse_target("Elec  d0sig [ 12 ]").unwrap(),
        CutTarget::Element {
            container: "Elec".to_string(),
            field: "d0sig".to_string(),
            index: 12,
        }
    );
}

#[test]
fn test_malformed_targets() {
    for input in ["", "Muon pt", "Muon pt[", "Muon pt[0", "Muon pt[-1]", "Muon pt[1.5]", "2jets", "Muon pt[0] x", "N$Jets"] {
        let err = parse_target(input).unwrap_err();
        assert!(matches!(err, CutflowError::Parse(_)), "{:?} gave {:?}", input, err);
    }
}

#[test]
fn test_error_names_position() {
    let err = parse_target("Muon pt[x]").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("expected a number"), "{}", message);
    assert!(message.contains("position 8"), "{}", message);
}

// ============================================================================
// Conditions
// ============================================================================

#[test]
fn test_every_relation() {
    let cases = [
        (">=2", Relation::GreaterEqual),
        ("<=2", Relation::LessEqual),
        ("==2", Relation::Equal),
        ("!=2", Relation::NotEqual),
        ("<2", Relation::Less),
        (">2", Relation::Greater),
    ];
    for (input, relation) in cases {
        let condition = parse_condition(input).unwrap();
        assert_eq!(condition.relation, relation, "{}", input);
        assert_eq!(condition.threshold, Threshold::Int(2));
    }
}

#[test]
fn test_number_literals() {
    assert_eq!(parse_condition(">= 50000").unwrap().threshold, Threshold::Int(50000));
    assert_eq!(parse_condition("<-3").unwrap().threshold, Threshold::Int(-3));
    assert_eq!(parse_condition("<2.5").unwrap().threshold, Threshold::Float(2.5));
    assert_eq!(parse_condition(">5e4").unwrap().threshold, Threshold::Float(50000.0));
    assert_eq!(parse_condition(">.5").unwrap().threshold, Threshold::Float(0.5));
}

#[test]
fn test_malformed_conditions() {
    for input in ["", "2", "=2", "!2", ">=", ">= x", ">=2 3", ">1e", ">-", "=>2"] {
        assert!(parse_condition(input).is_err(), "{:?} should not parse", input);
    }
}

// ============================================================================
// Canonicalization
// ============================================================================

#[test]
fn test_integral_inclusive_relations_shift_threshold() {
    assert_eq!(
        canonicalize(Relation::GreaterEqual, Threshold::Int(2)),
        (Relation::Greater, Threshold::Int(1))
    );
    assert_eq!(
        canonicalize(Relation::LessEqual, Threshold::Int(2)),
        (Relation::Less, Threshold::Int(3))
    );
    assert_eq!(
        canonicalize(Relation::Equal, Threshold::Int(2)),
        (Relation::Equal, Threshold::Int(2))
    );
}

#[test]
fn test_float_inclusive_relations_become_strict() {
    assert_eq!(
        canonicalize(Relation::GreaterEqual, Threshold::Float(50.0)),
        (Relation::Greater, Threshold::Float(50.0))
    );
    assert_eq!(
        canonicalize(Relation::LessEqual, Threshold::Float(2.5)),
        (Relation::Less, Threshold::Float(2.5))
    );
}
