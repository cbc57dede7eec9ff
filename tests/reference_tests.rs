//! Integration tests for the dependency passes
//!
//! Covers:
//! - Transitive reference collection with memoization
//! - Direct, indirect, and isolated circular references
//! - Unit checking across the declaration graph

use metrica::scope::DeclId;
use metrica::{Sheet, process};
use pretty_assertions::assert_eq;

fn decl(sheet: &Sheet, name: &str) -> DeclId {
    sheet
        .resolved
        .scope
        .try_get_declaration(name)
        .unwrap_or_else(|| panic!("declaration {name} missing"))
}

fn reference_names(sheet: &Sheet, name: &str) -> Vec<String> {
    let mut names: Vec<String> = sheet
        .analysis
        .references(decl(sheet, name))
        .into_iter()
        .map(|id| sheet.resolved.scope.get(id).name.clone())
        .collect();
    names.sort();
    names
}

// ==================== Reference Collection Tests ====================

#[test]
fn test_transitive_references() {
    let sheet = process("test.mt", "a = 1\nb = a + 1\nc = b * 2\nd = c + a");
    assert!(!sheet.has_errors());
    assert_eq!(reference_names(&sheet, "a"), Vec::<String>::new());
    assert_eq!(reference_names(&sheet, "b"), ["a"]);
    assert_eq!(reference_names(&sheet, "c"), ["a", "b"]);
    assert_eq!(reference_names(&sheet, "d"), ["a", "b", "c"]);
}

#[test]
fn test_shared_declaration_counted_once() {
    // `base` is reachable through two paths; the set is still a set.
    let sheet = process("test.mt", "base = 2\nleft = base + 1\nright = base * 3\ntop = left + right");
    assert_eq!(reference_names(&sheet, "top"), ["base", "left", "right"]);
}

#[test]
fn test_references_are_copies() {
    let sheet = process("test.mt", "a = 1\nb = a + 1");
    let b = decl(&sheet, "b");
    let mut first = sheet.analysis.references(b);
    first.clear();
    // Mutating the returned set does not corrupt the cache.
    assert_eq!(sheet.analysis.references(b).len(), 1);
}

// ==================== Cycle Tests ====================

#[test]
fn test_direct_cycle_flags_both() {
    let sheet = process("test.mt", "x = 13 + y\ny = 25 + x");
    assert!(sheet.analysis.has_circular_reference(decl(&sheet, "x")));
    assert!(sheet.analysis.has_circular_reference(decl(&sheet, "y")));
    assert!(
        sheet
            .errors
            .iter()
            .any(|e| e.code_str() == "structure::circular_reference")
    );
}

#[test]
fn test_indirect_cycle_flags_all_three() {
    let sheet = process("test.mt", "x = 13 + z\ny = 12 + x\nz = 11 + y");
    for name in ["x", "y", "z"] {
        assert!(
            sheet.analysis.has_circular_reference(decl(&sheet, name)),
            "{name} should be flagged"
        );
    }
}

#[test]
fn test_partial_isolation() {
    let sheet = process(
        "test.mt",
        "x = 13 + z\ny = 12 + x\nz = 11 + y\na = 45\nb = 12 + a",
    );
    for name in ["x", "y", "z"] {
        assert!(
            sheet.analysis.has_circular_reference(decl(&sheet, name)),
            "{name} should be flagged"
        );
    }
    for name in ["a", "b"] {
        assert!(
            !sheet.analysis.has_circular_reference(decl(&sheet, name)),
            "{name} should not be flagged"
        );
    }
    // The unrelated declarations still evaluate.
    assert!(sheet.evaluation.value(decl(&sheet, "b")).is_some());
    assert!(sheet.evaluation.value(decl(&sheet, "x")).is_none());
}

#[test]
fn test_self_reference_is_a_cycle() {
    let sheet = process("test.mt", "x = x + 1");
    assert!(sheet.analysis.has_circular_reference(decl(&sheet, "x")));
}

#[test]
fn test_cycle_reported_once_per_declaration() {
    let sheet = process("test.mt", "x = 13 + y\ny = 25 + x");
    let cycle_errors = sheet
        .errors
        .iter()
        .filter(|e| e.code_str() == "structure::circular_reference")
        .count();
    assert_eq!(cycle_errors, 2);
}

// ==================== Unit Checking Tests ====================

#[test]
fn test_unit_check_area_example() {
    let sheet = process(
        "test.mt",
        "area <A> {mm^2} = 100 {mm} * 200 {mm} + 400 {mm^2}",
    );
    assert!(!sheet.has_errors());
    let unit = sheet
        .analysis
        .assigned_unit(decl(&sheet, "area"))
        .expect("area should have a unit");
    assert_eq!(unit.to_display_string(), "mm^2");
}

#[test]
fn test_unit_check_area_mismatch() {
    let sheet = process(
        "test.mt",
        "area <A> {mm^2} = 100 {mm} * 200 {mm} + 400 {mm}",
    );
    assert!(sheet.analysis.assigned_unit(decl(&sheet, "area")).is_none());
    assert!(sheet.errors.iter().any(|e| e.code_str() == "unit::mismatch"));
}

#[test]
fn test_unit_flows_through_references() {
    let sheet = process(
        "test.mt",
        "width {mm} = 100\nheight {mm} = 200\narea {mm^2} = width * height",
    );
    assert!(!sheet.has_errors());
    let unit = sheet
        .analysis
        .assigned_unit(decl(&sheet, "area"))
        .expect("area should have a unit");
    assert_eq!(unit.to_display_string(), "mm^2");
}

#[test]
fn test_unknown_name_reported_by_unit_checker() {
    let sheet = process("test.mt", "a = ghost + 1");
    assert!(sheet.errors.iter().any(|e| e.code_str() == "name::undefined"));
    assert!(sheet.analysis.assigned_unit(decl(&sheet, "a")).is_none());
}

#[test]
fn test_string_in_numeric_expression() {
    let sheet = process("test.mt", "note = \"hello\"\nx = note + 1");
    assert!(
        sheet
            .errors
            .iter()
            .any(|e| e.code_str() == "unit::string_in_expression")
    );
}

#[test]
fn test_variable_exponent_rejected() {
    let sheet = process("test.mt", "n = 2\nx = 3 {m} ^ n");
    assert!(sheet.errors.iter().any(|e| e.code_str() == "unit::unresolved"));
    assert!(sheet.analysis.assigned_unit(decl(&sheet, "x")).is_none());
}

#[test]
fn test_constant_exponent_folds() {
    let sheet = process("test.mt", "x {m^2} = (3 {m}) ^ (1 + 1)");
    assert!(!sheet.has_errors());
}

#[test]
fn test_unknown_unit_symbol() {
    let sheet = process("test.mt", "x {furlong} = 1");
    assert!(sheet.errors.iter().any(|e| e.code_str() == "unit::unresolved"));
}

#[test]
fn test_duplicate_declaration_is_ambiguous() {
    let sheet = process("test.mt", "x = 1\nx = 2\ny = x + 1");
    assert!(sheet.errors.iter().any(|e| e.code_str() == "name::ambiguous"));
    // References bind to the first declaration; `y` still checks.
    assert!(sheet.analysis.assigned_unit(decl(&sheet, "y")).is_some());
}

#[test]
fn test_cyclic_declarations_skip_unit_inference() {
    let sheet = process("test.mt", "x {m} = y + 1\ny {m} = x + 1\nok {m} = 2");
    assert!(sheet.analysis.assigned_unit(decl(&sheet, "x")).is_none());
    assert!(sheet.analysis.assigned_unit(decl(&sheet, "ok")).is_some());
}
