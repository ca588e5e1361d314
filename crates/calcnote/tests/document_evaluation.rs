//! Tests for whole-document evaluation passes

use calcnote::prelude::*;
use pretty_assertions::assert_eq;

fn document(sources: &[&str]) -> Document {
    let mut doc = Document::new();
    for source in sources {
        doc.add_formula(*source);
    }
    doc
}

fn display(doc: &Document, index: usize) -> Option<&str> {
    doc.formula(index).and_then(|b| b.display())
}

/// Later blocks see earlier definitions, never the reverse
#[test]
fn test_order_sensitivity() {
    let mut doc = document(&["x = 1", "y = x + 1"]);
    let ctx = doc.evaluate();
    assert_eq!(ctx.numeric_value("y"), Some(2.0));

    let mut doc = document(&["y = x + 1", "x = 1"]);
    let ctx = doc.evaluate();
    assert!(doc.formula(0).unwrap().is_error());
    assert!(doc.formula(1).unwrap().is_ok());
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(ctx.errors()[0].block, 0);
    assert_eq!(ctx.errors()[0].kind, ErrorKind::ParseError);
}

/// One failing block is reported and the rest still evaluate
#[test]
fn test_error_containment() {
    let mut doc = document(&["x = 1", "y = undefined_name", "z = x + 1"]);
    let ctx = doc.evaluate();

    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(ctx.errors()[0].block, 1);
    let names: Vec<&str> = ctx.variables().keys().map(String::as_str).collect();
    assert_eq!(names, vec!["x", "z"]);
    assert_eq!(ctx.numeric_value("z"), Some(2.0));
}

/// A block referring to a failed block's name fails on its own
#[test]
fn test_dependent_of_failed_block() {
    let mut doc = document(&["X = 5 / 0", "Y = X + 1", "Z = 2 + 2"]);
    let ctx = doc.evaluate();

    assert_eq!(ctx.errors().len(), 2);
    assert_eq!(ctx.errors()[0].kind, ErrorKind::ValueError);
    assert_eq!(ctx.errors()[1].kind, ErrorKind::ParseError);
    assert_eq!(ctx.numeric_value("Z"), Some(4.0));
}

#[test]
fn test_unit_reconciliation() {
    let mut doc = document(&["L = 3 MPa", "B = 4 mm", "P = B * L"]);
    let ctx = doc.evaluate();

    assert!(!ctx.has_errors());
    let p = ctx.variable("P").unwrap();
    assert_eq!(p.unit.as_deref(), Some("kN/m"));
    assert!((p.numeric_value().unwrap() - 12.0).abs() < 1e-9);
    assert_eq!(display(&doc, 2), Some("12.00 kN/m"));

    let block = doc.formula(2).unwrap();
    assert_eq!(block.unit(), Some("kN/m"));
    assert_eq!(block.typeset(), Some(r"P = B \cdot L"));
}

#[test]
fn test_units_without_compaction() {
    let mut doc = document(&["F = 2 kN", "d = 3 m", "M = F * d"]);
    let options = EvaluationOptions {
        compact_units: false,
        ..Default::default()
    };
    doc.evaluate_with_options(&options);
    assert_eq!(display(&doc, 2), Some("6000.00 N·m"));
}

#[test]
fn test_unit_mismatch_keeps_typeset() {
    let mut doc = document(&["a = 3 m", "b = 2 s", "c = a + b"]);
    let ctx = doc.evaluate();

    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(ctx.errors()[0].kind, ErrorKind::UnitError);
    let block = doc.formula(2).unwrap();
    assert!(block.is_error());
    assert_eq!(block.typeset(), Some("c = a + b"));
}

#[test]
fn test_sqrt_of_area() {
    let mut doc = document(&["A = 16 m^2", "s = sqrt(A)"]);
    doc.evaluate();
    assert_eq!(display(&doc, 1), Some("4.00 m"));
}

#[test]
fn test_sequence_edge_cases() {
    let mut doc = document(&[
        "a = linspace(5, 5, 1)",
        "b = linspace(0, 1, 0)",
        "c = arange(10, 0, -1)",
        "d = arange(0, 5, 0)",
    ]);
    let ctx = doc.evaluate();

    assert_eq!(ctx.array("a").map(|a| a.numbers()), Some(vec![5.0]));
    assert_eq!(
        ctx.array("c").map(|a| a.numbers()),
        Some(vec![10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0])
    );

    let kinds: Vec<(usize, ErrorKind)> = ctx.errors().iter().map(|e| (e.block, e.kind)).collect();
    assert_eq!(kinds, vec![(1, ErrorKind::ValueError), (3, ErrorKind::ValueError)]);
}

/// The first true condition wins, even when a later one is also true
#[test]
fn test_conditional_order() {
    let mut doc = document(&[
        "x = 5",
        "if x > 10:\n    y = 1\nelif x > 0:\n    y = 2\nelif x > 1:\n    y = 3\nelse:\n    y = 4",
    ]);
    let ctx = doc.evaluate();

    assert!(!ctx.has_errors());
    assert_eq!(ctx.numeric_value("y"), Some(2.0));
    assert_eq!(doc.formula(1).unwrap().kind(), Some(FormulaKind::Conditional));
}

#[test]
fn test_conditional_without_default() {
    let mut doc = document(&["x = 0", "if x > 0: y = 1\nelif x < 0: y = -1"]);
    let ctx = doc.evaluate();

    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(ctx.errors()[0].kind, ErrorKind::ConditionalError);
    assert!(ctx.variable("y").is_none());
}

#[test]
fn test_inline_conditional_with_logic() {
    let mut doc = document(&[
        "a = 5",
        "b = -3",
        "result = 1 if And(a > 0, Not(b > 0)) else 0",
    ]);
    let ctx = doc.evaluate();

    assert!(!ctx.has_errors());
    assert_eq!(ctx.numeric_value("result"), Some(1.0));
    assert_eq!(display(&doc, 2), Some("1.00"));
}

#[test]
fn test_comparison_results() {
    let mut doc = document(&["x = 3", "x >= 2 and x != 4"]);
    doc.evaluate();
    assert_eq!(display(&doc, 1), Some("True"));
}

/// Strictly invalid but tolerantly valid syntax is logged, not an error
#[test]
fn test_tolerant_fallback() {
    let mut doc = document(&["a = 2", "b = 3", "c = 2a × b"]);
    let ctx = doc.evaluate();

    assert!(!ctx.has_errors());
    assert_eq!(ctx.logs().len(), 1);
    assert_eq!(ctx.logs()[0].block, 2);
    assert_eq!(ctx.numeric_value("c"), Some(12.0));
    let typeset = doc.formula(2).and_then(|b| b.typeset()).unwrap();
    assert!(!typeset.is_empty());
}

#[test]
fn test_strict_mode_rejects_tolerant_syntax() {
    let mut doc = document(&["a = 2", "c = 2a"]);
    let options = EvaluationOptions {
        tolerant_fallback: false,
        ..Default::default()
    };
    let ctx = doc.evaluate_with_options(&options);

    assert_eq!(ctx.errors().len(), 1);
    assert!(ctx.logs().is_empty());
}

#[test]
fn test_code_execution_is_rejected() {
    let mut doc = document(&[
        "x = __import__('os')",
        "y = (1).real",
        "z = 1; w = 2",
    ]);
    let ctx = doc.evaluate();

    assert_eq!(ctx.errors().len(), 3);
    assert!(ctx.errors().iter().all(|e| e.kind == ErrorKind::ParseError));
    assert!(ctx.variables().is_empty());
}

#[test]
fn test_determinism() {
    let mut doc = document(&[
        "f(x) = x**2",
        "xs = linspace(0, 6, 4)",
        "ys = sweep(f, xs)",
        "bad = nope + 1",
        "L = 3 MPa",
        "W = L * 2 mm",
    ]);
    let first = doc.evaluate();
    let first_blocks = doc.clone();
    let second = doc.evaluate();

    assert_eq!(first.variables(), second.variables());
    assert_eq!(first.arrays(), second.arrays());
    assert_eq!(first.errors(), second.errors());
    assert_eq!(first_blocks, doc);
}

#[test]
fn test_stats() {
    let mut doc = Document::new();
    doc.add_text("Notes");
    doc.add_formula("x = 1");
    doc.add_formula("y = q");
    doc.add_formula("");
    let ctx = doc.evaluate();

    let stats = EvaluationStats::collect(&doc, &ctx);
    assert_eq!(stats.block_count, 4);
    assert_eq!(stats.formula_count, 3);
    assert_eq!(stats.ok, 2);
    assert_eq!(stats.errors, 1);
}

/// Exponents beyond the supported range fail the block, not the pass
#[test]
fn test_dimension_exponent_overflow_is_contained() {
    let mut doc = document(&[
        "a = 2 m",
        "b = a^100 * a^100",
        "c = a^200",
        "d = a^127",
        "e = a * 3",
    ]);
    let ctx = doc.evaluate();

    let kinds: Vec<(usize, ErrorKind)> = ctx.errors().iter().map(|e| (e.block, e.kind)).collect();
    assert_eq!(kinds, vec![(1, ErrorKind::UnitError), (2, ErrorKind::UnitError)]);
    assert!(ctx.variable("b").is_none());
    assert!(ctx.variable("c").is_none());
    assert_eq!(ctx.variable("d").and_then(|v| v.unit.as_deref()), Some("m^127"));
    assert_eq!(display(&doc, 4), Some("6.00 m"));
}

#[test]
fn test_numeric_overflow_is_a_value_error() {
    let mut doc = document(&["x = 1e308 * 10", "y = 1e308 / 0.1", "z = 2 * 3"]);
    let ctx = doc.evaluate();

    let kinds: Vec<(usize, ErrorKind)> = ctx.errors().iter().map(|e| (e.block, e.kind)).collect();
    assert_eq!(kinds, vec![(0, ErrorKind::ValueError), (1, ErrorKind::ValueError)]);
    assert!(ctx.variable("x").is_none());
    assert_eq!(display(&doc, 0), Some("Error: Numeric overflow"));
    assert_eq!(ctx.numeric_value("z"), Some(6.0));
}
