//! Tests for user functions, builtins and array blocks

use calcnote::prelude::*;
use pretty_assertions::assert_eq;

fn evaluate(sources: &[&str]) -> (Document, EvaluationContext) {
    let mut doc = Document::new();
    for source in sources {
        doc.add_formula(*source);
    }
    let ctx = doc.evaluate();
    (doc, ctx)
}

#[test]
fn test_user_function() {
    let (doc, ctx) = evaluate(&["f(x) = 3x**2", "y = f(2)"]);

    assert!(!ctx.has_errors());
    assert_eq!(ctx.numeric_value("y"), Some(12.0));
    let def = doc.formula(0).unwrap();
    assert_eq!(def.kind(), Some(FormulaKind::FunctionDefinition));
    assert_eq!(def.display(), Some("Function f(x) defined"));
    assert_eq!(ctx.function("f").map(|f| f.params.clone()), Some(vec!["x".to_string()]));
}

#[test]
fn test_function_arity_is_checked() {
    let (_, ctx) = evaluate(&["area(b, h) = b * h / 2", "a = area(3)"]);
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(ctx.errors()[0].kind, ErrorKind::ParseError);
}

#[test]
fn test_recursive_definition_rejected() {
    let (_, ctx) = evaluate(&["f(x) = f(x - 1)"]);
    assert_eq!(ctx.errors().len(), 1);
    assert!(ctx.function("f").is_none());
}

#[test]
fn test_sweep() {
    let (doc, ctx) = evaluate(&[
        "f(x) = x**2",
        "xs = linspace(0, 3, 4)",
        "ys = sweep(f, xs)",
    ]);

    assert!(!ctx.has_errors());
    assert_eq!(ctx.array("ys").map(|a| a.numbers()), Some(vec![0.0, 1.0, 4.0, 9.0]));
    assert_eq!(
        doc.formula(2).and_then(|b| b.display()),
        Some("Array: [0.00, 1.00, 4.00, 9.00]")
    );
}

#[test]
fn test_map2() {
    let (_, ctx) = evaluate(&[
        "mul(a, b) = a * b",
        "xs = [1, 2, 3]",
        "ys = [4, 5, 6]",
        "zs = map2(mul, xs, ys)",
        "bad = map2(mul, xs, [1, 2])",
    ]);

    assert_eq!(ctx.array("zs").map(|a| a.numbers()), Some(vec![4.0, 10.0, 18.0]));
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(ctx.errors()[0].kind, ErrorKind::ValueError);
}

#[test]
fn test_comprehension() {
    let (_, ctx) = evaluate(&["squares = [i**2 for i in range(5)]"]);
    assert_eq!(
        ctx.array("squares").map(|a| a.numbers()),
        Some(vec![0.0, 1.0, 4.0, 9.0, 16.0])
    );
    // The loop variable does not leak
    assert!(ctx.variable("i").is_none());
}

#[test]
fn test_long_array_display() {
    let (doc, ctx) = evaluate(&["xs = range(100)"]);
    assert_eq!(ctx.array("xs").map(|a| a.len()), Some(100));
    assert_eq!(
        doc.formula(0).and_then(|b| b.display()),
        Some("Array (100 values): [0.00, 1.00, 2.00, ..., 99.00]")
    );
}

#[test]
fn test_array_with_units() {
    let (doc, ctx) = evaluate(&["spans = linspace(1 m, 3 m, 3)", "total = sum(spans)"]);

    assert!(!ctx.has_errors());
    assert_eq!(ctx.array("spans").and_then(|a| a.unit.clone()), Some("m".to_string()));
    assert_eq!(doc.formula(1).and_then(|b| b.display()), Some("6.00 m"));
}

#[test]
fn test_statistics() {
    let (_, ctx) = evaluate(&[
        "xs = [3, 1, 4, 1, 5]",
        "lo = min(xs)",
        "hi = max(xs)",
        "avg = mean(xs)",
        "n = len(xs)",
        "empty = mean([])",
    ]);

    assert_eq!(ctx.numeric_value("lo"), Some(1.0));
    assert_eq!(ctx.numeric_value("hi"), Some(5.0));
    assert!((ctx.numeric_value("avg").unwrap() - 2.8).abs() < 1e-12);
    assert_eq!(ctx.numeric_value("n"), Some(5.0));
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(ctx.errors()[0].kind, ErrorKind::ValueError);
}

#[test]
fn test_logical_functions() {
    let (doc, _) = evaluate(&[
        "a = 5",
        "b = -3",
        "And(a > 0, b < 0)",
        "Or(a < 0, b > 0)",
        "Not(a > 0)",
    ]);

    let shown: Vec<Option<&str>> = (2..5)
        .map(|i| doc.formula(i).and_then(|b| b.display()))
        .collect();
    assert_eq!(shown, vec![Some("True"), Some("False"), Some("False")]);
}

#[test]
fn test_math_domain_errors() {
    let (_, ctx) = evaluate(&["a = sqrt(-1)", "b = ln(0)", "c = asin(2)", "d = sqrt(4)"]);

    let blocks: Vec<usize> = ctx.errors().iter().map(|e| e.block).collect();
    assert_eq!(blocks, vec![0, 1, 2]);
    assert!(ctx.errors().iter().all(|e| e.kind == ErrorKind::ValueError));
    assert_eq!(ctx.numeric_value("d"), Some(2.0));
}

#[test]
fn test_names_move_between_kinds() {
    let (_, ctx) = evaluate(&["x = [1, 2]", "x = 3"]);
    assert!(ctx.array("x").is_none());
    assert_eq!(ctx.numeric_value("x"), Some(3.0));
}

#[test]
fn test_call_depth_limit() {
    let mut doc = Document::new();
    doc.add_formula("f1(x) = x + 1");
    for i in 2..=5 {
        doc.add_formula(format!("f{}(x) = f{}(x) + 1", i, i - 1));
    }
    doc.add_formula("y = f5(0)");

    let ctx = doc.evaluate();
    assert_eq!(ctx.numeric_value("y"), Some(5.0));

    let options = EvaluationOptions {
        max_call_depth: 3,
        ..Default::default()
    };
    let ctx = doc.evaluate_with_options(&options);
    assert_eq!(ctx.errors().len(), 1);
    assert_eq!(ctx.errors()[0].block, 5);
}
