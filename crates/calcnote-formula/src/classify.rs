//! Block classification
//!
//! Decides the shape of a formula block from its source text before anything
//! is parsed: assignment, function definition, array constructor, bare
//! expression, or an `if / elif / else` chain.

use crate::error::{FormulaError, FormulaResult};
use crate::functions::is_builtin;
use crate::parser::is_keyword;
use calcnote_core::FormulaKind;
use lazy_regex::{regex, regex_captures};

/// Calls whose result is always an array
const ARRAY_BUILDERS: &[&str] = &["linspace", "arange", "range", "sweep", "map2"];

/// A classified block; expression parts are still unparsed text
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `expr`
    Expression(String),
    /// `name = expr`
    Assignment { target: String, expr: String },
    /// `name = linspace(...)`, `name = [..]`, ...
    ArrayConstructor { target: String, expr: String },
    /// `name(a, b) = body`
    FunctionDefinition {
        name: String,
        params: Vec<String>,
        body: String,
    },
    /// `if c1: a elif c2: b else: d`, where every branch may assign one name
    Conditional {
        target: Option<String>,
        branches: Vec<(String, String)>,
        default: Option<String>,
    },
}

impl Statement {
    pub fn kind(&self) -> FormulaKind {
        match self {
            Statement::Expression(_) => FormulaKind::Expression,
            Statement::Assignment { .. } => FormulaKind::Assignment,
            Statement::ArrayConstructor { .. } => FormulaKind::ArrayConstructor,
            Statement::FunctionDefinition { .. } => FormulaKind::FunctionDefinition,
            Statement::Conditional { .. } => FormulaKind::Conditional,
        }
    }

    /// Name the block defines, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            Statement::Expression(_) => None,
            Statement::Assignment { target, .. } | Statement::ArrayConstructor { target, .. } => {
                Some(target)
            }
            Statement::FunctionDefinition { name, .. } => Some(name),
            Statement::Conditional { target, .. } => target.as_deref(),
        }
    }
}

/// Classify the source of a formula block
pub fn classify(source: &str) -> FormulaResult<Statement> {
    let lines: Vec<&str> = source
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    match lines.first() {
        None => Err(FormulaError::parse("Empty expression")),
        Some(first) if regex!(r"^if\s.*:").is_match(first) => classify_conditional(&lines),
        Some(_) if lines.len() > 1 => Err(FormulaError::parse(
            "A block holds a single formula; multiple statements are not allowed",
        )),
        Some(line) => classify_line(line),
    }
}

fn classify_line(line: &str) -> FormulaResult<Statement> {
    if let Some((_, name, params, body)) =
        regex_captures!(r"^([^\W\d]\w*)\s*\(([^()]*)\)\s*=(.*)$", line)
    {
        if !body.starts_with('=') {
            check_target(name)?;
            return Ok(Statement::FunctionDefinition {
                name: name.to_string(),
                params: parse_params(name, params)?,
                body: body.trim().to_string(),
            });
        }
    }

    if let Some((target, expr)) = split_assignment(line) {
        check_target(target)?;
        let is_array = expr.starts_with('[')
            || ARRAY_BUILDERS.iter().any(|builder| {
                expr.strip_prefix(builder)
                    .map_or(false, |rest| rest.trim_start().starts_with('('))
            });
        let (target, expr) = (target.to_string(), expr.to_string());
        return Ok(if is_array {
            Statement::ArrayConstructor { target, expr }
        } else {
            Statement::Assignment { target, expr }
        });
    }

    Ok(Statement::Expression(line.to_string()))
}

/// Split `name = expr`, leaving `name == expr` alone
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (_, target, rest) = regex_captures!(r"^([^\W\d]\w*)\s*=(.*)$", line)?;
    if rest.starts_with('=') {
        return None;
    }
    Some((target, rest.trim()))
}

fn check_target(name: &str) -> FormulaResult<()> {
    if is_keyword(name) {
        return Err(FormulaError::parse(format!(
            "Cannot assign to reserved word '{}'",
            name
        )));
    }
    if is_builtin(name) {
        return Err(FormulaError::parse(format!(
            "Cannot redefine built-in function '{}'",
            name
        )));
    }
    Ok(())
}

fn parse_params(function: &str, params: &str) -> FormulaResult<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    if params.trim().is_empty() {
        return Ok(names);
    }
    for param in params.split(',').map(str::trim) {
        if !regex!(r"^[^\W\d]\w*$").is_match(param) || is_keyword(param) {
            return Err(FormulaError::parse(format!(
                "Invalid parameter '{}' in definition of {}()",
                param, function
            )));
        }
        if param == function || names.iter().any(|n| n == param) {
            return Err(FormulaError::parse(format!(
                "Duplicate parameter '{}' in definition of {}()",
                param, function
            )));
        }
        names.push(param.to_string());
    }
    Ok(names)
}

/// One `if`, `elif` or `else` clause
struct Clause<'s> {
    condition: Option<&'s str>,
    body: &'s str,
}

fn classify_conditional(lines: &[&str]) -> FormulaResult<Statement> {
    let mut clauses: Vec<Clause> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let (keyword, condition, inline_body) =
            if let Some((_, keyword, cond, body)) =
                regex_captures!(r"^(if|elif)\s+(.+?)\s*:\s*(.*)$", line)
            {
                (keyword, Some(cond), body)
            } else if let Some((_, body)) = regex_captures!(r"^else\s*:\s*(.*)$", line) {
                ("else", None, body)
            } else {
                return Err(FormulaError::parse(format!(
                    "Expected 'elif' or 'else' clause, got '{}'",
                    line
                )));
            };

        match (keyword, clauses.is_empty()) {
            ("if", false) => {
                return Err(FormulaError::parse("Only one 'if' is allowed per block"))
            }
            ("elif" | "else", true) => {
                return Err(FormulaError::parse(format!(
                    "'{}' without a preceding 'if'",
                    keyword
                )))
            }
            _ => {}
        }
        if clauses.last().map_or(false, |c| c.condition.is_none()) {
            return Err(FormulaError::parse("Nothing may follow the 'else' clause"));
        }

        // The body is on the same line or the next one
        let body = if inline_body.is_empty() {
            i += 1;
            match lines.get(i) {
                Some(next) if !regex!(r"^(if|elif|else)\b").is_match(next) => *next,
                _ => {
                    return Err(FormulaError::parse(format!(
                        "Missing body for '{}' clause",
                        keyword
                    )))
                }
            }
        } else {
            inline_body
        };
        clauses.push(Clause { condition, body });
        i += 1;
    }

    // Every branch assigns the same name, or none does
    let mut target: Option<Option<&str>> = None;
    let mut branches = Vec::new();
    let mut default = None;
    for clause in &clauses {
        let (branch_target, expr) = match split_assignment(clause.body) {
            Some((name, expr)) => (Some(name), expr),
            None => (None, clause.body),
        };
        match target {
            None => target = Some(branch_target),
            Some(existing) if existing != branch_target => {
                return Err(FormulaError::parse(
                    "All branches of a conditional must assign the same name",
                ))
            }
            Some(_) => {}
        }
        match clause.condition {
            Some(condition) => branches.push((condition.to_string(), expr.to_string())),
            None => default = Some(expr.to_string()),
        }
    }

    let target = target.flatten();
    if let Some(name) = target {
        check_target(name)?;
    }
    Ok(Statement::Conditional {
        target: target.map(str::to_string),
        branches,
        default,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn assignment(target: &str, expr: &str) -> Statement {
        Statement::Assignment {
            target: target.into(),
            expr: expr.into(),
        }
    }

    #[test]
    fn test_assignment() {
        assert_eq!(classify("P = B * L").unwrap(), assignment("P", "B * L"));
        assert_eq!(classify("  x=1  ").unwrap(), assignment("x", "1"));
        assert_eq!(classify("y = x == 2").unwrap(), assignment("y", "x == 2"));
    }

    #[test]
    fn test_expression() {
        assert_eq!(
            classify("x == 2").unwrap(),
            Statement::Expression("x == 2".into())
        );
        assert_eq!(classify("f(2)").unwrap(), Statement::Expression("f(2)".into()));
        assert_eq!(
            classify("2 * sqrt(16)").unwrap().kind(),
            FormulaKind::Expression
        );
    }

    #[test]
    fn test_function_definition() {
        assert_eq!(
            classify("area(b, h) = b * h / 2").unwrap(),
            Statement::FunctionDefinition {
                name: "area".into(),
                params: vec!["b".into(), "h".into()],
                body: "b * h / 2".into(),
            }
        );
        assert!(classify("f(x, x) = x").is_err());
        assert!(classify("f(1) = 2").is_err());
    }

    #[test]
    fn test_array_constructor() {
        for source in ["xs = linspace(0, 1, 5)", "ys = arange(0, 5, 0.5)", "v = [1, 2]"] {
            assert_eq!(classify(source).unwrap().kind(), FormulaKind::ArrayConstructor);
        }
        // A variable that merely starts with a builder name
        assert_eq!(
            classify("z = rangefactor * 2").unwrap().kind(),
            FormulaKind::Assignment
        );
    }

    #[test]
    fn test_reserved_targets() {
        let err = classify("if = 3").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert!(classify("sqrt = 3").is_err());
    }

    #[test]
    fn test_multiple_statements_rejected() {
        assert!(classify("a = 1\nb = 2").is_err());
        assert!(classify("   ").is_err());
    }

    #[test]
    fn test_multiline_conditional() {
        let source = "\nif x > 0:\n    10\nelif x > -2:\n    20\nelse:\n    30\n";
        assert_eq!(
            classify(source).unwrap(),
            Statement::Conditional {
                target: None,
                branches: vec![("x > 0".into(), "10".into()), ("x > -2".into(), "20".into())],
                default: Some("30".into()),
            }
        );
    }

    #[test]
    fn test_single_line_clauses_with_target() {
        let source = "if x > 0: y = 1\nelse: y = -1";
        assert_eq!(
            classify(source).unwrap(),
            Statement::Conditional {
                target: Some("y".into()),
                branches: vec![("x > 0".into(), "1".into())],
                default: Some("-1".into()),
            }
        );
    }

    #[test]
    fn test_conditional_without_default() {
        match classify("if x > 0: 1\nelif x < 0: -1").unwrap() {
            Statement::Conditional {
                branches, default, ..
            } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(default, None);
            }
            other => panic!("Expected conditional, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_conditionals() {
        assert!(classify("if x > 0: y = 1\nelse: z = 2").is_err());
        assert!(classify("if x > 0: 1\nelse: 2\nelif x < 0: 3").is_err());
        assert!(classify("if x > 0:").is_err());
        assert!(classify("if x > 0: 1\nif x < 0: 2").is_err());
    }
}
