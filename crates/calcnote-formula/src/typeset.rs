//! LaTeX typesetting
//!
//! Renders an expression tree as LaTeX for the notebook renderer. The
//! typeset form depends only on the tree, never on evaluated values, so a
//! block whose evaluation fails still has something to show.

use crate::ast::{BinaryOperator, Constant, Expr, UnaryOperator};
use calcnote_core::UnitExpr;
use lazy_regex::regex_captures;

// Binding strength, loosest first; parentheses are added when a child binds
// more loosely than its position requires.
const PREC_CONDITIONAL: u8 = 0;
const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_COMPARISON: u8 = 4;
const PREC_ADDITIVE: u8 = 5;
const PREC_MULTIPLICATIVE: u8 = 6;
const PREC_UNARY: u8 = 7;
const PREC_POWER: u8 = 8;
const PREC_ATOM: u8 = 9;

const GREEK: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi",
    "omega", "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Upsilon", "Phi", "Psi",
    "Omega",
];

/// Built-ins with a dedicated LaTeX operator
const NAMED_OPERATORS: &[(&str, &str)] = &[
    ("sin", r"\sin"),
    ("cos", r"\cos"),
    ("tan", r"\tan"),
    ("asin", r"\arcsin"),
    ("acos", r"\arccos"),
    ("atan", r"\arctan"),
    ("sinh", r"\sinh"),
    ("cosh", r"\cosh"),
    ("tanh", r"\tanh"),
    ("exp", r"\exp"),
    ("ln", r"\ln"),
    ("log", r"\log"),
    ("min", r"\min"),
    ("max", r"\max"),
];

/// Render an expression as LaTeX
pub fn to_latex(expr: &Expr) -> String {
    render(expr).0
}

/// Render an assignment `name = expr`
pub fn assignment(name: &str, expr: &Expr) -> String {
    format!("{} = {}", symbol(name), to_latex(expr))
}

/// Render a function definition `f(x, y) = body`
pub fn function_definition(name: &str, params: &[String], body: &Expr) -> String {
    let params: Vec<String> = params.iter().map(|p| symbol(p)).collect();
    format!(
        r"{}\left({}\right) = {}",
        function_name(name),
        params.join(", "),
        to_latex(body)
    )
}

/// Render an identifier: Greek letters, `x1` as `x_{1}`, `a_b` as `a_{b}`
pub fn symbol(name: &str) -> String {
    if let Some((base, sub)) = name.split_once('_') {
        if !base.is_empty() && !sub.is_empty() {
            return format!("{}_{{{}}}", symbol(base), subscript(sub));
        }
    }
    if let Some((_, base, digits)) = regex_captures!(r"^([A-Za-z]+?)(\d+)$", name) {
        return format!("{}_{{{}}}", symbol(base), digits);
    }
    if GREEK.contains(&name) {
        return format!(r"\{}", name);
    }
    if name.chars().count() == 1 {
        name.to_string()
    } else {
        format!(r"\mathrm{{{}}}", name)
    }
}

fn subscript(sub: &str) -> String {
    if GREEK.contains(&sub) {
        format!(r"\{}", sub)
    } else if sub.chars().count() == 1 || sub.chars().all(|c| c.is_ascii_digit()) {
        sub.to_string()
    } else {
        format!(r"\mathrm{{{}}}", sub)
    }
}

fn function_name(name: &str) -> String {
    if let Some((_, latex)) = NAMED_OPERATORS.iter().find(|(n, _)| *n == name) {
        return (*latex).to_string();
    }
    if name.chars().count() == 1 || GREEK.contains(&name) {
        symbol(name)
    } else {
        format!(r"\operatorname{{{}}}", name.replace('_', r"\_"))
    }
}

/// Render a unit annotation: `\mathrm{kN} \cdot \mathrm{m}`, `\mathrm{m}/\mathrm{s}^{2}`
pub fn unit(unit: &UnitExpr) -> String {
    fn factor(symbol: &str, exponent: i32) -> String {
        let symbol = format!(r"\mathrm{{{}}}", symbol);
        if exponent == 1 {
            symbol
        } else {
            format!("{}^{{{}}}", symbol, exponent)
        }
    }

    let numerator: Vec<String> = unit
        .factors()
        .iter()
        .filter(|f| f.exponent > 0)
        .map(|f| factor(&f.symbol, f.exponent))
        .collect();
    let denominator: Vec<String> = unit
        .factors()
        .iter()
        .filter(|f| f.exponent < 0)
        .map(|f| factor(&f.symbol, -f.exponent))
        .collect();

    match (numerator.is_empty(), denominator.is_empty()) {
        (_, true) => numerator.join(r" \cdot "),
        (true, false) => unit
            .factors()
            .iter()
            .map(|f| factor(&f.symbol, f.exponent))
            .collect::<Vec<_>>()
            .join(r" \cdot "),
        (false, false) => format!(
            "{}/{}",
            numerator.join(r" \cdot "),
            denominator.join(r" \cdot ")
        ),
    }
}

/// Render a literal number; very large or small magnitudes use scientific form
pub fn number(n: f64) -> String {
    let magnitude = n.abs();
    if magnitude != 0.0 && (magnitude >= 1e6 || magnitude < 1e-4) && n.is_finite() {
        let formatted = format!("{:e}", n);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            return if mantissa == "1" {
                format!("10^{{{}}}", exponent)
            } else {
                format!(r"{} \times 10^{{{}}}", mantissa, exponent)
            };
        }
    }
    format!("{}", n)
}

fn wrap(rendered: (String, u8), min_prec: u8) -> String {
    let (latex, prec) = rendered;
    if prec < min_prec {
        format!(r"\left({}\right)", latex)
    } else {
        latex
    }
}

fn comparison_operator(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Equal => "=",
        BinaryOperator::NotEqual => r"\neq",
        BinaryOperator::LessThan => "<",
        BinaryOperator::LessEqual => r"\leq",
        BinaryOperator::GreaterThan => ">",
        BinaryOperator::GreaterEqual => r"\geq",
        _ => op.symbol(),
    }
}

fn args(args: &[Expr]) -> String {
    args.iter().map(to_latex).collect::<Vec<_>>().join(", ")
}

fn render(expr: &Expr) -> (String, u8) {
    match expr {
        Expr::Number(n) => {
            let prec = if *n < 0.0 { PREC_UNARY } else { PREC_ATOM };
            (number(*n), prec)
        }
        Expr::Quantity { value, unit: u } => (
            format!(r"{}\,{}", number(*value), unit(u)),
            PREC_MULTIPLICATIVE,
        ),
        Expr::Boolean(b) => (
            if *b { r"\mathrm{True}" } else { r"\mathrm{False}" }.to_string(),
            PREC_ATOM,
        ),
        Expr::Constant(Constant::Pi) => (r"\pi".to_string(), PREC_ATOM),
        Expr::Constant(Constant::E) => ("e".to_string(), PREC_ATOM),
        Expr::Var(s) => (symbol(s.name()), PREC_ATOM),
        Expr::FunctionRef(s) => (function_name(s.name()), PREC_ATOM),

        Expr::BinaryOp { op, left, right } => render_binary(*op, left, right),

        Expr::UnaryOp {
            op: UnaryOperator::Negate,
            operand,
        } => (
            format!("-{}", wrap(render(operand), PREC_UNARY)),
            PREC_UNARY,
        ),
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            operand,
        } => (
            format!(r"\neg {}", wrap(render(operand), PREC_NOT)),
            PREC_NOT,
        ),

        Expr::Call { function, args: a } => render_call(function.name(), a),

        Expr::List(items) => (format!(r"\left[{}\right]", args(items)), PREC_ATOM),
        Expr::Comprehension { body, var, iter } => (
            format!(
                r"\left[{} \mid {} \in {}\right]",
                to_latex(body),
                symbol(var.name()),
                to_latex(iter)
            ),
            PREC_ATOM,
        ),

        Expr::Conditional { branches, default } => {
            let mut rows: Vec<String> = branches
                .iter()
                .map(|(cond, value)| {
                    format!(r"{} & \text{{if }} {}", to_latex(value), to_latex(cond))
                })
                .collect();
            if let Some(default) = default {
                rows.push(format!(r"{} & \text{{otherwise}}", to_latex(default)));
            }
            (
                format!(r"\begin{{cases}} {} \end{{cases}}", rows.join(r" \\ ")),
                PREC_CONDITIONAL,
            )
        }
    }
}

fn render_binary(op: BinaryOperator, left: &Expr, right: &Expr) -> (String, u8) {
    match op {
        BinaryOperator::Add => (
            format!(
                "{} + {}",
                wrap(render(left), PREC_ADDITIVE),
                wrap(render(right), PREC_ADDITIVE)
            ),
            PREC_ADDITIVE,
        ),
        BinaryOperator::Subtract => (
            format!(
                "{} - {}",
                wrap(render(left), PREC_ADDITIVE),
                wrap(render(right), PREC_MULTIPLICATIVE)
            ),
            PREC_ADDITIVE,
        ),
        BinaryOperator::Multiply => (
            format!(
                r"{} \cdot {}",
                wrap(render(left), PREC_MULTIPLICATIVE),
                wrap(render(right), PREC_UNARY)
            ),
            PREC_MULTIPLICATIVE,
        ),
        BinaryOperator::Divide => (
            format!(r"\frac{{{}}}{{{}}}", to_latex(left), to_latex(right)),
            PREC_ATOM,
        ),
        BinaryOperator::Power => (
            format!("{}^{{{}}}", wrap(render(left), PREC_ATOM), to_latex(right)),
            PREC_POWER,
        ),
        BinaryOperator::And => (
            format!(
                r"{} \wedge {}",
                wrap(render(left), PREC_AND),
                wrap(render(right), PREC_NOT)
            ),
            PREC_AND,
        ),
        BinaryOperator::Or => (
            format!(
                r"{} \vee {}",
                wrap(render(left), PREC_OR),
                wrap(render(right), PREC_AND)
            ),
            PREC_OR,
        ),
        comparison => (
            format!(
                "{} {} {}",
                wrap(render(left), PREC_ADDITIVE),
                comparison_operator(comparison),
                wrap(render(right), PREC_ADDITIVE)
            ),
            PREC_COMPARISON,
        ),
    }
}

fn render_call(name: &str, a: &[Expr]) -> (String, u8) {
    let joined = |sep: &str, prec: u8| {
        a.iter()
            .map(|arg| wrap(render(arg), prec))
            .collect::<Vec<_>>()
            .join(sep)
    };
    match (name, a) {
        ("sqrt", [x]) => (format!(r"\sqrt{{{}}}", to_latex(x)), PREC_ATOM),
        ("abs", [x]) => (format!(r"\left|{}\right|", to_latex(x)), PREC_ATOM),
        ("log10", [x]) => (format!(r"\log_{{10}}\left({}\right)", to_latex(x)), PREC_ATOM),
        ("log", [x, base]) => (
            format!(r"\log_{{{}}}\left({}\right)", to_latex(base), to_latex(x)),
            PREC_ATOM,
        ),
        ("floor", [x]) => (format!(r"\left\lfloor{}\right\rfloor", to_latex(x)), PREC_ATOM),
        ("ceil", [x]) => (format!(r"\left\lceil{}\right\rceil", to_latex(x)), PREC_ATOM),
        ("And", _) => (joined(r" \wedge ", PREC_NOT), PREC_AND),
        ("Or", _) => (joined(r" \vee ", PREC_AND), PREC_OR),
        ("Not", [x]) => (format!(r"\neg {}", wrap(render(x), PREC_NOT)), PREC_NOT),
        _ => (
            format!(r"{}\left({}\right)", function_name(name), args(a)),
            PREC_ATOM,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EvaluationContext;
    use crate::parser::{parse_expression, ParseMode};
    use pretty_assertions::assert_eq;

    fn latex(source: &str, mode: ParseMode) -> String {
        let ctx = EvaluationContext::new();
        let locals: Vec<String> = ["x", "y", "a", "b", "sigma_max", "x1", "alpha"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let expr = parse_expression(source, mode, &ctx, ctx.symbols(), &locals).unwrap();
        to_latex(&expr)
    }

    fn tolerant(source: &str) -> String {
        latex(source, ParseMode::Tolerant)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(tolerant("a + b * x"), r"a + b \cdot x");
        assert_eq!(tolerant("(a + b) * x"), r"\left(a + b\right) \cdot x");
        assert_eq!(tolerant("a - (b - x)"), r"a - \left(b - x\right)");
        assert_eq!(tolerant("a / b"), r"\frac{a}{b}");
        assert_eq!(tolerant("-x"), "-x");
    }

    #[test]
    fn test_powers() {
        assert_eq!(tolerant("x^2"), "x^{2}");
        assert_eq!(tolerant("(a + b)^2"), r"\left(a + b\right)^{2}");
        assert_eq!(tolerant("x^(a + b)"), "x^{a + b}");
    }

    #[test]
    fn test_functions() {
        assert_eq!(tolerant("sqrt(x)"), r"\sqrt{x}");
        assert_eq!(tolerant("abs(x)"), r"\left|x\right|");
        assert_eq!(tolerant("sin(x)"), r"\sin\left(x\right)");
        assert_eq!(tolerant("linspace(a, b, 5)"), r"\operatorname{linspace}\left(a, b, 5\right)");
    }

    #[test]
    fn test_symbols() {
        assert_eq!(symbol("x"), "x");
        assert_eq!(symbol("alpha"), r"\alpha");
        assert_eq!(symbol("x1"), "x_{1}");
        assert_eq!(symbol("sigma_max"), r"\sigma_{\mathrm{max}}");
        assert_eq!(symbol("area"), r"\mathrm{area}");
    }

    #[test]
    fn test_units() {
        assert_eq!(latex("3 MPa", ParseMode::Tolerant), r"3\,\mathrm{MPa}");
        assert_eq!(
            latex("9.81 m/s^2", ParseMode::Tolerant),
            r"9.81\,\mathrm{m}/\mathrm{s}^{2}"
        );
    }

    #[test]
    fn test_logic_and_comparison() {
        assert_eq!(tolerant("x <= 2 and y != 3"), r"x \leq 2 \wedge y \neq 3");
        assert_eq!(tolerant("not x > 1"), r"\neg x > 1");
        assert_eq!(tolerant("And(x > 1, y < 2)"), r"x > 1 \wedge y < 2");
    }

    #[test]
    fn test_conditional() {
        assert_eq!(
            tolerant("a if x > 0 else b"),
            r"\begin{cases} a & \text{if } x > 0 \\ b & \text{otherwise} \end{cases}"
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number(12.0), "12");
        assert_eq!(number(0.25), "0.25");
        assert_eq!(number(2.5e-7), r"2.5 \times 10^{-7}");
        assert_eq!(number(1e9), "10^{9}");
    }

    #[test]
    fn test_definitions() {
        let ctx = EvaluationContext::new();
        let x = ctx.symbols().resolve("x");
        let body = Expr::binary(BinaryOperator::Power, Expr::Var(x), Expr::Number(2.0));
        assert_eq!(
            function_definition("f", &["x".to_string()], &body),
            r"f\left(x\right) = x^{2}"
        );
        assert_eq!(assignment("P", &Expr::Number(3.0)), "P = 3");
    }
}
