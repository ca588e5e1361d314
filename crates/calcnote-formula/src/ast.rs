//! Formula Abstract Syntax Tree types

use crate::symbol::Symbol;
use calcnote_core::UnitExpr;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// Numeric literal with a unit annotation (`3 MPa`)
    Quantity { value: f64, unit: UnitExpr },
    /// Boolean literal
    Boolean(bool),
    /// `pi` or `e`
    Constant(Constant),

    // === Names ===
    /// Variable, array or function parameter
    Var(Symbol),
    /// A function used as a value (`sweep(f, xs)`)
    FunctionRef(Symbol),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },

    // === Function call ===
    Call { function: Symbol, args: Vec<Expr> },

    // === Sequences ===
    /// `[a, b, c]`
    List(Vec<Expr>),
    /// `[body for var in iter]`
    Comprehension {
        body: Box<Expr>,
        var: Symbol,
        iter: Box<Expr>,
    },

    /// Multi-branch conditional; branches are tested in order
    Conditional {
        branches: Vec<(Expr, Expr)>,
        default: Option<Box<Expr>>,
    },
}

/// Named mathematical constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Logical
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl Expr {
    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expr) -> Expr {
        Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Check whether `name` is referenced anywhere in this tree
    pub fn references(&self, name: &str) -> bool {
        match self {
            Expr::Number(_) | Expr::Quantity { .. } | Expr::Boolean(_) | Expr::Constant(_) => {
                false
            }
            Expr::Var(s) | Expr::FunctionRef(s) => s.name() == name,
            Expr::BinaryOp { left, right, .. } => left.references(name) || right.references(name),
            Expr::UnaryOp { operand, .. } => operand.references(name),
            Expr::Call { function, args } => {
                function.name() == name || args.iter().any(|a| a.references(name))
            }
            Expr::List(items) => items.iter().any(|i| i.references(name)),
            Expr::Comprehension { body, var, iter } => {
                iter.references(name) || (var.name() != name && body.references(name))
            }
            Expr::Conditional { branches, default } => {
                branches
                    .iter()
                    .any(|(c, v)| c.references(name) || v.references(name))
                    || default.as_ref().map_or(false, |d| d.references(name))
            }
        }
    }

    /// Literal number, if this node is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolRegistry;

    #[test]
    fn test_references() {
        let symbols = SymbolRegistry::new();
        let x = symbols.resolve("x");
        let f = symbols.resolve("f");
        let expr = Expr::binary(
            BinaryOperator::Add,
            Expr::Var(x.clone()),
            Expr::Call {
                function: f,
                args: vec![Expr::Number(1.0)],
            },
        );
        assert!(expr.references("x"));
        assert!(expr.references("f"));
        assert!(!expr.references("y"));

        let comprehension = Expr::Comprehension {
            body: Box::new(Expr::Var(x.clone())),
            var: x,
            iter: Box::new(Expr::List(vec![])),
        };
        assert!(!comprehension.references("x"));
    }

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOperator::LessEqual.is_comparison());
        assert!(!BinaryOperator::Power.is_comparison());
        assert_eq!(BinaryOperator::NotEqual.symbol(), "!=");
    }
}
