//! Formula block evaluation
//!
//! Drives one block through classify, parse, typeset and evaluate, then
//! writes the result into the [`EvaluationContext`]. Failures never escape:
//! they are recorded in the context and returned alongside whatever output
//! the block could still produce.

use crate::ast::Expr;
use crate::classify::{classify, Statement};
use crate::context::{ArrayRecord, EvaluationContext, UserFunction, VariableRecord};
use crate::error::{ErrorKind, FormulaError, FormulaResult};
use crate::evaluator::evaluate;
use crate::format::{function_defined, DisplayOptions};
use crate::parser::{parse_with_fallback, ParseMode};
use crate::typeset;
use calcnote_core::{FormulaOutput, Value};
use log::{debug, warn};

/// Per-block evaluation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOptions {
    pub display: DisplayOptions,
    /// Retry in the tolerant dialect when the strict parse fails
    pub tolerant_fallback: bool,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            display: DisplayOptions::default(),
            tolerant_fallback: true,
        }
    }
}

/// What one block produced
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOutcome {
    pub output: FormulaOutput,
    /// Set when the block failed; already recorded in the context
    pub error: Option<FormulaError>,
}

impl BlockOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Evaluate the source of the block at `index` against `ctx`
///
/// # Example
/// ```rust
/// use calcnote_formula::{evaluate_block, BlockOptions, EvaluationContext};
///
/// let mut ctx = EvaluationContext::new();
/// let options = BlockOptions::default();
/// evaluate_block("L = 3 MPa", 0, &mut ctx, &options);
/// evaluate_block("B = 4 mm", 1, &mut ctx, &options);
/// let outcome = evaluate_block("P = B * L", 2, &mut ctx, &options);
/// assert_eq!(outcome.output.display.as_deref(), Some("12.00 kN/m"));
/// ```
pub fn evaluate_block(
    source: &str,
    index: usize,
    ctx: &mut EvaluationContext,
    options: &BlockOptions,
) -> BlockOutcome {
    let mut output = FormulaOutput::default();
    if source.trim().is_empty() {
        return BlockOutcome {
            output,
            error: None,
        };
    }

    let mut run = BlockRun {
        index,
        ctx,
        options,
        strict_error: None,
    };
    let result = run.execute(source, &mut output);

    // One notice per block, however many parts fell back
    if let Some(strict) = run.strict_error.take() {
        warn!("block {}: tolerant parse used: {}", index, strict);
        run.ctx
            .log(index, format!("tolerant parse used: {}", strict));
    }

    match result {
        Ok(()) => {
            debug!(
                "block {}: {:?} {} ok",
                index,
                output.kind,
                output.target.as_deref().unwrap_or("-")
            );
            BlockOutcome {
                output,
                error: None,
            }
        }
        Err(error) => {
            warn!("block {}: {}: {}", index, error.kind(), error);
            if error.kind() == ErrorKind::ParseError {
                output.typeset = None;
            }
            output.value = None;
            output.display = Some(format!("Error: {}", error));
            run.ctx.record_error(index, &error);
            BlockOutcome {
                output,
                error: Some(error),
            }
        }
    }
}

/// State of one block evaluation
struct BlockRun<'a> {
    index: usize,
    ctx: &'a mut EvaluationContext,
    options: &'a BlockOptions,
    /// First strict-parse failure that the tolerant dialect recovered from
    strict_error: Option<FormulaError>,
}

impl BlockRun<'_> {
    fn execute(&mut self, source: &str, output: &mut FormulaOutput) -> FormulaResult<()> {
        let statement = classify(source)?;
        output.kind = Some(statement.kind());
        output.target = statement.target().map(str::to_string);
        debug!(
            "block {}: classified as {:?}",
            self.index,
            statement.kind()
        );

        match statement {
            Statement::FunctionDefinition { name, params, body } => {
                let body = self.parse(&body, &params)?;
                if body.references(&name) {
                    return Err(FormulaError::parse(format!(
                        "Function '{}' cannot refer to itself",
                        name
                    )));
                }
                output.typeset = Some(typeset::function_definition(&name, &params, &body));
                output.display = Some(function_defined(&name, &params));
                output.params = params.clone();

                let body_typeset = typeset::to_latex(&body);
                self.ctx
                    .define_function(UserFunction::new(name, params, body, body_typeset));
                Ok(())
            }

            Statement::Expression(source) => {
                let expr = self.parse(&source, &[])?;
                output.typeset = Some(typeset::to_latex(&expr));
                self.finish(None, &expr, output)
            }

            Statement::Assignment { target, expr } | Statement::ArrayConstructor { target, expr } => {
                let expr = self.parse(&expr, &[])?;
                if contains_conditional(&expr) && expr.references(&target) {
                    return Err(self_reference(&target));
                }
                output.typeset = Some(typeset::assignment(&target, &expr));
                self.finish(Some(target.as_str()), &expr, output)
            }

            Statement::Conditional {
                target,
                branches,
                default,
            } => {
                let mut parsed = Vec::with_capacity(branches.len());
                for (condition, value) in &branches {
                    parsed.push((self.parse(condition, &[])?, self.parse(value, &[])?));
                }
                let default = match default {
                    Some(d) => Some(Box::new(self.parse(&d, &[])?)),
                    None => None,
                };
                let expr = Expr::Conditional {
                    branches: parsed,
                    default,
                };

                if let Some(target) = &target {
                    if expr.references(target) {
                        return Err(self_reference(target));
                    }
                }
                output.typeset = Some(match &target {
                    Some(target) => typeset::assignment(target, &expr),
                    None => typeset::to_latex(&expr),
                });
                self.finish(target.as_deref(), &expr, output)
            }
        }
    }

    fn parse(&mut self, source: &str, locals: &[String]) -> FormulaResult<Expr> {
        let outcome = parse_with_fallback(
            source,
            &*self.ctx,
            self.ctx.symbols(),
            locals,
            self.options.tolerant_fallback,
        )?;
        if outcome.mode == ParseMode::Tolerant && self.strict_error.is_none() {
            self.strict_error = outcome.strict_error;
        }
        Ok(outcome.expr)
    }

    /// Evaluate, format, and register the result under `target`
    fn finish(
        &mut self,
        target: Option<&str>,
        expr: &Expr,
        output: &mut FormulaOutput,
    ) -> FormulaResult<()> {
        let value = evaluate(expr, self.ctx)?.into_value()?;
        let display = &self.options.display;
        output.display = Some(display.format_value(&value));
        output.unit = display.unit_label(&value);

        if let Some(name) = target {
            let unit = output.unit.clone();
            match &value {
                Value::Array(items) => {
                    let mut record = ArrayRecord::new(name, items.clone());
                    record.unit = unit;
                    self.ctx.define_array(record);
                }
                scalar => {
                    let mut record =
                        VariableRecord::new(name, typeset::to_latex(expr), scalar.clone());
                    record.unit = unit;
                    self.ctx.define_variable(record);
                }
            }
        }

        output.value = Some(value);
        Ok(())
    }
}

fn contains_conditional(expr: &Expr) -> bool {
    match expr {
        Expr::Conditional { .. } => true,
        Expr::BinaryOp { left, right, .. } => contains_conditional(left) || contains_conditional(right),
        Expr::UnaryOp { operand, .. } => contains_conditional(operand),
        Expr::Call { args, .. } | Expr::List(args) => args.iter().any(contains_conditional),
        Expr::Comprehension { body, iter, .. } => {
            contains_conditional(body) || contains_conditional(iter)
        }
        _ => false,
    }
}

fn self_reference(name: &str) -> FormulaError {
    FormulaError::parse(format!(
        "Conditional definition of '{}' cannot refer to itself",
        name
    ))
}
