//! Formula parser
//!
//! A recursive descent parser for the notebook's expression dialect. Only a fixed
//! vocabulary is accepted: built-in functions, constants, and names registered by
//! earlier blocks (see [`NameTable`]). Anything else is a parse error.
//!
//! Two modes exist. [`ParseMode::Strict`] accepts the canonical grammar and folds
//! literal arithmetic eagerly. [`ParseMode::Tolerant`] never folds and also
//! accepts implicit multiplication (`2x`, `3(a + b)`), the Unicode operators
//! `× · ÷ − ≤ ≥ ≠` and superscript powers `²` `³`.

use crate::ast::{BinaryOperator, Constant, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::is_builtin;
use crate::symbol::SymbolRegistry;
use calcnote_core::{lookup_unit, UnitExpr};
use lazy_regex::regex;

/// Parser dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Strict,
    Tolerant,
}

/// Names known to the parser besides the built-ins
pub trait NameTable {
    /// A variable or array defined by an earlier block
    fn is_value(&self, name: &str) -> bool;
    /// A user-defined function
    fn is_function(&self, name: &str) -> bool;
}

/// Words with grammatical meaning; never names
const KEYWORDS: &[&str] = &["if", "elif", "else", "for", "in", "and", "or", "not"];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name) || name == "True" || name == "False"
}

/// Parse an expression in the given mode
///
/// `locals` are names bound by the enclosing construct (function parameters).
///
/// # Example
/// ```rust
/// use calcnote_formula::{parse_expression, EvaluationContext, ParseMode};
///
/// let ctx = EvaluationContext::new();
/// let expr = parse_expression("sqrt(16) * 2", ParseMode::Strict, &ctx, ctx.symbols(), &[]).unwrap();
/// let expr = parse_expression("3 MPa", ParseMode::Strict, &ctx, ctx.symbols(), &[]).unwrap();
/// ```
pub fn parse_expression(
    source: &str,
    mode: ParseMode,
    names: &dyn NameTable,
    symbols: &SymbolRegistry,
    locals: &[String],
) -> FormulaResult<Expr> {
    let mut parser = FormulaParser::new(source.trim(), mode, names, symbols, locals);
    if matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::parse("Empty expression"));
    }
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::parse(format!(
            "Unexpected input after expression: '{}'",
            &parser.input[parser.token_start..]
        )));
    }

    Ok(expr)
}

/// Result of a parse that may have fallen back to the tolerant dialect
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub expr: Expr,
    pub mode: ParseMode,
    /// Why the strict parse failed, when the tolerant one was used
    pub strict_error: Option<FormulaError>,
}

/// Parse strictly, retrying in tolerant mode when allowed
///
/// When both modes fail the strict error is returned.
pub fn parse_with_fallback(
    source: &str,
    names: &dyn NameTable,
    symbols: &SymbolRegistry,
    locals: &[String],
    allow_tolerant: bool,
) -> FormulaResult<ParseOutcome> {
    match parse_expression(source, ParseMode::Strict, names, symbols, locals) {
        Ok(expr) => Ok(ParseOutcome {
            expr,
            mode: ParseMode::Strict,
            strict_error: None,
        }),
        Err(strict) if allow_tolerant => {
            match parse_expression(source, ParseMode::Tolerant, names, symbols, locals) {
                Ok(expr) => Ok(ParseOutcome {
                    expr,
                    mode: ParseMode::Tolerant,
                    strict_error: Some(strict),
                }),
                Err(_) => Err(strict),
            }
        }
        Err(strict) => Err(strict),
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    Boolean(bool),

    // Names and keywords
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    MiddleDot,
    Superscript(i32),
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    // Anything outside the dialect
    Invalid(char),

    // End of input
    Eof,
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    token_start: usize,
    current_token: Option<Token>,
    mode: ParseMode,
    names: &'a dyn NameTable,
    symbols: &'a SymbolRegistry,
    locals: Vec<String>,
}

impl<'a> FormulaParser<'a> {
    fn new(
        input: &'a str,
        mode: ParseMode,
        names: &'a dyn NameTable,
        symbols: &'a SymbolRegistry,
        locals: &[String],
    ) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            token_start: 0,
            current_token: None,
            mode,
            names,
            symbols,
            locals: locals.to_vec(),
        };
        parser.advance_token();
        parser
    }

    fn tolerant(&self) -> bool {
        self.mode == ParseMode::Tolerant
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.skip_whitespace();
        self.token_start = self.pos;
        self.current_token = Some(self.scan_token());
    }

    fn scan_token(&mut self) -> Token {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '·' => Some(Token::MiddleDot),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '[' => Some(Token::LeftBracket),
            ']' => Some(Token::RightBracket),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        // Tolerant-only spellings
        let unicode = match c {
            '×' => Some(Token::Star),
            '÷' => Some(Token::Slash),
            '−' => Some(Token::Minus),
            '≤' => Some(Token::LessEqual),
            '≥' => Some(Token::GreaterEqual),
            '≠' => Some(Token::NotEqual),
            '²' => Some(Token::Superscript(2)),
            '³' => Some(Token::Superscript(3)),
            _ => None,
        };
        if let Some(token) = unicode {
            self.advance();
            return if self.tolerant() {
                token
            } else {
                Token::Invalid(c)
            };
        }

        // One- or two-character operators
        match c {
            '*' => {
                self.advance();
                if self.peek_char() == Some('*') {
                    self.advance();
                    return Token::Caret;
                }
                return Token::Star;
            }
            '<' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::LessEqual;
                }
                return Token::LessThan;
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Token::GreaterEqual;
                }
                return Token::GreaterThan;
            }
            '=' | '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return if c == '=' {
                        Token::Equal
                    } else {
                        Token::NotEqual
                    };
                }
                return Token::Invalid(c);
            }
            _ => {}
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier or boolean
        if c.is_alphabetic() || c == '_' {
            return self.scan_identifier();
        }

        // Unknown character
        self.advance();
        Token::Invalid(c)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part, only when digits follow (`2e` is `2 * e` in tolerant mode)
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            let signed = self.peek_char_at(1).map_or(false, |c| c == '+' || c == '-');
            let digit_at = if signed { 2 } else { 1 };
            if self
                .peek_char_at(digit_at)
                .map_or(false, |c| c.is_ascii_digit())
            {
                for _ in 0..digit_at {
                    self.advance();
                }
                while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.input[start..self.pos];
        match text.parse::<f64>() {
            Ok(n) => Token::Number(n),
            Err(_) => Token::Invalid(text.chars().next().unwrap_or('.')),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphabetic() || c.is_ascii_digit() || c == '_')
        {
            self.advance();
        }

        match &self.input[start..self.pos] {
            "True" => Token::Boolean(true),
            "False" => Token::Boolean(false),
            text => Token::Identifier(text.to_string()),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::parse(format!(
                "Expected {}, got {}",
                describe(expected),
                describe(self.current_token())
            )))
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.current_token(), Token::Identifier(name) if name == keyword)
    }

    fn expect_keyword(&mut self, keyword: &str) -> FormulaResult<()> {
        if self.at_keyword(keyword) {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::parse(format!(
                "Expected '{}', got {}",
                keyword,
                describe(self.current_token())
            )))
        }
    }

    fn checkpoint(&self) -> (usize, usize, Option<Token>) {
        (self.pos, self.token_start, self.current_token.clone())
    }

    fn rewind(&mut self, (pos, token_start, token): (usize, usize, Option<Token>)) {
        self.pos = pos;
        self.token_start = token_start;
        self.current_token = token;
    }

    fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|l| l == name)
    }

    /// Could the current token begin an implicitly multiplied operand?
    fn starts_implicit_operand(&self) -> bool {
        match self.current_token() {
            Token::LeftParen => true,
            Token::Identifier(name) => !is_keyword(name),
            _ => false,
        }
    }

    // === Literal folding (strict mode only) ===

    fn fold_binary(&self, op: BinaryOperator, left: Expr, right: Expr) -> Expr {
        if !self.tolerant() {
            if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
                if let Some(value) = fold_arithmetic(op, l, r) {
                    return Expr::Number(value);
                }
            }
        }
        Expr::binary(op, left, right)
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Inline conditional: a if c else b
    // 2. or
    // 3. and
    // 4. not
    // 5. Comparison: ==, !=, <, <=, >, >=
    // 6. Addition/Subtraction: +, -
    // 7. Multiplication/Division: *, /, implicit (tolerant)
    // 8. Unary minus
    // 9. Exponentiation: ^, ** (right associative), superscripts
    // 10. Primary: literals, names, calls, lists, parentheses

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> FormulaResult<Expr> {
        let value = self.parse_or()?;

        if !self.at_keyword("if") {
            return Ok(value);
        }
        self.consume();
        let condition = self.parse_or()?;
        self.expect_keyword("else")?;
        let otherwise = self.parse_ternary()?;

        // `a if c1 else b if c2 else d` becomes one chain
        let mut branches = vec![(condition, value)];
        let default = match otherwise {
            Expr::Conditional {
                branches: rest,
                default,
            } => {
                branches.extend(rest);
                default
            }
            other => Some(Box::new(other)),
        };
        Ok(Expr::Conditional { branches, default })
    }

    fn parse_or(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_and()?;

        while self.at_keyword("or") {
            self.consume();
            let right = self.parse_and()?;
            left = Expr::binary(BinaryOperator::Or, left, right);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_not()?;

        while self.at_keyword("and") {
            self.consume();
            let right = self.parse_not()?;
            left = Expr::binary(BinaryOperator::And, left, right);
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> FormulaResult<Expr> {
        if self.at_keyword("not") {
            self.consume();
            let operand = self.parse_not()?;
            return Ok(Expr::unary(UnaryOperator::Not, operand));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<Expr> {
        let left = self.parse_additive()?;

        let op = match comparison_operator(self.current_token()) {
            Some(op) => op,
            None => return Ok(left),
        };
        self.consume();
        let right = self.parse_additive()?;

        if comparison_operator(self.current_token()).is_some() {
            return Err(FormulaError::parse(
                "Chained comparisons are not supported; combine them with 'and'",
            ));
        }

        Ok(Expr::binary(op, left, right))
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = self.fold_binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let right = match self.current_token() {
                Token::Star => {
                    self.consume();
                    self.parse_unary()?
                }
                Token::MiddleDot if self.tolerant() => {
                    self.consume();
                    self.parse_unary()?
                }
                Token::Slash => {
                    self.consume();
                    let right = self.parse_unary()?;
                    left = self.fold_binary(BinaryOperator::Divide, left, right);
                    continue;
                }
                // Juxtaposition: `2x`, `3(a + b)`, `(a)(b)`
                _ if self.tolerant() && self.starts_implicit_operand() => self.parse_power()?,
                _ => break,
            };
            left = self.fold_binary(BinaryOperator::Multiply, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        // Prefix unary minus
        if matches!(self.current_token(), Token::Minus) {
            self.consume();
            let operand = self.parse_unary()?;
            if !self.tolerant() {
                if let Some(n) = operand.as_number() {
                    return Ok(Expr::Number(-n));
                }
            }
            return Ok(Expr::unary(UnaryOperator::Negate, operand));
        }

        // Prefix plus (no-op)
        if matches!(self.current_token(), Token::Plus) {
            self.consume();
            return self.parse_unary();
        }

        self.parse_power()
    }

    fn parse_power(&mut self) -> FormulaResult<Expr> {
        let mut base = self.parse_primary()?;

        while let Token::Superscript(n) = *self.current_token() {
            self.consume();
            base = Expr::binary(BinaryOperator::Power, base, Expr::Number(n as f64));
        }

        if matches!(self.current_token(), Token::Caret) {
            self.consume();
            let exponent = self.parse_unary()?; // Right associative
            return Ok(self.fold_binary(BinaryOperator::Power, base, exponent));
        }

        Ok(base)
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                match self.parse_unit_annotation()? {
                    Some(unit) => Ok(Expr::Quantity { value: n, unit }),
                    None => Ok(Expr::Number(n)),
                }
            }

            Token::Boolean(b) => {
                self.consume();
                Ok(Expr::Boolean(b))
            }

            Token::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::LeftBracket => self.parse_list(),

            Token::Identifier(name) => {
                if KEYWORDS.contains(&name.as_str()) {
                    return Err(FormulaError::parse(format!("Unexpected keyword '{}'", name)));
                }
                self.consume();
                self.parse_name(name)
            }

            Token::Invalid('=') => Err(FormulaError::parse(
                "Assignment is not allowed inside an expression",
            )),

            Token::Invalid(c) => Err(FormulaError::parse(format!(
                "Unexpected character '{}'",
                c
            ))),

            Token::Eof => Err(FormulaError::parse("Unexpected end of expression")),

            other => Err(FormulaError::parse(format!(
                "Unexpected {}",
                describe(&other)
            ))),
        }
    }

    fn parse_name(&mut self, name: String) -> FormulaResult<Expr> {
        let is_value = self.is_local(&name) || self.names.is_value(&name);
        let is_function = self.names.is_function(&name) || is_builtin(&name);

        if matches!(self.current_token(), Token::LeftParen) {
            if is_value {
                // `a(b + c)` is multiplication in tolerant mode
                if self.tolerant() {
                    return Ok(Expr::Var(self.symbols.resolve(&name)));
                }
                return Err(FormulaError::parse(format!("'{}' is not a function", name)));
            }
            if is_function {
                return self.parse_function_call(name);
            }
            return Err(FormulaError::parse(format!("Unknown function: {}", name)));
        }

        if is_value {
            return Ok(Expr::Var(self.symbols.resolve(&name)));
        }
        if is_function {
            return Ok(Expr::FunctionRef(self.symbols.resolve(&name)));
        }
        match name.as_str() {
            "pi" | "π" => Ok(Expr::Constant(Constant::Pi)),
            "e" => Ok(Expr::Constant(Constant::E)),
            _ if lookup_unit(&name).is_some() => Err(FormulaError::parse(format!(
                "Unknown identifier: {} (units must follow a number)",
                name
            ))),
            _ => Err(FormulaError::parse(format!("Unknown identifier: {}", name))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<Expr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(Expr::Call {
            function: self.symbols.resolve(&name),
            args,
        })
    }

    fn parse_list(&mut self) -> FormulaResult<Expr> {
        // The loop variable has to be known before the body is parsed
        let comprehension_var = self.comprehension_variable();
        self.expect(&Token::LeftBracket)?;

        if let Some(var) = comprehension_var {
            self.locals.push(var.clone());
            let body = self.parse_expression();
            self.locals.pop();
            let body = body?;

            self.expect_keyword("for")?;
            match self.consume() {
                Token::Identifier(name) if name == var => {}
                other => {
                    return Err(FormulaError::parse(format!(
                        "Expected loop variable '{}', got {}",
                        var,
                        describe(&other)
                    )))
                }
            }
            self.expect_keyword("in")?;
            let iter = self.parse_expression()?;
            self.expect(&Token::RightBracket)?;

            return Ok(Expr::Comprehension {
                body: Box::new(body),
                var: self.symbols.resolve(&var),
                iter: Box::new(iter),
            });
        }

        let mut items = Vec::new();
        if !matches!(self.current_token(), Token::RightBracket) {
            items.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                items.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightBracket)?;
        Ok(Expr::List(items))
    }

    /// Loop variable of a `[body for v in iter]` starting at the current `[`
    fn comprehension_variable(&self) -> Option<String> {
        // Keep only the top level of the bracket so nested comprehensions don't match
        let mut depth = 0usize;
        let mut top_level = String::new();
        for c in self.input[self.pos..].chars() {
            match c {
                '[' | '(' => depth += 1,
                ']' | ')' if depth == 0 => break,
                ']' | ')' => depth -= 1,
                _ => {}
            }
            top_level.push(if depth == 0 { c } else { ' ' });
        }

        regex!(r"\bfor\s+([^\W\d]\w*)\s+in\b")
            .captures(&top_level)
            .map(|caps| caps[1].to_string())
    }

    /// Unit annotation after a numeric literal: `MPa`, `kN*m`, `kN·m`, `m/s^2`
    ///
    /// Unit names take precedence over variables here; a name followed by `(`
    /// is never a unit.
    fn parse_unit_annotation(&mut self) -> FormulaResult<Option<UnitExpr>> {
        if !self.at_unit() {
            return Ok(None);
        }

        let mut unit = UnitExpr::new();
        let mut sign = 1;
        loop {
            let symbol = match self.consume() {
                Token::Identifier(symbol) => symbol,
                other => {
                    return Err(FormulaError::parse(format!(
                        "Expected unit, got {}",
                        describe(&other)
                    )))
                }
            };
            let def = lookup_unit(&symbol)
                .ok_or_else(|| FormulaError::unit(format!("Unknown unit: {}", symbol)))?;
            let exponent = self.parse_unit_exponent()?;
            unit.push(def, sign * exponent);

            // Continue only when a unit follows the joining operator
            let saved = self.checkpoint();
            let joined_sign = match self.current_token() {
                Token::Star | Token::MiddleDot => sign,
                Token::Slash => -1,
                _ => break,
            };
            self.consume();
            if self.at_unit() {
                sign = joined_sign;
            } else {
                self.rewind(saved);
                break;
            }
        }

        Ok(Some(unit))
    }

    fn at_unit(&mut self) -> bool {
        if !matches!(self.current_token(), Token::Identifier(s) if lookup_unit(s).is_some()) {
            return false;
        }
        let saved = self.checkpoint();
        self.consume();
        let is_call = matches!(self.current_token(), Token::LeftParen);
        self.rewind(saved);
        !is_call
    }

    fn parse_unit_exponent(&mut self) -> FormulaResult<i32> {
        if let Token::Superscript(n) = *self.current_token() {
            self.consume();
            return Ok(n);
        }
        if !matches!(self.current_token(), Token::Caret) {
            return Ok(1);
        }
        self.consume();

        let negative = matches!(self.current_token(), Token::Minus);
        if negative {
            self.consume();
        }
        match self.consume() {
            Token::Number(n) if n.fract() == 0.0 && n.abs() <= 12.0 => {
                let n = n as i32;
                Ok(if negative { -n } else { n })
            }
            other => Err(FormulaError::parse(format!(
                "Unit exponent must be a small integer, got {}",
                describe(&other)
            ))),
        }
    }
}

fn comparison_operator(token: &Token) -> Option<BinaryOperator> {
    match token {
        Token::Equal => Some(BinaryOperator::Equal),
        Token::NotEqual => Some(BinaryOperator::NotEqual),
        Token::LessThan => Some(BinaryOperator::LessThan),
        Token::LessEqual => Some(BinaryOperator::LessEqual),
        Token::GreaterThan => Some(BinaryOperator::GreaterThan),
        Token::GreaterEqual => Some(BinaryOperator::GreaterEqual),
        _ => None,
    }
}

/// Fold `l op r` when both are literals and the result stays exact enough to
/// typeset (integer quotients that don't divide evenly stay fractions)
fn fold_arithmetic(op: BinaryOperator, l: f64, r: f64) -> Option<f64> {
    let integers = l.fract() == 0.0 && r.fract() == 0.0;
    let value = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 || (integers && l % r != 0.0) {
                return None;
            }
            l / r
        }
        BinaryOperator::Power => {
            if integers && r < 0.0 {
                return None;
            }
            l.powf(r)
        }
        _ => return None,
    };
    value.is_finite().then_some(value)
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {}", n),
        Token::Boolean(b) => format!("'{}'", if *b { "True" } else { "False" }),
        Token::Identifier(name) => format!("'{}'", name),
        Token::Plus => "'+'".into(),
        Token::Minus => "'-'".into(),
        Token::Star => "'*'".into(),
        Token::Slash => "'/'".into(),
        Token::Caret => "'^'".into(),
        Token::MiddleDot => "'·'".into(),
        Token::Superscript(n) => format!("superscript {}", n),
        Token::Equal => "'=='".into(),
        Token::NotEqual => "'!='".into(),
        Token::LessThan => "'<'".into(),
        Token::LessEqual => "'<='".into(),
        Token::GreaterThan => "'>'".into(),
        Token::GreaterEqual => "'>='".into(),
        Token::Comma => "','".into(),
        Token::LeftParen => "'('".into(),
        Token::RightParen => "')'".into(),
        Token::LeftBracket => "'['".into(),
        Token::RightBracket => "']'".into(),
        Token::Invalid(c) => format!("'{}'", c),
        Token::Eof => "end of input".into(),
    }
}
