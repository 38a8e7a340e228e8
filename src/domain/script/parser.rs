//! Script parser.
//!
//! Recursive descent over the raw source, no separate lexer. Grammar:
//!
//! ```text
//! program  := { stmt (NEWLINE | ';') }
//! stmt     := 'for' ['('] IDENT 'in' expr ('..' | '..<') expr [')'] block
//!           | IDENT '[' expr ']' assign expr
//!           | IDENT assign expr
//!           | expr
//! block    := '{' { stmt (NEWLINE | ';') } '}'
//! assign   := '=' | '+=' | '-=' | '*=' | '/='
//! expr     := term { ('+' | '-') term }
//! term     := unary { ('*' | '/') unary }
//! unary    := '-' unary | power
//! power    := postfix [ '**' unary ]
//! postfix  := primary { '[' expr ']' }
//! primary  := NUMBER | IDENT | IDENT '(' [expr {',' expr}] ')'
//!           | '[' [expr {',' expr}] ']' | '(' expr ')'
//! ```
//!
//! Newlines end statements except inside brackets or parentheses. `//` and
//! `#` start comments that run to the end of the line.

use crate::domain::error::ParseError;
use crate::domain::script::ast::{AssignOp, BinaryOp, Expr, Program, Stmt};

const KEYWORDS: &[&str] = &["for", "in"];

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            nesting: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn skip_comment(&mut self) -> bool {
        if self.remaining().starts_with("//") || self.peek() == Some('#') {
            while let Some(ch) = self.peek() {
                if ch == '\n' {
                    break;
                }
                self.advance();
            }
            true
        } else {
            false
        }
    }

    /// Skip blanks and comments; newlines only while inside brackets.
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some('\n') if self.nesting > 0 => {
                    self.advance();
                }
                Some(ch) if ch != '\n' && ch.is_whitespace() => {
                    self.advance();
                }
                _ => {
                    if !self.skip_comment() {
                        break;
                    }
                }
            }
        }
    }

    /// Skip blanks, comments, newlines and `;`.
    fn skip_separators(&mut self) {
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('\n') | Some(';') => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn describe_next(&self) -> String {
        let word = self.peek_word();
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word.to_string()
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(_) => Err(self.error(format!(
                "expected '{}', found '{}'",
                expected,
                self.describe_next()
            ))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn peek_word(&self) -> &'a str {
        let remaining = self.remaining();
        let end = remaining
            .char_indices()
            .find(|&(i, c)| {
                !(c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()))
            })
            .map_or(remaining.len(), |(i, _)| i);
        &remaining[..end]
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek_word() == keyword
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}', found '{}'",
                keyword,
                self.describe_next()
            )))
        }
    }

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        let word = self.peek_word();
        if word.is_empty() {
            return Err(self.error(format!(
                "expected identifier, found '{}'",
                self.describe_next()
            )));
        }
        if KEYWORDS.contains(&word) {
            return Err(self.error(format!("'{}' is a reserved word", word)));
        }
        self.pos += word.len();
        Ok(word.to_string())
    }

    /// Assignment operator at the cursor, without consuming it.
    fn peek_assign_op(&self) -> Option<(AssignOp, usize)> {
        let rest = self.remaining();
        let compound = [
            ("+=", BinaryOp::Add),
            ("-=", BinaryOp::Sub),
            ("*=", BinaryOp::Mul),
            ("/=", BinaryOp::Div),
        ];
        for (token, op) in compound {
            if rest.starts_with(token) {
                return Some((AssignOp::Compound(op), 2));
            }
        }
        if rest.starts_with('=') && !rest.starts_with("==") {
            return Some((AssignOp::Set, 1));
        }
        None
    }

    fn parse_number(&mut self) -> Result<Expr, ParseError> {
        let start = self.pos;
        let mut is_float = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        // A '.' only belongs to the number when a digit follows, so that
        // `0..LL` reads as a range.
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let rest = &self.remaining()[1..];
            let digits = rest.strip_prefix(['+', '-']).unwrap_or(rest);
            if digits.starts_with(|c: char| c.is_ascii_digit()) {
                is_float = true;
                self.pos += self.remaining().len() - digits.len();
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text = &self.input[start..self.pos];
        if text.is_empty() {
            return Err(self.error("expected number"));
        }
        if is_float {
            text.parse::<f64>().map(Expr::Num).map_err(|_| ParseError {
                message: format!("invalid number: {}", text),
                position: start,
            })
        } else {
            text.parse::<i64>().map(Expr::Int).map_err(|_| ParseError {
                message: format!("integer literal out of range: {}", text),
                position: start,
            })
        }
    }

    fn parse_list(&mut self, close: char) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(close) {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some(ch) if ch == close => {
                    self.advance();
                    return Ok(items);
                }
                _ => {
                    return Err(self.error(format!(
                        "expected ',' or '{}', found '{}'",
                        close,
                        self.describe_next()
                    )));
                }
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        let position = self.pos;

        match self.peek() {
            Some(c) if c.is_ascii_digit() => self.parse_number(),
            Some('.') if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                Err(self.error("number must start with a digit"))
            }
            Some('(') => {
                self.advance();
                self.nesting += 1;
                let expr = self.parse_expr()?;
                self.expect_char(')')?;
                self.nesting -= 1;
                Ok(expr)
            }
            Some('[') => {
                self.advance();
                self.nesting += 1;
                let items = self.parse_list(']')?;
                self.nesting -= 1;
                Ok(Expr::Array { items, position })
            }
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                let name = self.parse_identifier()?;
                self.skip_whitespace();
                if self.peek() == Some('(') {
                    self.advance();
                    self.nesting += 1;
                    let args = self.parse_list(')')?;
                    self.nesting -= 1;
                    Ok(Expr::Call {
                        name,
                        args,
                        position,
                    })
                } else {
                    Ok(Expr::Var { name, position })
                }
            }
            _ => Err(self.error(format!(
                "expected expression, found '{}'",
                self.describe_next()
            ))),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            self.skip_whitespace();
            if self.peek() != Some('[') {
                return Ok(expr);
            }
            let position = self.pos;
            self.advance();
            self.nesting += 1;
            let index = self.parse_expr()?;
            self.expect_char(']')?;
            self.nesting -= 1;
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
                position,
            };
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        self.skip_whitespace();
        if self.remaining().starts_with("**") && !self.remaining().starts_with("**=") {
            let position = self.pos;
            self.pos += 2;
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
                position,
            });
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.skip_whitespace();
        if self.peek() == Some('-') {
            let position = self.pos;
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Neg {
                operand: Box::new(operand),
                position,
            });
        }
        self.parse_power()
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_whitespace();
            let rest = self.remaining();
            let op = if rest.starts_with('*') && !rest.starts_with("**") && !rest.starts_with("*=")
            {
                BinaryOp::Mul
            } else if rest.starts_with('/') && !rest.starts_with("/=") {
                BinaryOp::Div
            } else {
                return Ok(left);
            };
            let position = self.pos;
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                position,
            };
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            self.skip_whitespace();
            let rest = self.remaining();
            let op = if rest.starts_with('+') && !rest.starts_with("+=") {
                BinaryOp::Add
            } else if rest.starts_with('-') && !rest.starts_with("-=") {
                BinaryOp::Sub
            } else {
                return Ok(left);
            };
            let position = self.pos;
            self.advance();
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                position,
            };
        }
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let position = self.pos;
        self.expect_keyword("for")?;
        self.skip_whitespace();
        let parenthesized = self.peek() == Some('(');
        if parenthesized {
            self.advance();
            self.nesting += 1;
        }

        let var = self.parse_identifier()?;
        self.expect_keyword("in")?;
        let start = self.parse_expr()?;
        self.skip_whitespace();
        if !self.remaining().starts_with("..") {
            return Err(self.error(format!(
                "expected '..' or '..<', found '{}'",
                self.describe_next()
            )));
        }
        self.pos += 2;
        let inclusive = if self.peek() == Some('<') {
            self.advance();
            false
        } else {
            true
        };
        let end = self.parse_expr()?;

        if parenthesized {
            self.expect_char(')')?;
            self.nesting -= 1;
        }
        let body = self.parse_block()?;

        Ok(Stmt::For {
            var,
            start,
            end,
            inclusive,
            body,
            position,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect_char('{')?;
        let outer_nesting = std::mem::take(&mut self.nesting);
        let mut body = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                Some('}') => {
                    self.advance();
                    break;
                }
                None => return Err(self.error("expected '}', found end of input")),
                _ => {
                    body.push(self.parse_statement()?);
                    self.expect_terminator(true)?;
                }
            }
        }
        self.nesting = outer_nesting;
        Ok(body)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.skip_whitespace();
        if self.peek_keyword("for") {
            return self.parse_for();
        }

        let start = self.pos;
        let word = self.peek_word();
        if !word.is_empty() && !KEYWORDS.contains(&word) {
            let name = self.parse_identifier()?;
            self.skip_whitespace();

            if let Some((op, len)) = self.peek_assign_op() {
                self.pos += len;
                let value = self.parse_expr()?;
                return Ok(Stmt::Assign {
                    name,
                    op,
                    value,
                    position: start,
                });
            }

            if self.peek() == Some('[') {
                self.advance();
                self.nesting += 1;
                let index = self.parse_expr()?;
                self.expect_char(']')?;
                self.nesting -= 1;
                self.skip_whitespace();
                if let Some((op, len)) = self.peek_assign_op() {
                    self.pos += len;
                    let value = self.parse_expr()?;
                    return Ok(Stmt::AssignIndex {
                        name,
                        index,
                        op,
                        value,
                        position: start,
                    });
                }
            }

            // Not an assignment: re-read the line as an expression.
            self.pos = start;
        }

        Ok(Stmt::Expr(self.parse_expr()?))
    }

    fn expect_terminator(&mut self, in_block: bool) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None | Some('\n') | Some(';') => Ok(()),
            Some('}') if in_block => Ok(()),
            Some(_) => Err(self.error(format!(
                "unexpected input after statement: '{}'",
                self.describe_next()
            ))),
        }
    }

    fn parse(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            if self.peek().is_none() {
                break;
            }
            statements.push(self.parse_statement()?);
            self.expect_terminator(false)?;
        }
        Ok(Program { statements })
    }
}

pub fn parse(input: &str) -> Result<Program, ParseError> {
    let mut parser = Parser::new(input);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(input: &str) -> Stmt {
        let program = parse(input).unwrap();
        assert_eq!(program.statements.len(), 1, "{input}");
        program.statements.into_iter().next().unwrap()
    }

    fn value_of(stmt: Stmt) -> Expr {
        match stmt {
            Stmt::Assign { value, .. } => value,
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn parse_simple_assignment() {
        match single("x = capital + 1") {
            Stmt::Assign {
                name,
                op: AssignOp::Set,
                value:
                    Expr::Binary {
                        op: BinaryOp::Add,
                        left,
                        right,
                        ..
                    },
                position: 0,
            } => {
                assert_eq!(name, "x");
                assert!(matches!(*left, Expr::Var { ref name, .. } if name == "capital"));
                assert_eq!(*right, Expr::Int(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_compound_assignments() {
        for (src, expected) in [
            ("a += 1", BinaryOp::Add),
            ("a -= 1", BinaryOp::Sub),
            ("a *= 1", BinaryOp::Mul),
            ("a /= 1", BinaryOp::Div),
        ] {
            match single(src) {
                Stmt::Assign { op, .. } => assert_eq!(op, AssignOp::Compound(expected)),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn parse_index_assignment() {
        match single("capital[0] = 5") {
            Stmt::AssignIndex {
                name, index, op, ..
            } => {
                assert_eq!(name, "capital");
                assert_eq!(index, Expr::Int(0));
                assert_eq!(op, AssignOp::Set);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn index_read_is_an_expression_statement() {
        assert!(matches!(single("capital[0]"), Stmt::Expr(Expr::Index { .. })));
    }

    #[test]
    fn precedence_mul_over_add() {
        let expr = value_of(single("y = 1 + 2 * 3"));
        match expr {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. })),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn power_binds_tighter_than_negation() {
        let expr = value_of(single("y = -2 ** 2"));
        match expr {
            Expr::Neg { operand, .. } => {
                assert!(matches!(*operand, Expr::Binary { op: BinaryOp::Pow, .. }))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = value_of(single("y = 10 - 4 - 3"));
        match expr {
            Expr::Binary {
                op: BinaryOp::Sub,
                left,
                right,
                ..
            } => {
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. }));
                assert_eq!(*right, Expr::Int(3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(value_of(single("a = 42")), Expr::Int(42));
        assert_eq!(value_of(single("a = 0.25")), Expr::Num(0.25));
        assert_eq!(value_of(single("a = 1e3")), Expr::Num(1000.0));
        assert_eq!(value_of(single("a = 2.5E-1")), Expr::Num(0.25));
    }

    #[test]
    fn parse_array_literal_across_lines() {
        let expr = value_of(single("a = [1,\n 2.5,\n 3]"));
        assert_eq!(
            expr,
            Expr::Array {
                items: vec![Expr::Int(1), Expr::Num(2.5), Expr::Int(3)],
                position: 4,
            }
        );
        assert!(matches!(
            value_of(single("a = []")),
            Expr::Array { items, .. } if items.is_empty()
        ));
    }

    #[test]
    fn parse_call() {
        match value_of(single("a = fill(LL, 0.5)")) {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "fill");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_for_loop_forms() {
        for src in [
            "for (t in 0..<LL) { a[t] = t }",
            "for t in 0..<LL {\n  a[t] = t\n}",
        ] {
            match single(src) {
                Stmt::For {
                    var,
                    inclusive,
                    body,
                    ..
                } => {
                    assert_eq!(var, "t");
                    assert!(!inclusive);
                    assert_eq!(body.len(), 1);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        match single("for (i in 1..3) { }") {
            Stmt::For {
                inclusive, body, ..
            } => {
                assert!(inclusive);
                assert!(body.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn statements_split_on_newlines_and_semicolons() {
        let program = parse("a = 1; b = 2\n\nc = 3\n").unwrap();
        assert_eq!(program.statements.len(), 3);
    }

    #[test]
    fn comments_are_ignored() {
        let program = parse("// header\na = 1 # trailing\n# whole line\nb = a // more\n").unwrap();
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn empty_script_is_valid() {
        assert!(parse("").unwrap().statements.is_empty());
        assert!(parse("  \n ; \n").unwrap().statements.is_empty());
    }

    #[test]
    fn nested_loops() {
        let program = parse("for (i in 0..<2) {\n for (j in 0..<2) {\n s += 1\n }\n}").unwrap();
        match &program.statements[0] {
            Stmt::For { body, .. } => assert!(matches!(body[0], Stmt::For { .. })),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_missing_operand() {
        let err = parse("x = capital +").unwrap_err();
        assert!(err.message.contains("expected expression"));
        assert_eq!(err.position, 13);
    }

    #[test]
    fn error_unclosed_paren() {
        let err = parse("x = (1 + 2").unwrap_err();
        assert!(err.message.contains("expected ')'"));
    }

    #[test]
    fn error_unclosed_block() {
        let err = parse("for (t in 0..<3) {\n a = t\n").unwrap_err();
        assert!(err.message.contains("expected '}'"));
    }

    #[test]
    fn error_trailing_input() {
        let err = parse("x = 1 2").unwrap_err();
        assert!(err.message.contains("unexpected input"));
        assert_eq!(err.position, 6);
    }

    #[test]
    fn error_newline_ends_expression() {
        let err = parse("x = 1 +\n 2").unwrap_err();
        assert!(err.message.contains("expected expression"));
    }

    #[test]
    fn error_missing_range() {
        let err = parse("for (t in 3) { }").unwrap_err();
        assert!(err.message.contains("expected '..'"));
    }

    #[test]
    fn error_keyword_as_name() {
        let err = parse("in = 3").unwrap_err();
        assert!(err.message.contains("expected expression") || err.message.contains("reserved"));
    }

    #[test]
    fn error_leading_dot_number() {
        let err = parse("x = .5").unwrap_err();
        assert!(err.message.contains("number must start with a digit"));
    }

    #[test]
    fn error_stray_closing_brace() {
        let err = parse("x = 1 }").unwrap_err();
        assert!(err.message.contains("unexpected input"));
    }
}
