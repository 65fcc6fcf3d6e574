//! Recursive-descent parser producing a [`Program`].
//!
//! Each top-level line holds exactly one command followed by an end-of-line
//! (or the end of input). `REPEAT` bodies are bracket-delimited and may span
//! lines. Parsing is fail-fast: the first token that does not fit aborts the
//! whole parse with a [`ParseError`].

use crate::error::ParseError;
use crate::lexer::{self, Position, Token, TokenKind};
use crate::program::{
    AddOp, ArithExpr, CmpOp, Command, CommandKind, Comparison, Expression, Factor, MulOp,
    Operation, Program, Term, Value,
};

/// Parses a complete program from source text.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let tokens = lexer::tokenize(source)?;
    Parser::new(tokens, lexer::end_position(source)).parse_program()
}

/// Parses a single expression, requiring that nothing follows it.
pub fn parse_expression(source: &str) -> Result<Expression, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let mut parser = Parser::new(tokens, lexer::end_position(source));
    let expr = parser.expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(_) => Err(parser.unexpected("end of expression")),
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Reported for errors at end of input.
    end: Position,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, end: Position) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
        }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_at(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn position(&self) -> Position {
        self.tokens.get(self.pos).map_or(self.end, |t| t.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|k| k.is_punct(c))
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let found = match self.tokens.get(self.pos) {
            None => "end of input".to_string(),
            Some(Token {
                kind: TokenKind::Eol,
                ..
            }) => "end of line".to_string(),
            Some(token) => format!("{:?}", token.lexeme),
        };
        ParseError::new(self.position(), format!("expected {expected}, found {found}"))
    }

    fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        if self.at_punct(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{c}'")))
        }
    }

    fn skip_eols(&mut self) {
        while matches!(self.peek(), Some(TokenKind::Eol)) {
            self.advance();
        }
    }

    // --- Commands ---

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut commands = Vec::new();

        loop {
            self.skip_eols();
            if self.peek().is_none() {
                break;
            }

            commands.push(self.command()?);

            // A trailing comment may share the line with its command.
            if let Some(TokenKind::Comment(_)) = self.peek() {
                commands.push(self.command()?);
            }

            match self.peek() {
                None | Some(TokenKind::Eol) => {}
                Some(_) => return Err(self.unexpected("end of line")),
            }
        }

        Ok(Program::new(commands))
    }

    fn command(&mut self) -> Result<Command, ParseError> {
        let pos = self.position();
        let keyword = match self.peek() {
            Some(TokenKind::Comment(text)) => {
                let text = text.clone();
                self.advance();
                return Ok(Command {
                    pos,
                    kind: CommandKind::Comment(text),
                });
            }
            Some(TokenKind::Ident(name)) => name.to_ascii_uppercase(),
            _ => return Err(self.unexpected("a command")),
        };

        let kind = match keyword.as_str() {
            "FORWARD" | "FD" => {
                self.advance();
                CommandKind::Forward(self.expression()?)
            }
            "BACKWARD" | "BK" => {
                self.advance();
                CommandKind::Backward(self.expression()?)
            }
            "RIGHT" | "RT" => {
                self.advance();
                CommandKind::Right(self.expression()?)
            }
            "LEFT" | "LT" => {
                self.advance();
                CommandKind::Left(self.expression()?)
            }
            "PENUP" | "PU" => {
                self.advance();
                CommandKind::PenUp
            }
            "PENDOWN" | "PD" => {
                self.advance();
                CommandKind::PenDown
            }
            "SLEEP" | "SP" => {
                self.advance();
                CommandKind::Sleep(self.expression()?)
            }
            "STOP" => {
                self.advance();
                CommandKind::Stop
            }
            "REPEAT" => {
                self.advance();
                self.repeat()?
            }
            _ => return Err(self.unexpected("a command")),
        };

        Ok(Command { pos, kind })
    }

    fn repeat(&mut self) -> Result<CommandKind, ParseError> {
        let times = self.expression()?;
        self.expect_punct('[')?;

        let mut body = Vec::new();
        loop {
            self.skip_eols();
            if self.at_punct(']') {
                break;
            }
            body.push(self.command()?);
        }

        if body.is_empty() {
            return Err(self.unexpected("at least one command in REPEAT body"));
        }
        self.expect_punct(']')?;

        Ok(CommandKind::Repeat { times, body })
    }

    // --- Expressions ---

    pub fn expression(&mut self) -> Result<Expression, ParseError> {
        let left = self.arith()?;
        let mut right = Vec::new();

        while let Some((pos, op)) = self.comparison_operator()? {
            right.push(Operation {
                pos,
                op,
                rhs: self.arith()?,
            });
        }

        Ok(Comparison { left, right })
    }

    /// Consumes `=`, `<`, `>`, `<=`, `>=` or `!=` if one is next.
    fn comparison_operator(&mut self) -> Result<Option<(Position, CmpOp)>, ParseError> {
        let pos = self.position();
        let Some(&TokenKind::Punct(first)) = self.peek() else {
            return Ok(None);
        };
        let followed_by_eq = self.peek_at(1).is_some_and(|k| k.is_punct('='));

        let (op, width) = match (first, followed_by_eq) {
            ('=', _) => (CmpOp::Eq, 1),
            ('<', true) => (CmpOp::Le, 2),
            ('>', true) => (CmpOp::Ge, 2),
            ('<', false) => (CmpOp::Lt, 1),
            ('>', false) => (CmpOp::Gt, 1),
            ('!', true) => (CmpOp::Ne, 2),
            ('!', false) => {
                self.advance();
                return Err(self.unexpected("'=' after '!'"));
            }
            _ => return Ok(None),
        };

        for _ in 0..width {
            self.advance();
        }
        Ok(Some((pos, op)))
    }

    fn arith(&mut self) -> Result<ArithExpr, ParseError> {
        let left = self.term()?;
        let mut right = Vec::new();

        loop {
            let op = match self.peek() {
                Some(TokenKind::Punct('+')) => AddOp::Add,
                Some(TokenKind::Punct('-')) => AddOp::Sub,
                _ => break,
            };
            let pos = self.position();
            self.advance();
            right.push(Operation {
                pos,
                op,
                rhs: self.term()?,
            });
        }

        Ok(ArithExpr { left, right })
    }

    fn term(&mut self) -> Result<Term, ParseError> {
        let left = self.factor()?;
        let mut right = Vec::new();

        loop {
            let op = match self.peek() {
                Some(TokenKind::Punct('*')) => MulOp::Mul,
                Some(TokenKind::Punct('/')) => MulOp::Div,
                _ => break,
            };
            let pos = self.position();
            self.advance();
            right.push(Operation {
                pos,
                op,
                rhs: self.factor()?,
            });
        }

        Ok(Term { left, right })
    }

    fn factor(&mut self) -> Result<Factor, ParseError> {
        let pos = self.position();
        let base = self.value()?;
        let exponent = if self.at_punct('^') {
            self.advance();
            Some(self.value()?)
        } else {
            None
        };

        Ok(Factor {
            pos,
            base,
            exponent,
        })
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        let pos = self.position();
        let value = match self.peek() {
            Some(TokenKind::Number(n)) => Value::Number(*n),
            Some(TokenKind::Str(s)) => Value::Str(s.clone()),
            Some(TokenKind::Ident(name)) => Value::Variable {
                name: name.clone(),
                pos,
            },
            Some(TokenKind::Punct('(')) => {
                self.advance();
                let inner = self.expression()?;
                self.expect_punct(')')?;
                return Ok(Value::Subexpression(Box::new(inner)));
            }
            _ => return Err(self.unexpected("a number, string, variable or '('")),
        };

        self.advance();
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<CommandKind> {
        parse(source)
            .unwrap()
            .commands
            .into_iter()
            .map(|c| c.kind)
            .collect()
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let commands = kinds("fd 1\nPu\nPENDOWN\nsp 5\n");
        assert_eq!(commands.len(), 4);
        assert!(matches!(commands[0], CommandKind::Forward(_)));
        assert_eq!(commands[1], CommandKind::PenUp);
        assert_eq!(commands[2], CommandKind::PenDown);
        assert!(matches!(commands[3], CommandKind::Sleep(_)));
    }

    #[test]
    fn test_precedence_ladder() {
        let expr = parse_expression("1 + 2 * 3 ^ 2 < 4").unwrap();
        assert_eq!(expr.right.len(), 1, "one comparison");
        assert_eq!(expr.right[0].op, CmpOp::Lt);

        let sum = &expr.left;
        assert_eq!(sum.right.len(), 1, "one addition");
        let product = &sum.right[0].rhs;
        assert_eq!(product.right.len(), 1, "one multiplication");
        assert!(product.right[0].rhs.exponent.is_some(), "3 ^ 2 binds tightest");
    }

    #[test]
    fn test_two_character_comparisons() {
        for (source, op) in [
            ("1 <= 2", CmpOp::Le),
            ("1 >= 2", CmpOp::Ge),
            ("1 != 2", CmpOp::Ne),
            ("1 = 2", CmpOp::Eq),
            ("1 > 2", CmpOp::Gt),
        ] {
            let expr = parse_expression(source).unwrap();
            assert_eq!(expr.right[0].op, op, "{source}");
        }
    }

    #[test]
    fn test_nested_repeat_spanning_lines() {
        let commands = kinds("REPEAT 2 [\n  REPEAT 3 [ FD 1 RT 120 ]\n  PU\n]\n");
        let CommandKind::Repeat { body, .. } = &commands[0] else {
            panic!("expected REPEAT, got {:?}", commands[0]);
        };
        assert_eq!(body.len(), 2);
        let CommandKind::Repeat { body: inner, .. } = &body[0].kind else {
            panic!("expected nested REPEAT");
        };
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let commands = kinds("\nREM setup\n\nFD 10 # trailing\nSTOP\n");
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], CommandKind::Comment("setup".into()));
        assert!(matches!(commands[1], CommandKind::Forward(_)));
        assert_eq!(commands[2], CommandKind::Comment("trailing".into()));
        assert_eq!(commands[3], CommandKind::Stop);
    }

    #[test]
    fn test_rem_with_punctuation_is_a_comment() {
        assert_eq!(
            kinds("REM:note\nREM---\nPU\n"),
            vec![
                CommandKind::Comment(":note".into()),
                CommandKind::Comment("---".into()),
                CommandKind::PenUp,
            ]
        );
    }

    #[test]
    fn test_error_line_after_carriage_returns() {
        let err = parse("FD 1\rRT 2\rJUMP\r").unwrap_err();
        assert_eq!((err.pos.line, err.pos.column), (3, 1));
    }

    #[test]
    fn test_last_line_may_omit_newline() {
        assert_eq!(kinds("PD"), vec![CommandKind::PenDown]);
    }

    #[test]
    fn test_two_commands_on_one_line_fail() {
        let err = parse("FD 1 RT 90\n").unwrap_err();
        assert_eq!(err.pos.column, 6);
        assert!(err.message.contains("end of line"), "{err}");
    }

    #[test]
    fn test_empty_repeat_body_fails() {
        assert!(parse("REPEAT 3 [ ]\n").is_err());
    }

    #[test]
    fn test_unclosed_paren_fails() {
        let err = parse("FD (1 + 2\n").unwrap_err();
        assert!(err.message.contains("')'"), "{err}");
    }

    #[test]
    fn test_unknown_command_fails() {
        let err = parse("JUMP 3\n").unwrap_err();
        assert_eq!(err.pos.line, 1);
        assert!(err.message.contains("JUMP"), "{err}");
    }

    #[test]
    fn test_bang_without_equals_fails() {
        assert!(parse_expression("1 ! 2").is_err());
    }
}
