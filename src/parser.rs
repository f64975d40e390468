use crate::{
    ast::{
        BinaryOp, DebugInfo, Expr, ExprKind, FunctionDebug, Literal, Program, StepSite, Stmt,
        StmtKind, UnaryOp,
    },
    diagnostics::{Diagnostic, DiagnosticKind, SourceSpan},
    lexer::{Keyword, Lexer, Token, TokenKind},
};

/// Everything the parser hands downstream: the program tree, the
/// per-function index of steppable source lines, and any diagnostics.
/// A non-empty `errors` list means the program must not be evaluated.
#[derive(Debug)]
pub struct ParseOutcome {
    pub program: Program,
    pub debug: DebugInfo,
    pub errors: Vec<Diagnostic>,
}

pub fn parse(source: &str) -> ParseOutcome {
    let tokens = match Lexer::new(source).tokenize() {
        Ok(tokens) => tokens,
        Err(diag) => {
            return ParseOutcome {
                program: Program { items: Vec::new() },
                debug: DebugInfo::default(),
                errors: vec![diag],
            };
        }
    };
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
    debug: DebugInfo,
    fn_stack: Vec<usize>,
    errors: Vec<Diagnostic>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        let debug = DebugInfo {
            functions: vec![FunctionDebug {
                name: "<main>".into(),
                steps: Vec::new(),
            }],
        };
        Self {
            tokens,
            current: 0,
            debug,
            fn_stack: vec![0],
            errors: Vec::new(),
        }
    }

    fn parse_program(mut self) -> ParseOutcome {
        let mut items = Vec::new();
        while !self.check(TokenKind::Eof) {
            match self.parse_statement() {
                Ok(stmt) => items.push(stmt),
                Err(diag) => {
                    self.errors.push(diag);
                    self.synchronize();
                }
            }
        }
        ParseOutcome {
            program: Program { items },
            debug: self.debug,
            errors: self.errors,
        }
    }

    /// Skip forward to the next plausible statement boundary after a parse
    /// error, so one mistake yields one diagnostic instead of a cascade.
    fn synchronize(&mut self) {
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Eof => return,
                TokenKind::Semicolon | TokenKind::RBrace => {
                    self.advance();
                    return;
                }
                TokenKind::Keyword(
                    Keyword::Let
                    | Keyword::Fn
                    | Keyword::If
                    | Keyword::While
                    | Keyword::Loop
                    | Keyword::For
                    | Keyword::Return
                    | Keyword::Break
                    | Keyword::Continue,
                ) => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn record_step(&mut self, line: usize, stmt: &'static str) {
        let slot = *self.fn_stack.last().unwrap_or(&0);
        if let Some(function) = self.debug.functions.get_mut(slot) {
            function.steps.push(StepSite { line, stmt });
        }
    }

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        if let Some(token) = self.peek() {
            let line = token.span.line;
            let kind = token.kind.clone();
            self.record_step(line, stmt_tag(&kind));
            match kind {
                TokenKind::Keyword(Keyword::Let) => return self.parse_let(),
                TokenKind::Keyword(Keyword::Fn) => {
                    // `fn name(...)` declares; a bare `fn (...)` is a
                    // closure literal handled by the expression grammar.
                    if matches!(
                        self.peek_next().map(|t| &t.kind),
                        Some(TokenKind::Identifier)
                    ) {
                        return self.parse_function();
                    }
                }
                TokenKind::Keyword(Keyword::If) => return self.parse_if(),
                TokenKind::Keyword(Keyword::While) => return self.parse_while(),
                TokenKind::Keyword(Keyword::Loop) => return self.parse_loop(),
                TokenKind::Keyword(Keyword::For) => return self.parse_for(),
                TokenKind::Keyword(Keyword::Return) => return self.parse_return(),
                TokenKind::Keyword(Keyword::Break) => return self.parse_break(),
                TokenKind::Keyword(Keyword::Continue) => return self.parse_continue(),
                TokenKind::LBrace => {
                    let (items, span) = self.parse_block()?;
                    return Ok(Stmt {
                        kind: StmtKind::Block(items),
                        span,
                    });
                }
                _ => {}
            }
        }
        self.parse_expression_statement()
    }

    fn parse_let(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.consume_keyword(Keyword::Let)?;
        let name_token = self.consume_identifier("expected variable name")?;
        let initializer = if self.matches(TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume_optional_semicolon();
        let end = initializer
            .as_ref()
            .map(|expr| expr.span.end)
            .unwrap_or(name_token.span.end);
        Ok(Stmt {
            kind: StmtKind::Let {
                name: name_token.lexeme.clone(),
                initializer,
            },
            span: SourceSpan::new(keyword.span.start, end, keyword.span.line),
        })
    }

    fn parse_function(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.consume_keyword(Keyword::Fn)?;
        let name_token = self.consume_identifier("expected function name")?;
        let params = self.parse_param_list()?;

        self.fn_stack.push(self.debug.functions.len());
        self.debug.functions.push(FunctionDebug {
            name: name_token.lexeme.clone(),
            steps: Vec::new(),
        });
        let body = self.parse_block();
        self.fn_stack.pop();
        let (body, span) = body?;

        Ok(Stmt {
            span: SourceSpan::new(keyword.span.start, span.end, keyword.span.line),
            kind: StmtKind::Function {
                name: name_token.lexeme.clone(),
                params,
                body,
            },
        })
    }

    fn parse_param_list(&mut self) -> Result<Vec<String>, Diagnostic> {
        self.consume(TokenKind::LParen, "expected `(` before parameters")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param = self.consume_identifier("expected parameter name")?;
                params.push(param.lexeme.clone());
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "expected `)` after parameters")?;
        Ok(params)
    }

    fn parse_block(&mut self) -> Result<(Vec<Stmt>, SourceSpan), Diagnostic> {
        let lbrace = self.consume(TokenKind::LBrace, "expected `{` to start block")?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            items.push(self.parse_statement()?);
        }
        let rbrace = self.consume(TokenKind::RBrace, "expected `}` to close block")?;
        Ok((
            items,
            SourceSpan::new(lbrace.span.start, rbrace.span.end, lbrace.span.line),
        ))
    }

    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.consume_keyword(Keyword::If)?;
        let condition = self.parse_expression()?;
        let (then_branch, then_span) = self.parse_block()?;
        let else_branch = if self.matches_keyword(Keyword::Else) {
            if self.check(TokenKind::Keyword(Keyword::If)) {
                Some(vec![self.parse_if()?])
            } else {
                let (branch, _) = self.parse_block()?;
                Some(branch)
            }
        } else {
            None
        };
        let end = else_branch
            .as_ref()
            .and_then(|branch| branch.last().map(|stmt| stmt.span.end))
            .unwrap_or(then_span.end);
        Ok(Stmt {
            span: SourceSpan::new(keyword.span.start, end, keyword.span.line),
            kind: StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.consume_keyword(Keyword::While)?;
        let condition = self.parse_expression()?;
        let (body, span) = self.parse_block()?;
        Ok(Stmt {
            span: SourceSpan::new(keyword.span.start, span.end, keyword.span.line),
            kind: StmtKind::While { condition, body },
        })
    }

    fn parse_loop(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.consume_keyword(Keyword::Loop)?;
        let (body, span) = self.parse_block()?;
        Ok(Stmt {
            span: SourceSpan::new(keyword.span.start, span.end, keyword.span.line),
            kind: StmtKind::Loop { body },
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, Diagnostic> {
        let keyword = self.consume_keyword(Keyword::For)?;
        let binding = self.consume_identifier("expected loop binding")?;
        self.consume_keyword(Keyword::In)?;
        let iterable = self.parse_expression()?;
        let (body, span) = self.parse_block()?;
        Ok(Stmt {
            span: SourceSpan::new(keyword.span.start, span.end, keyword.span.line),
            kind: StmtKind::For {
                binding: binding.lexeme.clone(),
                iterable,
                body,
            },
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, Diagnostic> {
        let token = self.consume_keyword(Keyword::Return)?;
        let expr = if self.check(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.check(TokenKind::Eof)
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_optional_semicolon();
        let end = expr.as_ref().map(|e| e.span.end).unwrap_or(token.span.end);
        Ok(Stmt {
            span: SourceSpan::new(token.span.start, end, token.span.line),
            kind: StmtKind::Return(expr),
        })
    }

    fn parse_break(&mut self) -> Result<Stmt, Diagnostic> {
        let token = self.consume_keyword(Keyword::Break)?;
        let expr = if self.check(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.check(TokenKind::Eof)
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_optional_semicolon();
        let end = expr.as_ref().map(|e| e.span.end).unwrap_or(token.span.end);
        Ok(Stmt {
            span: SourceSpan::new(token.span.start, end, token.span.line),
            kind: StmtKind::Break(expr),
        })
    }

    fn parse_continue(&mut self) -> Result<Stmt, Diagnostic> {
        let token = self.consume_keyword(Keyword::Continue)?;
        self.consume_optional_semicolon();
        Ok(Stmt {
            span: token.span,
            kind: StmtKind::Continue,
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let expr = self.parse_expression()?;
        self.consume_optional_semicolon();
        Ok(Stmt {
            span: expr.span,
            kind: StmtKind::Expr(expr),
        })
    }

    fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, Diagnostic> {
        let expr = self.parse_or()?;
        if self.matches(TokenKind::Assign) {
            let equals = self.previous().span;
            let value = self.parse_assignment()?;
            match expr.kind {
                ExprKind::Variable(_) | ExprKind::Index { .. } | ExprKind::Field { .. } => {
                    Ok(Expr {
                        span: SourceSpan::new(expr.span.start, value.span.end, expr.span.line),
                        kind: ExprKind::Assign {
                            target: Box::new(expr),
                            value: Box::new(value),
                        },
                    })
                }
                _ => Err(
                    Diagnostic::new(DiagnosticKind::Parser, "invalid assignment target")
                        .with_span(equals),
                ),
            }
        } else {
            Ok(expr)
        }
    }

    fn parse_or(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_and()?;
        while self.matches(TokenKind::DoublePipe) {
            let right = self.parse_and()?;
            expr = binary(BinaryOp::Or, expr, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_equality()?;
        while self.matches(TokenKind::DoubleAmpersand) {
            let right = self.parse_equality()?;
            expr = binary(BinaryOp::And, expr, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_comparison()?;
        loop {
            let op = if self.matches(TokenKind::EqualEqual) {
                BinaryOp::Equal
            } else if self.matches(TokenKind::BangEqual) {
                BinaryOp::NotEqual
            } else {
                break;
            };
            let right = self.parse_comparison()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_term()?;
        loop {
            let op = if self.matches(TokenKind::LessEqual) {
                BinaryOp::LessEqual
            } else if self.matches(TokenKind::GreaterEqual) {
                BinaryOp::GreaterEqual
            } else if self.matches(TokenKind::Less) {
                BinaryOp::Less
            } else if self.matches(TokenKind::Greater) {
                BinaryOp::Greater
            } else {
                break;
            };
            let right = self.parse_term()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_factor()?;
        loop {
            let op = if self.matches(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.matches(TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_factor()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = if self.matches(TokenKind::Star) {
                BinaryOp::Mul
            } else if self.matches(TokenKind::Slash) {
                BinaryOp::Div
            } else if self.matches(TokenKind::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };
            let right = self.parse_unary()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let op = if self.matches(TokenKind::Minus) {
            Some(UnaryOp::Negate)
        } else if self.matches(TokenKind::Bang) {
            Some(UnaryOp::Not)
        } else {
            None
        };
        if let Some(op) = op {
            let operator = self.previous().span;
            let right = self.parse_unary()?;
            Ok(Expr {
                span: SourceSpan::new(operator.start, right.span.end, operator.line),
                kind: ExprKind::Unary {
                    op,
                    expr: Box::new(right),
                },
            })
        } else {
            self.parse_call()
        }
    }

    fn parse_call(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.matches(TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let paren = self.consume(TokenKind::RParen, "expected `)` after arguments")?;
                expr = Expr {
                    span: SourceSpan::new(expr.span.start, paren.span.end, expr.span.line),
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                };
            } else if self.matches(TokenKind::LBracket) {
                let index = self.parse_expression()?;
                let bracket = self.consume(TokenKind::RBracket, "expected `]` after index")?;
                expr = Expr {
                    span: SourceSpan::new(expr.span.start, bracket.span.end, expr.span.line),
                    kind: ExprKind::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    },
                };
            } else if self.matches(TokenKind::Dot) {
                let ident = self.consume_identifier("expected field after `.`")?;
                expr = Expr {
                    span: SourceSpan::new(expr.span.start, ident.span.end, expr.span.line),
                    kind: ExprKind::Field {
                        target: Box::new(expr),
                        field: ident.lexeme.clone(),
                    },
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        if let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Keyword(Keyword::True) => {
                    let tok = self.advance();
                    Ok(literal(Literal::Bool(true), tok.span))
                }
                TokenKind::Keyword(Keyword::False) => {
                    let tok = self.advance();
                    Ok(literal(Literal::Bool(false), tok.span))
                }
                TokenKind::Keyword(Keyword::Null) => {
                    let tok = self.advance();
                    Ok(literal(Literal::Null, tok.span))
                }
                TokenKind::Keyword(Keyword::Fn) => self.parse_lambda(),
                TokenKind::Number => {
                    let tok = self.advance();
                    let digits = tok.lexeme.replace('_', "");
                    let lit = if digits.contains(['.', 'e', 'E']) {
                        Literal::Float(digits.parse().unwrap_or(0.0))
                    } else {
                        Literal::Int(digits.parse().unwrap_or(0))
                    };
                    Ok(literal(lit, tok.span))
                }
                TokenKind::String => {
                    let tok = self.advance();
                    Ok(literal(Literal::String(tok.lexeme.clone()), tok.span))
                }
                TokenKind::Identifier => {
                    let tok = self.advance();
                    Ok(Expr {
                        span: tok.span,
                        kind: ExprKind::Variable(tok.lexeme.clone()),
                    })
                }
                TokenKind::LParen => {
                    let lparen = self.advance();
                    let inner = self.parse_expression()?;
                    let rparen =
                        self.consume(TokenKind::RParen, "expected `)` after expression")?;
                    Ok(Expr {
                        span: SourceSpan::new(
                            lparen.span.start,
                            rparen.span.end,
                            lparen.span.line,
                        ),
                        kind: ExprKind::Group(Box::new(inner)),
                    })
                }
                TokenKind::LBracket => {
                    let lbracket = self.advance();
                    let mut elements = Vec::new();
                    if !self.check(TokenKind::RBracket) {
                        loop {
                            elements.push(self.parse_expression()?);
                            if !self.matches(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let rbracket =
                        self.consume(TokenKind::RBracket, "expected `]` after array literal")?;
                    Ok(Expr {
                        span: SourceSpan::new(
                            lbracket.span.start,
                            rbracket.span.end,
                            lbracket.span.line,
                        ),
                        kind: ExprKind::ArrayLiteral(elements),
                    })
                }
                TokenKind::LBrace => self.parse_inline_map(),
                _ => Err(self.error(token, "unexpected token in expression")),
            }
        } else {
            Err(self.error_eof("unexpected end of expression"))
        }
    }

    fn parse_inline_map(&mut self) -> Result<Expr, Diagnostic> {
        let lbrace = self.advance();
        let mut entries = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let key = self.parse_expression()?;
                self.consume(TokenKind::Colon, "expected `:` in map literal")?;
                let value = self.parse_expression()?;
                entries.push((key, value));
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let rbrace = self.consume(TokenKind::RBrace, "expected `}` after map literal")?;
        Ok(Expr {
            span: SourceSpan::new(lbrace.span.start, rbrace.span.end, lbrace.span.line),
            kind: ExprKind::MapLiteral(entries),
        })
    }

    fn parse_lambda(&mut self) -> Result<Expr, Diagnostic> {
        let keyword = self.consume_keyword(Keyword::Fn)?;
        let params = self.parse_param_list()?;

        self.fn_stack.push(self.debug.functions.len());
        self.debug.functions.push(FunctionDebug {
            name: "<anonymous>".into(),
            steps: Vec::new(),
        });
        let body = self.parse_block();
        self.fn_stack.pop();
        let (body, span) = body?;

        Ok(Expr {
            span: SourceSpan::new(keyword.span.start, span.end, keyword.span.line),
            kind: ExprKind::Lambda { params, body },
        })
    }

    fn consume_optional_semicolon(&mut self) {
        let _ = self.matches(TokenKind::Semicolon);
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_keyword(&mut self, keyword: Keyword) -> bool {
        if let Some(Token {
            kind: TokenKind::Keyword(k),
            ..
        }) = self.peek()
        {
            if *k == keyword {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self
                .peek()
                .map(|tok| self.error(tok, message))
                .unwrap_or_else(|| self.error_eof(message)))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> Result<Token, Diagnostic> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Keyword(keyword.clone()) {
                Ok(self.advance())
            } else {
                Err(self.error(token, &format!("expected keyword `{keyword:?}`")))
            }
        } else {
            Err(self.error_eof("unexpected end of input"))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<Token, Diagnostic> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance())
        } else {
            Err(self
                .peek()
                .map(|tok| self.error(tok, message))
                .unwrap_or_else(|| self.error_eof(message)))
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        if let Some(token) = self.peek() {
            token.kind == kind
        } else {
            false
        }
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Eof) | None)
    }

    fn error(&self, token: &Token, message: &str) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Parser, message.to_string()).with_span(token.span)
    }

    fn error_eof(&self, message: &str) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Parser, message.to_string())
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr {
        span: SourceSpan::new(left.span.start, right.span.end, left.span.line),
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}

fn literal(lit: Literal, span: SourceSpan) -> Expr {
    Expr {
        span,
        kind: ExprKind::Literal(lit),
    }
}

fn stmt_tag(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Keyword(Keyword::Let) => "let",
        TokenKind::Keyword(Keyword::Fn) => "fn",
        TokenKind::Keyword(Keyword::If) => "if",
        TokenKind::Keyword(Keyword::While) => "while",
        TokenKind::Keyword(Keyword::Loop) => "loop",
        TokenKind::Keyword(Keyword::For) => "for",
        TokenKind::Keyword(Keyword::Return) => "return",
        TokenKind::Keyword(Keyword::Break) => "break",
        TokenKind::Keyword(Keyword::Continue) => "continue",
        TokenKind::LBrace => "block",
        _ => "expr",
    }
}
