//! Recursive-descent parser producing an AST directly (no lossless CST —
//! nothing downstream needs to reprint source text, so there is no editor
//! surface to preserve trivia for).

use cpsc_util::{DiagnosticKind, Diagnostics, Interner, Span, Symbol};

use crate::ast::*;
use crate::lexer::{Token, lex};
use crate::token::TokenKind;

pub struct ParseResult {
    pub program: Program,
    pub interner: Interner,
    pub diagnostics: Diagnostics,
}

pub fn parse(source: &str) -> ParseResult {
    let tokens = lex(source);
    let mut parser = Parser::new(source, tokens);
    let program = parser.parse_program();
    ParseResult {
        program,
        interner: parser.interner,
        diagnostics: parser.diagnostics,
    }
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    interner: Interner,
    diagnostics: Diagnostics,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            interner: Interner::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    // --- token stream primitives ---

    fn current(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn text(&self, token: Token) -> &'src str {
        &self.source[token.span.to_range()]
    }

    fn bump(&mut self) -> Token {
        let token = self.current();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) { Some(self.bump()) } else { None }
    }

    fn expect(&mut self, kind: TokenKind) -> Token {
        if let Some(tok) = self.eat(kind) {
            return tok;
        }
        let current = self.current();
        self.error(
            DiagnosticKind::Syntax,
            current.span,
            format!(
                "expected {}, found {}",
                kind.describe(),
                current.kind.describe()
            ),
        );
        current
    }

    fn error(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        self.diagnostics.report(kind, span).message(message).emit();
    }

    fn intern_ident(&mut self, token: Token) -> Symbol {
        let text = self.text(token);
        self.interner.intern(text)
    }

    /// Advance past tokens until a statement boundary, so one malformed
    /// statement doesn't desync the whole file.
    fn synchronize_stmt(&mut self) {
        loop {
            match self.current().kind {
                TokenKind::Eof | TokenKind::RBrace => return,
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::Let
                | TokenKind::Var
                | TokenKind::Const
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Foreach
                | TokenKind::Switch
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Return
                | TokenKind::Try
                | TokenKind::Print
                | TokenKind::LBrace => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    // --- program / statements ---

    fn parse_program(&mut self) -> Program {
        let mut items = Vec::new();
        while !self.at(TokenKind::Eof) {
            items.push(self.parse_stmt());
        }
        Program { items }
    }

    fn parse_stmt(&mut self) -> Stmt {
        let start = self.current().span;
        match self.current().kind {
            TokenKind::Let | TokenKind::Var | TokenKind::Const => self.parse_var_decl_stmt(),
            TokenKind::Function => self.parse_function_decl_stmt(),
            TokenKind::Class => self.parse_class_decl(),
            TokenKind::LBrace => self.parse_block_stmt(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Break => {
                self.bump();
                self.expect(TokenKind::Semicolon);
                Stmt { kind: StmtKind::Break, span: start }
            }
            TokenKind::Continue => {
                self.bump();
                self.expect(TokenKind::Semicolon);
                Stmt { kind: StmtKind::Continue, span: start }
            }
            TokenKind::Return => self.parse_return(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Print => self.parse_print(),
            TokenKind::Eof | TokenKind::RBrace => {
                let span = self.current().span;
                Stmt { kind: StmtKind::Error, span }
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn decl_kind_for(kind: TokenKind) -> DeclKind {
        match kind {
            TokenKind::Let => DeclKind::Let,
            TokenKind::Var => DeclKind::Var,
            TokenKind::Const => DeclKind::Const,
            _ => unreachable!("caller checked token kind"),
        }
    }

    fn parse_var_decl_stmt(&mut self) -> Stmt {
        let start = self.current().span;
        let decl_kind = Self::decl_kind_for(self.bump().kind);
        let name_tok = self.expect(TokenKind::Identifier);
        let name = self.intern_ident(name_tok);
        let ty = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type())
        } else {
            None
        };
        let init = if self.eat(TokenKind::Equals).is_some() {
            Some(self.parse_expr())
        } else {
            None
        };
        let end = self.expect(TokenKind::Semicolon).span;
        Stmt {
            kind: StmtKind::VarDecl {
                kind: decl_kind,
                name,
                name_span: name_tok.span,
                ty,
                init,
            },
            span: start.join(end),
        }
    }

    fn parse_type(&mut self) -> Type {
        let start = self.current().span;
        let mut ty = match self.current().kind {
            TokenKind::IntegerType => {
                self.bump();
                Type { kind: TypeKind::Integer, span: start }
            }
            TokenKind::StringType => {
                self.bump();
                Type { kind: TypeKind::String, span: start }
            }
            TokenKind::BooleanType => {
                self.bump();
                Type { kind: TypeKind::Boolean, span: start }
            }
            TokenKind::VoidType => {
                self.bump();
                Type { kind: TypeKind::Void, span: start }
            }
            TokenKind::Identifier => {
                let tok = self.bump();
                let name = self.intern_ident(tok);
                Type { kind: TypeKind::Named(name), span: start }
            }
            _ => {
                let current = self.current();
                self.error(
                    DiagnosticKind::Syntax,
                    current.span,
                    format!("expected a type, found {}", current.kind.describe()),
                );
                Type { kind: TypeKind::Void, span: current.span }
            }
        };
        while self.at(TokenKind::LBracket) {
            self.bump();
            let end = self.expect(TokenKind::RBracket).span;
            let span = ty.span.join(end);
            ty = Type { kind: TypeKind::Array(Box::new(ty)), span };
        }
        ty
    }

    fn parse_params(&mut self) -> Vec<Param> {
        self.expect(TokenKind::LParen);
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                let name_tok = self.expect(TokenKind::Identifier);
                let name = self.intern_ident(name_tok);
                self.expect(TokenKind::Colon);
                let ty = self.parse_type();
                let span = name_tok.span.join(ty.span);
                params.push(Param { name, ty, span });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen);
        params
    }

    fn parse_function_decl_stmt(&mut self) -> Stmt {
        let decl = self.parse_function_decl();
        let span = decl.span;
        Stmt { kind: StmtKind::FunctionDecl(decl), span }
    }

    fn parse_function_decl(&mut self) -> FunctionDecl {
        let start = self.expect(TokenKind::Function).span;
        let name_tok = self.expect(TokenKind::Identifier);
        let name = self.intern_ident(name_tok);
        let params = self.parse_params();
        let return_type = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type())
        } else {
            None
        };
        let body = self.parse_block();
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        FunctionDecl {
            name,
            params,
            return_type,
            body,
            span: start.join(end),
            name_span: name_tok.span,
        }
    }

    fn parse_class_decl(&mut self) -> Stmt {
        let start = self.expect(TokenKind::Class).span;
        let name_tok = self.expect(TokenKind::Identifier);
        let name = self.intern_ident(name_tok);
        let parent = if self.eat(TokenKind::Colon).is_some() {
            let parent_tok = self.expect(TokenKind::Identifier);
            let parent_name = self.intern_ident(parent_tok);
            Some((parent_name, parent_tok.span))
        } else {
            None
        };

        self.expect(TokenKind::LBrace);
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut constructor = None;
        let mut extra_constructors = Vec::new();

        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            match self.current().kind {
                TokenKind::Let | TokenKind::Var | TokenKind::Const => {
                    let field_start = self.current().span;
                    let kind = Self::decl_kind_for(self.bump().kind);
                    let field_name_tok = self.expect(TokenKind::Identifier);
                    let field_name = self.intern_ident(field_name_tok);
                    let ty = if self.eat(TokenKind::Colon).is_some() {
                        Some(self.parse_type())
                    } else {
                        None
                    };
                    let init = if self.eat(TokenKind::Equals).is_some() {
                        Some(self.parse_expr())
                    } else {
                        None
                    };
                    let end = self.expect(TokenKind::Semicolon).span;
                    fields.push(FieldDecl {
                        kind,
                        name: field_name,
                        ty,
                        init,
                        span: field_start.join(end),
                    });
                }
                TokenKind::Function => {
                    if matches!(self.tokens.get(self.pos + 1).map(|t| t.kind), Some(TokenKind::Constructor))
                    {
                        let ctor_start = self.bump().span; // 'function'
                        self.bump(); // 'constructor'
                        let params = self.parse_params();
                        let body = self.parse_block();
                        let end = self.tokens[self.pos.saturating_sub(1)].span;
                        let span = ctor_start.join(end);
                        if constructor.is_some() {
                            extra_constructors.push(span);
                        } else {
                            constructor = Some(ConstructorDecl { style: ConstructorStyle::FunctionConstructor, params, body, span });
                        }
                    } else {
                        methods.push(self.parse_function_decl());
                    }
                }
                TokenKind::Init => {
                    let ctor_start = self.bump().span;
                    let params = self.parse_params();
                    let body = self.parse_block();
                    let end = self.tokens[self.pos.saturating_sub(1)].span;
                    let span = ctor_start.join(end);
                    if constructor.is_some() {
                        extra_constructors.push(span);
                    } else {
                        constructor = Some(ConstructorDecl { style: ConstructorStyle::Init, params, body, span });
                    }
                }
                _ => {
                    let current = self.current();
                    self.error(
                        DiagnosticKind::Syntax,
                        current.span,
                        format!("unexpected {} in class body", current.kind.describe()),
                    );
                    self.bump();
                }
            }
        }
        let end = self.expect(TokenKind::RBrace).span;

        Stmt {
            kind: StmtKind::ClassDecl(ClassDecl {
                name,
                name_span: name_tok.span,
                parent,
                fields,
                methods,
                constructor,
                extra_constructors,
                span: start.join(end),
            }),
            span: start.join(end),
        }
    }

    fn parse_block(&mut self) -> Vec<Stmt> {
        self.expect(TokenKind::LBrace);
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            stmts.push(self.parse_stmt());
        }
        self.expect(TokenKind::RBrace);
        stmts
    }

    fn parse_block_stmt(&mut self) -> Stmt {
        let start = self.current().span;
        let stmts = self.parse_block();
        let end = self.tokens[self.pos.saturating_sub(1)].span;
        Stmt { kind: StmtKind::Block(stmts), span: start.join(end) }
    }

    fn parse_if(&mut self) -> Stmt {
        let start = self.expect(TokenKind::If).span;
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        let then_branch = Box::new(self.parse_stmt());
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            Some(Box::new(self.parse_stmt()))
        } else {
            None
        };
        let end = else_branch
            .as_ref()
            .map(|s| s.span)
            .unwrap_or(then_branch.span);
        Stmt {
            kind: StmtKind::If { cond, then_branch, else_branch },
            span: start.join(end),
        }
    }

    fn parse_while(&mut self) -> Stmt {
        let start = self.expect(TokenKind::While).span;
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        let body = Box::new(self.parse_stmt());
        let end = body.span;
        Stmt { kind: StmtKind::While { cond, body }, span: start.join(end) }
    }

    fn parse_do_while(&mut self) -> Stmt {
        let start = self.expect(TokenKind::Do).span;
        let body = Box::new(self.parse_stmt());
        self.expect(TokenKind::While);
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        let end = self.expect(TokenKind::Semicolon).span;
        Stmt { kind: StmtKind::DoWhile { body, cond }, span: start.join(end) }
    }

    fn parse_for(&mut self) -> Stmt {
        let start = self.expect(TokenKind::For).span;
        self.expect(TokenKind::LParen);
        let init = if self.at(TokenKind::Semicolon) {
            self.bump();
            None
        } else if matches!(self.current().kind, TokenKind::Let | TokenKind::Var | TokenKind::Const) {
            Some(Box::new(self.parse_var_decl_stmt()))
        } else {
            let e = self.parse_expr();
            let span = e.span;
            self.expect(TokenKind::Semicolon);
            Some(Box::new(Stmt { kind: StmtKind::ExprStmt(e), span }))
        };
        let cond = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(TokenKind::Semicolon);
        let step = if self.at(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(TokenKind::RParen);
        let body = Box::new(self.parse_stmt());
        let end = body.span;
        Stmt {
            kind: StmtKind::For { init, cond, step, body },
            span: start.join(end),
        }
    }

    fn parse_foreach(&mut self) -> Stmt {
        let start = self.expect(TokenKind::Foreach).span;
        self.expect(TokenKind::LParen);
        let var_tok = self.expect(TokenKind::Identifier);
        let var = self.intern_ident(var_tok);
        self.expect(TokenKind::In);
        let iter = self.parse_expr();
        self.expect(TokenKind::RParen);
        let body = Box::new(self.parse_stmt());
        let end = body.span;
        Stmt {
            kind: StmtKind::Foreach { var, var_span: var_tok.span, iter, body },
            span: start.join(end),
        }
    }

    fn parse_switch(&mut self) -> Stmt {
        let start = self.expect(TokenKind::Switch).span;
        self.expect(TokenKind::LParen);
        let subject = self.parse_expr();
        self.expect(TokenKind::RParen);
        self.expect(TokenKind::LBrace);
        let mut cases = Vec::new();
        let mut default = None;
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            match self.current().kind {
                TokenKind::Case => {
                    self.bump();
                    let value = self.parse_expr();
                    self.expect(TokenKind::Colon);
                    let mut body = Vec::new();
                    while !matches!(
                        self.current().kind,
                        TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
                    ) {
                        body.push(self.parse_stmt());
                    }
                    cases.push(SwitchCase { value, body });
                }
                TokenKind::Default => {
                    self.bump();
                    self.expect(TokenKind::Colon);
                    let mut body = Vec::new();
                    while !matches!(
                        self.current().kind,
                        TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
                    ) {
                        body.push(self.parse_stmt());
                    }
                    default = Some(body);
                }
                _ => {
                    let current = self.current();
                    self.error(
                        DiagnosticKind::Syntax,
                        current.span,
                        format!("expected 'case' or 'default', found {}", current.kind.describe()),
                    );
                    self.bump();
                }
            }
        }
        let end = self.expect(TokenKind::RBrace).span;
        Stmt {
            kind: StmtKind::Switch { subject, cases, default },
            span: start.join(end),
        }
    }

    fn parse_return(&mut self) -> Stmt {
        let start = self.expect(TokenKind::Return).span;
        let value = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr())
        };
        let end = self.expect(TokenKind::Semicolon).span;
        Stmt { kind: StmtKind::Return(value), span: start.join(end) }
    }

    fn parse_try(&mut self) -> Stmt {
        let start = self.expect(TokenKind::Try).span;
        let body = Box::new(self.parse_block_stmt());
        self.expect(TokenKind::Catch);
        self.expect(TokenKind::LParen);
        let name_tok = self.expect(TokenKind::Identifier);
        let catch_name = self.intern_ident(name_tok);
        self.expect(TokenKind::RParen);
        let catch_body = Box::new(self.parse_block_stmt());
        let end = catch_body.span;
        Stmt {
            kind: StmtKind::Try { body, catch_name, catch_body },
            span: start.join(end),
        }
    }

    fn parse_print(&mut self) -> Stmt {
        let start = self.expect(TokenKind::Print).span;
        self.expect(TokenKind::LParen);
        let value = self.parse_expr();
        self.expect(TokenKind::RParen);
        let end = self.expect(TokenKind::Semicolon).span;
        Stmt { kind: StmtKind::Print(value), span: start.join(end) }
    }

    fn parse_expr_stmt(&mut self) -> Stmt {
        let current = self.current();
        if matches!(
            current.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            self.error(
                DiagnosticKind::Syntax,
                current.span,
                format!("unexpected {}", current.kind.describe()),
            );
            self.synchronize_stmt();
            return Stmt { kind: StmtKind::Error, span: current.span };
        }
        let expr = self.parse_expr();
        let span = expr.span;
        if self.eat(TokenKind::Semicolon).is_none() {
            self.synchronize_stmt();
        }
        Stmt { kind: StmtKind::ExprStmt(expr), span }
    }

    // --- expressions (precedence climbing) ---

    fn parse_expr(&mut self) -> Expr {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expr {
        let target = self.parse_ternary();
        if self.eat(TokenKind::Equals).is_some() {
            let value = Box::new(self.parse_assignment());
            let span = target.span.join(value.span);
            return Expr {
                kind: ExprKind::Assign { target: Box::new(target), value },
                span,
            };
        }
        target
    }

    fn parse_ternary(&mut self) -> Expr {
        let cond = self.parse_or();
        if self.eat(TokenKind::Question).is_some() {
            let then_branch = Box::new(self.parse_expr());
            self.expect(TokenKind::Colon);
            let else_branch = Box::new(self.parse_ternary());
            let span = cond.span.join(else_branch.span);
            return Expr {
                kind: ExprKind::Ternary { cond: Box::new(cond), then_branch, else_branch },
                span,
            };
        }
        cond
    }

    fn parse_or(&mut self) -> Expr {
        let mut lhs = self.parse_and();
        while self.eat(TokenKind::OrOr).is_some() {
            let rhs = self.parse_and();
            let span = lhs.span.join(rhs.span);
            lhs = Expr {
                kind: ExprKind::Logical { op: LogicalOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            };
        }
        lhs
    }

    fn parse_and(&mut self) -> Expr {
        let mut lhs = self.parse_equality();
        while self.eat(TokenKind::AndAnd).is_some() {
            let rhs = self.parse_equality();
            let span = lhs.span.join(rhs.span);
            lhs = Expr {
                kind: ExprKind::Logical { op: LogicalOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            };
        }
        lhs
    }

    fn parse_equality(&mut self) -> Expr {
        let mut lhs = self.parse_comparison();
        loop {
            let op = match self.current().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_comparison();
            let span = lhs.span.join(rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            };
        }
        lhs
    }

    fn parse_comparison(&mut self) -> Expr {
        let mut lhs = self.parse_additive();
        loop {
            let op = match self.current().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_additive();
            let span = lhs.span.join(rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            };
        }
        lhs
    }

    fn parse_additive(&mut self) -> Expr {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative();
            let span = lhs.span.join(rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            };
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary();
            let span = lhs.span.join(rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            };
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let op = match self.current().kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.bump().span;
            let operand = Box::new(self.parse_unary());
            let span = start.join(operand.span);
            return Expr { kind: ExprKind::Unary { op, operand }, span };
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.current().kind {
                TokenKind::Dot => {
                    self.bump();
                    let name_tok = self.expect(TokenKind::Identifier);
                    let name = self.intern_ident(name_tok);
                    let span = expr.span.join(name_tok.span);
                    expr = Expr {
                        kind: ExprKind::Field { base: Box::new(expr), name, name_span: name_tok.span },
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.parse_expr();
                    let end = self.expect(TokenKind::RBracket).span;
                    let span = expr.span.join(end);
                    expr = Expr {
                        kind: ExprKind::Index { base: Box::new(expr), index: Box::new(index) },
                        span,
                    };
                }
                TokenKind::LParen => {
                    let args = self.parse_args();
                    let end = self.tokens[self.pos.saturating_sub(1)].span;
                    let span = expr.span.join(end);
                    expr = Expr {
                        kind: ExprKind::Call { callee: Box::new(expr), args },
                        span,
                    };
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_args(&mut self) -> Vec<Expr> {
        self.expect(TokenKind::LParen);
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen);
        args
    }

    fn parse_primary(&mut self) -> Expr {
        let current = self.current();
        match current.kind {
            TokenKind::IntLiteral => {
                self.bump();
                let text = self.text(current);
                let value = text.parse::<i64>().unwrap_or(0);
                Expr { kind: ExprKind::IntLiteral(value), span: current.span }
            }
            TokenKind::StringLiteral => {
                self.bump();
                let text = self.text(current);
                let content = &text[1..text.len() - 1];
                let sym = self.interner.intern(content);
                Expr { kind: ExprKind::StringLiteral(sym), span: current.span }
            }
            TokenKind::True => {
                self.bump();
                Expr { kind: ExprKind::BoolLiteral(true), span: current.span }
            }
            TokenKind::False => {
                self.bump();
                Expr { kind: ExprKind::BoolLiteral(false), span: current.span }
            }
            TokenKind::Null => {
                self.bump();
                Expr { kind: ExprKind::NullLiteral, span: current.span }
            }
            TokenKind::This => {
                self.bump();
                Expr { kind: ExprKind::This, span: current.span }
            }
            TokenKind::Super => {
                self.bump();
                Expr { kind: ExprKind::Super, span: current.span }
            }
            TokenKind::Identifier => {
                self.bump();
                let sym = self.intern_ident(current);
                Expr { kind: ExprKind::Identifier(sym), span: current.span }
            }
            TokenKind::New => {
                self.bump();
                let name_tok = self.expect(TokenKind::Identifier);
                let class_name = self.intern_ident(name_tok);
                let args = self.parse_args();
                let end = self.tokens[self.pos.saturating_sub(1)].span;
                Expr {
                    kind: ExprKind::New { class_name, class_span: name_tok.span, args },
                    span: current.span.join(end),
                }
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr();
                self.expect(TokenKind::RParen);
                inner
            }
            TokenKind::LBracket => {
                self.bump();
                let mut elements = Vec::new();
                if !self.at(TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expr());
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                let end = self.expect(TokenKind::RBracket).span;
                Expr { kind: ExprKind::ArrayLiteral(elements), span: current.span.join(end) }
            }
            _ => {
                self.error(
                    DiagnosticKind::Syntax,
                    current.span,
                    format!("expected an expression, found {}", current.kind.describe()),
                );
                if !matches!(
                    current.kind,
                    TokenKind::Eof
                        | TokenKind::Semicolon
                        | TokenKind::RParen
                        | TokenKind::RBrace
                        | TokenKind::RBracket
                        | TokenKind::Comma
                ) {
                    self.bump();
                }
                Expr { kind: ExprKind::Error, span: current.span }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_var_decl_with_annotation() {
        let result = parse("let x: integer = 1 + 2;");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.program.items.len(), 1);
        match &result.program.items[0].kind {
            StmtKind::VarDecl { kind, ty, init, .. } => {
                assert_eq!(*kind, DeclKind::Let);
                assert!(matches!(ty.as_ref().unwrap().kind, TypeKind::Integer));
                assert!(init.is_some());
            }
            other => panic!("unexpected stmt {other:?}"),
        }
    }

    #[test]
    fn parses_class_with_constructor_and_method() {
        let src = r#"
            class Animal {
                let name: string;
                function constructor(name: string) {
                    this.name = name;
                }
                function speak(): string {
                    return this.name;
                }
            }
        "#;
        let result = parse(src);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics.iter().collect::<Vec<_>>());
        match &result.program.items[0].kind {
            StmtKind::ClassDecl(class) => {
                assert_eq!(class.fields.len(), 1);
                assert_eq!(class.methods.len(), 1);
                assert!(class.constructor.is_some());
            }
            other => panic!("unexpected stmt {other:?}"),
        }
    }

    #[test]
    fn parses_while_with_short_circuit_condition() {
        let src = "while (x < 100 || (x > 200 && x != y)) { x = 0; }";
        let result = parse(src);
        assert!(result.diagnostics.is_empty());
        assert!(matches!(result.program.items[0].kind, StmtKind::While { .. }));
    }

    #[test]
    fn reports_syntax_error_and_recovers() {
        let src = "let x: integer = ; let y: integer = 2;";
        let result = parse(src);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.program.items.len(), 2);
    }

    #[test]
    fn parses_array_type_and_foreach() {
        let src = "let xs: integer[] = [1, 2, 3]; foreach (x in xs) { print(x); }";
        let result = parse(src);
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.program.items.len(), 2);
        assert!(matches!(result.program.items[1].kind, StmtKind::Foreach { .. }));
    }
}
