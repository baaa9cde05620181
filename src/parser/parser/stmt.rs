use std::rc::Rc;

use super::Parser;
use crate::parser::ast::{
    AttributeGroup, ClassKind, ConstEntry, ConstGroup, Expr, Modifiers, Name, NameKind, Stmt,
    UseItem, UseKind,
};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;

/// Region being scanned for declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanScope {
    File,
    /// `namespace Foo;` body, ends at the next namespace declaration.
    Namespace,
    /// `namespace Foo { ... }` body.
    NamespaceBlock,
    FunctionBody,
}

impl ScanScope {
    fn is_braced(self) -> bool {
        matches!(self, ScanScope::NamespaceBlock | ScanScope::FunctionBody)
    }

    fn allows_imports(self) -> bool {
        self != ScanScope::FunctionBody
    }
}

fn is_member_access(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Arrow | TokenKind::NullSafeArrow | TokenKind::DoubleColon
    )
}

impl<'src> Parser<'src> {
    /// Walks the token stream of a region, recording declarations, closures,
    /// anonymous classes and `define()` calls. Everything else is skipped.
    /// Braced scopes consume their closing `}`.
    pub(crate) fn scan_statements(&mut self, scope: ScanScope) -> Vec<Stmt> {
        let mut statements = Vec::new();
        let mut depth = 0usize;

        loop {
            let kind = self.current_token.kind;
            let after_member_access = is_member_access(self.prev_kind);

            match kind {
                TokenKind::Eof => {
                    if scope.is_braced() || depth > 0 {
                        self.error(
                            self.current_token.span,
                            "Unexpected end of file, expecting '}'",
                        );
                    }
                    break;
                }
                TokenKind::OpenBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::CloseBrace => {
                    if depth == 0 {
                        if scope.is_braced() {
                            self.bump();
                            break;
                        }
                        self.error(self.current_token.span, "Unexpected '}'");
                    } else {
                        depth -= 1;
                    }
                    self.bump();
                }
                TokenKind::Error => {
                    let message = if self.current_text().len() > 1 {
                        "Unterminated string, comment or heredoc"
                    } else {
                        "Unexpected character"
                    };
                    self.error(self.current_token.span, message);
                    self.bump();
                }
                TokenKind::HaltCompiler => {
                    let span = self.current_token.span;
                    self.bump();
                    statements.push(Stmt::HaltCompiler { span });
                }
                TokenKind::Yield | TokenKind::YieldFrom => {
                    self.saw_yield = true;
                    self.bump();
                }
                TokenKind::Namespace
                    if depth == 0
                        && !after_member_access
                        && matches!(scope, ScanScope::File | ScanScope::Namespace)
                        && (self.next_token.kind.is_identifier_like()
                            || self.next_token.kind == TokenKind::OpenBrace) =>
                {
                    if scope == ScanScope::Namespace {
                        break;
                    }
                    let namespace = self.parse_namespace();
                    statements.push(namespace);
                }
                TokenKind::Use if depth == 0 && scope.allows_imports() && !after_member_access => {
                    statements.push(self.parse_use_stmt());
                }
                TokenKind::Const if depth == 0 && scope.allows_imports() && !after_member_access => {
                    let doc_comment = self.current_doc_comment;
                    let start = self.current_token.span.start;
                    let group = self.parse_const_stmt(Vec::new(), doc_comment, start);
                    statements.push(Stmt::Const(group));
                }
                _ if after_member_access => self.bump(),
                _ => {
                    if let Some(stmt) = self.scan_declaration() {
                        statements.push(stmt);
                    }
                }
            }
        }

        statements
    }

    /// Tries to read a declaration or expression of interest at the current
    /// token. Always consumes at least one token.
    fn scan_declaration(&mut self) -> Option<Stmt> {
        let start = self.current_token.span.start;
        let doc_comment = self.current_doc_comment;
        let mut attributes: Vec<AttributeGroup> = Vec::new();

        if self.current_token.kind == TokenKind::Attribute {
            attributes = self.parse_attributes();
        }

        match self.current_token.kind {
            TokenKind::Function
                if self.next_token.kind.is_identifier_like()
                    || self.next_token.kind == TokenKind::Ampersand =>
            {
                // `function &name` and `function &(` share a prefix.
                let func = self.parse_function_or_closure(attributes, doc_comment, start);
                Some(func)
            }
            TokenKind::Function | TokenKind::Fn
                if matches!(
                    self.next_token.kind,
                    TokenKind::OpenParen | TokenKind::Ampersand
                ) =>
            {
                let expr = self.parse_expr_with_attributes(attributes);
                Some(self.expression_stmt(expr))
            }
            TokenKind::Static
                if matches!(self.next_token.kind, TokenKind::Function | TokenKind::Fn) =>
            {
                let expr = self.parse_expr_with_attributes(attributes);
                Some(self.expression_stmt(expr))
            }
            TokenKind::Abstract | TokenKind::Final | TokenKind::Readonly
                if matches!(
                    self.next_token.kind,
                    TokenKind::Class | TokenKind::Abstract | TokenKind::Final | TokenKind::Readonly
                ) =>
            {
                let modifiers = self.parse_modifiers();
                if self.current_token.kind == TokenKind::Class {
                    let class =
                        self.parse_class_like(ClassKind::Class, attributes, modifiers, doc_comment, start);
                    Some(Stmt::ClassLike(class))
                } else {
                    None
                }
            }
            TokenKind::Class => {
                let class = self.parse_class_like(
                    ClassKind::Class,
                    attributes,
                    Modifiers::default(),
                    doc_comment,
                    start,
                );
                Some(Stmt::ClassLike(class))
            }
            TokenKind::Interface => {
                let class = self.parse_class_like(
                    ClassKind::Interface,
                    attributes,
                    Modifiers::default(),
                    doc_comment,
                    start,
                );
                Some(Stmt::ClassLike(class))
            }
            TokenKind::Trait => {
                let class = self.parse_class_like(
                    ClassKind::Trait,
                    attributes,
                    Modifiers::default(),
                    doc_comment,
                    start,
                );
                Some(Stmt::ClassLike(class))
            }
            TokenKind::Identifier
                if self.current_is_word("enum")
                    && self.next_token.kind == TokenKind::Identifier
                    && !matches!(
                        self.prev_kind,
                        TokenKind::New | TokenKind::Function | TokenKind::Const | TokenKind::NsSeparator
                    ) =>
            {
                let class = self.parse_class_like(
                    ClassKind::Enum,
                    attributes,
                    Modifiers::default(),
                    doc_comment,
                    start,
                );
                Some(Stmt::ClassLike(class))
            }
            TokenKind::New
                if matches!(
                    self.next_token.kind,
                    TokenKind::Class | TokenKind::Attribute
                ) =>
            {
                let expr = self.parse_expr(200);
                Some(self.expression_stmt(expr))
            }
            TokenKind::Identifier
                if self.current_is_word("define")
                    && self.next_token.kind == TokenKind::OpenParen
                    && !self.prev_is_name_context() =>
            {
                let expr = self.parse_expr(200);
                Some(self.expression_stmt(expr))
            }
            TokenKind::NsSeparator
                if self.next_token.kind == TokenKind::Identifier
                    && self.text(&self.next_token).eq_ignore_ascii_case("define")
                    && !self.prev_is_name_context()
                    && self.prev_kind != TokenKind::Identifier =>
            {
                let expr = self.parse_expr(200);
                match expr {
                    Expr::Call { .. } => Some(self.expression_stmt(expr)),
                    _ => None,
                }
            }
            _ => {
                if attributes.is_empty() {
                    self.bump();
                }
                None
            }
        }
    }

    fn prev_is_name_context(&self) -> bool {
        matches!(
            self.prev_kind,
            TokenKind::New
                | TokenKind::Function
                | TokenKind::Const
                | TokenKind::NsSeparator
        ) || is_member_access(self.prev_kind)
    }

    fn parse_expr_with_attributes(&mut self, attributes: Vec<AttributeGroup>) -> Expr {
        let mut expr = self.parse_expr(200);
        if !attributes.is_empty()
            && let Expr::Closure(func) = &mut expr
            && let Some(func) = Rc::get_mut(func)
        {
            func.span = Span::new(attributes[0].span.start, func.span.end);
            func.attributes = attributes;
        }
        expr
    }

    fn expression_stmt(&self, expr: Expr) -> Stmt {
        let span = expr.span();
        Stmt::Expression {
            expr: Rc::new(expr),
            span,
        }
    }

    fn parse_namespace(&mut self) -> Stmt {
        let start = self.current_token.span.start;
        self.bump(); // namespace

        let name = if self.current_token.kind.is_identifier_like() {
            Some(self.parse_name())
        } else {
            None
        };

        let body = if self.current_token.kind == TokenKind::OpenBrace {
            self.bump();
            self.scan_statements(ScanScope::NamespaceBlock)
        } else {
            if name.is_none() {
                self.error(self.current_token.span, "Expected namespace name");
            }
            self.expect_semicolon();
            self.scan_statements(ScanScope::Namespace)
        };

        Stmt::Namespace {
            name,
            body,
            span: Span::new(start, self.last_end),
        }
    }

    fn parse_use_kind(&mut self) -> Option<UseKind> {
        match self.current_token.kind {
            TokenKind::Function => {
                self.bump();
                Some(UseKind::Function)
            }
            TokenKind::Const => {
                self.bump();
                Some(UseKind::Const)
            }
            _ => None,
        }
    }

    fn parse_use_stmt(&mut self) -> Stmt {
        let start = self.current_token.span.start;
        self.bump(); // use

        let stmt_kind = self.parse_use_kind();
        let mut uses = Vec::new();

        loop {
            let item_start = self.current_token.span.start;
            let mut name = self.parse_name();

            if self.current_token.kind == TokenKind::NsSeparator
                && self.next_token.kind == TokenKind::OpenBrace
            {
                self.bump();
                self.bump();
                while self.current_token.kind != TokenKind::CloseBrace
                    && self.current_token.kind != TokenKind::Eof
                {
                    let entry_start = self.current_token.span.start;
                    let kind = self.parse_use_kind().or(stmt_kind).unwrap_or(UseKind::Normal);
                    let entry = self.parse_name();
                    let alias = self.parse_use_alias();
                    let mut parts = name.parts.clone();
                    parts.extend(entry.parts);
                    uses.push(UseItem {
                        name: Name {
                            parts,
                            kind: NameKind::FullyQualified,
                            span: Span::new(item_start, entry.span.end),
                        },
                        alias,
                        kind,
                        span: Span::new(entry_start, self.last_end),
                    });
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                if self.expect(TokenKind::CloseBrace, "Expected '}' to close group use") {
                    self.bump();
                }
            } else {
                let alias = self.parse_use_alias();
                name.kind = NameKind::FullyQualified;
                uses.push(UseItem {
                    name,
                    alias,
                    kind: stmt_kind.unwrap_or(UseKind::Normal),
                    span: Span::new(item_start, self.last_end),
                });
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect_semicolon();
        Stmt::Use {
            uses,
            span: Span::new(start, self.last_end),
        }
    }

    fn parse_use_alias(&mut self) -> Option<crate::parser::ast::Ident> {
        if self.eat(TokenKind::As) {
            Some(self.parse_ident("Expected alias after 'as'"))
        } else {
            None
        }
    }

    /// `const A = 1, B = 2;` at namespace level or inside a class body.
    /// The current token is `const`.
    pub(super) fn parse_const_stmt(
        &mut self,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<ConstGroup> {
        self.parse_const_group(attributes, Modifiers::default(), doc_comment, start)
    }

    pub(super) fn parse_const_group(
        &mut self,
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<ConstGroup> {
        self.bump(); // const

        // Typed class constants: `const int X = 1;`
        let ty = if self.current_token.kind.is_identifier_like()
            && self.next_token.kind == TokenKind::Eq
        {
            None
        } else {
            self.parse_type()
        };

        let mut entries = Vec::new();
        loop {
            let entry_start = self.current_token.span.start;
            let name = self.parse_ident("Expected constant name");
            let value = if self.expect(TokenKind::Eq, "Expected '=' after constant name") {
                self.bump();
                self.parse_expr(0)
            } else {
                Expr::Error {
                    span: self.current_token.span,
                }
            };
            entries.push(ConstEntry {
                name,
                value: Rc::new(value),
                span: Span::new(entry_start, self.last_end),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect_semicolon();

        Rc::new(ConstGroup {
            attributes,
            modifiers,
            ty,
            entries,
            doc_comment,
            span: Span::new(start, self.last_end),
        })
    }
}
