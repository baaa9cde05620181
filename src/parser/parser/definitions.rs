use std::rc::Rc;

use super::{Parser, ScanScope};
use crate::parser::ast::{
    AttributeGroup, Body, ClassDecl, ClassKind, ClassMember, ClosureUse, EnumCaseDecl, Expr,
    FunctionDecl, FunctionKind, Ident, Modifiers, Name, Param, PropertyEntry, PropertyGroup, Stmt,
    TraitAdaptation, TraitUse, Type, Visibility,
};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;

impl<'src> Parser<'src> {
    pub(super) fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        loop {
            match self.current_token.kind {
                TokenKind::Public => modifiers.visibility = Some(Visibility::Public),
                TokenKind::Protected => modifiers.visibility = Some(Visibility::Protected),
                TokenKind::Private => modifiers.visibility = Some(Visibility::Private),
                TokenKind::Static => modifiers.is_static = true,
                TokenKind::Abstract => modifiers.is_abstract = true,
                TokenKind::Final => modifiers.is_final = true,
                TokenKind::Readonly => modifiers.is_readonly = true,
                _ => break,
            }
            self.bump();
            // Asymmetric visibility: `private(set)`
            if self.current_token.kind == TokenKind::OpenParen
                && self.current_is_set_marker()
            {
                self.bump();
                self.bump();
                self.bump();
            }
        }
        modifiers
    }

    fn current_is_set_marker(&self) -> bool {
        self.next_token.kind == TokenKind::Identifier
            && self.text(&self.next_token).eq_ignore_ascii_case("set")
    }

    /// At `function` in a statement region: either a named function
    /// declaration or a closure expression.
    pub(super) fn parse_function_or_closure(
        &mut self,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Stmt {
        self.bump(); // function
        let by_ref = self.eat(TokenKind::Ampersand);

        if !self.current_token.kind.is_identifier_like() {
            let closure = self.parse_closure_rest(
                attributes,
                Modifiers::default(),
                by_ref,
                doc_comment,
                start,
            );
            let expr = self.parse_postfix(Expr::Closure(closure));
            let span = expr.span();
            return Stmt::Expression {
                expr: Rc::new(expr),
                span,
            };
        }

        let name = self.parse_ident("Expected function name");
        let params = self.parse_parameter_list();
        let return_type = self.parse_return_type();
        let body = if self.expect(TokenKind::OpenBrace, "Expected '{' to open function body") {
            Some(self.parse_function_body())
        } else {
            self.sync_to_statement_end();
            None
        };

        Stmt::Function(Rc::new(FunctionDecl {
            kind: FunctionKind::Function,
            name: Some(name),
            attributes,
            modifiers: Modifiers::default(),
            by_ref,
            params,
            uses: Vec::new(),
            return_type,
            body,
            doc_comment,
            span: Span::new(start, self.last_end),
        }))
    }

    /// Current token is `{`.
    pub(super) fn parse_function_body(&mut self) -> Body {
        let start = self.current_token.span.start;
        self.bump(); // {

        let outer_yield = std::mem::replace(&mut self.saw_yield, false);
        let statements = if self.enter_nesting() {
            let statements = self.scan_statements(ScanScope::FunctionBody);
            self.leave_nesting();
            statements
        } else {
            self.skip_balanced_block();
            Vec::new()
        };
        let has_yield = std::mem::replace(&mut self.saw_yield, outer_yield);

        Body {
            statements,
            has_yield,
            span: Span::new(start, self.last_end),
        }
    }

    /// Skips to the `}` matching an already consumed `{`, consuming it.
    pub(super) fn skip_balanced_block(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current_token.kind {
                TokenKind::Eof => break,
                TokenKind::OpenBrace => depth += 1,
                TokenKind::CloseBrace => {
                    if depth == 0 {
                        self.bump();
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.bump();
        }
    }

    /// After `function` and an optional `&`: parameters, `use` list, return type and body.
    pub(super) fn parse_closure_rest(
        &mut self,
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        by_ref: bool,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<FunctionDecl> {
        let params = self.parse_parameter_list();
        let uses = self.parse_closure_uses();
        let return_type = self.parse_return_type();
        let body = if self.expect(TokenKind::OpenBrace, "Expected '{' to open closure body") {
            Some(self.parse_function_body())
        } else {
            None
        };

        Rc::new(FunctionDecl {
            kind: FunctionKind::Closure,
            name: None,
            attributes,
            modifiers,
            by_ref,
            params,
            uses,
            return_type,
            body,
            doc_comment,
            span: Span::new(start, self.last_end),
        })
    }

    /// After `fn` and an optional `&`.
    pub(super) fn parse_arrow_function_rest(
        &mut self,
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        by_ref: bool,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<FunctionDecl> {
        let params = self.parse_parameter_list();
        let return_type = self.parse_return_type();

        let body_start = self.current_token.span.start;
        let outer_yield = std::mem::replace(&mut self.saw_yield, false);
        let body = if self.expect(TokenKind::DoubleArrow, "Expected '=>' in arrow function") {
            self.bump();
            let expr = self.parse_expr(0);
            let span = expr.span();
            Some(Body {
                statements: vec![Stmt::Expression {
                    expr: Rc::new(expr),
                    span,
                }],
                has_yield: false,
                span: Span::new(body_start, self.last_end),
            })
        } else {
            None
        };
        let has_yield = std::mem::replace(&mut self.saw_yield, outer_yield);

        Rc::new(FunctionDecl {
            kind: FunctionKind::ArrowFunction,
            name: None,
            attributes,
            modifiers,
            by_ref,
            params,
            uses: Vec::new(),
            return_type,
            body: body.map(|body| Body { has_yield, ..body }),
            doc_comment,
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_closure_uses(&mut self) -> Vec<ClosureUse> {
        let mut uses = Vec::new();
        if !self.eat(TokenKind::Use) {
            return uses;
        }
        if !self.expect(TokenKind::OpenParen, "Expected '(' after 'use'") {
            return uses;
        }
        self.bump();
        while self.current_token.kind != TokenKind::CloseParen
            && self.current_token.kind != TokenKind::Eof
        {
            let by_ref = self.eat(TokenKind::Ampersand);
            if self.expect(TokenKind::Variable, "Expected variable in closure use list") {
                uses.push(ClosureUse {
                    name: self.variable_ident(),
                    by_ref,
                });
                self.bump();
            } else {
                break;
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if self.expect(TokenKind::CloseParen, "Expected ')' to close use list") {
            self.bump();
        }
        uses
    }

    /// The current variable token as an identifier without `$`.
    pub(super) fn variable_ident(&self) -> Ident {
        Ident {
            name: self.current_text().trim_start_matches('$').to_string(),
            span: self.current_token.span,
        }
    }

    pub(super) fn parse_return_type(&mut self) -> Option<Type> {
        if self.eat(TokenKind::Colon) {
            let ty = self.parse_type();
            if ty.is_none() {
                self.error(self.current_token.span, "Expected return type");
            }
            ty
        } else {
            None
        }
    }

    pub(super) fn parse_parameter_list(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if !self.expect(TokenKind::OpenParen, "Expected '(' to open parameter list") {
            return params;
        }
        self.bump();
        while self.current_token.kind != TokenKind::CloseParen
            && self.current_token.kind != TokenKind::Eof
        {
            let before = self.current_token.span.start;
            params.push(self.parse_param());
            if !self.eat(TokenKind::Comma) {
                if self.current_token.span.start == before {
                    self.bump();
                }
                break;
            }
        }
        if self.expect(TokenKind::CloseParen, "Expected ')' to close parameter list") {
            self.bump();
        }
        params
    }

    fn parse_param(&mut self) -> Param {
        let start = self.current_token.span.start;
        let doc_comment = self.current_doc_comment;
        let attributes = self.parse_attributes();
        let modifiers = self.parse_modifiers();

        let ty = if matches!(
            self.current_token.kind,
            TokenKind::Ampersand | TokenKind::Ellipsis | TokenKind::Variable
        ) {
            None
        } else {
            self.parse_type()
        };

        let by_ref = self.eat(TokenKind::Ampersand);
        let variadic = self.eat(TokenKind::Ellipsis);

        let name = if self.expect(TokenKind::Variable, "Expected parameter variable") {
            let ident = self.variable_ident();
            self.bump();
            ident
        } else {
            Ident {
                name: String::new(),
                span: self.current_token.span,
            }
        };

        let default = if self.eat(TokenKind::Eq) {
            Some(Rc::new(self.parse_expr(0)))
        } else {
            None
        };

        // Property hooks on promoted parameters.
        if self.current_token.kind == TokenKind::OpenBrace {
            self.bump();
            self.skip_balanced_block();
        }

        Param {
            attributes,
            name,
            ty,
            default,
            by_ref,
            variadic,
            modifiers,
            doc_comment,
            span: Span::new(start, self.last_end),
        }
    }

    /// Named class-like declaration. The current token is the `class`,
    /// `interface`, `trait` or `enum` keyword.
    pub(super) fn parse_class_like(
        &mut self,
        kind: ClassKind,
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<ClassDecl> {
        self.bump(); // keyword

        let name = if self.current_token.kind.is_identifier_like() {
            Some(self.parse_ident("Expected class name"))
        } else {
            self.error(self.current_token.span, "Expected class name");
            None
        };

        let backing_type = if kind == ClassKind::Enum && self.eat(TokenKind::Colon) {
            self.parse_type()
        } else {
            None
        };

        let (extends, implements) = self.parse_class_heritage(kind);
        let members = self.parse_class_body();

        Rc::new(ClassDecl {
            kind,
            name,
            attributes,
            modifiers,
            extends,
            implements,
            backing_type,
            members,
            args: Vec::new(),
            doc_comment,
            span: Span::new(start, self.last_end),
        })
    }

    /// `new class(...) extends A implements B { ... }`. The current token is `class`.
    pub(super) fn parse_anonymous_class(
        &mut self,
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        start: usize,
    ) -> Rc<ClassDecl> {
        let doc_comment = self.current_doc_comment;
        self.bump(); // class

        let args = if self.current_token.kind == TokenKind::OpenParen {
            self.parse_call_arguments()
        } else {
            Vec::new()
        };
        let (extends, implements) = self.parse_class_heritage(ClassKind::Class);
        let members = self.parse_class_body();

        Rc::new(ClassDecl {
            kind: ClassKind::Class,
            name: None,
            attributes,
            modifiers,
            extends,
            implements,
            backing_type: None,
            members,
            args,
            doc_comment,
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_class_heritage(&mut self, kind: ClassKind) -> (Vec<Name>, Vec<Name>) {
        let mut extends = Vec::new();
        let mut implements = Vec::new();

        if self.eat(TokenKind::Extends) {
            if kind == ClassKind::Interface {
                extends = self.parse_name_list();
            } else {
                extends.push(self.parse_name());
            }
        }
        if self.eat(TokenKind::Implements) {
            implements = self.parse_name_list();
        }

        (extends, implements)
    }

    pub(super) fn parse_name_list(&mut self) -> Vec<Name> {
        let mut names = vec![self.parse_name()];
        while self.eat(TokenKind::Comma) {
            names.push(self.parse_name());
        }
        names
    }

    fn parse_class_body(&mut self) -> Vec<ClassMember> {
        let mut members = Vec::new();
        if !self.expect(TokenKind::OpenBrace, "Expected '{' to open class body") {
            return members;
        }
        self.bump();

        if !self.enter_nesting() {
            self.skip_balanced_block();
            return members;
        }

        while self.current_token.kind != TokenKind::CloseBrace
            && self.current_token.kind != TokenKind::Eof
        {
            let before = self.current_token.span.start;
            if let Some(member) = self.parse_class_member() {
                members.push(member);
            }
            if self.current_token.span.start == before
                && self.current_token.kind != TokenKind::CloseBrace
            {
                self.bump();
            }
        }
        self.leave_nesting();

        if self.expect(TokenKind::CloseBrace, "Expected '}' to close class body") {
            self.bump();
        }
        members
    }

    fn parse_class_member(&mut self) -> Option<ClassMember> {
        let start = self.current_token.span.start;
        let mut doc_comment = self.current_doc_comment;
        let attributes = self.parse_attributes();
        doc_comment = doc_comment.or(self.current_doc_comment);

        if self.current_token.kind == TokenKind::Use {
            return Some(ClassMember::TraitUse(self.parse_trait_use()));
        }

        if self.current_is_word("case") && self.next_token.kind.is_identifier_like() {
            return Some(ClassMember::Case(self.parse_enum_case(
                attributes,
                doc_comment,
                start,
            )));
        }

        let modifiers = self.parse_modifiers();

        match self.current_token.kind {
            TokenKind::Const => Some(ClassMember::Const(self.parse_const_group(
                attributes,
                modifiers,
                doc_comment,
                start,
            ))),
            TokenKind::Function => Some(ClassMember::Method(self.parse_method(
                attributes,
                modifiers,
                doc_comment,
                start,
            ))),
            TokenKind::SemiColon => {
                self.bump();
                None
            }
            _ => {
                if modifiers.is_empty() && self.current_token.kind != TokenKind::Variable {
                    self.error(self.current_token.span, "Unexpected token in class body");
                    self.sync_to_statement_end();
                    return None;
                }
                self.parse_property_group(attributes, modifiers, doc_comment, start)
                    .map(ClassMember::Property)
            }
        }
    }

    fn parse_method(
        &mut self,
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<FunctionDecl> {
        self.bump(); // function
        let by_ref = self.eat(TokenKind::Ampersand);
        let name = self.parse_ident("Expected method name");
        let params = self.parse_parameter_list();
        let return_type = self.parse_return_type();

        let body = match self.current_token.kind {
            TokenKind::OpenBrace => Some(self.parse_function_body()),
            _ => {
                self.expect_semicolon();
                None
            }
        };

        Rc::new(FunctionDecl {
            kind: FunctionKind::Method,
            name: Some(name),
            attributes,
            modifiers,
            by_ref,
            params,
            uses: Vec::new(),
            return_type,
            body,
            doc_comment,
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_property_group(
        &mut self,
        attributes: Vec<AttributeGroup>,
        modifiers: Modifiers,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Option<Rc<PropertyGroup>> {
        let ty = if self.current_token.kind == TokenKind::Variable {
            None
        } else {
            self.parse_type()
        };

        let mut entries = Vec::new();
        loop {
            if !self.expect(TokenKind::Variable, "Expected property name") {
                self.sync_to_statement_end();
                return None;
            }
            let entry_start = self.current_token.span.start;
            let name = self.variable_ident();
            self.bump();
            let default = if self.eat(TokenKind::Eq) {
                Some(Rc::new(self.parse_expr(0)))
            } else {
                None
            };
            entries.push(PropertyEntry {
                name,
                default,
                span: Span::new(entry_start, self.last_end),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        if self.current_token.kind == TokenKind::OpenBrace {
            // Property hooks.
            self.bump();
            self.skip_balanced_block();
        } else {
            self.expect_semicolon();
        }

        Some(Rc::new(PropertyGroup {
            attributes,
            modifiers,
            ty,
            entries,
            doc_comment,
            span: Span::new(start, self.last_end),
        }))
    }

    fn parse_enum_case(
        &mut self,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<Span>,
        start: usize,
    ) -> Rc<EnumCaseDecl> {
        self.bump(); // case
        let name = self.parse_ident("Expected enum case name");
        let value = if self.eat(TokenKind::Eq) {
            Some(Rc::new(self.parse_expr(0)))
        } else {
            None
        };
        self.expect_semicolon();

        Rc::new(EnumCaseDecl {
            attributes,
            name,
            value,
            doc_comment,
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_trait_use(&mut self) -> Rc<TraitUse> {
        let start = self.current_token.span.start;
        self.bump(); // use
        let traits = self.parse_name_list();
        let mut adaptations = Vec::new();

        if self.eat(TokenKind::OpenBrace) {
            while self.current_token.kind != TokenKind::CloseBrace
                && self.current_token.kind != TokenKind::Eof
            {
                let before = self.current_token.span.start;
                if let Some(adaptation) = self.parse_trait_adaptation() {
                    adaptations.push(adaptation);
                }
                if self.current_token.span.start == before {
                    self.bump();
                }
            }
            if self.expect(TokenKind::CloseBrace, "Expected '}' to close trait adaptations") {
                self.bump();
            }
        } else {
            self.expect_semicolon();
        }

        Rc::new(TraitUse {
            traits,
            adaptations,
            span: Span::new(start, self.last_end),
        })
    }

    fn parse_trait_adaptation(&mut self) -> Option<TraitAdaptation> {
        let start = self.current_token.span.start;

        let (trait_name, method) = if self.next_token.kind == TokenKind::DoubleColon
            || self.next_token.kind == TokenKind::NsSeparator
            || self.current_token.kind == TokenKind::NsSeparator
        {
            let trait_name = self.parse_name();
            if !self.expect(TokenKind::DoubleColon, "Expected '::' in trait adaptation") {
                self.sync_to_statement_end();
                return None;
            }
            self.bump();
            (Some(trait_name), self.parse_ident("Expected method name"))
        } else {
            (None, self.parse_ident("Expected method name"))
        };

        if self.eat(TokenKind::Insteadof) {
            let insteadof = self.parse_name_list();
            self.expect_semicolon();
            let Some(trait_name) = trait_name else {
                self.error(Span::new(start, self.last_end), "Expected trait name before insteadof");
                return None;
            };
            return Some(TraitAdaptation::Precedence {
                trait_name,
                method,
                insteadof,
                span: Span::new(start, self.last_end),
            });
        }

        if !self.expect(TokenKind::As, "Expected 'as' or 'insteadof' in trait adaptation") {
            self.sync_to_statement_end();
            return None;
        }
        self.bump();

        let visibility = match self.current_token.kind {
            TokenKind::Public => Some(Visibility::Public),
            TokenKind::Protected => Some(Visibility::Protected),
            TokenKind::Private => Some(Visibility::Private),
            _ => None,
        };
        if visibility.is_some() {
            self.bump();
        }
        let alias = if self.current_token.kind.is_identifier_like() {
            Some(self.parse_ident("Expected alias"))
        } else {
            None
        };
        self.expect_semicolon();

        Some(TraitAdaptation::Alias {
            trait_name,
            method,
            alias,
            visibility,
            span: Span::new(start, self.last_end),
        })
    }
}
