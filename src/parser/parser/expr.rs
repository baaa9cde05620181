use super::Parser;
use crate::parser::ast::{
    Arg, ArrayItem, BinaryOp, CastKind, ClassRef, Expr, Ident, IncludeKind, MagicConstKind,
    MatchArm, MemberName, Modifiers, Name, NameKind, UnaryOp,
};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;

const ASSIGN_BP: u8 = 35;
const TERNARY_BP: u8 = 40;
const INCLUDE_BP: u8 = 36;
const YIELD_BP: u8 = 36;
const NOT_BP: u8 = 160;
const INSTANCEOF_BP: u8 = 170;
const UNARY_BP: u8 = 180;
const CLONE_BP: u8 = 200;

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Plus,
        TokenKind::Minus => BinaryOp::Minus,
        TokenKind::Asterisk => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Dot => BinaryOp::Concat,
        TokenKind::Pow => BinaryOp::Pow,
        TokenKind::EqEq => BinaryOp::EqEq,
        TokenKind::EqEqEq => BinaryOp::EqEqEq,
        TokenKind::BangEq => BinaryOp::NotEq,
        TokenKind::BangEqEq => BinaryOp::NotEqEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::Spaceship => BinaryOp::Spaceship,
        TokenKind::AmpersandAmpersand => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Sl => BinaryOp::ShiftLeft,
        TokenKind::Sr => BinaryOp::ShiftRight,
        TokenKind::LogicalAnd => BinaryOp::LogicalAnd,
        TokenKind::LogicalOr => BinaryOp::LogicalOr,
        TokenKind::LogicalXor => BinaryOp::LogicalXor,
        TokenKind::Coalesce => BinaryOp::Coalesce,
        _ => return None,
    };
    Some(op)
}

fn assign_op(kind: TokenKind) -> Option<Option<BinaryOp>> {
    let op = match kind {
        TokenKind::Eq => None,
        TokenKind::PlusEq => Some(BinaryOp::Plus),
        TokenKind::MinusEq => Some(BinaryOp::Minus),
        TokenKind::MulEq => Some(BinaryOp::Mul),
        TokenKind::DivEq => Some(BinaryOp::Div),
        TokenKind::ModEq => Some(BinaryOp::Mod),
        TokenKind::ConcatEq => Some(BinaryOp::Concat),
        TokenKind::PowEq => Some(BinaryOp::Pow),
        TokenKind::AndEq => Some(BinaryOp::BitAnd),
        TokenKind::OrEq => Some(BinaryOp::BitOr),
        TokenKind::XorEq => Some(BinaryOp::BitXor),
        TokenKind::SlEq => Some(BinaryOp::ShiftLeft),
        TokenKind::SrEq => Some(BinaryOp::ShiftRight),
        TokenKind::CoalesceEq => Some(BinaryOp::Coalesce),
        _ => return None,
    };
    Some(op)
}

fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::LogicalOr => (10, 11),
        BinaryOp::LogicalXor => (20, 21),
        BinaryOp::LogicalAnd => (30, 31),

        BinaryOp::Coalesce => (51, 50), // right associative

        BinaryOp::Or => (60, 61),
        BinaryOp::And => (70, 71),

        BinaryOp::BitOr => (80, 81),
        BinaryOp::BitXor => (90, 91),
        BinaryOp::BitAnd => (100, 101),

        BinaryOp::EqEq
        | BinaryOp::NotEq
        | BinaryOp::EqEqEq
        | BinaryOp::NotEqEq
        | BinaryOp::Spaceship => (110, 111),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => (120, 121),

        BinaryOp::Concat => (125, 126),
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => (130, 131),
        BinaryOp::Plus | BinaryOp::Minus => (140, 141),
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => (150, 151),

        BinaryOp::Pow => (191, 190), // right associative
    }
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Variable { .. }
            | Expr::DynamicVariable { .. }
            | Expr::ArrayDimFetch { .. }
            | Expr::PropertyFetch { .. }
            | Expr::StaticPropertyFetch { .. }
            | Expr::List { .. }
            | Expr::Array { short: true, .. }
    )
}

fn is_expression_end(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::SemiColon
            | TokenKind::Comma
            | TokenKind::CloseParen
            | TokenKind::CloseBracket
            | TokenKind::CloseBrace
            | TokenKind::CloseTag
            | TokenKind::Eof
    )
}

fn to_class_ref(expr: Expr) -> ClassRef {
    match expr {
        Expr::ConstFetch { name, .. } => ClassRef::Named(name),
        other => ClassRef::Dynamic(Box::new(other)),
    }
}

fn int_literal(text: &str, span: Span) -> Expr {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (&lower[1..], 8)
    } else {
        (lower.as_str(), 10)
    };

    match i64::from_str_radix(digits, radix) {
        Ok(value) => Expr::Int { value, span },
        // Integer overflow turns the literal into a float.
        Err(_) => {
            let value = digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0f64, |acc, d| acc * radix as f64 + d as f64);
            Expr::Float { value, span }
        }
    }
}

fn float_literal(text: &str, span: Span) -> Expr {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    Expr::Float {
        value: cleaned.parse::<f64>().unwrap_or_default(),
        span,
    }
}

fn unescape_single_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && (next == '\\' || next == '\'')
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

fn has_interpolation(body: &str) -> bool {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' => {
                if let Some(&next) = bytes.get(i + 1)
                    && (next.is_ascii_alphabetic() || next == b'_' || next >= 0x80 || next == b'{')
                {
                    return true;
                }
                i += 1;
            }
            b'{' if bytes.get(i + 1) == Some(&b'$') => return true,
            _ => i += 1,
        }
    }
    false
}

fn unescape_double_quoted(body: &str, in_heredoc: bool) -> String {
    let bytes = body.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c != b'\\' || i + 1 >= bytes.len() {
            out.push(c);
            i += 1;
            continue;
        }
        let next = bytes[i + 1];
        i += 2;
        match next {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'v' => out.push(0x0b),
            b'e' => out.push(0x1b),
            b'f' => out.push(0x0c),
            b'\\' => out.push(b'\\'),
            b'$' => out.push(b'$'),
            b'"' if !in_heredoc => out.push(b'"'),
            b'0'..=b'7' => {
                let mut value = (next - b'0') as u32;
                let mut taken = 1;
                while taken < 3 && i < bytes.len() && (b'0'..=b'7').contains(&bytes[i]) {
                    value = value * 8 + (bytes[i] - b'0') as u32;
                    i += 1;
                    taken += 1;
                }
                out.push((value & 0xff) as u8);
            }
            b'x' if i < bytes.len() && bytes[i].is_ascii_hexdigit() => {
                let mut value = 0u32;
                let mut taken = 0;
                while taken < 2 && i < bytes.len() && bytes[i].is_ascii_hexdigit() {
                    value = value * 16 + (bytes[i] as char).to_digit(16).unwrap_or(0);
                    i += 1;
                    taken += 1;
                }
                out.push(value as u8);
            }
            b'u' if bytes.get(i) == Some(&b'{') => {
                let close = bytes[i..].iter().position(|b| *b == b'}');
                let decoded = close.and_then(|close| {
                    let hex = std::str::from_utf8(&bytes[i + 1..i + close]).ok()?;
                    let ch = char::from_u32(u32::from_str_radix(hex, 16).ok()?)?;
                    Some((ch, close))
                });
                match decoded {
                    Some((ch, close)) => {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                        i += close + 1;
                    }
                    None => out.extend_from_slice(b"\\u"),
                }
            }
            other => {
                out.push(b'\\');
                out.push(other);
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Body of a heredoc or nowdoc token with the closing indentation removed.
fn heredoc_body(text: &str) -> String {
    let Some(first_newline) = text.find('\n') else {
        return String::new();
    };
    let last_newline = text.rfind('\n').unwrap_or(first_newline);
    let closing_line = &text[last_newline + 1..];
    let indent = closing_line.len() - closing_line.trim_start_matches([' ', '\t']).len();

    if last_newline <= first_newline {
        return String::new();
    }

    let raw = &text[first_newline + 1..last_newline];
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    raw.split('\n')
        .map(|line| {
            let strip = line
                .bytes()
                .take(indent)
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
            &line[strip..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl<'src> Parser<'src> {
    pub(super) fn parse_expr(&mut self, min_bp: u8) -> Expr {
        if !self.enter_nesting() {
            let span = self.current_token.span;
            if !is_expression_end(self.current_token.kind) {
                self.bump();
            }
            return Expr::Error { span };
        }
        let expr = self.parse_expr_bp(min_bp);
        self.leave_nesting();
        expr
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        let mut left = self.parse_nud();

        loop {
            let kind = self.current_token.kind;

            if let Some(op) = assign_op(kind) {
                if !is_assignable(&left) {
                    break;
                }
                self.bump();
                let by_ref = op.is_none() && self.eat(TokenKind::Ampersand);
                let value = self.parse_expr(ASSIGN_BP);
                let span = left.span().to(value.span());
                left = Expr::Assign {
                    target: Box::new(left),
                    op,
                    value: Box::new(value),
                    by_ref,
                    span,
                };
                continue;
            }

            if kind == TokenKind::Question {
                if TERNARY_BP < min_bp {
                    break;
                }
                self.bump();
                let if_true = if self.current_token.kind == TokenKind::Colon {
                    None
                } else {
                    Some(Box::new(self.parse_expr(0)))
                };
                if self.expect(TokenKind::Colon, "Expected ':' in ternary expression") {
                    self.bump();
                }
                let if_false = self.parse_expr(TERNARY_BP + 1);
                let span = left.span().to(if_false.span());
                left = Expr::Ternary {
                    condition: Box::new(left),
                    if_true,
                    if_false: Box::new(if_false),
                    span,
                };
                continue;
            }

            if kind == TokenKind::InstanceOf {
                if INSTANCEOF_BP < min_bp {
                    break;
                }
                self.bump();
                let class = self.parse_class_ref_operand();
                let span = Span::new(left.span().start, self.last_end);
                left = Expr::Instanceof {
                    expr: Box::new(left),
                    class,
                    span,
                };
                continue;
            }

            let Some(op) = binary_op(kind) else {
                break;
            };
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }
            self.bump();
            let right = self.parse_expr(r_bp);
            let span = left.span().to(right.span());
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }

        left
    }

    fn parse_class_ref_operand(&mut self) -> ClassRef {
        match self.current_token.kind {
            TokenKind::Identifier | TokenKind::NsSeparator | TokenKind::Namespace => {
                ClassRef::Named(self.parse_name())
            }
            TokenKind::Static => {
                let name = self.keyword_name();
                ClassRef::Named(name)
            }
            _ => ClassRef::Dynamic(Box::new(self.parse_expr(INSTANCEOF_BP + 1))),
        }
    }

    /// Current keyword token (`static`, `array`) as a single-part name.
    fn keyword_name(&mut self) -> Name {
        let name = Name {
            parts: vec![self.current_text().to_string()],
            kind: NameKind::Unqualified,
            span: self.current_token.span,
        };
        self.bump();
        name
    }

    fn unary(&mut self, op: UnaryOp, bp: u8) -> Expr {
        let start = self.current_token.span.start;
        self.bump();
        let expr = self.parse_expr(bp);
        let span = Span::new(start, expr.span().end);
        Expr::Unary {
            op,
            expr: Box::new(expr),
            span,
        }
    }

    fn parse_nud(&mut self) -> Expr {
        let token = self.current_token;
        let start = token.span.start;
        let span = token.span;

        match token.kind {
            TokenKind::Variable => {
                let ident = self.variable_ident();
                self.bump();
                self.parse_postfix(Expr::Variable {
                    name: ident.name,
                    span,
                })
            }
            TokenKind::Dollar => {
                let expr = self.parse_dynamic_variable();
                self.parse_postfix(expr)
            }
            TokenKind::LNumber => {
                self.bump();
                int_literal(token.span.as_str(self.source), span)
            }
            TokenKind::DNumber => {
                self.bump();
                float_literal(token.span.as_str(self.source), span)
            }
            TokenKind::ConstantString => {
                self.bump();
                let text = token.span.as_str(self.source);
                let value = if text.starts_with("<<<") {
                    heredoc_body(text)
                } else {
                    unescape_single_quoted(&text[1..text.len().saturating_sub(1).max(1)])
                };
                self.parse_postfix(Expr::String { value, span })
            }
            TokenKind::TemplateString => {
                self.bump();
                let text = token.span.as_str(self.source);
                let (body, in_heredoc) = if text.starts_with("<<<") {
                    (heredoc_body(text), true)
                } else {
                    (
                        text[1..text.len().saturating_sub(1).max(1)].to_string(),
                        false,
                    )
                };
                let expr = if has_interpolation(&body) {
                    Expr::InterpolatedString { raw: body, span }
                } else {
                    Expr::String {
                        value: unescape_double_quoted(&body, in_heredoc),
                        span,
                    }
                };
                self.parse_postfix(expr)
            }
            TokenKind::ShellExec => {
                self.bump();
                Expr::ShellExec { span }
            }
            TokenKind::OpenParen => {
                self.bump();
                let inner = self.parse_expr(0);
                if self.expect(TokenKind::CloseParen, "Expected ')'") {
                    self.bump();
                }
                self.parse_postfix(inner)
            }
            TokenKind::OpenBracket => {
                self.bump();
                let items = self.parse_array_items(TokenKind::CloseBracket);
                let expr = Expr::Array {
                    items,
                    short: true,
                    span: Span::new(start, self.last_end),
                };
                self.parse_postfix(expr)
            }
            TokenKind::Array if self.next_token.kind == TokenKind::OpenParen => {
                self.bump();
                self.bump();
                let items = self.parse_array_items(TokenKind::CloseParen);
                let expr = Expr::Array {
                    items,
                    short: false,
                    span: Span::new(start, self.last_end),
                };
                self.parse_postfix(expr)
            }
            TokenKind::List if self.next_token.kind == TokenKind::OpenParen => {
                self.bump();
                self.bump();
                let items = self.parse_array_items(TokenKind::CloseParen);
                Expr::List {
                    items,
                    span: Span::new(start, self.last_end),
                }
            }
            TokenKind::Isset => {
                self.bump();
                let vars = self
                    .parse_call_arguments()
                    .into_iter()
                    .map(|arg| arg.value)
                    .collect();
                Expr::Isset {
                    vars,
                    span: Span::new(start, self.last_end),
                }
            }
            TokenKind::Empty => {
                self.bump();
                let expr = self.parse_parenthesized();
                Expr::Empty {
                    expr: Box::new(expr),
                    span: Span::new(start, self.last_end),
                }
            }
            TokenKind::Eval => {
                self.bump();
                let expr = self.parse_parenthesized();
                Expr::Eval {
                    expr: Box::new(expr),
                    span: Span::new(start, self.last_end),
                }
            }
            TokenKind::Exit => {
                self.bump();
                let expr = if self.eat(TokenKind::OpenParen) {
                    let expr = if self.current_token.kind == TokenKind::CloseParen {
                        None
                    } else {
                        Some(Box::new(self.parse_expr(0)))
                    };
                    if self.expect(TokenKind::CloseParen, "Expected ')'") {
                        self.bump();
                    }
                    expr
                } else {
                    None
                };
                Expr::Exit {
                    expr,
                    span: Span::new(start, self.last_end),
                }
            }
            TokenKind::Print => {
                self.bump();
                let expr = self.parse_expr(INCLUDE_BP);
                Expr::Print {
                    span: Span::new(start, expr.span().end),
                    expr: Box::new(expr),
                }
            }
            TokenKind::Include
            | TokenKind::IncludeOnce
            | TokenKind::Require
            | TokenKind::RequireOnce => {
                let kind = match token.kind {
                    TokenKind::Include => IncludeKind::Include,
                    TokenKind::IncludeOnce => IncludeKind::IncludeOnce,
                    TokenKind::Require => IncludeKind::Require,
                    _ => IncludeKind::RequireOnce,
                };
                self.bump();
                let expr = self.parse_expr(INCLUDE_BP);
                Expr::Include {
                    kind,
                    span: Span::new(start, expr.span().end),
                    expr: Box::new(expr),
                }
            }
            TokenKind::Clone => {
                self.bump();
                let expr = self.parse_expr(CLONE_BP);
                Expr::Clone {
                    span: Span::new(start, expr.span().end),
                    expr: Box::new(expr),
                }
            }
            TokenKind::Throw => {
                self.bump();
                let expr = self.parse_expr(0);
                Expr::Throw {
                    span: Span::new(start, expr.span().end),
                    expr: Box::new(expr),
                }
            }
            TokenKind::Yield => {
                self.saw_yield = true;
                self.bump();
                if is_expression_end(self.current_token.kind) {
                    return Expr::Yield {
                        key: None,
                        value: None,
                        span,
                    };
                }
                let mut value = self.parse_expr(YIELD_BP);
                let mut key = None;
                if self.eat(TokenKind::DoubleArrow) {
                    key = Some(Box::new(value));
                    value = self.parse_expr(YIELD_BP);
                }
                Expr::Yield {
                    key,
                    span: Span::new(start, value.span().end),
                    value: Some(Box::new(value)),
                }
            }
            TokenKind::YieldFrom => {
                self.saw_yield = true;
                self.bump();
                let expr = self.parse_expr(YIELD_BP);
                Expr::YieldFrom {
                    span: Span::new(start, expr.span().end),
                    expr: Box::new(expr),
                }
            }
            TokenKind::Match if self.next_token.kind == TokenKind::OpenParen => self.parse_match(),
            TokenKind::New => self.parse_new(),
            TokenKind::Function | TokenKind::Fn => {
                self.parse_closure_expr(Vec::new(), Modifiers::default(), start)
            }
            TokenKind::Static
                if matches!(self.next_token.kind, TokenKind::Function | TokenKind::Fn) =>
            {
                self.bump();
                let modifiers = Modifiers {
                    is_static: true,
                    ..Modifiers::default()
                };
                self.parse_closure_expr(Vec::new(), modifiers, start)
            }
            TokenKind::Static => {
                let name = self.keyword_name();
                self.parse_postfix(Expr::ConstFetch { name, span })
            }
            TokenKind::Attribute => {
                let attributes = self.parse_attributes();
                let mut modifiers = Modifiers::default();
                if self.current_token.kind == TokenKind::Static {
                    modifiers.is_static = true;
                    self.bump();
                }
                if matches!(self.current_token.kind, TokenKind::Function | TokenKind::Fn) {
                    self.parse_closure_expr(attributes, modifiers, start)
                } else {
                    self.error(self.current_token.span, "Expected closure after attributes");
                    Expr::Error { span }
                }
            }
            TokenKind::Line
            | TokenKind::File
            | TokenKind::Dir
            | TokenKind::ClassC
            | TokenKind::TraitC
            | TokenKind::MethodC
            | TokenKind::FuncC
            | TokenKind::NsC
            | TokenKind::PropertyC => {
                let kind = match token.kind {
                    TokenKind::Line => MagicConstKind::Line,
                    TokenKind::File => MagicConstKind::File,
                    TokenKind::Dir => MagicConstKind::Dir,
                    TokenKind::ClassC => MagicConstKind::Class,
                    TokenKind::TraitC => MagicConstKind::Trait,
                    TokenKind::MethodC => MagicConstKind::Method,
                    TokenKind::FuncC => MagicConstKind::Function,
                    TokenKind::NsC => MagicConstKind::Namespace,
                    _ => MagicConstKind::Property,
                };
                self.bump();
                self.parse_postfix(Expr::MagicConst { kind, span })
            }
            kind if kind.is_cast() => {
                let cast = match kind {
                    TokenKind::IntCast => CastKind::Int,
                    TokenKind::FloatCast => CastKind::Float,
                    TokenKind::StringCast => CastKind::String,
                    TokenKind::ArrayCast => CastKind::Array,
                    TokenKind::ObjectCast => CastKind::Object,
                    TokenKind::BoolCast => CastKind::Bool,
                    _ => CastKind::Unset,
                };
                self.bump();
                let expr = self.parse_expr(UNARY_BP);
                Expr::Cast {
                    kind: cast,
                    span: Span::new(start, expr.span().end),
                    expr: Box::new(expr),
                }
            }
            TokenKind::Plus => self.unary(UnaryOp::Plus, UNARY_BP),
            TokenKind::Minus => self.unary(UnaryOp::Minus, UNARY_BP),
            TokenKind::Bang => self.unary(UnaryOp::Not, NOT_BP),
            TokenKind::BitNot => self.unary(UnaryOp::BitNot, UNARY_BP),
            TokenKind::At => self.unary(UnaryOp::ErrorSuppress, UNARY_BP),
            TokenKind::Inc => self.unary(UnaryOp::PreInc, UNARY_BP),
            TokenKind::Dec => self.unary(UnaryOp::PreDec, UNARY_BP),
            TokenKind::Ampersand => self.unary(UnaryOp::Reference, UNARY_BP),
            TokenKind::Identifier | TokenKind::NsSeparator => {
                let name = self.parse_name();
                let span = name.span;
                self.parse_postfix(Expr::ConstFetch { name, span })
            }
            TokenKind::Namespace if self.next_token.kind == TokenKind::NsSeparator => {
                let name = self.parse_name();
                let span = name.span;
                self.parse_postfix(Expr::ConstFetch { name, span })
            }
            _ => {
                self.error(span, "Unexpected token in expression");
                if !is_expression_end(token.kind) {
                    self.bump();
                }
                Expr::Error { span }
            }
        }
    }

    fn parse_parenthesized(&mut self) -> Expr {
        if !self.expect(TokenKind::OpenParen, "Expected '('") {
            return Expr::Error {
                span: self.current_token.span,
            };
        }
        self.bump();
        let expr = self.parse_expr(0);
        if self.expect(TokenKind::CloseParen, "Expected ')'") {
            self.bump();
        }
        expr
    }

    /// `$$name` or `${expr}`. The current token is `$`.
    fn parse_dynamic_variable(&mut self) -> Expr {
        let start = self.current_token.span.start;
        self.bump(); // $
        let inner = match self.current_token.kind {
            TokenKind::OpenBrace => {
                self.bump();
                let expr = self.parse_expr(0);
                if self.expect(TokenKind::CloseBrace, "Expected '}'") {
                    self.bump();
                }
                expr
            }
            TokenKind::Variable => {
                let ident = self.variable_ident();
                self.bump();
                Expr::Variable {
                    name: ident.name,
                    span: ident.span,
                }
            }
            TokenKind::Dollar => self.parse_dynamic_variable(),
            _ => {
                self.error(self.current_token.span, "Expected variable after '$'");
                Expr::Error {
                    span: self.current_token.span,
                }
            }
        };
        Expr::DynamicVariable {
            expr: Box::new(inner),
            span: Span::new(start, self.last_end),
        }
    }

    fn parse_closure_expr(
        &mut self,
        attributes: Vec<crate::parser::ast::AttributeGroup>,
        modifiers: Modifiers,
        start: usize,
    ) -> Expr {
        let doc_comment = self.current_doc_comment;
        let is_arrow = self.current_token.kind == TokenKind::Fn;
        self.bump(); // function / fn
        let by_ref = self.eat(TokenKind::Ampersand);
        let func = if is_arrow {
            self.parse_arrow_function_rest(attributes, modifiers, by_ref, doc_comment, start)
        } else {
            self.parse_closure_rest(attributes, modifiers, by_ref, doc_comment, start)
        };
        Expr::Closure(func)
    }

    fn parse_member_name(&mut self) -> MemberName {
        match self.current_token.kind {
            TokenKind::Variable => {
                let ident = self.variable_ident();
                self.bump();
                MemberName::Dynamic(Box::new(Expr::Variable {
                    name: ident.name,
                    span: ident.span,
                }))
            }
            TokenKind::OpenBrace => {
                self.bump();
                let expr = self.parse_expr(0);
                if self.expect(TokenKind::CloseBrace, "Expected '}'") {
                    self.bump();
                }
                MemberName::Dynamic(Box::new(expr))
            }
            TokenKind::Dollar => MemberName::Dynamic(Box::new(self.parse_dynamic_variable())),
            _ => MemberName::Ident(self.parse_ident("Expected member name")),
        }
    }

    /// Member accesses, calls, offsets and postfix increments following a primary expression.
    pub(super) fn parse_postfix(&mut self, mut expr: Expr) -> Expr {
        loop {
            let start = expr.span().start;
            match self.current_token.kind {
                TokenKind::OpenBracket => {
                    self.bump();
                    let dim = if self.current_token.kind == TokenKind::CloseBracket {
                        None
                    } else {
                        Some(Box::new(self.parse_expr(0)))
                    };
                    if self.expect(TokenKind::CloseBracket, "Expected ']'") {
                        self.bump();
                    }
                    expr = Expr::ArrayDimFetch {
                        array: Box::new(expr),
                        dim,
                        span: Span::new(start, self.last_end),
                    };
                }
                TokenKind::Arrow | TokenKind::NullSafeArrow => {
                    let nullsafe = self.current_token.kind == TokenKind::NullSafeArrow;
                    self.bump();
                    let member = self.parse_member_name();
                    if self.current_token.kind == TokenKind::OpenParen {
                        let args = self.parse_call_arguments();
                        expr = Expr::MethodCall {
                            target: Box::new(expr),
                            method: member,
                            args,
                            nullsafe,
                            span: Span::new(start, self.last_end),
                        };
                    } else {
                        expr = Expr::PropertyFetch {
                            target: Box::new(expr),
                            property: member,
                            nullsafe,
                            span: Span::new(start, self.last_end),
                        };
                    }
                }
                TokenKind::DoubleColon => {
                    self.bump();
                    let class = to_class_ref(expr);
                    expr = self.parse_static_member(class, start);
                }
                TokenKind::OpenParen => {
                    let args = self.parse_call_arguments();
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        span: Span::new(start, self.last_end),
                    };
                }
                TokenKind::Inc | TokenKind::Dec if is_assignable(&expr) => {
                    let op = if self.current_token.kind == TokenKind::Inc {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    self.bump();
                    expr = Expr::Unary {
                        op,
                        expr: Box::new(expr),
                        span: Span::new(start, self.last_end),
                    };
                }
                _ => break,
            }
        }
        expr
    }

    /// After `X::`.
    fn parse_static_member(&mut self, class: ClassRef, start: usize) -> Expr {
        match self.current_token.kind {
            TokenKind::Variable => {
                let ident = self.variable_ident();
                self.bump();
                if self.current_token.kind == TokenKind::OpenParen {
                    let args = self.parse_call_arguments();
                    Expr::StaticCall {
                        class,
                        method: MemberName::Dynamic(Box::new(Expr::Variable {
                            name: ident.name,
                            span: ident.span,
                        })),
                        args,
                        span: Span::new(start, self.last_end),
                    }
                } else {
                    Expr::StaticPropertyFetch {
                        class,
                        property: ident.name,
                        span: Span::new(start, self.last_end),
                    }
                }
            }
            TokenKind::OpenBrace => {
                self.bump();
                let member = self.parse_expr(0);
                if self.expect(TokenKind::CloseBrace, "Expected '}'") {
                    self.bump();
                }
                let args = if self.current_token.kind == TokenKind::OpenParen {
                    self.parse_call_arguments()
                } else {
                    self.error(self.current_token.span, "Expected '(' after dynamic member");
                    Vec::new()
                };
                Expr::StaticCall {
                    class,
                    method: MemberName::Dynamic(Box::new(member)),
                    args,
                    span: Span::new(start, self.last_end),
                }
            }
            kind if kind.is_identifier_like() => {
                let ident = Ident {
                    name: self.current_text().to_string(),
                    span: self.current_token.span,
                };
                self.bump();
                if self.current_token.kind == TokenKind::OpenParen {
                    let args = self.parse_call_arguments();
                    Expr::StaticCall {
                        class,
                        method: MemberName::Ident(ident),
                        args,
                        span: Span::new(start, self.last_end),
                    }
                } else {
                    Expr::ClassConstFetch {
                        class,
                        constant: ident,
                        span: Span::new(start, self.last_end),
                    }
                }
            }
            _ => {
                self.error(self.current_token.span, "Expected member name after '::'");
                Expr::Error {
                    span: Span::new(start, self.current_token.span.end),
                }
            }
        }
    }

    fn parse_new(&mut self) -> Expr {
        let start = self.current_token.span.start;
        self.bump(); // new

        let attributes_start = self.current_token.span.start;
        let attributes = self.parse_attributes();
        let modifiers = if matches!(
            self.current_token.kind,
            TokenKind::Readonly | TokenKind::Final | TokenKind::Abstract
        ) {
            self.parse_modifiers()
        } else {
            Modifiers::default()
        };

        if self.current_token.kind == TokenKind::Class {
            let class_start = if attributes.is_empty() {
                self.current_token.span.start
            } else {
                attributes_start
            };
            let decl = self.parse_anonymous_class(attributes, modifiers, class_start);
            let expr = Expr::New {
                class: ClassRef::Anonymous(decl),
                args: Vec::new(),
                span: Span::new(start, self.last_end),
            };
            return self.parse_postfix(expr);
        }

        let class = match self.current_token.kind {
            TokenKind::Static => ClassRef::Named(self.keyword_name()),
            TokenKind::Identifier | TokenKind::NsSeparator | TokenKind::Namespace => {
                ClassRef::Named(self.parse_name())
            }
            TokenKind::Variable | TokenKind::Dollar => {
                ClassRef::Dynamic(Box::new(self.parse_new_class_expr()))
            }
            TokenKind::OpenParen => {
                self.bump();
                let expr = self.parse_expr(0);
                if self.expect(TokenKind::CloseParen, "Expected ')'") {
                    self.bump();
                }
                ClassRef::Dynamic(Box::new(expr))
            }
            _ => {
                self.error(self.current_token.span, "Expected class name after 'new'");
                ClassRef::Dynamic(Box::new(Expr::Error {
                    span: self.current_token.span,
                }))
            }
        };

        let args = if self.current_token.kind == TokenKind::OpenParen {
            self.parse_call_arguments()
        } else {
            Vec::new()
        };

        let expr = Expr::New {
            class,
            args,
            span: Span::new(start, self.last_end),
        };
        self.parse_postfix(expr)
    }

    /// `new $a->b['c']`: variables with property and offset fetches, no calls.
    fn parse_new_class_expr(&mut self) -> Expr {
        let mut expr = if self.current_token.kind == TokenKind::Dollar {
            self.parse_dynamic_variable()
        } else {
            let ident = self.variable_ident();
            self.bump();
            Expr::Variable {
                name: ident.name,
                span: ident.span,
            }
        };

        loop {
            let start = expr.span().start;
            match self.current_token.kind {
                TokenKind::Arrow | TokenKind::NullSafeArrow => {
                    let nullsafe = self.current_token.kind == TokenKind::NullSafeArrow;
                    self.bump();
                    let property = self.parse_member_name();
                    expr = Expr::PropertyFetch {
                        target: Box::new(expr),
                        property,
                        nullsafe,
                        span: Span::new(start, self.last_end),
                    };
                }
                TokenKind::OpenBracket => {
                    self.bump();
                    let dim = Some(Box::new(self.parse_expr(0)));
                    if self.expect(TokenKind::CloseBracket, "Expected ']'") {
                        self.bump();
                    }
                    expr = Expr::ArrayDimFetch {
                        array: Box::new(expr),
                        dim,
                        span: Span::new(start, self.last_end),
                    };
                }
                TokenKind::DoubleColon if self.next_token.kind == TokenKind::Variable => {
                    self.bump();
                    let ident = self.variable_ident();
                    self.bump();
                    expr = Expr::StaticPropertyFetch {
                        class: ClassRef::Dynamic(Box::new(expr)),
                        property: ident.name,
                        span: Span::new(start, self.last_end),
                    };
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_match(&mut self) -> Expr {
        let start = self.current_token.span.start;
        self.bump(); // match
        let condition = self.parse_parenthesized();

        let mut arms = Vec::new();
        if self.expect(TokenKind::OpenBrace, "Expected '{' after match condition") {
            self.bump();
            while self.current_token.kind != TokenKind::CloseBrace
                && self.current_token.kind != TokenKind::Eof
            {
                let arm_start = self.current_token.span.start;
                let conditions = if self.current_token.kind == TokenKind::Default
                    && matches!(
                        self.next_token.kind,
                        TokenKind::DoubleArrow | TokenKind::Comma
                    ) {
                    self.bump();
                    self.eat(TokenKind::Comma);
                    None
                } else {
                    let mut conditions = Vec::new();
                    while self.current_token.kind != TokenKind::DoubleArrow
                        && self.current_token.kind != TokenKind::Eof
                    {
                        conditions.push(self.parse_expr(0));
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    Some(conditions)
                };
                if !self.expect(TokenKind::DoubleArrow, "Expected '=>' in match arm") {
                    self.sync_to_statement_end();
                    break;
                }
                self.bump();
                let body = self.parse_expr(0);
                arms.push(MatchArm {
                    conditions,
                    body,
                    span: Span::new(arm_start, self.last_end),
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            if self.expect(TokenKind::CloseBrace, "Expected '}' to close match") {
                self.bump();
            }
        }

        Expr::Match {
            condition: Box::new(condition),
            arms,
            span: Span::new(start, self.last_end),
        }
    }

    pub(super) fn parse_call_arguments(&mut self) -> Vec<Arg> {
        let mut args = Vec::new();
        if !self.expect(TokenKind::OpenParen, "Expected '('") {
            return args;
        }
        self.bump();

        let mut has_named = false;
        while self.current_token.kind != TokenKind::CloseParen
            && self.current_token.kind != TokenKind::Eof
        {
            let start = self.current_token.span.start;
            let mut name = None;
            let mut unpack = false;

            if self.current_token.kind.is_identifier_like()
                && self.next_token.kind == TokenKind::Colon
            {
                name = Some(Ident {
                    name: self.current_text().to_string(),
                    span: self.current_token.span,
                });
                self.bump();
                self.bump();
                has_named = true;
            } else if self.current_token.kind == TokenKind::Ellipsis {
                if self.next_token.kind == TokenKind::CloseParen {
                    let span = self.current_token.span;
                    self.bump();
                    args.push(Arg {
                        name: None,
                        value: Expr::VariadicPlaceholder { span },
                        unpack: false,
                        span,
                    });
                    continue;
                }
                unpack = true;
                self.bump();
            } else if has_named {
                self.error(
                    self.current_token.span,
                    "Cannot use positional argument after named argument",
                );
            }

            let value = self.parse_expr(0);
            let end = value.span().end;
            args.push(Arg {
                name,
                value,
                unpack,
                span: Span::new(start, end),
            });

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        if self.expect(TokenKind::CloseParen, "Expected ')' to close argument list") {
            self.bump();
        }
        args
    }

    /// Items up to and including `close`.
    fn parse_array_items(&mut self, close: TokenKind) -> Vec<ArrayItem> {
        let mut items = Vec::new();
        while self.current_token.kind != close && self.current_token.kind != TokenKind::Eof {
            if self.eat(TokenKind::Comma) {
                // Skipped slot in a destructuring list.
                continue;
            }
            let start = self.current_token.span.start;

            if self.eat(TokenKind::Ellipsis) {
                let value = self.parse_expr(0);
                items.push(ArrayItem {
                    key: None,
                    span: Span::new(start, value.span().end),
                    value,
                    by_ref: false,
                    unpack: true,
                });
            } else {
                let mut by_ref = self.eat(TokenKind::Ampersand);
                let mut value = self.parse_expr(0);
                let mut key = None;
                if !by_ref && self.eat(TokenKind::DoubleArrow) {
                    key = Some(value);
                    by_ref = self.eat(TokenKind::Ampersand);
                    value = self.parse_expr(0);
                }
                items.push(ArrayItem {
                    key,
                    span: Span::new(start, value.span().end),
                    value,
                    by_ref,
                    unpack: false,
                });
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if self.expect(close, "Expected end of array") {
            self.bump();
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(code: &str) -> Expr {
        let source = format!("<?php {code};");
        let mut parser = Parser::new(&source);
        parser.bump(); // open tag
        let expr = parser.parse_expr(0);
        assert!(parser.errors.is_empty(), "errors: {:?}", parser.errors);
        expr
    }

    #[test]
    fn numeric_literals() {
        assert!(matches!(expr("0x1F"), Expr::Int { value: 31, .. }));
        assert!(matches!(expr("0b101"), Expr::Int { value: 5, .. }));
        assert!(matches!(expr("0755"), Expr::Int { value: 493, .. }));
        assert!(matches!(expr("1_000"), Expr::Int { value: 1000, .. }));
        assert!(matches!(expr("9223372036854775808"), Expr::Float { .. }));
        assert!(matches!(expr("1.5e3"), Expr::Float { value, .. } if value == 1500.0));
    }

    #[test]
    fn string_literals() {
        let Expr::String { value, .. } = expr(r"'it\'s \n'") else {
            panic!("expected string");
        };
        assert_eq!(value, "it's \\n");

        let Expr::String { value, .. } = expr(r#""tab\there \u{1F600}""#) else {
            panic!("expected string");
        };
        assert_eq!(value, "tab\there \u{1F600}");

        assert!(matches!(
            expr(r#""hello $name""#),
            Expr::InterpolatedString { .. }
        ));

        let Expr::String { value, .. } = expr("<<<'EOT'\n    a\n      b\n    EOT") else {
            panic!("expected nowdoc");
        };
        assert_eq!(value, "a\n  b");
    }

    #[test]
    fn precedence() {
        let Expr::Binary { op, right, .. } = expr("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Plus);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));

        let Expr::Binary { op, .. } = expr("'a' . 1 + 2") else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Concat);

        assert!(matches!(
            expr("-2 ** 2"),
            Expr::Unary {
                op: UnaryOp::Minus,
                ..
            }
        ));
    }

    #[test]
    fn class_constant_references() {
        let Expr::ClassConstFetch {
            class: ClassRef::Named(name),
            constant,
            ..
        } = expr("\\App\\Foo::BAR")
        else {
            panic!("expected class constant fetch");
        };
        assert_eq!(name.joined(), "App\\Foo");
        assert_eq!(name.kind, NameKind::FullyQualified);
        assert_eq!(constant.name, "BAR");

        assert!(matches!(
            expr("static::class"),
            Expr::ClassConstFetch { constant, .. } if constant.name == "class"
        ));
    }

    #[test]
    fn calls_and_arrays() {
        let Expr::Call { func, args, .. } = expr("define('A', [1, 'k' => [2]])") else {
            panic!("expected call");
        };
        assert!(matches!(*func, Expr::ConstFetch { .. }));
        assert_eq!(args.len(), 2);
        let Expr::Array { items, short, .. } = &args[1].value else {
            panic!("expected array");
        };
        assert!(short);
        assert!(items[1].key.is_some());
    }

    #[test]
    fn assignment_and_ternary() {
        assert!(matches!(expr("$a = $b ?: 3"), Expr::Assign { .. }));
        assert!(matches!(expr("$a ?? $b ?? 'c'"), Expr::Binary { op: BinaryOp::Coalesce, .. }));
        assert!(matches!(
            expr("match ($x) { 1, 2 => 'a', default => 'b' }"),
            Expr::Match { ref arms, .. } if arms.len() == 2
        ));
    }
}
