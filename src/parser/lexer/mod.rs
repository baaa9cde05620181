pub mod token;

use crate::parser::span::Span;
use memchr::{memchr, memchr3, memmem};
use token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq)]
enum LexerState {
    Initial,
    Scripting,
    Halted,
}

fn keyword_lookup(text: &[u8]) -> TokenKind {
    let lower = text.to_ascii_lowercase();
    match lower.as_slice() {
        b"or" => TokenKind::LogicalOr,
        b"and" => TokenKind::LogicalAnd,
        b"xor" => TokenKind::LogicalXor,
        b"exit" | b"die" => TokenKind::Exit,
        b"function" => TokenKind::Function,
        b"fn" => TokenKind::Fn,
        b"const" => TokenKind::Const,
        b"return" => TokenKind::Return,
        b"yield" => TokenKind::Yield,
        b"throw" => TokenKind::Throw,
        b"insteadof" => TokenKind::Insteadof,
        b"declare" => TokenKind::Declare,
        b"instanceof" => TokenKind::InstanceOf,
        b"as" => TokenKind::As,
        b"default" => TokenKind::Default,
        b"echo" => TokenKind::Echo,
        b"print" => TokenKind::Print,
        b"class" => TokenKind::Class,
        b"interface" => TokenKind::Interface,
        b"trait" => TokenKind::Trait,
        b"extends" => TokenKind::Extends,
        b"implements" => TokenKind::Implements,
        b"new" => TokenKind::New,
        b"clone" => TokenKind::Clone,
        b"var" | b"public" => TokenKind::Public,
        b"protected" => TokenKind::Protected,
        b"private" => TokenKind::Private,
        b"final" => TokenKind::Final,
        b"abstract" => TokenKind::Abstract,
        b"static" => TokenKind::Static,
        b"readonly" => TokenKind::Readonly,
        b"namespace" => TokenKind::Namespace,
        b"use" => TokenKind::Use,
        b"global" => TokenKind::Global,
        b"isset" => TokenKind::Isset,
        b"empty" => TokenKind::Empty,
        b"__halt_compiler" => TokenKind::HaltCompiler,
        b"__class__" => TokenKind::ClassC,
        b"__trait__" => TokenKind::TraitC,
        b"__function__" => TokenKind::FuncC,
        b"__method__" => TokenKind::MethodC,
        b"__line__" => TokenKind::Line,
        b"__file__" => TokenKind::File,
        b"__dir__" => TokenKind::Dir,
        b"__namespace__" => TokenKind::NsC,
        b"__property__" => TokenKind::PropertyC,
        b"array" => TokenKind::Array,
        b"match" => TokenKind::Match,
        b"list" => TokenKind::List,
        b"include" => TokenKind::Include,
        b"include_once" => TokenKind::IncludeOnce,
        b"require" => TokenKind::Require,
        b"require_once" => TokenKind::RequireOnce,
        b"eval" => TokenKind::Eval,
        _ => TokenKind::Identifier,
    }
}

fn cast_lookup(text: &[u8]) -> Option<TokenKind> {
    let lower = text.to_ascii_lowercase();
    match lower.as_slice() {
        b"int" | b"integer" => Some(TokenKind::IntCast),
        b"bool" | b"boolean" => Some(TokenKind::BoolCast),
        b"float" | b"double" | b"real" => Some(TokenKind::FloatCast),
        b"string" | b"binary" => Some(TokenKind::StringCast),
        b"array" => Some(TokenKind::ArrayCast),
        b"object" => Some(TokenKind::ObjectCast),
        b"unset" => Some(TokenKind::UnsetCast),
        _ => None,
    }
}

fn is_label_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_label_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80
}

/// Tokenizer for PHP source. Strings, heredocs and nowdocs are returned as
/// single tokens; interpolation inside them is not tokenized.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    input: &'src [u8],
    cursor: usize,
    state: LexerState,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        let bytes = input.as_bytes();
        let mut cursor = 0;
        if bytes.starts_with(b"#!") {
            cursor = memchr(b'\n', bytes).map(|pos| pos + 1).unwrap_or(bytes.len());
        }

        Self {
            input: bytes,
            cursor,
            state: LexerState::Initial,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.cursor).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.input.get(self.cursor + n).copied()
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.cursor += n;
    }

    fn starts_with(&self, text: &[u8]) -> bool {
        self.input[self.cursor..].starts_with(text)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: Span::new(start, self.cursor),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) {
        while let Some(c) = self.peek() {
            if is_label_char(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn next_in_initial(&mut self) -> Option<Token> {
        let start = self.cursor;
        if self.cursor >= self.input.len() {
            return None;
        }

        let mut search = self.cursor;
        loop {
            let Some(pos) = memmem::find(&self.input[search..], b"<?") else {
                self.cursor = self.input.len();
                return Some(self.token(TokenKind::InlineHtml, start));
            };
            let tag_start = search + pos;
            let after = &self.input[tag_start + 2..];

            let (kind, tag_len) = if after.len() >= 3 && after[..3].eq_ignore_ascii_case(b"php") {
                match after.get(3) {
                    None => (TokenKind::OpenTag, 5),
                    Some(c) if c.is_ascii_whitespace() => (TokenKind::OpenTag, 6),
                    _ => {
                        search = tag_start + 2;
                        continue;
                    }
                }
            } else if after.first() == Some(&b'=') {
                (TokenKind::OpenTagEcho, 3)
            } else if after.first().is_some_and(|c| c.is_ascii_whitespace()) {
                (TokenKind::OpenTag, 3)
            } else {
                search = tag_start + 2;
                continue;
            };

            if tag_start > start {
                self.cursor = tag_start;
                return Some(self.token(TokenKind::InlineHtml, start));
            }

            // "<?php\r\n" consumes the whole line break.
            self.cursor = tag_start + tag_len;
            if kind == TokenKind::OpenTag
                && self.input.get(self.cursor - 1) == Some(&b'\r')
                && self.peek() == Some(b'\n')
            {
                self.advance();
            }
            self.state = LexerState::Scripting;
            return Some(self.token(kind, start));
        }
    }

    fn read_number(&mut self) -> TokenKind {
        if self.peek() == Some(b'0')
            && let Some(c) = self.peek_at(1)
        {
            let radix_digit: Option<fn(u8) -> bool> = match c {
                b'x' | b'X' => Some(|d: u8| d.is_ascii_hexdigit()),
                b'b' | b'B' => Some(|d: u8| d == b'0' || d == b'1'),
                b'o' | b'O' => Some(|d: u8| (b'0'..=b'7').contains(&d)),
                _ => None,
            };
            if let Some(is_digit) = radix_digit {
                self.advance_n(2);
                while let Some(d) = self.peek() {
                    if is_digit(d) || d == b'_' {
                        self.advance();
                    } else {
                        break;
                    }
                }
                return TokenKind::LNumber;
            }
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == b'_' {
                self.advance();
            } else if c == b'.' && !is_float && self.peek_at(1) != Some(b'.') {
                is_float = true;
                self.advance();
            } else if (c == b'e' || c == b'E')
                && (self.peek_at(1).is_some_and(|d| d.is_ascii_digit())
                    || (matches!(self.peek_at(1), Some(b'+') | Some(b'-'))
                        && self.peek_at(2).is_some_and(|d| d.is_ascii_digit())))
            {
                is_float = true;
                self.advance_n(2);
            } else {
                break;
            }
        }

        if is_float {
            TokenKind::DNumber
        } else {
            TokenKind::LNumber
        }
    }

    fn consume_single_line_comment(&mut self) -> TokenKind {
        while self.cursor < self.input.len() {
            let remaining = &self.input[self.cursor..];
            match memchr3(b'\n', b'\r', b'?', remaining) {
                Some(pos) => {
                    self.cursor += pos;
                    if self.input[self.cursor] == b'?' {
                        if self.peek_at(1) == Some(b'>') {
                            break;
                        }
                        self.advance();
                    } else {
                        break;
                    }
                }
                None => {
                    self.cursor = self.input.len();
                    break;
                }
            }
        }
        TokenKind::Comment
    }

    fn consume_multi_line_comment(&mut self) -> TokenKind {
        // Cursor sits just past "/*".
        let is_doc = self.peek() == Some(b'*') && self.peek_at(1) != Some(b'/');
        match memmem::find(&self.input[self.cursor..], b"*/") {
            Some(pos) => {
                self.cursor += pos + 2;
                if is_doc {
                    TokenKind::DocComment
                } else {
                    TokenKind::Comment
                }
            }
            None => {
                self.cursor = self.input.len();
                TokenKind::Error
            }
        }
    }

    fn read_single_quoted(&mut self) -> TokenKind {
        while let Some(c) = self.peek() {
            self.advance();
            match c {
                b'\\' => {
                    if self.peek().is_some() {
                        self.advance();
                    }
                }
                b'\'' => return TokenKind::ConstantString,
                _ => {}
            }
        }
        TokenKind::Error
    }

    /// Scans a double-quoted or backtick string, stepping over `{$ ... }`
    /// interpolations so quotes nested inside them do not end the string.
    fn read_template(&mut self, quote: u8, kind: TokenKind) -> TokenKind {
        while let Some(c) = self.peek() {
            if c == quote {
                self.advance();
                return kind;
            }
            match c {
                b'\\' => {
                    self.advance();
                    if self.peek().is_some() {
                        self.advance();
                    }
                }
                b'{' if self.peek_at(1) == Some(b'$') => {
                    self.advance();
                    if !self.skip_interpolation() {
                        return TokenKind::Error;
                    }
                }
                _ => self.advance(),
            }
        }
        TokenKind::Error
    }

    fn skip_interpolation(&mut self) -> bool {
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                b'{' => {
                    depth += 1;
                    self.advance();
                }
                b'}' => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        return true;
                    }
                }
                b'\'' => {
                    self.advance();
                    if self.read_single_quoted() == TokenKind::Error {
                        return false;
                    }
                }
                b'"' => {
                    self.advance();
                    if self.read_template(b'"', TokenKind::TemplateString) == TokenKind::Error {
                        return false;
                    }
                }
                _ => self.advance(),
            }
        }
        false
    }

    fn read_heredoc(&mut self) -> TokenKind {
        // Cursor sits just past "<<<".
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.advance();
        }

        let quote = self.peek();
        let is_quoted = matches!(quote, Some(b'\'') | Some(b'"'));
        let is_nowdoc = quote == Some(b'\'');
        if is_quoted {
            self.advance();
        }

        let label_start = self.cursor;
        self.read_identifier();
        let label = self.input[label_start..self.cursor].to_vec();
        if label.is_empty() {
            return TokenKind::Error;
        }
        if is_quoted {
            if self.peek() != quote {
                return TokenKind::Error;
            }
            self.advance();
        }

        match self.peek() {
            Some(b'\n') => self.advance(),
            Some(b'\r') => {
                self.advance();
                if self.peek() == Some(b'\n') {
                    self.advance();
                }
            }
            _ => return TokenKind::Error,
        }

        loop {
            if let Some(len) = self.heredoc_end_at(self.cursor, &label) {
                self.advance_n(len);
                return if is_nowdoc {
                    TokenKind::ConstantString
                } else {
                    TokenKind::TemplateString
                };
            }
            match memchr(b'\n', &self.input[self.cursor..]) {
                Some(pos) => self.cursor += pos + 1,
                None => {
                    self.cursor = self.input.len();
                    return TokenKind::Error;
                }
            }
        }
    }

    /// Length of the closing heredoc label line when one starts at `at`.
    fn heredoc_end_at(&self, at: usize, label: &[u8]) -> Option<usize> {
        let mut current = at;
        while matches!(self.input.get(current), Some(b' ') | Some(b'\t')) {
            current += 1;
        }
        let end = current + label.len();
        if self.input.get(current..end)? != label {
            return None;
        }
        match self.input.get(end) {
            Some(&c) if is_label_char(c) => None,
            _ => Some(end - at),
        }
    }

    fn read_cast(&mut self) -> Option<TokenKind> {
        let mut look = self.cursor + 1;
        while matches!(self.input.get(look), Some(b' ') | Some(b'\t')) {
            look += 1;
        }
        let word_start = look;
        while self.input.get(look).is_some_and(|c| c.is_ascii_alphabetic()) {
            look += 1;
        }
        let kind = cast_lookup(&self.input[word_start..look])?;
        while matches!(self.input.get(look), Some(b' ') | Some(b'\t')) {
            look += 1;
        }
        if self.input.get(look) != Some(&b')') {
            return None;
        }
        self.cursor = look + 1;
        Some(kind)
    }

    fn read_symbol(&mut self) -> TokenKind {
        const SYMBOLS: &[(&[u8], TokenKind)] = &[
            (b"**=", TokenKind::PowEq),
            (b"...", TokenKind::Ellipsis),
            (b"<=>", TokenKind::Spaceship),
            (b"===", TokenKind::EqEqEq),
            (b"!==", TokenKind::BangEqEq),
            (b"<<=", TokenKind::SlEq),
            (b">>=", TokenKind::SrEq),
            (b"??=", TokenKind::CoalesceEq),
            (b"?->", TokenKind::NullSafeArrow),
            (b"->", TokenKind::Arrow),
            (b"=>", TokenKind::DoubleArrow),
            (b"::", TokenKind::DoubleColon),
            (b"**", TokenKind::Pow),
            (b"++", TokenKind::Inc),
            (b"--", TokenKind::Dec),
            (b"+=", TokenKind::PlusEq),
            (b"-=", TokenKind::MinusEq),
            (b"*=", TokenKind::MulEq),
            (b"/=", TokenKind::DivEq),
            (b"%=", TokenKind::ModEq),
            (b".=", TokenKind::ConcatEq),
            (b"&=", TokenKind::AndEq),
            (b"|=", TokenKind::OrEq),
            (b"^=", TokenKind::XorEq),
            (b"==", TokenKind::EqEq),
            (b"!=", TokenKind::BangEq),
            (b"<>", TokenKind::BangEq),
            (b"<=", TokenKind::LtEq),
            (b">=", TokenKind::GtEq),
            (b"<<", TokenKind::Sl),
            (b">>", TokenKind::Sr),
            (b"&&", TokenKind::AmpersandAmpersand),
            (b"||", TokenKind::PipePipe),
            (b"??", TokenKind::Coalesce),
            (b"+", TokenKind::Plus),
            (b"-", TokenKind::Minus),
            (b"*", TokenKind::Asterisk),
            (b"/", TokenKind::Slash),
            (b"%", TokenKind::Percent),
            (b".", TokenKind::Dot),
            (b"=", TokenKind::Eq),
            (b"!", TokenKind::Bang),
            (b"<", TokenKind::Lt),
            (b">", TokenKind::Gt),
            (b"&", TokenKind::Ampersand),
            (b"|", TokenKind::Pipe),
            (b"^", TokenKind::Caret),
            (b"~", TokenKind::BitNot),
            (b"?", TokenKind::Question),
            (b"@", TokenKind::At),
            (b";", TokenKind::SemiColon),
            (b":", TokenKind::Colon),
            (b",", TokenKind::Comma),
            (b"{", TokenKind::OpenBrace),
            (b"}", TokenKind::CloseBrace),
            (b"(", TokenKind::OpenParen),
            (b")", TokenKind::CloseParen),
            (b"[", TokenKind::OpenBracket),
            (b"]", TokenKind::CloseBracket),
            (b"\\", TokenKind::NsSeparator),
            (b"$", TokenKind::Dollar),
        ];

        for (text, kind) in SYMBOLS {
            if self.starts_with(text) {
                self.advance_n(text.len());
                return *kind;
            }
        }
        self.advance();
        TokenKind::Error
    }

    fn next_in_scripting(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let start = self.cursor;
        let c = self.peek()?;

        let kind = match c {
            b'?' if self.peek_at(1) == Some(b'>') => {
                self.advance_n(2);
                match self.peek() {
                    Some(b'\n') => self.advance(),
                    Some(b'\r') => {
                        self.advance();
                        if self.peek() == Some(b'\n') {
                            self.advance();
                        }
                    }
                    _ => {}
                }
                self.state = LexerState::Initial;
                TokenKind::CloseTag
            }
            b'#' if self.peek_at(1) == Some(b'[') => {
                self.advance_n(2);
                TokenKind::Attribute
            }
            b'#' => {
                self.advance();
                self.consume_single_line_comment()
            }
            b'/' if self.peek_at(1) == Some(b'/') => {
                self.advance_n(2);
                self.consume_single_line_comment()
            }
            b'/' if self.peek_at(1) == Some(b'*') => {
                self.advance_n(2);
                self.consume_multi_line_comment()
            }
            b'$' if self.peek_at(1).is_some_and(is_label_start) => {
                self.advance();
                self.read_identifier();
                TokenKind::Variable
            }
            b'0'..=b'9' => self.read_number(),
            b'.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.read_number(),
            c if is_label_start(c) => {
                self.read_identifier();
                let kind = keyword_lookup(&self.input[start..self.cursor]);
                match kind {
                    TokenKind::Yield => self.maybe_yield_from(),
                    TokenKind::HaltCompiler => {
                        self.state = LexerState::Halted;
                        kind
                    }
                    _ => kind,
                }
            }
            b'\'' => {
                self.advance();
                self.read_single_quoted()
            }
            b'"' => {
                self.advance();
                self.read_template(b'"', TokenKind::TemplateString)
            }
            b'`' => {
                self.advance();
                self.read_template(b'`', TokenKind::ShellExec)
            }
            b'<' if self.starts_with(b"<<<") => {
                self.advance_n(3);
                self.read_heredoc()
            }
            b'(' => match self.read_cast() {
                Some(kind) => kind,
                None => {
                    self.advance();
                    TokenKind::OpenParen
                }
            },
            _ => self.read_symbol(),
        };

        Some(self.token(kind, start))
    }

    fn maybe_yield_from(&mut self) -> TokenKind {
        let mut look = self.cursor;
        while self.input.get(look).is_some_and(|c| c.is_ascii_whitespace()) {
            look += 1;
        }
        if look > self.cursor
            && self
                .input
                .get(look..look + 4)
                .is_some_and(|w| w.eq_ignore_ascii_case(b"from"))
            && !self.input.get(look + 4).copied().is_some_and(is_label_char)
        {
            self.cursor = look + 4;
            return TokenKind::YieldFrom;
        }
        TokenKind::Yield
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        match self.state {
            LexerState::Initial => self.next_in_initial(),
            LexerState::Scripting => self.next_in_scripting(),
            LexerState::Halted => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> Vec<TokenKind> {
        Lexer::new(code).map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_declaration_keywords_case_insensitively() {
        assert_eq!(
            kinds("<?php FINAL Class Foo EXTENDS Bar {}"),
            vec![
                TokenKind::OpenTag,
                TokenKind::Final,
                TokenKind::Class,
                TokenKind::Identifier,
                TokenKind::Extends,
                TokenKind::Identifier,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
            ]
        );
    }

    #[test]
    fn interpolated_string_with_nested_quotes_is_one_token() {
        let code = r#"<?php "a {$x["k"]} b";"#;
        assert_eq!(
            kinds(code),
            vec![
                TokenKind::OpenTag,
                TokenKind::TemplateString,
                TokenKind::SemiColon
            ]
        );
    }

    #[test]
    fn heredoc_and_nowdoc() {
        let code = "<?php $a = <<<EOT\nhello\n  EOT;\n$b = <<<'RAW'\n$x\nRAW;\n";
        let tokens = kinds(code);
        assert!(tokens.contains(&TokenKind::TemplateString));
        assert!(tokens.contains(&TokenKind::ConstantString));
        assert!(!tokens.contains(&TokenKind::Error));
    }

    #[test]
    fn casts_and_doc_comments() {
        assert_eq!(
            kinds("<?php /** doc */ ( int ) $a; // trailing"),
            vec![
                TokenKind::OpenTag,
                TokenKind::DocComment,
                TokenKind::IntCast,
                TokenKind::Variable,
                TokenKind::SemiColon,
                TokenKind::Comment,
            ]
        );
    }

    #[test]
    fn inline_html_and_close_tag() {
        assert_eq!(
            kinds("<p><?php echo 1 ?>tail"),
            vec![
                TokenKind::InlineHtml,
                TokenKind::OpenTag,
                TokenKind::Echo,
                TokenKind::LNumber,
                TokenKind::CloseTag,
                TokenKind::InlineHtml,
            ]
        );
    }

    #[test]
    fn halt_compiler_stops_tokenizing() {
        assert_eq!(
            kinds("<?php __halt_compiler(); garbage ' \""),
            vec![TokenKind::OpenTag, TokenKind::HaltCompiler]
        );
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        assert_eq!(
            kinds("<?php 'abc"),
            vec![TokenKind::OpenTag, TokenKind::Error]
        );
    }

    #[test]
    fn yield_from_is_one_token() {
        assert_eq!(
            kinds("<?php yield from $g;"),
            vec![
                TokenKind::OpenTag,
                TokenKind::YieldFrom,
                TokenKind::Variable,
                TokenKind::SemiColon
            ]
        );
    }
}
