//! Byte stream → token stream (§4.B). Single-threaded, restartable one token at a time; the
//! parser drives it by repeatedly calling [`Lexer::next`].

use crate::diagnostics::errors::{CompileError, ErrorList};
use crate::diagnostics::location::SourceLocation;
use crate::string_interning::{StringId, StringTable};
use crate::token::{CharPosition, TextLocation, Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    file: StringId,
    filename: std::path::PathBuf,
    /// Whether the previously emitted significant token can trigger an automatic `;` at the
    /// next newline (§4.B: "after an expression, identifier, literal, `)`, `]`, `}`, or a
    /// branch keyword").
    semicolon_eligible: bool,
    pub errors: ErrorList,
}

fn triggers_semicolon(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Ident
            | Integer
            | Float
            | Char
            | String
            | True
            | False
            | Null
            | RParen
            | RBrack
            | RBrace
            | Return
            | Break
            | Continue
            | PlusPlus
            | MinusMinus
    )
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, filename: std::path::PathBuf, file: StringId) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            file,
            filename,
            semicolon_eligible: false,
            errors: ErrorList::new(),
        }
    }

    fn here(&self) -> CharPosition {
        CharPosition {
            offset: self.pos as u32,
            line: self.line,
            column: self.column,
        }
    }

    fn loc_from(&self, start: CharPosition) -> TextLocation {
        TextLocation {
            file: self.file,
            start,
            end: self.here(),
        }
    }

    fn src_loc_from(&self, start: CharPosition) -> SourceLocation {
        SourceLocation::new(self.filename.clone(), start, self.here())
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn bump_if(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip whitespace, inserting a synthetic `Semicolon` at the first newline following a
    /// statement-ending token (§4.B). Returns `Some(token)` when a semicolon was inserted.
    fn skip_whitespace(&mut self, table: &mut StringTable) -> Option<Token> {
        loop {
            match self.peek() {
                Some(b'\n') => {
                    let start = self.here();
                    self.advance();
                    if self.semicolon_eligible {
                        self.semicolon_eligible = false;
                        let lit = table.intern(";");
                        return Some(Token::new(TokenKind::Semicolon, lit, self.loc_from(start)));
                    }
                }
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.advance();
                }
                _ => return None,
            }
        }
    }

    pub fn next(&mut self, table: &mut StringTable) -> Token {
        if let Some(semi) = self.skip_whitespace(table) {
            return semi;
        }

        let start = self.here();
        let Some(c) = self.peek() else {
            self.semicolon_eligible = false;
            let lit = table.intern("");
            return Token::new(TokenKind::Eof, lit, self.loc_from(start));
        };

        let token = match c {
            b'/' if self.peek_at(1) == Some(b'/') => self.lex_line_comment(table, start),
            b'/' if self.peek_at(1) == Some(b'*') => self.lex_block_comment(table, start),
            b'"' => self.lex_string(table, start),
            b'\'' => self.lex_char(table, start),
            b'0'..=b'9' => self.lex_number(table, start),
            b'_' if !is_ident_continue(self.peek_at(1).unwrap_or(0)) => {
                self.advance();
                Token::new(TokenKind::Underscore, table.intern("_"), self.loc_from(start))
            }
            c if is_ident_start(c) => self.lex_ident(table, start),
            b';' => {
                self.advance();
                Token::new(TokenKind::Semicolon, table.intern(";"), self.loc_from(start))
            }
            _ => self.lex_operator(table, start),
        };

        self.semicolon_eligible = triggers_semicolon(token.kind);
        token
    }

    fn lex_operator(&mut self, table: &mut StringTable, start: CharPosition) -> Token {
        use TokenKind::*;
        let c = self.advance().unwrap();
        let kind = match c {
            b'(' => LParen,
            b')' => RParen,
            b'{' => LBrace,
            b'}' => RBrace,
            b'[' => LBrack,
            b']' => RBrack,
            b'.' => Dot,
            b',' => Comma,
            b':' => {
                if self.bump_if(b':') {
                    ColonColon
                } else {
                    Colon
                }
            }
            b'-' => {
                if self.bump_if(b'>') {
                    Arrow
                } else if self.bump_if(b'=') {
                    SubAssign
                } else if self.bump_if(b'-') {
                    MinusMinus
                } else {
                    Sub
                }
            }
            b'+' => {
                if self.bump_if(b'=') {
                    AddAssign
                } else if self.bump_if(b'+') {
                    PlusPlus
                } else {
                    Add
                }
            }
            b'*' => {
                if self.bump_if(b'=') {
                    MulAssign
                } else {
                    Star
                }
            }
            b'/' => {
                if self.bump_if(b'=') {
                    DivAssign
                } else {
                    Slash
                }
            }
            b'%' => {
                if self.bump_if(b'=') {
                    ModAssign
                } else {
                    Percent
                }
            }
            b'=' => {
                if self.bump_if(b'=') {
                    EqEq
                } else {
                    Assign
                }
            }
            b'!' => {
                if self.bump_if(b'=') {
                    NotEq
                } else {
                    Bang
                }
            }
            b'>' => {
                if self.bump_if(b'=') {
                    GtEq
                } else {
                    Gt
                }
            }
            b'<' => {
                if self.bump_if(b'=') {
                    LtEq
                } else {
                    Lt
                }
            }
            b'&' => {
                if self.bump_if(b'&') {
                    AmpAmp
                } else {
                    Amp
                }
            }
            b'|' => {
                if self.bump_if(b'|') {
                    PipePipe
                } else {
                    Pipe
                }
            }
            other => {
                self.errors.push(CompileError::syntax(
                    format!("invalid byte 0x{other:02x} in source"),
                    self.src_loc_from(start),
                ));
                Invalid
            }
        };
        let text = std::str::from_utf8(&self.source[start.offset as usize..self.pos])
            .unwrap_or("")
            .to_string();
        Token::new(kind, table.intern(&text), self.loc_from(start))
    }

    fn lex_ident(&mut self, table: &mut StringTable, start: CharPosition) -> Token {
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.source[start.offset as usize..self.pos]).unwrap();
        let kind = TokenKind::lookup_keyword(text).unwrap_or(TokenKind::Ident);
        Token::new(kind, table.intern(text), self.loc_from(start))
    }

    /// Integer and float literals, with `0x`/`0o`/`0b` radix prefixes and `_` digit-group
    /// separators (§2.1.N). The raw text (underscores and all) is preserved for the type
    /// checker's big-number parser to strip later, matching §4.B's literal-normalization
    /// contract ("the numeric value is parsed during type checking").
    fn lex_number(&mut self, table: &mut StringTable, start: CharPosition) -> Token {
        let mut is_float = false;
        if self.peek() == Some(b'0') {
            match self.peek_at(1) {
                Some(b'x') | Some(b'X') | Some(b'o') | Some(b'O') | Some(b'b') | Some(b'B') => {
                    self.advance();
                    self.advance();
                    while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_')
                    {
                        self.advance();
                    }
                    let text =
                        std::str::from_utf8(&self.source[start.offset as usize..self.pos])
                            .unwrap();
                    return Token::new(TokenKind::Integer, table.intern(text), self.loc_from(start));
                }
                _ => {}
            }
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'_') {
            self.advance();
        }
        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'_') {
                self.advance();
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let save = self.pos;
            self.advance();
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.advance();
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                is_float = true;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.pos = save;
            }
        }
        // Literal suffix (`i32`, `u8`, `f64`, ...) selecting the target numeric type (§6);
        // left attached to the raw text, stripped by the type checker when it looks up the
        // suffix against the built-in type registry.
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            self.advance();
        }
        let text = std::str::from_utf8(&self.source[start.offset as usize..self.pos]).unwrap();
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        };
        Token::new(kind, table.intern(text), self.loc_from(start))
    }

    fn lex_string(&mut self, table: &mut StringTable, start: CharPosition) -> Token {
        self.advance(); // opening quote
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    self.errors.push(CompileError::syntax(
                        "unterminated string literal",
                        self.src_loc_from(start),
                    ));
                    break;
                }
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    self.lex_escape(start);
                }
                _ => {
                    self.advance();
                }
            }
        }
        let text = std::str::from_utf8(&self.source[start.offset as usize..self.pos])
            .unwrap_or("\"\"")
            .to_string();
        Token::new(TokenKind::String, table.intern(&text), self.loc_from(start))
    }

    fn lex_char(&mut self, table: &mut StringTable, start: CharPosition) -> Token {
        self.advance(); // opening quote
        match self.peek() {
            Some(b'\\') => {
                self.advance();
                self.lex_escape(start);
            }
            Some(b'\'') | None => {
                self.errors.push(CompileError::syntax(
                    "empty char literal",
                    self.src_loc_from(start),
                ));
            }
            _ => {
                self.advance();
            }
        }
        if !self.bump_if(b'\'') {
            self.errors.push(CompileError::syntax(
                "unterminated char literal",
                self.src_loc_from(start),
            ));
        }
        let text = std::str::from_utf8(&self.source[start.offset as usize..self.pos])
            .unwrap_or("''")
            .to_string();
        Token::new(TokenKind::Char, table.intern(&text), self.loc_from(start))
    }

    /// §4.B: escape validity is checked here, lexer-side (a deliberate divergence from the
    /// original implementation, which deferred this to literal finalization — see SPEC_FULL.md
    /// §4.B and DESIGN.md). Recognized: `\n \t \r \\ \' \" \0 \a \b \f \v` plus numeric-radix
    /// escapes (`\xNN`, `\u{...}`).
    fn lex_escape(&mut self, lit_start: CharPosition) {
        let esc_start = self.here();
        match self.peek() {
            Some(b'n') | Some(b't') | Some(b'r') | Some(b'\\') | Some(b'\'') | Some(b'"')
            | Some(b'0') | Some(b'a') | Some(b'b') | Some(b'f') | Some(b'v') => {
                self.advance();
            }
            Some(b'x') => {
                self.advance();
                for _ in 0..2 {
                    if matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                        self.advance();
                    }
                }
            }
            Some(b'u') => {
                self.advance();
                if self.bump_if(b'{') {
                    while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                        self.advance();
                    }
                    self.bump_if(b'}');
                }
            }
            _ => {
                self.errors.push(CompileError::syntax(
                    "unknown escape sequence",
                    self.src_loc_from(esc_start),
                ));
                let _ = lit_start;
                if self.peek().is_some() {
                    self.advance();
                }
            }
        }
    }

    fn lex_line_comment(&mut self, table: &mut StringTable, start: CharPosition) -> Token {
        while !matches!(self.peek(), None | Some(b'\n')) {
            self.advance();
        }
        let text = std::str::from_utf8(&self.source[start.offset as usize..self.pos]).unwrap();
        Token::new(TokenKind::Comment, table.intern(text), self.loc_from(start))
    }

    fn lex_block_comment(&mut self, table: &mut StringTable, start: CharPosition) -> Token {
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    self.errors.push(CompileError::syntax(
                        "unterminated block comment",
                        self.src_loc_from(start),
                    ));
                    break;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
        let text = std::str::from_utf8(&self.source[start.offset as usize..self.pos]).unwrap();
        Token::new(
            TokenKind::MultiComment,
            table.intern(text),
            self.loc_from(start),
        )
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> (Vec<TokenKind>, StringTable) {
        let mut table = StringTable::new();
        let file = table.intern("test.kl");
        let mut lexer = Lexer::new(src, "test.kl".into(), file);
        let mut kinds = Vec::new();
        loop {
            let tok = lexer.next(&mut table);
            if tok.kind == TokenKind::Eof {
                kinds.push(tok.kind);
                break;
            }
            kinds.push(tok.kind);
        }
        (kinds, table)
    }

    #[test]
    fn newline_after_identifier_inserts_semicolon() {
        let (kinds, _) = lex_all("x\ny");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn newline_after_operator_does_not_insert_semicolon() {
        let (kinds, _) = lex_all("x +\ny");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Add,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn double_ampersand_is_single_token() {
        let (kinds, _) = lex_all("&&T");
        assert_eq!(kinds[0], TokenKind::AmpAmp);
    }

    #[test]
    fn hex_and_underscore_literal_preserves_raw_text() {
        let mut table = StringTable::new();
        let file = table.intern("test.kl");
        let mut lexer = Lexer::new("0xFF_00", "test.kl".into(), file);
        let tok = lexer.next(&mut table);
        assert_eq!(tok.kind, TokenKind::Integer);
        assert_eq!(tok.literal.resolve(&table), "0xFF_00");
    }

    #[test]
    fn block_comment_is_a_comment_token_not_dispatched_to_statement_stream() {
        let (kinds, _) = lex_all("/* hi */ x");
        assert_eq!(kinds[0], TokenKind::MultiComment);
        assert_eq!(kinds[1], TokenKind::Ident);
    }

    #[test]
    fn unterminated_string_reports_error_and_produces_token() {
        let mut table = StringTable::new();
        let file = table.intern("test.kl");
        let mut lexer = Lexer::new("\"abc", "test.kl".into(), file);
        let tok = lexer.next(&mut table);
        assert_eq!(tok.kind, TokenKind::String);
        assert!(lexer.errors.is_error());
    }
}
