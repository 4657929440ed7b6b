//! Recursive-descent parser (§4.C). One file in, one [`crate::ast::File`] plus an [`ErrorList`]
//! out; a syntax error never aborts the file, it synchronizes to the next statement, `import`,
//! or top-level-declaration boundary and inserts a `Bad` placeholder so later stages never see
//! a partially-built tree (§4.C "Error Recovery").
//!
//! Mirrors the teacher's `parsers/` layout: this module owns the token cursor and recovery
//! machinery, `expr`/`stmt`/`decl`/`ty` each own one grammar layer.

pub mod decl;
pub mod expr;
pub mod stmt;
pub mod ty;

use crate::ast::decl::{DeclId, ModuleId};
use crate::ast::{Comment, File, ModDep};
use crate::diagnostics::errors::CompileError;
use crate::lexer::Lexer;
use crate::string_interning::{StringId, StringTable};
use crate::symbol::CuId;
use crate::token::{Token, TokenKind};

/// Signals "a diagnostic was already recorded; unwind to the nearest recovery point." Never
/// escapes the parser — every caller that can fail matches on it locally and either recovers
/// or propagates it one layer further up the same stack.
pub struct Recover;

pub type PResult<T> = Result<T, Recover>;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    table: &'a mut StringTable,
    cur: Token,
    /// One token of lookahead beyond `cur`, filled on demand — needed only to disambiguate
    /// `pub`/`priv import` from `pub`/`priv <decl>` before committing to a grammar rule.
    peeked: Option<Token>,
    comments: Vec<Comment>,
    pub errors: crate::diagnostics::errors::ErrorList,
    file: StringId,
    cu_id: CuId,
    next_decl_id: u32,
    anon_counter: u32,
    /// Disabled while parsing an `if`/`while`/`for` condition so `Name { ... }` parses as a
    /// block-opening brace rather than a struct literal — the same ambiguity Go resolves the
    /// same way, and the reason this parser already commits to Go-style ASI (§4.B).
    no_struct_lit: bool,
    /// Anonymous function literals are hoisted into top-level `FuncDecl`s named
    /// `$<enclosing>_anon<n>` (§4.C); the expression position they were written in just becomes
    /// an `Ident` reference to that name. Collected here and drained into `File::decls` by
    /// [`parse_file`] once parsing finishes.
    pending_anon_decls: Vec<crate::ast::decl::TopDecl>,
    enclosing_name: String,
}

/// Tokens that always start a new top-level declaration or statement — used as the
/// synchronization set after a parse error (§4.C).
fn is_sync_point(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Semicolon
            | Eof
            | RBrace
            | Module
            | Include
            | Import
            | Pub
            | Priv
            | Var
            | Val
            | Const
            | Fun
            | Struct
            | TypeAlias
            | If
            | For
            | While
            | Return
            | Break
            | Continue
            | Defer
    )
}

impl<'a> Parser<'a> {
    pub fn new(
        source: &'a str,
        filename: std::path::PathBuf,
        cu_id: CuId,
        table: &'a mut StringTable,
    ) -> Self {
        let file = table.intern(&filename.to_string_lossy());
        let mut lexer = Lexer::new(source, filename, file);
        let mut comments = Vec::new();
        let cur = Self::fetch_skip_comments(&mut lexer, table, &mut comments);
        Self {
            lexer,
            table,
            cur,
            peeked: None,
            comments,
            errors: crate::diagnostics::errors::ErrorList::new(),
            file,
            cu_id,
            next_decl_id: 0,
            anon_counter: 0,
            no_struct_lit: false,
            pending_anon_decls: Vec::new(),
            enclosing_name: String::from("top"),
        }
    }

    /// Pull tokens from the lexer until the next non-comment one, diverting every
    /// `Comment`/`MultiComment` token into `comments` instead of the statement stream
    /// (§4.B/§4.C). A free function (rather than a method) so it can run during construction,
    /// before `self` exists.
    fn fetch_skip_comments(
        lexer: &mut Lexer<'a>,
        table: &mut StringTable,
        comments: &mut Vec<Comment>,
    ) -> Token {
        loop {
            let tok = lexer.next(table);
            if matches!(tok.kind, TokenKind::Comment | TokenKind::MultiComment) {
                comments.push(Comment {
                    text: tok.literal.resolve(table).to_string(),
                    location: tok.location,
                });
                continue;
            }
            return tok;
        }
    }

    fn next_token(&mut self) -> Token {
        Self::fetch_skip_comments(&mut self.lexer, self.table, &mut self.comments)
    }

    fn bump(&mut self) -> Token {
        let prev = self.cur;
        self.cur = self.peeked.take().unwrap_or_else(|| self.next_token());
        prev
    }

    /// The token after `cur`, without consuming it.
    fn peek(&mut self) -> Token {
        if let Some(t) = self.peeked {
            t
        } else {
            let t = self.next_token();
            self.peeked = Some(t);
            t
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.cur.kind == kind
    }

    fn text(&self, id: StringId) -> &str {
        id.resolve(self.table)
    }

    fn src_loc(&self, loc: crate::token::TextLocation) -> crate::diagnostics::location::SourceLocation {
        loc.to_source_location(self.table)
    }

    fn error(&mut self, msg: impl Into<String>, loc: crate::token::TextLocation) {
        let sloc = self.src_loc(loc);
        self.errors.push(CompileError::syntax(msg, sloc));
    }

    /// Consume the current token if it matches `kind`; otherwise record a syntax error and
    /// trigger recovery.
    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            let got = self.text(self.cur.literal).to_string();
            self.error(
                format!("expected {what}, found `{got}`"),
                self.cur.location,
            );
            Err(Recover)
        }
    }

    fn expect_ident(&mut self) -> PResult<StringId> {
        if self.at(TokenKind::Ident) {
            Ok(self.bump().literal)
        } else {
            let got = self.text(self.cur.literal).to_string();
            self.error(format!("expected identifier, found `{got}`"), self.cur.location);
            Err(Recover)
        }
    }

    /// Skip tokens until a synchronization point (§4.C). Consumes a trailing `Semicolon` so the
    /// caller resumes cleanly on the token after it.
    fn synchronize(&mut self) {
        while !is_sync_point(self.cur.kind) {
            self.bump();
        }
        if self.at(TokenKind::Semicolon) {
            self.bump();
        }
    }

    fn next_decl_id(&mut self) -> DeclId {
        let id = DeclId(self.next_decl_id);
        self.next_decl_id += 1;
        id
    }

    /// Fresh name for a hoisted anonymous function literal (§4.C).
    fn next_anon_name(&mut self) -> StringId {
        let n = self.anon_counter;
        self.anon_counter += 1;
        let text = format!("${}_anon{n}", self.enclosing_name);
        self.table.intern(&text)
    }
}

/// Parse one source file in full (§4.C "Outputs"). Recovery keeps this from ever stopping
/// short: every top-level item that fails to parse synchronizes and the loop continues.
pub fn parse_file(
    source: &str,
    filename: std::path::PathBuf,
    cu_id: CuId,
    table: &mut StringTable,
) -> (File, crate::diagnostics::errors::ErrorList) {
    let mut p = Parser::new(source, filename.clone(), cu_id, table);
    let mut file = File::new(filename, cu_id);

    if p.at(TokenKind::Module) {
        let header_start = p.cur.location;
        p.bump();
        match p.parse_scope_path() {
            Ok(path) => {
                file.module_name = Some(path);
                file.module_header_location = Some(header_start.covering(&p.cur.location));
            }
            Err(Recover) => p.synchronize(),
        }
        let _ = p.expect(TokenKind::Semicolon, "`;` after module declaration");
    }

    loop {
        match p.cur.kind {
            TokenKind::Eof => break,
            // A declaration never needs a separator from the one before it, but one top-level
            // decl ending in `}` still leaves automatic-semicolon-insertion "eligible" (§4.B), so
            // a bare `;` can show up here on its own line. Skip it rather than treating it as the
            // start of a (nonexistent) declaration.
            TokenKind::Semicolon => {
                p.bump();
            }
            TokenKind::Include => {
                p.bump();
                match p.expect(TokenKind::String, "a quoted include path") {
                    Ok(tok) => {
                        let raw = p.text(tok.literal).trim_matches('"').to_string();
                        file.file_deps.push(raw);
                    }
                    Err(Recover) => p.synchronize(),
                }
                let _ = p.expect(TokenKind::Semicolon, "`;` after include");
            }
            TokenKind::Import | TokenKind::Pub | TokenKind::Priv if p.starts_import() => {
                match decl::parse_import(&mut p) {
                    Ok(dep) => file.mod_deps.push(dep),
                    Err(Recover) => p.synchronize(),
                }
            }
            _ => match decl::parse_top_decl(&mut p, ModuleId(0)) {
                Ok(mut d) => {
                    d.id = p.next_decl_id();
                    file.decls.push(d);
                }
                Err(Recover) => p.synchronize(),
            },
        }
    }

    file.comments = std::mem::take(&mut p.comments);
    file.decls.append(&mut p.pending_anon_decls);
    (file, p.errors)
}

impl<'a> Parser<'a> {
    fn starts_import(&self) -> bool {
        match self.cur.kind {
            TokenKind::Import => true,
            TokenKind::Pub | TokenKind::Priv => false, // disambiguated by decl::parse_top_decl
            _ => false,
        }
    }

    /// `A::B::C` or `A` — a bare scope path as used by `module`/`import` (no leading `::`,
    /// which is reserved for absolute scope-lookups in expression/type position, §4.C/§4.H).
    fn parse_scope_path(&mut self) -> PResult<Vec<StringId>> {
        let mut segments = vec![self.expect_ident()?];
        while self.at(TokenKind::ColonColon) {
            self.bump();
            segments.push(self.expect_ident()?);
        }
        Ok(segments)
    }
}
