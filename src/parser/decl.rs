//! Top-level declaration grammar (§4.C, §3): `val`/`var`/`const`, `fun`, `struct`, `type`,
//! and `import`. Each may be preceded by `pub`/`priv`; an omitted qualifier defaults to
//! private (§4.C Open Question, resolved — see DESIGN.md).

use crate::ast::decl::{
    Color, DeclKind, FieldDecl, FuncDecl, ModuleId, StructDecl, TopDecl, TypeAliasDecl,
    Visibility,
};
use crate::ast::ModDep;
use crate::parser::{PResult, Parser, Recover};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    fn parse_visibility(&mut self) -> Visibility {
        match self.cur.kind {
            TokenKind::Pub => {
                self.bump();
                Visibility::Public
            }
            TokenKind::Priv => {
                self.bump();
                Visibility::Private
            }
            _ => Visibility::Private,
        }
    }

    /// Optional `extern ["abi"]` prefix (§4.C); `extern` alone defaults the ABI to `"c"`.
    fn parse_extern_abi(&mut self) -> Option<crate::string_interning::StringId> {
        if !self.at(TokenKind::Extern) {
            return None;
        }
        self.bump();
        if self.at(TokenKind::String) {
            let raw = self.text(self.cur.literal).trim_matches('"').to_string();
            self.bump();
            Some(self.intern(&raw))
        } else {
            Some(self.intern("c"))
        }
    }

    fn intern(&mut self, s: &str) -> crate::string_interning::StringId {
        self.table.intern(s)
    }
}

pub fn parse_top_decl(p: &mut Parser, module: ModuleId) -> PResult<TopDecl> {
    let start = p.cur.location;
    let visibility = p.parse_visibility();
    let extern_abi = p.parse_extern_abi();

    let kind = match p.cur.kind {
        TokenKind::Var | TokenKind::Val | TokenKind::Const => {
            DeclKind::Val(parse_top_val(p, extern_abi)?)
        }
        TokenKind::Fun => DeclKind::Func(parse_func_decl(p, extern_abi)?),
        TokenKind::Struct => DeclKind::Struct(parse_struct_decl(p)?),
        TokenKind::TypeAlias => DeclKind::TypeAlias(parse_type_alias_decl(p)?),
        _ => {
            let got = p.text(p.cur.literal).to_string();
            p.error(format!("expected a declaration, found `{got}`"), start);
            return Err(Recover);
        }
    };
    let end = p.cur.location;
    Ok(TopDecl {
        kind,
        visibility,
        location: start.covering(&end),
        symbol: None,
        module,
        cu_id: p.cu_id,
        id: crate::ast::decl::DeclId(0), // assigned by the caller once appended (§4.C)
        deps: Vec::new(),
        color: Color::White,
    })
}

fn parse_top_val(
    p: &mut Parser,
    extern_abi: Option<crate::string_interning::StringId>,
) -> PResult<crate::ast::decl::ValDecl> {
    let start = p.cur.location;
    let mutability = match p.bump().kind {
        TokenKind::Var => crate::ast::decl::Mutability::Var,
        TokenKind::Val => crate::ast::decl::Mutability::Val,
        _ => crate::ast::decl::Mutability::Const,
    };
    let name = p.expect_ident()?;
    // `name [Type] [= expr]` (§4.C): the type, when present, directly follows the name with no
    // separator; an optional `:` is also accepted as an explicit separator.
    if p.at(TokenKind::Colon) {
        p.bump();
    }
    let declared_type = if p.at_type_start() { Some(p.parse_type()?) } else { None };
    let initializer = if p.at(TokenKind::Assign) {
        p.bump();
        Some(p.parse_expr()?)
    } else {
        None
    };
    let end = p.expect(TokenKind::Semicolon, "`;` after top-level declaration")?.location;
    Ok(crate::ast::decl::ValDecl {
        mutability,
        name,
        declared_type,
        initializer,
        extern_abi,
        symbol: None,
        location: start.covering(&end),
    })
}

fn parse_func_decl(
    p: &mut Parser,
    extern_abi: Option<crate::string_interning::StringId>,
) -> PResult<FuncDecl> {
    let start = p.cur.location;
    p.bump(); // `fun`
    let name = p.expect_ident()?;
    let (params, param_scope) = p.parse_param_list()?;
    // `(params) [Type] { body }` (§4.C): the return type, when present, directly follows the
    // parameter list with no separator; an optional `->` is also accepted.
    if p.at(TokenKind::Arrow) {
        p.bump();
    }
    let return_type = if p.at_type_start() { Some(p.parse_type()?) } else { None };
    let (body, end) = if p.at(TokenKind::Semicolon) {
        let end = p.bump().location;
        (None, end)
    } else {
        let block = p.parse_block()?;
        let end = block.location;
        (Some(block), end)
    };
    Ok(FuncDecl {
        name,
        params,
        return_type,
        body,
        param_scope,
        extern_abi,
        symbol: None,
        location: start.covering(&end),
    })
}

fn parse_struct_decl(p: &mut Parser) -> PResult<StructDecl> {
    let start = p.cur.location;
    p.bump(); // `struct`
    let name = p.expect_ident()?;
    let (fields, end) = if p.at(TokenKind::Semicolon) {
        // Opaque struct: declared but not defined (§3 "StructDecl fields: None").
        let end = p.bump().location;
        (None, end)
    } else {
        p.expect(TokenKind::LBrace, "`{` to start struct body")?;
        let mut fields = Vec::new();
        while !p.at(TokenKind::RBrace) && !p.at(TokenKind::Eof) {
            let f_start = p.cur.location;
            let f_name = p.expect_ident()?;
            if p.at(TokenKind::Colon) {
                p.bump();
            }
            let ty = p.parse_type()?;
            let f_end = ty.location;
            fields.push(FieldDecl {
                name: f_name,
                ty,
                symbol: None,
                location: f_start.covering(&f_end),
            });
            if p.at(TokenKind::Comma) {
                p.bump();
            } else {
                break;
            }
        }
        let end = p.expect(TokenKind::RBrace, "`}` to close struct body")?.location;
        (Some(fields), end)
    };
    Ok(StructDecl {
        name,
        fields,
        // Allocated by the symbol walk (§4.F), which owns the `ScopeArena`.
        scope: crate::symbol::ScopeId(0),
        symbol: None,
        location: start.covering(&end),
    })
}

fn parse_type_alias_decl(p: &mut Parser) -> PResult<TypeAliasDecl> {
    let start = p.cur.location;
    p.bump(); // `type`
    let name = p.expect_ident()?;
    p.expect(TokenKind::Assign, "`=` after type alias name")?;
    let target = p.parse_type()?;
    let end = p.expect(TokenKind::Semicolon, "`;` after type alias")?.location;
    Ok(TypeAliasDecl {
        name,
        target,
        symbol: None,
        location: start.covering(&end),
    })
}

/// `[pub] import path::to::item [as alias];` (§4.C). A bare import re-exports the target's own
/// name; an aliased one binds the alias locally — see the shared-node note on [`ImportDecl`].
pub fn parse_import(p: &mut Parser) -> PResult<ModDep> {
    let start = p.cur.location;
    let visibility = p.parse_visibility();
    p.expect(TokenKind::Import, "`import`")?;
    let path = p.parse_scope_path()?;
    let alias = if p.at(TokenKind::As) {
        p.bump();
        Some(p.expect_ident()?)
    } else {
        None
    };
    let end = p.expect(TokenKind::Semicolon, "`;` after import")?.location;
    Ok(ModDep {
        path,
        alias,
        visibility,
        location: start.covering(&end),
    })
}

