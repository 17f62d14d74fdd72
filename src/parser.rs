//! Recursive-descent parser for the TypeScript subset the passes consume.
//!
//! Declarations are parsed precisely; expression and statement bodies are
//! captured as balanced-token spans and never restructured. The parser never
//! fails: anything it cannot classify becomes an `Other` statement that the
//! rewriter copies through verbatim, with a diagnostic only where a
//! declaration shape is genuinely malformed.

use crate::ast::*;
use crate::diagnostics::DiagnosticBag;
use crate::scanner::{tokenize, Comment, SyntaxKind, Token, TokenStream};
use crate::span::Span;

/// Parse one source file. Never fails; problems surface in the bag.
pub fn parse_source_file(file_name: &str, text: &str) -> (SourceFile, DiagnosticBag) {
    let stream = tokenize(text);
    let mut parser = Parser {
        file_name,
        source: text,
        stream: &stream,
        pos: 0,
        bag: DiagnosticBag::new(),
    };
    let statements = parser.parse_statements(false);
    let file = SourceFile {
        file_name: file_name.to_string(),
        text: text.to_string(),
        statements,
        is_declaration_file: is_dts_file_name(file_name),
        comments: stream.comments.clone(),
    };
    (file, parser.bag)
}

struct Parser<'a> {
    file_name: &'a str,
    source: &'a str,
    stream: &'a TokenStream,
    pos: usize,
    bag: DiagnosticBag,
}

impl<'a> Parser<'a> {
    // =========================================================================
    // Token helpers
    // =========================================================================

    fn token(&self) -> Token {
        self.stream.tokens[self.pos.min(self.stream.tokens.len() - 1)]
    }

    fn kind(&self) -> SyntaxKind {
        self.token().kind
    }

    fn peek_kind(&self, offset: usize) -> SyntaxKind {
        let idx = (self.pos + offset).min(self.stream.tokens.len() - 1);
        self.stream.tokens[idx].kind
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.kind() == kind
    }

    fn at_eof(&self) -> bool {
        self.at(SyntaxKind::EndOfFile)
    }

    fn token_text(&self) -> &'a str {
        self.token().span.slice(self.source)
    }

    fn bump(&mut self) -> Token {
        let token = self.token();
        if self.pos < self.stream.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            let span = self.token().span;
            self.bag
                .error(self.file_name, span, format!("expected {}", what));
            None
        }
    }

    fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.stream.tokens[self.pos - 1].span.end
        }
    }

    fn leading_comments_here(&self) -> Vec<Comment> {
        self.stream.leading_comments(self.pos).to_vec()
    }

    fn ident(&mut self) -> Option<Ident> {
        if self.kind().is_identifier_like() {
            let token = self.bump();
            Some(Ident {
                text: token.span.slice(self.source).to_string(),
                span: token.span,
            })
        } else {
            None
        }
    }

    /// Parse `a.b.c` where each part is identifier-like.
    fn qualified_name(&mut self) -> Option<QualifiedName> {
        let first = self.ident()?;
        let mut parts = vec![first];
        while self.at(SyntaxKind::Dot) && self.peek_kind(1).is_identifier_like() {
            self.bump();
            if let Some(part) = self.ident() {
                parts.push(part);
            }
        }
        Some(QualifiedName { parts })
    }

    /// Consume tokens from an open delimiter through its matching close.
    /// The current token must be the opening delimiter. Returns the span
    /// covering both delimiters.
    fn skip_balanced(&mut self) -> Span {
        let open = self.kind();
        let close = match open {
            SyntaxKind::OpenBrace => SyntaxKind::CloseBrace,
            SyntaxKind::OpenParen => SyntaxKind::CloseParen,
            SyntaxKind::OpenBracket => SyntaxKind::CloseBracket,
            _ => {
                let token = self.bump();
                return token.span;
            }
        };
        let start = self.token().span.start;
        self.bump();
        let mut depth = 1usize;
        while !self.at_eof() {
            let kind = self.kind();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    let token = self.bump();
                    return Span::new(start, token.span.end);
                }
            }
            self.bump();
        }
        self.bag.error(
            self.file_name,
            Span::at(start),
            "unbalanced delimiter runs to end of file",
        );
        Span::new(start, self.prev_end())
    }

    /// Capture an expression as a raw span, stopping at any of `stops` at
    /// nesting depth zero, at a dedent `}`, or at a plausible ASI boundary.
    /// Does not consume the stopping token.
    fn expression_span(&mut self, stops: &[SyntaxKind]) -> Span {
        let start = self.token().span.start;
        while !self.at_eof() {
            let kind = self.kind();
            if stops.contains(&kind) {
                break;
            }
            match kind {
                SyntaxKind::OpenBrace | SyntaxKind::OpenParen | SyntaxKind::OpenBracket => {
                    self.skip_balanced();
                    continue;
                }
                SyntaxKind::CloseBrace
                | SyntaxKind::CloseParen
                | SyntaxKind::CloseBracket => break,
                _ => {}
            }
            if self.token().on_new_line && starts_statement(kind) {
                break;
            }
            self.bump();
        }
        Span::new(start, self.prev_end().max(start))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statements(&mut self, in_block: bool) -> Vec<Statement> {
        let mut statements = Vec::new();
        loop {
            while self.at(SyntaxKind::Semicolon) {
                self.bump();
            }
            if self.at_eof() {
                break;
            }
            if in_block && self.at(SyntaxKind::CloseBrace) {
                break;
            }
            statements.push(self.parse_statement());
        }
        statements
    }

    fn parse_statement(&mut self) -> Statement {
        let leading_comments = self.leading_comments_here();
        let start = self.token().span.start;
        let start_pos = self.pos;

        let decorators = self.parse_decorators();
        let modifiers = self.parse_modifiers();

        let kind = match self.kind() {
            SyntaxKind::ImportKeyword => self.parse_import(),
            SyntaxKind::OpenBrace | SyntaxKind::Asterisk if modifiers.export => {
                self.parse_export_clause(false)
            }
            SyntaxKind::TypeKeyword
                if modifiers.export && self.peek_kind(1) == SyntaxKind::OpenBrace =>
            {
                self.bump();
                self.parse_export_clause(true)
            }
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword => {
                self.parse_var_statement(modifiers)
            }
            SyntaxKind::ConstKeyword => {
                if self.peek_kind(1) == SyntaxKind::EnumKeyword {
                    self.bump();
                    self.parse_enum(modifiers, true)
                } else {
                    self.parse_var_statement(modifiers)
                }
            }
            SyntaxKind::FunctionKeyword => self.parse_function(modifiers, false),
            SyntaxKind::Identifier
                if self.token_text() == "async"
                    && self.peek_kind(1) == SyntaxKind::FunctionKeyword =>
            {
                self.bump();
                self.parse_function(modifiers, true)
            }
            SyntaxKind::ClassKeyword => self.parse_class(decorators, modifiers),
            SyntaxKind::InterfaceKeyword => self.parse_interface(modifiers),
            SyntaxKind::EnumKeyword => self.parse_enum(modifiers, false),
            SyntaxKind::TypeKeyword
                if self.peek_kind(1).is_identifier_like()
                    && matches!(
                        self.peek_kind(2),
                        SyntaxKind::Equals | SyntaxKind::LessThan
                    ) =>
            {
                self.parse_type_alias(modifiers)
            }
            SyntaxKind::NamespaceKeyword | SyntaxKind::ModuleKeyword
                if self.peek_kind(1).is_identifier_like()
                    || self.peek_kind(1) == SyntaxKind::StringLiteral =>
            {
                self.parse_namespace(modifiers, false)
            }
            SyntaxKind::GlobalKeyword
                if modifiers.declare && self.peek_kind(1) == SyntaxKind::OpenBrace =>
            {
                self.parse_namespace(modifiers, true)
            }
            _ => {
                // Not a declaration we structure. Reset and skim the whole
                // statement (including any decorators/modifiers we consumed)
                // as opaque text.
                self.pos = start_pos;
                StatementKind::Other(self.skip_opaque_statement())
            }
        };

        // Optional trailing semicolon belongs to the statement.
        let semi_end = if self.at(SyntaxKind::Semicolon) {
            let token = self.bump();
            token.span.end
        } else {
            self.prev_end()
        };

        Statement {
            kind,
            span: Span::new(start, semi_end.max(start)),
            leading_comments,
        }
    }

    /// Skim one statement we do not model, balancing delimiters.
    fn skip_opaque_statement(&mut self) -> Span {
        let start = self.token().span.start;
        let mut first = true;
        while !self.at_eof() {
            let kind = self.kind();
            if !first && self.token().on_new_line && starts_statement(kind) {
                break;
            }
            match kind {
                SyntaxKind::Semicolon => {
                    self.bump();
                    break;
                }
                SyntaxKind::CloseBrace if first => {
                    // A stray close brace would otherwise never be consumed.
                    self.bump();
                    break;
                }
                SyntaxKind::CloseBrace => break,
                SyntaxKind::OpenBrace => {
                    self.skip_balanced();
                    // `} else`, `} catch`, `} finally`, `} while` continue the
                    // same statement; otherwise the block ends it.
                    let next = self.token_text();
                    if !matches!(next, "else" | "catch" | "finally" | "while") {
                        break;
                    }
                }
                SyntaxKind::OpenParen | SyntaxKind::OpenBracket => {
                    self.skip_balanced();
                }
                _ => {
                    self.bump();
                }
            }
            first = false;
        }
        Span::new(start, self.prev_end().max(start))
    }

    // =========================================================================
    // Decorators and modifiers
    // =========================================================================

    fn parse_decorators(&mut self) -> Vec<Decorator> {
        let mut decorators = Vec::new();
        while self.at(SyntaxKind::At) {
            let at_token = self.bump();
            let Some(name) = self.qualified_name() else {
                self.bag.error(
                    self.file_name,
                    at_token.span,
                    "expected identifier after '@'",
                );
                break;
            };
            let mut args = None;
            let mut end = name.span().end;
            if self.at(SyntaxKind::OpenParen) {
                let (arg_spans, close_end) = self.parse_call_argument_spans();
                args = Some(arg_spans);
                end = close_end;
            }
            decorators.push(Decorator {
                span: Span::new(at_token.span.start, end),
                name,
                args,
            });
        }
        decorators
    }

    /// Parse `( arg, arg, ... )` capturing each argument as a raw span.
    /// Returns the argument spans and the closing paren's end offset.
    fn parse_call_argument_spans(&mut self) -> (Vec<Span>, u32) {
        let mut args = Vec::new();
        self.bump(); // (
        loop {
            if self.at(SyntaxKind::CloseParen) || self.at_eof() {
                break;
            }
            let span = self.expression_span(&[SyntaxKind::Comma]);
            if !span.is_empty() {
                args.push(span);
            }
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        let end = if self.at(SyntaxKind::CloseParen) {
            self.bump().span.end
        } else {
            self.prev_end()
        };
        (args, end)
    }

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        let mut span: Option<Span> = None;
        loop {
            let kind = self.kind();
            let applies = match kind {
                SyntaxKind::ExportKeyword => {
                    modifiers.export = true;
                    true
                }
                SyntaxKind::DefaultKeyword if modifiers.export => {
                    // Only a modifier when a declaration follows.
                    if matches!(
                        self.peek_kind(1),
                        SyntaxKind::ClassKeyword
                            | SyntaxKind::FunctionKeyword
                            | SyntaxKind::AbstractKeyword
                    ) {
                        modifiers.default = true;
                        true
                    } else {
                        false
                    }
                }
                SyntaxKind::DeclareKeyword => {
                    modifiers.declare = true;
                    true
                }
                SyntaxKind::AbstractKeyword if self.peek_kind(1) == SyntaxKind::ClassKeyword => {
                    modifiers.r#abstract = true;
                    true
                }
                _ => false,
            };
            if !applies {
                break;
            }
            let token = self.bump();
            span = Some(match span {
                Some(s) => s.merge(token.span),
                None => token.span,
            });
        }
        if let Some(s) = span {
            modifiers.span = s;
        }
        modifiers
    }

    /// Member-position modifiers (inside a class body).
    fn parse_member_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::default();
        let mut span: Option<Span> = None;
        loop {
            let kind = self.kind();
            // A modifier keyword followed by `(`, `=`, `:`, `?`, `;` or `<`
            // is actually a member name.
            if matches!(
                self.peek_kind(1),
                SyntaxKind::OpenParen
                    | SyntaxKind::Equals
                    | SyntaxKind::Colon
                    | SyntaxKind::Question
                    | SyntaxKind::Semicolon
                    | SyntaxKind::LessThan
                    | SyntaxKind::CloseBrace
            ) {
                break;
            }
            let applies = match kind {
                SyntaxKind::StaticKeyword => {
                    modifiers.r#static = true;
                    true
                }
                SyntaxKind::PublicKeyword => {
                    modifiers.public = true;
                    true
                }
                SyntaxKind::PrivateKeyword => {
                    modifiers.private = true;
                    true
                }
                SyntaxKind::ProtectedKeyword => {
                    modifiers.protected = true;
                    true
                }
                SyntaxKind::ReadonlyKeyword => {
                    modifiers.readonly = true;
                    true
                }
                SyntaxKind::AbstractKeyword => {
                    modifiers.r#abstract = true;
                    true
                }
                SyntaxKind::DeclareKeyword => {
                    modifiers.declare = true;
                    true
                }
                _ => false,
            };
            if !applies {
                break;
            }
            let token = self.bump();
            span = Some(match span {
                Some(s) => s.merge(token.span),
                None => token.span,
            });
        }
        if let Some(s) = span {
            modifiers.span = s;
        }
        modifiers
    }

    // =========================================================================
    // Imports and exports
    // =========================================================================

    fn parse_import(&mut self) -> StatementKind {
        let import_start = self.pos;
        self.bump(); // import

        // `import 'spec';`
        if self.at(SyntaxKind::StringLiteral) {
            let token = self.bump();
            return StatementKind::Import(ImportDecl {
                is_type_only: false,
                default_binding: None,
                namespace_binding: None,
                named: Vec::new(),
                specifier: unquote(token.span.slice(self.source)),
                specifier_span: token.span,
            });
        }

        let is_type_only = self.at(SyntaxKind::TypeKeyword)
            && !matches!(self.peek_kind(1), SyntaxKind::Comma | SyntaxKind::FromKeyword);
        if is_type_only {
            self.bump();
        }

        let mut default_binding = None;
        let mut namespace_binding = None;
        let mut named = Vec::new();

        if self.kind().is_identifier_like() {
            default_binding = self.ident();
            self.eat(SyntaxKind::Comma);
        }
        if self.at(SyntaxKind::Asterisk) {
            self.bump();
            if self.eat(SyntaxKind::AsKeyword) {
                namespace_binding = self.ident();
            }
        } else if self.at(SyntaxKind::OpenBrace) {
            self.bump();
            while !self.at(SyntaxKind::CloseBrace) && !self.at_eof() {
                // `type X` marks a type-only specifier; a lone `type` or
                // `type as t` imports a binding actually named "type".
                let spec_type_only = self.at(SyntaxKind::TypeKeyword)
                    && self.peek_kind(1).is_identifier_like()
                    && self.peek_kind(1) != SyntaxKind::AsKeyword;
                if spec_type_only {
                    self.bump();
                }
                let Some(first) = self.ident() else { break };
                let (property_name, name) = if self.eat(SyntaxKind::AsKeyword) {
                    match self.ident() {
                        Some(local) => (Some(first), local),
                        None => (None, first),
                    }
                } else {
                    (None, first)
                };
                named.push(ImportSpecifier {
                    property_name,
                    name,
                    is_type_only: spec_type_only,
                });
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(SyntaxKind::CloseBrace, "'}'");
        }

        if !self.eat(SyntaxKind::FromKeyword) {
            // `import x = require(...)` or other unmodeled form.
            self.pos = import_start;
            return StatementKind::Other(self.skip_opaque_statement());
        }
        let Some(spec_token) = self.expect(SyntaxKind::StringLiteral, "module specifier") else {
            return StatementKind::Other(Span::new(
                self.stream.tokens[import_start].span.start,
                self.prev_end(),
            ));
        };

        StatementKind::Import(ImportDecl {
            is_type_only,
            default_binding,
            namespace_binding,
            named,
            specifier: unquote(spec_token.span.slice(self.source)),
            specifier_span: spec_token.span,
        })
    }

    /// `export { ... } [from 'x'];` or `export * from 'x';` after the
    /// `export` keyword has been consumed as a modifier.
    fn parse_export_clause(&mut self, is_type_only: bool) -> StatementKind {
        let mut named = Vec::new();
        let mut is_star = false;
        if self.at(SyntaxKind::Asterisk) {
            is_star = true;
            self.bump();
            if self.eat(SyntaxKind::AsKeyword) {
                let span = self.token().span;
                self.bag.error(
                    self.file_name,
                    span,
                    "'export * as ns' is not supported; use an intermediate import",
                );
                self.ident();
            }
        } else {
            self.bump(); // {
            while !self.at(SyntaxKind::CloseBrace) && !self.at_eof() {
                let spec_type_only = self.at(SyntaxKind::TypeKeyword)
                    && self.peek_kind(1).is_identifier_like()
                    && self.peek_kind(1) != SyntaxKind::AsKeyword;
                if spec_type_only {
                    self.bump();
                }
                let Some(first) = self.ident() else { break };
                let (property_name, name) = if self.eat(SyntaxKind::AsKeyword) {
                    match self.ident() {
                        Some(exported) => (Some(first), exported),
                        None => (None, first),
                    }
                } else {
                    (None, first)
                };
                named.push(ImportSpecifier {
                    property_name,
                    name,
                    is_type_only: spec_type_only,
                });
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(SyntaxKind::CloseBrace, "'}'");
        }

        let (specifier, specifier_span) = if self.eat(SyntaxKind::FromKeyword) {
            match self.expect(SyntaxKind::StringLiteral, "module specifier") {
                Some(token) => (
                    Some(unquote(token.span.slice(self.source))),
                    Some(token.span),
                ),
                None => (None, None),
            }
        } else {
            (None, None)
        };

        StatementKind::Export(ExportDecl {
            is_type_only,
            is_star,
            named,
            specifier,
            specifier_span,
        })
    }

    // =========================================================================
    // Variable statements
    // =========================================================================

    fn parse_var_statement(&mut self, modifiers: Modifiers) -> StatementKind {
        let keyword = self.bump();
        let kind = match keyword.kind {
            SyntaxKind::VarKeyword => VarKind::Var,
            SyntaxKind::LetKeyword => VarKind::Let,
            _ => VarKind::Const,
        };

        // Destructuring declarations are opaque.
        if matches!(self.kind(), SyntaxKind::OpenBrace | SyntaxKind::OpenBracket) {
            self.pos -= 1;
            return StatementKind::Other(self.skip_opaque_statement());
        }

        let mut declarations = Vec::new();
        loop {
            let Some(name) = self.ident() else { break };
            let decl_start = name.span.start;
            self.eat(SyntaxKind::Exclamation); // definite assignment

            let (type_node, type_ann_span) = self.parse_optional_type_annotation();
            let initializer = if self.eat(SyntaxKind::Equals) {
                Some(self.expression_span(&[SyntaxKind::Comma, SyntaxKind::Semicolon]))
            } else {
                None
            };
            declarations.push(VarDecl {
                name,
                type_node,
                type_ann_span,
                initializer,
                span: Span::new(decl_start, self.prev_end()),
            });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }

        StatementKind::Var(VarStatement {
            modifiers,
            kind,
            declarations,
        })
    }

    /// Parse `: T` when present, returning the node and the span covering
    /// the colon through the annotation's end (for erasure).
    fn parse_optional_type_annotation(&mut self) -> (Option<TypeNode>, Option<Span>) {
        if !self.at(SyntaxKind::Colon) {
            return (None, None);
        }
        let colon = self.bump();
        let type_node = self.parse_type();
        let span = Span::new(colon.span.start, type_node.span.end.max(colon.span.end));
        (Some(type_node), Some(span))
    }

    // =========================================================================
    // Functions, parameters, type parameters
    // =========================================================================

    fn parse_function(&mut self, modifiers: Modifiers, is_async: bool) -> StatementKind {
        self.bump(); // function
        let is_generator = self.eat(SyntaxKind::Asterisk);
        let name = self.ident().unwrap_or_else(|| Ident {
            text: String::new(),
            span: Span::at(self.prev_end()),
        });
        let type_params = self.parse_type_params();
        let params = self.parse_params();
        let (return_type, return_type_span) = self.parse_optional_type_annotation();
        let body = if self.at(SyntaxKind::OpenBrace) {
            Some(self.skip_balanced())
        } else {
            None
        };
        StatementKind::Function(FunctionDecl {
            modifiers,
            is_async,
            is_generator,
            name,
            type_params,
            params,
            return_type,
            return_type_span,
            body,
        })
    }

    fn parse_type_params(&mut self) -> Vec<TypeParam> {
        let mut type_params = Vec::new();
        if !self.at(SyntaxKind::LessThan) {
            return type_params;
        }
        self.bump();
        let mut depth = 1usize;
        let mut expect_name = true;
        while !self.at_eof() && depth > 0 {
            let kind = self.kind();
            match kind {
                SyntaxKind::LessThan => {
                    depth += 1;
                    self.bump();
                }
                SyntaxKind::GreaterThan => {
                    depth -= 1;
                    self.bump();
                }
                SyntaxKind::Comma if depth == 1 => {
                    expect_name = true;
                    self.bump();
                }
                _ => {
                    if expect_name && depth == 1 && kind.is_identifier_like() {
                        if let Some(name) = self.ident() {
                            let span = name.span;
                            type_params.push(TypeParam { name, span });
                        }
                        expect_name = false;
                    } else {
                        self.bump();
                    }
                }
            }
        }
        type_params
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if !self.eat(SyntaxKind::OpenParen) {
            return params;
        }
        while !self.at(SyntaxKind::CloseParen) && !self.at_eof() {
            let start = self.token().span.start;
            let decorators = self.parse_decorators();
            let modifiers = self.parse_member_modifiers();
            let rest = self.eat(SyntaxKind::DotDotDot);
            let Some(name) = self.ident() else {
                // Destructuring pattern: keep the pattern as the "name" span
                // so the type annotation can still be erased around it.
                if matches!(self.kind(), SyntaxKind::OpenBrace | SyntaxKind::OpenBracket) {
                    let pattern = self.skip_balanced();
                    let (type_node, type_ann_span) = self.parse_optional_type_annotation();
                    let initializer = if self.eat(SyntaxKind::Equals) {
                        Some(self.expression_span(&[SyntaxKind::Comma]))
                    } else {
                        None
                    };
                    params.push(Param {
                        decorators,
                        modifiers,
                        name: Ident {
                            text: String::new(),
                            span: pattern,
                        },
                        optional: false,
                        rest,
                        type_node,
                        type_ann_span,
                        initializer,
                        span: Span::new(start, self.prev_end()),
                    });
                    if !self.eat(SyntaxKind::Comma) {
                        break;
                    }
                    continue;
                }
                // Otherwise skim to the next parameter.
                let span = self.expression_span(&[SyntaxKind::Comma]);
                params.push(Param {
                    decorators,
                    modifiers,
                    name: Ident {
                        text: String::new(),
                        span,
                    },
                    optional: false,
                    rest,
                    type_node: None,
                    type_ann_span: None,
                    initializer: None,
                    span: Span::new(start, span.end),
                });
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
                continue;
            };
            let optional = self.eat(SyntaxKind::Question);
            let (type_node, type_ann_span) = self.parse_optional_type_annotation();
            let initializer = if self.eat(SyntaxKind::Equals) {
                Some(self.expression_span(&[SyntaxKind::Comma]))
            } else {
                None
            };
            params.push(Param {
                decorators,
                modifiers,
                name,
                optional,
                rest,
                type_node,
                type_ann_span,
                initializer,
                span: Span::new(start, self.prev_end()),
            });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::CloseParen, "')'");
        params
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn parse_class(&mut self, decorators: Vec<Decorator>, modifiers: Modifiers) -> StatementKind {
        self.bump(); // class
        let name = self.ident().unwrap_or_else(|| Ident {
            text: String::new(),
            span: Span::at(self.prev_end()),
        });
        let type_params = self.parse_type_params();

        let mut extends = None;
        let mut implements = Vec::new();
        if self.eat(SyntaxKind::ExtendsKeyword) {
            extends = Some(self.expression_span(&[
                SyntaxKind::ImplementsKeyword,
                SyntaxKind::OpenBrace,
            ]));
        }
        if self.eat(SyntaxKind::ImplementsKeyword) {
            loop {
                implements.push(self.parse_type());
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
        }

        let open_brace = self.token().span.start;
        self.expect(SyntaxKind::OpenBrace, "'{'");
        let mut members = Vec::new();
        while !self.at(SyntaxKind::CloseBrace) && !self.at_eof() {
            if self.at(SyntaxKind::Semicolon) {
                self.bump();
                continue;
            }
            members.push(self.parse_class_member());
        }
        let close_brace = self.token().span.start;
        self.eat(SyntaxKind::CloseBrace);

        StatementKind::Class(ClassDecl {
            decorators,
            modifiers,
            name,
            type_params,
            extends,
            implements,
            members,
            open_brace,
            close_brace,
        })
    }

    fn parse_class_member(&mut self) -> ClassMember {
        let start = self.token().span.start;
        let decorators = self.parse_decorators();
        let modifiers = self.parse_member_modifiers();

        // Index signatures and unmodeled members.
        if self.at(SyntaxKind::OpenBracket)
            && self.peek_kind(1).is_identifier_like()
            && self.peek_kind(2) == SyntaxKind::Colon
        {
            let span = self.skip_member_tail(start);
            return ClassMember::Other(span);
        }

        // Constructor
        if self.at(SyntaxKind::ConstructorKeyword) && self.peek_kind(1) == SyntaxKind::OpenParen {
            self.bump();
            let params = self.parse_params();
            let body = if self.at(SyntaxKind::OpenBrace) {
                Some(self.skip_balanced())
            } else {
                None
            };
            self.eat(SyntaxKind::Semicolon);
            return ClassMember::Constructor {
                params,
                body,
                span: Span::new(start, self.prev_end()),
            };
        }

        // Accessors
        let is_accessor = if self.at(SyntaxKind::GetKeyword)
            && (self.peek_kind(1).is_identifier_like()
                || matches!(
                    self.peek_kind(1),
                    SyntaxKind::StringLiteral | SyntaxKind::OpenBracket
                ))
        {
            self.bump();
            Some(AccessorKind::Get)
        } else if self.at(SyntaxKind::SetKeyword)
            && (self.peek_kind(1).is_identifier_like()
                || matches!(
                    self.peek_kind(1),
                    SyntaxKind::StringLiteral | SyntaxKind::OpenBracket
                ))
        {
            self.bump();
            Some(AccessorKind::Set)
        } else {
            None
        };

        let mut is_async = false;
        let mut is_generator = false;
        if self.kind() == SyntaxKind::Identifier
            && self.token_text() == "async"
            && (self.peek_kind(1).is_identifier_like()
                || matches!(
                    self.peek_kind(1),
                    SyntaxKind::StringLiteral | SyntaxKind::OpenBracket | SyntaxKind::Asterisk
                ))
        {
            self.bump();
            is_async = true;
        }
        if self.eat(SyntaxKind::Asterisk) {
            is_generator = true;
        }

        let Some(name) = self.parse_property_name() else {
            let span = self.skip_member_tail(start);
            return ClassMember::Other(span);
        };

        let optional = self.eat(SyntaxKind::Question);
        self.eat(SyntaxKind::Exclamation);

        if self.at(SyntaxKind::OpenParen) || self.at(SyntaxKind::LessThan) {
            // Method or accessor
            let type_params = self.parse_type_params();
            let params = self.parse_params();
            let (return_type, return_type_span) = self.parse_optional_type_annotation();
            let body = if self.at(SyntaxKind::OpenBrace) {
                Some(self.skip_balanced())
            } else {
                None
            };
            self.eat(SyntaxKind::Semicolon);
            ClassMember::Method {
                decorators,
                modifiers,
                name,
                is_accessor,
                is_async,
                is_generator,
                type_params,
                params,
                return_type,
                return_type_span,
                body,
                span: Span::new(start, self.prev_end()),
            }
        } else {
            let (type_node, type_ann_span) = self.parse_optional_type_annotation();
            let initializer = if self.eat(SyntaxKind::Equals) {
                Some(self.expression_span(&[SyntaxKind::Semicolon]))
            } else {
                None
            };
            self.eat(SyntaxKind::Semicolon);
            ClassMember::Property {
                decorators,
                modifiers,
                name,
                optional,
                type_node,
                type_ann_span,
                initializer,
                span: Span::new(start, self.prev_end()),
            }
        }
    }

    /// Skim an unmodeled class member through its terminating `;` or body.
    fn skip_member_tail(&mut self, start: u32) -> Span {
        while !self.at_eof() {
            match self.kind() {
                SyntaxKind::Semicolon => {
                    self.bump();
                    break;
                }
                SyntaxKind::OpenBrace => {
                    self.skip_balanced();
                    break;
                }
                SyntaxKind::CloseBrace => break,
                SyntaxKind::OpenParen | SyntaxKind::OpenBracket => {
                    self.skip_balanced();
                }
                _ => {
                    self.bump();
                }
            }
        }
        Span::new(start, self.prev_end().max(start))
    }

    fn parse_property_name(&mut self) -> Option<PropertyName> {
        match self.kind() {
            SyntaxKind::StringLiteral => {
                let token = self.bump();
                Some(PropertyName::StringLiteral {
                    text: unquote(token.span.slice(self.source)),
                    span: token.span,
                })
            }
            SyntaxKind::NumericLiteral => {
                let token = self.bump();
                Some(PropertyName::NumericLiteral {
                    text: token.span.slice(self.source).to_string(),
                    span: token.span,
                })
            }
            SyntaxKind::OpenBracket => Some(PropertyName::Computed(self.skip_balanced())),
            kind if kind.is_identifier_like()
                || matches!(
                    kind,
                    SyntaxKind::StaticKeyword
                        | SyntaxKind::PublicKeyword
                        | SyntaxKind::PrivateKeyword
                        | SyntaxKind::ProtectedKeyword
                ) =>
            {
                let token = self.bump();
                Some(PropertyName::Ident(Ident {
                    text: token.span.slice(self.source).to_string(),
                    span: token.span,
                }))
            }
            _ => None,
        }
    }

    // =========================================================================
    // Interfaces
    // =========================================================================

    fn parse_interface(&mut self, modifiers: Modifiers) -> StatementKind {
        self.bump(); // interface
        let name = self.ident().unwrap_or_else(|| Ident {
            text: String::new(),
            span: Span::at(self.prev_end()),
        });
        let type_params = self.parse_type_params();
        let mut extends = Vec::new();
        if self.eat(SyntaxKind::ExtendsKeyword) {
            loop {
                extends.push(self.parse_type());
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::OpenBrace, "'{'");
        let members = self.parse_type_members();
        self.eat(SyntaxKind::CloseBrace);
        StatementKind::Interface(InterfaceDecl {
            modifiers,
            name,
            type_params,
            extends,
            members,
        })
    }

    fn parse_type_members(&mut self) -> Vec<TypeMember> {
        let mut members = Vec::new();
        while !self.at(SyntaxKind::CloseBrace) && !self.at_eof() {
            if self.at(SyntaxKind::Semicolon) || self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            members.push(self.parse_type_member());
        }
        members
    }

    fn parse_type_member(&mut self) -> TypeMember {
        let start = self.token().span.start;

        // Index signature `[key: string]: T`
        if self.at(SyntaxKind::OpenBracket)
            && self.peek_kind(1).is_identifier_like()
            && self.peek_kind(2) == SyntaxKind::Colon
        {
            self.bump(); // [
            self.ident();
            self.bump(); // :
            let key_type = Some(self.parse_type());
            self.eat(SyntaxKind::CloseBracket);
            let (value_type, _) = self.parse_optional_type_annotation();
            return TypeMember::Index {
                key_type,
                value_type,
                span: Span::new(start, self.prev_end()),
            };
        }

        // Call/construct signatures are unmodeled.
        if matches!(self.kind(), SyntaxKind::OpenParen | SyntaxKind::NewKeyword | SyntaxKind::LessThan) {
            let span = self.skip_type_member_tail(start);
            return TypeMember::Other(span);
        }

        let readonly = self.at(SyntaxKind::ReadonlyKeyword)
            && self.peek_kind(1) != SyntaxKind::Colon
            && self.peek_kind(1) != SyntaxKind::Question;
        if readonly {
            self.bump();
        }

        let Some(name) = self.parse_property_name() else {
            let span = self.skip_type_member_tail(start);
            return TypeMember::Other(span);
        };
        let optional = self.eat(SyntaxKind::Question);

        if self.at(SyntaxKind::OpenParen) || self.at(SyntaxKind::LessThan) {
            let _type_params = self.parse_type_params();
            let params = self.parse_param_sigs();
            let return_type = if self.at(SyntaxKind::Colon) {
                self.bump();
                Some(self.parse_type())
            } else {
                None
            };
            TypeMember::Method {
                name,
                optional,
                params,
                return_type,
                span: Span::new(start, self.prev_end()),
            }
        } else {
            let type_node = if self.at(SyntaxKind::Colon) {
                self.bump();
                Some(self.parse_type())
            } else {
                None
            };
            TypeMember::Property {
                name,
                optional,
                readonly,
                type_node,
                span: Span::new(start, self.prev_end()),
            }
        }
    }

    fn skip_type_member_tail(&mut self, start: u32) -> Span {
        while !self.at_eof() {
            match self.kind() {
                SyntaxKind::Semicolon | SyntaxKind::Comma => {
                    self.bump();
                    break;
                }
                SyntaxKind::CloseBrace => break,
                SyntaxKind::OpenParen | SyntaxKind::OpenBracket | SyntaxKind::OpenBrace => {
                    self.skip_balanced();
                }
                _ => {
                    self.bump();
                }
            }
        }
        Span::new(start, self.prev_end().max(start))
    }

    /// Parameter signatures inside a function type or method signature.
    fn parse_param_sigs(&mut self) -> Vec<ParamSig> {
        let mut params = Vec::new();
        if !self.eat(SyntaxKind::OpenParen) {
            return params;
        }
        while !self.at(SyntaxKind::CloseParen) && !self.at_eof() {
            let rest = self.eat(SyntaxKind::DotDotDot);
            let name = if self.kind().is_identifier_like()
                && matches!(
                    self.peek_kind(1),
                    SyntaxKind::Colon | SyntaxKind::Question | SyntaxKind::Comma | SyntaxKind::CloseParen
                ) {
                self.ident().map(|i| i.text)
            } else {
                None
            };
            let optional = self.eat(SyntaxKind::Question);
            let type_node = if self.eat(SyntaxKind::Colon) {
                Some(self.parse_type())
            } else {
                None
            };
            params.push(ParamSig {
                name,
                optional,
                rest,
                type_node,
            });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.eat(SyntaxKind::CloseParen);
        params
    }

    // =========================================================================
    // Enums, type aliases, namespaces
    // =========================================================================

    fn parse_enum(&mut self, modifiers: Modifiers, is_const: bool) -> StatementKind {
        self.bump(); // enum
        let name = self.ident().unwrap_or_else(|| Ident {
            text: String::new(),
            span: Span::at(self.prev_end()),
        });
        self.expect(SyntaxKind::OpenBrace, "'{'");
        let mut members = Vec::new();
        while !self.at(SyntaxKind::CloseBrace) && !self.at_eof() {
            if self.at(SyntaxKind::Comma) {
                self.bump();
                continue;
            }
            let start = self.token().span.start;
            let Some(member_name) = self.parse_property_name() else {
                self.bump();
                continue;
            };
            let initializer = if self.eat(SyntaxKind::Equals) {
                Some(self.expression_span(&[SyntaxKind::Comma]))
            } else {
                None
            };
            members.push(EnumMember {
                name: member_name,
                initializer,
                span: Span::new(start, self.prev_end()),
            });
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.eat(SyntaxKind::CloseBrace);
        StatementKind::Enum(EnumDecl {
            modifiers,
            is_const,
            name,
            members,
        })
    }

    fn parse_type_alias(&mut self, modifiers: Modifiers) -> StatementKind {
        self.bump(); // type
        let name = self.ident().unwrap_or_else(|| Ident {
            text: String::new(),
            span: Span::at(self.prev_end()),
        });
        let type_params = self.parse_type_params();
        self.expect(SyntaxKind::Equals, "'='");
        let type_node = self.parse_type();
        StatementKind::TypeAlias(TypeAliasDecl {
            modifiers,
            name,
            type_params,
            type_node,
        })
    }

    fn parse_namespace(&mut self, modifiers: Modifiers, is_global: bool) -> StatementKind {
        let mut name = Vec::new();
        if is_global {
            self.bump(); // global
        } else {
            self.bump(); // namespace | module
            if self.at(SyntaxKind::StringLiteral) {
                let token = self.bump();
                name.push(Ident {
                    text: unquote(token.span.slice(self.source)),
                    span: token.span,
                });
            } else if let Some(qualified) = self.qualified_name() {
                name = qualified.parts;
            }
        }
        let mut body = Vec::new();
        if self.eat(SyntaxKind::OpenBrace) {
            body = self.parse_statements(true);
            self.eat(SyntaxKind::CloseBrace);
        }
        StatementKind::Namespace(NamespaceDecl {
            modifiers,
            name,
            is_global,
            body,
        })
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Parse a type. Never fails; unstructured syntax becomes `Unsupported`.
    pub(crate) fn parse_type(&mut self) -> TypeNode {
        let start = self.token().span.start;
        let node = self.parse_union_type();
        // Conditional types (`T extends U ? A : B`) are unsupported; skim
        // through the remainder of the conditional.
        if self.at(SyntaxKind::ExtendsKeyword) {
            self.bump();
            self.parse_union_type();
            if self.eat(SyntaxKind::Question) {
                self.parse_type();
                if self.eat(SyntaxKind::Colon) {
                    self.parse_type();
                }
            }
            return TypeNode {
                kind: TypeNodeKind::Unsupported(Span::new(start, self.prev_end())),
                span: Span::new(start, self.prev_end()),
            };
        }
        node
    }

    fn parse_union_type(&mut self) -> TypeNode {
        let start = self.token().span.start;
        self.eat(SyntaxKind::Bar); // leading `|`
        let first = self.parse_intersection_type();
        if !self.at(SyntaxKind::Bar) {
            return first;
        }
        let mut members = vec![first];
        while self.eat(SyntaxKind::Bar) {
            members.push(self.parse_intersection_type());
        }
        let span = Span::new(start, self.prev_end());
        TypeNode {
            kind: TypeNodeKind::Union(members),
            span,
        }
    }

    fn parse_intersection_type(&mut self) -> TypeNode {
        let start = self.token().span.start;
        let first = self.parse_postfix_type();
        if !self.at(SyntaxKind::Ampersand) {
            return first;
        }
        let mut members = vec![first];
        while self.eat(SyntaxKind::Ampersand) {
            members.push(self.parse_postfix_type());
        }
        let span = Span::new(start, self.prev_end());
        TypeNode {
            kind: TypeNodeKind::Intersection(members),
            span,
        }
    }

    fn parse_postfix_type(&mut self) -> TypeNode {
        let mut node = self.parse_primary_type();
        loop {
            if self.at(SyntaxKind::OpenBracket) && !self.token().on_new_line {
                if self.peek_kind(1) == SyntaxKind::CloseBracket {
                    self.bump();
                    let close = self.bump();
                    let span = Span::new(node.span.start, close.span.end);
                    node = TypeNode {
                        kind: TypeNodeKind::Array(Box::new(node)),
                        span,
                    };
                } else {
                    // Indexed access `T[K]`: unsupported.
                    let bracket = self.skip_balanced();
                    let span = Span::new(node.span.start, bracket.end);
                    node = TypeNode {
                        kind: TypeNodeKind::Unsupported(span),
                        span,
                    };
                }
            } else {
                break;
            }
        }
        node
    }

    fn parse_primary_type(&mut self) -> TypeNode {
        let token = self.token();
        let start = token.span.start;
        match token.kind {
            SyntaxKind::AnyKeyword => self.keyword_type(TypeKeyword::Any),
            SyntaxKind::UnknownKeyword => self.keyword_type(TypeKeyword::Unknown),
            SyntaxKind::NumberKeyword => self.keyword_type(TypeKeyword::Number),
            SyntaxKind::StringKeyword => self.keyword_type(TypeKeyword::String),
            SyntaxKind::BooleanKeyword => self.keyword_type(TypeKeyword::Boolean),
            SyntaxKind::VoidKeyword => self.keyword_type(TypeKeyword::Void),
            SyntaxKind::NullKeyword => self.keyword_type(TypeKeyword::Null),
            SyntaxKind::UndefinedKeyword => self.keyword_type(TypeKeyword::Undefined),
            SyntaxKind::NeverKeyword => self.keyword_type(TypeKeyword::Never),
            SyntaxKind::ObjectKeyword => self.keyword_type(TypeKeyword::Object),
            SyntaxKind::SymbolKeyword => self.keyword_type(TypeKeyword::Symbol),
            SyntaxKind::BigIntKeyword => self.keyword_type(TypeKeyword::BigInt),
            SyntaxKind::StringLiteral
            | SyntaxKind::NumericLiteral
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword => {
                let token = self.bump();
                TypeNode {
                    kind: TypeNodeKind::Literal {
                        text: token.span.slice(self.source).to_string(),
                    },
                    span: token.span,
                }
            }
            SyntaxKind::TypeofKeyword => {
                self.bump();
                let name = self.qualified_name().unwrap_or(QualifiedName {
                    parts: Vec::new(),
                });
                let span = Span::new(start, self.prev_end());
                TypeNode {
                    kind: TypeNodeKind::TypeQuery(name),
                    span,
                }
            }
            SyntaxKind::KeyofKeyword => {
                self.bump();
                self.parse_postfix_type();
                let span = Span::new(start, self.prev_end());
                TypeNode {
                    kind: TypeNodeKind::Unsupported(span),
                    span,
                }
            }
            SyntaxKind::OpenBrace => self.parse_type_literal(),
            SyntaxKind::OpenBracket => {
                self.bump();
                let mut members = Vec::new();
                while !self.at(SyntaxKind::CloseBracket) && !self.at_eof() {
                    members.push(self.parse_type());
                    if !self.eat(SyntaxKind::Comma) {
                        break;
                    }
                }
                self.eat(SyntaxKind::CloseBracket);
                let span = Span::new(start, self.prev_end());
                TypeNode {
                    kind: TypeNodeKind::Tuple(members),
                    span,
                }
            }
            SyntaxKind::OpenParen => {
                if self.paren_starts_function_type() {
                    self.parse_function_type(start)
                } else {
                    self.bump();
                    let inner = self.parse_type();
                    self.eat(SyntaxKind::CloseParen);
                    let span = Span::new(start, self.prev_end());
                    TypeNode {
                        kind: TypeNodeKind::Paren(Box::new(inner)),
                        span,
                    }
                }
            }
            SyntaxKind::NewKeyword => {
                // Constructor type `new (...) => T`: unsupported.
                self.bump();
                if self.at(SyntaxKind::OpenParen) {
                    self.skip_balanced();
                }
                if self.eat(SyntaxKind::Arrow) {
                    self.parse_type();
                }
                let span = Span::new(start, self.prev_end());
                TypeNode {
                    kind: TypeNodeKind::Unsupported(span),
                    span,
                }
            }
            kind if kind.is_identifier_like() => {
                let name = self.qualified_name().expect("identifier-like token");
                let mut type_args = Vec::new();
                if self.at(SyntaxKind::LessThan) {
                    self.bump();
                    while !self.at(SyntaxKind::GreaterThan) && !self.at_eof() {
                        type_args.push(self.parse_type());
                        if !self.eat(SyntaxKind::Comma) {
                            break;
                        }
                    }
                    self.eat(SyntaxKind::GreaterThan);
                }
                let span = Span::new(start, self.prev_end());
                TypeNode {
                    kind: TypeNodeKind::Reference { name, type_args },
                    span,
                }
            }
            _ => {
                // Unknown type syntax; consume one token so we make progress.
                let token = self.bump();
                TypeNode {
                    kind: TypeNodeKind::Unsupported(token.span),
                    span: token.span,
                }
            }
        }
    }

    fn keyword_type(&mut self, keyword: TypeKeyword) -> TypeNode {
        let token = self.bump();
        TypeNode {
            kind: TypeNodeKind::Keyword(keyword),
            span: token.span,
        }
    }

    /// Lookahead: does the `(` at the current position begin a function type?
    fn paren_starts_function_type(&mut self) -> bool {
        let mut idx = self.pos + 1;
        let mut depth = 1usize;
        while idx < self.stream.tokens.len() {
            match self.stream.tokens[idx].kind {
                SyntaxKind::OpenParen => depth += 1,
                SyntaxKind::CloseParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .stream
                            .tokens
                            .get(idx + 1)
                            .map(|t| t.kind == SyntaxKind::Arrow)
                            .unwrap_or(false);
                    }
                }
                SyntaxKind::EndOfFile => return false,
                _ => {}
            }
            idx += 1;
        }
        false
    }

    fn parse_function_type(&mut self, start: u32) -> TypeNode {
        let mut params = self.parse_param_sigs();
        self.eat(SyntaxKind::Arrow);
        let return_type = self.parse_type();
        // A leading `this` parameter is modeled separately.
        let this_type = if params
            .first()
            .map(|p| p.name.as_deref() == Some("this"))
            .unwrap_or(false)
        {
            let this_param = params.remove(0);
            this_param.type_node.map(Box::new)
        } else {
            None
        };
        let span = Span::new(start, self.prev_end());
        TypeNode {
            kind: TypeNodeKind::Function {
                this_type,
                params,
                return_type: Box::new(return_type),
            },
            span,
        }
    }

    fn parse_type_literal(&mut self) -> TypeNode {
        let start = self.token().span.start;
        self.bump(); // {
        let members = self.parse_type_members();
        self.eat(SyntaxKind::CloseBrace);
        let span = Span::new(start, self.prev_end());
        TypeNode {
            kind: TypeNodeKind::TypeLiteral(members),
            span,
        }
    }
}

/// Keywords that begin a statement; used as ASI hints when skimming
/// expressions.
fn starts_statement(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::ImportKeyword
            | SyntaxKind::ExportKeyword
            | SyntaxKind::VarKeyword
            | SyntaxKind::LetKeyword
            | SyntaxKind::ConstKeyword
            | SyntaxKind::FunctionKeyword
            | SyntaxKind::ClassKeyword
            | SyntaxKind::InterfaceKeyword
            | SyntaxKind::EnumKeyword
            | SyntaxKind::DeclareKeyword
            | SyntaxKind::NamespaceKeyword
            | SyntaxKind::ModuleKeyword
    )
}

/// Strip matching quotes from a string literal's source text.
pub fn unquote(text: &str) -> String {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' || first == b'\'' || first == b'`') && first == last {
            return text[1..text.len() - 1].to_string();
        }
    }
    text.to_string()
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod parser_tests;
