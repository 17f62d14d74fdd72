//! JSDoc Annotator - the closurize pass.
//!
//! Drives a [`Rewriter`] over a type-checked source file, emitting a JSDoc
//! block before every declaration whose contents encode the TypeScript type
//! in the Closure grammar. Interfaces additionally get a runtime `@record`
//! witness with prototype-property stubs, enums get `@enum` annotations,
//! and type aliases become `@typedef`s. User-written JSDoc is merged:
//! `@param` descriptions survive, user types are overridden, and tags the
//! pass owns are dropped with a diagnostic.

use crate::ast::*;
use crate::diagnostics::DiagnosticBag;
use crate::jsdoc::{self, Tag};
use crate::program::{resolve_specifier, CompilerHost, Program, ProgramFile};
use crate::rewriter::{NodeRef, RewriteResult, RewriteVisitor, Rewriter};
use crate::span::Span;
use crate::type_translator::TypeTranslator;
use tracing::debug;

/// Options for the annotator pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnnotatorOptions {
    /// Translate every type as `?`.
    pub untyped: bool,
    /// Surface translation warnings as diagnostics.
    pub verbose: bool,
}

/// A type-only re-export recorded for the module converter, which emits a
/// `@typedef` alias so the corresponding `goog.require` stays live.
#[derive(Clone, Debug)]
pub struct TypedefReExport {
    pub specifier: String,
    pub exported_name: String,
    pub source_name: String,
}

/// Facts the annotator learned about a file, consumed by later passes.
#[derive(Debug, Default)]
pub struct FileSummary {
    /// Local import names referenced in type positions.
    pub type_used_imports: Vec<String>,
    /// Re-exports that have no value at runtime.
    pub typedef_reexports: Vec<TypedefReExport>,
}

/// The `@suppress` warning names emitted when annotator confidence is low.
const EXPANDED_SUPPRESSIONS: &[&str] = &[
    "checkTypes",
    "constantProperty",
    "duplicate",
    "missingOverride",
    "missingReturn",
    "unusedPrivateMembers",
    "uselessCode",
];

/// Annotate one file. Returns the rewritten text, the per-file summary,
/// and every diagnostic the pass and its translator recorded.
pub fn annotate(
    program: &Program,
    host: &dyn CompilerHost,
    file: &ProgramFile,
    options: AnnotatorOptions,
) -> (RewriteResult, FileSummary) {
    let translator = TypeTranslator::new(program, host, file, options.untyped, options.verbose);
    let mut visitor = Annotator {
        program,
        host,
        translator,
        options,
        summary: FileSummary::default(),
        extra_diagnostics: DiagnosticBag::new(),
    };

    let mut rewriter = Rewriter::new(&file.file);
    visitor.emit_fileoverview(&mut rewriter);
    let statements: Vec<&Statement> = file.file.statements.iter().collect();
    for statement in statements {
        rewriter.visit(statement, &mut visitor);
        if rewriter.failed() {
            break;
        }
    }
    let mut result = rewriter.finish();

    visitor
        .summary
        .type_used_imports
        .extend(visitor.translator.referenced_imports().iter().cloned());
    result.diagnostics.absorb(visitor.translator.take_diagnostics());
    result.diagnostics.absorb(visitor.extra_diagnostics);
    (result, visitor.summary)
}

struct Annotator<'a> {
    program: &'a Program,
    host: &'a dyn CompilerHost,
    translator: TypeTranslator<'a>,
    options: AnnotatorOptions,
    summary: FileSummary,
    extra_diagnostics: DiagnosticBag,
}

impl<'a> RewriteVisitor for Annotator<'a> {
    fn maybe_process(&mut self, node: NodeRef<'_>, rewriter: &mut Rewriter<'_>) -> bool {
        match node {
            NodeRef::Statement(statement) => self.process_statement(statement, rewriter),
            NodeRef::ClassMember { class, member } => {
                self.process_member(class, member, rewriter)
            }
        }
    }
}

impl<'a> Annotator<'a> {
    // =========================================================================
    // File-level emission
    // =========================================================================

    /// Prefix the file with the `@fileoverview` block, merging an existing
    /// file-level comment.
    fn emit_fileoverview(&mut self, rewriter: &mut Rewriter<'_>) {
        let existing_span = rewriter.file.fileoverview_span();
        let mut tags: Vec<Tag> = Vec::new();
        if let Some(span) = existing_span {
            if let Some(parsed) = jsdoc::parse(span.slice(&rewriter.file.text)) {
                tags = parsed
                    .into_iter()
                    .filter(|tag| tag.tag_name != "suppress")
                    .collect();
            }
        }
        if !tags.iter().any(|tag| tag.tag_name == "fileoverview") {
            tags.insert(
                0,
                Tag {
                    tag_name: "fileoverview".to_string(),
                    text: Some("added by closurize".to_string()),
                    ..Tag::default()
                },
            );
        } else if let Some(tag) = tags.iter_mut().find(|tag| tag.tag_name == "fileoverview") {
            let text = tag.text.get_or_insert_with(String::new);
            if !text.contains("added by closurize") {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str("added by closurize");
            }
        }
        let suppressions = if self.options.untyped {
            EXPANDED_SUPPRESSIONS.join(",")
        } else {
            "checkTypes".to_string()
        };
        tags.push(Tag {
            tag_name: "suppress".to_string(),
            type_expr: Some(suppressions),
            ..Tag::default()
        });

        if let Some(span) = existing_span {
            rewriter.write_to(span.start);
            rewriter.skip_to(span.end);
        }
        rewriter.emit(&jsdoc::to_string(&tags));
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn process_statement(&mut self, statement: &Statement, rewriter: &mut Rewriter<'_>) -> bool {
        match &statement.kind {
            StatementKind::Var(var) => {
                self.annotate_var(statement, var, rewriter);
                true
            }
            StatementKind::Function(func) => {
                self.annotate_function(statement, func, rewriter);
                true
            }
            StatementKind::Class(class) => {
                self.annotate_class(statement, class, rewriter);
                true
            }
            StatementKind::Interface(interface) => {
                self.annotate_interface(statement, interface, rewriter);
                true
            }
            StatementKind::Enum(decl) => {
                self.annotate_enum(statement, decl, rewriter);
                true
            }
            StatementKind::TypeAlias(alias) => {
                self.annotate_type_alias(statement, alias, rewriter);
                true
            }
            StatementKind::Namespace(ns) => {
                self.check_namespace(ns, rewriter);
                false
            }
            StatementKind::Export(export) => {
                self.record_typedef_reexports(export, rewriter);
                false
            }
            // Imports and opaque statements pass through verbatim.
            _ => false,
        }
    }

    fn annotate_var(
        &mut self,
        statement: &Statement,
        var: &VarStatement,
        rewriter: &mut Rewriter<'_>,
    ) {
        // Ambient declarations surface through the externs file instead.
        if var.modifiers.declare {
            rewriter.write_to(statement.span.end);
            return;
        }
        let translated = match var.declarations.first().and_then(|d| d.type_node.as_ref()) {
            Some(type_node) => self.translator.translate(type_node),
            None => "?".to_string(),
        };
        if var.declarations.len() > 1 {
            let all_same = var.declarations.iter().all(|decl| {
                decl.type_node
                    .as_ref()
                    .map(|t| self.translator.translate(t))
                    .unwrap_or_else(|| "?".to_string())
                    == translated
            });
            if !all_same {
                rewriter.error(
                    statement.span,
                    "declaration list with differing types cannot take a single @type",
                );
                rewriter.write_to(statement.span.end);
                return;
            }
        }
        let mut tags = vec![Tag::with_type("type", translated)];
        if var.modifiers.export {
            tags.push(Tag::named("export"));
        }
        self.emit_jsdoc(statement, tags, rewriter);
        rewriter.write_to(statement.span.end);
    }

    fn annotate_function(
        &mut self,
        statement: &Statement,
        func: &FunctionDecl,
        rewriter: &mut Rewriter<'_>,
    ) {
        if func.modifiers.declare {
            rewriter.write_to(statement.span.end);
            return;
        }
        // Overload signatures carry no body and no annotation of their own.
        if func.body.is_none() {
            rewriter.write_to(statement.span.end);
            return;
        }
        self.translator
            .push_type_params(func.type_params.iter().map(|p| p.name.text.clone()));
        let mut tags =
            self.signature_tags(&func.type_params, &func.params, func.return_type.as_ref());
        if func.modifiers.export {
            tags.push(Tag::named("export"));
        }
        self.emit_jsdoc(statement, tags, rewriter);
        self.translator.pop_type_params();
        rewriter.write_to(statement.span.end);
    }

    fn annotate_class(
        &mut self,
        statement: &Statement,
        class: &ClassDecl,
        rewriter: &mut Rewriter<'_>,
    ) {
        if class.modifiers.declare {
            rewriter.write_to(statement.span.end);
            return;
        }
        self.translator
            .push_type_params(class.type_params.iter().map(|p| p.name.text.clone()));

        let mut tags: Vec<Tag> = Vec::new();
        if !class.type_params.is_empty() {
            tags.push(template_tag(&class.type_params));
        }
        if class.modifiers.r#abstract {
            tags.push(Tag::named("abstract"));
        }
        for implemented in &class.implements {
            let translated = self.translator.translate(implemented);
            if translated == "?" {
                debug!("implements clause did not translate; tag omitted");
                continue;
            }
            let bare = translated.trim_start_matches('!').to_string();
            tags.push(Tag::with_type("implements", bare));
        }
        if class.modifiers.export {
            tags.push(Tag::named("export"));
        }
        self.emit_jsdoc(statement, tags, rewriter);

        // Members are annotated one by one; the rewriter's default class
        // traversal calls back into `process_member`.
        rewriter.descend(statement, self);
        self.translator.pop_type_params();
    }

    fn annotate_interface(
        &mut self,
        statement: &Statement,
        interface: &InterfaceDecl,
        rewriter: &mut Rewriter<'_>,
    ) {
        // The declaration itself is erased at emit; Closure still needs a
        // runtime witness for goog.require and @implements to work.
        rewriter.write_to(statement.span.end);
        if interface.modifiers.declare {
            // Ambient interfaces surface through the externs file.
            return;
        }

        self.translator
            .push_type_params(interface.type_params.iter().map(|p| p.name.text.clone()));

        let mut record_tags = vec![Tag::named("record")];
        if !interface.type_params.is_empty() {
            record_tags.push(template_tag(&interface.type_params));
        }
        for base in &interface.extends {
            let translated = self.translator.translate(base);
            if translated == "?" {
                self.extra_diagnostics.warning(
                    rewriter.file.file_name.as_str(),
                    base.span,
                    "interface base could not be translated; @extends omitted",
                );
                continue;
            }
            record_tags.push(Tag::with_type(
                "extends",
                translated.trim_start_matches('!').to_string(),
            ));
        }
        if interface.modifiers.export {
            record_tags.push(Tag::named("export"));
        }

        let export_kw = if interface.modifiers.export {
            "export "
        } else {
            ""
        };
        let name = &interface.name.text;
        let mut witness = String::from("\n");
        witness.push_str(&jsdoc::to_string(&record_tags));
        witness.push_str(&format!("{}function {}() {{}}\n", export_kw, name));

        for member in &interface.members {
            match member {
                TypeMember::Property {
                    name: member_name,
                    optional,
                    type_node,
                    ..
                } => {
                    let Some(text) = member_name.as_static_name() else {
                        continue;
                    };
                    let translated = if *optional {
                        self.translator
                            .translate_optional(type_node.as_ref(), member.span())
                    } else {
                        match type_node {
                            Some(node) => self.translator.translate(node),
                            None => "?".to_string(),
                        }
                    };
                    witness.push_str(&jsdoc::to_string(&[Tag::with_type("type", translated)]));
                    witness.push_str(&format!("{}.prototype.{};\n", name, text));
                }
                TypeMember::Method {
                    name: member_name,
                    params,
                    return_type,
                    ..
                } => {
                    let Some(text) = member_name.as_static_name() else {
                        continue;
                    };
                    let return_node = return_type.clone().unwrap_or(TypeNode {
                        kind: TypeNodeKind::Keyword(TypeKeyword::Void),
                        span: member.span(),
                    });
                    let signature = TypeNode {
                        kind: TypeNodeKind::Function {
                            this_type: None,
                            params: params.clone(),
                            return_type: Box::new(return_node),
                        },
                        span: member.span(),
                    };
                    let translated = self.translator.translate(&signature);
                    witness.push_str(&jsdoc::to_string(&[Tag::with_type("type", translated)]));
                    witness.push_str(&format!("{}.prototype.{};\n", name, text));
                }
                TypeMember::Index { .. } | TypeMember::Other(_) => {
                    debug!("interface member without a prototype form skipped");
                }
            }
        }

        self.translator.pop_type_params();
        rewriter.emit(&witness);
    }

    fn annotate_enum(
        &mut self,
        statement: &Statement,
        decl: &EnumDecl,
        rewriter: &mut Rewriter<'_>,
    ) {
        if decl.modifiers.declare {
            rewriter.write_to(statement.span.end);
            return;
        }
        let is_string_enum = decl.members.iter().any(|member| {
            member
                .initializer
                .map(|span| {
                    let text = span.slice(&rewriter.file.text).trim_start();
                    text.starts_with('\'') || text.starts_with('"') || text.starts_with('`')
                })
                .unwrap_or(false)
        });
        let value_type = if is_string_enum { "string" } else { "number" };
        let mut tags = vec![Tag::with_type("enum", value_type)];
        if decl.modifiers.export {
            tags.push(Tag::named("export"));
        }
        self.emit_jsdoc(statement, tags, rewriter);
        rewriter.write_to(statement.span.end);
    }

    fn annotate_type_alias(
        &mut self,
        statement: &Statement,
        alias: &TypeAliasDecl,
        rewriter: &mut Rewriter<'_>,
    ) {
        self.translator
            .push_type_params(alias.type_params.iter().map(|p| p.name.text.clone()));
        let translated = self
            .translator
            .translate_alias(&alias.name.text, &alias.type_node);
        self.translator.pop_type_params();

        let mut tags = vec![Tag::with_type("typedef", translated)];
        if !alias.type_params.is_empty() {
            tags.insert(0, template_tag(&alias.type_params));
        }

        // Replace the alias with a typed variable slot: the alias has no
        // emitted form of its own.
        rewriter.write_to(statement.span.start);
        rewriter.skip_to(statement.span.end);
        rewriter.emit(&jsdoc::to_string(&tags));
        if alias.modifiers.export {
            rewriter.emit(&format!("exports.{};\n", alias.name.text));
        } else {
            rewriter.emit(&format!("var {};\n", alias.name.text));
        }
    }

    fn check_namespace(&mut self, ns: &NamespaceDecl, rewriter: &mut Rewriter<'_>) {
        for inner in &ns.body {
            if let StatementKind::Interface(interface) = &inner.kind {
                rewriter.error(
                    interface.name.span,
                    "interface inside a namespace is not supported; move it to module scope",
                );
            }
        }
    }

    fn record_typedef_reexports(&mut self, export: &ExportDecl, rewriter: &mut Rewriter<'_>) {
        let Some(specifier) = &export.specifier else {
            return;
        };
        if export.is_star {
            return;
        }
        let target = resolve_specifier(self.host, &rewriter.file.file_name, specifier)
            .and_then(|file_name| self.program.get_file(&file_name));
        for spec in &export.named {
            let source_name = spec
                .property_name
                .as_ref()
                .unwrap_or(&spec.name)
                .text
                .clone();
            let is_type_only = export.is_type_only
                || spec.is_type_only
                || target
                    .and_then(|pf| pf.bindings.get(&source_name))
                    .map(|symbol| {
                        symbol.has_any_flags(crate::binder::symbol_flags::TYPE_ALIAS)
                            && !symbol.has_any_flags(crate::binder::symbol_flags::VALUE)
                    })
                    .unwrap_or(false);
            if is_type_only {
                self.summary.typedef_reexports.push(TypedefReExport {
                    specifier: specifier.clone(),
                    exported_name: spec.name.text.clone(),
                    source_name,
                });
            }
        }
    }

    // =========================================================================
    // Class members
    // =========================================================================

    fn process_member(
        &mut self,
        _class: &ClassDecl,
        member: &ClassMember,
        rewriter: &mut Rewriter<'_>,
    ) -> bool {
        match member {
            ClassMember::Constructor { params, .. } => {
                let tags = self.param_tags(params);
                self.emit_member_jsdoc(member.span(), tags, rewriter);
                rewriter.write_to(member.span().end);
                true
            }
            ClassMember::Method {
                modifiers,
                type_params,
                params,
                return_type,
                is_accessor,
                body,
                ..
            } => {
                if body.is_none() && !modifiers.r#abstract {
                    // Overload signature; the implementation gets the tags.
                    rewriter.write_to(member.span().end);
                    return true;
                }
                self.translator
                    .push_type_params(type_params.iter().map(|p| p.name.text.clone()));
                let mut tags: Vec<Tag> = Vec::new();
                match is_accessor {
                    Some(AccessorKind::Get) => {
                        let translated = match return_type {
                            Some(node) => self.translator.translate(node),
                            None => "?".to_string(),
                        };
                        tags.push(Tag::with_type("return", translated));
                    }
                    Some(AccessorKind::Set) => {
                        tags.extend(self.param_tags(params));
                    }
                    None => {
                        tags = self.signature_tags(type_params, params, return_type.as_ref());
                    }
                }
                self.translator.pop_type_params();
                push_visibility_tags(&mut tags, modifiers);
                if modifiers.r#abstract {
                    tags.push(Tag::named("abstract"));
                }
                self.emit_member_jsdoc(member.span(), tags, rewriter);
                rewriter.write_to(member.span().end);
                true
            }
            ClassMember::Property {
                modifiers,
                optional,
                type_node,
                ..
            } => {
                if modifiers.declare {
                    rewriter.write_to(member.span().end);
                    return true;
                }
                let translated = if *optional {
                    self.translator
                        .translate_optional(type_node.as_ref(), member.span())
                } else {
                    match type_node {
                        Some(node) => self.translator.translate(node),
                        None => "?".to_string(),
                    }
                };
                let mut tags = vec![Tag::with_type("type", translated)];
                push_visibility_tags(&mut tags, modifiers);
                if modifiers.readonly {
                    tags.push(Tag::named("const"));
                }
                self.emit_member_jsdoc(member.span(), tags, rewriter);
                rewriter.write_to(member.span().end);
                true
            }
            ClassMember::Other(_) => false,
        }
    }

    // =========================================================================
    // Tag construction and merging
    // =========================================================================

    fn param_tags(&mut self, params: &[Param]) -> Vec<Tag> {
        let mut tags = Vec::new();
        for param in params {
            if param.name.text.is_empty() {
                continue;
            }
            let translated = if param.rest {
                let element = match param.type_node.as_ref().map(|t| &t.kind) {
                    Some(TypeNodeKind::Array(element)) => self.translator.translate(element),
                    _ => "?".to_string(),
                };
                format!("...{}", element)
            } else if param.optional || param.initializer.is_some() {
                self.translator
                    .translate_optional(param.type_node.as_ref(), param.span)
            } else {
                match &param.type_node {
                    Some(node) => self.translator.translate(node),
                    None => "?".to_string(),
                }
            };
            tags.push(Tag {
                tag_name: "param".to_string(),
                parameter_name: Some(param.name.text.clone()),
                type_expr: Some(translated),
                text: None,
            });
        }
        tags
    }

    fn signature_tags(
        &mut self,
        type_params: &[TypeParam],
        params: &[Param],
        return_type: Option<&TypeNode>,
    ) -> Vec<Tag> {
        let mut tags: Vec<Tag> = Vec::new();
        if !type_params.is_empty() {
            tags.push(template_tag(type_params));
        }
        tags.extend(self.param_tags(params));
        match return_type {
            Some(node) => {
                let translated = self.translator.translate(node);
                if translated != "void" {
                    tags.push(Tag::with_type("return", translated));
                }
            }
            None => {}
        }
        tags
    }

    /// Merge synthesized tags with the statement's existing JSDoc and emit
    /// the block immediately before the statement.
    fn emit_jsdoc(&mut self, statement: &Statement, tags: Vec<Tag>, rewriter: &mut Rewriter<'_>) {
        let jsdoc_span = statement.jsdoc_span();
        self.emit_merged(jsdoc_span, statement.span.start, tags, rewriter);
    }

    /// Like [`Self::emit_jsdoc`] for class members, whose leading comments
    /// are found by scanning the file's comment list.
    fn emit_member_jsdoc(&mut self, member_span: Span, tags: Vec<Tag>, rewriter: &mut Rewriter<'_>) {
        let jsdoc_span = leading_jsdoc_before(rewriter.file, rewriter.position(), member_span.start);
        self.emit_merged(jsdoc_span, member_span.start, tags, rewriter);
    }

    fn emit_merged(
        &mut self,
        existing: Option<Span>,
        declaration_start: u32,
        mut synthesized: Vec<Tag>,
        rewriter: &mut Rewriter<'_>,
    ) {
        let mut merged: Vec<Tag> = Vec::new();
        if let Some(span) = existing {
            if let Some(user_tags) = jsdoc::parse(span.slice(&rewriter.file.text)) {
                adopt_descriptions(&mut synthesized, &user_tags);
                merged = self.merge_user_tags(user_tags, span, rewriter);
            }
        }
        merged.extend(synthesized);
        if merged.is_empty() {
            rewriter.write_to(declaration_start);
            return;
        }

        let insert_at = existing.map(|span| span.start).unwrap_or(declaration_start);
        rewriter.write_to(insert_at);
        if existing.is_some() {
            rewriter.skip_to(declaration_start);
        }
        let indent = line_indent(&rewriter.file.text, declaration_start);
        rewriter.emit(&indent_block(&jsdoc::to_string(&merged), &indent));
    }

    /// Filter user tags against the synthesized set: banned tags drop with
    /// a diagnostic, `@param`/`@return` descriptions migrate onto the
    /// synthesized tags, everything else is kept ahead of the synthesized
    /// block.
    fn merge_user_tags(
        &mut self,
        user_tags: Vec<Tag>,
        span: Span,
        rewriter: &mut Rewriter<'_>,
    ) -> Vec<Tag> {
        let mut kept: Vec<Tag> = Vec::new();
        for tag in user_tags {
            if jsdoc::BANNED_TAGS.contains(&tag.tag_name.as_str()) {
                self.extra_diagnostics.warning(
                    rewriter.file.file_name.as_str(),
                    span,
                    format!("@{} annotation is redundant and was dropped", tag.tag_name),
                );
                continue;
            }
            if tag.tag_name == "param" || tag.tag_name == "return" || tag.tag_name == "returns" {
                // Description is preserved on the synthesized tag; the user
                // type (if any) is overridden by the translator's output.
                continue;
            }
            if tag.tag_name == "export" {
                // Re-synthesized from the declaration's modifiers.
                continue;
            }
            kept.push(tag);
        }
        kept
    }
}

/// Carry user `@param`/`@return` descriptions onto synthesized tags.
fn adopt_descriptions(synthesized: &mut [Tag], user_tags: &[Tag]) {
    for tag in synthesized.iter_mut() {
        if tag.tag_name == "param" {
            if let Some(user) = user_tags.iter().find(|u| {
                u.tag_name == "param" && u.parameter_name == tag.parameter_name
            }) {
                tag.text = user.text.clone();
            }
        } else if tag.tag_name == "return" {
            if let Some(user) = user_tags
                .iter()
                .find(|u| u.tag_name == "return" || u.tag_name == "returns")
            {
                tag.text = user.text.clone();
            }
        }
    }
}

fn template_tag(type_params: &[TypeParam]) -> Tag {
    Tag {
        tag_name: "template".to_string(),
        text: Some(
            type_params
                .iter()
                .map(|p| p.name.text.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        ..Tag::default()
    }
}

fn push_visibility_tags(tags: &mut Vec<Tag>, modifiers: &Modifiers) {
    if modifiers.private {
        tags.push(Tag::named("private"));
    } else if modifiers.protected {
        tags.push(Tag::named("protected"));
    }
}

/// The most recent non-detached JSDoc comment between `from` and `to`.
fn leading_jsdoc_before(file: &SourceFile, from: u32, to: u32) -> Option<Span> {
    file.comments
        .iter()
        .rev()
        .find(|comment| {
            comment.is_jsdoc
                && !comment.detached
                && comment.span.start >= from
                && comment.span.end <= to
        })
        .map(|comment| comment.span)
}

/// Whitespace indentation of the line containing `pos`.
fn line_indent(text: &str, pos: u32) -> String {
    let pos = (pos as usize).min(text.len());
    let line_start = text[..pos].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    text[line_start..pos]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Re-indent a JSDoc block for insertion before a declaration at `indent`.
/// Every line after the first is indented, including the empty tail after
/// the block's trailing newline, so the declaration that follows lands at
/// the right column.
fn indent_block(block: &str, indent: &str) -> String {
    if indent.is_empty() {
        return block.to_string();
    }
    let mut out = String::with_capacity(block.len() + indent.len() * 4);
    for (idx, line) in block.split('\n').enumerate() {
        if idx > 0 {
            out.push('\n');
            out.push_str(indent);
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
#[path = "annotator_tests.rs"]
mod annotator_tests;
