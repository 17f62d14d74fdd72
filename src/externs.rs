//! Externs Generator.
//!
//! Walks ambient declarations (`declare ...` statements and `.d.ts` files)
//! and emits Closure externs: skeleton declarations whose JSDoc carries the
//! translated types. Namespace nesting collapses to dotted names. Duplicate
//! fully-qualified names across files keep the first definition; conflicts
//! are reported, not merged.

use crate::ast::*;
use crate::diagnostics::DiagnosticBag;
use crate::program::{CompilerHost, Program, ProgramFile};
use crate::type_translator::TypeTranslator;
use crate::jsdoc::{self, Tag};
use rustc_hash::FxHashSet;

/// Names already emitted across the whole run, keyed by fully-qualified
/// name. Shared by the pipeline across files.
#[derive(Debug, Default)]
pub struct ExternsSet {
    seen: FxHashSet<String>,
}

impl ExternsSet {
    pub fn new() -> Self {
        ExternsSet::default()
    }

    /// Returns true when `name` was not seen before and is now claimed.
    fn claim(&mut self, name: &str) -> bool {
        self.seen.insert(name.to_string())
    }
}

/// Generate the externs contribution of one file. Returns the externs text
/// (empty when the file declares nothing ambient).
pub fn generate_externs(
    program: &Program,
    host: &dyn CompilerHost,
    file: &ProgramFile,
    untyped: bool,
    verbose: bool,
    seen: &mut ExternsSet,
) -> (String, DiagnosticBag) {
    let mut generator = ExternsGenerator {
        translator: TypeTranslator::new(program, host, file, untyped, verbose),
        file,
        out: String::new(),
        diagnostics: DiagnosticBag::new(),
        seen,
    };

    let ambient_file = file.file.is_declaration_file;
    let statements: Vec<&Statement> = file.file.statements.iter().collect();
    for statement in statements {
        generator.visit_statement(statement, "", ambient_file);
    }

    let mut diagnostics = generator.diagnostics;
    diagnostics.absorb(generator.translator.take_diagnostics());
    let mut out = generator.out;
    if !out.is_empty() {
        out = format!(
            "// externs from {}:\n{}",
            file.file.file_name, out
        );
    }
    (out, diagnostics)
}

struct ExternsGenerator<'a> {
    translator: TypeTranslator<'a>,
    file: &'a ProgramFile,
    out: String,
    diagnostics: DiagnosticBag,
    seen: &'a mut ExternsSet,
}

impl<'a> ExternsGenerator<'a> {
    fn visit_statement(&mut self, statement: &Statement, prefix: &str, ambient: bool) {
        let declares = ambient
            || statement
                .modifiers()
                .map(|m| m.declare)
                .unwrap_or(false);
        match &statement.kind {
            StatementKind::Namespace(ns) if declares || ns.is_global => {
                self.emit_namespace(ns, prefix);
            }
            _ if !declares => {}
            StatementKind::Var(var) => self.emit_vars(var, prefix),
            StatementKind::Function(func) => self.emit_function(func, prefix),
            StatementKind::Class(class) => self.emit_class(class, prefix),
            StatementKind::Interface(interface) => self.emit_interface(interface, prefix),
            StatementKind::Enum(decl) => self.emit_enum(decl, prefix),
            StatementKind::TypeAlias(alias) => self.emit_type_alias(alias, prefix),
            _ => {}
        }
    }

    /// Claim a fully-qualified name; on conflict the first wins and a
    /// diagnostic is recorded.
    fn claim(&mut self, name: &str, span: crate::span::Span) -> bool {
        if self.seen.claim(name) {
            return true;
        }
        self.diagnostics.warning(
            self.file.file.file_name.as_str(),
            span,
            format!("duplicate externs declaration for '{}'; first wins", name),
        );
        false
    }

    fn qualified(&self, prefix: &str, name: &str) -> String {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        }
    }

    /// `var x;` at top level, `ns.x;` inside a namespace.
    fn emit_slot(&mut self, qualified: &str, tags: &[Tag]) {
        self.out.push_str(&jsdoc::to_string(tags));
        if qualified.contains('.') {
            self.out.push_str(&format!("{};\n", qualified));
        } else {
            self.out.push_str(&format!("var {};\n", qualified));
        }
    }

    fn emit_namespace(&mut self, ns: &NamespaceDecl, prefix: &str) {
        let mut current = prefix.to_string();
        if !ns.is_global {
            for part in &ns.name {
                current = self.qualified(&current, &part.text);
                if self.seen.claim(&current) {
                    self.out.push_str(&jsdoc::to_string(&[Tag::named("const")]));
                    if current.contains('.') {
                        self.out.push_str(&format!("{} = {{}};\n", current));
                    } else {
                        self.out.push_str(&format!("var {} = {{}};\n", current));
                    }
                }
            }
        }
        for inner in &ns.body {
            self.visit_statement(inner, &current, true);
        }
    }

    fn emit_vars(&mut self, var: &VarStatement, prefix: &str) {
        for decl in &var.declarations {
            if decl.name.text.is_empty() {
                continue;
            }
            let qualified = self.qualified(prefix, &decl.name.text);
            if !self.claim(&qualified, decl.name.span) {
                continue;
            }
            let translated = match &decl.type_node {
                Some(node) => self.translator.translate(node),
                None => "?".to_string(),
            };
            let tags = vec![Tag::with_type("type", translated)];
            self.emit_slot(&qualified, &tags);
        }
    }

    fn emit_function(&mut self, func: &FunctionDecl, prefix: &str) {
        if func.name.text.is_empty() {
            return;
        }
        let qualified = self.qualified(prefix, &func.name.text);
        if !self.claim(&qualified, func.name.span) {
            return;
        }
        self.translator
            .push_type_params(func.type_params.iter().map(|p| p.name.text.clone()));
        let tags = self.signature_tags(&func.type_params, &func.params, func.return_type.as_ref());
        self.translator.pop_type_params();

        self.out.push_str(&jsdoc::to_string(&tags));
        let params = param_names(&func.params);
        if qualified.contains('.') {
            self.out
                .push_str(&format!("{} = function({}) {{}};\n", qualified, params));
        } else {
            self.out
                .push_str(&format!("function {}({}) {{}}\n", qualified, params));
        }
    }

    fn emit_class(&mut self, class: &ClassDecl, prefix: &str) {
        let qualified = self.qualified(prefix, &class.name.text);
        if !self.claim(&qualified, class.name.span) {
            return;
        }
        self.translator
            .push_type_params(class.type_params.iter().map(|p| p.name.text.clone()));

        // Constructor skeleton.
        let ctor = class.members.iter().find_map(|member| match member {
            ClassMember::Constructor { params, .. } => Some(params.clone()),
            _ => None,
        });
        let ctor_params = ctor.clone().unwrap_or_default();
        let mut ctor_tags = vec![Tag::named("constructor")];
        if !class.type_params.is_empty() {
            ctor_tags.push(template_tag(&class.type_params));
        }
        ctor_tags.extend(self.param_tags(&ctor_params));
        self.out.push_str(&jsdoc::to_string(&ctor_tags));
        let params = param_names(&ctor_params);
        if qualified.contains('.') {
            self.out
                .push_str(&format!("{} = function({}) {{}};\n", qualified, params));
        } else {
            self.out
                .push_str(&format!("function {}({}) {{}}\n", qualified, params));
        }

        for member in &class.members {
            self.emit_class_member(&qualified, member);
        }
        self.translator.pop_type_params();
    }

    fn emit_class_member(&mut self, class_name: &str, member: &ClassMember) {
        match member {
            ClassMember::Property {
                modifiers,
                name,
                optional,
                type_node,
                ..
            } => {
                let Some(text) = name.as_static_name() else { return };
                let translated = if *optional {
                    self.translator
                        .translate_optional(type_node.as_ref(), member.span())
                } else {
                    match type_node {
                        Some(node) => self.translator.translate(node),
                        None => "?".to_string(),
                    }
                };
                let target = if modifiers.r#static {
                    format!("{}.{}", class_name, text)
                } else {
                    format!("{}.prototype.{}", class_name, text)
                };
                self.out
                    .push_str(&jsdoc::to_string(&[Tag::with_type("type", translated)]));
                self.out.push_str(&format!("{};\n", target));
            }
            ClassMember::Method {
                modifiers,
                name,
                params,
                return_type,
                ..
            } => {
                let Some(text) = name.as_static_name() else { return };
                let tags = self.signature_tags(&[], params, return_type.as_ref());
                let target = if modifiers.r#static {
                    format!("{}.{}", class_name, text)
                } else {
                    format!("{}.prototype.{}", class_name, text)
                };
                self.out.push_str(&jsdoc::to_string(&tags));
                self.out.push_str(&format!(
                    "{} = function({}) {{}};\n",
                    target,
                    param_names(params)
                ));
            }
            _ => {}
        }
    }

    fn emit_interface(&mut self, interface: &InterfaceDecl, prefix: &str) {
        let qualified = self.qualified(prefix, &interface.name.text);
        if !self.claim(&qualified, interface.name.span) {
            return;
        }
        self.translator
            .push_type_params(interface.type_params.iter().map(|p| p.name.text.clone()));

        let mut tags = vec![Tag::named("record")];
        if !interface.type_params.is_empty() {
            tags.push(template_tag(&interface.type_params));
        }
        for base in &interface.extends {
            let translated = self.translator.translate(base);
            if translated != "?" {
                tags.push(Tag::with_type(
                    "extends",
                    translated.trim_start_matches('!').to_string(),
                ));
            }
        }
        self.out.push_str(&jsdoc::to_string(&tags));
        if qualified.contains('.') {
            self.out
                .push_str(&format!("{} = function() {{}};\n", qualified));
        } else {
            self.out
                .push_str(&format!("function {}() {{}}\n", qualified));
        }

        for member in &interface.members {
            match member {
                TypeMember::Property {
                    name,
                    optional,
                    type_node,
                    ..
                } => {
                    let Some(text) = name.as_static_name() else { continue };
                    let translated = if *optional {
                        self.translator
                            .translate_optional(type_node.as_ref(), member.span())
                    } else {
                        match type_node {
                            Some(node) => self.translator.translate(node),
                            None => "?".to_string(),
                        }
                    };
                    self.out
                        .push_str(&jsdoc::to_string(&[Tag::with_type("type", translated)]));
                    self.out
                        .push_str(&format!("{}.prototype.{};\n", qualified, text));
                }
                TypeMember::Method {
                    name,
                    params,
                    return_type,
                    ..
                } => {
                    let Some(text) = name.as_static_name() else { continue };
                    let mut tags: Vec<Tag> = Vec::new();
                    for (idx, param) in params.iter().enumerate() {
                        let translated = match &param.type_node {
                            Some(node) => self.translator.translate(node),
                            None => "?".to_string(),
                        };
                        tags.push(Tag {
                            tag_name: "param".to_string(),
                            parameter_name: Some(
                                param.name.clone().unwrap_or_else(|| format!("p{}", idx)),
                            ),
                            type_expr: Some(translated),
                            text: None,
                        });
                    }
                    if let Some(return_type) = return_type {
                        let translated = self.translator.translate(return_type);
                        if translated != "void" {
                            tags.push(Tag::with_type("return", translated));
                        }
                    }
                    self.out.push_str(&jsdoc::to_string(&tags));
                    let names: Vec<String> = params
                        .iter()
                        .enumerate()
                        .map(|(idx, p)| p.name.clone().unwrap_or_else(|| format!("p{}", idx)))
                        .collect();
                    self.out.push_str(&format!(
                        "{}.prototype.{} = function({}) {{}};\n",
                        qualified,
                        text,
                        names.join(", ")
                    ));
                }
                _ => {}
            }
        }
        self.translator.pop_type_params();
    }

    fn emit_enum(&mut self, decl: &EnumDecl, prefix: &str) {
        let qualified = self.qualified(prefix, &decl.name.text);
        if !self.claim(&qualified, decl.name.span) {
            return;
        }
        let source = &self.file.file.text;
        let mut is_string = false;
        let mut next_value = 0i64;
        let mut fields: Vec<String> = Vec::new();
        for member in &decl.members {
            let Some(name) = member.name.as_static_name() else { continue };
            match member.initializer {
                Some(span) => {
                    let text = span.slice(source).trim();
                    if text.starts_with('\'') || text.starts_with('"') {
                        is_string = true;
                    }
                    fields.push(format!("{}: {}", name, text));
                    if let Ok(value) = text.parse::<i64>() {
                        next_value = value + 1;
                    }
                }
                None => {
                    fields.push(format!("{}: {}", name, next_value));
                    next_value += 1;
                }
            }
        }
        let value_type = if is_string { "string" } else { "number" };
        self.out
            .push_str(&jsdoc::to_string(&[Tag::with_type("enum", value_type)]));
        if qualified.contains('.') {
            self.out
                .push_str(&format!("{} = {{{}}};\n", qualified, fields.join(", ")));
        } else {
            self.out.push_str(&format!(
                "var {} = {{{}}};\n",
                qualified,
                fields.join(", ")
            ));
        }
    }

    fn emit_type_alias(&mut self, alias: &TypeAliasDecl, prefix: &str) {
        let qualified = self.qualified(prefix, &alias.name.text);
        if !self.claim(&qualified, alias.name.span) {
            return;
        }
        self.translator
            .push_type_params(alias.type_params.iter().map(|p| p.name.text.clone()));
        let translated = self
            .translator
            .translate_alias(&alias.name.text, &alias.type_node);
        self.translator.pop_type_params();
        let tags = vec![Tag::with_type("typedef", translated)];
        self.emit_slot(&qualified, &tags);
    }

    fn param_tags(&mut self, params: &[Param]) -> Vec<Tag> {
        let mut tags = Vec::new();
        for param in params {
            if param.name.text.is_empty() {
                continue;
            }
            let translated = if param.optional {
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
        if let Some(return_type) = return_type {
            let translated = self.translator.translate(return_type);
            if translated != "void" {
                tags.push(Tag::with_type("return", translated));
            }
        }
        tags
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

fn param_names(params: &[Param]) -> String {
    params
        .iter()
        .filter(|p| !p.name.text.is_empty())
        .map(|p| p.name.text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{InMemoryHost, Program};

    fn externs_for(files: &[(&str, &str)], entries: &[&str]) -> (String, DiagnosticBag) {
        let mut host = InMemoryHost::new();
        for (name, text) in files {
            host.add_file(*name, *text);
        }
        let roots: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
        let (program, _) = Program::parse(&host, &roots);
        let mut seen = ExternsSet::new();
        let mut out = String::new();
        let mut bag = DiagnosticBag::new();
        for entry in entries {
            let file = program.get_file(entry).unwrap();
            let (text, file_bag) = generate_externs(&program, &host, file, false, false, &mut seen);
            out.push_str(&text);
            bag.absorb(file_bag);
        }
        (out, bag)
    }

    #[test]
    fn test_declare_var() {
        let (out, _) = externs_for(&[("a.d.ts", "declare var DEBUG: boolean;")], &["a.d.ts"]);
        assert!(out.contains("// externs from a.d.ts:"));
        assert!(out.contains("/** @type {boolean} */\nvar DEBUG;"));
    }

    #[test]
    fn test_declare_function() {
        let (out, _) = externs_for(
            &[("a.d.ts", "declare function greet(name: string): void;")],
            &["a.d.ts"],
        );
        assert!(out.contains("@param {string} name"));
        assert!(out.contains("function greet(name) {}"));
    }

    #[test]
    fn test_dts_without_declare_keyword() {
        let (out, _) = externs_for(&[("lib.d.ts", "var VERSION: number;")], &["lib.d.ts"]);
        assert!(out.contains("/** @type {number} */\nvar VERSION;"));
    }

    #[test]
    fn test_namespace_collapses_to_dotted_names() {
        let source = "declare namespace ns1.ns2 { class C { m(x: number): void; } }";
        let (out, _) = externs_for(&[("a.d.ts", source)], &["a.d.ts"]);
        assert!(out.contains("var ns1 = {};"));
        assert!(out.contains("ns1.ns2 = {};"));
        assert!(out.contains("ns1.ns2.C = function() {};"));
        assert!(out.contains("ns1.ns2.C.prototype.m = function(x) {};"));
    }

    #[test]
    fn test_class_skeleton() {
        let source = "declare class Widget { width: number; resize(w: number): boolean; }";
        let (out, _) = externs_for(&[("w.d.ts", source)], &["w.d.ts"]);
        assert!(out.contains("/** @constructor */\nfunction Widget() {}"));
        assert!(out.contains("/** @type {number} */\nWidget.prototype.width;"));
        assert!(out.contains("Widget.prototype.resize = function(w) {};"));
    }

    #[test]
    fn test_interface_record() {
        let source = "interface Shape { area(): number; }";
        let (out, _) = externs_for(&[("s.d.ts", source)], &["s.d.ts"]);
        assert!(out.contains("/** @record */\nfunction Shape() {}"));
        assert!(out.contains("Shape.prototype.area = function() {};"));
    }

    #[test]
    fn test_enum_values() {
        let (out, _) = externs_for(&[("e.d.ts", "declare enum E { A, B = 5, C }")], &["e.d.ts"]);
        assert!(out.contains("/** @enum {number} */\nvar E = {A: 0, B: 5, C: 6};"));
    }

    #[test]
    fn test_duplicates_deduplicated_first_wins() {
        let (out, bag) = externs_for(
            &[
                ("a.d.ts", "declare var shared: number;"),
                ("b.d.ts", "declare var shared: string;"),
            ],
            &["a.d.ts", "b.d.ts"],
        );
        assert_eq!(out.matches("var shared;").count(), 1);
        assert!(out.contains("@type {number}"));
        assert!(bag.iter().any(|d| d.message.contains("duplicate")));
    }

    #[test]
    fn test_declare_global_block() {
        let source = "declare global { var injected: string; }";
        let (out, _) = externs_for(&[("g.ts", source)], &["g.ts"]);
        assert!(out.contains("/** @type {string} */\nvar injected;"));
    }

    #[test]
    fn test_non_ambient_code_ignored() {
        let (out, _) = externs_for(&[("a.ts", "var local = 1;\nclass C {}")], &["a.ts"]);
        assert!(out.is_empty());
    }
}
