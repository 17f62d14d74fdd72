//! CommonJS emitter: the host compiler's emit step.
//!
//! Lowers a (possibly annotated) TypeScript source file to CommonJS
//! JavaScript: type syntax is erased, `import`/`export` statements become
//! `require()` calls and `exports.X` assignments, enums become object
//! literals, and interfaces and type aliases vanish. Comments between
//! statements (including the JSDoc the annotator inserted) ride along
//! verbatim. The output shapes are exactly the ones the `goog.module`
//! converter pattern-matches.

use crate::ast::*;
use crate::span::Span;

/// TypeScript's `__decorate` helper, emitted when runtime decorators
/// survive to the JavaScript output.
const DECORATE_HELPER: &str = "var __decorate = (this && this.__decorate) || function (decorators, target, key, desc) {\n    return Reflect.decorate(decorators, target, key, desc);\n};\n";

/// The `export *` helper in the exact shape the converter recognizes.
const EXPORT_STAR_HELPER: &str = "function __export(m) {\n    for (var p in m) if (!exports.hasOwnProperty(p)) exports[p] = m[p];\n}\n";

/// Emit one file as CommonJS JavaScript.
///
/// `type_only_reexports` names re-exported symbols that have no runtime
/// value; their `exports` assignments are suppressed (the module converter
/// emits `@typedef` aliases for them instead).
pub fn emit_commonjs(file: &SourceFile, type_only_reexports: &[String]) -> String {
    let mut emitter = Emitter {
        source: &file.text,
        module_counter: 0,
        needs_decorate_helper: false,
        needs_export_star_helper: false,
        type_only_reexports,
    };

    let mut body = String::with_capacity(file.text.len());
    let mut cursor = 0usize;
    for statement in &file.statements {
        let start = statement.span.start as usize;
        if start > cursor {
            body.push_str(&file.text[cursor..start]);
        }
        emitter.emit_statement(statement, &mut body, None);
        cursor = (statement.span.end as usize).max(cursor);
    }
    if cursor < file.text.len() {
        body.push_str(&file.text[cursor..]);
    }

    let is_module = file.statements.iter().any(|statement| {
        matches!(
            statement.kind,
            StatementKind::Import(_) | StatementKind::Export(_)
        ) || statement.modifiers().map(|m| m.export).unwrap_or(false)
    });

    let mut out = String::with_capacity(body.len() + 128);
    out.push_str("\"use strict\";\n");
    if is_module {
        out.push_str("Object.defineProperty(exports, \"__esModule\", { value: true });\n");
    }
    if emitter.needs_decorate_helper {
        out.push_str(DECORATE_HELPER);
    }
    if emitter.needs_export_star_helper {
        out.push_str(EXPORT_STAR_HELPER);
    }
    out.push_str(&body);
    out
}

/// Output file name for an input: `.ts` becomes `.js`.
pub fn output_file_name(input: &str) -> String {
    if let Some(stripped) = input.strip_suffix(".tsx") {
        return format!("{}.js", stripped);
    }
    if let Some(stripped) = input.strip_suffix(".ts") {
        return format!("{}.js", stripped);
    }
    format!("{}.js", input)
}

struct Emitter<'a> {
    source: &'a str,
    module_counter: u32,
    needs_decorate_helper: bool,
    needs_export_star_helper: bool,
    type_only_reexports: &'a [String],
}

impl<'a> Emitter<'a> {
    fn next_module_var(&mut self, specifier: &str) -> String {
        self.module_counter += 1;
        format!("{}_{}", sanitize_module_name(specifier), self.module_counter)
    }

    fn slice(&self, span: Span) -> &'a str {
        span.slice(self.source)
    }

    /// `export_target`: `None` at module scope (`exports.X`), the namespace
    /// binding inside a namespace body.
    fn emit_statement(&mut self, statement: &Statement, out: &mut String, export_target: Option<&str>) {
        match &statement.kind {
            StatementKind::Import(import) => self.emit_import(import, out),
            StatementKind::Export(export) => self.emit_export(export, out),
            StatementKind::Var(var) => self.emit_var(var, out, export_target),
            StatementKind::Function(func) => self.emit_function(func, out, export_target),
            StatementKind::Class(class) => self.emit_class(class, out, export_target),
            StatementKind::Enum(decl) => self.emit_enum(decl, out, export_target),
            StatementKind::Namespace(ns) => self.emit_namespace(ns, out, export_target),
            // Interfaces and type aliases are erased.
            StatementKind::Interface(_) | StatementKind::TypeAlias(_) => {}
            StatementKind::Other(span) => {
                out.push_str(self.slice(*span));
                out.push('\n');
            }
        }
    }

    // =========================================================================
    // Modules
    // =========================================================================

    fn emit_import(&mut self, import: &ImportDecl, out: &mut String) {
        if import.is_side_effect_only() {
            out.push_str(&format!("require(\"{}\");\n", import.specifier));
            return;
        }
        // The require itself is always emitted, even for type-only imports,
        // so the goog.require the converter produces stays live.
        let module_var = self.next_module_var(&import.specifier);
        out.push_str(&format!(
            "var {} = require(\"{}\");\n",
            module_var, import.specifier
        ));
        if let Some(default_binding) = &import.default_binding {
            out.push_str(&format!(
                "var {} = {}.default;\n",
                default_binding.text, module_var
            ));
        }
        if let Some(namespace_binding) = &import.namespace_binding {
            out.push_str(&format!("var {} = {};\n", namespace_binding.text, module_var));
        }
        for spec in &import.named {
            if spec.is_type_only && !import.is_type_only {
                continue;
            }
            let imported = spec.property_name.as_ref().unwrap_or(&spec.name);
            out.push_str(&format!(
                "var {} = {}.{};\n",
                spec.name.text, module_var, imported.text
            ));
        }
    }

    fn emit_export(&mut self, export: &ExportDecl, out: &mut String) {
        if export.is_type_only {
            return;
        }
        match &export.specifier {
            Some(specifier) if export.is_star => {
                self.needs_export_star_helper = true;
                out.push_str(&format!("__export(require(\"{}\"));\n", specifier));
            }
            Some(specifier) => {
                let module_var = self.next_module_var(specifier);
                out.push_str(&format!(
                    "var {} = require(\"{}\");\n",
                    module_var, specifier
                ));
                for spec in &export.named {
                    if spec.is_type_only || self.type_only_reexports.contains(&spec.name.text) {
                        continue;
                    }
                    let source_name = spec.property_name.as_ref().unwrap_or(&spec.name);
                    out.push_str(&format!(
                        "exports.{} = {}.{};\n",
                        spec.name.text, module_var, source_name.text
                    ));
                }
            }
            None => {
                for spec in &export.named {
                    if spec.is_type_only {
                        continue;
                    }
                    let local = spec.property_name.as_ref().unwrap_or(&spec.name);
                    out.push_str(&format!(
                        "exports.{} = {};\n",
                        spec.name.text, local.text
                    ));
                }
            }
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn emit_var(&mut self, var: &VarStatement, out: &mut String, export_target: Option<&str>) {
        if var.modifiers.declare {
            return;
        }
        let mut pieces: Vec<String> = Vec::new();
        for decl in &var.declarations {
            let mut piece = decl.name.text.clone();
            if piece.is_empty() {
                piece = self.slice(decl.name.span).to_string();
            }
            if let Some(init) = decl.initializer {
                piece.push_str(" = ");
                piece.push_str(self.slice(init));
            }
            pieces.push(piece);
        }
        out.push_str(&format!("{} {};\n", var.kind.keyword(), pieces.join(", ")));
        if var.modifiers.export {
            for decl in &var.declarations {
                if !decl.name.text.is_empty() {
                    out.push_str(&self.export_assignment(&decl.name.text, export_target));
                }
            }
        }
    }

    fn emit_function(&mut self, func: &FunctionDecl, out: &mut String, export_target: Option<&str>) {
        if func.modifiers.declare {
            return;
        }
        let Some(body) = func.body else {
            // Overload signature.
            return;
        };
        let asterisk = if func.is_generator { "*" } else { "" };
        let keyword = if func.is_async {
            "async function"
        } else {
            "function"
        };
        out.push_str(&format!(
            "{}{} {}({}) {}\n",
            keyword,
            asterisk,
            func.name.text,
            self.render_params(&func.params),
            self.slice(body)
        ));
        if func.modifiers.export {
            let exported = if func.modifiers.default {
                "default"
            } else {
                func.name.text.as_str()
            };
            out.push_str(&self.export_assignment_named(exported, &func.name.text, export_target));
        }
    }

    fn emit_class(&mut self, class: &ClassDecl, out: &mut String, export_target: Option<&str>) {
        if class.modifiers.declare {
            return;
        }
        let name = &class.name.text;
        out.push_str(&format!("class {}", name));
        if let Some(extends) = class.extends {
            out.push_str(&format!(" extends {}", self.slice(extends).trim()));
        }
        out.push_str(" {");

        // Copy inter-member trivia (JSDoc from the annotator included).
        let mut cursor = (class.open_brace + 1) as usize;
        for member in &class.members {
            let start = member.span().start as usize;
            if start > cursor {
                out.push_str(&self.source[cursor..start]);
            }
            self.emit_member(name, member, out);
            cursor = (member.span().end as usize).max(cursor);
        }
        let close = class.close_brace as usize;
        if close > cursor {
            out.push_str(&self.source[cursor..close]);
        }
        out.push_str("}\n");

        // Runtime decorators that survived downleveling.
        for member in &class.members {
            let decorators = member.decorators();
            if decorators.is_empty() {
                continue;
            }
            if let Some(member_name) = member_static_name(member) {
                self.needs_decorate_helper = true;
                let list = decorators
                    .iter()
                    .map(|d| self.decorator_expression(d))
                    .collect::<Vec<_>>()
                    .join(", ");
                let is_static = match member {
                    ClassMember::Method { modifiers, .. }
                    | ClassMember::Property { modifiers, .. } => modifiers.r#static,
                    _ => false,
                };
                let target = if is_static {
                    name.clone()
                } else {
                    format!("{}.prototype", name)
                };
                out.push_str(&format!(
                    "__decorate([{}], {}, \"{}\", null);\n",
                    list, target, member_name
                ));
            }
        }
        if !class.decorators.is_empty() {
            self.needs_decorate_helper = true;
            let list = class
                .decorators
                .iter()
                .map(|d| self.decorator_expression(d))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("{} = __decorate([{}], {});\n", name, list, name));
        }

        if class.modifiers.export {
            let exported = if class.modifiers.default {
                "default"
            } else {
                name.as_str()
            };
            out.push_str(&self.export_assignment_named(exported, name, export_target));
        }
    }

    fn emit_member(&mut self, _class_name: &str, member: &ClassMember, out: &mut String) {
        match member {
            ClassMember::Constructor { params, body, .. } => {
                let Some(body) = body else { return };
                out.push_str(&format!("constructor({}) ", self.render_params(params)));
                // Parameter properties are assigned at the top of the body.
                let assignments: Vec<String> = params
                    .iter()
                    .filter(|p| p.modifiers.is_parameter_property() && !p.name.text.is_empty())
                    .map(|p| format!("this.{} = {};", p.name.text, p.name.text))
                    .collect();
                if assignments.is_empty() {
                    out.push_str(self.slice(*body));
                } else {
                    let body_text = self.slice(*body);
                    out.push('{');
                    for assignment in &assignments {
                        out.push('\n');
                        out.push_str(assignment);
                    }
                    out.push_str(&body_text[1..]);
                }
                out.push('\n');
            }
            ClassMember::Method {
                modifiers,
                name,
                is_accessor,
                is_async,
                is_generator,
                params,
                body,
                ..
            } => {
                let Some(body) = body else { return };
                let Some(member_name) = name.as_static_name() else {
                    // Computed names are re-emitted verbatim.
                    out.push_str(self.slice(name.span()));
                    out.push_str(&format!("({}) {}\n", self.render_params(params), self.slice(*body)));
                    return;
                };
                let mut header = String::new();
                if modifiers.r#static {
                    header.push_str("static ");
                }
                if *is_async {
                    header.push_str("async ");
                }
                if *is_generator {
                    header.push('*');
                }
                match is_accessor {
                    Some(AccessorKind::Get) => header.push_str("get "),
                    Some(AccessorKind::Set) => header.push_str("set "),
                    None => {}
                }
                out.push_str(&format!(
                    "{}{}({}) {}\n",
                    header,
                    member_name,
                    self.render_params(params),
                    self.slice(*body)
                ));
            }
            ClassMember::Property {
                modifiers,
                name,
                initializer,
                ..
            } => {
                if modifiers.declare || modifiers.r#abstract {
                    return;
                }
                let Some(member_name) = name.as_static_name() else {
                    return;
                };
                let prefix = if modifiers.r#static { "static " } else { "" };
                match initializer {
                    Some(init) => out.push_str(&format!(
                        "{}{} = {};\n",
                        prefix,
                        member_name,
                        self.slice(*init)
                    )),
                    None => out.push_str(&format!("{}{};\n", prefix, member_name)),
                }
            }
            // Index signatures and other type-only members are erased.
            ClassMember::Other(_) => {}
        }
    }

    fn emit_enum(&mut self, decl: &EnumDecl, out: &mut String, export_target: Option<&str>) {
        if decl.modifiers.declare {
            return;
        }
        let mut next_value = 0i64;
        let mut fields: Vec<String> = Vec::new();
        for member in &decl.members {
            let Some(name) = member.name.as_static_name() else {
                continue;
            };
            match member.initializer {
                Some(span) => {
                    let text = self.slice(span).trim();
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
        out.push_str(&format!(
            "var {} = {{ {} }};\n",
            decl.name.text,
            fields.join(", ")
        ));
        if decl.modifiers.export {
            out.push_str(&self.export_assignment(&decl.name.text, export_target));
        }
    }

    fn emit_namespace(&mut self, ns: &NamespaceDecl, out: &mut String, export_target: Option<&str>) {
        if ns.modifiers.declare || ns.is_global || ns.name.is_empty() {
            return;
        }
        let name = &ns.name[0].text;
        out.push_str(&format!("var {};\n(function ({}) {{\n", name, name));
        let mut cursor: Option<usize> = None;
        for inner in &ns.body {
            if let Some(prev_end) = cursor {
                let start = inner.span.start as usize;
                if start > prev_end {
                    out.push_str(&self.source[prev_end..start]);
                }
            }
            self.emit_statement(inner, out, Some(name));
            cursor = Some(inner.span.end as usize);
        }
        out.push_str(&format!("}})({} || ({} = {{}}));\n", name, name));
        if ns.modifiers.export {
            out.push_str(&self.export_assignment(name, export_target));
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn render_params(&self, params: &[Param]) -> String {
        let mut pieces: Vec<String> = Vec::new();
        for param in params {
            let mut piece = String::new();
            if param.rest {
                piece.push_str("...");
            }
            if param.name.text.is_empty() {
                // Destructuring pattern, kept verbatim.
                piece.push_str(self.slice(param.name.span));
            } else {
                piece.push_str(&param.name.text);
            }
            if let Some(init) = param.initializer {
                piece.push_str(" = ");
                piece.push_str(self.slice(init));
            }
            pieces.push(piece);
        }
        pieces.join(", ")
    }

    fn decorator_expression(&self, decorator: &Decorator) -> String {
        // The decorator expression without the `@`.
        let text = self.slice(decorator.span);
        text.strip_prefix('@').unwrap_or(text).to_string()
    }

    fn export_assignment(&self, name: &str, export_target: Option<&str>) -> String {
        self.export_assignment_named(name, name, export_target)
    }

    fn export_assignment_named(
        &self,
        exported: &str,
        local: &str,
        export_target: Option<&str>,
    ) -> String {
        match export_target {
            Some(namespace) => format!("{}.{} = {};\n", namespace, exported, local),
            None => format!("exports.{} = {};\n", exported, local),
        }
    }
}

/// The plain name of a decorated member, when it has one.
fn member_static_name(member: &ClassMember) -> Option<&str> {
    match member {
        ClassMember::Method { name, .. } | ClassMember::Property { name, .. } => {
            name.as_static_name()
        }
        _ => None,
    }
}

/// Sanitize a module specifier for use in a generated variable name.
pub fn sanitize_module_name(specifier: &str) -> String {
    let trimmed = specifier
        .trim_start_matches("./")
        .trim_start_matches("../");
    let mut out: String = trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(true)
    {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod emitter_tests;
