//! Type Translator - TypeScript type syntax to Closure JSDoc type strings.
//!
//! Operates in two modes. In typed mode every annotation is translated as
//! precisely as the syntax and symbol tables allow; anything unresolvable
//! degrades to `?` with a warning recorded only when verbose. In untyped
//! mode every request returns `?`, so declarations are still typed slots,
//! just opaque ones.
//!
//! Translation is total: no input throws, and a recursion on a
//! self-referential alias is cut with `?` after one unfold.

use crate::ast::{ParamSig, TypeKeyword, TypeMember, TypeNode, TypeNodeKind};
use crate::binder::{symbol_flags, ImportedName, Symbol};
use crate::diagnostics::DiagnosticBag;
use crate::program::{resolve_specifier, CompilerHost, Program, ProgramFile};
use crate::span::Span;
use rustc_hash::FxHashSet;
use tracing::debug;

/// Global value types Closure knows without a local declaration.
const GLOBAL_VALUE_TYPES: &[&str] = &[
    "Array", "Date", "Error", "Function", "Map", "Object", "Promise", "RegExp", "Set", "WeakMap",
    "WeakSet",
];

/// Translates type syntax for one file of a program.
pub struct TypeTranslator<'a> {
    program: &'a Program,
    host: &'a dyn CompilerHost,
    file: &'a ProgramFile,
    untyped: bool,
    verbose: bool,
    diagnostics: DiagnosticBag,
    /// Currently-translating alias symbols, keyed `file#name`; re-entry
    /// yields `?` at the recursion point.
    translating: FxHashSet<String>,
    /// Type-parameter scopes, innermost last.
    type_param_scopes: Vec<FxHashSet<String>>,
    /// Local names of imports referenced in type position; the annotator
    /// uses this to keep their `goog.require` alive.
    referenced_imports: FxHashSet<String>,
}

impl<'a> TypeTranslator<'a> {
    pub fn new(
        program: &'a Program,
        host: &'a dyn CompilerHost,
        file: &'a ProgramFile,
        untyped: bool,
        verbose: bool,
    ) -> Self {
        TypeTranslator {
            program,
            host,
            file,
            untyped,
            verbose,
            diagnostics: DiagnosticBag::new(),
            translating: FxHashSet::default(),
            type_param_scopes: Vec::new(),
            referenced_imports: FxHashSet::default(),
        }
    }

    /// Push a type-parameter scope (class or function generics).
    pub fn push_type_params(&mut self, names: impl IntoIterator<Item = String>) {
        self.type_param_scopes.push(names.into_iter().collect());
    }

    pub fn pop_type_params(&mut self) {
        self.type_param_scopes.pop();
    }

    /// Drain warnings recorded so far.
    pub fn take_diagnostics(&mut self) -> DiagnosticBag {
        std::mem::take(&mut self.diagnostics)
    }

    /// Import bindings seen in type positions so far.
    pub fn referenced_imports(&self) -> &FxHashSet<String> {
        &self.referenced_imports
    }

    /// Translate a type annotation. Total: always returns a type string.
    pub fn translate(&mut self, node: &TypeNode) -> String {
        if self.untyped {
            return "?".to_string();
        }
        self.translate_inner(node, false)
    }

    /// Translate the body of a type alias declared in the current file.
    /// The alias's own name is marked as currently translating before the
    /// body is walked, so a self-reference inside it collapses to `?`
    /// after one unfold rather than two.
    pub fn translate_alias(&mut self, name: &str, node: &TypeNode) -> String {
        if self.untyped {
            return "?".to_string();
        }
        let key = format!("{}#{}", self.file.file.file_name, name);
        self.translating.insert(key.clone());
        let translated = self.translate_inner(node, false);
        self.translating.remove(&key);
        translated
    }

    /// Translate the declared type of an optional slot: `(T|undefined)`.
    pub fn translate_optional(&mut self, node: Option<&TypeNode>, span: Span) -> String {
        let inner = match node {
            Some(node) => self.translate(node),
            None => self.untranslatable(span, "missing type annotation"),
        };
        if inner == "?" {
            inner
        } else {
            format!("({}|undefined)", inner)
        }
    }

    fn warn(&mut self, span: Span, message: String) {
        debug!(file = %self.file.file.file_name, %message, "type translation degraded");
        if self.verbose {
            self.diagnostics
                .warning(self.file.file.file_name.as_str(), span, message);
        }
    }

    fn untranslatable(&mut self, span: Span, reason: &str) -> String {
        self.warn(span, format!("type translated as '?': {}", reason));
        "?".to_string()
    }

    fn translate_inner(&mut self, node: &TypeNode, foreign: bool) -> String {
        match &node.kind {
            TypeNodeKind::Keyword(keyword) => match keyword {
                TypeKeyword::Any | TypeKeyword::Unknown => "?".to_string(),
                TypeKeyword::Number => "number".to_string(),
                TypeKeyword::String => "string".to_string(),
                TypeKeyword::Boolean => "boolean".to_string(),
                TypeKeyword::Void => "void".to_string(),
                TypeKeyword::Null => "null".to_string(),
                TypeKeyword::Undefined => "undefined".to_string(),
                TypeKeyword::Never => self.untranslatable(node.span, "'never' has no Closure form"),
                TypeKeyword::Object => "!Object".to_string(),
                TypeKeyword::Symbol => "symbol".to_string(),
                TypeKeyword::BigInt => "bigint".to_string(),
            },
            TypeNodeKind::Literal { text } => {
                let first = text.chars().next().unwrap_or(' ');
                if first == '\'' || first == '"' || first == '`' {
                    "string".to_string()
                } else if text == "true" || text == "false" {
                    "boolean".to_string()
                } else {
                    "number".to_string()
                }
            }
            TypeNodeKind::Array(element) => {
                format!("!Array<{}>", self.translate_inner(element, foreign))
            }
            TypeNodeKind::Paren(inner) => self.translate_inner(inner, foreign),
            TypeNodeKind::Union(members) => {
                let mut parts: Vec<String> = Vec::with_capacity(members.len());
                for member in members {
                    let translated = self.translate_inner(member, foreign);
                    if translated == "?" {
                        // `any` swallows the union.
                        return "?".to_string();
                    }
                    if !parts.contains(&translated) {
                        parts.push(translated);
                    }
                }
                match parts.len() {
                    0 => "?".to_string(),
                    1 => parts.pop().unwrap_or_default(),
                    _ => format!("({})", parts.join("|")),
                }
            }
            TypeNodeKind::Intersection(_) => {
                self.untranslatable(node.span, "intersection types have no Closure form")
            }
            TypeNodeKind::Function {
                this_type,
                params,
                return_type,
            } => self.translate_function(this_type.as_deref(), params, return_type, foreign),
            TypeNodeKind::TypeLiteral(members) => self.translate_type_literal(node.span, members, foreign),
            TypeNodeKind::Tuple(_) => {
                self.warn(node.span, "tuple type widened to Array".to_string());
                "!Array<?>".to_string()
            }
            TypeNodeKind::TypeQuery(_) => {
                self.untranslatable(node.span, "'typeof' types are unsupported")
            }
            TypeNodeKind::Unsupported(span) => {
                self.untranslatable(*span, "unsupported type syntax")
            }
            TypeNodeKind::Reference { name, type_args } => {
                self.translate_reference(node.span, name, type_args, foreign)
            }
        }
    }

    fn translate_function(
        &mut self,
        this_type: Option<&TypeNode>,
        params: &[ParamSig],
        return_type: &TypeNode,
        foreign: bool,
    ) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(this_type) = this_type {
            parts.push(format!("this: {}", self.translate_inner(this_type, foreign)));
        }
        for param in params {
            parts.push(self.translate_param_sig(param, foreign));
        }
        format!(
            "function({}): {}",
            parts.join(", "),
            self.translate_inner(return_type, foreign)
        )
    }

    fn translate_param_sig(&mut self, param: &ParamSig, foreign: bool) -> String {
        let translated = match &param.type_node {
            Some(type_node) => self.translate_inner(type_node, foreign),
            None => "?".to_string(),
        };
        if param.rest {
            // Rest parameters are declared as arrays; Closure wants the
            // element type after the ellipsis.
            let element = match param.type_node.as_ref().map(|t| &t.kind) {
                Some(TypeNodeKind::Array(element)) => self.translate_inner(element, foreign),
                _ => "?".to_string(),
            };
            return format!("...{}", element);
        }
        if param.optional && translated != "?" {
            format!("({}|undefined)", translated)
        } else {
            translated
        }
    }

    fn translate_type_literal(
        &mut self,
        span: Span,
        members: &[TypeMember],
        foreign: bool,
    ) -> String {
        // An index signature alone becomes a Closure object map.
        if members.len() == 1 {
            if let TypeMember::Index {
                key_type,
                value_type,
                ..
            } = &members[0]
            {
                let key = key_type
                    .as_ref()
                    .map(|t| self.translate_inner(t, foreign))
                    .unwrap_or_else(|| "string".to_string());
                let value = value_type
                    .as_ref()
                    .map(|t| self.translate_inner(t, foreign))
                    .unwrap_or_else(|| "?".to_string());
                return format!("!Object<{},{}>", key, value);
            }
        }

        let mut fields: Vec<String> = Vec::new();
        for member in members {
            match member {
                TypeMember::Property {
                    name,
                    optional,
                    type_node,
                    ..
                } => {
                    let Some(field_name) = name.as_static_name() else {
                        return self.untranslatable(
                            member.span(),
                            "computed property in object type",
                        );
                    };
                    let field_type = if *optional {
                        self.translate_optional(type_node.as_ref(), member.span())
                    } else {
                        match type_node {
                            Some(type_node) => self.translate_inner(type_node, foreign),
                            None => "?".to_string(),
                        }
                    };
                    fields.push(format!("{}: {}", field_name, field_type));
                }
                TypeMember::Method {
                    name,
                    params,
                    return_type,
                    ..
                } => {
                    let Some(field_name) = name.as_static_name() else {
                        return self.untranslatable(member.span(), "computed method in object type");
                    };
                    let return_node;
                    let return_type = match return_type {
                        Some(node) => node,
                        None => {
                            return_node = TypeNode {
                                kind: TypeNodeKind::Keyword(TypeKeyword::Any),
                                span: member.span(),
                            };
                            &return_node
                        }
                    };
                    let translated =
                        self.translate_function(None, params, return_type, foreign);
                    fields.push(format!("{}: {}", field_name, translated));
                }
                TypeMember::Index { .. } => {
                    return self.untranslatable(
                        span,
                        "object type mixing index signature with properties",
                    );
                }
                TypeMember::Other(other_span) => {
                    return self.untranslatable(*other_span, "unsupported object-type member");
                }
            }
        }
        format!("{{{}}}", fields.join(", "))
    }

    fn translate_reference(
        &mut self,
        span: Span,
        name: &crate::ast::QualifiedName,
        type_args: &[TypeNode],
        foreign: bool,
    ) -> String {
        let head = &name.head().text;

        // In-scope generic parameter.
        if name.is_simple()
            && self
                .type_param_scopes
                .iter()
                .any(|scope| scope.contains(head))
        {
            return head.clone();
        }

        // A reference inside a type imported from another file would need
        // that file's scope; degrade rather than emit a dangling name.
        if foreign {
            return self.emit_global_or_degrade(span, name, type_args);
        }

        let Some(symbol) = self.file.bindings.get(head) else {
            return self.emit_global_or_degrade(span, name, type_args);
        };

        if symbol.has_any_flags(symbol_flags::IMPORT) {
            self.referenced_imports.insert(head.clone());
            return self.translate_imported_reference(span, symbol, name, type_args);
        }

        if !name.is_simple() {
            // Locally-declared namespace-qualified types are not modeled.
            return self.untranslatable(span, "namespace-qualified type reference");
        }

        let declaring_file: &str = self.file.file.file_name.as_str();
        let local_name = head.clone();
        self.emit_symbol_reference(span, symbol, &local_name, type_args, declaring_file)
    }

    /// Emit a reference to a symbol declared in the current file (or reached
    /// through an import, with `local_name` being the in-file identifier).
    fn emit_symbol_reference(
        &mut self,
        span: Span,
        symbol: &Symbol,
        local_name: &str,
        type_args: &[TypeNode],
        declaring_file: &str,
    ) -> String {
        if symbol.has_any_flags(symbol_flags::TYPE_ALIAS) {
            let key = format!("{}#{}", declaring_file, symbol.name);
            if self.translating.contains(&key) {
                // Deep recursion is replaced with `?` after one unfold.
                return "?".to_string();
            }
            let Some(alias_of) = symbol.alias_of.clone() else {
                return self.untranslatable(span, "alias with no target");
            };
            self.translating.insert(key.clone());
            let foreign = declaring_file != self.file.file.file_name;
            let translated = self.translate_inner(&alias_of, foreign);
            self.translating.remove(&key);
            return translated;
        }

        if symbol.has_any_flags(symbol_flags::ENUM) {
            return local_name.to_string();
        }

        if symbol.has_any_flags(symbol_flags::CLASS | symbol_flags::INTERFACE) {
            let args = self.translate_type_args(type_args);
            return format!("!{}{}", local_name, args);
        }

        self.untranslatable(
            span,
            &format!("'{}' is not usable as a type", local_name),
        )
    }

    fn translate_imported_reference(
        &mut self,
        span: Span,
        symbol: &Symbol,
        name: &crate::ast::QualifiedName,
        type_args: &[TypeNode],
    ) -> String {
        let program = self.program;
        let host = self.host;
        let Some(import) = symbol.import.clone() else {
            return self.untranslatable(span, "import binding without a target");
        };
        match &import.imported {
            ImportedName::Named(_) => {
                let resolved = program.resolve_import(host, &self.file.file.file_name, symbol);
                match resolved {
                    Some((target_file, target_symbol)) => {
                        let target_symbol = target_symbol.clone();
                        let declaring = target_file.file.file_name.clone();
                        let local_name = name.head().text.clone();
                        self.emit_symbol_reference(
                            span,
                            &target_symbol,
                            &local_name,
                            type_args,
                            &declaring,
                        )
                    }
                    None => self.untranslatable(span, "unresolved import in type position"),
                }
            }
            ImportedName::Namespace => {
                // `ns.Type`: resolve the member in the imported module.
                if name.parts.len() != 2 {
                    return self.untranslatable(span, "deep namespace-qualified type");
                }
                let member = name.parts[1].text.clone();
                let target_file = resolve_specifier(
                    host,
                    &self.file.file.file_name,
                    &import.specifier,
                )
                .and_then(|file_name| program.get_file(&file_name));
                let Some(target_file) = target_file else {
                    return self.untranslatable(span, "unresolved module in type position");
                };
                let Some(target_symbol) = target_file.bindings.get(&member) else {
                    return self.untranslatable(
                        span,
                        &format!("'{}' not found in imported module", member),
                    );
                };
                let target_symbol = target_symbol.clone();
                let declaring = target_file.file.file_name.clone();
                let qualified = format!("{}.{}", name.head().text, member);
                self.emit_symbol_reference(span, &target_symbol, &qualified, type_args, &declaring)
            }
            ImportedName::Default => {
                self.untranslatable(span, "default imports are opaque in type position")
            }
        }
    }

    fn emit_global_or_degrade(
        &mut self,
        span: Span,
        name: &crate::ast::QualifiedName,
        type_args: &[TypeNode],
    ) -> String {
        let text = name.text();
        if name.is_simple() && GLOBAL_VALUE_TYPES.contains(&text.as_str()) {
            let args = self.translate_type_args(type_args);
            return format!("!{}{}", text, args);
        }
        self.untranslatable(span, &format!("could not resolve type '{}'", text))
    }

    fn translate_type_args(&mut self, type_args: &[TypeNode]) -> String {
        if type_args.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = type_args
            .iter()
            .map(|arg| self.translate_inner(arg, false))
            .collect();
        format!("<{}>", parts.join(", "))
    }
}

#[cfg(test)]
#[path = "type_translator_tests.rs"]
mod type_translator_tests;
