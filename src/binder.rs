//! Binder: per-file symbol tables.
//!
//! The binder walks a parsed [`SourceFile`] and records one symbol per
//! declared name, including import bindings. Cross-file resolution (following
//! an import to its declaration in another file) lives in [`crate::program`];
//! the binder itself is strictly per-file.

use crate::ast::*;
use crate::span::Span;
use rustc_hash::FxHashMap;

// =============================================================================
// Symbol Flags
// =============================================================================

/// Flags describing the kind of a symbol. A merged symbol (interface +
/// namespace, function overloads) carries the union of its declaration kinds.
pub mod symbol_flags {
    pub const NONE: u32 = 0;
    pub const VARIABLE: u32 = 1 << 0;
    pub const FUNCTION: u32 = 1 << 1;
    pub const CLASS: u32 = 1 << 2;
    pub const INTERFACE: u32 = 1 << 3;
    pub const REGULAR_ENUM: u32 = 1 << 4;
    pub const CONST_ENUM: u32 = 1 << 5;
    pub const TYPE_ALIAS: u32 = 1 << 6;
    pub const NAMESPACE: u32 = 1 << 7;
    pub const IMPORT: u32 = 1 << 8;

    pub const ENUM: u32 = REGULAR_ENUM | CONST_ENUM;
    /// Symbols that exist as runtime values in the emitted JavaScript.
    /// Interfaces count: the annotator synthesizes their value witness.
    pub const VALUE: u32 = VARIABLE | FUNCTION | CLASS | ENUM | NAMESPACE | INTERFACE;
    /// Symbols usable in type positions.
    pub const TYPE: u32 = CLASS | INTERFACE | ENUM | TYPE_ALIAS;
}

// =============================================================================
// Symbols
// =============================================================================

/// What an import binding refers to in its source module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
}

/// The target of an import binding.
#[derive(Clone, Debug)]
pub struct ImportTarget {
    pub specifier: String,
    pub imported: ImportedName,
    pub is_type_only: bool,
}

/// A bound symbol.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub flags: u32,
    /// Span of the declared name.
    pub span: Span,
    pub exported: bool,
    /// Leading JSDoc text of the declaration, when present.
    pub jsdoc: Option<String>,
    /// Set when this symbol is an import binding.
    pub import: Option<ImportTarget>,
    /// For type aliases: the aliased type syntax.
    pub alias_of: Option<TypeNode>,
}

impl Symbol {
    pub fn has_any_flags(&self, flags: u32) -> bool {
        self.flags & flags != 0
    }

    /// Whether this symbol's JSDoc carries the `@Annotation` marker.
    pub fn is_annotation_marked(&self) -> bool {
        self.jsdoc
            .as_deref()
            .map(|doc| doc.contains("@Annotation"))
            .unwrap_or(false)
    }
}

// =============================================================================
// FileBindings
// =============================================================================

/// The symbol table of one file.
#[derive(Debug, Default)]
pub struct FileBindings {
    symbols: Vec<Symbol>,
    by_name: FxHashMap<String, usize>,
    /// Re-export statements: `export { a } from 'x'` and `export * from 'x'`.
    pub reexports: Vec<ReExport>,
}

/// One `export ... from` clause.
#[derive(Clone, Debug)]
pub struct ReExport {
    pub specifier: String,
    pub is_star: bool,
    pub is_type_only: bool,
    /// `(exported name, name in source module)` pairs for named re-exports.
    pub names: Vec<(String, String)>,
}

impl FileBindings {
    /// Look up a symbol by its local name.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).map(|&idx| &self.symbols[idx])
    }

    /// Iterate all symbols in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    fn add(&mut self, symbol: Symbol) {
        if let Some(&idx) = self.by_name.get(&symbol.name) {
            // Declaration merging: overloads, interface + namespace, etc.
            let existing = &mut self.symbols[idx];
            existing.flags |= symbol.flags;
            existing.exported |= symbol.exported;
            if existing.jsdoc.is_none() {
                existing.jsdoc = symbol.jsdoc;
            }
            if existing.alias_of.is_none() {
                existing.alias_of = symbol.alias_of;
            }
            return;
        }
        self.by_name.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
    }
}

// =============================================================================
// Binding
// =============================================================================

/// Bind one source file into its symbol table.
pub fn bind_source_file(file: &SourceFile) -> FileBindings {
    let mut bindings = FileBindings::default();
    bind_statements(&mut bindings, &file.statements, &file.text, false);
    bindings
}

fn bind_statements(
    bindings: &mut FileBindings,
    statements: &[Statement],
    source: &str,
    ambient: bool,
) {
    for statement in statements {
        let jsdoc = statement
            .jsdoc_span()
            .map(|span| span.slice(source).to_string());
        match &statement.kind {
            StatementKind::Import(import) => bind_import(bindings, import),
            StatementKind::Export(export) => {
                if let Some(specifier) = &export.specifier {
                    bindings.reexports.push(ReExport {
                        specifier: specifier.clone(),
                        is_star: export.is_star,
                        is_type_only: export.is_type_only,
                        names: export
                            .named
                            .iter()
                            .map(|spec| {
                                let source_name = spec
                                    .property_name
                                    .as_ref()
                                    .unwrap_or(&spec.name)
                                    .text
                                    .clone();
                                (spec.name.text.clone(), source_name)
                            })
                            .collect(),
                    });
                }
            }
            StatementKind::Var(var) => {
                for decl in &var.declarations {
                    if decl.name.text.is_empty() {
                        continue;
                    }
                    bindings.add(Symbol {
                        name: decl.name.text.clone(),
                        flags: symbol_flags::VARIABLE,
                        span: decl.name.span,
                        exported: var.modifiers.export || ambient,
                        jsdoc: jsdoc.clone(),
                        import: None,
                        alias_of: None,
                    });
                }
            }
            StatementKind::Function(func) => {
                if func.name.text.is_empty() {
                    continue;
                }
                bindings.add(Symbol {
                    name: func.name.text.clone(),
                    flags: symbol_flags::FUNCTION,
                    span: func.name.span,
                    exported: func.modifiers.export || ambient,
                    jsdoc: jsdoc.clone(),
                    import: None,
                    alias_of: None,
                });
            }
            StatementKind::Class(class) => {
                if class.name.text.is_empty() {
                    continue;
                }
                bindings.add(Symbol {
                    name: class.name.text.clone(),
                    flags: symbol_flags::CLASS,
                    span: class.name.span,
                    exported: class.modifiers.export || ambient,
                    jsdoc: jsdoc.clone(),
                    import: None,
                    alias_of: None,
                });
            }
            StatementKind::Interface(interface) => {
                bindings.add(Symbol {
                    name: interface.name.text.clone(),
                    flags: symbol_flags::INTERFACE,
                    span: interface.name.span,
                    exported: interface.modifiers.export || ambient,
                    jsdoc: jsdoc.clone(),
                    import: None,
                    alias_of: None,
                });
            }
            StatementKind::Enum(decl) => {
                bindings.add(Symbol {
                    name: decl.name.text.clone(),
                    flags: if decl.is_const {
                        symbol_flags::CONST_ENUM
                    } else {
                        symbol_flags::REGULAR_ENUM
                    },
                    span: decl.name.span,
                    exported: decl.modifiers.export || ambient,
                    jsdoc: jsdoc.clone(),
                    import: None,
                    alias_of: None,
                });
            }
            StatementKind::TypeAlias(alias) => {
                bindings.add(Symbol {
                    name: alias.name.text.clone(),
                    flags: symbol_flags::TYPE_ALIAS,
                    span: alias.name.span,
                    exported: alias.modifiers.export || ambient,
                    jsdoc: jsdoc.clone(),
                    import: None,
                    alias_of: Some(alias.type_node.clone()),
                });
            }
            StatementKind::Namespace(ns) => {
                if let Some(first) = ns.name.first() {
                    bindings.add(Symbol {
                        name: first.text.clone(),
                        flags: symbol_flags::NAMESPACE,
                        span: first.span,
                        exported: ns.modifiers.export || ambient,
                        jsdoc: jsdoc.clone(),
                        import: None,
                        alias_of: None,
                    });
                }
                // Global augmentations contribute to the file's own scope
                // only through the externs pass; namespace bodies are not
                // flattened into the file scope.
            }
            StatementKind::Other(_) => {}
        }
    }
}

fn bind_import(bindings: &mut FileBindings, import: &ImportDecl) {
    if let Some(default_binding) = &import.default_binding {
        bindings.add(Symbol {
            name: default_binding.text.clone(),
            flags: symbol_flags::IMPORT,
            span: default_binding.span,
            exported: false,
            jsdoc: None,
            import: Some(ImportTarget {
                specifier: import.specifier.clone(),
                imported: ImportedName::Default,
                is_type_only: import.is_type_only,
            }),
            alias_of: None,
        });
    }
    if let Some(namespace_binding) = &import.namespace_binding {
        bindings.add(Symbol {
            name: namespace_binding.text.clone(),
            flags: symbol_flags::IMPORT,
            span: namespace_binding.span,
            exported: false,
            jsdoc: None,
            import: Some(ImportTarget {
                specifier: import.specifier.clone(),
                imported: ImportedName::Namespace,
                is_type_only: import.is_type_only,
            }),
            alias_of: None,
        });
    }
    for spec in &import.named {
        let imported = spec
            .property_name
            .as_ref()
            .unwrap_or(&spec.name)
            .text
            .clone();
        bindings.add(Symbol {
            name: spec.name.text.clone(),
            flags: symbol_flags::IMPORT,
            span: spec.name.span,
            exported: false,
            jsdoc: None,
            import: Some(ImportTarget {
                specifier: import.specifier.clone(),
                imported: ImportedName::Named(imported),
                is_type_only: import.is_type_only || spec.is_type_only,
            }),
            alias_of: None,
        });
    }
}
