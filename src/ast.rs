//! AST for the TypeScript subset the translation passes consume.
//!
//! The tree is declaration-precise and expression-lenient: imports, exports,
//! classes, interfaces, enums, type aliases, functions, and variable
//! statements are fully structured, while expression and statement bodies
//! are kept as raw spans for the rewriter to copy verbatim. Type annotation
//! syntax is structured so the type translator can walk it.

use crate::span::{Span, Spanned};

// =============================================================================
// Identifiers and names
// =============================================================================

/// An identifier with its source span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Spanned for Ident {
    fn span(&self) -> Span {
        self.span
    }
}

/// A dotted name such as `ns.Inner.Type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifiedName {
    pub parts: Vec<Ident>,
}

impl QualifiedName {
    pub fn span(&self) -> Span {
        match (self.parts.first(), self.parts.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::dummy(),
        }
    }

    /// The dotted text of the name.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The leading identifier.
    pub fn head(&self) -> &Ident {
        &self.parts[0]
    }

    pub fn is_simple(&self) -> bool {
        self.parts.len() == 1
    }
}

/// A class member or interface member name.
#[derive(Clone, Debug)]
pub enum PropertyName {
    Ident(Ident),
    /// Quoted name; `text` is the unquoted value.
    StringLiteral { text: String, span: Span },
    NumericLiteral { text: String, span: Span },
    /// `[expr]`; the span covers the brackets.
    Computed(Span),
}

impl PropertyName {
    pub fn span(&self) -> Span {
        match self {
            PropertyName::Ident(ident) => ident.span,
            PropertyName::StringLiteral { span, .. } => *span,
            PropertyName::NumericLiteral { span, .. } => *span,
            PropertyName::Computed(span) => *span,
        }
    }

    /// The plain name, if this is not a computed name.
    pub fn as_static_name(&self) -> Option<&str> {
        match self {
            PropertyName::Ident(ident) => Some(&ident.text),
            PropertyName::StringLiteral { text, .. } => Some(text),
            PropertyName::NumericLiteral { text, .. } => Some(text),
            PropertyName::Computed(_) => None,
        }
    }
}

// =============================================================================
// Modifiers and decorators
// =============================================================================

/// Declaration modifiers, collected into one struct rather than a node list.
#[derive(Clone, Copy, Debug, Default)]
pub struct Modifiers {
    pub export: bool,
    pub default: bool,
    pub declare: bool,
    pub r#abstract: bool,
    pub r#static: bool,
    pub readonly: bool,
    pub private: bool,
    pub protected: bool,
    pub public: bool,
    /// Span covering all modifier keywords, when any are present.
    pub span: Span,
}

impl Modifiers {
    pub fn has_visibility(&self) -> bool {
        self.private || self.protected || self.public
    }

    /// Whether this parameter modifier set declares a constructor property.
    pub fn is_parameter_property(&self) -> bool {
        self.has_visibility() || self.readonly
    }
}

/// A decorator application `@expr` or `@expr(args)`.
#[derive(Clone, Debug)]
pub struct Decorator {
    /// Span of the whole decorator including `@`.
    pub span: Span,
    /// The decorated expression's head name (`Component` in `@ng.Component(...)`
    /// the head is `ng`).
    pub name: QualifiedName,
    /// Spans of the call arguments, when the decorator is a call.
    /// `None` means a bare reference; `Some(vec![])` a zero-argument call.
    pub args: Option<Vec<Span>>,
}

// =============================================================================
// Type syntax
// =============================================================================

/// Built-in keyword types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKeyword {
    Any,
    Unknown,
    Number,
    String,
    Boolean,
    Void,
    Null,
    Undefined,
    Never,
    Object,
    Symbol,
    BigInt,
}

/// A parameter inside a function type.
#[derive(Clone, Debug)]
pub struct ParamSig {
    pub name: Option<String>,
    pub optional: bool,
    pub rest: bool,
    pub type_node: Option<TypeNode>,
}

/// A member of a type literal or interface body.
#[derive(Clone, Debug)]
pub enum TypeMember {
    Property {
        name: PropertyName,
        optional: bool,
        readonly: bool,
        type_node: Option<TypeNode>,
        span: Span,
    },
    Method {
        name: PropertyName,
        optional: bool,
        params: Vec<ParamSig>,
        return_type: Option<TypeNode>,
        span: Span,
    },
    /// `[key: string]: T`
    Index {
        key_type: Option<TypeNode>,
        value_type: Option<TypeNode>,
        span: Span,
    },
    /// Call or construct signatures and anything else we pass through.
    Other(Span),
}

impl TypeMember {
    pub fn span(&self) -> Span {
        match self {
            TypeMember::Property { span, .. } => *span,
            TypeMember::Method { span, .. } => *span,
            TypeMember::Index { span, .. } => *span,
            TypeMember::Other(span) => *span,
        }
    }
}

/// A type annotation.
#[derive(Clone, Debug)]
pub struct TypeNode {
    pub kind: TypeNodeKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum TypeNodeKind {
    Keyword(TypeKeyword),
    /// `C`, `ns.C`, `C<T>`
    Reference {
        name: QualifiedName,
        type_args: Vec<TypeNode>,
    },
    /// `T[]`
    Array(Box<TypeNode>),
    /// `A | B`
    Union(Vec<TypeNode>),
    /// `A & B`
    Intersection(Vec<TypeNode>),
    /// `(a: X, b?: Y) => R`, possibly with a `this` parameter.
    Function {
        this_type: Option<Box<TypeNode>>,
        params: Vec<ParamSig>,
        return_type: Box<TypeNode>,
    },
    /// `{ a: X, b?: Y }`
    TypeLiteral(Vec<TypeMember>),
    /// `[A, B]`
    Tuple(Vec<TypeNode>),
    /// `(T)`
    Paren(Box<TypeNode>),
    /// `'lit'`, `42`, `true`
    Literal { text: String },
    /// `typeof x`
    TypeQuery(QualifiedName),
    /// Anything the parser does not structure (`keyof`, conditional,
    /// mapped, template-literal types). Translated as `?`.
    Unsupported(Span),
}

// =============================================================================
// Parameters and signatures
// =============================================================================

/// A function/method/constructor parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub decorators: Vec<Decorator>,
    pub modifiers: Modifiers,
    pub name: Ident,
    pub optional: bool,
    pub rest: bool,
    pub type_node: Option<TypeNode>,
    /// Span from the `:` through the end of the type annotation, for erasure.
    pub type_ann_span: Option<Span>,
    /// Span of the initializer expression, after `=`.
    pub initializer: Option<Span>,
    pub span: Span,
}

/// A declared type parameter `T` or `T extends U`.
#[derive(Clone, Debug)]
pub struct TypeParam {
    pub name: Ident,
    pub span: Span,
}

// =============================================================================
// Declarations
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

impl VarKind {
    pub fn keyword(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// One declarator in a variable statement.
#[derive(Clone, Debug)]
pub struct VarDecl {
    pub name: Ident,
    pub type_node: Option<TypeNode>,
    pub type_ann_span: Option<Span>,
    pub initializer: Option<Span>,
    pub span: Span,
}

/// `var|let|const a: T = x, b = y;`
#[derive(Clone, Debug)]
pub struct VarStatement {
    pub modifiers: Modifiers,
    pub kind: VarKind,
    pub declarations: Vec<VarDecl>,
}

/// A function declaration. `body` is `None` for overload signatures and
/// ambient declarations.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub modifiers: Modifiers,
    pub is_async: bool,
    pub is_generator: bool,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeNode>,
    pub return_type_span: Option<Span>,
    pub body: Option<Span>,
}

/// A class member.
#[derive(Clone, Debug)]
pub enum ClassMember {
    Constructor {
        params: Vec<Param>,
        body: Option<Span>,
        span: Span,
    },
    Method {
        decorators: Vec<Decorator>,
        modifiers: Modifiers,
        name: PropertyName,
        is_accessor: Option<AccessorKind>,
        is_async: bool,
        is_generator: bool,
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
        return_type_span: Option<Span>,
        body: Option<Span>,
        span: Span,
    },
    Property {
        decorators: Vec<Decorator>,
        modifiers: Modifiers,
        name: PropertyName,
        optional: bool,
        type_node: Option<TypeNode>,
        type_ann_span: Option<Span>,
        initializer: Option<Span>,
        span: Span,
    },
    /// Index signatures and anything else, passed through verbatim.
    Other(Span),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessorKind {
    Get,
    Set,
}

impl ClassMember {
    pub fn span(&self) -> Span {
        match self {
            ClassMember::Constructor { span, .. } => *span,
            ClassMember::Method { span, .. } => *span,
            ClassMember::Property { span, .. } => *span,
            ClassMember::Other(span) => *span,
        }
    }

    pub fn decorators(&self) -> &[Decorator] {
        match self {
            ClassMember::Method { decorators, .. } => decorators,
            ClassMember::Property { decorators, .. } => decorators,
            _ => &[],
        }
    }
}

/// A class declaration.
#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub decorators: Vec<Decorator>,
    pub modifiers: Modifiers,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    /// The `extends` clause expression, verbatim.
    pub extends: Option<Span>,
    /// The `implements` clause type references.
    pub implements: Vec<TypeNode>,
    pub members: Vec<ClassMember>,
    /// Byte offset of the class body's opening `{`.
    pub open_brace: u32,
    /// Byte offset of the class body's closing `}`.
    pub close_brace: u32,
}

/// An interface declaration.
#[derive(Clone, Debug)]
pub struct InterfaceDecl {
    pub modifiers: Modifiers,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<TypeNode>,
    pub members: Vec<TypeMember>,
}

/// One member of an enum.
#[derive(Clone, Debug)]
pub struct EnumMember {
    pub name: PropertyName,
    pub initializer: Option<Span>,
    pub span: Span,
}

/// An enum declaration.
#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub modifiers: Modifiers,
    pub is_const: bool,
    pub name: Ident,
    pub members: Vec<EnumMember>,
}

/// `type Name<T> = ...;`
#[derive(Clone, Debug)]
pub struct TypeAliasDecl {
    pub modifiers: Modifiers,
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub type_node: TypeNode,
}

/// `namespace a.b { ... }` / `declare module "x" { ... }` /
/// `declare global { ... }`
#[derive(Clone, Debug)]
pub struct NamespaceDecl {
    pub modifiers: Modifiers,
    /// Empty for `declare global`.
    pub name: Vec<Ident>,
    pub is_global: bool,
    pub body: Vec<Statement>,
}

/// An import specifier `a` or `a as b`.
#[derive(Clone, Debug)]
pub struct ImportSpecifier {
    /// The exported name in the source module (when renamed).
    pub property_name: Option<Ident>,
    /// The local binding.
    pub name: Ident,
    pub is_type_only: bool,
}

/// `import ... from 'spec';` or `import 'spec';`
#[derive(Clone, Debug)]
pub struct ImportDecl {
    pub is_type_only: bool,
    pub default_binding: Option<Ident>,
    pub namespace_binding: Option<Ident>,
    pub named: Vec<ImportSpecifier>,
    /// Unquoted module specifier.
    pub specifier: String,
    pub specifier_span: Span,
}

impl ImportDecl {
    /// Whether this is a bare side-effect import.
    pub fn is_side_effect_only(&self) -> bool {
        self.default_binding.is_none() && self.namespace_binding.is_none() && self.named.is_empty()
    }
}

/// `export { a as b } [from 'spec'];` or `export * from 'spec';`
#[derive(Clone, Debug)]
pub struct ExportDecl {
    pub is_type_only: bool,
    pub is_star: bool,
    pub named: Vec<ImportSpecifier>,
    pub specifier: Option<String>,
    pub specifier_span: Option<Span>,
}

// =============================================================================
// Statements and source files
// =============================================================================

/// A top-level or namespace-level statement.
#[derive(Clone, Debug)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
    /// Leading comments attached to this statement.
    pub leading_comments: Vec<crate::scanner::Comment>,
}

#[derive(Clone, Debug)]
pub enum StatementKind {
    Import(ImportDecl),
    Export(ExportDecl),
    Var(VarStatement),
    Function(FunctionDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Enum(EnumDecl),
    TypeAlias(TypeAliasDecl),
    Namespace(NamespaceDecl),
    /// Anything else: expression statements, control flow, etc. Copied
    /// through verbatim by every pass.
    Other(Span),
}

impl Statement {
    /// The declared name, when this statement declares one.
    pub fn declared_name(&self) -> Option<&Ident> {
        match &self.kind {
            StatementKind::Function(f) => Some(&f.name),
            StatementKind::Class(c) => Some(&c.name),
            StatementKind::Interface(i) => Some(&i.name),
            StatementKind::Enum(e) => Some(&e.name),
            StatementKind::TypeAlias(t) => Some(&t.name),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> Option<&Modifiers> {
        match &self.kind {
            StatementKind::Var(v) => Some(&v.modifiers),
            StatementKind::Function(f) => Some(&f.modifiers),
            StatementKind::Class(c) => Some(&c.modifiers),
            StatementKind::Interface(i) => Some(&i.modifiers),
            StatementKind::Enum(e) => Some(&e.modifiers),
            StatementKind::TypeAlias(t) => Some(&t.modifiers),
            StatementKind::Namespace(n) => Some(&n.modifiers),
            _ => None,
        }
    }

    /// The leading JSDoc comment, if any non-detached one is present.
    pub fn jsdoc_span(&self) -> Option<Span> {
        self.leading_comments
            .iter()
            .rev()
            .find(|c| c.is_jsdoc && !c.detached)
            .map(|c| c.span)
    }
}

impl Spanned for Statement {
    fn span(&self) -> Span {
        self.span
    }
}

/// A parsed source file: the unit every pass consumes.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub file_name: String,
    pub text: String,
    pub statements: Vec<Statement>,
    /// Whether this file is an ambient declaration file (`.d.ts`).
    pub is_declaration_file: bool,
    /// All comments, in source order.
    pub comments: Vec<crate::scanner::Comment>,
}

impl SourceFile {
    /// The file-level JSDoc comment: a leading JSDoc block that is detached
    /// from the first statement (or the file is otherwise empty of code).
    pub fn fileoverview_span(&self) -> Option<Span> {
        let first = self.comments.first()?;
        if !first.is_jsdoc {
            return None;
        }
        let attached_to_first_stmt = self
            .statements
            .first()
            .map(|s| s.jsdoc_span() == Some(first.span))
            .unwrap_or(false);
        if first.detached || !attached_to_first_stmt {
            Some(first.span)
        } else {
            None
        }
    }
}

/// Check whether a file name refers to an ambient declaration file.
pub fn is_dts_file_name(file_name: &str) -> bool {
    file_name.ends_with(".d.ts")
}
