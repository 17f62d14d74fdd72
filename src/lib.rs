//! closurize - TypeScript to Closure-annotated JavaScript.
//!
//! Translates TypeScript programs into JavaScript carrying JSDoc type
//! comments in the Closure Compiler's grammar, plus a Closure externs file
//! for ambient declarations. The interesting work happens in three passes
//! over each file:
//!
//! 1. [`decorator_downlevel`] rewrites `@Annotation`-marked decorators into
//!    static class metadata.
//! 2. [`annotator`] emits a JSDoc block for every declaration, synthesizes
//!    `@record` witnesses for interfaces, and collects externs.
//! 3. [`es5processor`] converts the emitted CommonJS into `goog.module`
//!    form.
//!
//! The passes share the [`type_translator`] (TypeScript type syntax to
//! Closure type strings) and the position-preserving [`rewriter`].
//! [`pipeline::translate_program`] sequences everything; the minimal
//! front end ([`scanner`], [`parser`], [`binder`], [`program`]) plays the
//! host-compiler role.

pub mod annotator;
pub mod ast;
pub mod binder;
pub mod cli;
pub mod decorator_downlevel;
pub mod diagnostics;
pub mod emitter;
pub mod es5processor;
pub mod externs;
pub mod jsdoc;
pub mod module_namer;
pub mod parser;
pub mod pipeline;
pub mod program;
pub mod rewriter;
pub mod scanner;
pub mod source_map;
pub mod span;
pub mod type_translator;

pub use diagnostics::{Diagnostic, DiagnosticBag, Severity};
pub use module_namer::{DefaultModuleNamer, ModuleNameMapper};
pub use pipeline::{translate_program, EmitResult, TranslationOptions};
pub use program::{CompilerHost, FsHost, InMemoryHost};
pub use span::Span;
