//! Program construction: the host-compiler facade the passes consume.
//!
//! A [`Program`] owns every parsed and bound source file of one translation
//! run: the explicit root files plus everything reachable through relative
//! imports. The pipeline re-parses a program after each rewriting pass by
//! overlaying replacement texts on the compiler host.

use crate::ast::SourceFile;
use crate::binder::{bind_source_file, FileBindings, ImportedName, Symbol};
use crate::diagnostics::DiagnosticBag;
use crate::module_namer::{dirname, join_paths};
use crate::parser::parse_source_file;
use crate::span::Span;
use rustc_hash::FxHashMap;

// =============================================================================
// Compiler hosts
// =============================================================================

/// File-system surface the program reads through. The pipeline wraps hosts
/// to overlay rewritten texts without touching the underlying storage.
pub trait CompilerHost {
    fn read_file(&self, file_name: &str) -> Option<String>;

    fn file_exists(&self, file_name: &str) -> bool;

    fn get_canonical_file_name(&self, file_name: &str) -> String {
        crate::module_namer::normalize_path(file_name)
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        true
    }

    fn get_new_line(&self) -> &'static str {
        "\n"
    }
}

/// Host backed by an in-memory file map. Used by tests and as the seed for
/// overlay composition.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    files: FxHashMap<String, String>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        InMemoryHost::default()
    }

    pub fn add_file(&mut self, file_name: impl Into<String>, text: impl Into<String>) {
        self.files.insert(file_name.into(), text.into());
    }
}

impl CompilerHost for InMemoryHost {
    fn read_file(&self, file_name: &str) -> Option<String> {
        self.files.get(file_name).cloned()
    }

    fn file_exists(&self, file_name: &str) -> bool {
        self.files.contains_key(file_name)
    }
}

/// Host reading from the real file system. The CLI driver uses this.
#[derive(Debug, Default)]
pub struct FsHost;

impl CompilerHost for FsHost {
    fn read_file(&self, file_name: &str) -> Option<String> {
        std::fs::read_to_string(file_name).ok()
    }

    fn file_exists(&self, file_name: &str) -> bool {
        std::path::Path::new(file_name).is_file()
    }
}

/// Host that overlays replacement texts on an inner host. Every capability
/// except `read_file`/`file_exists` forwards to the wrapped host.
pub struct SourceReplacingHost<'a> {
    inner: &'a dyn CompilerHost,
    replacements: FxHashMap<String, String>,
}

impl<'a> SourceReplacingHost<'a> {
    pub fn new(inner: &'a dyn CompilerHost, replacements: FxHashMap<String, String>) -> Self {
        SourceReplacingHost {
            inner,
            replacements,
        }
    }
}

impl<'a> CompilerHost for SourceReplacingHost<'a> {
    fn read_file(&self, file_name: &str) -> Option<String> {
        match self.replacements.get(file_name) {
            Some(text) => Some(text.clone()),
            None => self.inner.read_file(file_name),
        }
    }

    fn file_exists(&self, file_name: &str) -> bool {
        self.replacements.contains_key(file_name) || self.inner.file_exists(file_name)
    }

    fn get_canonical_file_name(&self, file_name: &str) -> String {
        self.inner.get_canonical_file_name(file_name)
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        self.inner.use_case_sensitive_file_names()
    }

    fn get_new_line(&self) -> &'static str {
        self.inner.get_new_line()
    }
}

/// Captures emitted outputs into memory instead of writing them anywhere.
#[derive(Debug, Default)]
pub struct OutputRetainingHost {
    outputs: FxHashMap<String, String>,
}

impl OutputRetainingHost {
    pub fn new() -> Self {
        OutputRetainingHost::default()
    }

    pub fn write_file(&mut self, file_name: impl Into<String>, text: impl Into<String>) {
        self.outputs.insert(file_name.into(), text.into());
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.outputs.get(file_name).map(|s| s.as_str())
    }

    pub fn into_outputs(self) -> FxHashMap<String, String> {
        self.outputs
    }
}

// =============================================================================
// Program
// =============================================================================

/// One parsed and bound source file inside a program.
#[derive(Debug)]
pub struct ProgramFile {
    pub file: SourceFile,
    pub bindings: FileBindings,
    /// Whether this file was an explicit input (in scope for rewriting).
    pub is_root: bool,
}

/// A parsed, bound view of every file in the translation.
#[derive(Debug, Default)]
pub struct Program {
    files: Vec<ProgramFile>,
    index_by_name: FxHashMap<String, usize>,
}

impl Program {
    /// Parse the root files and everything reachable from them through
    /// relative import specifiers. Parse diagnostics land in the bag.
    pub fn parse(host: &dyn CompilerHost, root_names: &[String]) -> (Program, DiagnosticBag) {
        let mut program = Program::default();
        let mut bag = DiagnosticBag::new();
        let mut worklist: Vec<(String, bool)> = root_names
            .iter()
            .map(|name| (host.get_canonical_file_name(name), true))
            .collect();

        while let Some((file_name, is_root)) = worklist.pop() {
            if program.index_by_name.contains_key(&file_name) {
                if is_root {
                    let idx = program.index_by_name[&file_name];
                    program.files[idx].is_root = true;
                }
                continue;
            }
            let Some(text) = host.read_file(&file_name) else {
                if is_root {
                    bag.error(file_name.as_str(), Span::at(0), "file not found");
                }
                continue;
            };
            let (file, file_bag) = parse_source_file(&file_name, &text);
            bag.absorb(file_bag);
            let bindings = bind_source_file(&file);

            // Queue relative imports and re-exports for loading.
            let mut specifiers: Vec<String> = file
                .statements
                .iter()
                .filter_map(|statement| match &statement.kind {
                    crate::ast::StatementKind::Import(import) => Some(import.specifier.clone()),
                    crate::ast::StatementKind::Export(export) => export.specifier.clone(),
                    _ => None,
                })
                .collect();
            specifiers.dedup();
            for specifier in specifiers {
                if !specifier.starts_with('.') {
                    continue;
                }
                if let Some(resolved) = resolve_specifier(host, &file_name, &specifier) {
                    worklist.push((resolved, false));
                }
            }

            program.index_by_name.insert(file_name.clone(), program.files.len());
            program.files.push(ProgramFile {
                file,
                bindings,
                is_root,
            });
        }

        (program, bag)
    }

    pub fn get_file(&self, file_name: &str) -> Option<&ProgramFile> {
        self.index_by_name
            .get(file_name)
            .map(|&idx| &self.files[idx])
    }

    /// All files, in load order. Passes that need input order iterate the
    /// root names instead.
    pub fn files(&self) -> impl Iterator<Item = &ProgramFile> {
        self.files.iter()
    }

    /// Whether a file should be skipped by the rewriting passes: non-root
    /// files are type-checked collaborators only.
    pub fn should_skip_processing(&self, file_name: &str) -> bool {
        match self.get_file(file_name) {
            Some(pf) => !pf.is_root || pf.file.is_declaration_file,
            None => true,
        }
    }

    /// Follow an import binding one hop to its declaration. Returns the
    /// target file and symbol for named imports; `None` for namespace and
    /// default bindings or unresolvable targets.
    pub fn resolve_import(
        &self,
        host: &dyn CompilerHost,
        from_file: &str,
        symbol: &Symbol,
    ) -> Option<(&ProgramFile, &Symbol)> {
        let target = symbol.import.as_ref()?;
        let resolved = resolve_specifier(host, from_file, &target.specifier)?;
        let program_file = self.get_file(&resolved)?;
        match &target.imported {
            ImportedName::Named(name) => {
                let target_symbol = program_file.bindings.get(name)?;
                Some((program_file, target_symbol))
            }
            _ => None,
        }
    }

    /// Minimal program-level checking: every relative import in a root file
    /// must resolve to a loadable module. Failures are the "type-check
    /// errors" that terminate the pipeline.
    pub fn check(&self, host: &dyn CompilerHost) -> DiagnosticBag {
        let mut bag = DiagnosticBag::new();
        for program_file in &self.files {
            if !program_file.is_root {
                continue;
            }
            for statement in &program_file.file.statements {
                let (specifier, span) = match &statement.kind {
                    crate::ast::StatementKind::Import(import) => {
                        (Some(import.specifier.as_str()), import.specifier_span)
                    }
                    crate::ast::StatementKind::Export(export) => (
                        export.specifier.as_deref(),
                        export.specifier_span.unwrap_or(statement.span),
                    ),
                    _ => (None, statement.span),
                };
                let Some(specifier) = specifier else { continue };
                if !specifier.starts_with('.') {
                    continue;
                }
                if resolve_specifier(host, &program_file.file.file_name, specifier).is_none() {
                    bag.error(
                        program_file.file.file_name.as_str(),
                        span,
                        format!("cannot find module '{}'", specifier),
                    );
                }
            }
        }
        bag
    }
}

/// Resolve a relative specifier against the importing file, trying the
/// TypeScript candidate extensions.
pub fn resolve_specifier(
    host: &dyn CompilerHost,
    from_file: &str,
    specifier: &str,
) -> Option<String> {
    let base = join_paths(dirname(from_file), specifier);
    let candidates = [
        base.clone(),
        format!("{base}.ts"),
        format!("{base}.tsx"),
        format!("{base}.d.ts"),
        format!("{base}/index.ts"),
    ];
    candidates
        .into_iter()
        .find(|candidate| candidate.ends_with(".ts") && host.file_exists(candidate))
        .or_else(|| {
            // A specifier that already carries its extension.
            if base.ends_with(".ts") && host.file_exists(&base) {
                Some(base)
            } else {
                None
            }
        })
}
