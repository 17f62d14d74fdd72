//! Pipeline Coordinator.
//!
//! Sequences the passes over a program: decorator downleveling, JSDoc
//! annotation (with externs collection), CommonJS emit, and `goog.module`
//! conversion. Between rewriting passes the program is re-parsed with the
//! rewritten texts overlaid on the compiler host, so each pass sees honest
//! positions.

use crate::annotator::{annotate, AnnotatorOptions, FileSummary};
use crate::decorator_downlevel::downlevel_decorators;
use crate::diagnostics::{Diagnostic, DiagnosticBag};
use crate::emitter::{emit_commonjs, output_file_name};
use crate::es5processor::{process_es5, Es5ProcessorHost};
use crate::externs::{generate_externs, ExternsSet};
use crate::parser::parse_source_file;
use crate::program::{CompilerHost, OutputRetainingHost, Program, SourceReplacingHost};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Options for one translation run.
#[derive(Clone, Copy, Debug)]
pub struct TranslationOptions {
    /// Translate every type as `?`.
    pub untyped: bool,
    /// Run the decorator downlevel pass.
    pub downlevel_decorators: bool,
    /// Skip checking and annotation entirely; transpile each file
    /// standalone and only convert modules. Trades accuracy for latency.
    pub dev_mode: bool,
    /// Surface type-translation warnings as diagnostics.
    pub verbose: bool,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        TranslationOptions {
            untyped: false,
            downlevel_decorators: true,
            dev_mode: false,
            verbose: false,
        }
    }
}

/// What a translation run produces.
#[derive(Debug, Default)]
pub struct EmitResult {
    /// Closure-ready JavaScript, keyed by output path.
    pub js_files: FxHashMap<String, String>,
    /// Concatenated externs, in input file order.
    pub externs: String,
    /// Everything the passes reported.
    pub diagnostics: Vec<Diagnostic>,
    /// False when any error-severity diagnostic was recorded.
    pub success: bool,
}

/// Translate a set of root files. Library entry point.
pub fn translate_program(
    host: &dyn CompilerHost,
    es5_host: &dyn Es5ProcessorHost,
    root_files: &[String],
    options: &TranslationOptions,
) -> EmitResult {
    if options.dev_mode {
        return translate_dev_mode(host, es5_host, root_files);
    }

    let mut bag = DiagnosticBag::new();

    // Parse + check once; type-check errors terminate the pipeline.
    let (program, parse_bag) = Program::parse(host, root_files);
    bag.absorb(parse_bag);
    bag.absorb(program.check(host));
    if bag.has_errors() {
        return EmitResult {
            diagnostics: bag.into_vec(),
            success: false,
            ..EmitResult::default()
        };
    }

    // Pass 1: decorator downleveling, then re-parse through an overlay.
    let mut replacements: FxHashMap<String, String> = FxHashMap::default();
    if options.downlevel_decorators {
        for file_name in root_files {
            if program.should_skip_processing(file_name) {
                continue;
            }
            let Some(program_file) = program.get_file(file_name) else {
                continue;
            };
            let result = downlevel_decorators(&program, host, program_file);
            bag.absorb(result.diagnostics);
            if !result.failed {
                replacements.insert(file_name.clone(), result.output);
            }
        }
    }
    let downleveled_host = SourceReplacingHost::new(host, replacements);
    let (program, reparse_bag) = Program::parse(&downleveled_host, root_files);
    bag.absorb(reparse_bag);

    // Pass 2: annotation and externs collection.
    let annotator_options = AnnotatorOptions {
        untyped: options.untyped,
        verbose: options.verbose,
    };
    let mut replacements: FxHashMap<String, String> = FxHashMap::default();
    let mut summaries: FxHashMap<String, FileSummary> = FxHashMap::default();
    let mut externs = String::new();
    let mut externs_seen = ExternsSet::new();
    for file_name in root_files {
        let Some(program_file) = program.get_file(file_name) else {
            continue;
        };
        let (externs_text, externs_bag) = generate_externs(
            &program,
            &downleveled_host,
            program_file,
            options.untyped,
            options.verbose,
            &mut externs_seen,
        );
        externs.push_str(&externs_text);
        bag.absorb(externs_bag);

        if program.should_skip_processing(file_name) {
            continue;
        }
        debug!(file = %file_name, "annotating");
        let (result, summary) = annotate(&program, &downleveled_host, program_file, annotator_options);
        bag.absorb(result.diagnostics);
        if !result.failed {
            replacements.insert(file_name.clone(), result.output);
        }
        summaries.insert(file_name.clone(), summary);
    }
    let annotated_host = SourceReplacingHost::new(&downleveled_host, replacements);
    let (program, reparse_bag) = Program::parse(&annotated_host, root_files);
    bag.absorb(reparse_bag);

    // Pass 3: CommonJS emit into the output-retaining host, then
    // goog.module conversion over each captured file.
    let mut emitted = OutputRetainingHost::new();
    for file_name in root_files {
        if program.should_skip_processing(file_name) {
            continue;
        }
        let Some(program_file) = program.get_file(file_name) else {
            continue;
        };
        let empty = FileSummary::default();
        let summary = summaries.get(file_name).unwrap_or(&empty);
        let type_only_names: Vec<String> = summary
            .typedef_reexports
            .iter()
            .map(|r| r.exported_name.clone())
            .collect();
        let commonjs = emit_commonjs(&program_file.file, &type_only_names);
        emitted.write_file(output_file_name(file_name), commonjs);
    }

    let mut js_files: FxHashMap<String, String> = FxHashMap::default();
    for file_name in root_files {
        if program.should_skip_processing(file_name) {
            continue;
        }
        let output_path = output_file_name(file_name);
        let Some(commonjs) = emitted.get(&output_path) else {
            continue;
        };
        let empty = FileSummary::default();
        let summary = summaries.get(file_name).unwrap_or(&empty);
        let (converted, _table, convert_bag) = process_es5(
            es5_host,
            file_name,
            &output_path,
            commonjs,
            &summary.typedef_reexports,
        );
        bag.absorb(convert_bag);
        js_files.insert(output_path, converted);
    }

    let success = !bag.has_errors();
    EmitResult {
        js_files,
        externs,
        diagnostics: bag.into_vec(),
        success,
    }
}

/// Dev mode: standalone per-file transpilation, no cross-file type
/// information, no annotation, no decorator lowering.
fn translate_dev_mode(
    host: &dyn CompilerHost,
    es5_host: &dyn Es5ProcessorHost,
    root_files: &[String],
) -> EmitResult {
    let mut bag = DiagnosticBag::new();
    let mut js_files: FxHashMap<String, String> = FxHashMap::default();
    for file_name in root_files {
        if crate::ast::is_dts_file_name(file_name) {
            continue;
        }
        let Some(text) = host.read_file(file_name) else {
            bag.error(file_name.as_str(), crate::span::Span::at(0), "file not found");
            continue;
        };
        let (file, parse_bag) = parse_source_file(file_name, &text);
        bag.absorb(parse_bag);
        let commonjs = emit_commonjs(&file, &[]);
        let output_path = output_file_name(file_name);
        let (converted, _table, convert_bag) =
            process_es5(es5_host, file_name, &output_path, &commonjs, &[]);
        bag.absorb(convert_bag);
        js_files.insert(output_path, converted);
    }
    let success = !bag.has_errors();
    EmitResult {
        js_files,
        externs: String::new(),
        diagnostics: bag.into_vec(),
        success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_namer::DefaultModuleNamer;
    use crate::program::InMemoryHost;

    fn run(files: &[(&str, &str)], roots: &[&str], options: &TranslationOptions) -> EmitResult {
        let mut host = InMemoryHost::new();
        for (name, text) in files {
            host.add_file(*name, *text);
        }
        let roots: Vec<String> = roots.iter().map(|s| s.to_string()).collect();
        translate_program(&host, &DefaultModuleNamer, &roots, options)
    }

    #[test]
    fn test_type_error_short_circuits() {
        let result = run(
            &[("main.ts", "import { X } from './missing';")],
            &["main.ts"],
            &TranslationOptions::default(),
        );
        assert!(!result.success);
        assert!(result.js_files.is_empty());
    }

    #[test]
    fn test_basic_translation() {
        let result = run(
            &[("pkg/main.ts", "export var x: number = 1;")],
            &["pkg/main.ts"],
            &TranslationOptions::default(),
        );
        assert!(result.success, "diagnostics: {:?}", result.diagnostics);
        let js = result.js_files.get("pkg/main.js").expect("output present");
        assert!(js.starts_with("goog.module('pkg.main');"));
        assert!(js.contains("@type {number}"));
        assert!(js.contains("@export"));
        assert!(js.contains("exports.x = x;"));
    }

    #[test]
    fn test_out_of_scope_files_not_emitted() {
        let result = run(
            &[
                ("pkg/main.ts", "import { Dep } from './dep';\nexport var d: Dep | null = null;"),
                ("pkg/dep.ts", "export class Dep {}"),
            ],
            &["pkg/main.ts"],
            &TranslationOptions::default(),
        );
        assert!(result.success, "diagnostics: {:?}", result.diagnostics);
        assert!(result.js_files.contains_key("pkg/main.js"));
        assert!(!result.js_files.contains_key("pkg/dep.js"));
    }

    #[test]
    fn test_externs_collected_in_input_order() {
        let result = run(
            &[
                ("b.d.ts", "declare var bee: number;"),
                ("a.d.ts", "declare var ay: string;"),
            ],
            &["b.d.ts", "a.d.ts"],
            &TranslationOptions::default(),
        );
        let bee = result.externs.find("var bee;").unwrap();
        let ay = result.externs.find("var ay;").unwrap();
        assert!(bee < ay);
        // Declaration files produce no JS.
        assert!(result.js_files.is_empty());
    }

    #[test]
    fn test_dev_mode_skips_annotation() {
        let result = run(
            &[("pkg/main.ts", "export var x: number = 1;")],
            &["pkg/main.ts"],
            &TranslationOptions {
                dev_mode: true,
                ..TranslationOptions::default()
            },
        );
        assert!(result.success);
        let js = result.js_files.get("pkg/main.js").unwrap();
        assert!(js.starts_with("goog.module('pkg.main');"));
        assert!(!js.contains("@type"));
        assert!(js.contains("exports.x = x;"));
    }

    #[test]
    fn test_dev_mode_tolerates_missing_imports() {
        let result = run(
            &[("main.ts", "import { X } from './missing';\nexport var y = 1;")],
            &["main.ts"],
            &TranslationOptions {
                dev_mode: true,
                ..TranslationOptions::default()
            },
        );
        // Dev mode skips checking; the unresolved require surfaces as a
        // conversion diagnostic only if the namer refuses it.
        assert!(result.js_files.contains_key("main.js"));
    }
}
