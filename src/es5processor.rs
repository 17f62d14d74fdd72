//! CommonJS to `goog.module` converter.
//!
//! Post-processes the JavaScript the emitter produced, rewriting the
//! CommonJS module wiring into Closure's `goog.module`/`goog.require`
//! idiom. Deliberately line-oriented with anchored regular expressions over
//! the emitted token shapes rather than a re-parse: the input comes from
//! our own emitter, whose output shapes are predictable, and skipping a
//! second parse keeps the pass fast.

use crate::annotator::TypedefReExport;
use crate::diagnostics::DiagnosticBag;
use crate::jsdoc::{self, Tag};
use crate::module_namer::ModuleNameMapper;
use crate::span::Span;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

/// The collaborators the converter needs.
pub trait Es5ProcessorHost {
    /// Module id for an import specifier, or `None` when the specifier
    /// cannot be matched (the `require` is then left untransformed).
    fn path_to_module_name(&self, context: &str, specifier: &str) -> Option<String>;

    /// Module id of the file being converted.
    fn file_name_to_module_id(&self, file_name: &str) -> String;
}

impl<T: ModuleNameMapper> Es5ProcessorHost for T {
    fn path_to_module_name(&self, context: &str, specifier: &str) -> Option<String> {
        Some(ModuleNameMapper::path_to_module_name(self, context, specifier))
    }

    fn file_name_to_module_id(&self, file_name: &str) -> String {
        ModuleNameMapper::file_name_to_module_id(self, file_name)
    }
}

/// One rewritten `require`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequireRewrite {
    /// Local binding, empty for side-effect-only requires.
    pub local_name: String,
    pub specifier: String,
    pub module_id: String,
}

/// Per-file record of the conversion: every `require` in the input appears
/// exactly once here with the `goog.require` it became.
#[derive(Debug, Default)]
pub struct ModuleRewriteTable {
    pub requires: Vec<RequireRewrite>,
}

impl ModuleRewriteTable {
    fn module_var_for_specifier(&self, specifier: &str) -> Option<&str> {
        self.requires
            .iter()
            .find(|r| r.specifier == specifier && !r.local_name.is_empty())
            .map(|r| r.local_name.as_str())
    }
}

static VAR_REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:var|let|const)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*require\((?:"([^"]+)"|'([^']+)')\)\s*;?\s*$"#,
    )
    .expect("static regex")
});

static BARE_REQUIRE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^require\((?:"([^"]+)"|'([^']+)')\)\s*;?\s*$"#).expect("static regex")
});

static ESMODULE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^Object\.defineProperty\(exports,\s*["']__esModule["'].*$"#)
        .expect("static regex")
});

static EXPORT_STAR_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^__export\(require\((?:"([^"]+)"|'([^']+)')\)\)\s*;?\s*$"#)
        .expect("static regex")
});

static EXPORTS_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^exports\.[A-Za-z_$][A-Za-z0-9_$]*(\s*=\s*exports\.[A-Za-z_$][A-Za-z0-9_$]*)*\s*="#)
        .expect("static regex")
});

fn require_capture(captures: &regex::Captures<'_>, first: usize) -> String {
    captures
        .get(first)
        .or_else(|| captures.get(first + 1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Convert one emitted CommonJS file to `goog.module` form.
///
/// `source_file_name` is the original TypeScript path (the resolution
/// context for import specifiers); `output_path` is the `.js` path used for
/// the `module.id` shim.
pub fn process_es5(
    host: &dyn Es5ProcessorHost,
    source_file_name: &str,
    output_path: &str,
    js: &str,
    typedef_reexports: &[TypedefReExport],
) -> (String, ModuleRewriteTable, DiagnosticBag) {
    let mut bag = DiagnosticBag::new();
    let mut table = ModuleRewriteTable::default();
    let module_id = host.file_name_to_module_id(source_file_name);

    let mut header = String::new();
    header.push_str(&format!("goog.module('{}');\n", module_id));
    // TS emits `module.id` into decorator helpers; re-expose it.
    header.push_str(&format!("var module = module || {{id: '{}'}};\n", output_path));

    let mut body = String::new();
    let mut has_exports = false;
    let mut star_counter = 0u32;
    let mut offset = 0u32;

    for line in js.lines() {
        let line_span = Span::new(offset, offset + line.len() as u32);
        offset += line.len() as u32 + 1;
        let trimmed = line.trim_start();

        if ESMODULE_MARKER.is_match(trimmed) {
            continue;
        }

        if let Some(captures) = VAR_REQUIRE.captures(trimmed) {
            let local = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let specifier = require_capture(&captures, 2);
            match host.path_to_module_name(source_file_name, &specifier) {
                Some(id) => {
                    body.push_str(&format!("var {} = goog.require('{}');\n", local, id));
                    table.requires.push(RequireRewrite {
                        local_name: local.to_string(),
                        specifier,
                        module_id: id,
                    });
                }
                None => {
                    bag.error(
                        source_file_name,
                        line_span,
                        format!("could not resolve module specifier '{}'", specifier),
                    );
                    body.push_str(line);
                    body.push('\n');
                }
            }
            continue;
        }

        if let Some(captures) = BARE_REQUIRE.captures(trimmed) {
            let specifier = require_capture(&captures, 1);
            match host.path_to_module_name(source_file_name, &specifier) {
                Some(id) => {
                    body.push_str(&format!("goog.require('{}');\n", id));
                    table.requires.push(RequireRewrite {
                        local_name: String::new(),
                        specifier,
                        module_id: id,
                    });
                }
                None => {
                    bag.error(
                        source_file_name,
                        line_span,
                        format!("could not resolve module specifier '{}'", specifier),
                    );
                    body.push_str(line);
                    body.push('\n');
                }
            }
            continue;
        }

        if let Some(captures) = EXPORT_STAR_CALL.captures(trimmed) {
            let specifier = require_capture(&captures, 1);
            match host.path_to_module_name(source_file_name, &specifier) {
                Some(id) => {
                    star_counter += 1;
                    let tmp = format!("module_star_{}_", star_counter);
                    // The __export loop itself is preserved verbatim above,
                    // so Closure still recognizes the re-export shape.
                    body.push_str(&format!("var {} = goog.require('{}');\n", tmp, id));
                    body.push_str(&format!("__export({});\n", tmp));
                    table.requires.push(RequireRewrite {
                        local_name: tmp,
                        specifier,
                        module_id: id,
                    });
                    has_exports = true;
                }
                None => {
                    bag.error(
                        source_file_name,
                        line_span,
                        format!("could not resolve module specifier '{}'", specifier),
                    );
                    body.push_str(line);
                    body.push('\n');
                }
            }
            continue;
        }

        if EXPORTS_ASSIGNMENT.is_match(trimmed) {
            has_exports = true;
        }
        body.push_str(line);
        body.push('\n');
    }

    // Rule 4, second half: typedef aliases for type-only re-exports keep
    // the corresponding goog.require alive.
    for reexport in typedef_reexports {
        let Some(module_var) = table.module_var_for_specifier(&reexport.specifier) else {
            continue;
        };
        let type_expr = format!("{}.{}", module_var, reexport.source_name);
        body.push_str(&jsdoc::to_string(&[Tag::with_type("typedef", type_expr)]));
        body.push_str(&format!("exports.{};\n", reexport.exported_name));
        has_exports = true;
    }

    if !has_exports {
        header.push_str("exports = {};\n");
    }

    (format!("{}{}", header, body), table, bag)
}

#[cfg(test)]
#[path = "es5processor_tests.rs"]
mod es5processor_tests;
