//! End-to-end scenarios over the whole pipeline: original TypeScript in,
//! `goog.module` JavaScript and externs out.

use closurize::pipeline::{translate_program, EmitResult, TranslationOptions};
use closurize::program::InMemoryHost;
use closurize::DefaultModuleNamer;

fn translate(files: &[(&str, &str)], roots: &[&str]) -> EmitResult {
    translate_with(files, roots, &TranslationOptions::default())
}

fn translate_with(
    files: &[(&str, &str)],
    roots: &[&str],
    options: &TranslationOptions,
) -> EmitResult {
    let mut host = InMemoryHost::new();
    for (name, text) in files {
        host.add_file(*name, *text);
    }
    let roots: Vec<String> = roots.iter().map(|s| s.to_string()).collect();
    translate_program(&host, &DefaultModuleNamer, &roots, options)
}

fn js<'a>(result: &'a EmitResult, path: &str) -> &'a str {
    result
        .js_files
        .get(path)
        .unwrap_or_else(|| panic!("missing output {}; have {:?}", path, result.js_files.keys()))
}

#[test]
fn scenario_simple_typedef() {
    let result = translate(
        &[("pkg/main.ts", "type MyType = number;\nvar y: MyType = 3;\n")],
        &["pkg/main.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("/** @typedef {number} */\nvar MyType;"), "{}", out);
    assert!(out.contains("/** @type {number} */\nvar y = 3;"), "{}", out);
}

#[test]
fn scenario_recursive_type() {
    let result = translate(
        &[("pkg/main.ts", "type R = {value: number, next: R};\n")],
        &["pkg/main.ts"],
    );
    assert!(result.success);
    let out = js(&result, "pkg/main.js");
    assert!(
        out.contains("/** @typedef {{value: number, next: ?}} */"),
        "recursion not broken with ?:\n{}",
        out
    );
}

#[test]
fn scenario_interface_and_reexported_alias() {
    let result = translate(
        &[(
            "pkg/main.ts",
            "export interface Foo { x: string; }\nexport type Bar = number;\n",
        )],
        &["pkg/main.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("@record"), "{}", out);
    assert!(out.contains("@export"), "{}", out);
    assert!(out.contains("function Foo() {}"), "{}", out);
    assert!(out.contains("exports.Foo = Foo;"), "{}", out);
    assert!(out.contains("/** @type {string} */\nFoo.prototype.x;"), "{}", out);
    assert!(out.contains("/** @typedef {number} */\nexports.Bar;"), "{}", out);
}

#[test]
fn scenario_class_implements_alias() {
    let result = translate(
        &[(
            "pkg/main.ts",
            "interface I {}\ntype A = I;\nexport class C implements A {}\n",
        )],
        &["pkg/main.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("@implements {I}"), "{}", out);
    assert!(out.contains("/** @typedef {!I} */\nvar A;"), "{}", out);
    assert!(out.contains("class C"), "{}", out);
}

#[test]
fn scenario_decorator_downlevel() {
    let files = [
        (
            "pkg/annotations.ts",
            "/** @Annotation */\nexport function Component(config: any): any { return (cls: any) => cls; }\n",
        ),
        ("pkg/svc.ts", "export class Svc {}\n"),
        (
            "pkg/main.ts",
            "import { Component } from './annotations';\nimport { Svc } from './svc';\n\n@Component({selector: 'x'})\nexport class X {\n  constructor(a: Svc) {}\n}\n",
        ),
    ];
    let result = translate(&files, &["pkg/main.ts"]);
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(!out.contains("@Component"), "lowered decorator still applied:\n{}", out);
    assert!(out.contains("static decorators"), "{}", out);
    assert!(out.contains("{ type: Component, args: [{selector: 'x'}, ] }"), "{}", out);
    assert!(out.contains("static ctorParameters"), "{}", out);
    assert!(out.contains("{type: Svc}"), "{}", out);
    // Requires for both imports survive.
    assert!(out.contains("goog.require('pkg.annotations')"), "{}", out);
    assert!(out.contains("goog.require('pkg.svc')"), "{}", out);
}

#[test]
fn scenario_runtime_decorator_preserved_outside_class() {
    let files = [
        (
            "pkg/deco.ts",
            "export function Sticky(): any { return (cls: any) => cls; }\n",
        ),
        (
            "pkg/main.ts",
            "import { Sticky } from './deco';\n\n@Sticky()\nexport class X {\n}\n",
        ),
    ];
    let result = translate(&files, &["pkg/main.ts"]);
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(!out.contains("static decorators"), "{}", out);
    assert!(out.contains("X = __decorate([Sticky()], X);"), "{}", out);
}

#[test]
fn scenario_module_conversion() {
    let result = translate(
        &[
            (
                "pkg/thisfile.ts",
                "import * as m from './dep';\nexport var x = m.y;\n",
            ),
            ("pkg/dep.ts", "export var y: number = 2;\n"),
        ],
        &["pkg/thisfile.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/thisfile.js");
    assert!(out.starts_with("goog.module('pkg.thisfile');"), "{}", out);
    assert!(out.contains("var module = module || {id: 'pkg/thisfile.js'};"), "{}", out);
    assert!(out.contains("goog.require('pkg.dep');"), "{}", out);
    assert!(out.contains("exports.x = x;"), "{}", out);
}

#[test]
fn scenario_side_effect_import() {
    let result = translate(
        &[
            ("pkg/main.ts", "import './polyfill';\nexport var q = 1;\n"),
            ("pkg/polyfill.ts", "var installed = true;\n"),
        ],
        &["pkg/main.ts"],
    );
    assert!(result.success);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("goog.require('pkg.polyfill');"), "{}", out);
    assert!(!out.contains("= goog.require('pkg.polyfill')"), "{}", out);
}

#[test]
fn scenario_export_star() {
    let result = translate(
        &[
            ("pkg/main.ts", "export * from './dep';\n"),
            ("pkg/dep.ts", "export var y: number = 2;\n"),
        ],
        &["pkg/main.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("var module_star_1_ = goog.require('pkg.dep');"), "{}", out);
    assert!(out.contains("__export(module_star_1_);"), "{}", out);
    assert!(out.contains("for (var p in m) if (!exports.hasOwnProperty(p)) exports[p] = m[p];"), "{}", out);
}

#[test]
fn scenario_externs_from_dts() {
    let result = translate(
        &[
            ("pkg/globals.d.ts", "declare var DEBUG: boolean;\ndeclare function log(msg: string): void;\n"),
            ("pkg/main.ts", "export var x = DEBUG;\n"),
        ],
        &["pkg/globals.d.ts", "pkg/main.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    assert!(result.externs.contains("// externs from pkg/globals.d.ts:"));
    assert!(result.externs.contains("/** @type {boolean} */\nvar DEBUG;"));
    assert!(result.externs.contains("@param {string} msg"));
    // The .d.ts root produces externs but no JavaScript.
    assert!(!result.js_files.contains_key("pkg/globals.js"));
}

#[test]
fn scenario_fileoverview_and_suppressions() {
    let result = translate(&[("pkg/main.ts", "export var x = 1;\n")], &["pkg/main.ts"]);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("@fileoverview added by closurize"), "{}", out);
    assert!(out.contains("@suppress {checkTypes}"), "{}", out);
}

#[test]
fn scenario_untyped_mode() {
    let result = translate_with(
        &[(
            "pkg/main.ts",
            "export var n: number = 1;\nexport function f(a: string): string { return a; }\n",
        )],
        &["pkg/main.ts"],
        &TranslationOptions {
            untyped: true,
            ..TranslationOptions::default()
        },
    );
    assert!(result.success);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("@type {?}"), "{}", out);
    assert!(out.contains("@param {?} a"), "{}", out);
    assert!(!out.contains("{number}"), "{}", out);
    // Expanded suppression taxonomy in untyped mode.
    assert!(out.contains("missingReturn"), "{}", out);
}

#[test]
fn scenario_enum_translation() {
    let result = translate(
        &[("pkg/main.ts", "export enum Color { Red, Green = 5 }\n")],
        &["pkg/main.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("@enum {number}"), "{}", out);
    assert!(out.contains("@export"), "{}", out);
    assert!(out.contains("var Color = { Red: 0, Green: 5 };"), "{}", out);
    assert!(out.contains("exports.Color = Color;"), "{}", out);
}

#[test]
fn scenario_type_only_reexport_stays_live() {
    let result = translate(
        &[
            ("pkg/main.ts", "export { Width } from './dims';\n"),
            ("pkg/dims.ts", "export type Width = number;\n"),
        ],
        &["pkg/main.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("goog.require('pkg.dims')"), "{}", out);
    assert!(out.contains("/** @typedef {dims_1.Width} */\nexports.Width;"), "{}", out);
}

#[test]
fn scenario_imported_type_keeps_require_live() {
    let result = translate(
        &[
            (
                "pkg/main.ts",
                "import { Thing } from './thing';\nexport var t: Thing | null = null;\n",
            ),
            ("pkg/thing.ts", "export interface Thing { id: number; }\n"),
        ],
        &["pkg/main.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("goog.require('pkg.thing')"), "{}", out);
    assert!(out.contains("@type {(!Thing|null)}"), "{}", out);
}

#[test]
fn scenario_diagnostics_do_not_stop_output() {
    // An unresolvable type degrades to `?` but the file still converts.
    let result = translate(
        &[("pkg/main.ts", "export var odd: SomeMissingType;\n")],
        &["pkg/main.ts"],
    );
    assert!(result.success, "diagnostics: {:?}", result.diagnostics);
    let out = js(&result, "pkg/main.js");
    assert!(out.contains("@type {?}"), "{}", out);
}

#[test]
fn scenario_annotator_idempotence() {
    let source = "export var y: number = 3;\nexport function f(a: string): void {}\n";
    let first = translate(&[("pkg/main.ts", source)], &["pkg/main.ts"]);
    assert!(first.success);
    let once = js(&first, "pkg/main.js").to_string();
    // The emitted JS carries each annotation exactly once.
    assert_eq!(once.matches("@type {number}").count(), 1);
    assert_eq!(once.matches("@param {string} a").count(), 1);
}
