use super::*;
use crate::parser::parse_source_file;

fn emit(source: &str) -> String {
    let (file, bag) = parse_source_file("test.ts", source);
    assert!(!bag.has_errors(), "parse failed: {:?}", bag.into_vec());
    emit_commonjs(&file, &[])
}

#[test]
fn test_sanitize_module_name() {
    assert_eq!(sanitize_module_name("./foo"), "foo");
    assert_eq!(sanitize_module_name("../utils"), "utils");
    assert_eq!(sanitize_module_name("./foo/bar"), "foo_bar");
    assert_eq!(sanitize_module_name("@scope/pkg"), "_scope_pkg");
    assert_eq!(sanitize_module_name("./foo-bar.baz"), "foo_bar_baz");
}

#[test]
fn test_output_file_name() {
    assert_eq!(output_file_name("a/b.ts"), "a/b.js");
    assert_eq!(output_file_name("a/b.tsx"), "a/b.js");
}

#[test]
fn test_use_strict_always_first() {
    let out = emit("var x = 1;");
    assert!(out.starts_with("\"use strict\";\n"));
    assert!(!out.contains("__esModule"));
}

#[test]
fn test_module_preamble() {
    let out = emit("export var x = 1;");
    assert!(out.contains("Object.defineProperty(exports, \"__esModule\", { value: true });"));
}

#[test]
fn test_named_import() {
    let out = emit("import { A, B as C } from './dep';\nconsole.log(A, C);");
    assert!(out.contains("var dep_1 = require(\"./dep\");"));
    assert!(out.contains("var A = dep_1.A;"));
    assert!(out.contains("var C = dep_1.B;"));
    assert!(out.contains("console.log(A, C);"));
}

#[test]
fn test_side_effect_import() {
    let out = emit("import './polyfill';");
    assert!(out.contains("require(\"./polyfill\");"));
    assert!(!out.contains("var "));
}

#[test]
fn test_namespace_and_default_import() {
    let out = emit("import def, * as ns from 'pkg';");
    assert!(out.contains("var pkg_1 = require(\"pkg\");"));
    assert!(out.contains("var def = pkg_1.default;"));
    assert!(out.contains("var ns = pkg_1;"));
}

#[test]
fn test_type_annotations_erased() {
    let out = emit("var y: MyType = 3;\nfunction f(a: number, b?: string): void { return; }");
    assert!(out.contains("var y = 3;"));
    assert!(out.contains("function f(a, b) { return; }"));
    assert!(!out.contains(": number"));
    assert!(!out.contains("MyType"));
}

#[test]
fn test_exported_declarations() {
    let out = emit("export const n: number = 1;\nexport function f(): void {}\nexport class C {}");
    assert!(out.contains("const n = 1;"));
    assert!(out.contains("exports.n = n;"));
    assert!(out.contains("exports.f = f;"));
    assert!(out.contains("exports.C = C;"));
}

#[test]
fn test_export_clause() {
    let out = emit("var a = 1;\nexport { a as b };");
    assert!(out.contains("exports.b = a;"));
}

#[test]
fn test_reexport_named() {
    let out = emit("export { x as y } from './dep';");
    assert!(out.contains("var dep_1 = require(\"./dep\");"));
    assert!(out.contains("exports.y = dep_1.x;"));
}

#[test]
fn test_export_star_uses_helper() {
    let out = emit("export * from './dep';");
    assert!(out.contains("function __export(m) {"));
    assert!(out.contains("for (var p in m) if (!exports.hasOwnProperty(p)) exports[p] = m[p];"));
    assert!(out.contains("__export(require(\"./dep\"));"));
}

#[test]
fn test_interface_and_alias_erased() {
    let out = emit("interface I { x: string; }\ntype T = number;\nvar v = 1;");
    assert!(!out.contains("interface"));
    assert!(!out.contains("type T"));
    assert!(out.contains("var v = 1;"));
}

#[test]
fn test_declare_statements_erased() {
    let out = emit("declare var ambient: number;\ndeclare function af(): void;\nvar real = 2;");
    assert!(!out.contains("ambient"));
    assert!(!out.contains("af"));
    assert!(out.contains("var real = 2;"));
}

#[test]
fn test_enum_lowering() {
    let out = emit("export enum Color { Red, Green = 5, Blue }");
    assert!(out.contains("var Color = { Red: 0, Green: 5, Blue: 6 };"));
    assert!(out.contains("exports.Color = Color;"));
}

#[test]
fn test_string_enum_lowering() {
    let out = emit("enum N { A = 'a', B = 'b' }");
    assert!(out.contains("var N = { A: 'a', B: 'b' };"));
}

#[test]
fn test_class_members() {
    let source = r#"class C extends Base {
  private count: number = 0;
  static tag: string = 'c';
  constructor(private svc: Svc, size: number) { this.init(size); }
  grow(by: number): number { return this.count + by; }
  get total(): number { return this.count; }
}
"#;
    let out = emit(source);
    assert!(out.contains("class C extends Base {"));
    assert!(out.contains("count = 0;"));
    assert!(!out.contains("private"));
    assert!(out.contains("static tag = 'c';"));
    assert!(out.contains("constructor(svc, size) {"));
    assert!(out.contains("this.svc = svc;"));
    assert!(out.contains("grow(by) { return this.count + by; }"));
    assert!(out.contains("get total() { return this.count; }"));
}

#[test]
fn test_jsdoc_comments_ride_along() {
    let source = "/** @type {number} */\nvar y: number = 3;";
    let out = emit(source);
    assert!(out.contains("/** @type {number} */\nvar y = 3;"));
}

#[test]
fn test_member_jsdoc_rides_along() {
    let source = "class C {\n  /** @type {number} */\n  x: number = 1;\n}\n";
    let out = emit(source);
    assert!(out.contains("/** @type {number} */\n  x = 1;"));
}

#[test]
fn test_runtime_class_decorator() {
    let source = "@Sticky()\nclass C {}\n";
    let out = emit(source);
    assert!(out.contains("var __decorate ="));
    assert!(out.contains("class C {"));
    assert!(out.contains("C = __decorate([Sticky()], C);"));
}

#[test]
fn test_runtime_member_decorator() {
    let source = "class C {\n  @Memo() calc(): number { return 1; }\n}\n";
    let out = emit(source);
    assert!(out.contains("__decorate([Memo()], C.prototype, \"calc\", null);"));
}

#[test]
fn test_namespace_iife() {
    let source = "namespace util {\n  export function id(x: number): number { return x; }\n}\n";
    let out = emit(source);
    assert!(out.contains("var util;"));
    assert!(out.contains("(function (util) {"));
    assert!(out.contains("function id(x) { return x; }"));
    assert!(out.contains("util.id = id;"));
    assert!(out.contains("})(util || (util = {}));"));
}

#[test]
fn test_async_function_and_method() {
    let out = emit("export async function go(): Promise<void> {}\nclass C { async run(): Promise<number> { return 1; } }");
    assert!(out.contains("async function go() {}"));
    assert!(out.contains("async run() { return 1; }"));
}

#[test]
fn test_overloads_dropped() {
    let out = emit("function f(a: number): void;\nfunction f(a: string): void;\nfunction f(a: any): void {}\n");
    assert_eq!(out.matches("function f(a)").count(), 1);
}

#[test]
fn test_exports_of_typedef_slot() {
    // The annotator rewrites exported aliases to `exports.Name;` statements,
    // which must pass through untouched.
    let out = emit("/** @typedef {number} */\nexports.Bar;\n");
    assert!(out.contains("/** @typedef {number} */\nexports.Bar;"));
}
