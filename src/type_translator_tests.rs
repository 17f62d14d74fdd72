use super::*;
use crate::ast::StatementKind;
use crate::program::{InMemoryHost, Program};

/// Translate the annotation of the first `var` declaration in `source`.
fn translate_var(source: &str) -> String {
    translate_var_with(&[("test.ts", source)], "test.ts")
}

fn translate_var_with(files: &[(&str, &str)], entry: &str) -> String {
    let mut host = InMemoryHost::new();
    for (name, text) in files {
        host.add_file(*name, *text);
    }
    let (program, bag) = Program::parse(&host, &[entry.to_string()]);
    assert!(!bag.has_errors(), "parse failed: {:?}", bag.into_vec());
    let file = program.get_file(entry).unwrap();
    let mut translator = TypeTranslator::new(&program, &host, file, false, false);
    for statement in &file.file.statements {
        if let StatementKind::Var(var) = &statement.kind {
            if let Some(type_node) = var.declarations[0].type_node.as_ref() {
                return translator.translate(type_node);
            }
        }
    }
    panic!("no annotated var statement in source");
}

#[test]
fn test_primitives() {
    assert_eq!(translate_var("var x: number;"), "number");
    assert_eq!(translate_var("var x: string;"), "string");
    assert_eq!(translate_var("var x: boolean;"), "boolean");
    assert_eq!(translate_var("var x: void;"), "void");
    assert_eq!(translate_var("var x: null;"), "null");
    assert_eq!(translate_var("var x: undefined;"), "undefined");
}

#[test]
fn test_any_and_unknown_become_question() {
    assert_eq!(translate_var("var x: any;"), "?");
    assert_eq!(translate_var("var x: unknown;"), "?");
}

#[test]
fn test_nullable_union_is_parenthesized() {
    assert_eq!(translate_var("var x: string | null;"), "(string|null)");
    assert_eq!(
        translate_var("var x: number | string | null;"),
        "(number|string|null)"
    );
}

#[test]
fn test_union_with_any_collapses() {
    assert_eq!(translate_var("var x: string | any;"), "?");
}

#[test]
fn test_array_forms() {
    assert_eq!(translate_var("var x: string[];"), "!Array<string>");
    assert_eq!(translate_var("var x: Array<string>;"), "!Array<string>");
    assert_eq!(
        translate_var("var x: number[][];"),
        "!Array<!Array<number>>"
    );
}

#[test]
fn test_record_type_with_optional_member() {
    assert_eq!(
        translate_var("var x: { a: number, b?: string };"),
        "{a: number, b: (string|undefined)}"
    );
}

#[test]
fn test_index_signature_becomes_object_map() {
    assert_eq!(
        translate_var("var x: { [key: string]: number };"),
        "!Object<string,number>"
    );
}

#[test]
fn test_function_type() {
    assert_eq!(
        translate_var("var f: (a: number, b?: string) => void;"),
        "function(number, (string|undefined)): void"
    );
}

#[test]
fn test_function_type_with_this() {
    assert_eq!(
        translate_var("var f: (this: Error, n: number) => boolean;"),
        "function(this: !Error, number): boolean"
    );
}

#[test]
fn test_rest_params() {
    assert_eq!(
        translate_var("var f: (...ns: number[]) => void;"),
        "function(...number): void"
    );
}

#[test]
fn test_class_and_interface_references_are_nonnull() {
    assert_eq!(
        translate_var("class C {}\nvar x: C;"),
        "!C"
    );
    assert_eq!(
        translate_var("interface I { a: string; }\nvar x: I;"),
        "!I"
    );
}

#[test]
fn test_enum_reference_is_bare_name() {
    assert_eq!(translate_var("enum E { A }\nvar x: E;"), "E");
}

#[test]
fn test_alias_is_followed() {
    assert_eq!(translate_var("type MyType = number;\nvar y: MyType;"), "number");
    assert_eq!(
        translate_var("interface I {}\ntype A = I;\nvar x: A;"),
        "!I"
    );
}

#[test]
fn test_recursive_alias_breaks_with_question() {
    assert_eq!(
        translate_var("type R = {value: number, next: R};\nvar r: R;"),
        "{value: number, next: ?}"
    );
}

#[test]
fn test_translate_alias_body_single_unfold() {
    // The typedef path translates the alias body directly; the alias must
    // count as currently translating so its first self-reference already
    // collapses to `?`.
    let mut host = InMemoryHost::new();
    host.add_file("t.ts", "type R = {value: number, next: R};");
    let (program, _) = Program::parse(&host, &["t.ts".to_string()]);
    let file = program.get_file("t.ts").unwrap();
    let mut translator = TypeTranslator::new(&program, &host, file, false, false);
    let StatementKind::TypeAlias(alias) = &file.file.statements[0].kind else {
        panic!("expected alias");
    };
    assert_eq!(
        translator.translate_alias("R", &alias.type_node),
        "{value: number, next: ?}"
    );
}

#[test]
fn test_unresolved_reference_degrades() {
    assert_eq!(translate_var("var x: SomethingUnknown;"), "?");
}

#[test]
fn test_global_types_pass_through() {
    assert_eq!(
        translate_var("var p: Promise<string>;"),
        "!Promise<string>"
    );
    assert_eq!(
        translate_var("var m: Map<string, number>;"),
        "!Map<string, number>"
    );
}

#[test]
fn test_tuple_widens_to_array() {
    assert_eq!(translate_var("var t: [number, string];"), "!Array<?>");
}

#[test]
fn test_intersection_degrades() {
    assert_eq!(translate_var("var x: { a: number } & { b: string };"), "?");
}

#[test]
fn test_typeof_degrades() {
    assert_eq!(translate_var("var c = 1;\nvar x: typeof c;"), "?");
}

#[test]
fn test_imported_class_reference_uses_local_name() {
    let translated = translate_var_with(
        &[
            ("main.ts", "import { Dep as D } from './dep';\nvar x: D;"),
            ("dep.ts", "export class Dep {}"),
        ],
        "main.ts",
    );
    assert_eq!(translated, "!D");
}

#[test]
fn test_namespace_import_member_reference() {
    let translated = translate_var_with(
        &[
            ("main.ts", "import * as dep from './dep';\nvar x: dep.Dep;"),
            ("dep.ts", "export class Dep {}"),
        ],
        "main.ts",
    );
    assert_eq!(translated, "!dep.Dep");
}

#[test]
fn test_untyped_mode_is_always_question() {
    let mut host = InMemoryHost::new();
    host.add_file("t.ts", "var a: number;\nvar b: string[];\nclass C {}\nvar c: C;");
    let (program, _) = Program::parse(&host, &["t.ts".to_string()]);
    let file = program.get_file("t.ts").unwrap();
    let mut translator = TypeTranslator::new(&program, &host, file, true, false);
    for statement in &file.file.statements {
        if let StatementKind::Var(var) = &statement.kind {
            for decl in &var.declarations {
                if let Some(type_node) = &decl.type_node {
                    assert_eq!(translator.translate(type_node), "?");
                }
            }
        }
    }
}

#[test]
fn test_type_param_in_scope() {
    let mut host = InMemoryHost::new();
    host.add_file("t.ts", "var x: T;");
    let (program, _) = Program::parse(&host, &["t.ts".to_string()]);
    let file = program.get_file("t.ts").unwrap();
    let mut translator = TypeTranslator::new(&program, &host, file, false, false);
    translator.push_type_params(vec!["T".to_string()]);
    let StatementKind::Var(var) = &file.file.statements[0].kind else {
        panic!("expected var");
    };
    let type_node = var.declarations[0].type_node.as_ref().unwrap();
    assert_eq!(translator.translate(type_node), "T");
    translator.pop_type_params();
    assert_eq!(translator.translate(type_node), "?");
}

#[test]
fn test_referenced_imports_are_recorded() {
    let mut host = InMemoryHost::new();
    host.add_file("main.ts", "import { Dep } from './dep';\nvar x: Dep;");
    host.add_file("dep.ts", "export interface Dep {}");
    let (program, _) = Program::parse(&host, &["main.ts".to_string()]);
    let file = program.get_file("main.ts").unwrap();
    let mut translator = TypeTranslator::new(&program, &host, file, false, false);
    let StatementKind::Var(var) = &file.file.statements[1].kind else {
        panic!("expected var");
    };
    translator.translate(var.declarations[0].type_node.as_ref().unwrap());
    assert!(translator.referenced_imports().contains("Dep"));
}
