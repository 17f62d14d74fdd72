use super::*;
use crate::ast::*;

fn parse(source: &str) -> SourceFile {
    let (file, bag) = parse_source_file("test.ts", source);
    assert!(
        !bag.has_errors(),
        "unexpected parse errors: {:?}",
        bag.into_vec()
    );
    file
}

fn first_kind(source: &str) -> StatementKind {
    let mut file = parse(source);
    assert!(!file.statements.is_empty(), "no statements parsed");
    file.statements.remove(0).kind
}

#[test]
fn test_parse_import_named() {
    let StatementKind::Import(import) = first_kind("import { A, B as C } from './dep';") else {
        panic!("expected import");
    };
    assert_eq!(import.specifier, "./dep");
    assert_eq!(import.named.len(), 2);
    assert_eq!(import.named[0].name.text, "A");
    assert_eq!(import.named[1].property_name.as_ref().unwrap().text, "B");
    assert_eq!(import.named[1].name.text, "C");
}

#[test]
fn test_parse_import_default_and_namespace() {
    let StatementKind::Import(import) = first_kind("import def, * as ns from 'pkg';") else {
        panic!("expected import");
    };
    assert_eq!(import.default_binding.unwrap().text, "def");
    assert_eq!(import.namespace_binding.unwrap().text, "ns");
}

#[test]
fn test_parse_side_effect_import() {
    let StatementKind::Import(import) = first_kind("import './side';") else {
        panic!("expected import");
    };
    assert!(import.is_side_effect_only());
}

#[test]
fn test_parse_type_only_import() {
    let StatementKind::Import(import) = first_kind("import type { T } from './types';") else {
        panic!("expected import");
    };
    assert!(import.is_type_only);
}

#[test]
fn test_parse_export_star() {
    let StatementKind::Export(export) = first_kind("export * from './dep';") else {
        panic!("expected export");
    };
    assert!(export.is_star);
    assert_eq!(export.specifier.as_deref(), Some("./dep"));
}

#[test]
fn test_parse_export_named_reexport() {
    let StatementKind::Export(export) = first_kind("export { x as y } from './dep';") else {
        panic!("expected export");
    };
    assert!(!export.is_star);
    assert_eq!(export.named.len(), 1);
    assert_eq!(export.named[0].property_name.as_ref().unwrap().text, "x");
    assert_eq!(export.named[0].name.text, "y");
}

#[test]
fn test_parse_var_with_type_and_initializer() {
    let StatementKind::Var(var) = first_kind("var y: MyType = 3;") else {
        panic!("expected var");
    };
    assert_eq!(var.kind, VarKind::Var);
    assert_eq!(var.declarations.len(), 1);
    let decl = &var.declarations[0];
    assert_eq!(decl.name.text, "y");
    assert!(matches!(
        decl.type_node.as_ref().unwrap().kind,
        TypeNodeKind::Reference { .. }
    ));
    assert!(decl.initializer.is_some());
}

#[test]
fn test_parse_exported_const() {
    let StatementKind::Var(var) = first_kind("export const n: number = 1;") else {
        panic!("expected var");
    };
    assert!(var.modifiers.export);
    assert_eq!(var.kind, VarKind::Const);
}

#[test]
fn test_parse_function_with_params() {
    let source = "function f(a: number, b?: string): void { return; }";
    let StatementKind::Function(func) = first_kind(source) else {
        panic!("expected function");
    };
    assert_eq!(func.name.text, "f");
    assert_eq!(func.params.len(), 2);
    assert!(!func.params[0].optional);
    assert!(func.params[1].optional);
    assert!(func.body.is_some());
    assert!(matches!(
        func.return_type.as_ref().unwrap().kind,
        TypeNodeKind::Keyword(TypeKeyword::Void)
    ));
}

#[test]
fn test_parse_class_with_decorator() {
    let source = "@Component({selector: 'x'})\nexport class Foo {\n  constructor(a: Svc) {}\n}";
    let StatementKind::Class(class) = first_kind(source) else {
        panic!("expected class");
    };
    assert_eq!(class.name.text, "Foo");
    assert_eq!(class.decorators.len(), 1);
    assert_eq!(class.decorators[0].name.text(), "Component");
    assert_eq!(class.decorators[0].args.as_ref().unwrap().len(), 1);
    assert_eq!(class.members.len(), 1);
    let ClassMember::Constructor { params, .. } = &class.members[0] else {
        panic!("expected constructor");
    };
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name.text, "a");
}

#[test]
fn test_parse_class_members() {
    let source = r#"
class C {
  private x: number = 1;
  static s: string;
  method(a: number): number { return a; }
  get prop(): number { return this.x; }
}
"#;
    let StatementKind::Class(class) = first_kind(source) else {
        panic!("expected class");
    };
    assert_eq!(class.members.len(), 4);
    let ClassMember::Property { modifiers, name, .. } = &class.members[0] else {
        panic!("expected property");
    };
    assert!(modifiers.private);
    assert_eq!(name.as_static_name(), Some("x"));
    let ClassMember::Property { modifiers, .. } = &class.members[1] else {
        panic!("expected property");
    };
    assert!(modifiers.r#static);
    let ClassMember::Method { is_accessor, .. } = &class.members[2] else {
        panic!("expected method");
    };
    assert!(is_accessor.is_none());
    let ClassMember::Method { is_accessor, .. } = &class.members[3] else {
        panic!("expected accessor");
    };
    assert_eq!(*is_accessor, Some(AccessorKind::Get));
}

#[test]
fn test_parse_class_implements() {
    let source = "class C implements A, ns.B {}";
    let StatementKind::Class(class) = first_kind(source) else {
        panic!("expected class");
    };
    assert_eq!(class.implements.len(), 2);
}

#[test]
fn test_parse_interface() {
    let source = "export interface Foo extends Base { x: string; f(a: number): void; }";
    let StatementKind::Interface(interface) = first_kind(source) else {
        panic!("expected interface");
    };
    assert_eq!(interface.name.text, "Foo");
    assert_eq!(interface.extends.len(), 1);
    assert_eq!(interface.members.len(), 2);
    assert!(matches!(interface.members[0], TypeMember::Property { .. }));
    assert!(matches!(interface.members[1], TypeMember::Method { .. }));
}

#[test]
fn test_parse_enum() {
    let source = "enum Color { Red, Green = 3, Blue }";
    let StatementKind::Enum(decl) = first_kind(source) else {
        panic!("expected enum");
    };
    assert_eq!(decl.name.text, "Color");
    assert_eq!(decl.members.len(), 3);
    assert!(decl.members[0].initializer.is_none());
    assert!(decl.members[1].initializer.is_some());
    assert!(!decl.is_const);
}

#[test]
fn test_parse_const_enum() {
    let StatementKind::Enum(decl) = first_kind("const enum E { A }") else {
        panic!("expected enum");
    };
    assert!(decl.is_const);
}

#[test]
fn test_parse_type_alias() {
    let StatementKind::TypeAlias(alias) = first_kind("type MyType = number;") else {
        panic!("expected type alias");
    };
    assert_eq!(alias.name.text, "MyType");
    assert!(matches!(
        alias.type_node.kind,
        TypeNodeKind::Keyword(TypeKeyword::Number)
    ));
}

#[test]
fn test_parse_recursive_alias_type_literal() {
    let StatementKind::TypeAlias(alias) = first_kind("type R = {value: number, next: R};") else {
        panic!("expected type alias");
    };
    let TypeNodeKind::TypeLiteral(members) = &alias.type_node.kind else {
        panic!("expected type literal");
    };
    assert_eq!(members.len(), 2);
}

#[test]
fn test_parse_namespace() {
    let source = "namespace ns { export class C {} }";
    let StatementKind::Namespace(ns) = first_kind(source) else {
        panic!("expected namespace");
    };
    assert_eq!(ns.name.len(), 1);
    assert_eq!(ns.name[0].text, "ns");
    assert_eq!(ns.body.len(), 1);
}

#[test]
fn test_parse_declare_global() {
    let StatementKind::Namespace(ns) = first_kind("declare global { interface Window {} }") else {
        panic!("expected namespace");
    };
    assert!(ns.is_global);
    assert_eq!(ns.body.len(), 1);
}

#[test]
fn test_opaque_statement_passthrough() {
    let file = parse("console.log('hi');\nif (x) { y(); } else { z(); }\nvar a = 1;");
    assert_eq!(file.statements.len(), 3);
    assert!(matches!(file.statements[0].kind, StatementKind::Other(_)));
    assert!(matches!(file.statements[1].kind, StatementKind::Other(_)));
    assert!(matches!(file.statements[2].kind, StatementKind::Var(_)));
}

#[test]
fn test_union_and_array_types() {
    let StatementKind::Var(var) = first_kind("var x: string | null;") else {
        panic!("expected var");
    };
    assert!(matches!(
        var.declarations[0].type_node.as_ref().unwrap().kind,
        TypeNodeKind::Union(_)
    ));

    let StatementKind::Var(var) = first_kind("var y: number[];") else {
        panic!("expected var");
    };
    assert!(matches!(
        var.declarations[0].type_node.as_ref().unwrap().kind,
        TypeNodeKind::Array(_)
    ));
}

#[test]
fn test_function_type_annotation() {
    let StatementKind::Var(var) = first_kind("var f: (a: number, b?: string) => void;") else {
        panic!("expected var");
    };
    let TypeNodeKind::Function { params, this_type, .. } =
        &var.declarations[0].type_node.as_ref().unwrap().kind
    else {
        panic!("expected function type");
    };
    assert!(this_type.is_none());
    assert_eq!(params.len(), 2);
}

#[test]
fn test_function_type_with_this_param() {
    let StatementKind::Var(var) = first_kind("var f: (this: Foo, n: number) => void;") else {
        panic!("expected var");
    };
    let TypeNodeKind::Function { params, this_type, .. } =
        &var.declarations[0].type_node.as_ref().unwrap().kind
    else {
        panic!("expected function type");
    };
    assert!(this_type.is_some());
    assert_eq!(params.len(), 1);
}

#[test]
fn test_generic_reference_type() {
    let StatementKind::Var(var) = first_kind("var m: Map<string, number>;") else {
        panic!("expected var");
    };
    let TypeNodeKind::Reference { name, type_args } =
        &var.declarations[0].type_node.as_ref().unwrap().kind
    else {
        panic!("expected reference");
    };
    assert_eq!(name.text(), "Map");
    assert_eq!(type_args.len(), 2);
}

#[test]
fn test_leading_jsdoc_attaches() {
    let file = parse("/** doc comment */\nfunction f() {}");
    assert!(file.statements[0].jsdoc_span().is_some());
}

#[test]
fn test_statement_span_is_verbatim() {
    let source = "var a = 1;\nvar b = 2;";
    let file = parse(source);
    assert_eq!(file.statements[0].span.slice(source), "var a = 1;");
    assert_eq!(file.statements[1].span.slice(source), "var b = 2;");
}
