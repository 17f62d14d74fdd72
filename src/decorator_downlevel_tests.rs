use super::*;
use crate::program::{InMemoryHost, Program};

const ANNOTATION_DECORATORS: &str = r#"
/** @Annotation */
export function Component(config: any): any { return (cls: any) => cls; }
/** @Annotation */
export function Input(): any { return () => {}; }
/** @Annotation */
export function Inject(token: any): any { return () => {}; }
export function Runtime(): any { return (cls: any) => cls; }
"#;

fn downlevel(main: &str) -> String {
    let mut host = InMemoryHost::new();
    host.add_file("decorators.ts", ANNOTATION_DECORATORS);
    host.add_file("svc.ts", "export class Svc {}");
    host.add_file("main.ts", main);
    let (program, bag) = Program::parse(&host, &["main.ts".to_string()]);
    assert!(!bag.has_errors(), "parse failed: {:?}", bag.into_vec());
    let file = program.get_file("main.ts").unwrap();
    let result = downlevel_decorators(&program, &host, file);
    assert!(!result.failed);
    result.output
}

#[test]
fn test_class_decorator_lowered() {
    let output = downlevel(
        "import { Component } from './decorators';\n\
         @Component({selector: 'app'})\n\
         export class App {\n}\n",
    );
    assert!(!output.contains("@Component"), "decorator call not removed:\n{}", output);
    assert!(output.contains("static decorators: {type: Function, args?: any[]}[] = ["));
    assert!(output.contains("{ type: Component, args: [{selector: 'app'}, ] },"));
}

#[test]
fn test_runtime_decorator_left_alone() {
    let output = downlevel(
        "import { Runtime } from './decorators';\n\
         @Runtime()\n\
         export class App {\n}\n",
    );
    assert!(output.contains("@Runtime()"));
    assert!(!output.contains("static decorators"));
}

#[test]
fn test_ctor_parameters_captured() {
    let output = downlevel(
        "import { Component } from './decorators';\n\
         import { Svc } from './svc';\n\
         @Component({})\n\
         export class App {\n  constructor(a: Svc, b: string) {}\n}\n",
    );
    assert!(output.contains("static ctorParameters: () => ({type: any, decorators?: {type: Function, args?: any[]}[]}|null)[] = () => ["));
    assert!(output.contains("{type: Svc},"));
    // A primitive-typed parameter has no value identifier.
    assert!(output.contains("null,"));
}

#[test]
fn test_param_decorator_lowered() {
    let output = downlevel(
        "import { Component, Inject } from './decorators';\n\
         import { Svc } from './svc';\n\
         @Component({})\n\
         export class App {\n  constructor(@Inject('token') a: Svc) {}\n}\n",
    );
    assert!(!output.contains("@Inject"));
    assert!(output.contains("{type: Svc, decorators: [{ type: Inject, args: ['token', ] }, ]},"));
}

#[test]
fn test_prop_decorators_lowered() {
    let output = downlevel(
        "import { Input } from './decorators';\n\
         export class App {\n  @Input() title: string;\n  @Input() width: number;\n}\n",
    );
    assert!(!output.contains("@Input"));
    assert!(output.contains("static propDecorators: {[key: string]: {type: Function, args?: any[]}[]} = {"));
    assert!(output.contains("\"title\": [{ type: Input },],"));
    assert!(output.contains("\"width\": [{ type: Input },],"));
}

#[test]
fn test_zero_arg_call_emits_no_args_key() {
    let output = downlevel(
        "import { Input } from './decorators';\n\
         export class App {\n  @Input() title: string;\n}\n",
    );
    assert!(output.contains("{ type: Input }"));
    assert!(
        !output.contains("args: ["),
        "zero-argument call must omit the args key:\n{}",
        output
    );
}

#[test]
fn test_undecorated_class_untouched() {
    let source = "export class Plain {\n  constructor(n: number) {}\n}\n";
    let output = downlevel(source);
    assert!(!output.contains("ctorParameters"));
    assert_eq!(output, source);
}

#[test]
fn test_computed_member_name_diagnostic() {
    let mut host = InMemoryHost::new();
    host.add_file("decorators.ts", ANNOTATION_DECORATORS);
    host.add_file(
        "main.ts",
        "import { Component, Input } from './decorators';\n\
         @Component({})\n\
         export class App {\n  @Input() [Symbol.iterator]() {}\n}\n",
    );
    let (program, _) = Program::parse(&host, &["main.ts".to_string()]);
    let file = program.get_file("main.ts").unwrap();
    let result = downlevel_decorators(&program, &host, file);
    assert!(result
        .diagnostics
        .iter()
        .any(|d| d.message.contains("computed member name")));
    // The computed member's decorator stays in place.
    assert!(result.output.contains("@Input() [Symbol.iterator]"));
}

#[test]
fn test_annotation_marker_required_on_direct_declaration() {
    // `Local` has no @Annotation marker; nothing is lowered.
    let output = downlevel(
        "function Local(): any { return (c: any) => c; }\n\
         @Local()\n\
         class App {\n}\n",
    );
    assert!(output.contains("@Local()"));
    assert!(!output.contains("static decorators"));
}

#[test]
fn test_local_annotation_marked_decorator() {
    let output = downlevel(
        "/** @Annotation */\nfunction Deco(x: any): any { return (c: any) => c; }\n\
         @Deco({a: 1})\n\
         class App {\n}\n",
    );
    assert!(!output.contains("@Deco({a: 1})\nclass"));
    assert!(output.contains("{ type: Deco, args: [{a: 1}, ] },"));
}

#[test]
fn test_whitespace_preserved_where_decorator_removed() {
    let output = downlevel(
        "import { Component } from './decorators';\n\
         @Component({})\nexport class App {\n}\n",
    );
    // The newline that preceded the decorator survives; the class header
    // starts on its own line.
    assert!(output.contains("\nexport class App {"));
}
