//! Decorator Downleveler.
//!
//! Rewrites classes so that decorators whose declaration carries the
//! `@Annotation` marker are emitted as static class metadata instead of
//! decorator calls: `decorators`, `ctorParameters` (wrapped in an arrow to
//! defer forward references), and `propDecorators`. Runtime decorators
//! without the marker are left alone. This pass runs before the annotator.

use crate::ast::*;
use crate::binder::Symbol;
use crate::program::{CompilerHost, Program, ProgramFile};
use crate::rewriter::{NodeRef, RewriteResult, RewriteVisitor, Rewriter};
use crate::span::Span;
use tracing::debug;

/// Run the downlevel pass over one file.
pub fn downlevel_decorators(
    program: &Program,
    host: &dyn CompilerHost,
    file: &ProgramFile,
) -> RewriteResult {
    let mut visitor = DecoratorDownleveler {
        program,
        host,
        file,
    };
    let mut rewriter = Rewriter::new(&file.file);
    let statements: Vec<&Statement> = file.file.statements.iter().collect();
    for statement in statements {
        rewriter.visit(statement, &mut visitor);
        if rewriter.failed() {
            break;
        }
    }
    rewriter.finish()
}

/// One collected decorator application, with its argument texts.
struct LoweredDecorator {
    name: String,
    args: Option<Vec<String>>,
    span: Span,
}

/// A constructor-parameter metadata entry: `null`, or a value-identifier
/// type reference plus the parameter's lowered decorators.
struct CtorParamEntry {
    type_name: Option<String>,
    decorators: Vec<LoweredDecorator>,
}

struct DecoratorDownleveler<'a> {
    program: &'a Program,
    host: &'a dyn CompilerHost,
    file: &'a ProgramFile,
}

impl<'a> RewriteVisitor for DecoratorDownleveler<'a> {
    fn maybe_process(&mut self, node: NodeRef<'_>, rewriter: &mut Rewriter<'_>) -> bool {
        let NodeRef::Statement(statement) = node else {
            return false;
        };
        let StatementKind::Class(class) = &statement.kind else {
            return false;
        };
        self.process_class(statement, class, rewriter)
    }
}

impl<'a> DecoratorDownleveler<'a> {
    /// Whether a decorator's directly-resolved declaration is marked
    /// `@Annotation`. Markers reached only through re-export chains do not
    /// count.
    fn is_lowerable(&self, decorator: &Decorator) -> bool {
        if decorator.name.parts.len() != 1 {
            return false;
        }
        let head = &decorator.name.head().text;
        let Some(symbol) = self.file.bindings.get(head) else {
            return false;
        };
        if symbol.import.is_some() {
            return self
                .program
                .resolve_import(self.host, &self.file.file.file_name, symbol)
                .map(|(_, target)| target.is_annotation_marked())
                .unwrap_or(false);
        }
        symbol.is_annotation_marked()
    }

    fn lower(&self, decorator: &Decorator, source: &str) -> LoweredDecorator {
        LoweredDecorator {
            name: decorator.name.text(),
            args: decorator
                .args
                .as_ref()
                .map(|spans| spans.iter().map(|s| s.slice(source).to_string()).collect()),
            span: decorator.span,
        }
    }

    fn process_class(
        &mut self,
        statement: &Statement,
        class: &ClassDecl,
        rewriter: &mut Rewriter<'_>,
    ) -> bool {
        let source = &self.file.file.text;

        // Partition class decorators.
        let mut class_decorators: Vec<LoweredDecorator> = Vec::new();
        for decorator in &class.decorators {
            if self.is_lowerable(decorator) {
                class_decorators.push(self.lower(decorator, source));
            }
        }

        // Constructor parameters.
        let ctor_params = class.members.iter().find_map(|member| match member {
            ClassMember::Constructor { params, .. } => Some(params),
            _ => None,
        });
        let mut ctor_entries: Vec<CtorParamEntry> = Vec::new();
        let mut param_decorator_spans: Vec<Span> = Vec::new();
        if let Some(params) = ctor_params {
            for param in params {
                let mut lowered: Vec<LoweredDecorator> = Vec::new();
                for decorator in &param.decorators {
                    if self.is_lowerable(decorator) {
                        let entry = self.lower(decorator, source);
                        param_decorator_spans.push(entry.span);
                        lowered.push(entry);
                    }
                }
                let type_name = param
                    .type_node
                    .as_ref()
                    .and_then(|node| self.value_type_name(node));
                ctor_entries.push(CtorParamEntry {
                    type_name,
                    decorators: lowered,
                });
            }
        }
        let lowered_param_decorators = !param_decorator_spans.is_empty();

        // Member decorators.
        let mut prop_decorators: Vec<(String, Vec<LoweredDecorator>)> = Vec::new();
        let mut member_decorator_spans: Vec<Span> = Vec::new();
        for member in &class.members {
            let decorators = member.decorators();
            if decorators.is_empty() {
                continue;
            }
            let lowerable: Vec<&Decorator> = decorators
                .iter()
                .filter(|d| self.is_lowerable(d))
                .collect();
            if lowerable.is_empty() {
                continue;
            }
            let name = match member {
                ClassMember::Method { name, .. } | ClassMember::Property { name, .. } => {
                    match name.as_static_name() {
                        Some(text) => text.to_string(),
                        None => {
                            rewriter.error(
                                name.span(),
                                "decorator on a computed member name cannot be lowered",
                            );
                            continue;
                        }
                    }
                }
                _ => continue,
            };
            let mut lowered = Vec::new();
            for decorator in lowerable {
                let entry = self.lower(decorator, source);
                member_decorator_spans.push(entry.span);
                lowered.push(entry);
            }
            prop_decorators.push((name, lowered));
        }

        // A class enters the metadata table iff at least one decorator on
        // the class, its constructor parameters, or its members is marked.
        let has_metadata = !class_decorators.is_empty()
            || lowered_param_decorators
            || !prop_decorators.is_empty();
        if !has_metadata {
            return false;
        }
        debug!(
            class = %class.name.text,
            decorators = class_decorators.len(),
            "lowering decorators to static metadata"
        );

        // Emit the class, suppressing lowered decorators while keeping the
        // whitespace that preceded them so columns survive.
        let mut skip_spans: Vec<Span> = class_decorators.iter().map(|d| d.span).collect();
        skip_spans.extend(param_decorator_spans);
        skip_spans.extend(member_decorator_spans);
        skip_spans.sort_by_key(|span| span.start);

        for span in &skip_spans {
            rewriter.write_to(span.start);
            rewriter.skip_to(span.end);
        }
        rewriter.write_to(class.close_brace);
        rewriter.emit(&render_metadata(
            &class_decorators,
            &ctor_entries,
            ctor_params.is_some(),
            &prop_decorators,
        ));
        rewriter.write_to(statement.span.end);
        true
    }

    /// The value identifier for a constructor-parameter type: a reference
    /// whose symbol exists as a value in the emitted JavaScript.
    fn value_type_name(&self, node: &TypeNode) -> Option<String> {
        let TypeNodeKind::Reference { name, .. } = &node.kind else {
            return None;
        };
        let head = &name.head().text;
        let symbol = self.file.bindings.get(head)?;
        if symbol.import.is_some() {
            // Imported names survive as values when their target does.
            let resolved = self
                .program
                .resolve_import(self.host, &self.file.file.file_name, symbol);
            return match resolved {
                Some((_, target)) if is_value_symbol(target) => Some(name.text()),
                // Namespace imports are values by construction.
                None if name.parts.len() > 1 => Some(name.text()),
                _ => None,
            };
        }
        if is_value_symbol(symbol) {
            Some(name.text())
        } else {
            None
        }
    }
}

fn is_value_symbol(symbol: &Symbol) -> bool {
    use crate::binder::symbol_flags;
    symbol.has_any_flags(symbol_flags::CLASS | symbol_flags::ENUM | symbol_flags::FUNCTION)
}

// =============================================================================
// Metadata rendering
// =============================================================================

fn render_decorator(decorator: &LoweredDecorator) -> String {
    match &decorator.args {
        None => format!("{{ type: {} }}", decorator.name),
        Some(args) if args.is_empty() => format!("{{ type: {} }}", decorator.name),
        Some(args) => format!(
            "{{ type: {}, args: [{}, ] }}",
            decorator.name,
            args.join(", ")
        ),
    }
}

fn render_metadata(
    class_decorators: &[LoweredDecorator],
    ctor_entries: &[CtorParamEntry],
    has_constructor: bool,
    prop_decorators: &[(String, Vec<LoweredDecorator>)],
) -> String {
    let mut out = String::new();

    if !class_decorators.is_empty() {
        out.push_str("static decorators: {type: Function, args?: any[]}[] = [\n");
        for decorator in class_decorators {
            out.push_str(&render_decorator(decorator));
            out.push_str(",\n");
        }
        out.push_str("];\n");
    }

    if has_constructor {
        out.push_str(
            "static ctorParameters: () => ({type: any, decorators?: {type: Function, args?: any[]}[]}|null)[] = () => [\n",
        );
        for entry in ctor_entries {
            match (&entry.type_name, entry.decorators.is_empty()) {
                (None, true) => out.push_str("null,\n"),
                (type_name, _) => {
                    let type_text = type_name.clone().unwrap_or_else(|| "undefined".to_string());
                    if entry.decorators.is_empty() {
                        out.push_str(&format!("{{type: {}}},\n", type_text));
                    } else {
                        let decorators: Vec<String> =
                            entry.decorators.iter().map(render_decorator).collect();
                        out.push_str(&format!(
                            "{{type: {}, decorators: [{}, ]}},\n",
                            type_text,
                            decorators.join(", ")
                        ));
                    }
                }
            }
        }
        out.push_str("];\n");
    }

    if !prop_decorators.is_empty() {
        out.push_str(
            "static propDecorators: {[key: string]: {type: Function, args?: any[]}[]} = {\n",
        );
        for (name, decorators) in prop_decorators {
            let rendered: Vec<String> = decorators.iter().map(render_decorator).collect();
            out.push_str(&format!("\"{}\": [{},],\n", name, rendered.join(", ")));
        }
        out.push_str("};\n");
    }

    out
}

#[cfg(test)]
#[path = "decorator_downlevel_tests.rs"]
mod decorator_downlevel_tests;
