//! Rewriter: position-preserving emission over one source file.
//!
//! A `Rewriter` streams the original text of a file to an output buffer,
//! verbatim except where a pass's visitor overrides it. The contract that
//! gives the passes their compositionality: any subtree no visitor handles
//! is byte-identical in the output, so a later pass can re-parse the result
//! and trust positions.
//!
//! The visitor holds no reference back to the rewriter; the rewriter invokes
//! it through the single [`RewriteVisitor::maybe_process`] capability and
//! hands itself in as an argument.

use crate::ast::{ClassDecl, ClassMember, SourceFile, Statement, StatementKind};
use crate::diagnostics::{line_col, DiagnosticBag};
use crate::source_map::SourceMapGenerator;
use crate::span::Span;

/// A node offered to a visitor.
pub enum NodeRef<'a> {
    Statement(&'a Statement),
    ClassMember {
        class: &'a ClassDecl,
        member: &'a ClassMember,
    },
}

/// The capability a pass implements to override emission.
pub trait RewriteVisitor {
    /// Inspect `node`. Return `true` when the visitor produced all output
    /// for the node (the rewriter's cursor must then be at or past the
    /// node's end); `false` to have the node copied verbatim.
    fn maybe_process(&mut self, node: NodeRef<'_>, rewriter: &mut Rewriter<'_>) -> bool;
}

/// Position-preserving text emitter for one source file.
pub struct Rewriter<'a> {
    pub file: &'a SourceFile,
    output: String,
    /// Cursor into the input; everything before it has been consumed.
    position: u32,
    /// Output position tracking for source maps.
    line: u32,
    column: u32,
    source_map: Option<SourceMapGenerator>,
    source_index: u32,
    diagnostics: DiagnosticBag,
    /// Set when an internal invariant broke; the current file's output is
    /// then abandoned by the pass driver.
    failed: bool,
}

impl<'a> Rewriter<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        Rewriter {
            file,
            output: String::with_capacity(file.text.len() + file.text.len() / 4),
            position: 0,
            line: 0,
            column: 0,
            source_map: None,
            source_index: 0,
            diagnostics: DiagnosticBag::new(),
            failed: false,
        }
    }

    /// Enable source-map collection, mapping into `output_name`.
    pub fn with_source_map(mut self, output_name: &str) -> Self {
        let mut generator = SourceMapGenerator::new(output_name.to_string());
        self.source_index =
            generator.add_source_with_content(self.file.file_name.clone(), self.file.text.clone());
        self.source_map = Some(generator);
        self
    }

    /// Record a diagnostic at a node's position and keep going.
    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics
            .error(self.file.file_name.as_str(), span, message);
    }

    /// Whether an internal invariant failed for this file.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    /// Copy the verbatim substring `[from, to)` of the input, advancing the
    /// cursor to `to`. Input between the cursor and `from` is dropped; that
    /// is how callers skip source they replace.
    pub fn write_range(&mut self, from: u32, to: u32) {
        if from < self.position || to < from || to as usize > self.file.text.len() {
            self.error(
                Span::new(from, to),
                format!(
                    "rewriter cursor invariant violated: range {}..{} at position {}",
                    from, to, self.position
                ),
            );
            self.failed = true;
            return;
        }
        if self.source_map.is_some() {
            self.map_range(from, to);
        }
        let text = &self.file.text[from as usize..to as usize];
        self.track_output(text);
        self.output.push_str(text);
        self.position = to;
    }

    /// Copy verbatim from the cursor through `to`.
    pub fn write_to(&mut self, to: u32) {
        self.write_range(self.position, to);
    }

    /// Advance the cursor to `to` without emitting the skipped input.
    pub fn skip_to(&mut self, to: u32) {
        if to < self.position || to as usize > self.file.text.len() {
            self.error(
                Span::at(to),
                format!("rewriter cannot skip backwards to {}", to),
            );
            self.failed = true;
            return;
        }
        self.position = to;
    }

    /// Append synthetic text. The cursor does not advance; the text maps to
    /// the current input position.
    pub fn emit(&mut self, text: &str) {
        if let Some(generator) = &mut self.source_map {
            let (in_line, in_col) = line_col(&self.file.text, self.position);
            generator.add_mapping(self.line, self.column, self.source_index, in_line, in_col);
        }
        self.track_output(text);
        self.output.push_str(text);
    }

    /// Dispatch one statement through the visitor, copying it verbatim
    /// (descending into class members) when unhandled.
    pub fn visit(&mut self, statement: &Statement, visitor: &mut dyn RewriteVisitor) {
        if self.failed {
            return;
        }
        if visitor.maybe_process(NodeRef::Statement(statement), self) {
            return;
        }
        self.descend(statement, visitor);
    }

    /// Default traversal for an unhandled statement: classes descend into
    /// their members so member-level overrides still apply; everything else
    /// is copied verbatim.
    pub fn descend(&mut self, statement: &Statement, visitor: &mut dyn RewriteVisitor) {
        match &statement.kind {
            StatementKind::Class(class) => {
                for member in &class.members {
                    if self.failed {
                        return;
                    }
                    if !visitor.maybe_process(
                        NodeRef::ClassMember {
                            class,
                            member,
                        },
                        self,
                    ) {
                        self.write_to(member.span().end);
                    }
                }
                self.write_to(statement.span.end);
            }
            _ => self.write_to(statement.span.end),
        }
    }

    /// Drive the visitor over the whole file and finish.
    pub fn rewrite(mut self, visitor: &mut dyn RewriteVisitor) -> RewriteResult {
        let statements: Vec<_> = self.file.statements.iter().collect();
        for statement in statements {
            self.visit(statement, visitor);
            if self.failed {
                break;
            }
        }
        self.finish()
    }

    /// Copy the remaining input and return the result.
    pub fn finish(mut self) -> RewriteResult {
        if !self.failed {
            self.write_to(self.file.text.len() as u32);
        }
        RewriteResult {
            output: self.output,
            diagnostics: self.diagnostics,
            source_map: self.source_map,
            failed: self.failed,
        }
    }

    /// Add source-map entries for a verbatim copy: one at the range start
    /// and one at each subsequent line start.
    fn map_range(&mut self, from: u32, to: u32) {
        let (mut in_line, in_col) = line_col(&self.file.text, from);
        let Some(generator) = &mut self.source_map else {
            return;
        };
        generator.add_mapping(self.line, self.column, self.source_index, in_line, in_col);
        let text = &self.file.text[from as usize..to as usize];
        let mut out_line = self.line;
        for (idx, _) in text.match_indices('\n') {
            if from as usize + idx + 1 >= to as usize {
                break;
            }
            in_line += 1;
            out_line += 1;
            generator.add_mapping(out_line, 0, self.source_index, in_line, 0);
        }
    }

    /// Track output line/column across appended text.
    fn track_output(&mut self, text: &str) {
        let bytes = text.as_bytes();
        let mut start = 0usize;
        while let Some(offset) = memchr::memchr(b'\n', &bytes[start..]) {
            self.line += 1;
            self.column = 0;
            start += offset + 1;
        }
        let tail = &text[start..];
        if tail.is_ascii() {
            self.column += tail.len() as u32;
        } else {
            self.column += tail.chars().map(|c| c.len_utf16() as u32).sum::<u32>();
        }
    }
}

/// The output of one rewriting pass over one file.
pub struct RewriteResult {
    pub output: String,
    pub diagnostics: DiagnosticBag,
    pub source_map: Option<SourceMapGenerator>,
    pub failed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source_file;

    struct NoopVisitor;

    impl RewriteVisitor for NoopVisitor {
        fn maybe_process(&mut self, _node: NodeRef<'_>, _rewriter: &mut Rewriter<'_>) -> bool {
            false
        }
    }

    /// Prepends a marker comment before every var statement.
    struct MarkVars;

    impl RewriteVisitor for MarkVars {
        fn maybe_process(&mut self, node: NodeRef<'_>, rewriter: &mut Rewriter<'_>) -> bool {
            if let NodeRef::Statement(statement) = node {
                if matches!(statement.kind, StatementKind::Var(_)) {
                    rewriter.write_to(statement.span.start);
                    rewriter.emit("/* marked */ ");
                    rewriter.write_to(statement.span.end);
                    return true;
                }
            }
            false
        }
    }

    fn rewrite(source: &str, visitor: &mut dyn RewriteVisitor) -> RewriteResult {
        let (file, _) = parse_source_file("t.ts", source);
        Rewriter::new(&file).rewrite(visitor)
    }

    #[test]
    fn test_unhandled_input_is_identical() {
        let source = "function f(a: number) { return a; }\nif (x) { y(); }\nclass C { m() {} }\n";
        let result = rewrite(source, &mut NoopVisitor);
        assert!(!result.failed);
        assert_eq!(result.output, source);
    }

    #[test]
    fn test_emit_inserts_synthetic_text() {
        let source = "var a = 1;\nconsole.log(a);\n";
        let result = rewrite(source, &mut MarkVars);
        assert_eq!(result.output, "/* marked */ var a = 1;\nconsole.log(a);\n");
    }

    #[test]
    fn test_cursor_invariant_violation_fails_file() {
        let source = "var a = 1;";
        let (file, _) = parse_source_file("t.ts", source);
        let mut rewriter = Rewriter::new(&file);
        rewriter.write_to(5);
        rewriter.write_range(2, 4); // behind the cursor
        assert!(rewriter.failed());
        let result = rewriter.finish();
        assert!(result.failed);
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn test_source_map_records_mappings() {
        let source = "var a = 1;\nvar b = 2;\n";
        let (file, _) = parse_source_file("t.ts", source);
        let result = Rewriter::new(&file)
            .with_source_map("t.js")
            .rewrite(&mut MarkVars);
        let mut map = result.source_map.expect("map enabled");
        assert!(!map.is_empty());
        let json = map.generate_json();
        assert!(json.contains("\"t.ts\""));
    }
}
