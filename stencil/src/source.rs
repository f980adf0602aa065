//! Ordered fragment buffer for emitted source, plus the merge pass that
//! decides the compiled function's return strategy.

use opcode::Span;

use crate::alias::AliasTable;
use crate::code::{Code, quoted_string};

/// One emitted source fragment. `appends` marks "this value becomes part
/// of the rendered output" as opposed to ordinary control-flow source.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub code: Code,
    pub appends: bool,
    pub span: Option<Span>,
}

impl Fragment {
    fn stmt(code: impl Into<Code>, span: Option<Span>) -> Self {
        Self {
            code: code.into(),
            appends: false,
            span,
        }
    }
}

/// Accumulates fragments in emission order.
///
/// Static template text is coalesced here: adjacent content runs build up
/// in `pending` and flush as one quoted append right before the next
/// statement (and once more at end of stream).
#[derive(Debug, Default)]
pub struct SourceBuffer {
    fragments: Vec<Fragment>,
    pending: Option<String>,
    pending_span: Option<Span>,
    pub current_span: Option<Span>,
    is_simple: bool,
}

impl SourceBuffer {
    pub fn new(is_simple: bool) -> Self {
        Self {
            is_simple,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Accumulate static output text.
    pub fn buffer_content(&mut self, text: &str) {
        match &mut self.pending {
            Some(pending) => pending.push_str(text),
            None => {
                self.pending = Some(text.to_string());
                self.pending_span = self.current_span;
            }
        }
    }

    /// Flush any coalesced static text as a single append fragment.
    pub fn flush_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            let span = self.pending_span.take();
            let fragment = self.append_fragment(
                Code::from(quoted_string(&pending)),
                span,
            );
            self.fragments.push(fragment);
        }
    }

    /// Push a control-flow statement, flushing pending content first.
    pub fn push_stmt(&mut self, code: Code) {
        self.flush_pending();
        self.fragments.push(Fragment::stmt(code, self.current_span));
    }

    /// Push `code` at the front (used to wrap decorator prologues).
    pub fn prepend_stmt(&mut self, code: Code) {
        self.fragments.insert(0, Fragment::stmt(code, None));
    }

    /// Push a value append, flushing pending content first. Simple
    /// templates return the value directly instead of buffering it.
    pub fn push_append(&mut self, code: Code) {
        self.flush_pending();
        let fragment = self.append_fragment(code, self.current_span);
        self.fragments.push(fragment);
    }

    /// The statement form of an append, for embedding inside braces where
    /// emission position matters: `return <code>;` for simple templates,
    /// `buffer += <code>;` otherwise.
    pub fn append_expr(&self, code: Code) -> Code {
        if self.is_simple {
            Code::from("return ").and(code).and(";")
        } else {
            Code::from("buffer += ").and(code).and(";")
        }
    }

    fn append_fragment(&self, code: Code, span: Option<Span>) -> Fragment {
        if self.is_simple {
            Fragment::stmt(Code::from("return ").and(code).and(";"), span)
        } else {
            Fragment {
                code,
                appends: true,
                span,
            }
        }
    }

    /// The merge pass: stitch buffer runs together, pick the return
    /// strategy, and prepend the `var` declaration line.
    ///
    /// `var_declarations` arrives as `", name"` segments from the
    /// assembler; the buffer local is added here when one is needed. If
    /// the whole template turns out to be appends (and is structurally
    /// simple), no buffer is allocated and the function collapses to a
    /// single `return <concatenation>;`. A buffer run at the very end is
    /// folded into `return buffer + ...;` to skip one reassignment; a
    /// buffer run at the very start becomes the buffer initializer.
    pub fn merge(
        &mut self,
        var_declarations: &str,
        aliases: &AliasTable,
        force_buffer: bool,
    ) -> String {
        let mut append_only = !force_buffer;
        let mut append_first = false;
        let mut source_seen = false;
        let mut run: Option<(usize, usize)> = None;

        for i in 0..self.fragments.len() {
            if self.fragments[i].appends {
                match &mut run {
                    Some((_, end)) => {
                        self.fragments[i].code.prepend("  + ");
                        *end = i;
                    }
                    None => run = Some((i, i)),
                }
            } else {
                if let Some((start, end)) = run.take() {
                    if !source_seen {
                        append_first = true;
                    } else {
                        self.fragments[start].code.prepend("buffer += ");
                    }
                    self.fragments[end].code.push(";");
                }
                source_seen = true;
                if !self.is_simple {
                    append_only = false;
                }
            }
        }

        let mut declarations = var_declarations.to_string();
        if append_only {
            if let Some((start, end)) = run {
                self.fragments[start].code.prepend("return ");
                self.fragments[end].code.push(";");
            } else if !source_seen {
                self.fragments
                    .push(Fragment::stmt("return \"\";", None));
            }
        } else {
            declarations.push_str(", buffer = ");
            if !append_first {
                declarations.push_str("\"\"");
            }
            if let Some((start, end)) = run {
                self.fragments[start].code.prepend("return buffer + ");
                self.fragments[end].code.push(";");
            } else {
                self.fragments
                    .push(Fragment::stmt("return buffer;", None));
            }
        }

        if !declarations.is_empty() {
            let line = format!(
                "var {}{}",
                &declarations[2..],
                if append_first { "" } else { ";" }
            );
            self.fragments.insert(0, Fragment::stmt(line, None));
        }

        self.merge_plain(aliases)
    }

    /// Flatten the fragments, one indented line each.
    pub fn merge_plain(&self, aliases: &AliasTable) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            out.push_str("  ");
            out.push_str(&fragment.code.render(aliases));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append(buffer: &mut SourceBuffer, code: &str) {
        buffer.push_append(Code::from(code));
    }

    fn stmt(buffer: &mut SourceBuffer, code: &str) {
        buffer.push_stmt(Code::from(code));
    }

    fn merged(buffer: &mut SourceBuffer) -> String {
        buffer.merge("", &AliasTable::new(), false)
    }

    #[test]
    fn empty_template_returns_empty_string() {
        let mut buffer = SourceBuffer::new(false);
        assert_eq!(merged(&mut buffer), "  return \"\";\n");
    }

    #[test]
    fn simple_template_coalesces_content() {
        let mut buffer = SourceBuffer::new(true);
        buffer.buffer_content("Hello, ");
        buffer.buffer_content("World!");
        buffer.flush_pending();
        assert_eq!(merged(&mut buffer), "  return \"Hello, World!\";\n");
    }

    #[test]
    fn pure_append_run_skips_the_buffer() {
        let mut buffer = SourceBuffer::new(false);
        append(&mut buffer, "\"a\"");
        append(&mut buffer, "value");
        append(&mut buffer, "\"b\"");
        assert_eq!(
            merged(&mut buffer),
            "  return \"a\"\n    + value\n    + \"b\";\n"
        );
    }

    #[test]
    fn leading_run_becomes_the_buffer_initializer() {
        let mut buffer = SourceBuffer::new(false);
        append(&mut buffer, "\"lead\"");
        stmt(&mut buffer, "stack1 = f();");
        assert_eq!(
            merged(&mut buffer),
            "  var buffer = \n  \"lead\";\n  stack1 = f();\n  return buffer;\n"
        );
    }

    #[test]
    fn interior_run_gets_a_compound_assignment() {
        let mut buffer = SourceBuffer::new(false);
        stmt(&mut buffer, "stack1 = f();");
        append(&mut buffer, "\"mid\"");
        append(&mut buffer, "stack1");
        stmt(&mut buffer, "stack1 = g();");
        assert_eq!(
            merged(&mut buffer),
            "  var buffer = \"\";\n  stack1 = f();\n  buffer += \"mid\"\n    + stack1;\n  stack1 = g();\n  return buffer;\n"
        );
    }

    #[test]
    fn trailing_run_folds_into_the_return() {
        let mut buffer = SourceBuffer::new(false);
        stmt(&mut buffer, "stack1 = f();");
        append(&mut buffer, "\"tail\"");
        assert_eq!(
            merged(&mut buffer),
            "  var buffer = \"\";\n  stack1 = f();\n  return buffer + \"tail\";\n"
        );
    }

    #[test]
    fn declarations_join_onto_one_var_line() {
        let mut buffer = SourceBuffer::new(false);
        stmt(&mut buffer, "stack1 = f();");
        let body = buffer.merge(", stack1, helper", &AliasTable::new(), false);
        assert_eq!(
            body,
            "  var stack1, helper, buffer = \"\";\n  stack1 = f();\n  return buffer;\n"
        );
    }

    #[test]
    fn simple_template_keeps_declarations_without_buffer() {
        let mut buffer = SourceBuffer::new(true);
        append(&mut buffer, "((stack1 = value) != null ? stack1 : \"\")");
        let body = buffer.merge(", stack1", &AliasTable::new(), false);
        assert_eq!(
            body,
            "  var stack1;\n  return ((stack1 = value) != null ? stack1 : \"\");\n"
        );
    }

    #[test]
    fn forced_buffer_defeats_the_fast_path() {
        let mut buffer = SourceBuffer::new(false);
        append(&mut buffer, "\"only\"");
        let body = buffer.merge("", &AliasTable::new(), true);
        assert_eq!(body, "  var buffer = \"\";\n  return buffer + \"only\";\n");
    }

    #[test]
    fn pending_content_flushes_before_statements() {
        let mut buffer = SourceBuffer::new(false);
        buffer.buffer_content("a");
        buffer.buffer_content("b");
        stmt(&mut buffer, "stack1 = f();");
        buffer.buffer_content("c");
        buffer.flush_pending();
        assert_eq!(
            merged(&mut buffer),
            "  var buffer = \n  \"ab\";\n  stack1 = f();\n  return buffer + \"c\";\n"
        );
    }
}
