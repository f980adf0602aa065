//! The compiler's two cooperating operand stacks.

use crate::code::Code;
use crate::error::CompileError;
use crate::source::SourceBuffer;

/// One entry on either operand stack.
#[derive(Debug, Clone, PartialEq)]
pub enum StackEntry {
    /// Substitution-safe text: may be inlined anywhere and referenced
    /// repeatedly without re-evaluation cost or side effects.
    Literal(Code),
    /// A pending inline expression, not yet flushed to a named local.
    Expr(Code),
    /// A named `stackN` local holding a previously computed value.
    Slot(String),
    /// The "no program here" marker. Pops as a true absence, never as a
    /// stand-in value.
    Absent,
}

/// Dual operand stack with named-slot bookkeeping.
///
/// The inline stack holds expressions still in flight for a single
/// statement; the compiled stack holds values already flushed to
/// `stackN` locals. Whichever is consulted is decided by whether the
/// inline stack is non-empty. `slot` must return to zero by the end of
/// compilation; violations are structural compiler bugs, not template
/// errors.
#[derive(Debug, Default)]
pub struct Stacks {
    inline: Vec<StackEntry>,
    compiled: Vec<StackEntry>,
    slot: usize,
    slot_names: Vec<String>,
}

impl Stacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_inline(&self) -> bool {
        !self.inline.is_empty()
    }

    pub fn push_literal(&mut self, code: impl Into<Code>) {
        self.inline.push(StackEntry::Literal(code.into()));
    }

    pub fn push_expr(&mut self, code: impl Into<Code>) {
        self.inline.push(StackEntry::Expr(code.into()));
    }

    pub fn push_absent(&mut self) {
        self.inline.push(StackEntry::Absent);
    }

    /// Allocate (or reuse) the next named slot and return its name.
    pub fn incr_slot(&mut self) -> String {
        self.slot += 1;
        if self.slot > self.slot_names.len() {
            self.slot_names.push(format!("stack{}", self.slot));
        }
        self.top_slot_name()
    }

    pub fn top_slot_name(&self) -> String {
        format!("stack{}", self.slot)
    }

    /// Every `stackN` name allocated over the unit's lifetime, for the
    /// local-variable declaration line.
    pub fn slot_names(&self) -> &[String] {
        &self.slot_names
    }

    fn pop_entry(&mut self) -> Result<StackEntry, CompileError> {
        if let Some(entry) = self.inline.pop() {
            return Ok(entry);
        }
        match self.compiled.pop() {
            Some(StackEntry::Slot(name)) => {
                if self.slot == 0 {
                    return Err(CompileError::no_span("invalid stack pop"));
                }
                self.slot -= 1;
                Ok(StackEntry::Slot(name))
            }
            Some(entry) => Ok(entry),
            None => Err(CompileError::no_span("invalid stack pop")),
        }
    }

    /// Pop the active stack; an [`StackEntry::Absent`] entry here means
    /// the opcode stream is malformed.
    pub fn pop(&mut self) -> Result<Code, CompileError> {
        match self.pop_entry()? {
            StackEntry::Literal(code) | StackEntry::Expr(code) => Ok(code),
            StackEntry::Slot(name) => Ok(Code::from(name)),
            StackEntry::Absent => {
                Err(CompileError::no_span("expected a value on the stack"))
            }
        }
    }

    /// Pop the active stack, mapping the absent marker to `None`.
    pub fn pop_opt(&mut self) -> Result<Option<Code>, CompileError> {
        match self.pop_entry()? {
            StackEntry::Literal(code) | StackEntry::Expr(code) => {
                Ok(Some(code))
            }
            StackEntry::Slot(name) => Ok(Some(Code::from(name))),
            StackEntry::Absent => Ok(None),
        }
    }

    /// Non-destructive [`pop`](Self::pop).
    pub fn top(&self) -> Result<Code, CompileError> {
        let stack = if self.inline.is_empty() {
            &self.compiled
        } else {
            &self.inline
        };
        match stack.last() {
            Some(StackEntry::Literal(code) | StackEntry::Expr(code)) => {
                Ok(code.clone())
            }
            Some(StackEntry::Slot(name)) => Ok(Code::from(name.as_str())),
            Some(StackEntry::Absent) => {
                Err(CompileError::no_span("expected a value on the stack"))
            }
            None => Err(CompileError::no_span("invalid stack pop")),
        }
    }

    /// Replace the top of the inline stack through `rewrite`.
    ///
    /// A literal top is rewritten algebraically with no temporary. A
    /// non-literal top is assigned to a fresh slot, the rewrite runs
    /// against the slot name, and the slot is released immediately: the
    /// assignment is embedded in the pushed-back expression, so chained
    /// rewrites reuse one physical slot.
    pub fn replace_top(
        &mut self,
        rewrite: impl FnOnce(&Code) -> Code,
    ) -> Result<(), CompileError> {
        let Some(top) = self.inline.pop() else {
            return Err(CompileError::no_span(
                "stack rewrite outside an inline expression",
            ));
        };
        let replaced = match top {
            StackEntry::Literal(lit) => {
                let item = rewrite(&lit);
                Code::from("(").and(lit).and(item).and(")")
            }
            StackEntry::Slot(name) => {
                let item = rewrite(&Code::from(name.as_str()));
                Code::from("(").and(name).and(item).and(")")
            }
            StackEntry::Expr(expr) => {
                let name = self.incr_slot();
                let item = rewrite(&Code::from(name.as_str()));
                self.slot -= 1;
                Code::from("((")
                    .and(name)
                    .and(" = ")
                    .and(expr)
                    .and(")")
                    .and(item)
                    .and(")")
            }
            StackEntry::Absent => {
                return Err(CompileError::no_span(
                    "stack rewrite on a missing value",
                ));
            }
        };
        self.inline.push(StackEntry::Expr(replaced));
        Ok(())
    }

    /// Materialize every pending inline entry into a named local, in
    /// order, and move it onto the compiled stack. Literals move as-is.
    pub fn flush_inline(&mut self, out: &mut SourceBuffer) {
        let pending = std::mem::take(&mut self.inline);
        for entry in pending {
            match entry {
                StackEntry::Expr(expr) => {
                    let name = self.incr_slot();
                    out.push_stmt(
                        Code::from(name.as_str())
                            .and(" = ")
                            .and(expr)
                            .and(";"),
                    );
                    self.compiled.push(StackEntry::Slot(name));
                }
                entry => self.compiled.push(entry),
            }
        }
    }

    /// End-of-compile invariant: both stacks empty, no live slots.
    pub fn assert_balanced(&self) -> Result<(), CompileError> {
        if self.slot != 0
            || !self.inline.is_empty()
            || !self.compiled.is_empty()
        {
            return Err(CompileError::no_span(
                "compile completed with content left on stack",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasTable;

    fn render(code: &Code) -> String {
        code.render(&AliasTable::new())
    }

    #[test]
    fn literal_rewrite_allocates_no_slot() {
        let mut stacks = Stacks::new();
        stacks.push_literal("depth0");
        stacks
            .replace_top(|current| {
                Code::from(" != null ? ")
                    .and(current.clone())
                    .and(".name : ")
                    .and(current.clone())
            })
            .unwrap();
        let code = stacks.pop().unwrap();
        assert_eq!(render(&code), "(depth0 != null ? depth0.name : depth0)");
        assert!(stacks.slot_names().is_empty());
        stacks.assert_balanced().unwrap();
    }

    #[test]
    fn expr_rewrite_reuses_one_slot() {
        let mut stacks = Stacks::new();
        stacks.push_expr("helpers.lookup()");
        stacks
            .replace_top(|c| Code::from(" && ").and(c.clone()).and(".a"))
            .unwrap();
        stacks
            .replace_top(|c| Code::from(" && ").and(c.clone()).and(".b"))
            .unwrap();
        let code = stacks.pop().unwrap();
        assert_eq!(
            render(&code),
            "((stack1 = ((stack1 = helpers.lookup()) && stack1.a)) && stack1.b)"
        );
        // Chained rewrites share the same physical slot.
        assert_eq!(stacks.slot_names(), ["stack1".to_string()]);
        stacks.assert_balanced().unwrap();
    }

    #[test]
    fn flush_moves_literals_and_materializes_exprs() {
        let mut stacks = Stacks::new();
        let mut out = SourceBuffer::new(false);
        stacks.push_literal("\"lit\"");
        stacks.push_expr("a + b");
        stacks.flush_inline(&mut out);

        assert!(!stacks.is_inline());
        let aliases = AliasTable::new();
        let body = out.merge_plain(&aliases);
        assert_eq!(body, "  stack1 = a + b;\n");

        // Compiled stack pops in reverse order; the slot pop releases it.
        assert_eq!(render(&stacks.pop().unwrap()), "stack1");
        assert_eq!(render(&stacks.pop().unwrap()), "\"lit\"");
        stacks.assert_balanced().unwrap();
    }

    #[test]
    fn absent_round_trips_through_flush() {
        let mut stacks = Stacks::new();
        let mut out = SourceBuffer::new(false);
        stacks.push_absent();
        stacks.flush_inline(&mut out);
        assert_eq!(stacks.pop_opt().unwrap(), None);
        stacks.assert_balanced().unwrap();
    }

    #[test]
    fn pop_on_empty_stack_is_fatal() {
        let mut stacks = Stacks::new();
        let err = stacks.pop().unwrap_err();
        assert_eq!(err.message, "invalid stack pop");
    }

    #[test]
    fn unbalanced_stack_is_fatal() {
        let mut stacks = Stacks::new();
        stacks.push_literal("x");
        let err = stacks.assert_balanced().unwrap_err();
        assert!(err.message.contains("content left on stack"));
    }

    #[test]
    fn rewrite_requires_inline_entries() {
        let mut stacks = Stacks::new();
        let err = stacks.replace_top(|c| c.clone()).unwrap_err();
        assert!(err.message.contains("inline"));
    }
}
