use crate::op::{BlockParamRef, IdSource, Opcode, ParamKind, StringParam};
use crate::program::{Program, Span, Spanned};

/// Builds an opcode [`Program`] by hand.
///
/// Convenience methods mirror the opcode set one to one; [`op`](Self::op)
/// and [`op_at`](Self::op_at) accept any opcode directly. Nested block
/// bodies are registered with [`child`](Self::child), which returns the
/// index to pass to [`push_program`](Self::push_program).
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            program: Program::default(),
        }
    }

    pub fn finish(self) -> Program {
        self.program
    }

    pub fn op(&mut self, op: Opcode) {
        self.program.opcodes.push(op.into());
    }

    pub fn op_at(&mut self, op: Opcode, span: Span) {
        self.program.opcodes.push(Spanned {
            op,
            span: Some(span),
        });
    }

    /// Register a nested block body and return its reference index.
    pub fn child(&mut self, program: Program) -> usize {
        self.program.children.push(program);
        self.program.children.len() - 1
    }

    // ── flags ──────────────────────────────────────────────────────

    pub fn simple(&mut self) {
        self.program.is_simple = true;
    }

    pub fn block_params(&mut self, count: usize) {
        self.program.block_params = count;
    }

    pub fn uses_partial(&mut self) {
        self.program.use_partial = true;
    }

    pub fn uses_depths(&mut self) {
        self.program.use_depths = true;
    }

    pub fn uses_decorators(&mut self) {
        self.program.use_decorators = true;
    }

    pub fn uses_block_params(&mut self) {
        self.program.use_block_params = true;
    }

    // ── opcodes ────────────────────────────────────────────────────

    pub fn content(&mut self, text: &str) {
        self.op(Opcode::AppendContent {
            content: text.to_string(),
        });
    }

    pub fn append(&mut self) {
        self.op(Opcode::Append);
    }

    pub fn append_escaped(&mut self) {
        self.op(Opcode::AppendEscaped);
    }

    pub fn get_context(&mut self, depth: usize) {
        self.op(Opcode::GetContext { depth });
    }

    pub fn push_context(&mut self) {
        self.op(Opcode::PushContext);
    }

    pub fn lookup_on_context(
        &mut self,
        parts: &[&str],
        falsy: bool,
        strict: bool,
        scoped: bool,
    ) {
        self.op(Opcode::LookupOnContext {
            parts: parts.iter().map(|p| p.to_string()).collect(),
            falsy,
            strict,
            scoped,
        });
    }

    /// Plain context lookup with all modifiers off.
    pub fn lookup(&mut self, parts: &[&str]) {
        self.lookup_on_context(parts, false, false, false);
    }

    pub fn lookup_block_param(
        &mut self,
        frame: usize,
        index: usize,
        parts: &[&str],
    ) {
        self.op(Opcode::LookupBlockParam {
            param: BlockParamRef { frame, index },
            parts: parts.iter().map(|p| p.to_string()).collect(),
        });
    }

    pub fn lookup_data(&mut self, depth: usize, parts: &[&str], strict: bool) {
        self.op(Opcode::LookupData {
            depth,
            parts: parts.iter().map(|p| p.to_string()).collect(),
            strict,
        });
    }

    pub fn resolve_possible_lambda(&mut self) {
        self.op(Opcode::ResolvePossibleLambda);
    }

    pub fn push_string_param(&mut self, value: StringParam, kind: ParamKind) {
        self.op(Opcode::PushStringParam { value, kind });
    }

    pub fn empty_hash(&mut self) {
        self.op(Opcode::EmptyHash { omit_empty: false });
    }

    pub fn omitted_hash(&mut self) {
        self.op(Opcode::EmptyHash { omit_empty: true });
    }

    pub fn push_hash(&mut self) {
        self.op(Opcode::PushHash);
    }

    pub fn pop_hash(&mut self) {
        self.op(Opcode::PopHash);
    }

    pub fn push_string(&mut self, value: &str) {
        self.op(Opcode::PushString {
            value: value.to_string(),
        });
    }

    pub fn push_literal(&mut self, value: &str) {
        self.op(Opcode::PushLiteral {
            value: value.to_string(),
        });
    }

    pub fn push_program(&mut self, program: Option<usize>) {
        self.op(Opcode::PushProgram { program });
    }

    pub fn push_id(&mut self, id: IdSource) {
        self.op(Opcode::PushId { id });
    }

    pub fn register_decorator(&mut self, params: usize, name: &str) {
        self.op(Opcode::RegisterDecorator {
            params,
            name: name.to_string(),
        });
    }

    pub fn invoke_helper(&mut self, params: usize, name: &str, is_simple: bool) {
        self.op(Opcode::InvokeHelper {
            params,
            name: name.to_string(),
            is_simple,
        });
    }

    pub fn invoke_known_helper(&mut self, params: usize, name: &str) {
        self.op(Opcode::InvokeKnownHelper {
            params,
            name: name.to_string(),
        });
    }

    pub fn invoke_ambiguous(&mut self, name: &str, helper_call: bool) {
        self.op(Opcode::InvokeAmbiguous {
            name: name.to_string(),
            helper_call,
        });
    }

    pub fn invoke_partial(&mut self, dynamic: bool, name: &str, indent: &str) {
        self.op(Opcode::InvokePartial {
            dynamic,
            name: name.to_string(),
            indent: indent.to_string(),
        });
    }

    pub fn assign_to_hash(&mut self, key: &str) {
        self.op(Opcode::AssignToHash {
            key: key.to_string(),
        });
    }

    pub fn block_value(&mut self, name: &str) {
        self.op(Opcode::BlockValue {
            name: name.to_string(),
        });
    }

    pub fn ambiguous_block_value(&mut self) {
        self.op(Opcode::AmbiguousBlockValue);
    }
}
