//! The opcode dispatcher, child program compiler, and function assembler.

use opcode::{
    BlockParamRef, IdSource, Opcode, ParamKind, Program, Spanned, StringParam,
};

use crate::alias::AliasTable;
use crate::code::{
    Code, function_call, name_lookup, object_literal, quoted_string,
};
use crate::error::CompileError;
use crate::source::SourceBuffer;
use crate::stack::Stacks;
use crate::template::{Features, Template};

/// Compile-time configuration, as handed down by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Track string-mode parameter provenance.
    pub string_params: bool,
    /// Track value provenance ids.
    pub track_ids: bool,
    /// Legacy depth-aware lookup semantics for root-level paths.
    pub compat: bool,
    /// Throw on missing path segments instead of null-coalescing.
    pub strict: bool,
    /// Assume intermediate path segments are objects.
    pub assume_objects: bool,
    /// Thread ambient request-time data through nested calls.
    pub data: bool,
    /// The upstream emitter resolved every helper statically, so no
    /// ambiguous-invocation opcodes appear in the stream.
    pub known_helpers_only: bool,
}

/// Compile an opcode program into a precompiled [`Template`].
pub fn compile(
    program: &Program,
    opts: &CompileOptions,
) -> Result<Template, CompileError> {
    let mut ctx = CompileContext::default();
    let mut unit = Compiler::new(program, opts);
    let compiled = unit.run(&mut ctx)?;

    let features = Features {
        decorators: compiled.decorator.is_some()
            || ctx.decorators.iter().any(Option::is_some),
        partials: program.use_partial,
        data: opts.data,
        depths: unit.use_depths,
        block_params: unit.use_block_params,
        compat: opts.compat,
    };
    log::debug!(
        "compiled template: {} nested program(s), features {features:?}",
        ctx.programs.iter().filter(|p| p.is_some()).count(),
    );

    Ok(Template {
        main: compiled.body,
        main_decorator: compiled.decorator,
        programs: ctx.programs,
        program_decorators: ctx.decorators,
        features,
    })
}

/// Dedup tables shared by the whole compilation unit: one slot per
/// compiled nested program, threaded by reference through every
/// recursive child compile.
#[derive(Default)]
struct CompileContext<'p> {
    programs: Vec<Option<String>>,
    decorators: Vec<Option<String>>,
    environments: Vec<Option<ChildEntry<'p>>>,
}

struct ChildEntry<'p> {
    program: &'p Program,
    index: usize,
    use_depths: bool,
    use_block_params: bool,
}

impl<'p> CompileContext<'p> {
    fn find_matching(&self, child: &Program) -> Option<&ChildEntry<'p>> {
        self.environments
            .iter()
            .flatten()
            .find(|entry| entry.program.same_shape(child))
    }

    fn set_slot<T>(list: &mut Vec<Option<T>>, index: usize, value: T) {
        if list.len() <= index {
            list.resize_with(index + 1, || None);
        }
        list[index] = Some(value);
    }
}

struct CompiledFunction {
    body: String,
    decorator: Option<String>,
}

/// Per-function compile state. One instance per program in the tree;
/// nested programs get fresh instances sharing the [`CompileContext`].
pub(crate) struct Compiler<'a> {
    pub(crate) opts: &'a CompileOptions,
    program: &'a Program,
    source: SourceBuffer,
    decorators: SourceBuffer,
    pub(crate) stacks: Stacks,
    pub(crate) aliases: AliasTable,
    registers: Vec<String>,
    hash: Option<HashPack>,
    hash_stack: Vec<HashPack>,
    last_context: usize,
    last_helper: Option<Code>,
    pub(crate) use_depths: bool,
    pub(crate) use_block_params: bool,
    child_index: Vec<usize>,
    force_buffer: bool,
}

/// Parallel keyed lists for one level of hash construction.
#[derive(Debug, Default)]
struct HashPack {
    values: Vec<(String, Code)>,
    types: Vec<(String, Code)>,
    contexts: Vec<(String, Code)>,
    ids: Vec<(String, Code)>,
}

impl<'a> Compiler<'a> {
    fn new(program: &'a Program, opts: &'a CompileOptions) -> Self {
        Self {
            opts,
            program,
            source: SourceBuffer::new(program.is_simple),
            decorators: SourceBuffer::new(false),
            stacks: Stacks::new(),
            aliases: AliasTable::new(),
            registers: Vec::new(),
            hash: None,
            hash_stack: Vec::new(),
            last_context: 0,
            last_helper: None,
            use_depths: false,
            use_block_params: false,
            child_index: Vec::new(),
            force_buffer: false,
        }
    }

    fn run(
        &mut self,
        ctx: &mut CompileContext<'a>,
    ) -> Result<CompiledFunction, CompileError> {
        self.compile_children(ctx)?;

        self.use_depths |= self.program.use_depths
            || self.program.use_decorators
            || self.opts.compat;
        self.use_block_params |= self.program.use_block_params;

        let program = self.program;
        let mut first_span = None;
        for Spanned { op, span } in &program.opcodes {
            self.source.current_span = *span;
            if first_span.is_none() {
                first_span = *span;
            }
            log::trace!("dispatch {op}");
            self.dispatch(op).map_err(|err| err.with_span(*span))?;
        }

        // Flush any trailing static content before checking balance.
        self.source.current_span = first_span;
        self.source.flush_pending();
        self.stacks.assert_balanced()?;

        let has_decorators = !self.decorators.is_empty();
        let body = self.create_function_context();
        let decorator = has_decorators.then(|| self.wrap_decorators());
        Ok(CompiledFunction { body, decorator })
    }

    /// Compile every nested block body depth-first, reusing an existing
    /// program slot when a structurally identical block was already
    /// compiled anywhere in the unit.
    fn compile_children(
        &mut self,
        ctx: &mut CompileContext<'a>,
    ) -> Result<(), CompileError> {
        let program = self.program;
        for child in &program.children {
            if let Some(existing) = ctx.find_matching(child) {
                let (index, use_depths, use_block_params) = (
                    existing.index,
                    existing.use_depths,
                    existing.use_block_params,
                );
                self.child_index.push(index);
                self.use_depths |= use_depths;
                self.use_block_params |= use_block_params;
                continue;
            }

            // Reserve a slot up front so programs compiled inside the
            // recursion never collide with this child's index.
            ctx.programs.push(None);
            let index = ctx.programs.len();

            let mut sub = Compiler::new(child, self.opts);
            let compiled = sub.run(ctx)?;
            self.use_depths |= sub.use_depths;
            self.use_block_params |= sub.use_block_params;

            CompileContext::set_slot(&mut ctx.programs, index, compiled.body);
            if let Some(decorator) = compiled.decorator {
                CompileContext::set_slot(
                    &mut ctx.decorators,
                    index,
                    decorator,
                );
            }
            CompileContext::set_slot(
                &mut ctx.environments,
                index,
                ChildEntry {
                    program: child,
                    index,
                    use_depths: self.use_depths,
                    use_block_params: self.use_block_params,
                },
            );
            self.child_index.push(index);
        }
        Ok(())
    }

    fn dispatch(&mut self, op: &Opcode) -> Result<(), CompileError> {
        match op {
            Opcode::AppendContent { content } => {
                self.source.buffer_content(content);
                Ok(())
            }
            Opcode::Append => self.append(),
            Opcode::AppendEscaped => self.append_escaped(),
            Opcode::GetContext { depth } => {
                self.last_context = *depth;
                Ok(())
            }
            Opcode::PushContext => {
                self.push_context();
                Ok(())
            }
            Opcode::LookupOnContext {
                parts,
                falsy,
                strict,
                scoped,
            } => self.lookup_on_context(parts, *falsy, *strict, *scoped),
            Opcode::LookupBlockParam { param, parts } => {
                self.lookup_block_param(param, parts)
            }
            Opcode::LookupData {
                depth,
                parts,
                strict,
            } => self.lookup_data(*depth, parts, *strict),
            Opcode::ResolvePossibleLambda => self.resolve_possible_lambda(),
            Opcode::PushStringParam { value, kind } => {
                self.push_string_param(value, *kind);
                Ok(())
            }
            Opcode::EmptyHash { omit_empty } => {
                self.empty_hash(*omit_empty);
                Ok(())
            }
            Opcode::PushHash => {
                self.push_hash();
                Ok(())
            }
            Opcode::PopHash => self.pop_hash(),
            Opcode::PushString { value } => {
                self.push_string(value);
                Ok(())
            }
            Opcode::PushLiteral { value } => {
                self.stacks.push_literal(value.as_str());
                Ok(())
            }
            Opcode::PushProgram { program } => self.push_program(*program),
            Opcode::PushId { id } => {
                self.push_id(id);
                Ok(())
            }
            Opcode::RegisterDecorator { params, name } => {
                self.register_decorator(*params, name)
            }
            Opcode::InvokeHelper {
                params,
                name,
                is_simple,
            } => self.invoke_helper(*params, name, *is_simple),
            Opcode::InvokeKnownHelper { params, name } => {
                self.invoke_known_helper(*params, name)
            }
            Opcode::InvokeAmbiguous { name, helper_call } => {
                self.invoke_ambiguous(name, *helper_call)
            }
            Opcode::InvokePartial {
                dynamic,
                name,
                indent,
            } => self.invoke_partial(*dynamic, name, indent),
            Opcode::AssignToHash { key } => self.assign_to_hash(key),
            Opcode::BlockValue { name } => self.block_value(name),
            Opcode::AmbiguousBlockValue => self.ambiguous_block_value(),
        }
    }

    // ── value emission ─────────────────────────────────────────────

    /// Append the top of the stack to the output. Null/undefined values
    /// contribute nothing; falsy-but-defined values still render, so the
    /// guard is `!= null`, never truthiness.
    fn append(&mut self) -> Result<(), CompileError> {
        if self.stacks.is_inline() {
            self.stacks.replace_top(|current| {
                Code::from(" != null ? ")
                    .and(current.clone())
                    .and(" : \"\"")
            })?;
            let value = self.stacks.pop()?;
            self.source.push_append(value);
        } else {
            let local = self.stacks.pop()?;
            let guarded = Code::from("if (")
                .and(local.clone())
                .and(" != null) { ")
                .and(self.source.append_expr(local))
                .and(" }");
            self.source.push_stmt(guarded);
            if self.program.is_simple {
                let empty = self.source.append_expr(Code::from("''"));
                self.source
                    .push_stmt(Code::from("else { ").and(empty).and(" }"));
            }
        }
        Ok(())
    }

    fn append_escaped(&mut self) -> Result<(), CompileError> {
        let value = self.stacks.pop()?;
        let escape =
            Code::alias(self.aliases.intern("container.escapeExpression"));
        self.source.push_append(escape.and("(").and(value).and(")"));
        Ok(())
    }

    // ── path resolution ────────────────────────────────────────────

    pub(crate) fn context_name(&self, depth: usize) -> String {
        if self.use_depths && depth > 0 {
            format!("depths[{depth}]")
        } else {
            format!("depth{depth}")
        }
    }

    fn push_context(&mut self) {
        self.stacks.push_literal(self.context_name(self.last_context));
    }

    fn depthed_lookup(&mut self, name: &str) -> Code {
        Code::alias(self.aliases.intern("container.lookup"))
            .and(format!("(depths, {})", quoted_string(name)))
    }

    fn lookup_on_context(
        &mut self,
        parts: &[String],
        falsy: bool,
        strict: bool,
        scoped: bool,
    ) -> Result<(), CompileError> {
        let mut start = 0;
        match parts.first() {
            Some(first)
                if !scoped && self.opts.compat && self.last_context == 0 =>
            {
                // Root-level compat lookups defer the undefined handling
                // to the runtime's depthed query.
                let root = self.depthed_lookup(first);
                self.stacks.push_expr(root);
                start = 1;
            }
            _ => self.push_context(),
        }
        self.resolve_path(parts, start, falsy, strict)
    }

    fn lookup_block_param(
        &mut self,
        param: &BlockParamRef,
        parts: &[String],
    ) -> Result<(), CompileError> {
        self.use_block_params = true;
        self.stacks
            .push_expr(format!("blockParams[{}][{}]", param.frame, param.index));
        self.resolve_path(parts, 1, false, false)
    }

    fn lookup_data(
        &mut self,
        depth: usize,
        parts: &[String],
        strict: bool,
    ) -> Result<(), CompileError> {
        if depth == 0 {
            self.stacks.push_literal("data");
        } else {
            self.stacks
                .push_literal(format!("container.data(data, {depth})"));
        }
        self.resolve_path(parts, 0, true, strict)
    }

    fn resolve_path(
        &mut self,
        parts: &[String],
        start: usize,
        falsy: bool,
        strict: bool,
    ) -> Result<(), CompileError> {
        if self.opts.strict || self.opts.assume_objects {
            let resolved = self
                .strict_lookup(self.opts.strict && strict, parts, start)?;
            self.stacks.push_expr(resolved);
            return Ok(());
        }

        for part in &parts[start.min(parts.len())..] {
            self.stacks.replace_top(|current| {
                let lookup = name_lookup(current.clone(), part);
                if falsy {
                    Code::from(" && ").and(lookup)
                } else {
                    // Zero and false must survive the chain; only
                    // null/undefined fall back to the parent.
                    Code::from(" != null ? ")
                        .and(lookup)
                        .and(" : ")
                        .and(current.clone())
                }
            })?;
        }
        Ok(())
    }

    /// Strict-mode resolution: a plain dotted chain, with the terminal
    /// segment asserted through the runtime when requested.
    fn strict_lookup(
        &mut self,
        require_terminal: bool,
        parts: &[String],
        start: usize,
    ) -> Result<Code, CompileError> {
        let mut resolved = self.stacks.pop()?;
        let end = if require_terminal {
            parts.len().saturating_sub(1)
        } else {
            parts.len()
        };
        for part in &parts[start.min(end)..end] {
            resolved = name_lookup(resolved, part);
        }
        if require_terminal {
            if let Some(terminal) = parts.last() {
                resolved = Code::alias(self.aliases.intern("container.strict"))
                    .and("(")
                    .and(resolved)
                    .and(", ")
                    .and(quoted_string(terminal))
                    .and(")");
            }
        }
        Ok(resolved)
    }

    fn resolve_possible_lambda(&mut self) -> Result<(), CompileError> {
        let value = self.stacks.pop()?;
        let lambda = Code::alias(self.aliases.intern("container.lambda"));
        self.stacks.push_expr(
            lambda
                .and("(")
                .and(value)
                .and(", ")
                .and(self.context_name(0))
                .and(")"),
        );
        Ok(())
    }

    // ── parameters and hashes ──────────────────────────────────────

    fn push_string(&mut self, value: &str) {
        self.stacks.push_literal(quoted_string(value));
    }

    fn push_string_param(&mut self, value: &StringParam, kind: ParamKind) {
        self.push_context();
        self.push_string(kind.as_str());

        // A subexpression's value is pushed by its own opcodes right
        // after this one.
        if kind != ParamKind::SubExpression {
            match value {
                StringParam::Text(text) => self.push_string(text),
                StringParam::Literal(raw) => {
                    self.stacks.push_literal(raw.as_str())
                }
            }
        }
    }

    fn empty_hash(&mut self, omit_empty: bool) {
        if self.opts.track_ids {
            self.stacks.push_expr("{}"); // hash ids
        }
        if self.opts.string_params {
            self.stacks.push_expr("{}"); // hash contexts
            self.stacks.push_expr("{}"); // hash types
        }
        self.stacks
            .push_literal(if omit_empty { "undefined" } else { "{}" });
    }

    fn push_hash(&mut self) {
        if let Some(open) = self.hash.take() {
            self.hash_stack.push(open);
        }
        self.hash = Some(HashPack::default());
    }

    fn pop_hash(&mut self) -> Result<(), CompileError> {
        let hash = self.hash.take().ok_or_else(|| {
            CompileError::no_span("hash popped with no hash open")
        })?;
        self.hash = self.hash_stack.pop();

        if self.opts.track_ids {
            self.stacks.push_expr(object_literal(hash.ids));
        }
        if self.opts.string_params {
            self.stacks.push_expr(object_literal(hash.contexts));
            self.stacks.push_expr(object_literal(hash.types));
        }
        self.stacks.push_expr(object_literal(hash.values));
        Ok(())
    }

    fn assign_to_hash(&mut self, key: &str) -> Result<(), CompileError> {
        let value = self.stacks.pop()?;
        let id = if self.opts.track_ids {
            Some(self.stacks.pop()?)
        } else {
            None
        };
        let (kind, context) = if self.opts.string_params {
            (Some(self.stacks.pop()?), Some(self.stacks.pop()?))
        } else {
            (None, None)
        };

        let hash = self.hash.as_mut().ok_or_else(|| {
            CompileError::no_span("hash assignment with no hash open")
        })?;
        if let Some(context) = context {
            hash.contexts.push((key.to_string(), context));
        }
        if let Some(kind) = kind {
            hash.types.push((key.to_string(), kind));
        }
        if let Some(id) = id {
            hash.ids.push((key.to_string(), id));
        }
        hash.values.push((key.to_string(), value));
        Ok(())
    }

    fn push_id(&mut self, id: &IdSource) {
        match id {
            IdSource::BlockParam { param, child } => {
                let mut text = format!(
                    "blockParams[{}].path[{}]",
                    param.frame, param.index
                );
                if let Some(child) = child {
                    text.push_str(" + ");
                    text.push_str(&quoted_string(&format!(".{child}")));
                }
                self.stacks.push_literal(text);
            }
            IdSource::Path { name } => self.push_string(name),
            IdSource::SubExpression => self.stacks.push_literal("true"),
            IdSource::Literal => self.stacks.push_literal("null"),
        }
    }

    // ── programs ───────────────────────────────────────────────────

    fn push_program(
        &mut self,
        program: Option<usize>,
    ) -> Result<(), CompileError> {
        match program {
            Some(guid) => {
                let accessor = self.program_expression(guid)?;
                self.stacks.push_literal(accessor);
            }
            None => self.stacks.push_absent(),
        }
        Ok(())
    }

    /// Convert a compile-time child index into a runtime program
    /// accessor, passing the block-param/depth arrays only when the
    /// subtree actually uses them.
    fn program_expression(
        &self,
        guid: usize,
    ) -> Result<String, CompileError> {
        let (child, index) = match (
            self.program.children.get(guid),
            self.child_index.get(guid),
        ) {
            (Some(child), Some(&index)) => (child, index),
            _ => {
                return Err(CompileError::no_span(format!(
                    "nested program reference #{guid} out of range"
                )));
            }
        };
        let mut params = vec![
            index.to_string(),
            "data".to_string(),
            child.block_params.to_string(),
        ];
        if self.use_block_params || self.use_depths {
            params.push("blockParams".to_string());
        }
        if self.use_depths {
            params.push("depths".to_string());
        }
        Ok(format!("container.program({})", params.join(", ")))
    }

    // ── invocations ────────────────────────────────────────────────

    pub(crate) fn use_register(&mut self, name: &str) {
        if !self.registers.iter().any(|register| register == name) {
            self.registers.push(name.to_string());
        }
    }

    fn invoke_helper(
        &mut self,
        param_size: usize,
        name: &str,
        is_simple: bool,
    ) -> Result<(), CompileError> {
        let non_helper = self.stacks.pop()?;
        let helper = self.setup_helper(param_size, name, false)?;

        let mut lookup = Code::from("(");
        if is_simple {
            lookup = lookup.and(helper.name.clone()).and(" || ");
        }
        lookup = lookup.and(non_helper);
        if !self.opts.strict {
            lookup = lookup
                .and(" || ")
                .and(Code::alias(self.aliases.intern("helpers.helperMissing")));
        }
        lookup = lookup.and(")");

        self.stacks
            .push_expr(function_call(lookup, "call", helper.call_params));
        Ok(())
    }

    fn invoke_known_helper(
        &mut self,
        param_size: usize,
        name: &str,
    ) -> Result<(), CompileError> {
        let helper = self.setup_helper(param_size, name, false)?;
        self.stacks
            .push_expr(function_call(helper.name, "call", helper.call_params));
        Ok(())
    }

    /// A bare identifier that may name either a helper or a context
    /// path: resolve at runtime through the `helper` register so both
    /// outcomes land in the same place.
    fn invoke_ambiguous(
        &mut self,
        name: &str,
        helper_call: bool,
    ) -> Result<(), CompileError> {
        self.use_register("helper");

        let non_helper = self.stacks.pop()?;
        self.empty_hash(false);
        let helper = self.setup_helper(0, name, helper_call)?;

        let helper_name = name_lookup(Code::from("helpers"), name);
        self.last_helper = Some(helper_name.clone());

        let lookup = if self.opts.strict {
            Code::from("(")
                .and("(helper = ")
                .and(helper_name)
                .and(" || ")
                .and(non_helper)
                .and(")")
        } else {
            Code::from("(helper = ")
                .and("(helper = ")
                .and(helper_name)
                .and(" || ")
                .and(non_helper)
                .and(")")
                .and(" != null ? helper : ")
                .and(Code::alias(self.aliases.intern("helpers.helperMissing")))
        };

        let mut code = Code::from("(").and(lookup);
        if let Some(init) = helper.params_init {
            code = code.and("),(").and(init);
        }
        code = code
            .and("),")
            .and("(typeof helper === ")
            .and(Code::alias(self.aliases.intern("\"function\"")))
            .and(" ? ")
            .and(function_call(
                Code::from("helper"),
                "call",
                helper.call_params,
            ))
            .and(" : helper))");
        self.stacks.push_expr(code);
        Ok(())
    }

    fn invoke_partial(
        &mut self,
        dynamic: bool,
        name: &str,
        indent: &str,
    ) -> Result<(), CompileError> {
        let mut params = Vec::new();
        let mut options = self.setup_params(name, 1, &mut params, false)?;

        let name_expr = if dynamic {
            options.remove("name");
            Some(self.stacks.pop()?)
        } else {
            None
        };

        if !indent.is_empty() {
            options.set("indent", quoted_string(indent));
        }
        options.set("helpers", "helpers");
        options.set("partials", "partials");
        options.set("decorators", "container.decorators");

        match name_expr {
            Some(expr) => params.insert(0, expr),
            None => {
                params.insert(0, name_lookup(Code::from("partials"), name))
            }
        }

        if self.opts.compat {
            options.set("depths", "depths");
        }
        params.push(options.into_literal());

        self.stacks.push_expr(function_call(
            Code::from("container.invokePartial"),
            "",
            params,
        ));
        Ok(())
    }

    fn register_decorator(
        &mut self,
        param_size: usize,
        name: &str,
    ) -> Result<(), CompileError> {
        let found = name_lookup(Code::from("decorators"), name);
        let options = self.decorator_options(name, param_size)?;
        let invocation = function_call(
            found,
            "",
            vec![
                Code::from("fn"),
                Code::from("props"),
                Code::from("container"),
                options,
            ],
        );
        self.decorators
            .push_stmt(Code::from("fn = ").and(invocation).and(" || fn;"));
        Ok(())
    }

    fn block_value(&mut self, name: &str) -> Result<(), CompileError> {
        let block_helper_missing =
            Code::alias(self.aliases.intern("helpers.blockHelperMissing"));
        let mut params = vec![Code::from(self.context_name(0))];
        self.setup_helper_args(name, 0, &mut params, false)?;

        let block_name = self.stacks.pop()?;
        params.insert(1, block_name);

        self.stacks.push_expr(function_call(
            block_helper_missing,
            "call",
            params,
        ));
        Ok(())
    }

    fn ambiguous_block_value(&mut self) -> Result<(), CompileError> {
        let block_helper_missing =
            Code::alias(self.aliases.intern("helpers.blockHelperMissing"));
        let mut params = vec![Code::from(self.context_name(0))];
        // The options register still holds the value assigned by the
        // preceding ambiguous invoke; only the pops matter here.
        self.setup_helper_args("", 0, &mut params, true)?;

        self.stacks.flush_inline(&mut self.source);

        let current = self.stacks.top()?;
        params.insert(1, current.clone());

        let last_helper = self.last_helper.clone().ok_or_else(|| {
            CompileError::no_span(
                "ambiguous block value with no preceding ambiguous invoke",
            )
        })?;
        let stmt = Code::from("if (!")
            .and(last_helper)
            .and(") { ")
            .and(current)
            .and(" = ")
            .and(function_call(block_helper_missing, "call", params))
            .and("}");
        self.source.push_stmt(stmt);
        Ok(())
    }

    // ── assembly ───────────────────────────────────────────────────

    /// Wrap the merged body into a complete function definition:
    /// parameter list, the single `var` line (slots, registers, hoisted
    /// aliases, optional buffer), and the merged fragments.
    fn create_function_context(&mut self) -> String {
        let mut declarations = String::new();
        for local in self.stacks.slot_names().iter().chain(&self.registers) {
            declarations.push_str(", ");
            declarations.push_str(local);
        }
        for (local, expr) in self.aliases.hoist() {
            declarations.push_str(", ");
            declarations.push_str(&local);
            declarations.push('=');
            declarations.push_str(&expr);
        }

        let mut params =
            vec!["container", "depth0", "helpers", "partials", "data"];
        if self.use_block_params || self.use_depths {
            params.push("blockParams");
        }
        if self.use_depths {
            params.push("depths");
        }

        let body =
            self.source
                .merge(&declarations, &self.aliases, self.force_buffer);
        format!("function({}) {{\n  {body}}}", params.join(","))
    }

    /// Decorator prologue wrapper. Rendered after alias hoisting so the
    /// shared placeholders resolve consistently with the main body.
    fn wrap_decorators(&mut self) -> String {
        self.decorators
            .prepend_stmt(Code::from("var decorators = container.decorators;"));
        self.decorators.push_stmt(Code::from("return fn;"));
        let body = self.decorators.merge_plain(&self.aliases);
        format!(
            "function(fn, props, container, depth0, data, blockParams, depths) {{\n  {body}}}"
        )
    }
}
