//! Helper/partial/decorator argument assembly.
//!
//! Arguments arrive on the stack in evaluation order, so they are popped
//! in strict reverse: hash, provenance records, inverse, program, then
//! each positional parameter with its tracked companions.

use crate::code::{Code, generate_array, object_literal, quoted_string};
use crate::compiler::Compiler;
use crate::error::CompileError;

/// Ordered key/value map rendering to a target-language object literal.
#[derive(Debug, Default)]
pub(crate) struct OptionsMap {
    pairs: Vec<(String, Code)>,
}

impl OptionsMap {
    pub(crate) fn set(&mut self, key: &str, value: impl Into<Code>) {
        self.pairs.push((key.to_string(), value.into()));
    }

    pub(crate) fn remove(&mut self, key: &str) {
        self.pairs.retain(|(existing, _)| existing != key);
    }

    pub(crate) fn into_literal(self) -> Code {
        object_literal(self.pairs)
    }
}

/// Everything needed to emit one helper invocation.
pub(crate) struct HelperSlot {
    /// The helper's name lookup (`helpers.foo`).
    pub(crate) name: Code,
    /// Deferred `options={...}` initializer when the options object is
    /// routed through the register.
    pub(crate) params_init: Option<Code>,
    /// Call context followed by the positional params and options.
    pub(crate) call_params: Vec<Code>,
}

impl<'a> Compiler<'a> {
    /// Pop one invocation's arguments and rebuild the options object.
    ///
    /// `params` receives the positional parameters in source order,
    /// after any entries the caller already placed. With `object_args`
    /// the positional list is folded into the options as an `args`
    /// array instead (the decorator calling convention).
    pub(crate) fn setup_params(
        &mut self,
        name: &str,
        param_size: usize,
        params: &mut Vec<Code>,
        object_args: bool,
    ) -> Result<OptionsMap, CompileError> {
        let mut options = OptionsMap::default();
        options.set("name", quoted_string(name));
        options.set("hash", self.stacks.pop()?);
        if self.opts.track_ids {
            options.set("hashIds", self.stacks.pop()?);
        }
        if self.opts.string_params {
            options.set("hashTypes", self.stacks.pop()?);
            options.set("hashContexts", self.stacks.pop()?);
        }

        let inverse = self.stacks.pop_opt()?;
        let program = self.stacks.pop_opt()?;

        // Leave fn and inverse unset when neither side exists, so helpers
        // can distinguish a block call from a plain expression by their
        // absence.
        if program.is_some() || inverse.is_some() {
            options.set(
                "fn",
                program.unwrap_or_else(|| Code::from("container.noop")),
            );
            options.set(
                "inverse",
                inverse.unwrap_or_else(|| Code::from("container.noop")),
            );
        }

        let mut positional: Vec<Option<Code>> = vec![None; param_size];
        let mut ids: Vec<Option<Code>> = vec![None; param_size];
        let mut kinds: Vec<Option<Code>> = vec![None; param_size];
        let mut contexts: Vec<Option<Code>> = vec![None; param_size];
        for i in (0..param_size).rev() {
            positional[i] = Some(self.stacks.pop()?);
            if self.opts.track_ids {
                ids[i] = Some(self.stacks.pop()?);
            }
            if self.opts.string_params {
                kinds[i] = Some(self.stacks.pop()?);
                contexts[i] = Some(self.stacks.pop()?);
            }
        }

        let tail = std::mem::take(params);
        params.extend(positional.into_iter().flatten());
        params.extend(tail);

        if object_args {
            options.set("args", generate_array(params.clone()));
        }
        if self.opts.track_ids {
            options.set(
                "ids",
                generate_array(ids.into_iter().flatten().collect()),
            );
        }
        if self.opts.string_params {
            options.set(
                "types",
                generate_array(kinds.into_iter().flatten().collect()),
            );
            options.set(
                "contexts",
                generate_array(contexts.into_iter().flatten().collect()),
            );
        }

        if self.opts.data {
            options.set("data", "data");
        }
        if self.use_block_params {
            options.set("blockParams", "blockParams");
        }
        Ok(options)
    }

    /// Assemble the options object and route it either inline (appended
    /// to `params`) or through the `options` register, returning the
    /// deferred initializer in the latter case.
    pub(crate) fn setup_helper_args(
        &mut self,
        name: &str,
        param_size: usize,
        params: &mut Vec<Code>,
        use_register: bool,
    ) -> Result<Option<Code>, CompileError> {
        let options = self.setup_params(name, param_size, params, false)?;
        let literal = options.into_literal();
        if use_register {
            self.use_register("options");
            params.push(Code::from("options"));
            Ok(Some(Code::from("options=").and(literal)))
        } else {
            params.push(literal);
            Ok(None)
        }
    }

    /// The decorator calling convention: positional params folded into
    /// the options as an `args` array.
    pub(crate) fn decorator_options(
        &mut self,
        name: &str,
        param_size: usize,
    ) -> Result<Code, CompileError> {
        let mut params = Vec::new();
        let options = self.setup_params(name, param_size, &mut params, true)?;
        Ok(options.into_literal())
    }

    pub(crate) fn setup_helper(
        &mut self,
        param_size: usize,
        name: &str,
        block_helper: bool,
    ) -> Result<HelperSlot, CompileError> {
        let mut params = Vec::new();
        let params_init =
            self.setup_helper_args(name, param_size, &mut params, block_helper)?;

        let found =
            crate::code::name_lookup(Code::from("helpers"), name);
        let ctx = self.context_name(0);
        let call_context = Code::alias(
            self.aliases
                .intern(&format!("{ctx} != null ? {ctx} : {{}}")),
        );

        let mut call_params = vec![call_context];
        call_params.extend(params);
        Ok(HelperSlot {
            name: found,
            params_init,
            call_params,
        })
    }
}
