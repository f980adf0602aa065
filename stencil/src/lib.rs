//! Compiles template opcode streams into the source text of executable
//! render functions.
//!
//! The pipeline: the opcode dispatcher walks the stream and emits through
//! the dual operand [`Stacks`], the [`AliasTable`], and the
//! [`SourceBuffer`]; nested block bodies compile recursively with
//! structural dedup; the function assembler merges the buffer and wraps
//! everything into a [`Template`] artifact ready for persistence.

mod alias;
mod args;
mod code;
mod compiler;
mod error;
mod source;
mod stack;
mod template;

pub use alias::{AliasId, AliasTable};
pub use code::Code;
pub use compiler::{CompileOptions, compile};
pub use error::CompileError;
pub use source::{Fragment, SourceBuffer};
pub use stack::{StackEntry, Stacks};
pub use template::{COMPILER_REVISION, Features, Template};
