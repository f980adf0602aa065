use crate::op::Opcode;

/// A line/column position in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

/// A character range in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

/// An opcode with its optional source span.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spanned {
    pub op: Opcode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub span: Option<Span>,
}

impl From<Opcode> for Spanned {
    fn from(op: Opcode) -> Self {
        Spanned { op, span: None }
    }
}

/// One compile unit: an opcode stream plus the nested block bodies it
/// references by index, and the feature flags computed upstream.
///
/// `is_simple` marks a template with no control flow at all; the compiler
/// uses it to skip the output buffer entirely. The remaining flags record
/// which optional runtime capabilities the subtree touches.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Program {
    pub opcodes: Vec<Spanned>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Program>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub block_params: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_simple: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_partial: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_depths: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_decorators: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub use_block_params: bool,
}

impl Program {
    /// Structural equality: same opcodes and same children, recursively.
    ///
    /// Spans and feature flags are ignored so that two blocks emitted
    /// from identical template fragments compare equal and can share one
    /// compiled program.
    pub fn same_shape(&self, other: &Program) -> bool {
        self.opcodes.len() == other.opcodes.len()
            && self.children.len() == other.children.len()
            && self
                .opcodes
                .iter()
                .zip(&other.opcodes)
                .all(|(a, b)| a.op == b.op)
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.same_shape(b))
    }
}
