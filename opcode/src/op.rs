use core::fmt;

/// Reference into the block-parameter bindings of an enclosing block:
/// `frame` selects the declaring block, `index` the parameter within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockParamRef {
    pub frame: usize,
    pub index: usize,
}

/// Value carried by [`Opcode::PushStringParam`] in string-params mode.
///
/// `Text` is quoted before it reaches the emitted source; `Literal` is a
/// target-language literal (`true`, `1.5`, ...) that is spliced verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum StringParam {
    Text(String),
    Literal(String),
}

/// Syntactic kind of a tracked parameter, as reported by the upstream
/// emitter. The name is what ends up in the generated provenance arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamKind {
    SubExpression,
    PathExpression,
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    UndefinedLiteral,
    NullLiteral,
}

impl ParamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::SubExpression => "SubExpression",
            ParamKind::PathExpression => "PathExpression",
            ParamKind::StringLiteral => "StringLiteral",
            ParamKind::NumberLiteral => "NumberLiteral",
            ParamKind::BooleanLiteral => "BooleanLiteral",
            ParamKind::UndefinedLiteral => "UndefinedLiteral",
            ParamKind::NullLiteral => "NullLiteral",
        }
    }
}

/// Provenance pushed by [`Opcode::PushId`] when id tracking is active.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum IdSource {
    /// A block-parameter reference; `child` is a trailing sub-path, if any.
    BlockParam {
        param: BlockParamRef,
        child: Option<String>,
    },
    /// A plain context path; its dotted form is the id.
    Path { name: String },
    /// Subexpressions carry no stable id; the id slot holds `true`.
    SubExpression,
    /// Literals carry no id; the id slot holds `null`.
    Literal,
}

/// One instruction of the template bytecode.
///
/// Opcodes are produced by the upstream parser/emitter and consumed in
/// order. Stack effects below refer to the compiler's expression stack;
/// "hash" is the current named-argument record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Opcode {
    /// Buffer a run of static template text. Adjacent runs coalesce into
    /// a single output append.
    AppendContent { content: String },

    /// Pop a value and append it to the rendered output, unescaped.
    /// Null/undefined values contribute nothing; falsy-but-defined values
    /// (`0`, `false`, `""`) still render.
    Append,

    /// Pop a value, escape it through the runtime, and append it.
    AppendEscaped,

    /// Set the context depth used by the next `PushContext`.
    GetContext { depth: usize },

    /// Push the current context object.
    PushContext,

    /// Push the current context, then resolve `parts` against it one
    /// segment at a time. `falsy` selects plain `&&` chaining, `scoped`
    /// suppresses the compat-mode depthed root lookup.
    LookupOnContext {
        parts: Vec<String>,
        falsy: bool,
        strict: bool,
        scoped: bool,
    },

    /// Push a block-parameter binding, then resolve the remaining `parts`
    /// against it.
    LookupBlockParam {
        param: BlockParamRef,
        parts: Vec<String>,
    },

    /// Push the ambient data frame `depth` levels up, then resolve
    /// `parts` against it.
    LookupData {
        depth: usize,
        parts: Vec<String>,
        strict: bool,
    },

    /// Replace the top of the stack with its lambda-resolved value.
    ResolvePossibleLambda,

    /// String-params mode: push the parameter's context, its kind name,
    /// and (except for subexpressions) its string-mode value.
    PushStringParam { value: StringParam, kind: ParamKind },

    /// Push an empty hash (and empty provenance records when tracking is
    /// active). `omit_empty` pushes `undefined` instead of `{}`.
    EmptyHash { omit_empty: bool },

    /// Open a fresh hash record, stacking any record already open.
    PushHash,

    /// Close the current hash record and push its object form (plus
    /// provenance objects when tracking is active).
    PopHash,

    /// Push a quoted string value.
    PushString { value: String },

    /// Push a target-language literal verbatim. Literals never allocate a
    /// temporary.
    PushLiteral { value: String },

    /// Push a runtime accessor for child program `program`, or an absent
    /// marker when there is no program.
    PushProgram { program: Option<usize> },

    /// Push the provenance id for a tracked parameter.
    PushId { id: IdSource },

    /// Pop a decorator's arguments and record its invocation in the
    /// function's decorator prologue.
    RegisterDecorator { params: usize, name: String },

    /// Pop hash/programs/params and push a helper invocation, falling
    /// back to the path value (and then to the missing-helper hook unless
    /// strict).
    InvokeHelper {
        params: usize,
        name: String,
        is_simple: bool,
    },

    /// Like `InvokeHelper`, but the helper is known to exist so no
    /// fallback is emitted.
    InvokeKnownHelper { params: usize, name: String },

    /// Emit the runtime branch between helper invocation and plain value
    /// substitution for an identifier that may name either.
    InvokeAmbiguous { name: String, helper_call: bool },

    /// Pop a context (and, when `dynamic`, the partial's name expression)
    /// and push a partial invocation.
    InvokePartial {
        dynamic: bool,
        name: String,
        indent: String,
    },

    /// Pop a value (and tracked provenance) and assign it into the
    /// current hash record under `key`.
    AssignToHash { key: String },

    /// Pop hash/programs/value and push a block-helper-missing invocation
    /// for a `{{#path}}` block over a plain value.
    BlockValue { name: String },

    /// Branch-free follow-up to an ambiguous block invocation: route the
    /// materialized value through block-helper-missing unless the prior
    /// lookup found a helper.
    AmbiguousBlockValue,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::AppendContent { content } => {
                write!(f, "AppendContent {content:?}")
            }
            Opcode::Append => write!(f, "Append"),
            Opcode::AppendEscaped => write!(f, "AppendEscaped"),
            Opcode::GetContext { depth } => write!(f, "GetContext {depth}"),
            Opcode::PushContext => write!(f, "PushContext"),
            Opcode::LookupOnContext { parts, .. } => {
                write!(f, "LookupOnContext {}", parts.join("."))
            }
            Opcode::LookupBlockParam { param, parts } => write!(
                f,
                "LookupBlockParam [{}][{}] {}",
                param.frame,
                param.index,
                parts.join(".")
            ),
            Opcode::LookupData { depth, parts, .. } => {
                write!(f, "LookupData @{depth} {}", parts.join("."))
            }
            Opcode::ResolvePossibleLambda => write!(f, "ResolvePossibleLambda"),
            Opcode::PushStringParam { kind, .. } => {
                write!(f, "PushStringParam {}", kind.as_str())
            }
            Opcode::EmptyHash { .. } => write!(f, "EmptyHash"),
            Opcode::PushHash => write!(f, "PushHash"),
            Opcode::PopHash => write!(f, "PopHash"),
            Opcode::PushString { value } => write!(f, "PushString {value:?}"),
            Opcode::PushLiteral { value } => write!(f, "PushLiteral {value}"),
            Opcode::PushProgram { program: Some(p) } => {
                write!(f, "PushProgram #{p}")
            }
            Opcode::PushProgram { program: None } => write!(f, "PushProgram -"),
            Opcode::PushId { .. } => write!(f, "PushId"),
            Opcode::RegisterDecorator { params, name } => {
                write!(f, "RegisterDecorator {name}/{params}")
            }
            Opcode::InvokeHelper { params, name, .. } => {
                write!(f, "InvokeHelper {name}/{params}")
            }
            Opcode::InvokeKnownHelper { params, name } => {
                write!(f, "InvokeKnownHelper {name}/{params}")
            }
            Opcode::InvokeAmbiguous { name, .. } => {
                write!(f, "InvokeAmbiguous {name}")
            }
            Opcode::InvokePartial { name, .. } => {
                write!(f, "InvokePartial {name}")
            }
            Opcode::AssignToHash { key } => write!(f, "AssignToHash {key}"),
            Opcode::BlockValue { name } => write!(f, "BlockValue {name}"),
            Opcode::AmbiguousBlockValue => write!(f, "AmbiguousBlockValue"),
        }
    }
}
