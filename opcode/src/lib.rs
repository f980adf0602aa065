//! The template bytecode instruction set: opcode kinds, source spans, the
//! nested program tree, and a builder for assembling opcode streams.

mod builder;
mod op;
mod program;

pub use builder::ProgramBuilder;
pub use op::{BlockParamRef, IdSource, Opcode, ParamKind, StringParam};
pub use program::{Pos, Program, Span, Spanned};

#[cfg(test)]
mod tests {
    use super::*;

    fn value_emission() -> Program {
        let mut b = ProgramBuilder::new();
        b.lookup(&["name"]);
        b.append();
        b.simple();
        b.finish()
    }

    #[test]
    fn builder_records_opcodes_in_order() {
        let program = value_emission();
        assert_eq!(program.opcodes.len(), 2);
        assert_eq!(
            program.opcodes[0].op,
            Opcode::LookupOnContext {
                parts: vec!["name".to_string()],
                falsy: false,
                strict: false,
                scoped: false,
            }
        );
        assert_eq!(program.opcodes[1].op, Opcode::Append);
        assert!(program.is_simple);
        assert!(program.children.is_empty());
    }

    #[test]
    fn child_indices_count_up() {
        let mut b = ProgramBuilder::new();
        let first = b.child(value_emission());
        let second = b.child(Program::default());
        assert_eq!((first, second), (0, 1));
        assert_eq!(b.finish().children.len(), 2);
    }

    #[test]
    fn same_shape_ignores_flags_and_spans() {
        let a = value_emission();
        let mut b = value_emission();
        b.use_depths = true;
        b.is_simple = false;
        b.opcodes[0].span = Some(Span {
            start: Pos { line: 1, column: 0 },
            end: Pos { line: 1, column: 8 },
        });
        assert!(a.same_shape(&b));
    }

    #[test]
    fn same_shape_compares_opcodes() {
        let a = value_emission();
        let mut b = ProgramBuilder::new();
        b.lookup(&["other"]);
        b.append();
        assert!(!a.same_shape(&b.finish()));
    }

    #[test]
    fn same_shape_recurses_into_children() {
        let mut outer_a = ProgramBuilder::new();
        outer_a.child(value_emission());
        outer_a.push_program(Some(0));

        let mut outer_b = ProgramBuilder::new();
        let mut different = ProgramBuilder::new();
        different.lookup(&["other"]);
        different.append();
        outer_b.child(different.finish());
        outer_b.push_program(Some(0));

        assert!(!outer_a.finish().same_shape(&outer_b.finish()));
    }

    #[test]
    fn display_opcodes() {
        assert_eq!(
            Opcode::LookupOnContext {
                parts: vec!["user".to_string(), "name".to_string()],
                falsy: false,
                strict: false,
                scoped: false,
            }
            .to_string(),
            "LookupOnContext user.name"
        );
        assert_eq!(
            Opcode::InvokeHelper {
                params: 2,
                name: "if".to_string(),
                is_simple: true,
            }
            .to_string(),
            "InvokeHelper if/2"
        );
        assert_eq!(
            Opcode::PushProgram { program: Some(3) }.to_string(),
            "PushProgram #3"
        );
        assert_eq!(
            Opcode::PushProgram { program: None }.to_string(),
            "PushProgram -"
        );
    }
}
