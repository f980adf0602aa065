//! The compiled artifact: function sources plus the manifest of runtime
//! features the loader must provide.

use crate::code::quoted_string;

/// Bumped whenever the emitted code's runtime contract changes.
pub const COMPILER_REVISION: u32 = 1;

/// Optional runtime capabilities the compiled template requires. A
/// loader can skip paying for anything left `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub decorators: bool,
    pub partials: bool,
    pub data: bool,
    pub depths: bool,
    pub block_params: bool,
    pub compat: bool,
}

/// A fully compiled template: the main render function, one entry per
/// distinct nested program (index-keyed, with unused slots `None`), and
/// their decorator prologues.
#[derive(Debug, Clone)]
pub struct Template {
    pub main: String,
    pub main_decorator: Option<String>,
    pub programs: Vec<Option<String>>,
    pub program_decorators: Vec<Option<String>>,
    pub features: Features,
}

impl Template {
    /// `[revision, compilerVersion]`, embedded so loaders can reject
    /// artifacts from an incompatible compiler.
    pub fn compiler_info(&self) -> String {
        format!(
            "[{},{}]",
            COMPILER_REVISION,
            quoted_string(env!("CARGO_PKG_VERSION"))
        )
    }

    fn decorator_for(&self, index: usize) -> Option<&String> {
        self.program_decorators.get(index).and_then(Option::as_ref)
    }

    /// Render the whole artifact as a target-language object literal.
    ///
    /// Integer keys come first in ascending order, then string keys in
    /// insertion order, mirroring the target language's own object key
    /// semantics so the text form round-trips through a loader
    /// unchanged.
    pub fn to_source(&self) -> String {
        let mut numeric: Vec<(String, String)> = Vec::new();
        let mut named: Vec<(String, String)> = Vec::new();

        named.push(("compiler".to_string(), self.compiler_info()));
        named.push(("main".to_string(), self.main.clone()));

        let mut use_decorators = false;
        if let Some(decorator) = &self.main_decorator {
            named.push(("main_d".to_string(), decorator.clone()));
            named.push(("useDecorators".to_string(), "true".to_string()));
            use_decorators = true;
        }

        for (index, program) in self.programs.iter().enumerate() {
            let Some(program) = program else { continue };
            numeric.push((index.to_string(), program.clone()));
            if let Some(decorator) = self.decorator_for(index) {
                named.push((format!("{index}_d"), decorator.clone()));
                if !use_decorators {
                    named.push((
                        "useDecorators".to_string(),
                        "true".to_string(),
                    ));
                    use_decorators = true;
                }
            }
        }

        let flags = [
            ("usePartial", self.features.partials),
            ("useData", self.features.data),
            ("useDepths", self.features.depths),
            ("useBlockParams", self.features.block_params),
            ("compat", self.features.compat),
        ];
        for (key, enabled) in flags {
            if enabled {
                named.push((key.to_string(), "true".to_string()));
            }
        }

        let entries = numeric
            .into_iter()
            .chain(named)
            .map(|(key, value)| format!("{}:{}", quoted_string(&key), value))
            .collect::<Vec<_>>();
        format!("{{{}}}", entries.join(","))
    }
}
