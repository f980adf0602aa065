use std::collections::HashMap;

/// Handle to an interned runtime-accessor expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasId(usize);

#[derive(Debug)]
struct AliasRecord {
    expr: String,
    ref_count: usize,
    local: Option<String>,
}

/// Memoizes repeated runtime-lookup expressions within one compile unit.
///
/// Interning the same canonical expression twice returns the same handle
/// with an incremented reference count. At function assembly,
/// [`hoist`](Self::hoist) promotes every multiply-referenced record to a
/// short local; single-reference records stay inlined verbatim, since a
/// declaration for a value used once gains nothing.
#[derive(Debug, Default)]
pub struct AliasTable {
    records: Vec<AliasRecord>,
    index: HashMap<String, AliasId>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, expr: &str) -> AliasId {
        if let Some(&id) = self.index.get(expr) {
            self.records[id.0].ref_count += 1;
            return id;
        }
        let id = AliasId(self.records.len());
        self.records.push(AliasRecord {
            expr: expr.to_string(),
            ref_count: 1,
            local: None,
        });
        self.index.insert(expr.to_string(), id);
        id
    }

    pub fn ref_count(&self, id: AliasId) -> usize {
        self.records[id.0].ref_count
    }

    /// The text a placeholder renders to: the hoisted local once
    /// [`hoist`](Self::hoist) has run, the canonical expression before.
    pub fn resolve(&self, id: AliasId) -> &str {
        let record = &self.records[id.0];
        record.local.as_deref().unwrap_or(&record.expr)
    }

    /// Assign `alias1..aliasN` to every multiply-referenced record, in
    /// insertion order, and return the `(local, expr)` declarations.
    pub fn hoist(&mut self) -> Vec<(String, String)> {
        let mut declarations = Vec::new();
        let mut count = 0;
        for record in &mut self.records {
            if record.ref_count > 1 {
                count += 1;
                let local = format!("alias{count}");
                declarations.push((local.clone(), record.expr.clone()));
                record.local = Some(local);
            }
        }
        declarations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut aliases = AliasTable::new();
        let a = aliases.intern("container.lambda");
        let b = aliases.intern("container.lambda");
        assert_eq!(a, b);
        assert_eq!(aliases.ref_count(a), 2);
    }

    #[test]
    fn distinct_expressions_get_distinct_handles() {
        let mut aliases = AliasTable::new();
        let a = aliases.intern("container.lambda");
        let b = aliases.intern("container.escapeExpression");
        assert_ne!(a, b);
        assert_eq!(aliases.ref_count(a), 1);
        assert_eq!(aliases.ref_count(b), 1);
    }

    #[test]
    fn single_reference_stays_inline() {
        let mut aliases = AliasTable::new();
        let a = aliases.intern("container.lambda");
        assert!(aliases.hoist().is_empty());
        assert_eq!(aliases.resolve(a), "container.lambda");
    }

    #[test]
    fn repeated_references_hoist_once() {
        let mut aliases = AliasTable::new();
        let once = aliases.intern("container.lambda");
        let many = aliases.intern("container.escapeExpression");
        aliases.intern("container.escapeExpression");
        aliases.intern("container.escapeExpression");

        let declarations = aliases.hoist();
        assert_eq!(
            declarations,
            vec![(
                "alias1".to_string(),
                "container.escapeExpression".to_string()
            )]
        );
        assert_eq!(aliases.resolve(many), "alias1");
        assert_eq!(aliases.resolve(once), "container.lambda");
    }

    #[test]
    fn hoisted_names_number_only_hoisted_records() {
        let mut aliases = AliasTable::new();
        aliases.intern("one.shot");
        let x = aliases.intern("x.x");
        aliases.intern("x.x");
        aliases.intern("another.one.shot");
        let y = aliases.intern("y.y");
        aliases.intern("y.y");

        let declarations = aliases.hoist();
        assert_eq!(declarations.len(), 2);
        assert_eq!(aliases.resolve(x), "alias1");
        assert_eq!(aliases.resolve(y), "alias2");
    }
}
