//! Checker output.

use inox_common::FxHashMap;
use inox_syntax::NodeId;

use crate::error::{CombinedStaticCheckErrors, StaticCheckError, StaticCheckWarning};

/// Facts gathered about a function expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionStaticData {
    /// Globals read by the function, including those of the functions it references.
    pub captured_globals: Vec<String>,
}

/// Facts gathered about a mapping expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingStaticData {
    pub referenced_globals: Vec<String>,
}

/// Result of a check.
#[derive(Debug, Clone, Default)]
pub struct Data {
    pub(crate) errors: Vec<StaticCheckError>,
    pub(crate) warnings: Vec<StaticCheckWarning>,
    pub(crate) fn_data: FxHashMap<NodeId, FunctionStaticData>,
    pub(crate) mapping_data: FxHashMap<NodeId, MappingStaticData>,
    /// Key: chunk or embedded module. Value: byte offset.
    pub(crate) first_forbidden_positions: FxHashMap<NodeId, u32>,
    /// Key: chunk or embedded module. Value: function declarations, in source order.
    pub(crate) functions_to_declare_early: FxHashMap<NodeId, Vec<NodeId>>,
}

impl Data {
    pub fn errors(&self) -> &[StaticCheckError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[StaticCheckWarning] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All errors as one, `None` when the check passed.
    pub fn combined_errors(&self) -> Option<CombinedStaticCheckErrors> {
        CombinedStaticCheckErrors::from_errors(&self.errors)
    }

    pub fn fn_data(&self, fn_expr: NodeId) -> Option<&FunctionStaticData> {
        self.fn_data.get(&fn_expr)
    }

    pub fn mapping_data(&self, mapping: NodeId) -> Option<&MappingStaticData> {
        self.mapping_data.get(&mapping)
    }

    /// Offset from which global variables and patterns can no longer be declared in `module`.
    pub fn first_forbidden_position(&self, module: NodeId) -> Option<u32> {
        self.first_forbidden_positions.get(&module).copied()
    }

    /// Declarations of the functions that must exist before the statements of `module` run.
    pub fn functions_to_declare_early(&self, module: NodeId) -> &[NodeId] {
        self.functions_to_declare_early
            .get(&module)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records that `fn_expr` reads the global `name`.
    ///
    /// When the global is itself a function, the globals it captures are
    /// captured too.
    pub(crate) fn add_fn_captured_global(&mut self, fn_expr: NodeId, name: &str, captured_fn: Option<NodeId>) {
        let inherited = captured_fn
            .and_then(|id| self.fn_data.get(&id))
            .map(|data| data.captured_globals.clone())
            .unwrap_or_default();

        let data = self.fn_data.entry(fn_expr).or_default();
        if !data.captured_globals.iter().any(|g| g == name) {
            data.captured_globals.push(name.to_string());
        }
        for global in inherited {
            if !data.captured_globals.contains(&global) {
                data.captured_globals.push(global);
            }
        }
    }

    /// Propagates captured globals along `(function, referenced function)`
    /// edges until nothing changes, so that references to functions declared
    /// later are accounted for.
    pub(crate) fn close_captures(&mut self, edges: &[(NodeId, NodeId)]) {
        let mut changed = true;
        while changed {
            changed = false;
            for &(fn_expr, captured_fn) in edges {
                let inherited = match self.fn_data.get(&captured_fn) {
                    Some(data) => data.captured_globals.clone(),
                    None => continue,
                };
                let data = self.fn_data.entry(fn_expr).or_default();
                for global in inherited {
                    if !data.captured_globals.contains(&global) {
                        data.captured_globals.push(global);
                        changed = true;
                    }
                }
            }
        }
    }

    pub(crate) fn add_mapping_referenced_global(&mut self, mapping: NodeId, name: &str) {
        let data = self.mapping_data.entry(mapping).or_default();
        if !data.referenced_globals.iter().any(|g| g == name) {
            data.referenced_globals.push(name.to_string());
        }
    }

    /// Merges the output of a nested checker.
    pub(crate) fn absorb(&mut self, other: Data) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.fn_data.extend(other.fn_data);
        self.mapping_data.extend(other.mapping_data);
        for (module, position) in other.first_forbidden_positions {
            self.first_forbidden_positions.entry(module).or_insert(position);
        }
        for (module, decls) in other.functions_to_declare_early {
            let early = self.functions_to_declare_early.entry(module).or_default();
            for decl in decls {
                if !early.contains(&decl) {
                    early.push(decl);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_globals_are_transitive() {
        let mut data = Data::default();
        let inner = NodeId::fresh();
        let outer = NodeId::fresh();

        data.add_fn_captured_global(inner, "a", None);
        data.add_fn_captured_global(outer, "f", Some(inner));
        data.add_fn_captured_global(outer, "f", Some(inner));

        assert_eq!(data.fn_data(outer).unwrap().captured_globals, vec!["f", "a"]);
    }

    #[test]
    fn test_close_captures_handles_late_declarations() {
        let mut data = Data::default();
        let caller = NodeId::fresh();
        let callee = NodeId::fresh();

        // the caller is checked before the callee reads `b`
        data.add_fn_captured_global(caller, "g", Some(callee));
        data.add_fn_captured_global(callee, "b", None);
        data.close_captures(&[(caller, callee)]);

        assert_eq!(data.fn_data(caller).unwrap().captured_globals, vec!["g", "b"]);
    }

    #[test]
    fn test_absorb_keeps_first_position() {
        let module = NodeId::fresh();
        let mut data = Data::default();
        data.first_forbidden_positions.insert(module, 3);

        let mut child = Data::default();
        child.first_forbidden_positions.insert(module, 10);
        child.functions_to_declare_early.insert(module, vec![NodeId::fresh()]);
        data.absorb(child);

        assert_eq!(data.first_forbidden_position(module), Some(3));
        assert_eq!(data.functions_to_declare_early(module).len(), 1);
        assert!(data.combined_errors().is_none());
    }
}
