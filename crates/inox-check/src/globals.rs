//! Global variable information and well-known global names.

use inox_common::{FxHashMap, FxHashSet};
use inox_syntax::NodeId;

/// Name of the global holding the arguments of an imported module.
pub const MOD_ARGS_VARNAME: &str = "mod-args";

/// Global available in test case modules.
pub const CURRENT_TEST: &str = "__test";

/// Globals of a test suite that its test items do not inherit.
pub const TEST_ITEM_NON_INHERITED_GLOBALS: &[&str] = &[CURRENT_TEST];

/// Builtins that may be called in global constant declarations.
pub const USABLE_GLOBALS_IN_CONST_DECLS: &[&str] = &["read", "mkpath", "mkurl"];

/// What the checker knows about a global variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlobalVarInfo {
    pub is_const: bool,
    /// The value is known when the module starts and can be passed to lthreads.
    pub is_start_constant: bool,
    /// The function expression of a declared function.
    pub fn_expr: Option<NodeId>,
}

impl GlobalVarInfo {
    pub fn constant() -> Self {
        Self {
            is_const: true,
            ..Self::default()
        }
    }

    pub fn start_constant() -> Self {
        Self {
            is_const: true,
            is_start_constant: true,
            fn_expr: None,
        }
    }

    pub fn function(fn_expr: NodeId) -> Self {
        Self {
            is_const: true,
            is_start_constant: false,
            fn_expr: Some(fn_expr),
        }
    }
}

const DEFAULT_GLOBAL_FUNCTIONS: &[&str] = &[
    "print", "read", "mkpath", "mkurl", "len", "tostr", "typeof", "append", "sleep", "error", "help",
    "exec", "sha256", "hex", "unhex", "torune", "tostring", "url_of", "filemode", "ulid", "uuidv4",
];

const DEFAULT_GLOBAL_NAMESPACES: &[&str] = &["fs", "http", "html", "chrome", "ws", "dns", "tcp", "strmanip", "rand"];

/// The globals a freshly started application module sees.
pub fn default_globals() -> FxHashMap<String, GlobalVarInfo> {
    DEFAULT_GLOBAL_FUNCTIONS
        .iter()
        .chain(DEFAULT_GLOBAL_NAMESPACES)
        .map(|name| (name.to_string(), GlobalVarInfo::start_constant()))
        .collect()
}

const DEFAULT_PATTERNS: &[&str] = &[
    "int", "float", "str", "bool", "nil", "path", "url", "host", "list", "obj", "rec", "tuple", "dict",
    "duration", "byte-count", "rate", "date", "any", "mapping", "fn", "pattern", "emailaddr", "ident",
    "rune", "port", "bytes",
];

/// Named patterns available without definition.
pub fn default_patterns() -> FxHashSet<String> {
    DEFAULT_PATTERNS.iter().map(|name| name.to_string()).collect()
}

/// Pattern namespaces available without definition, with their members.
pub fn default_pattern_namespaces() -> FxHashMap<String, Vec<String>> {
    let mut namespaces = FxHashMap::default();
    namespaces.insert(
        "inox".to_string(),
        vec!["module-kind".to_string(), "permission".to_string()],
    );
    namespaces.insert("fs".to_string(), vec!["mode".to_string(), "entry".to_string()]);
    namespaces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_start_constants() {
        let globals = default_globals();
        assert!(globals["print"].is_start_constant);
        assert!(globals.contains_key("fs"));
        for name in USABLE_GLOBALS_IN_CONST_DECLS {
            assert!(globals.contains_key(*name), "{}", name);
        }
        assert!(default_patterns().contains("int"));
    }

    #[test]
    fn test_function_info() {
        let id = NodeId::fresh();
        let info = GlobalVarInfo::function(id);
        assert!(info.is_const);
        assert_eq!(info.fn_expr, Some(id));
        assert_eq!(GlobalVarInfo::constant().fn_expr, None);
    }
}
