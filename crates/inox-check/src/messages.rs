//! Message catalogue of the static checker.
//!
//! Messages are part of the observable behavior: tools match on them, so
//! their wording is kept stable.

use inox_module::ModuleKind;

/// Maximum byte length of variable and property names.
pub const MAX_NAME_BYTE_LEN: usize = 64;

// ═══════════════════════════════════════════════════════════════════════════
// Module structure
// ═══════════════════════════════════════════════════════════════════════════

pub const MODULE_IMPORTS_NOT_ALLOWED_IN_INCLUDABLE_FILES: &str = "module imports are not allowed in includable files";
pub const AN_INCLUDABLE_FILE_CAN_ONLY_CONTAIN_DEFINITIONS: &str =
    "an includable file should only contain definitions (functions, patterns, ...) and inclusion imports";
pub const MISPLACED_INCLUSION_IMPORT_STATEMENT_TOP_LEVEL_STMT: &str =
    "misplaced inclusion import statement: it should be located at the module's top level or a the top level of the preinit block";
pub const MISPLACED_MOD_IMPORT_STATEMENT_TOP_LEVEL_STMT: &str =
    "misplaced module import statement: it should be located at the top level";
pub const MODULE_IMPORTED_FROM_URL_WITHOUT_VALIDATION: &str =
    "the module is imported from a URL without a validation hash, its content is not integrity-checked";

// ═══════════════════════════════════════════════════════════════════════════
// Declarations and assignments
// ═══════════════════════════════════════════════════════════════════════════

pub const VAR_CONST_NOT_DECLARED_IF_YOU_MEANT_TO_DECLARE_CONSTANTS: &str =
    "variable 'const' is not declared, if you meant to declare constants note that a single global constant declaration section at the start of the module is supported for now";
pub const CALLED_NOT_ALLOWED_INSIDE_GLOBAL_CONST_DECLS: &str =
    "this callee is not allowed inside global constant declarations";
pub const CALL_EXPRS_NOT_ALLOWED_INSIDE_GLOBAL_CONST_DECLS_OF_INCLUDABLE_FILES: &str =
    "call expressions are not allowed inside the global constant declarations of includable files";
pub const INVALID_ASSIGNMENT_ANONYMOUS_VAR_CANNOT_BE_ASSIGNED: &str =
    "invalid assignment: anonymous variable '$' cannot be assigned";
pub const GLOBAL_VARS_AND_CONSTS_CANNOT_BE_REASSIGNED: &str = "global variables and constants cannot be re-assigned";
pub const INVALID_FN_DECL_SHOULD_BE_TOP_LEVEL_STMT: &str =
    "invalid function declaration: a function declaration should be a top level statement in a module (embedded or not)";
pub const FN_NOT_PRECHECKED: &str = "function has no been pre-checked by the static checker";
pub const MISPLACED_GLOBAL_VAR_DECLS_TOP_LEVEL_STMT: &str =
    "misplaced global variable declaration(s): declarations are only allowed at the top level";
pub const MISPLACED_GLOBAL_VAR_DECLS_AFTER_FN_DECL_OR_REF_TO_FN: &str =
    "misplaced global variable declaration(s): declarations are not allowed after a function declaration, or after a reference to a function that is declared further below";

pub fn fmt_invalid_import_stmt_already_declared_global(name: &str) -> String {
    format!("invalid import statement: global '{}' is already declared", name)
}

pub fn fmt_invalid_const_decl_global_already_declared(name: &str) -> String {
    format!("invalid constant declaration: '{}' is already declared", name)
}

pub fn fmt_following_node_type_not_allowed_in_global_const_decls(kind: &str) -> String {
    format!("following node type is not allowed in global constant declarations: {}", kind)
}

pub fn fmt_a_limited_number_of_builtins_are_allowed_in_global_const_decls(usable: &[&str]) -> String {
    format!(
        "a limited number of builtins are allowed to be called in global constant declarations: {}",
        usable.join(" ")
    )
}

pub fn fmt_invalid_local_var_decl_already_declared(name: &str) -> String {
    format!("invalid local variable declaration: '{}' is already declared", name)
}

pub fn fmt_invalid_global_var_decl_already_declared(name: &str) -> String {
    format!("invalid global variable declaration: '{}' is already declared", name)
}

pub fn fmt_invalid_assignment_name_is_func_name(name: &str) -> String {
    format!("invalid assignment: '{}' is a declared function's name", name)
}

pub fn fmt_invalid_variable_assignment_var_does_not_exist(name: &str) -> String {
    format!("invalid variable assignment: '{}' does not exist", name)
}

pub fn fmt_cannot_shadow_global_variable(name: &str) -> String {
    format!("cannot shadow global variable '{}', use another name instead", name)
}

pub fn fmt_cannot_shadow_local_variable(name: &str) -> String {
    format!("cannot shadow local variable '{}', use another name instead", name)
}

pub fn fmt_parameter_cannot_shadow_global_variable(name: &str) -> String {
    format!("a parameter cannot shadow global variable '{}', use another name instead", name)
}

pub fn fmt_parameter_already_declared(name: &str) -> String {
    format!("parameter '{}' is already declared", name)
}

pub fn fmt_invalid_fn_decl_already_declared(name: &str) -> String {
    format!("invalid function declaration: {} is already declared", name)
}

pub fn fmt_invalid_or_misplaced_fn_decl_should_be_after_captured_var_declaration(name: &str) -> String {
    format!(
        "invalid or misplaced function declaration: the function should be declared after the declaration of the local variable '{}'",
        name
    )
}

pub fn fmt_var_is_already_captured(name: &str) -> String {
    format!("variable '{}' is already captured", name)
}

pub fn fmt_cannot_pass_global_to_function(name: &str) -> String {
    format!("cannot pass global variable '{}' to function.", name)
}

pub fn fmt_invalid_member_assignment_cannot_modify_meta_property(name: &str) -> String {
    format!("invalid member assignment: cannot modify metaproperty {}", name)
}

// ═══════════════════════════════════════════════════════════════════════════
// References
// ═══════════════════════════════════════════════════════════════════════════

pub const VARS_NOT_ALLOWED_IN_PATTERN_AND_EXTENSION_OBJECT_PROPERTIES: &str =
    "variables are not allowed in the extended pattern and in the extension object's properties";
pub const VARS_CANNOT_BE_USED_IN_STRUCT_FIELD_DEFS: &str = "variables cannot be used in struct field definitions";
pub const SELF_ACCESSIBILITY_EXPLANATION: &str =
    "'self' is only accessible within extension methods, metaproperty initialization blocks";
pub const MISPLACED_SENDVAL_EXPR: &str =
    "sendval expressions are only usable within functions that are object properties, metaproperty initialization blocks and in lifetime jobs";

pub fn fmt_name_is_too_long(name: &str) -> String {
    format!("name '{}' is too long", name)
}

pub fn fmt_var_is_not_declared(name: &str) -> String {
    format!("variable '{}' is not declared", name)
}

pub fn fmt_object_does_not_have_prop(name: &str) -> String {
    format!("object dos not have a .{} property", name)
}

// ═══════════════════════════════════════════════════════════════════════════
// Control flow
// ═══════════════════════════════════════════════════════════════════════════

pub const CONTINUE_STMTS_ONLY_ALLOWED_IN_BODY_FOR_OR_WALK_STMT: &str =
    "continue statements are only allowed in the body of a 'for' or 'walk' statement";
pub const BREAK_STMTS_ONLY_ALLOWED_LOCATION: &str =
    "break statements are only allowed in the body of a switch or match statement, or of a 'for' or 'walk' statement";
pub const YIELD_STMTS_ONLY_ALLOWED_IN_BODY_FOR_WALK_EXPR: &str =
    "yield statements are only allowed in the body of a 'for' or 'walk' expression";
pub const PRUNE_STMTS_ARE_ONLY_ALLOWED_IN_WALK_STMTS_AND_EXPRS: &str =
    "prune statement are only allowed in 'walk' statements and expressions";
pub const MISPLACED_RETURN_STATEMENT: &str = "misplaced return statement";
pub const MISPLACE_COYIELD_STATEMENT_ONLY_ALLOWED_IN_EMBEDDED_MODULES: &str =
    "misplaced coyield statement: coyield statements are only allowed in embedded modules";

// ═══════════════════════════════════════════════════════════════════════════
// Literals
// ═══════════════════════════════════════════════════════════════════════════

pub const NEGATIVE_QUANTITIES_NOT_SUPPORTED: &str = "negative quantities are not supported";
pub const INVALID_RATE: &str = "invalid rate";
pub const INVALID_QUANTITY: &str = "invalid quantity";
pub const INVALID_MEM_HOST_ONLY_VALID_VALUE: &str = "invalid mem:// host, only valid value is main";
pub const CREDENTIALS_NOT_ALLOWED_IN_URLS: &str = "credentials are not allowed in URLs";
pub const LOWER_BOUND_OF_INT_RANGE_LIT_SHOULD_BE_SMALLER_THAN_UPPER_BOUND: &str =
    "the lower bound of an integer range literal should be smaller than the upper bound";
pub const LOWER_BOUND_OF_FLOAT_RANGE_LIT_SHOULD_BE_SMALLER_THAN_UPPER_BOUND: &str =
    "the lower bound of a float range literal should be smaller than the upper bound";
pub const OBJ_REC_LIT_CANNOT_HAVE_METAPROP_KEYS: &str =
    "object-like literals cannot have metaproperty keys, metaproperty keys have a (single) starting underscore '_' and a (single) trailing underscore";
pub const ELEMENTS_NOT_ALLOWED_IF_EMPTY_PROP_NAME: &str =
    "elements are not allowed if the empty property name is present";
pub const EMPTY_PROP_NAME_NOT_ALLOWED_IF_ELEMENTS: &str =
    "the empty property name is not allowed if there are elements (values without a key)";
/// Metaproperty holding the visibility description of an object.
pub const VISIBILITY_KEY: &str = "_visibility_";
pub const INVALID_VISIB_INIT_BLOCK_SHOULD_CONT_OBJ: &str =
    "invalid visibility initialization block: block should only contain an object literal";
pub const INVALID_VISIB_DESC_SHOULDNT_HAVE_METAPROPS: &str =
    "invalid visibility initialization description: object should not have metaproperties";
pub const INVALID_VISIB_DESC_SHOULDNT_HAVE_ELEMENTS: &str =
    "invalid visibility initialization description: object should not have elements (values without a key)";
pub const VAL_SHOULD_BE_KEYLIST_LIT: &str = "value should be a key list literal";
pub const VAL_SHOULD_BE_DICT_LIT: &str = "value should be a dictionary literal";
pub const INVALID_VISIBILITY_DESC_KEY: &str = "invalid key for visibility description";
pub const INVALID_MAPPING_ENTRY_KEY_ONLY_SIMPL_LITS_AND_PATT_IDENTS: &str =
    "invalid mapping entry key: only simple value literals and pattern identifiers are supported";
pub const MISPLACED_COMPUTE_EXPR_SHOULD_BE_IN_DYNAMIC_MAPPING_EXPR_ENTRY: &str =
    "misplaced compute expression: compute expressions are only allowed on the right side of a dynamic Mapping entry";
pub const MISPLACED_RECEPTION_HANDLER_EXPRESSION: &str =
    "misplaced reception handler expression is misplaced, it should be an implicit key property of an object literal";
pub const MISPLACED_RUNTIME_TYPECHECK_EXPRESSION: &str =
    "misplaced runtime typecheck expression: for now runtime typechecks are only supported as arguments in function calls (ex: map ~$ .title)";

pub fn fmt_non_supported_unit(unit: &str) -> String {
    format!("non supported unit: {}", unit)
}

pub fn fmt_duplicate_key(key: &str) -> String {
    format!("duplicate key '{}'", key)
}

pub fn fmt_duplicate_field_name(name: &str) -> String {
    format!("duplicate field name '{}'", name)
}

pub fn fmt_duplicate_dict_key(key: &str) -> String {
    format!("duplicate dictionary key '{}'", key)
}

// ═══════════════════════════════════════════════════════════════════════════
// Patterns, structs and extensions
// ═══════════════════════════════════════════════════════════════════════════

pub const MISPLACED_PATTERN_DEF_NOT_TOP_LEVEL_STMT: &str =
    "misplaced pattern definition: it should be located at the top level";
pub const MISPLACED_PATTERN_DEF_AFTER_FN_DECL_OR_REF_TO_FN: &str =
    "misplaced pattern definition: definitions are not allowed after a function declaration, or after a reference to a function that is declared further below";
pub const MISPLACED_PATTERN_NS_DEF_NOT_TOP_LEVEL_STMT: &str =
    "misplaced pattern namespace definition: it should be located at the top level";
pub const MISPLACED_PATTERN_NS_DEF_AFTER_FN_DECL_OR_REF_TO_FN: &str =
    "misplaced pattern namespace definition: definitions are not allowed after a function declaration, or after a reference to a function that is declared further below";
pub const MISPLACED_READONLY_PATTERN_EXPRESSION: &str =
    "misplaced readonly pattern expression: they are only allowed as the type of function parameters";
pub const MISPLACED_EXTEND_STATEMENT_TOP_LEVEL_STMT: &str =
    "misplaced extend statement: it should be located at the top level";
pub const MISPLACED_STRUCT_DEF_TOP_LEVEL_STMT: &str =
    "misplaced struct definition: it should be located at the top level";
pub const STRUCT_TYPES_NOT_ALLOWED_AS_PARAMETER_TYPES: &str = "struct types are not allowed as parameter types";
pub const STRUCT_TYPES_NOT_ALLOWED_AS_RETURN_TYPES: &str = "struct types are not allowed as return types";
pub const MISPLACED_STRUCT_TYPE_NAME: &str =
    "misplaced struct type name: struct types are only allowed after a star, in struct field definitions and in new expressions";
pub const A_STRUCT_TYPE_NAME_IS_EXPECTED: &str = "a struct type name is expected";
pub const A_STRUCT_TYPE_IS_EXPECTED_AFTER_THE_STAR: &str = "a struct type is expected after the star";
pub const MISPLACED_POINTER_TYPE: &str = "misplaced pointer type";

pub fn fmt_invalid_struct_def_already_declared(name: &str) -> String {
    format!("invalid struct definition: {} is already declared", name)
}

pub fn fmt_a_field_or_method_is_already_defined(name: &str) -> String {
    format!("a field or method named '{}' is already defined ", name)
}

pub fn fmt_struct_type_is_not_defined(name: &str) -> String {
    format!("struct type {} is not defined", name)
}

pub fn fmt_pattern_already_declared(name: &str) -> String {
    format!("pattern %{} is already declared", name)
}

pub fn fmt_pattern_namespace_already_declared(name: &str) -> String {
    format!("pattern namespace %{} is already declared", name)
}

pub fn fmt_pattern_is_not_declared(name: &str) -> String {
    format!("pattern %{} is not declared", name)
}

pub fn fmt_pattern_namespace_is_not_declared(name: &str) -> String {
    format!("pattern namespace %{} is not declared", name)
}

pub fn fmt_pattern_namespace_does_not_have_member(namespace: &str, member: &str) -> String {
    format!("pattern namespace %{}. does not have a member '{}'", namespace, member)
}

// ═══════════════════════════════════════════════════════════════════════════
// Embedded modules
// ═══════════════════════════════════════════════════════════════════════════

pub const INVALID_SPAWN_GLOBALS_SHOULD_BE: &str =
    "invalid spawn expression: the description of globals should be a key list literal or an object literal with no implicit-key properties nor spread elements";
pub const INVALID_SPAWN_ONLY_OBJECT_LITERALS_WITH_NO_SPREAD_ELEMENTS_SUPPORTED: &str =
    "invalid spawn expression: only object literals with no spread elements nor implicit-key properties are supported for meta's value";
pub const TEST_CASES_NOT_ALLOWED_IF_SUBSUITES_ARE_PRESENT: &str = "test cases are not allowed if sub suites are presents";
pub const TEST_CASE_STMTS_NOT_ALLOWED_OUTSIDE_OF_TEST_SUITES: &str =
    "test case statements are not allowed outside of test suites";
pub const TEST_SUITE_STMTS_NOT_ALLOWED_INSIDE_TEST_CASE_STMTS: &str =
    "test suite statements are not allowed in test case statements";

pub fn fmt_cannot_pass_global_that_is_not_declared_to_lthread(name: &str) -> String {
    format!("cannot pass global variable '{}' to lthread, '{}' is not declared", name, name)
}

// ═══════════════════════════════════════════════════════════════════════════
// Manifest
// ═══════════════════════════════════════════════════════════════════════════

pub const NO_SPREAD_IN_MANIFEST: &str = "objects & lists in the manifest cannot contain spread elements";
pub const ELEMENTS_NOT_ALLOWED_IN_MANIFEST: &str =
    "elements (valus without a key) are not allowed in the manifest object";
pub const KIND_SECTION_SHOULD_BE_A_STRING_LITERAL: &str =
    "the 'kind' section of the manifest should have a string value (string literal)";
pub const INVALID_KIND_SECTION_EMBEDDED_MOD_KINDS_NOT_ALLOWED: &str =
    "invalid 'kind' section: embedded module kinds are not allowed";
pub const THE_UNSPECIFIED_MOD_KIND_NAME_CANNOT_BE_USED_IN_THE_MANIFEST: &str =
    "the 'unspecified' module kind name cannot be used in the manifest";
pub const MOD_KIND_NOT_EQUAL_TO_KIND_DETERMINED_DURING_PARSING: &str =
    "module kind not equal to the kind determined during parsing, the kind inferred from the filename may be conflicting with the kind specified in the manifest";
pub const MOD_KIND_SPECIFIED_IN_MANIFEST_SHOULD_BE_SPEC_OR_SHOULD_BE_OMITTED: &str =
    "the module is inferred as a specification module, so the kind specified in the manifest should be 'spec' or should be omitted";
pub const PERMS_SECTION_SHOULD_BE_AN_OBJECT: &str = "the 'permissions' section of the manifest should be an object";
pub const ELEMENTS_NOT_ALLOWED_IN_PERMS_SECTION: &str = "elements are not allowed in the 'permissions' section";
pub const NO_PERM_DESCRIBED_BY_THIS_TYPE_OF_VALUE: &str = "there is no permission described by this type of value";
pub const NO_PERM_DESCRIBED_BY_STRINGS: &str = "there is no permission described by strings";
pub const MAYBE_YOU_MEANT_TO_WRITE_A_PATH_LITERAL: &str =
    "maybe you meant to write a path literal such as /dir/ or /data.json (always unquoted)";
pub const MAYBE_YOU_MEANT_TO_WRITE_A_PATH_PATTERN_LITERAL: &str =
    "maybe you meant to write a path pattern literal such as %/... or %/*.json (always unquoted)";
pub const MAYBE_YOU_MEANT_TO_WRITE_A_URL_LITERAL: &str =
    "maybe you meant to write a url literal such as https://example.com/ (always unquoted)";
pub const MAYBE_YOU_MEANT_TO_WRITE_A_URL_PATTERN_LITERAL: &str =
    "maybe you meant to write a url pattern literal such as %https://example.com/... (always unquoted)";
pub const LIMITS_SECTION_SHOULD_BE_AN_OBJECT: &str = "the 'limits' section of the manifest should be an object";
pub const ENV_SECTION_SHOULD_BE_AN_OBJECT_PATTERN: &str =
    "the 'env' section of the manifest should be an object pattern literal";
pub const ENV_SECTION_NOT_AVAILABLE_IN_EMBEDDED_MODULE_MANIFESTS: &str =
    "the 'env' section is not available in embedded module manifests";
pub const PARAMS_SECTION_SHOULD_BE_AN_OBJECT: &str =
    "the 'parameters' section of the manifest should be an object literal";
pub const PARAMS_SECTION_NOT_AVAILABLE_IN_EMBEDDED_MODULE_MANIFESTS: &str =
    "the 'parameters' section is not available in embedded module manifests";
pub const PREINIT_FILES_SECTION_SHOULD_BE_AN_OBJECT: &str =
    "the 'preinit-files' section of the manifest should be an object literal";
pub const PREINIT_FILES_FILE_CONFIG_SHOULD_BE_AN_OBJECT: &str =
    "the description of each file in the 'preinit-files' section of the manifest should be an object literal";
pub const PREINIT_FILES_FILE_CONFIG_PATH_SHOULD_BE_ABS_PATH: &str =
    "the .path of each file in the 'preinit-files' section (manifest) should be an absolute path";
pub const PREINIT_FILES_SECTION_NOT_AVAILABLE_IN_EMBEDDED_MODULE_MANIFESTS: &str =
    "the 'preinit-files' section is not available in embedded module manifests";
pub const DATABASES_SECTION_SHOULD_BE_AN_OBJECT_OR_ABS_PATH: &str =
    "the 'databases' section of the manifest should be an object literal or an absolute path";
pub const DATABASES_SECTION_NOT_AVAILABLE_IN_EMBEDDED_MODULE_MANIFESTS: &str =
    "the 'databases' section is not available in embedded module manifests";
pub const DATABASES_DATABASE_CONFIG_SHOULD_BE_AN_OBJECT: &str =
    "the description of each database in the 'databases' section of the manifest should be an object literal";
pub const HOST_RESOLUTION_SECTION_SHOULD_BE_A_DICT: &str =
    "the 'host-resolution' section of the manifest should be a dictionary with host keys";

pub fn fmt_not_valid_permission_kind_name(name: &str, valid: &[&str]) -> String {
    format!("'{}' is not a valid permission kind, valid permissions are {}", name, valid.join(", "))
}

pub fn fmt_unknown_section_of_manifest(name: &str) -> String {
    format!("unknown section '{}' of manifest", name)
}

pub fn fmt_forbidden_node_in_perm_listing(kind: &str) -> String {
    format!(
        "invalid permission listing: invalid node {}, only variables, simple values, objects, lists & dictionaries are allowed",
        kind
    )
}

pub fn fmt_forbidden_node_in_limits_section(kind: &str) -> String {
    format!("invalid limits: invalid node {}, only variables and simple literals are allowed", kind)
}

pub fn fmt_forbidden_node_in_env_section(kind: &str) -> String {
    format!(
        "invalid env section: invalid node {}, only variables, simple literals & named patterns are allowed",
        kind
    )
}

pub fn fmt_forbidden_node_in_preinit_files_section(kind: &str) -> String {
    format!(
        "invalid preinit-files section: invalid node {}, only variables, simple literals & named patterns are allowed",
        kind
    )
}

pub fn fmt_forbidden_node_in_host_resolution_section(kind: &str) -> String {
    format!(
        "invalid host-resolution description: invalid node {}, only object literals, variables and simple literals are allowed",
        kind
    )
}

pub fn fmt_forbidden_node_in_parameters_section(kind: &str) -> String {
    format!("invalid parameters description: forbidden node {}", kind)
}

pub fn fmt_missing_prop_in_preinit_file_description(prop: &str, name: &str) -> String {
    format!("missing .{} property in description of preinit file {}", prop, name)
}

pub fn fmt_missing_prop_in_database_description(prop: &str, name: &str) -> String {
    format!("missing .{} property in description of database {}", prop, name)
}

pub fn fmt_unexpected_prop_of_database_description(name: &str) -> String {
    format!("unexpected property '{}' of database description", name)
}

pub fn fmt_only_abs_paths_are_accepted_in_perms(path: &str) -> String {
    format!("only absolute paths are accepted in permissions: {}", path)
}

pub fn fmt_cannot_infer_permission(kind: &str, name: &str) -> String {
    format!("cannot infer '{}' permission '{}", kind, name)
}

pub fn fmt_the_x_section_is_not_allowed_for_the_current_module_kind(section: &str, kind: ModuleKind) -> String {
    format!("the {:?} section is not allowed for the current module kind ({})", section, kind)
}
