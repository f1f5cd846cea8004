//! Static checks of whole chunks and modules.

use std::sync::Arc;

use inox_check::messages::*;
use inox_check::{check, CheckInput, Data};
use inox_common::MemoryFs;
use inox_module::{parse_local_module, Context, ModuleParsingConfig};
use inox_syntax::{find_nodes, parse_chunk, NodeKind};
use pretty_assertions::assert_eq;

fn check_source(source: &str) -> Data {
    let chunk = parse_chunk("/main.ix", source).unwrap();
    assert!(chunk.errors.is_empty(), "{:?}", chunk.errors);
    check(&CheckInput::for_chunk(&chunk).with_defaults()).unwrap()
}

fn error_texts(source: &str) -> Vec<String> {
    check_source(source)
        .errors()
        .iter()
        .map(|e| e.text().to_string())
        .collect()
}

fn check_module(fs: MemoryFs, path: &str) -> Data {
    let config = ModuleParsingConfig::new(Context::new(Arc::new(fs)));
    let module = parse_local_module(path, &config).unwrap();
    check(&CheckInput::for_module(&module).with_defaults()).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// Literals
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_int_range_with_lower_bound_greater_than_upper_bound() {
    assert_eq!(
        error_texts("manifest {}\n$r = 1..0"),
        vec![LOWER_BOUND_OF_INT_RANGE_LIT_SHOULD_BE_SMALLER_THAN_UPPER_BOUND]
    );
}

#[test]
fn test_quantities() {
    assert!(error_texts("manifest {}\n$d = 1h30mn").is_empty());
    assert_eq!(error_texts("manifest {}\n$d = 30mn1h"), vec![INVALID_QUANTITY]);
}

#[test]
fn test_duplicate_object_keys() {
    assert_eq!(
        error_texts("manifest {}\n$o = {a: 1, a: 2}"),
        vec![fmt_duplicate_key("a")]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Scopes
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_undeclared_variable() {
    assert_eq!(error_texts("manifest {}\n$a = $b"), vec![fmt_var_is_not_declared("b")]);
}

#[test]
fn test_loop_variables_do_not_leak() {
    assert!(error_texts("manifest {}\nfor i in [1, 2] {\n  print(i)\n}").is_empty());
    assert_eq!(
        error_texts("manifest {}\nfor i in [1, 2] {}\nprint(i)"),
        vec![fmt_var_is_not_declared("i")]
    );
}

#[test]
fn test_locals_of_switch_cases_do_not_leak() {
    let source = "manifest {}\nswitch 1 {\n  1 {\n    $x = 1\n  }\n}\nprint($x)";
    assert_eq!(error_texts(source), vec![fmt_var_is_not_declared("x")]);
}

#[test]
fn test_locals_of_match_cases_do_not_leak() {
    let source = "manifest {}\nmatch 1 {\n  %int n {\n    $y = n\n  }\n}\nprint($y)\nprint(n)";
    assert_eq!(
        error_texts(source),
        vec![fmt_var_is_not_declared("y"), fmt_var_is_not_declared("n")]
    );
}

#[test]
fn test_functions_do_not_see_locals_of_the_module() {
    let source = "manifest {}\n$a = 1\nfn f() {\n  return $a\n}";
    assert_eq!(error_texts(source), vec![fmt_var_is_not_declared("a")]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Hoisting
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_functions_can_be_called_before_their_declaration() {
    assert!(error_texts("manifest {}\nf()\nfn f() {}").is_empty());
}

#[test]
fn test_global_var_decl_after_function_reference() {
    let source = "manifest {}\nfn f() {}\nf()\nglobalvar x = 1";
    assert_eq!(
        error_texts(source),
        vec![MISPLACED_GLOBAL_VAR_DECLS_AFTER_FN_DECL_OR_REF_TO_FN]
    );
}

#[test]
fn test_global_var_decl_after_reference_to_later_function() {
    let source = "manifest {}\nf()\nglobalvar x = 1\nfn f() {}";
    assert_eq!(
        error_texts(source),
        vec![MISPLACED_GLOBAL_VAR_DECLS_AFTER_FN_DECL_OR_REF_TO_FN]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Placement
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_break_and_continue_placement() {
    assert!(error_texts("manifest {}\nfor i in [1] {\n  if true {\n    break\n  }\n}").is_empty());
    assert_eq!(error_texts("manifest {}\nbreak"), vec![BREAK_STMTS_ONLY_ALLOWED_LOCATION]);
    assert_eq!(
        error_texts("manifest {}\nswitch 1 {\n  1 {\n    continue\n  }\n}"),
        vec![CONTINUE_STMTS_ONLY_ALLOWED_IN_BODY_FOR_OR_WALK_STMT]
    );
}

#[test]
fn test_prune_placement() {
    assert_eq!(
        error_texts("manifest {}\nfor i in [1] {\n  prune\n}"),
        vec![PRUNE_STMTS_ARE_ONLY_ALLOWED_IN_WALK_STMTS_AND_EXPRS]
    );
}

#[test]
fn test_self_placement() {
    assert_eq!(
        error_texts("manifest {}\nfn f() {\n  return self\n}"),
        vec![SELF_ACCESSIBILITY_EXPLANATION]
    );
    assert!(error_texts("manifest {}\n$o = {a: 1, f: fn() { return self.a }}").is_empty());
    assert_eq!(
        error_texts("manifest {}\n$o = {a: 1, f: fn() { return self.b }}"),
        vec![fmt_object_does_not_have_prop("b")]
    );
}

#[test]
fn test_self_and_sendval_in_metaproperty_blocks() {
    assert!(error_texts("manifest {}\n$o = {a: 1, _init_ {\n  $x = self.a\n}}").is_empty());
    assert_eq!(
        error_texts("manifest {}\n$o = {a: 1, _init_ {\n  $x = self.b\n}}"),
        vec![fmt_object_does_not_have_prop("b")]
    );
    assert!(error_texts("manifest {}\n$o = {a: 1, _init_ {\n  sendval 1 to self\n}}").is_empty());
}

#[test]
fn test_visibility_descriptions() {
    assert!(error_texts("manifest {}\n$o = {a: 1, _visibility_ {\n  {public: .{a}}\n}}").is_empty());
    assert!(error_texts("manifest {}\n$o = {a: 1, _visibility_ {\n  {visible_by: :{self: .{a}}}\n}}").is_empty());
    assert_eq!(
        error_texts("manifest {}\n$o = {a: 1, _visibility_ {\n  $x = 1\n}}"),
        vec![INVALID_VISIB_INIT_BLOCK_SHOULD_CONT_OBJ]
    );
    assert_eq!(
        error_texts("manifest {}\n$o = {a: 1, _visibility_ {\n  {public: 1}\n}}"),
        vec![VAL_SHOULD_BE_KEYLIST_LIT]
    );
    assert_eq!(
        error_texts("manifest {}\n$o = {a: 1, _visibility_ {\n  {visible_by: 1}\n}}"),
        vec![VAL_SHOULD_BE_DICT_LIT]
    );
    assert_eq!(
        error_texts("manifest {}\n$o = {a: 1, _visibility_ {\n  {hidden: .{a}}\n}}"),
        vec![INVALID_VISIBILITY_DESC_KEY]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Captured globals
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_captured_globals() {
    let source = "manifest {}\nglobalvar g = 1\nfn f() {\n  return g\n}\nfn h() {\n  return f()\n}";
    let chunk = parse_chunk("/main.ix", source).unwrap();
    let data = check(&CheckInput::for_chunk(&chunk).with_defaults()).unwrap();
    assert!(data.errors().is_empty(), "{:?}", data.errors());

    let functions = find_nodes(&chunk.node, |n| matches!(n.kind, NodeKind::FnExpr { .. }));
    assert_eq!(functions.len(), 2);
    assert_eq!(data.fn_data(functions[0].id).unwrap().captured_globals, vec!["g"]);
    assert_eq!(data.fn_data(functions[1].id).unwrap().captured_globals, vec!["f", "g"]);
}

#[test]
fn test_captured_globals_of_functions_declared_later() {
    let source = "manifest {}\nglobalvar g = 1\nfn h() {\n  return f()\n}\nfn f() {\n  return g\n}";
    let chunk = parse_chunk("/main.ix", source).unwrap();
    let data = check(&CheckInput::for_chunk(&chunk).with_defaults()).unwrap();

    let functions = find_nodes(&chunk.node, |n| matches!(n.kind, NodeKind::FnExpr { .. }));
    assert_eq!(data.fn_data(functions[0].id).unwrap().captured_globals, vec!["f", "g"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_included_chunk_definitions_are_visible() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport ./dep.ix\n$a = %p")
        .with_file("/dep.ix", "includable-file\npattern p = %int");

    let data = check_module(fs, "/main.ix");
    assert!(data.errors().is_empty(), "{:?}", data.errors());
}

#[test]
fn test_included_chunk_cannot_redefine_a_pattern() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\npattern p = %int\nimport ./dep.ix")
        .with_file("/dep.ix", "includable-file\npattern p = %str");

    let data = check_module(fs, "/main.ix");
    let texts: Vec<&str> = data.errors().iter().map(|e| e.text()).collect();
    assert_eq!(texts, vec![fmt_pattern_already_declared("p")]);
}

#[test]
fn test_included_chunk_locals_are_merged() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport ./dep.ix\nprint(x)")
        .with_file("/dep.ix", "includable-file\nvar x = 1");

    let data = check_module(fs, "/main.ix");
    let texts: Vec<&str> = data.errors().iter().map(|e| e.text()).collect();
    assert_eq!(texts, vec![AN_INCLUDABLE_FILE_CAN_ONLY_CONTAIN_DEFINITIONS]);
}

#[test]
fn test_included_chunk_cannot_shadow_a_local() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nvar x = 2\nimport ./dep.ix")
        .with_file("/dep.ix", "includable-file\nvar x = 1");

    let data = check_module(fs, "/main.ix");
    let texts: Vec<&str> = data.errors().iter().map(|e| e.text()).collect();
    assert_eq!(
        texts,
        vec![
            AN_INCLUDABLE_FILE_CAN_ONLY_CONTAIN_DEFINITIONS.to_string(),
            fmt_cannot_shadow_local_variable("x"),
        ]
    );
}

#[test]
fn test_errors_of_imported_modules_are_located_from_the_import() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport lib ./lib.ix {}")
        .with_file("/lib.ix", "manifest {}\n$a = $b");

    let data = check_module(fs, "/main.ix");
    assert_eq!(data.errors().len(), 1);
    let error = &data.errors()[0];
    assert_eq!(error.text(), fmt_var_is_not_declared("b"));
    assert_eq!(error.location.len(), 2);
    assert_eq!(error.location.entries()[0].source_name.as_ref(), "/main.ix");
    assert_eq!(error.location.entries()[1].source_name.as_ref(), "/lib.ix");
}

#[test]
fn test_import_identifier_is_a_global_constant() {
    let fs = MemoryFs::new()
        .with_file("/main.ix", "manifest {}\nimport lib ./lib.ix {}\nlib = 1")
        .with_file("/lib.ix", "manifest {}");

    let data = check_module(fs, "/main.ix");
    let texts: Vec<&str> = data.errors().iter().map(|e| e.text()).collect();
    assert_eq!(texts, vec![GLOBAL_VARS_AND_CONSTS_CANNOT_BE_REASSIGNED]);
}

#[test]
fn test_manifest_sections_of_spec_modules() {
    let fs = MemoryFs::new().with_file("/a.spec.ix", "manifest {\n  parameters: {}\n}");

    let data = check_module(fs, "/a.spec.ix");
    let texts: Vec<&str> = data.errors().iter().map(|e| e.text()).collect();
    assert_eq!(
        texts,
        vec![fmt_the_x_section_is_not_allowed_for_the_current_module_kind(
            "parameters",
            inox_module::ModuleKind::Spec
        )]
    );
}
