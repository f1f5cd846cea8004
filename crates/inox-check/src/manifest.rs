//! Manifest object checks.
//!
//! The manifest is validated on its own, before the rest of the module: the
//! sections it may contain depend on the module kind and each section has a
//! fixed shape.

use inox_common::Span;
use inox_module::{ModuleKind, MANIFEST_KIND_SECTION_NAME};
use inox_syntax::{walk, FnVisitor, Node, NodeKind, TraversalAction, Visit};

use crate::messages::*;

pub const PERMS_SECTION: &str = "permissions";
pub const LIMITS_SECTION: &str = "limits";
pub const ENV_SECTION: &str = "env";
pub const PARAMS_SECTION: &str = "parameters";
pub const PREINIT_FILES_SECTION: &str = "preinit-files";
pub const DATABASES_SECTION: &str = "databases";
pub const HOST_RESOLUTION_SECTION: &str = "host-resolution";

const ALL_SECTIONS: &[&str] = &[
    MANIFEST_KIND_SECTION_NAME,
    PERMS_SECTION,
    LIMITS_SECTION,
    ENV_SECTION,
    PARAMS_SECTION,
    PREINIT_FILES_SECTION,
    DATABASES_SECTION,
    HOST_RESOLUTION_SECTION,
];

const SPEC_SECTIONS: &[&str] = &[MANIFEST_KIND_SECTION_NAME, PERMS_SECTION, LIMITS_SECTION];
const EMBEDDED_SECTIONS: &[&str] = &[PERMS_SECTION, LIMITS_SECTION];

pub const PERMISSION_KINDS: &[&str] = &["read", "write", "delete", "use", "consume", "provide", "see"];

/// Typed permissions described by a named property of a permission kind.
const PERMISSION_TYPE_NAMES: &[&str] = &[
    "dns",
    "tcp",
    "globals",
    "env",
    "threads",
    "system-graph",
    "commands",
    "values",
    "custom",
];

const PREINIT_FILE_PATH_PROP: &str = "path";
const PREINIT_FILE_PATTERN_PROP: &str = "pattern";
const DATABASE_RESOURCE_PROP: &str = "resource";
const DATABASE_RESOLUTION_DATA_PROP: &str = "resolution-data";
const DATABASE_OPTIONAL_PROPS: &[&str] = &["expected-schema-update", "assert-schema"];

/// Sections a manifest may contain for a module of kind `kind`.
pub fn allowed_sections(kind: ModuleKind) -> &'static [&'static str] {
    match kind {
        ModuleKind::Unspecified | ModuleKind::Application => ALL_SECTIONS,
        ModuleKind::Spec => SPEC_SECTIONS,
        ModuleKind::UserLThread | ModuleKind::TestSuite | ModuleKind::TestCase => EMBEDDED_SECTIONS,
    }
}

/// Keyed properties of an object literal.
fn keyed_properties(object: &Node) -> impl Iterator<Item = (&str, Span, &Node, &Node)> {
    let properties = match &object.kind {
        NodeKind::Object { properties, .. } => properties.as_slice(),
        _ => &[][..],
    };
    properties.iter().filter_map(|property| match &property.kind {
        NodeKind::ObjectProperty { key: Some(key), value } => {
            Some((key.name.as_str(), key.span, property, value.as_ref()))
        }
        _ => None,
    })
}

/// Reports every descendant of `root` rejected by `allowed`, returns whether one was found.
fn check_allowed_nodes(
    root: &Node,
    allowed: fn(&NodeKind) -> bool,
    message: fn(&str) -> String,
    on_error: &mut dyn FnMut(Span, &str),
) -> bool {
    let mut found = false;
    walk(
        root,
        &mut FnVisitor(|visit: &Visit<'_, '_>| {
            let node = visit.node;
            if node.id == root.id || allowed(&node.kind) {
                return TraversalAction::Continue;
            }
            found = true;
            on_error(node.span, &message(node.kind.name()));
            TraversalAction::Prune
        }),
    );
    found
}

/// Checks the object of a manifest.
///
/// `embedded` is set for the manifests of embedded modules; their unknown
/// sections are ignored.
pub fn check_manifest_object(object: &Node, kind: ModuleKind, embedded: bool, on_error: &mut dyn FnMut(Span, &str)) {
    let NodeKind::Object { properties, .. } = &object.kind else {
        return;
    };

    walk(
        object,
        &mut FnVisitor(|visit: &Visit<'_, '_>| {
            let node = visit.node;
            match &node.kind {
                NodeKind::Object { properties, .. } | NodeKind::Record { properties } => {
                    if properties.iter().any(|p| matches!(p.kind, NodeKind::PropertySpread { .. })) {
                        on_error(node.span, NO_SPREAD_IN_MANIFEST);
                    }
                }
                NodeKind::PropertySpread { .. } => return TraversalAction::Prune,
                _ => {}
            }
            TraversalAction::Continue
        }),
    );

    for property in properties {
        let NodeKind::ObjectProperty { key, value } = &property.kind else {
            continue;
        };
        let Some(key) = key else {
            on_error(property.span, ELEMENTS_NOT_ALLOWED_IN_MANIFEST);
            continue;
        };
        let section = key.name.as_str();

        if ALL_SECTIONS.contains(&section) && !allowed_sections(kind).contains(&section) {
            on_error(key.span, &fmt_the_x_section_is_not_allowed_for_the_current_module_kind(section, kind));
            continue;
        }

        match section {
            MANIFEST_KIND_SECTION_NAME => check_kind_section(key.span, value, kind, on_error),
            PERMS_SECTION => match value.kind {
                NodeKind::Object { .. } => check_permission_listing(value, on_error),
                _ => on_error(property.span, PERMS_SECTION_SHOULD_BE_AN_OBJECT),
            },
            LIMITS_SECTION => match value.kind {
                NodeKind::Object { .. } => {
                    check_allowed_nodes(
                        value,
                        |kind| {
                            matches!(kind, NodeKind::ObjectProperty { .. } | NodeKind::GlobalVariable(_))
                                || kind.is_simple_value_literal()
                        },
                        fmt_forbidden_node_in_limits_section,
                        on_error,
                    );
                }
                _ => on_error(property.span, LIMITS_SECTION_SHOULD_BE_AN_OBJECT),
            },
            ENV_SECTION if embedded => on_error(property.span, ENV_SECTION_NOT_AVAILABLE_IN_EMBEDDED_MODULE_MANIFESTS),
            ENV_SECTION => match value.kind {
                NodeKind::ObjectPattern { .. } => {
                    check_allowed_nodes(
                        value,
                        |kind| {
                            matches!(
                                kind,
                                NodeKind::PatternIdent { .. }
                                    | NodeKind::PatternNsMember { .. }
                                    | NodeKind::ObjectPatternProperty { .. }
                                    | NodeKind::GlobalVariable(_)
                            ) || kind.is_simple_value_literal()
                        },
                        fmt_forbidden_node_in_env_section,
                        on_error,
                    );
                }
                _ => on_error(property.span, ENV_SECTION_SHOULD_BE_AN_OBJECT_PATTERN),
            },
            PARAMS_SECTION if embedded => {
                on_error(property.span, PARAMS_SECTION_NOT_AVAILABLE_IN_EMBEDDED_MODULE_MANIFESTS)
            }
            PARAMS_SECTION => match value.kind {
                NodeKind::Object { .. } => check_parameters(value, on_error),
                _ => on_error(property.span, PARAMS_SECTION_SHOULD_BE_AN_OBJECT),
            },
            PREINIT_FILES_SECTION if embedded => {
                on_error(property.span, PREINIT_FILES_SECTION_NOT_AVAILABLE_IN_EMBEDDED_MODULE_MANIFESTS)
            }
            PREINIT_FILES_SECTION => match value.kind {
                NodeKind::Object { .. } => check_preinit_files(value, on_error),
                _ => on_error(property.span, PREINIT_FILES_SECTION_SHOULD_BE_AN_OBJECT),
            },
            DATABASES_SECTION if embedded => {
                on_error(property.span, DATABASES_SECTION_NOT_AVAILABLE_IN_EMBEDDED_MODULE_MANIFESTS)
            }
            DATABASES_SECTION => match value.kind {
                NodeKind::Object { .. } => check_databases(value, on_error),
                NodeKind::AbsPath(_) => {}
                _ => on_error(property.span, DATABASES_SECTION_SHOULD_BE_AN_OBJECT_OR_ABS_PATH),
            },
            HOST_RESOLUTION_SECTION => match value.kind {
                NodeKind::Dictionary { .. } => {
                    check_allowed_nodes(
                        value,
                        |kind| {
                            matches!(
                                kind,
                                NodeKind::Object { .. }
                                    | NodeKind::ObjectProperty { .. }
                                    | NodeKind::DictEntry { .. }
                                    | NodeKind::GlobalVariable(_)
                                    | NodeKind::Member { .. }
                            ) || kind.is_simple_value_literal()
                        },
                        fmt_forbidden_node_in_host_resolution_section,
                        on_error,
                    );
                }
                _ => on_error(property.span, HOST_RESOLUTION_SECTION_SHOULD_BE_A_DICT),
            },
            _ if embedded => {}
            _ => on_error(property.span, &fmt_unknown_section_of_manifest(section)),
        }
    }
}

fn check_kind_section(key_span: Span, value: &Node, kind: ModuleKind, on_error: &mut dyn FnMut(Span, &str)) {
    let NodeKind::Str(name) = &value.kind else {
        on_error(key_span, KIND_SECTION_SHOULD_BE_A_STRING_LITERAL);
        return;
    };

    let declared = match ModuleKind::parse(name) {
        Ok(declared) => declared,
        Err(err) => {
            on_error(key_span, &err.to_string());
            return;
        }
    };
    if declared.is_embedded() {
        on_error(key_span, INVALID_KIND_SECTION_EMBEDDED_MOD_KINDS_NOT_ALLOWED);
        return;
    }
    if declared == ModuleKind::Unspecified {
        on_error(key_span, THE_UNSPECIFIED_MOD_KIND_NAME_CANNOT_BE_USED_IN_THE_MANIFEST);
        return;
    }

    if kind == ModuleKind::Spec && declared != ModuleKind::Spec {
        on_error(key_span, MOD_KIND_SPECIFIED_IN_MANIFEST_SHOULD_BE_SPEC_OR_SHOULD_BE_OMITTED);
    } else if kind != ModuleKind::Unspecified && kind != declared {
        on_error(key_span, MOD_KIND_NOT_EQUAL_TO_KIND_DETERMINED_DURING_PARSING);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Permissions
// ═══════════════════════════════════════════════════════════════════════════

fn check_permission_listing(object: &Node, on_error: &mut dyn FnMut(Span, &str)) {
    check_allowed_nodes(
        object,
        |kind| {
            matches!(
                kind,
                NodeKind::Object { .. }
                    | NodeKind::List { .. }
                    | NodeKind::Dictionary { .. }
                    | NodeKind::DictEntry { .. }
                    | NodeKind::ObjectProperty { .. }
                    | NodeKind::GlobalVariable(_)
                    | NodeKind::Variable(_)
                    | NodeKind::Ident(_)
                    | NodeKind::PatternIdent { .. }
                    | NodeKind::PatternNsIdent(_)
            ) || kind.is_simple_value_literal()
        },
        fmt_forbidden_node_in_perm_listing,
        on_error,
    );

    let NodeKind::Object { properties, .. } = &object.kind else {
        return;
    };
    for property in properties {
        let NodeKind::ObjectProperty { key, value } = &property.kind else {
            continue;
        };
        let Some(key) = key else {
            on_error(property.span, ELEMENTS_NOT_ALLOWED_IN_PERMS_SECTION);
            continue;
        };
        if !PERMISSION_KINDS.contains(&key.name.as_str()) {
            on_error(key.span, &fmt_not_valid_permission_kind_name(&key.name, PERMISSION_KINDS));
            continue;
        }
        check_single_kind_permissions(&key.name, value, on_error);
    }
}

fn check_single_kind_permissions(perm_kind: &str, desc: &Node, on_error: &mut dyn FnMut(Span, &str)) {
    match &desc.kind {
        NodeKind::List { elements } => {
            for element in elements {
                check_permission_item(element, on_error);
            }
        }
        NodeKind::Object { properties, .. } => {
            for property in properties {
                match &property.kind {
                    NodeKind::ObjectProperty { key: None, value } => check_permission_item(value, on_error),
                    NodeKind::ObjectProperty { key: Some(key), value } => {
                        if !PERMISSION_TYPE_NAMES.contains(&key.name.as_str()) {
                            on_error(value.span, &fmt_cannot_infer_permission(perm_kind, &key.name));
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => check_permission_item(desc, on_error),
    }
}

fn check_permission_item(node: &Node, on_error: &mut dyn FnMut(Span, &str)) {
    match &node.kind {
        NodeKind::AbsPath(_)
        | NodeKind::Url(_)
        | NodeKind::Host(_)
        | NodeKind::PatternIdent { .. }
        | NodeKind::PatternNsIdent(_)
        | NodeKind::GlobalVariable(_)
        | NodeKind::Variable(_)
        | NodeKind::Ident(_) => {}
        NodeKind::RelPath(path) => on_error(node.span, &fmt_only_abs_paths_are_accepted_in_perms(path)),
        NodeKind::Str(s) => on_error(node.span, &string_permission_message(s)),
        _ => on_error(node.span, NO_PERM_DESCRIBED_BY_THIS_TYPE_OF_VALUE),
    }
}

/// Error text for a string used as a permission, with a hint when the
/// string looks like a path or a URL.
fn string_permission_message(s: &str) -> String {
    if s.len() <= 1 {
        return NO_PERM_DESCRIBED_BY_STRINGS.to_string();
    }

    let (is_pattern, rest) = match s.strip_prefix('%') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let hint = if ["/", "./", "../"].iter().any(|p| rest.starts_with(p)) {
        Some(if is_pattern {
            MAYBE_YOU_MEANT_TO_WRITE_A_PATH_PATTERN_LITERAL
        } else {
            MAYBE_YOU_MEANT_TO_WRITE_A_PATH_LITERAL
        })
    } else if ["https://", "http://"].iter().any(|p| rest.starts_with(p)) {
        Some(if is_pattern {
            MAYBE_YOU_MEANT_TO_WRITE_A_URL_PATTERN_LITERAL
        } else {
            MAYBE_YOU_MEANT_TO_WRITE_A_URL_LITERAL
        })
    } else {
        None
    };

    match hint {
        Some(hint) => format!("{}, {}", NO_PERM_DESCRIBED_BY_STRINGS, hint),
        None => format!("{}, ", NO_PERM_DESCRIBED_BY_STRINGS),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Other sections
// ═══════════════════════════════════════════════════════════════════════════

fn check_parameters(object: &Node, on_error: &mut dyn FnMut(Span, &str)) {
    check_allowed_nodes(
        object,
        |kind| {
            matches!(
                kind,
                NodeKind::Object { .. }
                    | NodeKind::ObjectProperty { .. }
                    | NodeKind::List { .. }
                    | NodeKind::Ident(_)
                    | NodeKind::GlobalVariable(_)
                    | NodeKind::PatternIdent { .. }
                    | NodeKind::PatternNsMember { .. }
                    | NodeKind::ObjectPattern { .. }
                    | NodeKind::ObjectPatternProperty { .. }
                    | NodeKind::Unary { .. }
            ) || kind.is_simple_value_literal()
        },
        fmt_forbidden_node_in_parameters_section,
        on_error,
    );
}

fn preinit_files_node_allowed(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::PatternIdent { .. }
            | NodeKind::PatternNsMember { .. }
            | NodeKind::Object { .. }
            | NodeKind::ObjectProperty { .. }
            | NodeKind::GlobalVariable(_)
    ) || kind.is_simple_value_literal()
}

fn check_preinit_files(object: &Node, on_error: &mut dyn FnMut(Span, &str)) {
    if check_allowed_nodes(object, preinit_files_node_allowed, fmt_forbidden_node_in_preinit_files_section, on_error) {
        return;
    }

    for (name, _, property, description) in keyed_properties(object) {
        if !matches!(description.kind, NodeKind::Object { .. }) {
            on_error(description.span, PREINIT_FILES_FILE_CONFIG_SHOULD_BE_AN_OBJECT);
            continue;
        }

        match inox_module::manifest_section_of_object(description, PREINIT_FILE_PATH_PROP) {
            None => on_error(
                property.span,
                &fmt_missing_prop_in_preinit_file_description(PREINIT_FILE_PATH_PROP, name),
            ),
            Some(path) if !matches!(path.kind, NodeKind::AbsPath(_)) => {
                on_error(property.span, PREINIT_FILES_FILE_CONFIG_PATH_SHOULD_BE_ABS_PATH)
            }
            Some(_) => {}
        }

        if inox_module::manifest_section_of_object(description, PREINIT_FILE_PATTERN_PROP).is_none() {
            on_error(
                property.span,
                &fmt_missing_prop_in_preinit_file_description(PREINIT_FILE_PATTERN_PROP, name),
            );
        }
    }
}

fn check_databases(object: &Node, on_error: &mut dyn FnMut(Span, &str)) {
    for (name, _, property, description) in keyed_properties(object) {
        if !matches!(description.kind, NodeKind::Object { .. }) {
            on_error(description.span, DATABASES_DATABASE_CONFIG_SHOULD_BE_AN_OBJECT);
            continue;
        }

        for required in [DATABASE_RESOURCE_PROP, DATABASE_RESOLUTION_DATA_PROP] {
            if inox_module::manifest_section_of_object(description, required).is_none() {
                on_error(property.span, &fmt_missing_prop_in_database_description(required, name));
            }
        }

        for (prop, key_span, _, _) in keyed_properties(description) {
            let known = prop == DATABASE_RESOURCE_PROP
                || prop == DATABASE_RESOLUTION_DATA_PROP
                || DATABASE_OPTIONAL_PROPS.contains(&prop);
            if !known {
                on_error(key_span, &fmt_unexpected_prop_of_database_description(prop));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inox_syntax::parse;

    fn manifest_errors(source: &str, kind: ModuleKind, embedded: bool) -> Vec<String> {
        let (chunk, errors) = parse(source);
        assert!(errors.is_empty(), "{:?}", errors);
        let Some(NodeKind::Manifest { object }) = chunk.manifest().map(|m| &m.kind) else {
            panic!("expected a manifest");
        };
        let mut out = Vec::new();
        check_manifest_object(object, kind, embedded, &mut |_, text| out.push(text.to_string()));
        out
    }

    #[test]
    fn test_empty_manifest() {
        assert!(manifest_errors("manifest {}", ModuleKind::Application, false).is_empty());
    }

    #[test]
    fn test_sections_per_kind() {
        let source = "manifest {\n  parameters: {}\n}";
        assert!(manifest_errors(source, ModuleKind::Application, false).is_empty());
        assert_eq!(
            manifest_errors(source, ModuleKind::Spec, false),
            vec![fmt_the_x_section_is_not_allowed_for_the_current_module_kind(
                "parameters",
                ModuleKind::Spec
            )]
        );

        let source = "manifest {\n  limits: {}\n}";
        assert!(manifest_errors(source, ModuleKind::TestCase, true).is_empty());
    }

    #[test]
    fn test_unknown_sections() {
        let source = "manifest {\n  foo: 1\n}";
        assert_eq!(
            manifest_errors(source, ModuleKind::Application, false),
            vec![fmt_unknown_section_of_manifest("foo")]
        );
        assert!(manifest_errors(source, ModuleKind::UserLThread, true).is_empty());
    }

    #[test]
    fn test_elements_are_rejected() {
        assert_eq!(
            manifest_errors("manifest {1}", ModuleKind::Application, false),
            vec![ELEMENTS_NOT_ALLOWED_IN_MANIFEST]
        );
    }

    #[test]
    fn test_kind_section() {
        let errors = |source| manifest_errors(source, ModuleKind::Unspecified, false);
        assert!(errors("manifest {kind: \"application\"}").is_empty());
        assert_eq!(errors("manifest {kind: 1}"), vec![KIND_SECTION_SHOULD_BE_A_STRING_LITERAL]);
        assert_eq!(
            errors("manifest {kind: \"testcase\"}"),
            vec![INVALID_KIND_SECTION_EMBEDDED_MOD_KINDS_NOT_ALLOWED]
        );
        assert_eq!(
            errors("manifest {kind: \"unspecified\"}"),
            vec![THE_UNSPECIFIED_MOD_KIND_NAME_CANNOT_BE_USED_IN_THE_MANIFEST]
        );
        assert_eq!(
            manifest_errors("manifest {kind: \"application\"}", ModuleKind::Spec, false),
            vec![MOD_KIND_SPECIFIED_IN_MANIFEST_SHOULD_BE_SPEC_OR_SHOULD_BE_OMITTED]
        );
    }

    #[test]
    fn test_permissions() {
        let errors = |source| manifest_errors(source, ModuleKind::Application, false);
        assert!(errors("manifest {\n  permissions: {read: /home/}\n}").is_empty());
        assert!(errors("manifest {\n  permissions: {read: [/a, https://example.com/]}\n}").is_empty());
        assert_eq!(
            errors("manifest {\n  permissions: {read: ./a}\n}"),
            vec![fmt_only_abs_paths_are_accepted_in_perms("./a")]
        );
        assert_eq!(
            errors("manifest {\n  permissions: {fly: /a}\n}"),
            vec![fmt_not_valid_permission_kind_name("fly", PERMISSION_KINDS)]
        );
        assert_eq!(
            errors("manifest {\n  permissions: 1\n}"),
            vec![PERMS_SECTION_SHOULD_BE_AN_OBJECT]
        );
    }

    #[test]
    fn test_string_permission_hints() {
        assert_eq!(
            string_permission_message("/a"),
            format!("{}, {}", NO_PERM_DESCRIBED_BY_STRINGS, MAYBE_YOU_MEANT_TO_WRITE_A_PATH_LITERAL)
        );
        assert_eq!(
            string_permission_message("%https://a.com/..."),
            format!("{}, {}", NO_PERM_DESCRIBED_BY_STRINGS, MAYBE_YOU_MEANT_TO_WRITE_A_URL_PATTERN_LITERAL)
        );
        assert_eq!(string_permission_message("a"), NO_PERM_DESCRIBED_BY_STRINGS);
    }

    #[test]
    fn test_embedded_manifests_reject_module_sections() {
        let errors = manifest_errors("manifest {\n  env: %{}\n}", ModuleKind::Unspecified, true);
        assert_eq!(errors, vec![ENV_SECTION_NOT_AVAILABLE_IN_EMBEDDED_MODULE_MANIFESTS]);
    }

    #[test]
    fn test_preinit_files() {
        let errors = |source| manifest_errors(source, ModuleKind::Application, false);
        assert!(errors("manifest {\n  preinit-files: {F: {path: /f.json, pattern: %str}}\n}").is_empty());
        assert_eq!(
            errors("manifest {\n  preinit-files: {F: {path: ./f.json, pattern: %str}}\n}"),
            vec![PREINIT_FILES_FILE_CONFIG_PATH_SHOULD_BE_ABS_PATH]
        );
        assert_eq!(
            errors("manifest {\n  preinit-files: {F: {path: /f.json}}\n}"),
            vec![fmt_missing_prop_in_preinit_file_description("pattern", "F")]
        );
    }

    #[test]
    fn test_databases() {
        let errors = |source| manifest_errors(source, ModuleKind::Application, false);
        assert!(errors("manifest {\n  databases: /dbs.ix\n}").is_empty());
        assert_eq!(
            errors("manifest {\n  databases: {main: {resource: /main, x: 1}}\n}"),
            vec![
                fmt_missing_prop_in_database_description("resolution-data", "main"),
                fmt_unexpected_prop_of_database_description("x"),
            ]
        );
    }
}
