//! Literal checks: quantities, rates, ranges, URLs and keyed collections.
//!
//! The node-local checks are free functions so that the manifest checker can
//! reuse them without a [`Checker`].

use inox_common::{FxHashSet, Span};
use inox_syntax::ast::Name;
use inox_syntax::{Node, NodeKind, ParsedChunk, TraversalAction, Visit};

use super::{is_metadata_key, Checker, LocalVarInfo};
use crate::messages::*;

const DURATION_UNITS: &[&str] = &["h", "mn", "s", "ms", "us", "ns"];
const RATE_UNITS: &[&str] = &["x", "B", "kB", "MB", "GB", "TB"];
const OTHER_UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB", "x", "ln", "rn", "%"];

const MEM_HOST_PREFIX: &str = "mem://";
const MAIN_MEM_HOST: &str = "main";

fn duration_rank(unit: &str) -> Option<usize> {
    DURATION_UNITS.iter().position(|u| *u == unit)
}

fn is_supported_unit(unit: &str) -> bool {
    duration_rank(unit).is_some() || OTHER_UNITS.contains(&unit)
}

/// The authority of a URL or host literal: what follows `scheme://` up to the path.
fn authority(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    &rest[..end]
}

fn number_value(node: &Node) -> Option<f64> {
    match node.kind {
        NodeKind::Int(v) => Some(v as f64),
        NodeKind::Float(v) => Some(v),
        _ => None,
    }
}

/// Checks that only depend on the literal itself.
pub(crate) fn check_simple_literal(node: &Node, chunk: &ParsedChunk, on_error: &mut dyn FnMut(Span, &str)) {
    let span = node.span;
    match &node.kind {
        NodeKind::Quantity { values, units } => {
            if values.iter().any(|v| *v < 0.0) {
                on_error(span, NEGATIVE_QUANTITIES_NOT_SUPPORTED);
                return;
            }
            if let Some(unit) = units.iter().find(|u| !is_supported_unit(u)) {
                on_error(span, &fmt_non_supported_unit(unit));
                return;
            }
            if units.len() > 1 {
                let ranks: Option<Vec<usize>> = units.iter().map(|u| duration_rank(u)).collect();
                let decreasing = ranks.is_some_and(|ranks| ranks.windows(2).all(|w| w[0] < w[1]));
                if !decreasing {
                    on_error(span, INVALID_QUANTITY);
                }
            }
        }
        NodeKind::Rate { values, units, div_unit } => {
            if values.iter().any(|v| *v < 0.0) {
                on_error(span, NEGATIVE_QUANTITIES_NOT_SUPPORTED);
                return;
            }
            let valid = div_unit == "s" && units.len() == 1 && RATE_UNITS.contains(&units[0].as_str());
            if !valid {
                on_error(span, INVALID_RATE);
            }
        }
        NodeKind::IntRange { lower, upper: Some(upper) } => {
            if let (NodeKind::Int(lower), NodeKind::Int(upper)) = (&lower.kind, &upper.kind) {
                if lower > upper {
                    on_error(span, LOWER_BOUND_OF_INT_RANGE_LIT_SHOULD_BE_SMALLER_THAN_UPPER_BOUND);
                }
            }
        }
        NodeKind::FloatRange { lower, upper: Some(upper) } => {
            if let (Some(lower), Some(upper)) = (number_value(lower), number_value(upper)) {
                if lower > upper {
                    on_error(span, LOWER_BOUND_OF_FLOAT_RANGE_LIT_SHOULD_BE_SMALLER_THAN_UPPER_BOUND);
                }
            }
        }
        NodeKind::Url(url) | NodeKind::Host(url) => {
            let authority = authority(url);
            if authority.contains('@') {
                on_error(span, CREDENTIALS_NOT_ALLOWED_IN_URLS);
            }
            if url.starts_with(MEM_HOST_PREFIX) && authority != MAIN_MEM_HOST {
                on_error(span, INVALID_MEM_HOST_ONLY_VALID_VALUE);
            }
        }
        NodeKind::Dictionary { entries } => {
            let mut keys = FxHashSet::default();
            for entry in entries {
                let NodeKind::DictEntry { key, .. } = &entry.kind else {
                    continue;
                };
                let text = chunk.file().span_text(key.span);
                if !keys.insert(text.to_string()) {
                    on_error(key.span, &fmt_duplicate_dict_key(text));
                }
            }
        }
        NodeKind::ObjectPattern { properties } => {
            let mut keys = FxHashSet::default();
            for prop in properties {
                let NodeKind::ObjectPatternProperty { key, .. } = &prop.kind else {
                    continue;
                };
                if key.name.len() > MAX_NAME_BYTE_LEN {
                    on_error(key.span, &fmt_name_is_too_long(&key.name));
                } else if is_metadata_key(&key.name) {
                    on_error(key.span, OBJ_REC_LIT_CANNOT_HAVE_METAPROP_KEYS);
                } else if !keys.insert(key.name.clone()) {
                    on_error(key.span, &fmt_duplicate_key(&key.name));
                }
            }
        }
        _ => {}
    }
}

/// Checks the keys of an object or record literal and returns them. Elements
/// (values without a key) get the keys `"0"`, `"1"`, ...
pub(crate) fn shallow_check_properties(properties: &[Node], on_error: &mut dyn FnMut(Span, &str)) -> FxHashSet<String> {
    let mut keys = FxHashSet::default();
    let mut next_index = 0usize;
    let mut has_elements = false;
    let mut has_empty_key = false;

    for prop in properties {
        let (name, span) = match &prop.kind {
            NodeKind::ObjectProperty { key: Some(key), .. } => {
                if key.name.len() > MAX_NAME_BYTE_LEN {
                    on_error(key.span, &fmt_name_is_too_long(&key.name));
                    continue;
                }
                if is_metadata_key(&key.name) {
                    on_error(key.span, OBJ_REC_LIT_CANNOT_HAVE_METAPROP_KEYS);
                    continue;
                }
                if key.name.is_empty() {
                    if has_elements {
                        on_error(key.span, EMPTY_PROP_NAME_NOT_ALLOWED_IF_ELEMENTS);
                    }
                    has_empty_key = true;
                }
                (key.name.clone(), key.span)
            }
            NodeKind::ObjectProperty { key: None, .. } => {
                if has_empty_key {
                    on_error(prop.span, ELEMENTS_NOT_ALLOWED_IF_EMPTY_PROP_NAME);
                }
                has_elements = true;
                let name = next_index.to_string();
                next_index += 1;
                (name, prop.span)
            }
            _ => continue,
        };
        if keys.contains(&name) {
            on_error(span, &fmt_duplicate_key(&name));
        } else {
            keys.insert(name);
        }
    }
    keys
}

/// Checks the `_visibility_ { ... }` block of an object: a single object
/// literal with an optional `public` key list and an optional `visible_by`
/// dictionary whose only allowed key is `self`.
fn check_visibility_block(block: &Node, on_error: &mut dyn FnMut(Span, &str)) {
    let NodeKind::InitializationBlock { statements } = &block.kind else {
        return;
    };
    let description = match statements.as_slice() {
        [stmt] => stmt,
        _ => return on_error(block.span, INVALID_VISIB_INIT_BLOCK_SHOULD_CONT_OBJ),
    };
    let NodeKind::Object {
        properties,
        meta_properties,
    } = &description.kind
    else {
        return on_error(block.span, INVALID_VISIB_INIT_BLOCK_SHOULD_CONT_OBJ);
    };

    if !meta_properties.is_empty() {
        on_error(description.span, INVALID_VISIB_DESC_SHOULDNT_HAVE_METAPROPS);
    }

    for prop in properties {
        let NodeKind::ObjectProperty { key, value } = &prop.kind else {
            continue;
        };
        let Some(key) = key else {
            return on_error(description.span, INVALID_VISIB_DESC_SHOULDNT_HAVE_ELEMENTS);
        };
        match key.name.as_str() {
            "public" => {
                if !matches!(value.kind, NodeKind::KeyList { .. }) {
                    return on_error(prop.span, VAL_SHOULD_BE_KEYLIST_LIT);
                }
            }
            "visible_by" => {
                let NodeKind::Dictionary { entries } = &value.kind else {
                    return on_error(prop.span, VAL_SHOULD_BE_DICT_LIT);
                };
                for entry in entries {
                    let NodeKind::DictEntry { key, value } = &entry.kind else {
                        continue;
                    };
                    if !matches!(key.kind, NodeKind::SelfExpr) {
                        on_error(entry.span, INVALID_VISIBILITY_DESC_KEY);
                    } else if !matches!(value.kind, NodeKind::KeyList { .. }) {
                        return on_error(entry.span, VAL_SHOULD_BE_KEYLIST_LIT);
                    }
                }
            }
            _ => return on_error(prop.span, INVALID_VISIBILITY_DESC_KEY),
        }
    }
}

impl<'a> Checker<'a> {
    fn add_errors(&mut self, errors: Vec<(Span, String)>) {
        for (span, text) in errors {
            self.add_error(span, &text);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Objects and records
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_object_literal(
        &mut self,
        node: &'a Node,
        properties: &'a [Node],
        meta_properties: &'a [Node],
    ) -> TraversalAction {
        let mut errors = Vec::new();
        let keys = shallow_check_properties(properties, &mut |span, text| errors.push((span, text.to_string())));
        for meta in meta_properties {
            if let NodeKind::MetaProperty { key, init } = &meta.kind {
                if key.text == VISIBILITY_KEY {
                    check_visibility_block(init, &mut |span, text| errors.push((span, text.to_string())));
                }
            }
        }
        self.add_errors(errors);

        // keys brought by spread elements are unknown
        let has_spread = properties
            .iter()
            .any(|p| matches!(p.kind, NodeKind::PropertySpread { .. }));
        if !has_spread {
            self.properties.insert(node.id, keys);
        }
        TraversalAction::Continue
    }

    pub(super) fn check_record_literal(&mut self, properties: &'a [Node]) -> TraversalAction {
        let mut errors = Vec::new();
        shallow_check_properties(properties, &mut |span, text| errors.push((span, text.to_string())));
        self.add_errors(errors);
        TraversalAction::Continue
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mappings
    // ═══════════════════════════════════════════════════════════════════════

    pub(super) fn check_mapping_entry_key(&mut self, key: &'a Node) -> TraversalAction {
        let valid = key.kind.is_simple_value_literal()
            || matches!(key.kind, NodeKind::PatternIdent { .. } | NodeKind::PatternNsMember { .. });
        if !valid {
            self.add_error(key.span, INVALID_MAPPING_ENTRY_KEY_ONLY_SIMPL_LITS_AND_PATT_IDENTS);
        }
        TraversalAction::Continue
    }

    pub(super) fn check_dynamic_mapping_entry(
        &mut self,
        visit: &Visit<'a, '_>,
        key: &'a Node,
        key_var: &'a Name,
        group_var: Option<&'a Name>,
    ) -> TraversalAction {
        self.check_mapping_entry_key(key);

        let entry = visit.node.id;
        let module = self.module_node(visit).id;
        for name in std::iter::once(key_var).chain(group_var) {
            if self.global(module, &name.text).is_some() {
                self.add_error(name.span, &fmt_cannot_shadow_global_variable(&name.text));
            } else {
                self.locals_mut(entry).insert(name.text.clone(), LocalVarInfo::default());
            }
        }
        TraversalAction::Continue
    }

    /// `comp` expressions are only valid in the value of a dynamic entry.
    pub(super) fn check_compute(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        let node = visit.node;
        let entry_key = visit.ancestors.iter().rev().find(|a| a.kind.is_scope_container()).and_then(|scope| {
            match &scope.kind {
                NodeKind::DynamicMappingEntry { key, .. } => Some(key.id),
                _ => None,
            }
        });
        let ok = match entry_key {
            Some(key) => node.id != key && !visit.ancestors.iter().any(|a| a.id == key),
            None => false,
        };
        if !ok {
            self.add_error(node.span, MISPLACED_COMPUTE_EXPR_SHOULD_BE_IN_DYNAMIC_MAPPING_EXPR_ENTRY);
        }
        TraversalAction::Continue
    }

    pub(super) fn check_reception_handler(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        if !matches!(visit.parent.map(|p| &p.kind), Some(NodeKind::Object { .. })) {
            self.add_error(visit.node.span, MISPLACED_RECEPTION_HANDLER_EXPRESSION);
        }
        TraversalAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inox_syntax::{find_nodes, parse_chunk};

    /// Messages of the simple-literal checks of every node of `code`.
    fn literal_errors(code: &str) -> Vec<String> {
        let chunk = parse_chunk("/test.ix", code).unwrap();
        assert!(chunk.errors.is_empty(), "{:?}", chunk.errors);
        let mut messages = Vec::new();
        for node in find_nodes(&chunk.node, |_| true) {
            check_simple_literal(node, &chunk, &mut |_, text| messages.push(text.to_string()));
        }
        messages
    }

    #[test]
    fn test_int_range_bounds() {
        assert_eq!(
            literal_errors("$r = 1..0"),
            vec![LOWER_BOUND_OF_INT_RANGE_LIT_SHOULD_BE_SMALLER_THAN_UPPER_BOUND]
        );
        assert!(literal_errors("$r = 0..1").is_empty());
        assert!(literal_errors("$r = 1..").is_empty());
    }

    #[test]
    fn test_quantities() {
        assert!(literal_errors("$d = 1h30mn").is_empty());
        assert_eq!(literal_errors("$d = 30mn1h"), vec![INVALID_QUANTITY]);
        assert_eq!(literal_errors("$d = -1s"), vec![NEGATIVE_QUANTITIES_NOT_SUPPORTED]);
        assert_eq!(literal_errors("$d = 1kB2B"), vec![INVALID_QUANTITY]);
    }

    #[test]
    fn test_rates() {
        assert!(literal_errors("$r = 10kB/s").is_empty());
        assert_eq!(literal_errors("$r = 10kB/mn"), vec![INVALID_RATE]);
        assert_eq!(literal_errors("$r = 10s/s"), vec![INVALID_RATE]);
    }

    #[test]
    fn test_authority() {
        assert_eq!(authority("https://user@example.com/path"), "user@example.com");
        assert_eq!(authority("mem://main"), "main");
        assert_eq!(authority("https://example.com?q=1"), "example.com");
    }

    #[test]
    fn test_shallow_check_properties() {
        let chunk = parse_chunk("/test.ix", "$o = {a: 1, 2, a: 3, \"0\": 4, _meta_: 5}").unwrap();
        let object = find_nodes(&chunk.node, |n| matches!(n.kind, NodeKind::Object { .. }))[0];
        let NodeKind::Object { properties, .. } = &object.kind else {
            unreachable!()
        };

        let mut messages = Vec::new();
        let keys = shallow_check_properties(properties, &mut |_, text| messages.push(text.to_string()));

        assert_eq!(
            messages,
            vec![
                fmt_duplicate_key("a"),
                fmt_duplicate_key("0"),
                OBJ_REC_LIT_CANNOT_HAVE_METAPROP_KEYS.to_string(),
            ]
        );
        assert!(keys.contains("a") && keys.contains("0"));
        assert_eq!(keys.len(), 2);
    }
}
