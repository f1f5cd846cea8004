//! Generic pre-order/post-order tree traversal.
//!
//! The visitor receives each node together with its parent, the nearest
//! enclosing scope container and the full ancestor chain (root first, the
//! node itself excluded). Its decision is returned as a [`TraversalAction`];
//! stopping is a normal return value that unwinds the recursion.

use crate::ast::Node;

/// What to do after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalAction {
    Continue,
    /// Skip the children of the current node. Treated as `Continue` on leave.
    Prune,
    /// Abort the whole traversal.
    Stop,
}

/// A node together with its position in the tree.
#[derive(Clone, Copy)]
pub struct Visit<'a, 'c> {
    pub node: &'a Node,
    pub parent: Option<&'a Node>,
    /// The closest scope container among the ancestors, or the parent when there is none.
    pub scope: Option<&'a Node>,
    pub ancestors: &'c [&'a Node],
}

impl<'a, 'c> Visit<'a, 'c> {
    /// The ancestor `n` levels above the node: `ancestor(0)` is the parent.
    pub fn ancestor(&self, n: usize) -> Option<&'a Node> {
        let len = self.ancestors.len();
        if n < len {
            Some(self.ancestors[len - 1 - n])
        } else {
            None
        }
    }
}

pub trait Visitor<'a> {
    fn enter(&mut self, visit: &Visit<'a, '_>) -> TraversalAction;

    fn leave(&mut self, _visit: &Visit<'a, '_>) -> TraversalAction {
        TraversalAction::Continue
    }
}

/// Adapts a closure into a pre-order [`Visitor`].
pub struct FnVisitor<F>(pub F);

impl<'a, F> Visitor<'a> for FnVisitor<F>
where
    F: FnMut(&Visit<'a, '_>) -> TraversalAction,
{
    fn enter(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
        (self.0)(visit)
    }
}

/// Walks `root` depth-first. Returns `true` if the visitor stopped the traversal.
pub fn walk<'a, V: Visitor<'a> + ?Sized>(root: &'a Node, visitor: &mut V) -> bool {
    let mut ancestors: Vec<&'a Node> = Vec::new();
    walk_node(root, &mut ancestors, visitor) == TraversalAction::Stop
}

fn walk_node<'a, V: Visitor<'a> + ?Sized>(
    node: &'a Node,
    ancestors: &mut Vec<&'a Node>,
    visitor: &mut V,
) -> TraversalAction {
    let parent = ancestors.last().copied();
    let scope = ancestors
        .iter()
        .rev()
        .find(|a| a.kind.is_scope_container())
        .copied()
        .or(parent);

    let action = visitor.enter(&Visit {
        node,
        parent,
        scope,
        ancestors: ancestors.as_slice(),
    });
    match action {
        TraversalAction::Stop => return TraversalAction::Stop,
        TraversalAction::Prune => return TraversalAction::Continue,
        TraversalAction::Continue => {}
    }

    ancestors.push(node);
    for child in node.children() {
        if walk_node(child, ancestors, visitor) == TraversalAction::Stop {
            ancestors.pop();
            return TraversalAction::Stop;
        }
    }
    ancestors.pop();

    let action = visitor.leave(&Visit {
        node,
        parent,
        scope,
        ancestors: ancestors.as_slice(),
    });
    if action == TraversalAction::Stop {
        TraversalAction::Stop
    } else {
        TraversalAction::Continue
    }
}

/// Collects every node (root included) for which `predicate` holds, in pre-order.
pub fn find_nodes<'a>(root: &'a Node, mut predicate: impl FnMut(&Node) -> bool) -> Vec<&'a Node> {
    let mut found = Vec::new();
    walk(
        root,
        &mut FnVisitor(|visit: &Visit<'a, '_>| {
            if predicate(visit.node) {
                found.push(visit.node);
            }
            TraversalAction::Continue
        }),
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parser::parse;

    #[test]
    fn test_scope_and_ancestors() {
        let (chunk, _) = parse("fn f(){\n  $x\n}");
        let mut seen = None;
        walk(
            &chunk,
            &mut FnVisitor(|visit: &Visit<'_, '_>| {
                if matches!(visit.node.kind, NodeKind::Variable(_)) {
                    seen = Some((
                        visit.scope.map(|s| s.kind_name()),
                        visit.parent.map(|p| p.kind_name()),
                        visit.ancestors.len(),
                    ));
                }
                TraversalAction::Continue
            }),
        );
        // chunk > fn decl > fn expr > block > variable
        assert_eq!(seen, Some((Some("function expression"), Some("block"), 4)));
    }

    #[test]
    fn test_prune_and_stop() {
        let (chunk, _) = parse("fn f(){\n  $x\n}\n$y");
        let vars = find_nodes(&chunk, |n| matches!(n.kind, NodeKind::Variable(_)));
        assert_eq!(vars.len(), 2);

        let mut visited = Vec::new();
        let stopped = walk(
            &chunk,
            &mut FnVisitor(|visit: &Visit<'_, '_>| {
                visited.push(visit.node.kind_name());
                match visit.node.kind {
                    NodeKind::FnDecl { .. } => TraversalAction::Prune,
                    NodeKind::Variable(_) => TraversalAction::Stop,
                    _ => TraversalAction::Continue,
                }
            }),
        );
        assert!(stopped);
        assert_eq!(visited, vec!["chunk", "function declaration", "variable"]);
    }

    #[test]
    fn test_leave_is_post_order() {
        struct Order(Vec<&'static str>);
        impl<'a> Visitor<'a> for Order {
            fn enter(&mut self, _visit: &Visit<'a, '_>) -> TraversalAction {
                TraversalAction::Continue
            }
            fn leave(&mut self, visit: &Visit<'a, '_>) -> TraversalAction {
                self.0.push(visit.node.kind_name());
                TraversalAction::Continue
            }
        }

        let (chunk, _) = parse("$x = 1");
        let mut order = Order(Vec::new());
        walk(&chunk, &mut order);
        assert_eq!(order.0, vec!["variable", "integer literal", "assignment", "chunk"]);
    }
}
