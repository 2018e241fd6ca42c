//! Visitor traversal over an arena-backed AST.
//!
//! Dispatch is a `match` on [`crate::ast::NodeKind`], not virtual method
//! calls on a per-kind type — see the module doc on why (spec §9).

use crate::arena::{NodeArena, NodeIndex};
use crate::ast::NodeKind;

/// Pre-order depth-first traversal starting at `root`, in child order.
pub fn visit_preorder<F: FnMut(NodeIndex, NodeKind)>(arena: &NodeArena, root: NodeIndex, mut f: F) {
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        let kind = arena.kind(index).expect("index from traversal is always valid");
        f(index, kind);
        let children: Vec<NodeIndex> = arena.children(index).collect();
        stack.extend(children.into_iter().rev());
    }
}

/// Post-order depth-first traversal starting at `root`, in child order.
pub fn visit_postorder<F: FnMut(NodeIndex, NodeKind)>(arena: &NodeArena, root: NodeIndex, mut f: F) {
    fn walk<F: FnMut(NodeIndex, NodeKind)>(arena: &NodeArena, index: NodeIndex, f: &mut F) {
        for child in arena.children(index).collect::<Vec<_>>() {
            walk(arena, child, f);
        }
        let kind = arena.kind(index).expect("index from traversal is always valid");
        f(index, kind);
    }
    walk(arena, root, &mut f);
}

/// Collects every descendant (including `root`) whose kind matches `kind`.
pub fn find_all_of_kind(arena: &NodeArena, root: NodeIndex, kind: NodeKind) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    visit_preorder(arena, root, |index, node_kind| {
        if node_kind == kind {
            out.push(index);
        }
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::NodeArena;

    #[test]
    fn preorder_visits_parent_before_children() {
        let mut arena = NodeArena::new(8);
        let root = arena.allocate(NodeKind::CompilationUnit, 0, 10);
        let child = arena.allocate(NodeKind::TypeDeclaration, 0, 5);
        arena.append_child(root, child).unwrap();

        let mut order = Vec::new();
        visit_preorder(&arena, root, |idx, _| order.push(idx));
        assert_eq!(order, vec![root, child]);
    }

    #[test]
    fn postorder_visits_children_before_parent() {
        let mut arena = NodeArena::new(8);
        let root = arena.allocate(NodeKind::CompilationUnit, 0, 10);
        let child = arena.allocate(NodeKind::TypeDeclaration, 0, 5);
        arena.append_child(root, child).unwrap();

        let mut order = Vec::new();
        visit_postorder(&arena, root, |idx, _| order.push(idx));
        assert_eq!(order, vec![child, root]);
    }

    #[test]
    fn find_all_of_kind_matches_nested_nodes() {
        let mut arena = NodeArena::new(8);
        let root = arena.allocate(NodeKind::CompilationUnit, 0, 10);
        let import_a = arena.allocate(NodeKind::ImportDeclaration, 0, 2);
        let import_b = arena.allocate(NodeKind::ImportDeclaration, 2, 3);
        arena.append_child(root, import_a).unwrap();
        arena.append_child(root, import_b).unwrap();

        let found = find_all_of_kind(&arena, root, NodeKind::ImportDeclaration);
        assert_eq!(found, vec![import_a, import_b]);
    }
}
