//! Property test for arena index stability across growth (testable
//! property in spec.md §8.1: a [`NodeIndex`] issued before the arena
//! grows its backing storage stays valid and points at the same node
//! afterward).

use curlyfmt::arena::NodeArena;
use curlyfmt::ast::NodeKind;
use proptest::prelude::*;

proptest! {
    #[test]
    fn indices_remain_valid_across_growth(count in 1usize..500) {
        let mut arena = NodeArena::new(1);
        let mut indices = Vec::with_capacity(count);
        for i in 0..count {
            let index = arena.allocate(NodeKind::Statement, i, i + 1);
            indices.push(index);
        }
        for (i, index) in indices.iter().enumerate() {
            prop_assert_eq!(arena.kind(*index), Some(NodeKind::Statement));
            prop_assert_eq!(arena.start(*index), Some(i));
            prop_assert_eq!(arena.end(*index), Some(i + 1));
        }
    }

    #[test]
    fn children_are_returned_in_append_order(count in 1usize..50) {
        let mut arena = NodeArena::new(4);
        let parent = arena.allocate(NodeKind::Block, 0, 0);
        let mut children = Vec::with_capacity(count);
        for i in 0..count {
            let child = arena.allocate(NodeKind::Statement, i, i + 1);
            arena.append_child(parent, child).unwrap();
            children.push(child);
        }
        let collected: Vec<_> = arena.children(parent).collect();
        prop_assert_eq!(collected, children);
    }
}
