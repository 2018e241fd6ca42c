//! Struct-of-arrays node storage with typed attribute side-tables (spec §3,
//! §4.1).
//!
//! A [`NodeArena`] owns every node of one parsed file. Nodes are identified
//! by [`NodeIndex`], an opaque index rather than a pointer: this avoids
//! pointer-chasing, keeps node records cache-friendly, permits lock-free
//! parallel *read* traversal once parsing completes, and makes a dangling
//! reference structurally impossible (an index simply can't outlive the
//! `Vec` it indexes into, and the arena enforces it can't be used after
//! `close()`). Parent back-edges are indices into the same arena, not
//! owning references, so the upward edges introduce no ownership cycles
//! (design note, spec §9).
//!
//! Per-kind data (an import's qualified name, a declared type's name) is
//! not stored on [`NodeRecord`] itself; it lives in typed attribute tables
//! keyed by [`NodeIndex`], enforced via the [`Attribute`] trait so that
//! asking for the wrong attribute type, or asking on the wrong node kind,
//! is a catchable error rather than a silent `None`.

mod attributes;

pub use attributes::ArenaError;

use crate::ast::{Attribute, NodeKind, Trivia};
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// An opaque, non-negative handle to a node in one [`NodeArena`].
///
/// Stable for the lifetime of the arena: growth never invalidates a
/// previously issued index (spec §4.1, testable property §8.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    fn raw(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct NodeRecord {
    kind: NodeKind,
    start_offset: usize,
    end_offset: usize,
    first_child: Option<NodeIndex>,
    next_sibling: Option<NodeIndex>,
    parent: Option<NodeIndex>,
    trivia: Option<Trivia>,
}

/// Owned, scoped storage for one file's AST.
///
/// Single-owner, not `Sync` for mutation: parsing builds the arena on one
/// thread, after which it is treated as immutable and may be read (not
/// mutated) from other threads without synchronization, per spec §5.
pub struct NodeArena {
    nodes: Vec<NodeRecord>,
    last_child: Vec<Option<NodeIndex>>,
    capacity: usize,
    attribute_tables: HashMap<TypeId, Box<dyn Any>>,
    closed: bool,
}

/// Default initial capacity when none is specified, per spec §3.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

impl NodeArena {
    /// Creates an arena with the given initial node capacity. Capacity
    /// doubles on exhaustion; previously issued [`NodeIndex`] values
    /// remain valid across growth.
    pub fn new(initial_capacity: usize) -> Self {
        let initial_capacity = initial_capacity.max(1);
        Self {
            nodes: Vec::with_capacity(initial_capacity),
            last_child: Vec::with_capacity(initial_capacity),
            capacity: initial_capacity,
            attribute_tables: HashMap::new(),
            closed: false,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_INITIAL_CAPACITY)
    }

    fn grow_if_needed(&mut self) {
        if self.nodes.len() == self.capacity {
            self.capacity *= 2;
            let additional = self.capacity - self.nodes.len();
            self.nodes.reserve(additional);
            self.last_child.reserve(additional);
        }
    }

    /// Appends a new node and returns its index. O(1) amortized; grows
    /// internal storage on capacity exhaustion.
    ///
    /// # Panics
    ///
    /// Panics if the arena has been [`close`](Self::close)d.
    pub fn allocate(&mut self, kind: NodeKind, start_offset: usize, end_offset: usize) -> NodeIndex {
        assert!(!self.closed, "cannot allocate on a closed arena");
        self.grow_if_needed();
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(NodeRecord {
            kind,
            start_offset,
            end_offset,
            first_child: None,
            next_sibling: None,
            parent: None,
            trivia: None,
        });
        self.last_child.push(None);
        index
    }

    /// Like [`allocate`](Self::allocate), additionally attaching `attribute`
    /// under the returned index. Fails if `attribute`'s type is not valid
    /// on `kind` (spec §4.1).
    pub fn allocate_with_attribute<T: Attribute>(
        &mut self,
        kind: NodeKind,
        start_offset: usize,
        end_offset: usize,
        attribute: T,
    ) -> Result<NodeIndex, ArenaError> {
        if !T::allowed_kinds().contains(&kind) {
            return Err(ArenaError::InvalidArgument {
                reason: format!(
                    "attribute type is not valid on node kind {kind:?}; allowed kinds: {:?}",
                    T::allowed_kinds()
                ),
            });
        }
        let index = self.allocate(kind, start_offset, end_offset);
        self.attach_attribute(index, attribute)
            .expect("kind already validated above");
        Ok(index)
    }

    /// Attaches `attribute` to an already-allocated node.
    pub fn attach_attribute<T: Attribute>(
        &mut self,
        index: NodeIndex,
        attribute: T,
    ) -> Result<(), ArenaError> {
        let kind = self.kind(index).ok_or_else(|| ArenaError::InvalidArgument {
            reason: format!("node index {index} is out of range"),
        })?;
        if !T::allowed_kinds().contains(&kind) {
            return Err(ArenaError::InvalidArgument {
                reason: format!(
                    "attribute type is not valid on node kind {kind:?}; allowed kinds: {:?}",
                    T::allowed_kinds()
                ),
            });
        }
        let table = self
            .attribute_tables
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(HashMap::<NodeIndex, T>::new()));
        let table: &mut HashMap<NodeIndex, T> = table
            .downcast_mut()
            .expect("attribute table TypeId always matches its value type");
        table.insert(index, attribute);
        Ok(())
    }

    /// Returns the attribute of type `T` attached to `index`.
    ///
    /// Fails with [`ArenaError::InvalidArgument`] when `index` is out of
    /// range, when `T` is not valid on `index`'s node kind, or when no `T`
    /// was attached (spec §4.1, testable property §8.2).
    pub fn get_attribute<T: Attribute>(&self, index: NodeIndex) -> Result<&T, ArenaError> {
        let kind = self.kind(index).ok_or_else(|| ArenaError::InvalidArgument {
            reason: format!("node index {index} is out of range"),
        })?;
        if !T::allowed_kinds().contains(&kind) {
            return Err(ArenaError::InvalidArgument {
                reason: format!(
                    "attribute type is not valid on node kind {kind:?}; allowed kinds: {:?}",
                    T::allowed_kinds()
                ),
            });
        }
        self.attribute_tables
            .get(&TypeId::of::<T>())
            .and_then(|table| table.downcast_ref::<HashMap<NodeIndex, T>>())
            .and_then(|table| table.get(&index))
            .ok_or_else(|| ArenaError::InvalidArgument {
                reason: format!("no attribute of the requested type attached to {index}"),
            })
    }

    /// Appends `child` to `parent`'s child list and sets `child`'s parent
    /// pointer. O(1).
    pub fn append_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), ArenaError> {
        self.check_index(parent)?;
        self.check_index(child)?;
        self.nodes[child.raw()].parent = Some(parent);
        match self.last_child[parent.raw()] {
            Some(last) => {
                self.nodes[last.raw()].next_sibling = Some(child);
            }
            None => {
                self.nodes[parent.raw()].first_child = Some(child);
            }
        }
        self.last_child[parent.raw()] = Some(child);
        Ok(())
    }

    pub fn set_trivia(&mut self, index: NodeIndex, trivia: Trivia) -> Result<(), ArenaError> {
        self.check_index(index)?;
        self.nodes[index.raw()].trivia = Some(trivia);
        Ok(())
    }

    pub fn trivia(&self, index: NodeIndex) -> Option<&Trivia> {
        self.nodes.get(index.raw())?.trivia.as_ref()
    }

    pub fn kind(&self, index: NodeIndex) -> Option<NodeKind> {
        self.nodes.get(index.raw()).map(|n| n.kind)
    }

    pub fn start(&self, index: NodeIndex) -> Option<usize> {
        self.nodes.get(index.raw()).map(|n| n.start_offset)
    }

    pub fn end(&self, index: NodeIndex) -> Option<usize> {
        self.nodes.get(index.raw()).map(|n| n.end_offset)
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.nodes.get(index.raw())?.parent
    }

    /// Children of `index` in declaration order.
    pub fn children(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let first = self.nodes.get(index.raw()).and_then(|n| n.first_child);
        ChildIter {
            arena: self,
            next: first,
        }
    }

    /// The root node, by construction convention the first node allocated.
    pub fn root(&self) -> Option<NodeIndex> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeIndex(0))
        }
    }

    /// Iterates every allocated node in allocation order (not tree order).
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, NodeKind)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeIndex(i), n.kind))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases all nodes and attributes. Idempotent: closing an
    /// already-closed arena is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.nodes.clear();
        self.last_child.clear();
        self.attribute_tables.clear();
        self.closed = true;
    }

    fn check_index(&self, index: NodeIndex) -> Result<(), ArenaError> {
        if index.raw() < self.nodes.len() {
            Ok(())
        } else {
            Err(ArenaError::InvalidArgument {
                reason: format!("node index {index} is out of range"),
            })
        }
    }
}

impl Drop for NodeArena {
    fn drop(&mut self) {
        self.close();
    }
}

struct ChildIter<'a> {
    arena: &'a NodeArena,
    next: Option<NodeIndex>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.arena.nodes[current.raw()].next_sibling;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ImportAttribute, PackageAttribute};

    #[test]
    fn indices_remain_valid_across_growth() {
        let mut arena = NodeArena::new(2);
        let first = arena.allocate(NodeKind::Identifier, 0, 1);
        for i in 0..50 {
            arena.allocate(NodeKind::Identifier, i, i + 1);
        }
        assert_eq!(arena.kind(first), Some(NodeKind::Identifier));
        assert_eq!(arena.start(first), Some(0));
        assert_eq!(arena.end(first), Some(1));
    }

    #[test]
    fn capacity_doubles_on_exhaustion() {
        let mut arena = NodeArena::new(2);
        assert_eq!(arena.capacity(), 2);
        arena.allocate(NodeKind::Identifier, 0, 1);
        arena.allocate(NodeKind::Identifier, 1, 2);
        assert_eq!(arena.capacity(), 2);
        arena.allocate(NodeKind::Identifier, 2, 3);
        assert_eq!(arena.capacity(), 4);
    }

    #[test]
    fn attribute_type_mismatch_is_rejected() {
        let mut arena = NodeArena::new(8);
        let idx = arena.allocate(NodeKind::IntegerLiteral, 0, 1);
        let err = arena
            .attach_attribute(idx, ImportAttribute {
                qualified_name: "a.b.C".into(),
                is_wildcard: false,
                is_static: false,
            })
            .unwrap_err();
        assert!(matches!(err, ArenaError::InvalidArgument { .. }));
    }

    #[test]
    fn attribute_roundtrips_on_matching_kind() {
        let mut arena = NodeArena::new(8);
        let idx = arena
            .allocate_with_attribute(
                NodeKind::ImportDeclaration,
                0,
                10,
                ImportAttribute {
                    qualified_name: "java.util.List".into(),
                    is_wildcard: false,
                    is_static: false,
                },
            )
            .unwrap();
        let attr = arena.get_attribute::<ImportAttribute>(idx).unwrap();
        assert_eq!(attr.qualified_name, "java.util.List");
    }

    #[test]
    fn missing_attribute_is_invalid_argument() {
        let mut arena = NodeArena::new(8);
        let idx = arena.allocate(NodeKind::PackageDeclaration, 0, 10);
        let err = arena.get_attribute::<PackageAttribute>(idx).unwrap_err();
        assert!(matches!(err, ArenaError::InvalidArgument { .. }));
    }

    #[test]
    fn out_of_range_index_is_invalid_argument() {
        let arena = NodeArena::new(8);
        let bogus = NodeIndex(42);
        assert!(matches!(
            arena.get_attribute::<PackageAttribute>(bogus),
            Err(ArenaError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn children_are_ordered() {
        let mut arena = NodeArena::new(8);
        let root = arena.allocate(NodeKind::CompilationUnit, 0, 100);
        let a = arena.allocate(NodeKind::ImportDeclaration, 0, 5);
        let b = arena.allocate(NodeKind::ImportDeclaration, 5, 10);
        let c = arena.allocate(NodeKind::TypeDeclaration, 10, 100);
        arena.append_child(root, a).unwrap();
        arena.append_child(root, b).unwrap();
        arena.append_child(root, c).unwrap();

        let children: Vec<_> = arena.children(root).collect();
        assert_eq!(children, vec![a, b, c]);
        assert_eq!(arena.parent(a), Some(root));
    }

    #[test]
    fn close_is_idempotent() {
        let mut arena = NodeArena::new(8);
        arena.allocate(NodeKind::Identifier, 0, 1);
        arena.close();
        arena.close();
        assert!(arena.is_closed());
        assert_eq!(arena.len(), 0);
    }
}
