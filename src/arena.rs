//! Slab arena for tree nodes with compact typed handles.

use std::ops::{Index, IndexMut};

/// A compact 32-bit handle into the node arena.
///
/// Using u32 limits the tree to ~4 billion nodes, which is plenty for a
/// file tree. u32::MAX is reserved as the `OptionNodeId` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new NodeId from a usize.
    ///
    /// # Panics
    /// Panics if `index >= u32::MAX` (reserved for the None sentinel).
    #[inline]
    pub fn new(index: usize) -> Self {
        assert!(
            index < u32::MAX as usize,
            "node id must be less than u32::MAX"
        );
        Self(index as u32)
    }

    /// Returns the handle as a usize.
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// An optional node handle using u32::MAX as the None sentinel.
///
/// Fits in 4 bytes where `Option<NodeId>` would take 8; every node carries
/// three of these (parent, compacted child, wrapper).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct OptionNodeId(u32);

impl OptionNodeId {
    /// Creates a None value.
    #[inline]
    pub fn none() -> Self {
        Self(u32::MAX)
    }

    /// Creates a Some value from a NodeId.
    #[inline]
    pub fn some(id: NodeId) -> Self {
        Self(id.0)
    }

    /// Creates from an Option<NodeId>.
    #[inline]
    pub fn from_option(id: Option<NodeId>) -> Self {
        id.map_or(Self::none(), Self::some)
    }

    /// Converts to an Option<NodeId>.
    #[inline]
    pub fn to_option(self) -> Option<NodeId> {
        if self.0 == u32::MAX {
            None
        } else {
            Some(NodeId(self.0))
        }
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for OptionNodeId {
    fn default() -> Self {
        Self::none()
    }
}

impl From<NodeId> for OptionNodeId {
    fn from(id: NodeId) -> Self {
        Self::some(id)
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Internal entry representation for arena slots.
#[derive(Debug)]
enum Entry<T> {
    /// Slot is free; stores the index of the next free slot in the freelist.
    Vacant(usize),
    /// Slot is occupied by a value.
    Occupied(T),
}

/// A Vec-backed slab with freelist slot reuse and `NodeId` handles.
///
/// Removed slots are recycled, so a long-lived tree that churns through
/// inserts and removals does not grow without bound. Handles are not
/// generation-checked; the tree layer never retains a handle across the
/// removal of its node.
#[derive(Debug)]
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    len: usize,
    next_free: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            len: 0,
            next_free: 0,
        }
    }

    /// Inserts a value, returning its handle.
    pub fn insert(&mut self, value: T) -> NodeId {
        self.len += 1;
        if self.next_free == self.entries.len() {
            let id = NodeId::new(self.entries.len());
            self.entries.push(Entry::Occupied(value));
            self.next_free = self.entries.len();
            id
        } else {
            let slot = self.next_free;
            match self.entries[slot] {
                Entry::Vacant(next) => {
                    self.next_free = next;
                    self.entries[slot] = Entry::Occupied(value);
                    NodeId::new(slot)
                }
                Entry::Occupied(_) => unreachable!("freelist points at occupied slot"),
            }
        }
    }

    /// Gets a reference to the value at `id`.
    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.entries.get(id.get()) {
            Some(Entry::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Gets a mutable reference to the value at `id`.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.entries.get_mut(id.get()) {
            Some(Entry::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Removes the value at `id`, returning it if present.
    pub fn try_remove(&mut self, id: NodeId) -> Option<T> {
        let slot = id.get();
        match self.entries.get_mut(slot) {
            Some(entry @ Entry::Occupied(_)) => {
                let old = std::mem::replace(entry, Entry::Vacant(self.next_free));
                self.next_free = slot;
                self.len -= 1;
                match old {
                    Entry::Occupied(value) => Some(value),
                    Entry::Vacant(_) => unreachable!(),
                }
            }
            _ => None,
        }
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns an iterator over occupied entries.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| match entry {
                Entry::Occupied(value) => Some((NodeId::new(idx), value)),
                Entry::Vacant(_) => None,
            })
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &Self::Output {
        self.get(id).expect("node id points at vacant arena slot")
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        self.get_mut(id)
            .expect("node id points at vacant arena slot")
    }
}
