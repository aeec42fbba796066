//! Block storage: an arena of nodes with a position index.

use std::collections::BTreeMap;

use millwork_core::{BlockPos, Node, RotationAccess};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Identifies a placed block. Stale after the block is taken.
    pub struct BlockId;
}

/// How a block was placed, which decides how it is registered with the
/// network manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Drives a network of its own.
    Source,
    /// Carries rotation from a source.
    Relay,
}

/// Errors from grid operations.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("position {0} is already occupied")]
    Occupied(BlockPos),
    #[error("no block at {0}")]
    Vacant(BlockPos),
}

#[derive(Debug)]
struct Block {
    node: Box<dyn Node>,
    role: Role,
    seq: u64,
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Owner of every placed node.
///
/// - `blocks`: arena of boxed nodes
/// - `index`: position -> block
/// - `order`: placement sequence -> block, for replay in placement order
#[derive(Debug, Default)]
pub struct Grid {
    blocks: SlotMap<BlockId, Block>,
    index: BTreeMap<BlockPos, BlockId>,
    order: BTreeMap<u64, BlockId>,
    next_seq: u64,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a node at its own position.
    pub fn insert(&mut self, node: Box<dyn Node>, role: Role) -> Result<BlockId, GridError> {
        let pos = node.pos();
        if self.index.contains_key(&pos) {
            return Err(GridError::Occupied(pos));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let id = self.blocks.insert(Block { node, role, seq });
        self.index.insert(pos, id);
        self.order.insert(seq, id);
        Ok(id)
    }

    /// Remove the node at `pos` and hand it back.
    pub fn take(&mut self, pos: BlockPos) -> Result<Box<dyn Node>, GridError> {
        let id = self.index.remove(&pos).ok_or(GridError::Vacant(pos))?;
        let block = self.blocks.remove(id).ok_or(GridError::Vacant(pos))?;
        self.order.remove(&block.seq);
        Ok(block.node)
    }

    pub fn get(&self, pos: BlockPos) -> Option<&dyn Node> {
        let id = self.index.get(&pos)?;
        Some(self.blocks.get(*id)?.node.as_ref())
    }

    pub fn get_mut(&mut self, pos: BlockPos) -> Option<&mut dyn Node> {
        let id = *self.index.get(&pos)?;
        let block = self.blocks.get_mut(id)?;
        Some(block.node.as_mut())
    }

    pub fn role(&self, pos: BlockPos) -> Option<Role> {
        let id = self.index.get(&pos)?;
        Some(self.blocks.get(*id)?.role)
    }

    pub fn id_at(&self, pos: BlockPos) -> Option<BlockId> {
        self.index.get(&pos).copied()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.index.contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Nodes with their roles, oldest placement first.
    pub fn iter(&self) -> impl Iterator<Item = (&dyn Node, Role)> + '_ {
        self.order.values().filter_map(|id| {
            let block = self.blocks.get(*id)?;
            let node: &dyn Node = block.node.as_ref();
            Some((node, block.role))
        })
    }

    /// Occupied positions in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.index.keys().copied()
    }
}

impl RotationAccess for Grid {
    fn node(&self, pos: BlockPos) -> Option<&dyn Node> {
        self.get(pos)
    }

    fn node_mut(&mut self, pos: BlockPos) -> Option<&mut dyn Node> {
        self.get_mut(pos)
    }

    fn contains(&self, pos: BlockPos) -> bool {
        Grid::contains(self, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millwork_core::Direction::*;
    use millwork_core::test_utils::*;

    fn relay(x: i32) -> Box<dyn Node> {
        Box::new(TestNode::relay(pos(x, 0, 0), dirs(&[West, East])))
    }

    #[test]
    fn insert_and_get() {
        let mut grid = Grid::new();
        grid.insert(relay(1), Role::Relay).unwrap();
        assert!(grid.contains(pos(1, 0, 0)));
        assert_eq!(grid.get(pos(1, 0, 0)).unwrap().pos(), pos(1, 0, 0));
        assert_eq!(grid.role(pos(1, 0, 0)), Some(Role::Relay));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn insert_occupied_fails() {
        let mut grid = Grid::new();
        grid.insert(relay(1), Role::Relay).unwrap();
        let err = grid.insert(relay(1), Role::Source).unwrap_err();
        assert!(matches!(err, GridError::Occupied(p) if p == pos(1, 0, 0)));
        assert_eq!(grid.role(pos(1, 0, 0)), Some(Role::Relay));
    }

    #[test]
    fn take_returns_node_and_frees_position() {
        let mut grid = Grid::new();
        let id = grid.insert(relay(1), Role::Relay).unwrap();
        let node = grid.take(pos(1, 0, 0)).unwrap();
        assert_eq!(node.pos(), pos(1, 0, 0));
        assert!(grid.is_empty());
        assert!(grid.id_at(pos(1, 0, 0)).is_none());
        assert!(matches!(grid.take(pos(1, 0, 0)), Err(GridError::Vacant(_))));

        // Reinsertion gets a fresh id.
        let again = grid.insert(relay(1), Role::Relay).unwrap();
        assert_ne!(id, again);
    }

    #[test]
    fn iter_follows_placement_order_not_position() {
        let mut grid = Grid::new();
        grid.insert(relay(3), Role::Relay).unwrap();
        grid.insert(relay(1), Role::Source).unwrap();
        grid.insert(relay(2), Role::Relay).unwrap();
        grid.take(pos(3, 0, 0)).unwrap();
        grid.insert(relay(3), Role::Relay).unwrap();

        let order: Vec<_> = grid.iter().map(|(n, role)| (n.pos().x, role)).collect();
        assert_eq!(order, vec![(1, Role::Source), (2, Role::Relay), (3, Role::Relay)]);
        let positions: Vec<_> = grid.positions().map(|p| p.x).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn access_mutates_in_place() {
        let mut grid = Grid::new();
        grid.insert(relay(1), Role::Relay).unwrap();
        let node = grid.node_mut(pos(1, 0, 0)).unwrap();
        node.update(millwork_core::NetworkId(3), Some(West), None);
        assert_eq!(
            grid.node(pos(1, 0, 0)).unwrap().network(),
            Some(millwork_core::NetworkId(3))
        );
        assert!(RotationAccess::contains(&grid, pos(1, 0, 0)));
        assert!(grid.node(pos(2, 0, 0)).is_none());
    }
}
