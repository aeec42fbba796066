use crate::node::Node;
use crate::pos::BlockPos;

/// Position-keyed access to the nodes currently placed in a grid.
///
/// Implemented by whatever owns the blocks. Lookups must reflect the grid as
/// it is at call time: the engine visits the same positions several times
/// within one operation and relies on seeing its own writes.
pub trait RotationAccess {
    fn node(&self, pos: BlockPos) -> Option<&dyn Node>;

    fn node_mut(&mut self, pos: BlockPos) -> Option<&mut dyn Node>;

    fn contains(&self, pos: BlockPos) -> bool {
        self.node(pos).is_some()
    }
}
