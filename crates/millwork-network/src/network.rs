//! A single rotation network: one source plus every node it drives.

use std::collections::{BTreeSet, VecDeque};

use millwork_core::{BlockPos, Direction, NetworkId, Rotation, RotationAccess};
use tracing::trace;

/// One source and the nodes connected to it, forming a directed tree.
///
/// Every member receives its rotation from exactly one neighbor (its
/// `source` direction), and following those directions from any member
/// leads back to `source` without revisiting a node.
///
/// The network stores positions only; the nodes themselves live in the grid
/// and are resolved through a [`RotationAccess`] on every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationNetwork {
    id: NetworkId,
    source: BlockPos,
    /// Every node except the source.
    members: BTreeSet<BlockPos>,
}

impl RotationNetwork {
    pub fn new(id: NetworkId, source: BlockPos) -> Self {
        Self {
            id,
            source,
            members: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn source(&self) -> BlockPos {
        self.source
    }

    pub fn is_source(&self, pos: BlockPos) -> bool {
        self.source == pos
    }

    /// Member positions in ascending order. Excludes the source.
    pub fn members(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.members.iter().copied()
    }

    /// Whether `pos` is the source or a member.
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.is_source(pos) || self.members.contains(&pos)
    }

    /// Number of nodes, source included.
    pub fn node_count(&self) -> usize {
        self.members.len() + 1
    }

    /// Try to attach a node that was just introduced to the grid.
    ///
    /// Looks one hop out from `pos` for a node of this network that connects
    /// back and does not itself receive rotation from that side. The first
    /// such direction wins. Returns `false` if there is none.
    ///
    /// If the node already belongs to a network, returns `true` without
    /// touching anything: the caller reads that as a second claim on the
    /// node. No outward search happens here, so the caller can ask every
    /// network before committing to one.
    pub fn update_on_add<A: RotationAccess + ?Sized>(&mut self, access: &mut A, pos: BlockPos) -> bool {
        let Some(node) = access.node(pos) else {
            return false;
        };
        let already_claimed = node.is_connected();

        let Some((direction, rotation)) = self.find_upstream(&*access, pos) else {
            return false;
        };
        if already_claimed {
            return true;
        }

        self.members.insert(pos);
        if let Some(node) = access.node_mut(pos) {
            node.update(self.id, Some(direction), rotation);
        }
        trace!(network = %self.id, %pos, %direction, "attached node");
        true
    }

    /// Breadth-first search out from `added`, pulling in every disconnected
    /// node that is now reachable through it. Never takes a node that already
    /// belongs to a network. Returns the absorbed positions in visit order.
    pub fn update_after_add<A: RotationAccess + ?Sized>(
        &mut self,
        access: &mut A,
        added: BlockPos,
    ) -> Vec<BlockPos> {
        debug_assert_eq!(
            access.node(added).and_then(|n| n.network()),
            Some(self.id),
            "search must start from a node of this network"
        );

        let mut absorbed = Vec::new();
        let mut queue = VecDeque::from([added]);

        while let Some(current) = queue.pop_front() {
            let Some(edges) = exits(&*access, current, true) else {
                continue;
            };

            for (direction, rotation) in edges {
                let next_pos = current.offset(direction);
                let inverse = direction.opposite();
                let Some(next) = access.node_mut(next_pos) else {
                    continue;
                };
                if next.is_connected() || !next.connections().contains(inverse) {
                    continue;
                }

                next.update(self.id, Some(inverse), rotation);
                self.members.insert(next_pos);
                absorbed.push(next_pos);
                queue.push_back(next_pos);
                trace!(network = %self.id, pos = %next_pos, "absorbed node");
            }
        }
        absorbed
    }

    /// Drop `pos` from the member set. The node's own state is left alone.
    pub fn remove_node(&mut self, pos: BlockPos) {
        let removed = self.members.remove(&pos);
        debug_assert!(removed, "{pos} is not a member of network {}", self.id);
    }

    /// Re-walk the tree from the source after a member changed or left.
    ///
    /// Every member still reachable gets its source direction and rotation
    /// rewritten from the walk. Members that were not reached are detached
    /// and dropped; their positions are returned.
    pub fn update_network<A: RotationAccess + ?Sized>(&mut self, access: &mut A) -> Vec<BlockPos> {
        // Shrinks as members are reached; what is left at the end is stale.
        let mut unvisited = self.members.clone();
        let mut queue = VecDeque::from([self.source]);

        while let Some(current) = queue.pop_front() {
            let Some(edges) = exits(&*access, current, false) else {
                continue;
            };

            for (direction, rotation) in edges {
                let next_pos = current.offset(direction);
                if !unvisited.contains(&next_pos) {
                    continue;
                }
                let inverse = direction.opposite();
                let Some(next) = access.node_mut(next_pos) else {
                    continue;
                };
                if !next.connections().contains(inverse) {
                    continue;
                }

                next.update(self.id, Some(inverse), rotation);
                unvisited.remove(&next_pos);
                queue.push_back(next_pos);
            }
        }

        let mut evicted = Vec::with_capacity(unvisited.len());
        for pos in unvisited {
            if let Some(node) = access.node_mut(pos) {
                node.remove();
            }
            self.members.remove(&pos);
            evicted.push(pos);
            trace!(network = %self.id, %pos, "evicted unreachable node");
        }
        evicted
    }

    /// Detach every member, used when the source goes away. The source node
    /// itself is left for the caller. Returns the detached positions.
    pub fn remove_network<A: RotationAccess + ?Sized>(&mut self, access: &mut A) -> Vec<BlockPos> {
        let detached: Vec<BlockPos> = std::mem::take(&mut self.members).into_iter().collect();
        for &pos in &detached {
            if let Some(node) = access.node_mut(pos) {
                node.remove();
            }
        }
        detached
    }

    /// Multi-line dump: a header, the source, then members by position.
    pub fn describe<A: RotationAccess + ?Sized>(&self, access: &A) -> String {
        let mut out = format!("[network={}]\n", self.id);
        for pos in std::iter::once(self.source).chain(self.members()) {
            match access.node(pos) {
                Some(node) => out.push_str(&node.state().to_string()),
                None => out.push_str(&format!("Missing[pos={pos}]")),
            }
            out.push('\n');
        }
        out
    }

    /// A neighbor of `pos` inside this network that can drive it: the first
    /// direction whose node connects back and is not fed from `pos`'s side.
    fn find_upstream<A: RotationAccess + ?Sized>(
        &self,
        access: &A,
        pos: BlockPos,
    ) -> Option<(Direction, Option<Rotation>)> {
        let connections = access.node(pos)?.connections();
        for direction in connections.iter() {
            let adjacent_pos = pos.offset(direction);
            if !self.contains(adjacent_pos) {
                continue;
            }
            let Some(adjacent) = access.node(adjacent_pos) else {
                continue;
            };
            let inverse = direction.opposite();
            if adjacent.connections().contains(inverse) && adjacent.source() != Some(inverse) {
                return Some((direction, adjacent.rotation(inverse)));
            }
        }
        None
    }
}

/// Each connection of the node at `pos` paired with the rotation it emits
/// there. With `skip_source`, the direction it is fed from is left out.
fn exits<A: RotationAccess + ?Sized>(
    access: &A,
    pos: BlockPos,
    skip_source: bool,
) -> Option<Vec<(Direction, Option<Rotation>)>> {
    let node = access.node(pos)?;
    let fed_from = if skip_source { node.source() } else { None };
    Some(
        node.connections()
            .iter()
            .filter(|d| Some(*d) != fed_from)
            .map(|d| (d, node.rotation(d)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use millwork_core::Direction::*;
    use millwork_core::Node;
    use millwork_core::test_utils::*;

    /// A grid with a source at the origin connecting east, registered as
    /// network 0.
    fn source_grid() -> (TestGrid, RotationNetwork) {
        let mut grid = TestGrid::new();
        let mut source = TestNode::source(pos(0, 0, 0), dirs(&[East]));
        source.update(NetworkId(0), None, None);
        grid.insert(source);
        (grid, RotationNetwork::new(NetworkId(0), pos(0, 0, 0)))
    }

    fn network_of(grid: &TestGrid, p: BlockPos) -> Option<NetworkId> {
        grid.get(p).and_then(|n| n.network())
    }

    #[test]
    fn update_on_add_attaches_adjacent_node() {
        let (mut grid, mut network) = source_grid();
        grid.insert(TestNode::relay(pos(1, 0, 0), dirs(&[West, East])));

        assert!(network.update_on_add(&mut grid, pos(1, 0, 0)));
        let node = grid.get(pos(1, 0, 0)).unwrap();
        assert_eq!(node.network(), Some(NetworkId(0)));
        assert_eq!(node.source(), Some(West));
        assert_eq!(node.source_rotation(), Some(Rotation::new(East, fixed(1.0))));
        assert!(network.contains(pos(1, 0, 0)));
    }

    #[test]
    fn update_on_add_ignores_nodes_facing_away() {
        let (mut grid, mut network) = source_grid();
        grid.insert(TestNode::relay(pos(1, 0, 0), dirs(&[North, South])));

        assert!(!network.update_on_add(&mut grid, pos(1, 0, 0)));
        assert_eq!(network_of(&grid, pos(1, 0, 0)), None);
        assert_eq!(network.node_count(), 1);
    }

    #[test]
    fn update_on_add_does_no_outward_search() {
        let (mut grid, mut network) = source_grid();
        grid.insert(TestNode::relay(pos(2, 0, 0), dirs(&[West, East])));
        grid.insert(TestNode::relay(pos(1, 0, 0), dirs(&[West, East])));

        assert!(network.update_on_add(&mut grid, pos(1, 0, 0)));
        assert_eq!(network_of(&grid, pos(2, 0, 0)), None);
    }

    #[test]
    fn update_on_add_reports_already_claimed_without_mutating() {
        let (mut grid, mut network) = source_grid();
        let mut claimed = TestNode::relay(pos(1, 0, 0), dirs(&[West, East]));
        claimed.update(NetworkId(7), Some(East), None);
        grid.insert(claimed.clone());

        assert!(network.update_on_add(&mut grid, pos(1, 0, 0)));
        assert_eq!(grid.get(pos(1, 0, 0)), Some(&claimed));
        assert!(!network.contains(pos(1, 0, 0)));
    }

    #[test]
    fn update_on_add_only_sees_its_own_nodes() {
        let (mut grid, mut network) = source_grid();
        // A shaft that would connect back, but is not part of this network.
        grid.insert(TestNode::relay(pos(2, 0, 0), dirs(&[West, East])));
        grid.insert(TestNode::relay(pos(3, 0, 0), dirs(&[West])));

        assert!(!network.update_on_add(&mut grid, pos(3, 0, 0)));
    }

    #[test]
    fn update_after_add_absorbs_chain_of_disconnected_nodes() {
        let (mut grid, mut network) = source_grid();
        for x in 1..=3 {
            grid.insert(TestNode::relay(pos(x, 0, 0), dirs(&[West, East])));
        }

        let absorbed = network.update_after_add(&mut grid, pos(0, 0, 0));
        assert_eq!(absorbed, vec![pos(1, 0, 0), pos(2, 0, 0), pos(3, 0, 0)]);
        for x in 1..=3 {
            let node = grid.get(pos(x, 0, 0)).unwrap();
            assert_eq!(node.network(), Some(NetworkId(0)));
            assert_eq!(node.source(), Some(West));
        }
    }

    #[test]
    fn update_after_add_never_steals_from_other_networks() {
        let (mut grid, mut network) = source_grid();
        let mut foreign = TestNode::relay(pos(1, 0, 0), dirs(&[West, East]));
        foreign.update(NetworkId(9), Some(East), None);
        grid.insert(foreign);

        let absorbed = network.update_after_add(&mut grid, pos(0, 0, 0));
        assert!(absorbed.is_empty());
        assert_eq!(network_of(&grid, pos(1, 0, 0)), Some(NetworkId(9)));
    }

    #[test]
    fn update_after_add_does_not_search_back_through_source_direction() {
        let (mut grid, mut network) = source_grid();
        grid.insert(TestNode::relay(pos(1, 0, 0), dirs(&[West, East])));
        assert!(network.update_on_add(&mut grid, pos(1, 0, 0)));

        // Searching from the member must not try to re-enter the source side.
        let absorbed = network.update_after_add(&mut grid, pos(1, 0, 0));
        assert!(absorbed.is_empty());
        assert_eq!(grid.get(pos(1, 0, 0)).unwrap().source(), Some(West));
    }

    #[test]
    fn update_network_evicts_unreachable_descendants() {
        let (mut grid, mut network) = source_grid();
        for x in 1..=3 {
            grid.insert(TestNode::relay(pos(x, 0, 0), dirs(&[West, East])));
        }
        network.update_after_add(&mut grid, pos(0, 0, 0));

        // Take the middle node out of both the grid and the network.
        grid.take(pos(2, 0, 0));
        network.remove_node(pos(2, 0, 0));
        let evicted = network.update_network(&mut grid);

        assert_eq!(evicted, vec![pos(3, 0, 0)]);
        assert_eq!(network_of(&grid, pos(1, 0, 0)), Some(NetworkId(0)));
        assert_eq!(network_of(&grid, pos(3, 0, 0)), None);
        assert_eq!(grid.get(pos(3, 0, 0)).unwrap().source_rotation(), None);
    }

    #[test]
    fn update_network_repropagates_rotation() {
        let mut grid = TestGrid::new();
        let mut source = TestNode::driven(pos(0, 0, 0), dirs(&[East]), fixed(2.0));
        source.update(NetworkId(0), None, None);
        grid.insert(source);
        grid.insert(TestNode::relay(pos(1, 0, 0), dirs(&[West, East])));
        let mut network = RotationNetwork::new(NetworkId(0), pos(0, 0, 0));
        network.update_after_add(&mut grid, pos(0, 0, 0));

        // Swap the source for a faster one in place and revalidate.
        let mut faster = TestNode::driven(pos(0, 0, 0), dirs(&[East]), fixed(5.0));
        faster.update(NetworkId(0), None, None);
        grid.insert(faster);
        assert!(network.update_network(&mut grid).is_empty());

        let relay = grid.get(pos(1, 0, 0)).unwrap();
        assert_eq!(relay.source_rotation(), Some(Rotation::new(East, fixed(5.0))));
    }

    #[test]
    fn remove_network_detaches_members_but_not_source() {
        let (mut grid, mut network) = source_grid();
        grid.insert(TestNode::relay(pos(1, 0, 0), dirs(&[West, East])));
        network.update_after_add(&mut grid, pos(0, 0, 0));

        let detached = network.remove_network(&mut grid);
        assert_eq!(detached, vec![pos(1, 0, 0)]);
        assert_eq!(network_of(&grid, pos(1, 0, 0)), None);
        assert_eq!(network_of(&grid, pos(0, 0, 0)), Some(NetworkId(0)));
        assert_eq!(network.node_count(), 1);
    }

    #[test]
    fn describe_lists_source_then_members() {
        let (mut grid, mut network) = source_grid();
        grid.insert(TestNode::relay(pos(1, 0, 0), dirs(&[West])));
        network.update_after_add(&mut grid, pos(0, 0, 0));

        assert_eq!(
            network.describe(&grid),
            "[network=0]\n\
             Node[pos=[0, 0, 0], connections=[east], network=0, source=none]\n\
             Node[pos=[1, 0, 0], connections=[west], network=0, source=west, rotation=Rotation[axis=east, speed=1]]\n"
        );
    }
}
