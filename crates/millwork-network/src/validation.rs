//! Consistency checks between the manager's bookkeeping and node state.
//!
//! Nothing here mutates. Callers decide what to do with a violation; the
//! world logs them when invariant checking is configured.

use std::collections::BTreeSet;

use millwork_core::{BlockPos, Direction, NetworkId, RotationAccess};

use crate::manager::RotationNetworkManager;
use crate::network::RotationNetwork;

// ---------------------------------------------------------------------------
// Violation types
// ---------------------------------------------------------------------------

/// A broken tree invariant, found by [`validate`] or [`validate_membership`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("network {network}: no node at {pos}")]
    MissingNode { network: NetworkId, pos: BlockPos },
    #[error("network {network}: node at {pos} reports network {found:?}")]
    WrongNetwork {
        network: NetworkId,
        pos: BlockPos,
        found: Option<NetworkId>,
    },
    #[error("network {network}: source at {pos} is fed from {direction}")]
    SourceHasParent {
        network: NetworkId,
        pos: BlockPos,
        direction: Direction,
    },
    #[error("network {network}: member {pos} has no source direction")]
    MissingParent { network: NetworkId, pos: BlockPos },
    #[error("network {network}: member {pos} is fed from {direction}, which it does not connect to")]
    ParentNotConnected {
        network: NetworkId,
        pos: BlockPos,
        direction: Direction,
    },
    #[error("network {network}: member {pos} is fed from {parent}, which is outside the network")]
    ParentOutside {
        network: NetworkId,
        pos: BlockPos,
        parent: BlockPos,
    },
    #[error("network {network}: member {pos} is fed from {parent}, which does not connect back")]
    BrokenEdge {
        network: NetworkId,
        pos: BlockPos,
        parent: BlockPos,
    },
    #[error("network {network}: source directions from {pos} loop without reaching the source")]
    Cycle { network: NetworkId, pos: BlockPos },
    #[error("node at {pos} claims network {network}, which does not contain it")]
    Orphan { network: NetworkId, pos: BlockPos },
}

// ---------------------------------------------------------------------------
// Tree checks
// ---------------------------------------------------------------------------

/// Check every network the manager holds against the nodes in `access`.
/// Returns an empty list when all trees are consistent.
pub fn validate<A: RotationAccess + ?Sized>(
    manager: &RotationNetworkManager,
    access: &A,
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    for network in manager.networks() {
        validate_network(network, access, &mut violations);
    }
    violations
}

fn validate_network<A: RotationAccess + ?Sized>(
    network: &RotationNetwork,
    access: &A,
    out: &mut Vec<InvariantViolation>,
) {
    let id = network.id();

    let source_pos = network.source();
    match access.node(source_pos) {
        None => out.push(InvariantViolation::MissingNode {
            network: id,
            pos: source_pos,
        }),
        Some(source) => {
            if source.network() != Some(id) {
                out.push(InvariantViolation::WrongNetwork {
                    network: id,
                    pos: source_pos,
                    found: source.network(),
                });
            }
            if let Some(direction) = source.source() {
                out.push(InvariantViolation::SourceHasParent {
                    network: id,
                    pos: source_pos,
                    direction,
                });
            }
        }
    }

    for pos in network.members() {
        let Some(node) = access.node(pos) else {
            out.push(InvariantViolation::MissingNode { network: id, pos });
            continue;
        };
        if node.network() != Some(id) {
            out.push(InvariantViolation::WrongNetwork {
                network: id,
                pos,
                found: node.network(),
            });
            continue;
        }
        let Some(direction) = node.source() else {
            out.push(InvariantViolation::MissingParent { network: id, pos });
            continue;
        };
        if !node.connections().contains(direction) {
            out.push(InvariantViolation::ParentNotConnected {
                network: id,
                pos,
                direction,
            });
            continue;
        }
        let parent = pos.offset(direction);
        if !network.contains(parent) {
            out.push(InvariantViolation::ParentOutside {
                network: id,
                pos,
                parent,
            });
            continue;
        }
        let connects_back = access
            .node(parent)
            .is_some_and(|p| p.connections().contains(direction.opposite()));
        if !connects_back {
            out.push(InvariantViolation::BrokenEdge {
                network: id,
                pos,
                parent,
            });
            continue;
        }
        if !reaches_source(network, access, pos) {
            out.push(InvariantViolation::Cycle { network: id, pos });
        }
    }
}

/// Follow source directions from `start`. `false` only on a revisit; a chain
/// that breaks off is reported at the node where it breaks.
fn reaches_source<A: RotationAccess + ?Sized>(
    network: &RotationNetwork,
    access: &A,
    start: BlockPos,
) -> bool {
    let mut seen = BTreeSet::from([start]);
    let mut current = start;
    while !network.is_source(current) {
        let Some(direction) = access.node(current).and_then(|n| n.source()) else {
            return true;
        };
        let next = current.offset(direction);
        if !network.contains(next) {
            return true;
        }
        if !seen.insert(next) {
            return false;
        }
        current = next;
    }
    true
}

// ---------------------------------------------------------------------------
// Membership checks
// ---------------------------------------------------------------------------

/// Report nodes at `positions` that name a network which does not list them.
///
/// [`validate`] walks from the manager's side; this walks from the grid's,
/// which is the only way to spot a node left pointing at a network after
/// being dropped from it.
pub fn validate_membership<A, I>(
    manager: &RotationNetworkManager,
    access: &A,
    positions: I,
) -> Vec<InvariantViolation>
where
    A: RotationAccess + ?Sized,
    I: IntoIterator<Item = BlockPos>,
{
    positions
        .into_iter()
        .filter_map(|pos| {
            let network = access.node(pos)?.network()?;
            let listed = manager
                .network(network)
                .is_some_and(|n| n.contains(pos));
            (!listed).then_some(InvariantViolation::Orphan { network, pos })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use millwork_core::Direction::*;
    use millwork_core::Node;
    use millwork_core::test_utils::*;

    fn chain(len: i32) -> (TestGrid, RotationNetworkManager) {
        let mut grid = TestGrid::new();
        let mut manager = RotationNetworkManager::new();
        grid.insert(TestNode::source(pos(0, 0, 0), dirs(&[East])));
        assert!(manager.add_source(&mut grid, pos(0, 0, 0)));
        for x in 1..=len {
            grid.insert(TestNode::relay(pos(x, 0, 0), dirs(&[West, East])));
            assert!(manager.add(&mut grid, pos(x, 0, 0)));
        }
        (grid, manager)
    }

    #[test]
    fn consistent_chain_has_no_violations() {
        let (grid, manager) = chain(4);
        assert!(validate(&manager, &grid).is_empty());
        assert!(validate_membership(&manager, &grid, grid.positions()).is_empty());
    }

    #[test]
    fn node_missing_from_grid_is_reported() {
        let (mut grid, manager) = chain(2);
        grid.take(pos(2, 0, 0));
        assert_eq!(
            validate(&manager, &grid),
            vec![InvariantViolation::MissingNode {
                network: NetworkId(0),
                pos: pos(2, 0, 0),
            }]
        );
    }

    #[test]
    fn member_with_wrong_network_is_reported() {
        let (mut grid, manager) = chain(1);
        grid.get_mut(pos(1, 0, 0)).unwrap().remove();
        assert_eq!(
            validate(&manager, &grid),
            vec![InvariantViolation::WrongNetwork {
                network: NetworkId(0),
                pos: pos(1, 0, 0),
                found: None,
            }]
        );
    }

    #[test]
    fn edge_that_no_longer_connects_back_is_reported() {
        let (mut grid, manager) = chain(2);
        // Reorient without telling the manager.
        grid.get_mut(pos(1, 0, 0))
            .unwrap()
            .state_mut()
            .set_connections(dirs(&[West]));
        assert_eq!(
            validate(&manager, &grid),
            vec![InvariantViolation::BrokenEdge {
                network: NetworkId(0),
                pos: pos(2, 0, 0),
                parent: pos(1, 0, 0),
            }]
        );
    }

    #[test]
    fn parent_loop_is_reported_as_cycle() {
        let (mut grid, manager) = chain(3);
        // Point 1 at 2 instead of the source; 1 and 2 now feed each other.
        let one = grid.get_mut(pos(1, 0, 0)).unwrap();
        one.update(NetworkId(0), Some(East), None);

        let violations = validate(&manager, &grid);
        assert!(violations.contains(&InvariantViolation::Cycle {
            network: NetworkId(0),
            pos: pos(1, 0, 0),
        }));
        assert!(violations.contains(&InvariantViolation::Cycle {
            network: NetworkId(0),
            pos: pos(3, 0, 0),
        }));
    }

    #[test]
    fn source_with_parent_is_reported() {
        let (mut grid, manager) = chain(1);
        grid.get_mut(pos(0, 0, 0))
            .unwrap()
            .update(NetworkId(0), Some(East), None);
        let violations = validate(&manager, &grid);
        assert_eq!(
            violations[0],
            InvariantViolation::SourceHasParent {
                network: NetworkId(0),
                pos: pos(0, 0, 0),
                direction: East,
            }
        );
    }

    #[test]
    fn stray_network_claim_is_an_orphan() {
        let (mut grid, manager) = chain(1);
        let mut stray = TestNode::relay(pos(0, 5, 0), dirs(&[]));
        stray.update(NetworkId(0), Some(Down), None);
        grid.insert(stray);

        assert_eq!(
            validate_membership(&manager, &grid, grid.positions()),
            vec![InvariantViolation::Orphan {
                network: NetworkId(0),
                pos: pos(0, 5, 0),
            }]
        );
    }

    #[test]
    fn violation_messages_name_the_network() {
        let v = InvariantViolation::MissingParent {
            network: NetworkId(2),
            pos: pos(1, 2, 3),
        };
        assert_eq!(v.to_string(), "network 2: member [1, 2, 3] has no source direction");
    }
}
