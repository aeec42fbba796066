//! The per-world owner of all rotation networks.

use std::collections::BTreeMap;

use millwork_core::{BlockPos, Direction, NetworkId, Rotation, RotationAccess};
use tracing::{debug, warn};

use crate::event::NetworkEvent;
use crate::network::RotationNetwork;

/// Every rotation network in one grid, and the only entry point for
/// changing them.
///
/// Block lifecycle callbacks call [`add_source`](Self::add_source),
/// [`add`](Self::add), [`update`](Self::update) and [`remove`](Self::remove)
/// with the grid and the position that changed. A `false` return means the
/// block at that position would have merged two networks and must be broken
/// by the caller.
///
/// One manager per world. Operations run to completion and must not be
/// re-entered from a node's `rotation`.
#[derive(Debug, Clone, Default)]
pub struct RotationNetworkManager {
    networks: BTreeMap<NetworkId, RotationNetwork>,
    next_network_id: u64,
    record_events: bool,
    events: Vec<NetworkEvent>,
}

impl RotationNetworkManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer [`NetworkEvent`]s for [`drain_events`](Self::drain_events).
    /// Off by default.
    pub fn set_record_events(&mut self, record: bool) {
        self.record_events = record;
        if !record {
            self.events.clear();
        }
    }

    pub fn drain_events(&mut self) -> Vec<NetworkEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Mutations ---

    /// Register the node at `pos` as a new rotation source.
    ///
    /// Refused if any neighbor it connects to already belongs to a network:
    /// that would put two sources in one tree. On success the new network
    /// immediately absorbs every disconnected node reachable from the source.
    /// Network state the node carries in is discarded first.
    pub fn add_source<A: RotationAccess + ?Sized>(&mut self, access: &mut A, pos: BlockPos) -> bool {
        let Some(source) = access.node_mut(pos) else {
            warn!(%pos, "add_source on an empty position");
            return false;
        };
        source.remove();
        let Some(source) = access.node(pos) else {
            return false;
        };

        let conflict = source.connections().iter().find(|&direction| {
            access
                .node(pos.offset(direction))
                .is_some_and(|adjacent| {
                    adjacent.is_connected()
                        && adjacent.connections().contains(direction.opposite())
                })
        });
        if let Some(direction) = conflict {
            debug!(%pos, %direction, "source rejected: neighbor already belongs to a network");
            self.emit(NetworkEvent::PlacementRejected { pos });
            return false;
        }

        let id = NetworkId(self.next_network_id);
        if let Some(source) = access.node_mut(pos) {
            source.update(id, None, None);
        }
        let mut network = RotationNetwork::new(id, pos);
        let absorbed = network.update_after_add(access, pos);

        self.networks.insert(id, network);
        self.next_network_id += 1;

        debug!(network = %id, %pos, absorbed = absorbed.len(), "created rotation network");
        self.emit(NetworkEvent::NetworkCreated {
            network: id,
            source: pos,
        });
        if !absorbed.is_empty() {
            self.emit(NetworkEvent::NodesAttached {
                network: id,
                positions: absorbed,
            });
        }
        true
    }

    /// Register a newly placed, non-source node at `pos`.
    ///
    /// Every network gets a chance to claim it. If two do, the node would
    /// bridge them: it is dropped again and `false` returned. If one does,
    /// that network then absorbs anything newly reachable through the node.
    /// If none does, the node stays in the grid, disconnected. Network state
    /// the node carries in is discarded first.
    pub fn add<A: RotationAccess + ?Sized>(&mut self, access: &mut A, pos: BlockPos) -> bool {
        let Some(node) = access.node_mut(pos) else {
            warn!(%pos, "add on an empty position");
            return false;
        };
        node.remove();

        let ids: Vec<NetworkId> = self.networks.keys().copied().collect();
        let mut claimed: Option<NetworkId> = None;

        for id in ids {
            if !self.network_mut(id).update_on_add(access, pos) {
                continue;
            }
            let Some(first) = claimed else {
                claimed = Some(id);
                continue;
            };

            // Second claim: undo the first, the caller breaks the block.
            self.network_mut(first).remove_node(pos);
            if let Some(node) = access.node_mut(pos) {
                node.remove();
            }
            warn!(%pos, first = %first, second = %id, "node would join two networks; rejecting");
            self.emit(NetworkEvent::PlacementRejected { pos });
            return false;
        }

        match claimed {
            Some(id) => {
                let absorbed = self.network_mut(id).update_after_add(access, pos);
                debug!(network = %id, %pos, absorbed = absorbed.len(), "node joined network");
                let mut positions = Vec::with_capacity(absorbed.len() + 1);
                positions.push(pos);
                positions.extend(absorbed);
                self.emit(NetworkEvent::NodesAttached {
                    network: id,
                    positions,
                });
            }
            None => {
                if let Some(node) = access.node_mut(pos) {
                    node.remove();
                }
            }
        }
        true
    }

    /// Revalidate after the node at `pos` changed its connections or the
    /// rotation it emits, in place.
    ///
    /// A disconnected node is treated as newly added. A connected node that
    /// now also touches a different network is dropped from its own (taking
    /// any nodes that depended on it along) and `false` is returned.
    /// Otherwise its network absorbs anything newly reachable through it and
    /// is then re-walked from the source.
    pub fn update<A: RotationAccess + ?Sized>(&mut self, access: &mut A, pos: BlockPos) -> bool {
        let Some(node) = access.node(pos) else {
            warn!(%pos, "update on an empty position");
            return false;
        };
        let Some(network_id) = node.network() else {
            return self.add(access, pos);
        };

        let others: Vec<NetworkId> = self
            .networks
            .keys()
            .copied()
            .filter(|id| *id != network_id)
            .collect();
        let mut bridged = None;
        for id in others {
            // The node is connected, so a claim never mutates here.
            if self.network_mut(id).update_on_add(access, pos) {
                bridged = Some(id);
                break;
            }
        }

        if let Some(other) = bridged {
            warn!(%pos, network = %network_id, other = %other, "node now bridges two networks; rejecting");
            self.detach(access, network_id, pos);
            self.emit(NetworkEvent::PlacementRejected { pos });
            return false;
        }

        let network = self.network_mut(network_id);
        let absorbed = network.update_after_add(access, pos);
        let evicted = network.update_network(access);
        if !absorbed.is_empty() || !evicted.is_empty() {
            debug!(
                network = %network_id,
                %pos,
                absorbed = absorbed.len(),
                evicted = evicted.len(),
                "network revalidated"
            );
        }
        if !absorbed.is_empty() {
            self.emit(NetworkEvent::NodesAttached {
                network: network_id,
                positions: absorbed,
            });
        }
        if !evicted.is_empty() {
            self.emit(NetworkEvent::NodesDetached {
                network: network_id,
                positions: evicted,
            });
        }
        true
    }

    /// Take the node at `pos` out of its network before it leaves the grid.
    ///
    /// Removing a source removes its whole network. Removing a member
    /// re-walks the network and detaches whatever is no longer reachable.
    /// A disconnected node is a no-op.
    pub fn remove<A: RotationAccess + ?Sized>(&mut self, access: &mut A, pos: BlockPos) {
        let Some(network_id) = access.node(pos).and_then(|n| n.network()) else {
            return;
        };
        self.detach(access, network_id, pos);
    }

    /// Drop every network, detaching all of their nodes.
    pub fn clear<A: RotationAccess + ?Sized>(&mut self, access: &mut A) {
        for (_, mut network) in std::mem::take(&mut self.networks) {
            network.remove_network(access);
            if let Some(source) = access.node_mut(network.source()) {
                source.remove();
            }
        }
        self.next_network_id = 0;
        self.events.clear();
    }

    // --- Queries ---

    pub fn network(&self, id: NetworkId) -> Option<&RotationNetwork> {
        self.networks.get(&id)
    }

    /// All networks in ascending id order.
    pub fn networks(&self) -> impl Iterator<Item = &RotationNetwork> {
        self.networks.values()
    }

    /// The network the node at `pos` belongs to.
    pub fn network_of<A: RotationAccess + ?Sized>(&self, access: &A, pos: BlockPos) -> Option<&RotationNetwork> {
        let id = access.node(pos)?.network()?;
        self.networks.get(&id)
    }

    /// The rotation the node at `pos` emits toward `exit`, if it is driven.
    pub fn rotation_at<A: RotationAccess + ?Sized>(
        &self,
        access: &A,
        pos: BlockPos,
        exit: Direction,
    ) -> Option<Rotation> {
        let node = access.node(pos)?;
        node.network()?;
        node.rotation(exit)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Every network's [`describe`](RotationNetwork::describe) output in id
    /// order, separated by blank lines. Empty when there are no networks.
    pub fn describe<A: RotationAccess + ?Sized>(&self, access: &A) -> String {
        self.networks
            .values()
            .map(|network| network.describe(access))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // --- Internals ---

    /// Take `pos` out of `network_id`, fully detaching it. A source takes its
    /// whole network along.
    fn detach<A: RotationAccess + ?Sized>(&mut self, access: &mut A, network_id: NetworkId, pos: BlockPos) {
        let network = self.network_mut(network_id);

        if network.is_source(pos) {
            let detached = network.remove_network(access);
            self.networks.remove(&network_id);
            if let Some(node) = access.node_mut(pos) {
                node.remove();
            }
            debug!(network = %network_id, %pos, detached = detached.len(), "removed rotation network");
            self.emit(NetworkEvent::NetworkRemoved {
                network: network_id,
                detached,
            });
            return;
        }

        network.remove_node(pos);
        if let Some(node) = access.node_mut(pos) {
            node.remove();
        }
        let evicted = network.update_network(access);
        let mut positions = Vec::with_capacity(evicted.len() + 1);
        positions.push(pos);
        positions.extend(evicted);
        self.emit(NetworkEvent::NodesDetached {
            network: network_id,
            positions,
        });
    }

    /// Network ids come from nodes; one that is not in the map means the
    /// bookkeeping is already corrupt.
    fn network_mut(&mut self, id: NetworkId) -> &mut RotationNetwork {
        match self.networks.get_mut(&id) {
            Some(network) => network,
            None => panic!("missing rotation network for network id {id}"),
        }
    }

    fn emit(&mut self, event: NetworkEvent) {
        if self.record_events {
            self.events.push(event);
        }
    }
}
