use millwork_core::{BlockPos, NetworkId};
use serde::{Deserialize, Serialize};

/// Events emitted by the network manager on topology transitions.
///
/// Only changes are reported: a node whose rotation was merely refreshed by a
/// revalidation pass produces nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkEvent {
    /// A source was accepted and a new network created around it.
    NetworkCreated { network: NetworkId, source: BlockPos },
    /// A network's source went away. `detached` lists every former member.
    NetworkRemoved {
        network: NetworkId,
        detached: Vec<BlockPos>,
    },
    /// Nodes joined a network, in the order they were reached.
    NodesAttached {
        network: NetworkId,
        positions: Vec<BlockPos>,
    },
    /// Nodes left a network (removed, or no longer reachable from the source).
    NodesDetached {
        network: NetworkId,
        positions: Vec<BlockPos>,
    },
    /// A placement or reorientation would have joined two networks, or put a
    /// source next to an existing network. The block must be broken.
    PlacementRejected { pos: BlockPos },
}

/// Discriminant tag for event types, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkEventKind {
    NetworkCreated,
    NetworkRemoved,
    NodesAttached,
    NodesDetached,
    PlacementRejected,
}

impl NetworkEvent {
    pub fn kind(&self) -> NetworkEventKind {
        match self {
            NetworkEvent::NetworkCreated { .. } => NetworkEventKind::NetworkCreated,
            NetworkEvent::NetworkRemoved { .. } => NetworkEventKind::NetworkRemoved,
            NetworkEvent::NodesAttached { .. } => NetworkEventKind::NodesAttached,
            NetworkEvent::NodesDetached { .. } => NetworkEventKind::NodesDetached,
            NetworkEvent::PlacementRejected { .. } => NetworkEventKind::PlacementRejected,
        }
    }

    /// The network this event concerns, if any.
    pub fn network(&self) -> Option<NetworkId> {
        match self {
            NetworkEvent::NetworkCreated { network, .. }
            | NetworkEvent::NetworkRemoved { network, .. }
            | NetworkEvent::NodesAttached { network, .. }
            | NetworkEvent::NodesDetached { network, .. } => Some(*network),
            NetworkEvent::PlacementRejected { .. } => None,
        }
    }
}
