//! The participation state every rotation-capable block carries, and the
//! [`Node`] trait concrete block types implement.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pos::{BlockPos, Direction, DirectionSet};
use crate::rotation::Rotation;

// ---------------------------------------------------------------------------
// Network identifier
// ---------------------------------------------------------------------------

/// Identifies a rotation network within one manager. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub u64);

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Node state
// ---------------------------------------------------------------------------

/// Per-cell network state.
///
/// `network`, `source` and `source_rotation` change together: [`update`] sets
/// all three, [`remove`] clears all three. Nothing else writes them.
///
/// [`update`]: NodeState::update
/// [`remove`]: NodeState::remove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pos: BlockPos,
    connections: DirectionSet,
    source: Option<Direction>,
    source_rotation: Option<Rotation>,
    network: Option<NetworkId>,
}

impl NodeState {
    /// A disconnected node at `pos`.
    pub fn new(pos: BlockPos, connections: DirectionSet) -> Self {
        Self {
            pos,
            connections,
            source: None,
            source_rotation: None,
            network: None,
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn connections(&self) -> DirectionSet {
        self.connections
    }

    /// The connection this node receives rotation through. `None` for a
    /// network source and for disconnected nodes.
    pub fn source(&self) -> Option<Direction> {
        self.source
    }

    /// The rotation received through [`source`](Self::source).
    pub fn source_rotation(&self) -> Option<Rotation> {
        self.source_rotation
    }

    pub fn network(&self) -> Option<NetworkId> {
        self.network
    }

    pub fn is_connected(&self) -> bool {
        self.network.is_some()
    }

    /// Join `network`, receiving `rotation` through `source`.
    pub fn update(
        &mut self,
        network: NetworkId,
        source: Option<Direction>,
        rotation: Option<Rotation>,
    ) {
        self.network = Some(network);
        self.source = source;
        self.source_rotation = rotation;
    }

    /// Leave whatever network this node belonged to. Idempotent.
    pub fn remove(&mut self) {
        self.network = None;
        self.source = None;
        self.source_rotation = None;
    }

    /// Replace the connection set after the block was reoriented or reshaped.
    ///
    /// Network state is left as-is; the owner must follow up with a manager
    /// `update` so the network can revalidate.
    pub fn set_connections(&mut self, connections: DirectionSet) {
        self.connections = connections;
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node[pos={}, connections={}, network=", self.pos, self.connections)?;
        match self.network {
            Some(id) => write!(f, "{id}")?,
            None => f.write_str("none")?,
        }
        match (self.source, self.source_rotation) {
            (Some(source), Some(rotation)) => write!(f, ", source={source}, rotation={rotation}]"),
            (Some(source), None) => write!(f, ", source={source}, rotation=none]"),
            (None, _) => f.write_str(", source=none]"),
        }
    }
}

// ---------------------------------------------------------------------------
// Node trait
// ---------------------------------------------------------------------------

/// A block that takes part in rotation networks.
///
/// Implementors own a [`NodeState`] and decide what rotation they emit through
/// each of their connections. `rotation` must not mutate the grid.
pub trait Node: fmt::Debug {
    fn state(&self) -> &NodeState;

    fn state_mut(&mut self) -> &mut NodeState;

    /// The rotation this node emits toward `exit`, if any. Must be defined for
    /// every direction in [`connections`](Node::connections) whenever the node
    /// is part of a network.
    fn rotation(&self, exit: Direction) -> Option<Rotation>;

    fn pos(&self) -> BlockPos {
        self.state().pos()
    }

    fn connections(&self) -> DirectionSet {
        self.state().connections()
    }

    fn source(&self) -> Option<Direction> {
        self.state().source()
    }

    fn source_rotation(&self) -> Option<Rotation> {
        self.state().source_rotation()
    }

    fn network(&self) -> Option<NetworkId> {
        self.state().network()
    }

    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    fn update(&mut self, network: NetworkId, source: Option<Direction>, rotation: Option<Rotation>) {
        self.state_mut().update(network, source, rotation);
    }

    fn remove(&mut self) {
        self.state_mut().remove();
    }
}
