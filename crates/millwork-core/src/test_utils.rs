//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::collections::BTreeMap;

use crate::access::RotationAccess;
use crate::fixed::Fixed64;
use crate::node::{Node, NodeState};
use crate::pos::{BlockPos, Direction, DirectionSet};
use crate::rotation::Rotation;

// ===========================================================================
// Shorthand constructors
// ===========================================================================

pub fn pos(x: i32, y: i32, z: i32) -> BlockPos {
    BlockPos::new(x, y, z)
}

pub fn dirs(directions: &[Direction]) -> DirectionSet {
    directions.iter().copied().collect()
}

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// TestNode
// ===========================================================================

/// A minimal block: either drives a fixed speed out of every connection, or
/// passes the rotation it receives straight through to every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestNode {
    state: NodeState,
    drive: Option<Fixed64>,
}

impl TestNode {
    /// A driving node at speed 1.
    pub fn source(pos: BlockPos, connections: DirectionSet) -> Self {
        Self::driven(pos, connections, Fixed64::ONE)
    }

    pub fn driven(pos: BlockPos, connections: DirectionSet, speed: Fixed64) -> Self {
        Self {
            state: NodeState::new(pos, connections),
            drive: Some(speed),
        }
    }

    pub fn relay(pos: BlockPos, connections: DirectionSet) -> Self {
        Self {
            state: NodeState::new(pos, connections),
            drive: None,
        }
    }

    pub fn drive(&self) -> Option<Fixed64> {
        self.drive
    }
}

impl Node for TestNode {
    fn state(&self) -> &NodeState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut NodeState {
        &mut self.state
    }

    fn rotation(&self, exit: Direction) -> Option<Rotation> {
        match self.drive {
            Some(speed) => Some(Rotation::new(exit, speed)),
            None => self.state.source_rotation().map(|r| r.with_axis(exit)),
        }
    }
}

// ===========================================================================
// TestGrid
// ===========================================================================

/// A bare position -> node map, enough to drive a manager in tests.
#[derive(Debug, Default)]
pub struct TestGrid {
    nodes: BTreeMap<BlockPos, TestNode>,
}

impl TestGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: TestNode) {
        self.nodes.insert(node.pos(), node);
    }

    pub fn take(&mut self, pos: BlockPos) -> Option<TestNode> {
        self.nodes.remove(&pos)
    }

    pub fn get(&self, pos: BlockPos) -> Option<&TestNode> {
        self.nodes.get(&pos)
    }

    pub fn get_mut(&mut self, pos: BlockPos) -> Option<&mut TestNode> {
        self.nodes.get_mut(&pos)
    }

    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.nodes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl RotationAccess for TestGrid {
    fn node(&self, pos: BlockPos) -> Option<&dyn Node> {
        self.nodes.get(&pos).map(|n| n as &dyn Node)
    }

    fn node_mut(&mut self, pos: BlockPos) -> Option<&mut dyn Node> {
        self.nodes.get_mut(&pos).map(|n| n as &mut dyn Node)
    }
}
