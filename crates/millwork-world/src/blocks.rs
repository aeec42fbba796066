//! Concrete mechanical blocks.
//!
//! Rotation is expressed about the direction it leaves a block through. A
//! block fed `Rotation { axis: East, speed }` from its west side and passing
//! it straight on emits the same value east; emitting it back west would be
//! the flipped value.

use millwork_core::fixed::Fixed64;
use millwork_core::{Axis, BlockPos, Direction, DirectionSet, Node, NodeState, Rotation};

/// Re-express a received rotation about `exit`. Along the same axis the
/// physical rotation is unchanged; a perpendicular exit keeps the speed.
fn carry(received: Rotation, exit: Direction) -> Rotation {
    if exit == received.axis {
        received
    } else if exit == received.axis.opposite() {
        received.flipped()
    } else {
        received.with_axis(exit)
    }
}

// ---------------------------------------------------------------------------
// Axle
// ---------------------------------------------------------------------------

/// A straight shaft connecting both faces along one axis.
#[derive(Debug, Clone)]
pub struct Axle {
    state: NodeState,
    axis: Axis,
}

impl Axle {
    pub fn new(pos: BlockPos, axis: Axis) -> Self {
        Self {
            state: NodeState::new(pos, DirectionSet::along(axis)),
            axis,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }
}

impl Node for Axle {
    fn state(&self) -> &NodeState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut NodeState {
        &mut self.state
    }

    fn rotation(&self, exit: Direction) -> Option<Rotation> {
        if exit.axis() != self.axis {
            return None;
        }
        self.state.source_rotation().map(|r| carry(r, exit))
    }
}

// ---------------------------------------------------------------------------
// Gearbox
// ---------------------------------------------------------------------------

/// A junction that passes rotation out of any of its open faces, turning
/// corners without changing speed.
#[derive(Debug, Clone)]
pub struct Gearbox {
    state: NodeState,
}

impl Gearbox {
    pub fn new(pos: BlockPos, faces: DirectionSet) -> Self {
        Self {
            state: NodeState::new(pos, faces),
        }
    }
}

impl Node for Gearbox {
    fn state(&self) -> &NodeState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut NodeState {
        &mut self.state
    }

    fn rotation(&self, exit: Direction) -> Option<Rotation> {
        if !self.state.connections().contains(exit) {
            return None;
        }
        self.state.source_rotation().map(|r| carry(r, exit))
    }
}

// ---------------------------------------------------------------------------
// Crank
// ---------------------------------------------------------------------------

/// A driven source: emits its own speed out of every connected face.
///
/// Changing the speed only changes what the block reports; the owner must
/// ask the manager to update afterwards so downstream nodes see it.
#[derive(Debug, Clone)]
pub struct Crank {
    state: NodeState,
    speed: Fixed64,
}

impl Crank {
    pub fn new(pos: BlockPos, faces: DirectionSet, speed: Fixed64) -> Self {
        Self {
            state: NodeState::new(pos, faces),
            speed,
        }
    }

    pub fn speed(&self) -> Fixed64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: Fixed64) {
        self.speed = speed;
    }
}

impl Node for Crank {
    fn state(&self) -> &NodeState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut NodeState {
        &mut self.state
    }

    fn rotation(&self, exit: Direction) -> Option<Rotation> {
        self.state
            .connections()
            .contains(exit)
            .then(|| Rotation::new(exit, self.speed))
    }
}
