//! Millwork Core -- value types and contracts for mechanical rotation networks.
//!
//! Blocks in a 3D grid that can carry rotation (axles, gearboxes, water
//! wheels, cranks) implement [`node::Node`]. The network engine in
//! `millwork-network` groups them into trees rooted at a single source and
//! propagates [`rotation::Rotation`] values outward; this crate only defines
//! what it operates on.
//!
//! # Key Types
//!
//! - [`pos::BlockPos`], [`pos::Direction`], [`pos::DirectionSet`] -- grid
//!   coordinates and connection directions.
//! - [`rotation::Rotation`] -- an axis direction plus a signed [`fixed::Fixed64`]
//!   angular speed.
//! - [`node::NodeState`] / [`node::Node`] -- per-block network state and the
//!   trait concrete blocks implement.
//! - [`access::RotationAccess`] -- position lookup into whatever owns the blocks.

pub mod access;
pub mod fixed;
pub mod node;
pub mod pos;
pub mod rotation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use access::RotationAccess;
pub use node::{NetworkId, Node, NodeState};
pub use pos::{Axis, BlockPos, Direction, DirectionSet};
pub use rotation::Rotation;
